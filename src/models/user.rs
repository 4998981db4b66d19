// src/models/user.rs
use chrono::NaiveDateTime;
use serde::Deserialize;
use sqlx::FromRow;

// Representa um utilizador lido da tabela 'users'
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub created_at: NaiveDateTime,
}

/// Login do admin: ou o token partilhado, ou username + password.
/// Serve tanto o JSON de /api/admin/login como o formulário de /admin/login.
#[derive(Debug, Default, Deserialize)]
pub struct AdminLoginForm {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}
