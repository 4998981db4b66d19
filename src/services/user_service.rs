// src/services/user_service.rs
use crate::{
    config::AdminBootstrap,
    error::{AppError, AppResult},
    models::user::User,
    services::auth_service,
};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Busca pelo username (comparação sem distinguir maiúsculas).
pub async fn find_user_by_username(db_pool: &SqlitePool, username: &str) -> AppResult<Option<User>> {
    tracing::debug!("Buscando utilizador por username: {}", username);
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, password_hash, created_at
        FROM users
        WHERE username = ?1
        "#,
    )
    .bind(username)
    .fetch_optional(db_pool)
    .await?;

    if user.is_some() {
        tracing::debug!("Utilizador '{}' encontrado.", username);
    } else {
        tracing::debug!("Utilizador '{}' não encontrado.", username);
    }
    Ok(user)
}

/// Cria um utilizador com a senha já convertida em hash bcrypt.
pub async fn create_user(db_pool: &SqlitePool, username: &str, password: &str) -> AppResult<User> {
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        return Err(AppError::BadRequest("Utilizador e senha são obrigatórios.".to_string()));
    }
    if find_user_by_username(db_pool, username).await?.is_some() {
        return Err(AppError::Conflict(format!("O utilizador '{}' já existe.", username)));
    }

    let password_hash = auth_service::hash_password(password).await?;
    let id = Uuid::new_v4().to_string();

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, username, password_hash)
        VALUES (?1, ?2, ?3)
        RETURNING id, username, password_hash, created_at
        "#,
    )
    .bind(&id)
    .bind(username)
    .bind(&password_hash)
    .fetch_one(db_pool)
    .await?;

    tracing::info!("Utilizador '{}' criado com ID {}", user.username, user.id);
    Ok(user)
}

/// Garante que o admin configurado existe. Devolve `true` se o criou agora.
pub async fn ensure_user(db_pool: &SqlitePool, bootstrap: &AdminBootstrap) -> AppResult<bool> {
    if find_user_by_username(db_pool, &bootstrap.username).await?.is_some() {
        tracing::debug!("Admin '{}' já existe, nada a fazer.", bootstrap.username);
        return Ok(false);
    }
    create_user(db_pool, &bootstrap.username, &bootstrap.password).await?;
    Ok(true)
}
