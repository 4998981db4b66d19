// src/models/moderador.rs
use crate::models::validation::{nao_vazio, opcional};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Moderador {
    pub id: String,
    pub nome: String,
    pub email: String,
    pub telefone: String,
    pub sala_principal: String,
    pub carga_horaria_semanal: i64, // horas por semana
    pub created_at: NaiveDateTime,
}

/// Corpo de POST/PUT /api/admin/moderadores.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ModeradorPayload {
    #[validate(custom(function = "nao_vazio"))]
    pub nome: String,
    #[validate(email(message = "E-mail inválido"))]
    pub email: String,
    #[validate(length(min = 10, message = "Telefone deve ter no mínimo 10 dígitos"))]
    pub telefone: String,
    #[validate(custom(function = "nao_vazio"))]
    pub sala_principal: String,
    #[validate(range(min = 1, message = "Carga horária deve ser positiva"))]
    pub carga_horaria_semanal: i64,
}

impl ModeradorPayload {
    pub fn normalizado(self) -> Self {
        Self {
            nome: self.nome.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            telefone: self.telefone.trim().to_string(),
            sala_principal: self.sala_principal.trim().to_string(),
            carga_horaria_semanal: self.carga_horaria_semanal,
        }
    }
}

/// `?q=` das rotas de pesquisa por nome.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: Option<String>,
}

impl SearchParams {
    pub fn termo(&self) -> String {
        opcional(self.q.clone()).unwrap_or_default()
    }
}
