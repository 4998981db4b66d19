// src/models/aluno.rs
use crate::models::validation::{nao_vazio, opcional};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Aluno {
    pub id: String,
    pub nome: String,
    pub idade: i64,
    pub telefone: String,
    pub email: String,
    pub turno_preferido: String,
    // Sem FK: pode ficar a apontar para uma turma apagada
    pub turma_id: Option<String>,
    pub classificacao: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AlunoPayload {
    #[validate(custom(function = "nao_vazio"))]
    pub nome: String,
    #[validate(range(min = 1, message = "Idade deve ser positiva"))]
    pub idade: i64,
    #[validate(length(min = 10, message = "Telefone deve ter no mínimo 10 dígitos"))]
    pub telefone: String,
    #[validate(email(message = "E-mail inválido"))]
    pub email: String,
    #[validate(custom(function = "nao_vazio"))]
    pub turno_preferido: String,
    #[serde(default)]
    pub turma_id: Option<String>,
    #[serde(default)]
    #[validate(length(max = 50, message = "Classificação muito longa"))]
    pub classificacao: Option<String>,
}

impl AlunoPayload {
    pub fn normalizado(self) -> Self {
        Self {
            nome: self.nome.trim().to_string(),
            idade: self.idade,
            telefone: self.telefone.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            turno_preferido: self.turno_preferido.trim().to_lowercase(),
            turma_id: opcional(self.turma_id),
            classificacao: opcional(self.classificacao),
        }
    }
}

/// `?turmaId=` de GET /api/admin/alunos.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlunoFiltro {
    pub turma_id: Option<String>,
}
