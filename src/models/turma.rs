// src/models/turma.rs
use crate::models::validation::{nao_vazio, opcional};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Turma {
    pub id: String,
    pub nome: String,
    pub sala: String,
    pub turno: String,
    pub horario: String,
    pub moderador_id: Option<String>,
    pub capacidade_total: i64,
    pub observacoes: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Turma + quantos alunos a referenciam. A capacidade é só indicativa:
/// a UI usa a contagem para desativar turmas cheias, a escrita não a verifica.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurmaComOcupacao {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub turma: Turma,
    pub alunos_count: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TurmaPayload {
    #[validate(custom(function = "nao_vazio"))]
    pub nome: String,
    #[validate(custom(function = "nao_vazio"))]
    pub sala: String,
    #[validate(custom(function = "nao_vazio"))]
    pub turno: String,
    #[validate(custom(function = "nao_vazio"))]
    pub horario: String,
    #[serde(default)]
    pub moderador_id: Option<String>,
    #[validate(range(min = 1, message = "Capacidade deve ser no mínimo 1"))]
    pub capacidade_total: i64,
    #[serde(default)]
    pub observacoes: Option<String>,
}

impl TurmaPayload {
    pub fn normalizado(self) -> Self {
        Self {
            nome: self.nome.trim().to_string(),
            sala: self.sala.trim().to_string(),
            turno: self.turno.trim().to_lowercase(),
            horario: self.horario.trim().to_string(),
            moderador_id: opcional(self.moderador_id),
            capacidade_total: self.capacidade_total,
            observacoes: opcional(self.observacoes),
        }
    }
}

/// Filtros opcionais de GET /api/admin/turmas.
#[derive(Debug, Default, Deserialize)]
pub struct TurmaFiltro {
    pub turno: Option<String>,
    pub sala: Option<String>,
}
