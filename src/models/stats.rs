// src/models/stats.rs
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SalaCount {
    pub sala: String,
    pub count: i64,
}

/// Resposta de GET /api/admin/stats (também usada no dashboard HTML).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_moderadores: i64,
    pub total_turmas: i64,
    pub total_alunos: i64,
    // Percentagem (0..=100, pode passar de 100 se houver sobrelotação)
    pub taxa_ocupacao: f64,
    pub turmas_por_sala: Vec<SalaCount>,
}

/// Alunos matriculados ÷ capacidade somada de todas as turmas, em %.
pub fn taxa_ocupacao(matriculados: i64, capacidade_total: i64) -> f64 {
    if capacidade_total <= 0 {
        return 0.0;
    }
    matriculados as f64 * 100.0 / capacidade_total as f64
}
