// src/services/stats_service.rs
use crate::{
    error::AppResult,
    models::stats::{taxa_ocupacao, AdminStats, SalaCount},
};
use sqlx::SqlitePool;

async fn count(db_pool: &SqlitePool, sql: &str) -> AppResult<i64> {
    Ok(sqlx::query_scalar::<_, i64>(sql).fetch_one(db_pool).await?)
}

/// Totais para o painel de administração.
pub async fn compute(db_pool: &SqlitePool) -> AppResult<AdminStats> {
    let total_moderadores = count(db_pool, "SELECT COUNT(*) FROM moderadores").await?;
    let total_turmas = count(db_pool, "SELECT COUNT(*) FROM turmas").await?;
    let total_alunos = count(db_pool, "SELECT COUNT(*) FROM alunos").await?;
    let capacidade = count(db_pool, "SELECT COALESCE(SUM(capacidade_total), 0) FROM turmas").await?;
    // Só contam alunos cuja turma ainda existe
    let matriculados = count(
        db_pool,
        "SELECT COUNT(*) FROM alunos a JOIN turmas t ON t.id = a.turma_id",
    )
    .await?;

    let turmas_por_sala = sqlx::query_as::<_, SalaCount>(
        "SELECT sala, COUNT(*) AS count FROM turmas GROUP BY sala ORDER BY sala",
    )
    .fetch_all(db_pool)
    .await?;

    tracing::debug!(
        "Stats: {} moderadores, {} turmas, {} alunos ({} matriculados / {} lugares)",
        total_moderadores,
        total_turmas,
        total_alunos,
        matriculados,
        capacidade
    );

    Ok(AdminStats {
        total_moderadores,
        total_turmas,
        total_alunos,
        taxa_ocupacao: taxa_ocupacao(matriculados, capacidade),
        turmas_por_sala,
    })
}
