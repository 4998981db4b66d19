// src/services/turma_service.rs
use crate::{
    error::{AppError, AppResult},
    models::turma::{Turma, TurmaComOcupacao, TurmaFiltro, TurmaPayload},
    services::{like_contains, moderador_service},
};
use sqlx::SqlitePool;
use uuid::Uuid;
use validator::Validate;

const COLUMNS: &str =
    "id, nome, sala, turno, horario, moderador_id, capacidade_total, observacoes, created_at";

/// Lista as turmas com a contagem de alunos, filtrando por turno e/ou sala.
pub async fn list(db_pool: &SqlitePool, filtro: &TurmaFiltro) -> AppResult<Vec<TurmaComOcupacao>> {
    let turno = filtro
        .turno
        .as_deref()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty());
    let sala = filtro
        .sala
        .as_deref()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let turmas = sqlx::query_as::<_, TurmaComOcupacao>(
        r#"
        SELECT t.id, t.nome, t.sala, t.turno, t.horario, t.moderador_id,
               t.capacidade_total, t.observacoes, t.created_at,
               (SELECT COUNT(*) FROM alunos a WHERE a.turma_id = t.id) AS alunos_count
        FROM turmas t
        WHERE (?1 IS NULL OR t.turno = ?1)
          AND (?2 IS NULL OR t.sala = ?2)
        ORDER BY t.nome COLLATE NOCASE
        "#,
    )
    .bind(turno)
    .bind(sala)
    .fetch_all(db_pool)
    .await?;
    Ok(turmas)
}

/// Pesquisa por parte do nome, com a mesma contagem de alunos da listagem.
pub async fn search(db_pool: &SqlitePool, termo: &str) -> AppResult<Vec<TurmaComOcupacao>> {
    let turmas = sqlx::query_as::<_, TurmaComOcupacao>(
        r#"
        SELECT t.id, t.nome, t.sala, t.turno, t.horario, t.moderador_id,
               t.capacidade_total, t.observacoes, t.created_at,
               (SELECT COUNT(*) FROM alunos a WHERE a.turma_id = t.id) AS alunos_count
        FROM turmas t
        WHERE t.nome LIKE ?1 ESCAPE '\'
        ORDER BY t.nome COLLATE NOCASE
        "#,
    )
    .bind(like_contains(termo))
    .fetch_all(db_pool)
    .await?;
    Ok(turmas)
}

pub async fn find(db_pool: &SqlitePool, id: &str) -> AppResult<Option<Turma>> {
    let sql = format!("SELECT {COLUMNS} FROM turmas WHERE id = ?1");
    Ok(sqlx::query_as::<_, Turma>(&sql)
        .bind(id)
        .fetch_optional(db_pool)
        .await?)
}

pub async fn exists(db_pool: &SqlitePool, id: &str) -> AppResult<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM turmas WHERE id = ?1")
        .bind(id)
        .fetch_one(db_pool)
        .await?;
    Ok(count > 0)
}

/// Valida o payload e confirma que o moderador indicado existe.
async fn preparar(db_pool: &SqlitePool, payload: TurmaPayload) -> AppResult<TurmaPayload> {
    payload.validate()?;
    let t = payload.normalizado();
    if let Some(moderador_id) = t.moderador_id.as_deref() {
        if !moderador_service::exists(db_pool, moderador_id).await? {
            return Err(AppError::BadRequest(format!("Moderador {} não existe.", moderador_id)));
        }
    }
    Ok(t)
}

pub async fn create(db_pool: &SqlitePool, payload: TurmaPayload) -> AppResult<Turma> {
    let t = preparar(db_pool, payload).await?;
    let id = Uuid::new_v4().to_string();

    let sql = format!(
        r#"
        INSERT INTO turmas (id, nome, sala, turno, horario, moderador_id, capacidade_total, observacoes)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        RETURNING {COLUMNS}
        "#
    );
    let turma = sqlx::query_as::<_, Turma>(&sql)
        .bind(&id)
        .bind(&t.nome)
        .bind(&t.sala)
        .bind(&t.turno)
        .bind(&t.horario)
        .bind(&t.moderador_id)
        .bind(t.capacidade_total)
        .bind(&t.observacoes)
        .fetch_one(db_pool)
        .await?;

    tracing::info!("Turma '{}' criada na sala {}", turma.nome, turma.sala);
    Ok(turma)
}

pub async fn update(db_pool: &SqlitePool, id: &str, payload: TurmaPayload) -> AppResult<Option<Turma>> {
    let t = preparar(db_pool, payload).await?;

    let sql = format!(
        r#"
        UPDATE turmas
        SET nome = ?1, sala = ?2, turno = ?3, horario = ?4, moderador_id = ?5,
            capacidade_total = ?6, observacoes = ?7
        WHERE id = ?8
        RETURNING {COLUMNS}
        "#
    );
    let turma = sqlx::query_as::<_, Turma>(&sql)
        .bind(&t.nome)
        .bind(&t.sala)
        .bind(&t.turno)
        .bind(&t.horario)
        .bind(&t.moderador_id)
        .bind(t.capacidade_total)
        .bind(&t.observacoes)
        .bind(id)
        .fetch_optional(db_pool)
        .await?;

    if turma.is_some() {
        tracing::info!("Turma {} atualizada", id);
    }
    Ok(turma)
}

/// Os alunos que apontavam para a turma mantêm o turma_id.
pub async fn delete(db_pool: &SqlitePool, id: &str) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM turmas WHERE id = ?1")
        .bind(id)
        .execute(db_pool)
        .await?;
    let deleted = result.rows_affected() > 0;
    if deleted {
        tracing::info!("Turma {} apagada", id);
    }
    Ok(deleted)
}
