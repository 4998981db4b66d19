// src/services/moderador_service.rs
use crate::{
    error::AppResult,
    models::moderador::{Moderador, ModeradorPayload},
    services::like_contains,
};
use sqlx::SqlitePool;
use uuid::Uuid;
use validator::Validate;

const COLUMNS: &str = "id, nome, email, telefone, sala_principal, carga_horaria_semanal, created_at";

pub async fn list(db_pool: &SqlitePool) -> AppResult<Vec<Moderador>> {
    let sql = format!("SELECT {COLUMNS} FROM moderadores ORDER BY nome COLLATE NOCASE");
    Ok(sqlx::query_as::<_, Moderador>(&sql).fetch_all(db_pool).await?)
}

/// Pesquisa por parte do nome. Termo vazio devolve todos.
pub async fn search(db_pool: &SqlitePool, termo: &str) -> AppResult<Vec<Moderador>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM moderadores WHERE nome LIKE ?1 ESCAPE '\\' ORDER BY nome COLLATE NOCASE"
    );
    Ok(sqlx::query_as::<_, Moderador>(&sql)
        .bind(like_contains(termo))
        .fetch_all(db_pool)
        .await?)
}

pub async fn find(db_pool: &SqlitePool, id: &str) -> AppResult<Option<Moderador>> {
    let sql = format!("SELECT {COLUMNS} FROM moderadores WHERE id = ?1");
    Ok(sqlx::query_as::<_, Moderador>(&sql)
        .bind(id)
        .fetch_optional(db_pool)
        .await?)
}

pub async fn exists(db_pool: &SqlitePool, id: &str) -> AppResult<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM moderadores WHERE id = ?1")
        .bind(id)
        .fetch_one(db_pool)
        .await?;
    Ok(count > 0)
}

pub async fn create(db_pool: &SqlitePool, payload: ModeradorPayload) -> AppResult<Moderador> {
    payload.validate()?;
    let m = payload.normalizado();
    let id = Uuid::new_v4().to_string();

    let sql = format!(
        r#"
        INSERT INTO moderadores (id, nome, email, telefone, sala_principal, carga_horaria_semanal)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        RETURNING {COLUMNS}
        "#
    );
    let moderador = sqlx::query_as::<_, Moderador>(&sql)
        .bind(&id)
        .bind(&m.nome)
        .bind(&m.email)
        .bind(&m.telefone)
        .bind(&m.sala_principal)
        .bind(m.carga_horaria_semanal)
        .fetch_one(db_pool)
        .await?;

    tracing::info!("Moderador '{}' criado ({})", moderador.nome, moderador.id);
    Ok(moderador)
}

/// Substitui todos os campos. `None` se o moderador não existir.
pub async fn update(db_pool: &SqlitePool, id: &str, payload: ModeradorPayload) -> AppResult<Option<Moderador>> {
    payload.validate()?;
    let m = payload.normalizado();

    let sql = format!(
        r#"
        UPDATE moderadores
        SET nome = ?1, email = ?2, telefone = ?3, sala_principal = ?4, carga_horaria_semanal = ?5
        WHERE id = ?6
        RETURNING {COLUMNS}
        "#
    );
    let moderador = sqlx::query_as::<_, Moderador>(&sql)
        .bind(&m.nome)
        .bind(&m.email)
        .bind(&m.telefone)
        .bind(&m.sala_principal)
        .bind(m.carga_horaria_semanal)
        .bind(id)
        .fetch_optional(db_pool)
        .await?;

    if moderador.is_some() {
        tracing::info!("Moderador {} atualizado", id);
    }
    Ok(moderador)
}

/// Apaga o moderador; as turmas dele ficam sem moderador (ON DELETE SET NULL).
pub async fn delete(db_pool: &SqlitePool, id: &str) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM moderadores WHERE id = ?1")
        .bind(id)
        .execute(db_pool)
        .await?;
    let deleted = result.rows_affected() > 0;
    if deleted {
        tracing::info!("Moderador {} apagado", id);
    }
    Ok(deleted)
}
