// src/services/aluno_service.rs
use crate::{
    error::{AppError, AppResult},
    models::aluno::{Aluno, AlunoFiltro, AlunoPayload},
    services::{like_contains, turma_service},
};
use sqlx::SqlitePool;
use uuid::Uuid;
use validator::Validate;

const COLUMNS: &str =
    "id, nome, idade, telefone, email, turno_preferido, turma_id, classificacao, created_at";

pub async fn list(db_pool: &SqlitePool, filtro: &AlunoFiltro) -> AppResult<Vec<Aluno>> {
    let turma_id = filtro
        .turma_id
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());
    let sql = format!(
        "SELECT {COLUMNS} FROM alunos WHERE (?1 IS NULL OR turma_id = ?1) ORDER BY nome COLLATE NOCASE"
    );
    Ok(sqlx::query_as::<_, Aluno>(&sql)
        .bind(turma_id)
        .fetch_all(db_pool)
        .await?)
}

pub async fn search(db_pool: &SqlitePool, termo: &str) -> AppResult<Vec<Aluno>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM alunos WHERE nome LIKE ?1 ESCAPE '\\' ORDER BY nome COLLATE NOCASE"
    );
    Ok(sqlx::query_as::<_, Aluno>(&sql)
        .bind(like_contains(termo))
        .fetch_all(db_pool)
        .await?)
}

pub async fn find(db_pool: &SqlitePool, id: &str) -> AppResult<Option<Aluno>> {
    let sql = format!("SELECT {COLUMNS} FROM alunos WHERE id = ?1");
    Ok(sqlx::query_as::<_, Aluno>(&sql)
        .bind(id)
        .fetch_optional(db_pool)
        .await?)
}

async fn preparar(db_pool: &SqlitePool, payload: AlunoPayload) -> AppResult<AlunoPayload> {
    payload.validate()?;
    let a = payload.normalizado();
    if let Some(turma_id) = a.turma_id.as_deref() {
        if !turma_service::exists(db_pool, turma_id).await? {
            return Err(AppError::BadRequest(format!("Turma {} não existe.", turma_id)));
        }
    }
    Ok(a)
}

pub async fn create(db_pool: &SqlitePool, payload: AlunoPayload) -> AppResult<Aluno> {
    let a = preparar(db_pool, payload).await?;
    let id = Uuid::new_v4().to_string();

    let sql = format!(
        r#"
        INSERT INTO alunos (id, nome, idade, telefone, email, turno_preferido, turma_id, classificacao)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        RETURNING {COLUMNS}
        "#
    );
    let aluno = sqlx::query_as::<_, Aluno>(&sql)
        .bind(&id)
        .bind(&a.nome)
        .bind(a.idade)
        .bind(&a.telefone)
        .bind(&a.email)
        .bind(&a.turno_preferido)
        .bind(&a.turma_id)
        .bind(&a.classificacao)
        .fetch_one(db_pool)
        .await?;

    tracing::info!("Aluno '{}' criado ({})", aluno.nome, aluno.id);
    Ok(aluno)
}

pub async fn update(db_pool: &SqlitePool, id: &str, payload: AlunoPayload) -> AppResult<Option<Aluno>> {
    let a = preparar(db_pool, payload).await?;

    let sql = format!(
        r#"
        UPDATE alunos
        SET nome = ?1, idade = ?2, telefone = ?3, email = ?4, turno_preferido = ?5,
            turma_id = ?6, classificacao = ?7
        WHERE id = ?8
        RETURNING {COLUMNS}
        "#
    );
    let aluno = sqlx::query_as::<_, Aluno>(&sql)
        .bind(&a.nome)
        .bind(a.idade)
        .bind(&a.telefone)
        .bind(&a.email)
        .bind(&a.turno_preferido)
        .bind(&a.turma_id)
        .bind(&a.classificacao)
        .bind(id)
        .fetch_optional(db_pool)
        .await?;

    if aluno.is_some() {
        tracing::info!("Aluno {} atualizado", id);
    }
    Ok(aluno)
}

pub async fn delete(db_pool: &SqlitePool, id: &str) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM alunos WHERE id = ?1")
        .bind(id)
        .execute(db_pool)
        .await?;
    let deleted = result.rows_affected() > 0;
    if deleted {
        tracing::info!("Aluno {} apagado", id);
    }
    Ok(deleted)
}
