// src/web/admin_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        aluno::{Aluno, AlunoFiltro, AlunoPayload},
        moderador::{Moderador, ModeradorPayload, SearchParams},
        pre_registration::PreRegistration,
        stats::AdminStats,
        turma::{Turma, TurmaComOcupacao, TurmaFiltro, TurmaPayload},
    },
    services::{aluno_service, moderador_service, pre_registration_service, stats_service, turma_service},
    state::AppState,
    web::JsonBody,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

const MODERADOR_NAO_ENCONTRADO: &str = "Moderador não encontrado";
const TURMA_NAO_ENCONTRADA: &str = "Turma não encontrada";
const ALUNO_NAO_ENCONTRADO: &str = "Aluno não encontrado";

fn no_content(deleted: bool, not_found: &'static str) -> AppResult<StatusCode> {
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(not_found))
    }
}

// --- Moderadores ---

pub async fn list_moderadores(State(state): State<AppState>) -> AppResult<Json<Vec<Moderador>>> {
    Ok(Json(moderador_service::list(&state.db_pool).await?))
}

pub async fn search_moderadores(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<Vec<Moderador>>> {
    Ok(Json(moderador_service::search(&state.db_pool, &params.termo()).await?))
}

pub async fn get_moderador(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<Json<Moderador>> {
    moderador_service::find(&state.db_pool, &id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound(MODERADOR_NAO_ENCONTRADO))
}

pub async fn create_moderador(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<ModeradorPayload>,
) -> AppResult<(StatusCode, Json<Moderador>)> {
    let moderador = moderador_service::create(&state.db_pool, payload).await?;
    Ok((StatusCode::CREATED, Json(moderador)))
}

pub async fn update_moderador(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<ModeradorPayload>,
) -> AppResult<Json<Moderador>> {
    moderador_service::update(&state.db_pool, &id, payload)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound(MODERADOR_NAO_ENCONTRADO))
}

pub async fn delete_moderador(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<StatusCode> {
    no_content(moderador_service::delete(&state.db_pool, &id).await?, MODERADOR_NAO_ENCONTRADO)
}

// --- Turmas ---

pub async fn list_turmas(
    State(state): State<AppState>,
    Query(filtro): Query<TurmaFiltro>,
) -> AppResult<Json<Vec<TurmaComOcupacao>>> {
    Ok(Json(turma_service::list(&state.db_pool, &filtro).await?))
}

pub async fn search_turmas(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<Vec<TurmaComOcupacao>>> {
    Ok(Json(turma_service::search(&state.db_pool, &params.termo()).await?))
}

pub async fn get_turma(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<Json<Turma>> {
    turma_service::find(&state.db_pool, &id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound(TURMA_NAO_ENCONTRADA))
}

pub async fn create_turma(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<TurmaPayload>,
) -> AppResult<(StatusCode, Json<Turma>)> {
    let turma = turma_service::create(&state.db_pool, payload).await?;
    Ok((StatusCode::CREATED, Json(turma)))
}

pub async fn update_turma(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<TurmaPayload>,
) -> AppResult<Json<Turma>> {
    turma_service::update(&state.db_pool, &id, payload)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound(TURMA_NAO_ENCONTRADA))
}

pub async fn delete_turma(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<StatusCode> {
    no_content(turma_service::delete(&state.db_pool, &id).await?, TURMA_NAO_ENCONTRADA)
}

// --- Alunos ---

pub async fn list_alunos(
    State(state): State<AppState>,
    Query(filtro): Query<AlunoFiltro>,
) -> AppResult<Json<Vec<Aluno>>> {
    Ok(Json(aluno_service::list(&state.db_pool, &filtro).await?))
}

pub async fn search_alunos(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<Vec<Aluno>>> {
    Ok(Json(aluno_service::search(&state.db_pool, &params.termo()).await?))
}

pub async fn get_aluno(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<Json<Aluno>> {
    aluno_service::find(&state.db_pool, &id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound(ALUNO_NAO_ENCONTRADO))
}

pub async fn create_aluno(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<AlunoPayload>,
) -> AppResult<(StatusCode, Json<Aluno>)> {
    let aluno = aluno_service::create(&state.db_pool, payload).await?;
    Ok((StatusCode::CREATED, Json(aluno)))
}

pub async fn update_aluno(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<AlunoPayload>,
) -> AppResult<Json<Aluno>> {
    aluno_service::update(&state.db_pool, &id, payload)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound(ALUNO_NAO_ENCONTRADO))
}

pub async fn delete_aluno(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<StatusCode> {
    no_content(aluno_service::delete(&state.db_pool, &id).await?, ALUNO_NAO_ENCONTRADO)
}

// --- Painel ---

// GET /api/admin/stats
pub async fn stats(State(state): State<AppState>) -> AppResult<Json<AdminStats>> {
    Ok(Json(stats_service::compute(&state.db_pool).await?))
}

// GET /api/admin/pre-registrations
pub async fn list_pre_registrations(State(state): State<AppState>) -> AppResult<Json<Vec<PreRegistration>>> {
    Ok(Json(pre_registration_service::list(&state.db_pool).await?))
}
