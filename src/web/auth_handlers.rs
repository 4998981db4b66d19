// src/web/auth_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::{pre_registration::PaymentStatus, user::AdminLoginForm},
    services::{auth_service, pre_registration_service, stats_service},
    state::AppState,
    templates::{DashboardPage, LoginPage},
    web::{
        mw_auth::{current_admin, AdminUser, ADMIN_SESSION_KEY},
        JsonBody,
    },
};
use askama::Template;
use axum::{
    extract::{Extension, Form, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_sessions::Session;

/// Autentica a sessão com a identidade dada (roda o ID da sessão antes).
async fn start_session(session: &Session, identity: &str) -> AppResult {
    session
        .cycle_id()
        .await
        .map_err(|e| AppError::SessionError(format!("Falha ao rodar ID: {}", e)))?;
    session
        .insert(ADMIN_SESSION_KEY, identity)
        .await
        .map_err(|e| AppError::SessionError(format!("Falha ao inserir na sessão: {}", e)))?;
    tracing::info!("✅ Login admin bem-sucedido para: {}", identity);
    Ok(())
}

async fn end_session(session: &Session) -> AppResult {
    let admin = current_admin(session).await.ok().flatten();
    session
        .delete()
        .await
        .map_err(|e| AppError::SessionError(format!("Falha ao apagar sessão: {}", e)))?;
    match admin {
        Some(id) => tracing::info!("🚪 Admin '{}' desligado.", id),
        None => tracing::info!("🚪 Sessão anónima desligada."),
    }
    Ok(())
}

fn render<T: Template>(template: &T) -> AppResult<Html<String>> {
    template.render().map(Html).map_err(|e| {
        tracing::error!("Falha ao renderizar template: {}", e);
        AppError::InternalServerError
    })
}

// --- API JSON ---

// POST /api/admin/login
pub async fn api_login(
    State(state): State<AppState>,
    session: Session,
    JsonBody(form): JsonBody<AdminLoginForm>,
) -> AppResult<Json<Value>> {
    let identity = auth_service::authenticate_admin(&state.db_pool, &state.config.admin_token, &form).await?;
    start_session(&session, &identity).await?;
    Ok(Json(json!({ "success": true })))
}

// POST /api/admin/logout
pub async fn api_logout(session: Session) -> AppResult<Json<Value>> {
    end_session(&session).await?;
    Ok(Json(json!({ "success": true })))
}

// GET /api/admin/check-auth (nunca responde 401)
pub async fn check_auth(session: Session) -> Json<Value> {
    let authenticated = current_admin(&session).await.ok().flatten().is_some();
    Json(json!({ "isAuthenticated": authenticated }))
}

// --- Páginas HTML ---

#[derive(Debug, Deserialize)]
pub struct LoginParams {
    error: Option<String>,
}

// GET /admin/login
pub async fn show_login_form(session: Session, Query(params): Query<LoginParams>) -> Response {
    if current_admin(&session).await.ok().flatten().is_some() {
        tracing::debug!("GET /admin/login: admin já logado, redirecionando para /admin");
        return Redirect::to("/admin").into_response();
    }

    match render(&LoginPage { error: params.error }) {
        Ok(html) => html.into_response(),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Erro ao carregar a página.").into_response(),
    }
}

// POST /admin/login (formulário)
pub async fn handle_login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AdminLoginForm>,
) -> AppResult<Redirect> {
    match auth_service::authenticate_admin(&state.db_pool, &state.config.admin_token, &form).await {
        Ok(identity) => {
            start_session(&session, &identity).await?;
            Ok(Redirect::to("/admin"))
        }
        Err(AppError::InvalidCredentials) => Ok(login_error("Credenciais inválidas.")),
        Err(AppError::BadRequest(msg)) => Ok(login_error(&msg)),
        Err(e) => Err(e),
    }
}

fn login_error(message: &str) -> Redirect {
    Redirect::to(&format!("/admin/login?error={}", urlencoding::encode(message)))
}

// GET /admin/logout
pub async fn handle_logout(session: Session) -> AppResult<Redirect> {
    end_session(&session).await?;
    Ok(Redirect::to("/admin/login"))
}

// GET /admin
pub async fn show_dashboard(
    State(state): State<AppState>,
    Extension(AdminUser(admin)): Extension<AdminUser>,
) -> AppResult<Html<String>> {
    let stats = stats_service::compute(&state.db_pool).await?;
    let registros = pre_registration_service::list(&state.db_pool).await?;
    let pagas = registros
        .iter()
        .filter(|r| r.payment_status == PaymentStatus::Paid)
        .count();

    render(&DashboardPage::new(admin, stats, registros.len(), pagas))
}
