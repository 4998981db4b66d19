// src/web/mw_auth.rs
use crate::error::AppError;
use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

/// Chave da sessão onde fica a identidade do admin autenticado.
pub const ADMIN_SESSION_KEY: &str = "admin_user";

// Guardado nas extensões da requisição para os handlers protegidos
#[derive(Clone, Debug)]
pub struct AdminUser(pub String);

/// Lê o admin da sessão (None se não houver login).
pub async fn current_admin(session: &Session) -> Result<Option<String>, AppError> {
    session.get::<String>(ADMIN_SESSION_KEY).await.map_err(|e| {
        tracing::error!("Erro ao ler sessão: {:?}", e);
        AppError::SessionError(format!("Erro ao verificar sessão: {}", e))
    })
}

/// Middleware das páginas HTML: sem login redireciona para /admin/login.
pub async fn require_auth(session: Session, mut request: Request, next: Next) -> Result<Response, AppError> {
    match current_admin(&session).await? {
        Some(admin) => {
            tracing::debug!("Autenticação MW: admin '{}' autenticado. Prosseguindo...", admin);
            request.extensions_mut().insert(AdminUser(admin));
            Ok(next.run(request).await)
        }
        None => {
            tracing::debug!("Autenticação MW: não autenticado. Redirecionando para /admin/login");
            Ok(Redirect::to("/admin/login").into_response())
        }
    }
}
