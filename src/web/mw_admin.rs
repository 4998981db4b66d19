// src/web/mw_admin.rs
use crate::{
    error::AppError,
    web::mw_auth::{current_admin, AdminUser},
};
use axum::{extract::Request, middleware::Next, response::Response};
use tower_sessions::Session;

/// Middleware da API admin: sem login responde 401 em JSON (sem redirecionar).
pub async fn require_admin(session: Session, mut request: Request, next: Next) -> Result<Response, AppError> {
    match current_admin(&session).await? {
        Some(admin) => {
            tracing::debug!("Admin MW: acesso concedido para {}", admin);
            request.extensions_mut().insert(AdminUser(admin));
            Ok(next.run(request).await)
        }
        None => {
            tracing::warn!("Admin MW: pedido sem sessão admin para {}", request.uri().path());
            Err(AppError::Unauthorized)
        }
    }
}
