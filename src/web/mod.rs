// src/web/mod.rs
pub mod admin_handlers;
pub mod auth_handlers;
pub mod checkout_handlers;
pub mod mw_admin;
pub mod mw_auth;
pub mod routes;
pub mod webhook_handlers;

use crate::error::AppError;
use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;

/// `Json<T>` que rejeita corpos inválidos com 400 no formato de erro da API
/// (em vez do 415/422 de texto simples do axum).
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(AppError::BadRequest(rejection.body_text())),
        }
    }
}
