// src/error.rs
use crate::gateway::{BillingType, GatewayError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Erro na base de dados: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Erro de migração da base de dados: {0}")]
    SqlxMigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Dados inválidos: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Pedido inválido: {0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    // Já existe uma cobrança deste tipo para a pré-matrícula
    #[error("Já existe uma cobrança {billing_type} para a pré-matrícula {pre_registration_id}")]
    ChargeAlreadyExists {
        pre_registration_id: String,
        billing_type: BillingType,
        payment_id: Option<String>,
    },

    #[error("Erro no gateway de pagamento: {0}")]
    Gateway(#[from] GatewayError),

    // Falha ao reconsultar a cobrança durante o webhook (responde 500, não 502)
    #[error("Falha ao verificar a cobrança no gateway: {0}")]
    VerificationFailed(GatewayError),

    #[error("Erro ao processar password")]
    PasswordHashingError,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Erro na sessão: {0}")]
    SessionError(String),

    #[error("Configuração em falta: {0}")]
    Misconfigured(String),

    #[error("Erro interno inesperado")]
    InternalServerError,

    #[error("Não autorizado")]
    Unauthorized,
}

// Como converter AppError numa resposta HTTP (JSON)
impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        // Erros do cliente não precisam de nível error nos logs
        match &self {
            AppError::Validation(_)
            | AppError::BadRequest(_)
            | AppError::NotFound(_)
            | AppError::Conflict(_)
            | AppError::ChargeAlreadyExists { .. }
            | AppError::InvalidCredentials
            | AppError::Unauthorized => tracing::warn!("Pedido recusado: {}", self),
            _ => tracing::error!("Erro processado: {:?}", self),
        }

        let (status, body) = match self {
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                json!({ "message": "Dados inválidos", "errors": field_errors(&errors) }),
            ),
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, json!({ "message": message })),
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, json!({ "message": message })),
            AppError::Conflict(message) => (StatusCode::CONFLICT, json!({ "message": message })),
            AppError::ChargeAlreadyExists {
                billing_type,
                payment_id,
                ..
            } => (
                StatusCode::CONFLICT,
                json!({
                    "message": format!("Já existe um pagamento {} para esta pré-matrícula.", billing_type),
                    "paymentType": billing_type,
                    "paymentId": payment_id,
                }),
            ),
            // O detalhe do gateway fica só nos logs
            AppError::Gateway(_) => (
                StatusCode::BAD_GATEWAY,
                json!({ "message": "Não foi possível comunicar com o sistema de pagamentos. Tente novamente em instantes." }),
            ),
            AppError::VerificationFailed(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "message": "Falha ao verificar o pagamento." }),
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                json!({ "message": "Credenciais inválidas." }),
            ),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, json!({ "message": "Não autorizado." })),
            AppError::SqlxError(_) | AppError::SqlxMigrateError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "message": "Erro ao aceder aos dados." }),
            ),
            AppError::Misconfigured(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "message": "Erro de configuração do servidor." }),
            ),
            AppError::SessionError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "message": "Erro na gestão da sua sessão." }),
            ),
            AppError::PasswordHashingError | AppError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "message": "Ocorreu um erro inesperado." }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

/// Achata os erros do validator em `[{field, message}]`, com os nomes em camelCase
/// (os mesmos que o cliente enviou no JSON).
fn field_errors(errors: &ValidationErrors) -> Vec<serde_json::Value> {
    let mut out: Vec<serde_json::Value> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let field = camel_case(&field);
            errs.iter().map(move |e| {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                json!({ "field": field.clone(), "message": message })
            })
        })
        .collect();
    // HashMap não tem ordem; ordenamos para respostas estáveis
    out.sort_by(|a, b| a["field"].as_str().cmp(&b["field"].as_str()));
    out
}

fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

// Tipo Result padrão para a aplicação
pub type AppResult<T = ()> = Result<T, AppError>;
