// src/web/webhook_handlers.rs
use crate::{
    error::{AppError, AppResult},
    gateway::{asaas::WEBHOOK_TOKEN_HEADER, AsaasWebhookEvent},
    services::checkout_service::{self, ConfirmationOutcome},
    state::AppState,
};
use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use serde_json::{json, Value};

// POST /api/asaas-webhook
pub async fn asaas_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<Value>> {
    let expected = state
        .config
        .webhook_token
        .as_deref()
        .ok_or_else(|| AppError::Misconfigured("ASAAS_WEBHOOK_TOKEN não definido".to_string()))?;

    let received = headers
        .get(WEBHOOK_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok());
    if received != Some(expected) {
        tracing::warn!("Webhook recusado: token ausente ou inválido");
        return Err(AppError::Unauthorized);
    }

    let event: AsaasWebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Corpo do webhook inválido: {}", e)))?;
    tracing::info!("Webhook {} recebido para {}", event.event, event.payment.id);

    match checkout_service::confirm_charge(&state.db_pool, state.gateway.as_ref(), &event).await? {
        ConfirmationOutcome::Confirmed {
            pre_registration_id,
            billing_type,
        } => tracing::info!("Pagamento {} confirmado para {}", billing_type, pre_registration_id),
        outcome => tracing::debug!("Webhook sem alterações: {:?}", outcome),
    }

    Ok(Json(json!({ "received": true })))
}
