// src/web/checkout_handlers.rs
use crate::{
    error::AppResult,
    gateway::BillingType,
    models::pre_registration::{ChargeView, PaymentStatusView, PreRegistrationForm, PreRegistrationView},
    services::checkout_service,
    state::AppState,
    web::JsonBody,
};
use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

// POST /api/create-pre-registration
pub async fn create_pre_registration(
    State(state): State<AppState>,
    JsonBody(form): JsonBody<PreRegistrationForm>,
) -> AppResult<Json<Value>> {
    tracing::info!("Nova pré-matrícula recebida para {}", form.email);
    let registro = checkout_service::submit(
        &state.db_pool,
        state.gateway.as_ref(),
        state.config.charge_mode,
        form,
    )
    .await?;

    Ok(Json(json!({
        "success": true,
        "preRegistrationId": registro.id,
        "message": "Pré-matrícula registada. Escolha a forma de pagamento.",
    })))
}

async fn create_payment(state: &AppState, id: &str, billing_type: BillingType) -> AppResult<Json<ChargeView>> {
    tracing::info!("Pedido de cobrança {} para {}", billing_type, id);
    let view = checkout_service::request_charge(&state.db_pool, state.gateway.as_ref(), id, billing_type).await?;
    Ok(Json(view))
}

// POST /api/create-pix-payment/{id}
pub async fn create_pix_payment(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<Json<ChargeView>> {
    create_payment(&state, &id, BillingType::Pix).await
}

// POST /api/create-boleto-payment/{id}
pub async fn create_boleto_payment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ChargeView>> {
    create_payment(&state, &id, BillingType::Boleto).await
}

// POST /api/create-creditcard-payment/{id}
pub async fn create_credit_card_payment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ChargeView>> {
    create_payment(&state, &id, BillingType::CreditCard).await
}

// GET /api/pre-registration/{id}
pub async fn get_pre_registration(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<PreRegistrationView>> {
    Ok(Json(checkout_service::get_pre_registration(&state.db_pool, &id).await?))
}

// GET /api/payment-status/{id}
pub async fn payment_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<PaymentStatusView>> {
    let view = checkout_service::refresh_payment_status(&state.db_pool, state.gateway.as_ref(), &id).await?;
    Ok(Json(view))
}
