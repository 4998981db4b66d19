// src/services/checkout_service.rs
//! Orquestração do checkout: pré-matrícula, cliente no gateway, cobranças e
//! confirmação de pagamento.
//!
//! Ciclo de vida de uma pré-matrícula:
//! `criada -> cliente ligado -> {cobrança pedida}* -> paga`.
use crate::{
    config::ChargeMode,
    error::{AppError, AppResult},
    gateway::{charge_due_date, is_settled, AsaasWebhookEvent, BillingType, NewCharge, NewCustomer, PaymentGateway},
    models::pre_registration::{
        ChargeStatusItem, ChargeView, NovaPreMatricula, PaymentStatus, PaymentStatusView, PreRegistration,
        PreRegistrationForm, PreRegistrationView,
    },
    services::pre_registration_service::{self, SlotReservation},
};
use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use validator::Validate;

/// Valida, grava e cria o cliente no gateway.
///
/// Nenhuma chamada ao gateway acontece se a validação falhar. Se a criação do
/// cliente falhar a linha fica `pending` sem cliente e o erro sobe (502).
pub async fn submit(
    db_pool: &SqlitePool,
    gateway: &dyn PaymentGateway,
    charge_mode: ChargeMode,
    form: PreRegistrationForm,
) -> AppResult<PreRegistration> {
    form.validate()?;
    let nova = NovaPreMatricula::from(form);

    let mut registro = pre_registration_service::create(db_pool, &nova).await?;

    let customer = NewCustomer {
        name: registro.nome.clone(),
        email: registro.email.clone(),
        cpf_cnpj: registro.cpf.clone(),
        mobile_phone: Some(registro.telefone.clone()),
        postal_code: Some(registro.postal_code.clone()),
        address_number: Some(registro.address_number.clone()),
        complement: registro.complement.clone(),
    };
    let customer_id = match gateway.create_customer(&customer).await {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!("Pré-matrícula {} ficou sem cliente no gateway: {}", registro.id, e);
            return Err(e.into());
        }
    };
    pre_registration_service::set_customer_id(db_pool, &registro.id, &customer_id).await?;
    registro.gateway_customer_id = Some(customer_id);

    if charge_mode == ChargeMode::Eager {
        for billing_type in BillingType::ALL {
            if let Err(e) = request_charge(db_pool, gateway, &registro.id, billing_type).await {
                // A pré-matrícula continua válida; a cobrança pode ser pedida depois
                tracing::warn!(
                    "Cobrança {} antecipada falhou para {}: {}",
                    billing_type,
                    registro.id,
                    e
                );
            }
        }
    }

    Ok(registro)
}

/// Cria (no máximo uma vez por tipo) a cobrança `billing_type` da pré-matrícula.
pub async fn request_charge(
    db_pool: &SqlitePool,
    gateway: &dyn PaymentGateway,
    pre_registration_id: &str,
    billing_type: BillingType,
) -> AppResult<ChargeView> {
    request_charge_on(db_pool, gateway, pre_registration_id, billing_type, Utc::now().date_naive()).await
}

async fn request_charge_on(
    db_pool: &SqlitePool,
    gateway: &dyn PaymentGateway,
    pre_registration_id: &str,
    billing_type: BillingType,
    today: NaiveDate,
) -> AppResult<ChargeView> {
    let registro = pre_registration_service::find(db_pool, pre_registration_id)
        .await?
        .ok_or(AppError::NotFound("Pré-matrícula não encontrada"))?;

    if registro.payment_status == PaymentStatus::Paid {
        return Err(AppError::Conflict("Esta pré-matrícula já está paga.".to_string()));
    }
    let customer_id = registro.gateway_customer_id.clone().ok_or_else(|| {
        AppError::Conflict("Cliente ainda não registado no sistema de pagamentos.".to_string())
    })?;

    let reservation = pre_registration_service::reserve_charge_slot(db_pool, &registro.id, billing_type).await?;
    if reservation == SlotReservation::Taken {
        let existing = pre_registration_service::find_charge(db_pool, &registro.id, billing_type).await?;
        return Err(AppError::ChargeAlreadyExists {
            pre_registration_id: registro.id,
            billing_type,
            payment_id: existing.and_then(|c| c.gateway_charge_id),
        });
    }

    // Um pedido anterior pode ter criado a cobrança sem chegar a gravá-la
    let previous = if reservation == SlotReservation::Reclaimed {
        match gateway.find_charge_by_reference(&registro.id, billing_type).await {
            Ok(found) => found,
            Err(e) => {
                release_slot(db_pool, &registro.id, billing_type).await;
                return Err(e.into());
            }
        }
    } else {
        None
    };

    let charge = match previous {
        Some(charge) => {
            tracing::info!("Cobrança {} já existia no gateway para {}", charge.id, registro.id);
            charge
        }
        None => {
            let new_charge = NewCharge {
                customer_id,
                billing_type,
                value: registro.amount,
                due_date: charge_due_date(today),
                description: format!("Métis - {} ({})", registro.plano, registro.nome),
                external_reference: registro.id.clone(),
            };
            match gateway.create_charge(&new_charge).await {
                Ok(charge) => charge,
                Err(e) => {
                    release_slot(db_pool, &registro.id, billing_type).await;
                    return Err(e.into());
                }
            }
        }
    };

    if let Err(e) =
        pre_registration_service::attach_gateway_charge(db_pool, &registro.id, billing_type, &charge.id, &charge.status)
            .await
    {
        // A reserva fica; será retomada e reconciliada pela referência
        tracing::error!(
            "Cobrança {} criada no gateway mas não gravada para {}: {}",
            charge.id,
            registro.id,
            e
        );
        return Err(e);
    }

    let pix = if billing_type == BillingType::Pix {
        match gateway.get_pix_qr_code(&charge.id).await {
            Ok(qr) => Some(qr),
            Err(e) => {
                tracing::warn!("QR Code PIX indisponível para {}: {}", charge.id, e);
                None
            }
        }
    } else {
        None
    };

    let due_date = charge.due_date.unwrap_or_else(|| charge_due_date(today));
    Ok(ChargeView::new(billing_type, charge, due_date.format("%Y-%m-%d").to_string(), pix))
}

/// Liberta a reserva depois de uma falha no gateway; o erro original é o que sobe.
async fn release_slot(db_pool: &SqlitePool, pre_registration_id: &str, billing_type: BillingType) {
    if let Err(e) = pre_registration_service::release_charge_slot(db_pool, pre_registration_id, billing_type).await {
        tracing::error!(
            "Não foi possível libertar a vaga {} de {}: {}",
            billing_type,
            pre_registration_id,
            e
        );
    }
}

pub async fn get_pre_registration(db_pool: &SqlitePool, id: &str) -> AppResult<PreRegistrationView> {
    let registro = pre_registration_service::find(db_pool, id)
        .await?
        .ok_or(AppError::NotFound("Pré-matrícula não encontrada"))?;
    let charges = pre_registration_service::find_charges(db_pool, id).await?;
    Ok(PreRegistrationView::new(registro, &charges))
}

/// O que aconteceu com um webhook recebido.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    /// Evento que não é de pagamento recebido/confirmado.
    Ignored,
    /// O gateway diz que a cobrança ainda não foi paga.
    NotSettled(String),
    /// Cobrança que não é nossa.
    UnknownCharge,
    Confirmed {
        pre_registration_id: String,
        billing_type: BillingType,
    },
}

/// Processa um evento do webhook. O estado que vem no corpo nunca é usado:
/// a cobrança é sempre reconsultada no gateway.
pub async fn confirm_charge(
    db_pool: &SqlitePool,
    gateway: &dyn PaymentGateway,
    event: &AsaasWebhookEvent,
) -> AppResult<ConfirmationOutcome> {
    if !event.is_payment_settlement() {
        tracing::debug!("Webhook {} ignorado", event.event);
        return Ok(ConfirmationOutcome::Ignored);
    }

    let fresh = gateway
        .get_charge(&event.payment.id)
        .await
        .map_err(AppError::VerificationFailed)?;

    if !is_settled(&fresh.status) {
        tracing::warn!(
            "Webhook {} para {} mas o gateway diz {}",
            event.event,
            fresh.id,
            fresh.status
        );
        return Ok(ConfirmationOutcome::NotSettled(fresh.status));
    }

    settle(db_pool, &event.payment.id, &fresh.status).await
}

async fn settle(db_pool: &SqlitePool, gateway_charge_id: &str, status: &str) -> AppResult<ConfirmationOutcome> {
    let Some(charge) = pre_registration_service::find_charge_by_gateway_id(db_pool, gateway_charge_id).await? else {
        tracing::warn!("Cobrança {} não corresponde a nenhuma pré-matrícula", gateway_charge_id);
        return Ok(ConfirmationOutcome::UnknownCharge);
    };

    pre_registration_service::update_charge_status(db_pool, gateway_charge_id, status).await?;
    pre_registration_service::mark_paid(db_pool, &charge.pre_registration_id, charge.billing_type).await?;

    Ok(ConfirmationOutcome::Confirmed {
        pre_registration_id: charge.pre_registration_id,
        billing_type: charge.billing_type,
    })
}

/// Consulta manual: reconsulta no gateway as cobranças ainda por pagar e
/// confirma as que já foram pagas, tal como o webhook faria.
pub async fn refresh_payment_status(
    db_pool: &SqlitePool,
    gateway: &dyn PaymentGateway,
    id: &str,
) -> AppResult<PaymentStatusView> {
    if pre_registration_service::find(db_pool, id).await?.is_none() {
        return Err(AppError::NotFound("Pré-matrícula não encontrada"));
    }

    for charge in pre_registration_service::find_charges(db_pool, id).await? {
        let Some(gateway_id) = charge.gateway_charge_id.as_deref() else {
            continue;
        };
        if is_settled(&charge.status) {
            continue;
        }
        match gateway.get_charge(gateway_id).await {
            Ok(fresh) if is_settled(&fresh.status) => {
                settle(db_pool, gateway_id, &fresh.status).await?;
            }
            Ok(fresh) if fresh.status != charge.status => {
                pre_registration_service::update_charge_status(db_pool, gateway_id, &fresh.status).await?;
            }
            Ok(_) => {}
            Err(e) => {
                // Fica o último estado conhecido
                tracing::warn!("Não foi possível consultar a cobrança {}: {}", gateway_id, e);
            }
        }
    }

    let registro = pre_registration_service::find(db_pool, id)
        .await?
        .ok_or(AppError::NotFound("Pré-matrícula não encontrada"))?;
    let charges = pre_registration_service::find_charges(db_pool, id)
        .await?
        .into_iter()
        .map(|c| ChargeStatusItem {
            billing_type: c.billing_type,
            payment_id: c.gateway_charge_id,
            status: c.status,
        })
        .collect();

    Ok(PaymentStatusView {
        pre_registration_id: registro.id,
        payment_status: registro.payment_status,
        payment_method: registro.payment_method,
        charges,
    })
}
