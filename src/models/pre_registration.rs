// src/models/pre_registration.rs
use crate::gateway::{BillingType, Charge, PixQrCode};
use crate::models::validation::{digits_only, nao_vazio, opcional, validar_cep, validar_cpf, validar_telefone};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
}

/// Linha da tabela `pre_registrations`.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreRegistration {
    pub id: String,
    pub nome: String,
    pub email: String,
    pub telefone: String,
    pub cpf: String,
    pub idade: i64,
    pub plano: String,
    pub horario: Option<String>,
    pub dia_preferencia: Option<String>,
    pub observacoes: Option<String>,
    pub amount: f64,
    pub postal_code: String,
    pub address_number: String,
    pub complement: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub gateway_customer_id: Option<String>,
    // Só preenchido depois de o pagamento ser confirmado
    pub payment_method: Option<BillingType>,
    pub payment_status: PaymentStatus,
    pub created_at: NaiveDateTime,
}

/// Linha da tabela `charges`: uma por (pré-matrícula, tipo).
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeRecord {
    pub id: i64,
    pub pre_registration_id: String,
    pub billing_type: BillingType,
    // None enquanto o pedido ao gateway está em curso
    pub gateway_charge_id: Option<String>,
    pub status: String,
    pub created_at: NaiveDateTime,
}

/// Estado de uma cobrança reservada mas ainda sem id do gateway.
pub const CHARGE_REQUESTING: &str = "REQUESTING";

/// Pré-matrícula + ids das cobranças, no formato que o checkout consome.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreRegistrationView {
    #[serde(flatten)]
    pub registro: PreRegistration,
    pub pix_charge_id: Option<String>,
    pub boleto_charge_id: Option<String>,
    pub credit_card_charge_id: Option<String>,
}

impl PreRegistrationView {
    pub fn new(registro: PreRegistration, charges: &[ChargeRecord]) -> Self {
        let id_de = |bt: BillingType| {
            charges
                .iter()
                .find(|c| c.billing_type == bt)
                .and_then(|c| c.gateway_charge_id.clone())
        };
        Self {
            pix_charge_id: id_de(BillingType::Pix),
            boleto_charge_id: id_de(BillingType::Boleto),
            credit_card_charge_id: id_de(BillingType::CreditCard),
            registro,
        }
    }
}

/// Corpo de POST /api/create-pre-registration.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PreRegistrationForm {
    #[validate(length(min = 1, max = 255, message = "Nome é obrigatório"), custom(function = "nao_vazio"))]
    pub nome: String,
    #[validate(email(message = "E-mail inválido"))]
    pub email: String,
    #[validate(custom(function = "validar_telefone"))]
    pub telefone: String,
    #[validate(custom(function = "validar_cpf"))]
    pub cpf: String,
    #[validate(range(min = 1, max = 120, message = "Idade deve ser positiva"))]
    pub idade: i64,
    #[validate(length(min = 1, message = "Plano é obrigatório"))]
    pub plano: String,
    pub horario: Option<String>,
    pub dia_preferencia: Option<String>,
    #[validate(length(max = 1000, message = "Observações muito longas"))]
    pub observacoes: Option<String>,
    #[validate(range(min = 1.0, message = "Valor deve ser positivo"))]
    pub amount: f64,
    // Endereço: obrigatório para a nota fiscal
    #[validate(custom(function = "validar_cep"))]
    pub postal_code: String,
    #[validate(length(min = 1, max = 20, message = "Número do endereço é obrigatório"))]
    pub address_number: String,
    #[validate(length(max = 255, message = "Complemento muito longo"))]
    pub complement: Option<String>,
}

/// Dados já normalizados, prontos a inserir.
#[derive(Debug, Clone)]
pub struct NovaPreMatricula {
    pub nome: String,
    pub email: String,
    pub telefone: String,
    pub cpf: String,
    pub idade: i64,
    pub plano: String,
    pub horario: Option<String>,
    pub dia_preferencia: Option<String>,
    pub observacoes: Option<String>,
    pub amount: f64,
    pub postal_code: String,
    pub address_number: String,
    pub complement: Option<String>,
}

impl From<PreRegistrationForm> for NovaPreMatricula {
    fn from(f: PreRegistrationForm) -> Self {
        Self {
            nome: f.nome.trim().to_string(),
            email: f.email.trim().to_lowercase(),
            telefone: digits_only(&f.telefone),
            cpf: digits_only(&f.cpf),
            idade: f.idade,
            plano: f.plano.trim().to_string(),
            horario: opcional(f.horario),
            dia_preferencia: opcional(f.dia_preferencia),
            observacoes: opcional(f.observacoes),
            amount: f.amount,
            postal_code: f.postal_code.trim().to_string(),
            address_number: f.address_number.trim().to_string(),
            complement: opcional(f.complement),
        }
    }
}

/// Resposta de POST /api/create-{pix,boleto,creditcard}-payment/{id}.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeView {
    pub success: bool,
    pub payment_id: String,
    pub payment_type: BillingType,
    pub status: String,
    pub due_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_code_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_slip_url: Option<String>,
    // Página de pagamento do gateway (usada no cartão de crédito)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl ChargeView {
    pub fn new(billing_type: BillingType, charge: Charge, due_date: String, pix: Option<PixQrCode>) -> Self {
        let (qr_code, qr_code_image) = match pix {
            Some(qr) => (Some(qr.payload), qr.encoded_image),
            None => (None, None),
        };
        Self {
            success: true,
            payment_id: charge.id,
            payment_type: billing_type,
            status: charge.status,
            due_date,
            qr_code,
            qr_code_image,
            bank_slip_url: charge.bank_slip_url,
            url: charge.invoice_url,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeStatusItem {
    pub billing_type: BillingType,
    pub payment_id: Option<String>,
    pub status: String,
}

/// Resposta de GET /api/payment-status/{id}.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatusView {
    pub pre_registration_id: String,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<BillingType>,
    pub charges: Vec<ChargeStatusItem>,
}
