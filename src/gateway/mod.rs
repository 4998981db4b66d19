// src/gateway/mod.rs
//! Integração com o gateway de pagamentos.
//!
//! O resto da aplicação só conhece o trait [`PaymentGateway`]; a implementação
//! real é o [`AsaasClient`]. Nenhum estado local é guardado aqui.

pub mod asaas;

pub use asaas::{AsaasClient, AsaasWebhookEvent};

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Dias entre a criação da cobrança e o vencimento.
pub const DUE_DAYS: u64 = 7;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("erro http: {0}")]
    Http(#[from] reqwest::Error),

    #[error("gateway respondeu status={status} body={body}")]
    Api { status: u16, body: String },

    #[error("resposta inválida do gateway: {0}")]
    InvalidResponse(String),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Tipo de cobrança no gateway (PIX, boleto ou cartão).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillingType {
    Pix,
    Boleto,
    CreditCard,
}

impl BillingType {
    pub const ALL: [BillingType; 3] = [BillingType::Pix, BillingType::Boleto, BillingType::CreditCard];

    pub fn as_str(self) -> &'static str {
        match self {
            BillingType::Pix => "PIX",
            BillingType::Boleto => "BOLETO",
            BillingType::CreditCard => "CREDIT_CARD",
        }
    }
}

impl fmt::Display for BillingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Estados em que o dinheiro já entrou.
pub fn is_settled(status: &str) -> bool {
    matches!(status, "RECEIVED" | "CONFIRMED")
}

/// Vencimento de uma cobrança criada em `today`.
pub fn charge_due_date(today: NaiveDate) -> NaiveDate {
    today + Days::new(DUE_DAYS)
}

#[derive(Debug, Clone, Default)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    pub cpf_cnpj: String,
    pub mobile_phone: Option<String>,
    pub postal_code: Option<String>,
    pub address_number: Option<String>,
    pub complement: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewCharge {
    pub customer_id: String,
    pub billing_type: BillingType,
    pub value: f64,
    pub due_date: NaiveDate,
    pub description: String,
    pub external_reference: String,
}

/// Cobrança tal como o gateway a devolve.
#[derive(Debug, Clone, PartialEq)]
pub struct Charge {
    pub id: String,
    pub status: String,
    pub billing_type: Option<BillingType>,
    pub value: Option<f64>,
    pub invoice_url: Option<String>,
    pub bank_slip_url: Option<String>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PixQrCode {
    pub payload: String,
    pub encoded_image: Option<String>,
    pub expiration_date: Option<String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Cria o cliente no gateway e devolve o seu id.
    async fn create_customer(&self, customer: &NewCustomer) -> GatewayResult<String>;

    async fn create_charge(&self, charge: &NewCharge) -> GatewayResult<Charge>;

    /// Leitura direta do estado atual da cobrança.
    async fn get_charge(&self, charge_id: &str) -> GatewayResult<Charge>;

    /// Cobrança ativa com esta `external_reference` e tipo, se existir.
    async fn find_charge_by_reference(
        &self,
        external_reference: &str,
        billing_type: BillingType,
    ) -> GatewayResult<Option<Charge>>;

    async fn get_pix_qr_code(&self, charge_id: &str) -> GatewayResult<PixQrCode>;
}
