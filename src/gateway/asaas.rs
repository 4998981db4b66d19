// src/gateway/asaas.rs
//
// Cliente mínimo para a API v3 do Asaas.
// Autenticação: cabeçalho `access_token`.

use super::{BillingType, Charge, GatewayError, GatewayResult, NewCharge, NewCustomer, PaymentGateway, PixQrCode};
use crate::config::AsaasConfig;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;

/// Cabeçalho onde o Asaas envia o token configurado para o webhook.
pub const WEBHOOK_TOKEN_HEADER: &str = "asaas-access-token";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CustomerRequest<'a> {
    name: &'a str,
    email: &'a str,
    cpf_cnpj: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    mobile_phone: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    postal_code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    address_number: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    complement: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct CustomerResponse {
    id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PaymentRequest<'a> {
    customer: &'a str,
    billing_type: BillingType,
    value: f64,
    // YYYY-MM-DD
    due_date: String,
    description: &'a str,
    external_reference: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaymentResponse {
    id: String,
    status: String,
    // O Asaas pode devolver "UNDEFINED"; nesse caso fica None
    #[serde(default)]
    billing_type: Option<String>,
    #[serde(default)]
    value: Option<f64>,
    #[serde(default)]
    invoice_url: Option<String>,
    #[serde(default)]
    bank_slip_url: Option<String>,
    #[serde(default)]
    due_date: Option<NaiveDate>,
}

/// Envelope das listagens do Asaas.
#[derive(Debug, Deserialize)]
struct PaymentList {
    #[serde(default)]
    data: Vec<PaymentResponse>,
}

impl From<PaymentResponse> for Charge {
    fn from(p: PaymentResponse) -> Self {
        let billing_type = p.billing_type.as_deref().and_then(|bt| match bt {
            "PIX" => Some(BillingType::Pix),
            "BOLETO" => Some(BillingType::Boleto),
            "CREDIT_CARD" => Some(BillingType::CreditCard),
            _ => None,
        });
        Charge {
            id: p.id,
            status: p.status,
            billing_type,
            value: p.value,
            invoice_url: p.invoice_url,
            bank_slip_url: p.bank_slip_url,
            due_date: p.due_date,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PixQrCodeResponse {
    payload: String,
    #[serde(default)]
    encoded_image: Option<String>,
    #[serde(default)]
    expiration_date: Option<String>,
}

/// Corpo de um webhook do Asaas (só os campos que usamos).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsaasWebhookEvent {
    pub event: String,
    pub payment: WebhookPayment,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayment {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub billing_type: Option<String>,
}

impl AsaasWebhookEvent {
    /// Só estes eventos levam a reconsultar a cobrança.
    pub fn is_payment_settlement(&self) -> bool {
        matches!(self.event.as_str(), "PAYMENT_RECEIVED" | "PAYMENT_CONFIRMED")
    }
}

#[derive(Clone)]
pub struct AsaasClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl AsaasClient {
    pub fn new(config: &AsaasConfig) -> GatewayResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .user_agent(concat!("metis/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Envia o pedido e lê o corpo como JSON; status != 2xx vira `GatewayError::Api`.
    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> GatewayResult<T> {
        let resp = request
            .header("access_token", &self.api_key)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            tracing::error!("Asaas respondeu {}: {}", status, body);
            return Err(GatewayError::Api {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str::<T>(&body)
            .map_err(|e| GatewayError::InvalidResponse(format!("{e}; body={body}")))
    }
}

#[async_trait]
impl PaymentGateway for AsaasClient {
    async fn create_customer(&self, customer: &NewCustomer) -> GatewayResult<String> {
        tracing::debug!("Asaas: criando cliente para {}", customer.email);
        let body = CustomerRequest {
            name: &customer.name,
            email: &customer.email,
            cpf_cnpj: &customer.cpf_cnpj,
            mobile_phone: customer.mobile_phone.as_deref(),
            postal_code: customer.postal_code.as_deref(),
            address_number: customer.address_number.as_deref(),
            complement: customer.complement.as_deref(),
        };
        let created: CustomerResponse = self
            .send(self.http.post(self.url("/customers")).json(&body))
            .await?;
        tracing::info!("Asaas: cliente {} criado", created.id);
        Ok(created.id)
    }

    async fn create_charge(&self, charge: &NewCharge) -> GatewayResult<Charge> {
        tracing::debug!(
            "Asaas: criando cobrança {} de {:.2} para {}",
            charge.billing_type,
            charge.value,
            charge.customer_id
        );
        let body = PaymentRequest {
            customer: &charge.customer_id,
            billing_type: charge.billing_type,
            value: charge.value,
            due_date: charge.due_date.format("%Y-%m-%d").to_string(),
            description: &charge.description,
            external_reference: &charge.external_reference,
        };
        let created: PaymentResponse = self
            .send(self.http.post(self.url("/payments")).json(&body))
            .await?;
        tracing::info!("Asaas: cobrança {} criada ({})", created.id, created.status);
        Ok(created.into())
    }

    async fn get_charge(&self, charge_id: &str) -> GatewayResult<Charge> {
        tracing::debug!("Asaas: consultando cobrança {}", charge_id);
        let payment: PaymentResponse = self
            .send(self.http.get(self.url(&format!("/payments/{charge_id}"))))
            .await?;
        Ok(payment.into())
    }

    async fn find_charge_by_reference(
        &self,
        external_reference: &str,
        billing_type: BillingType,
    ) -> GatewayResult<Option<Charge>> {
        tracing::debug!("Asaas: procurando cobrança {} de {}", billing_type, external_reference);
        let request = self.http.get(self.url("/payments")).query(&[
            ("externalReference", external_reference),
            ("billingType", billing_type.as_str()),
        ]);
        let list: PaymentList = self.send(request).await?;
        Ok(list.data.into_iter().next().map(Charge::from))
    }

    async fn get_pix_qr_code(&self, charge_id: &str) -> GatewayResult<PixQrCode> {
        tracing::debug!("Asaas: obtendo QR Code PIX de {}", charge_id);
        let qr: PixQrCodeResponse = self
            .send(self.http.get(self.url(&format!("/payments/{charge_id}/pixQrCode"))))
            .await?;
        Ok(PixQrCode {
            payload: qr.payload,
            encoded_image: qr.encoded_image,
            expiration_date: qr.expiration_date,
        })
    }
}
