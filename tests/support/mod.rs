// tests/support/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use metis::{
    config::AppConfig,
    db,
    gateway::{BillingType, Charge, GatewayError, GatewayResult, NewCharge, NewCustomer, PaymentGateway, PixQrCode},
    state::AppState,
    web,
};
use serde_json::{json, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::{
    collections::HashMap,
    str::FromStr,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
};
use tower::ServiceExt;
use tower_sessions::{MemoryStore, SessionManagerLayer};

pub const ADMIN_TOKEN: &str = "segredo-admin";
pub const WEBHOOK_TOKEN: &str = "token-webhook";

/// SQLite em memória com as migrações aplicadas. Uma só conexão que nunca
/// expira, senão a base de dados desaparece.
pub async fn test_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .unwrap();
    db::run_migrations(&pool).await.unwrap();
    pool
}

pub fn test_config(extra: &[(&str, &str)]) -> AppConfig {
    let mut vars: HashMap<String, String> = [
        ("DATABASE_URL", "sqlite::memory:"),
        ("ADMIN_TOKEN", ADMIN_TOKEN),
        ("ASAAS_API_KEY", "$aact_teste"),
        ("ASAAS_WEBHOOK_TOKEN", WEBHOOK_TOKEN),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    for (k, v) in extra {
        vars.insert(k.to_string(), v.to_string());
    }
    AppConfig::from_lookup(move |key: &str| vars.get(key).cloned()).unwrap()
}

/// Gateway falso: guarda o que lhe pedem e devolve estados configuráveis.
#[derive(Default)]
pub struct FakeGateway {
    next_id: AtomicUsize,
    pub customers: AtomicUsize,
    pub charges: Mutex<Vec<NewCharge>>,
    pub get_charge_calls: AtomicUsize,
    statuses: Mutex<HashMap<String, (String, BillingType)>>,
    // (external_reference, tipo) -> id da cobrança
    references: Mutex<HashMap<(String, BillingType), String>>,
    pub fail_customer: AtomicBool,
    pub fail_charge: AtomicBool,
    pub fail_get_charge: AtomicBool,
}

impl FakeGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn charges_created(&self) -> usize {
        self.charges.lock().unwrap().len()
    }

    pub fn customers_created(&self) -> usize {
        self.customers.load(Ordering::SeqCst)
    }

    /// Muda o estado que `get_charge` devolve (cria a cobrança se não existir).
    pub fn set_status(&self, charge_id: &str, status: &str) {
        let mut statuses = self.statuses.lock().unwrap();
        let billing_type = statuses
            .get(charge_id)
            .map(|(_, bt)| *bt)
            .unwrap_or(BillingType::Pix);
        statuses.insert(charge_id.to_string(), (status.to_string(), billing_type));
    }

    fn api_error(status: u16) -> GatewayError {
        GatewayError::Api {
            status,
            body: "{\"errors\":[{\"code\":\"falha_simulada\"}]}".to_string(),
        }
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_customer(&self, _customer: &NewCustomer) -> GatewayResult<String> {
        if self.fail_customer.load(Ordering::SeqCst) {
            return Err(Self::api_error(400));
        }
        let n = self.customers.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("cus_{n:06}"))
    }

    async fn create_charge(&self, charge: &NewCharge) -> GatewayResult<Charge> {
        // Dá oportunidade a pedidos concorrentes de se intercalarem
        tokio::task::yield_now().await;
        if self.fail_charge.load(Ordering::SeqCst) {
            return Err(Self::api_error(500));
        }
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format!("pay_{n:06}");
        self.charges.lock().unwrap().push(charge.clone());
        self.statuses
            .lock()
            .unwrap()
            .insert(id.clone(), ("PENDING".to_string(), charge.billing_type));
        self.references
            .lock()
            .unwrap()
            .insert((charge.external_reference.clone(), charge.billing_type), id.clone());
        Ok(Charge {
            id: id.clone(),
            status: "PENDING".to_string(),
            billing_type: Some(charge.billing_type),
            value: Some(charge.value),
            invoice_url: Some(format!("https://sandbox.asaas.com/i/{id}")),
            bank_slip_url: (charge.billing_type == BillingType::Boleto)
                .then(|| format!("https://sandbox.asaas.com/b/pdf/{id}")),
            due_date: Some(charge.due_date),
        })
    }

    async fn get_charge(&self, charge_id: &str) -> GatewayResult<Charge> {
        self.get_charge_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_get_charge.load(Ordering::SeqCst) {
            return Err(Self::api_error(503));
        }
        let statuses = self.statuses.lock().unwrap();
        let (status, billing_type) = statuses.get(charge_id).cloned().ok_or_else(|| Self::api_error(404))?;
        Ok(Charge {
            id: charge_id.to_string(),
            status,
            billing_type: Some(billing_type),
            value: None,
            invoice_url: None,
            bank_slip_url: None,
            due_date: None,
        })
    }

    async fn find_charge_by_reference(
        &self,
        external_reference: &str,
        billing_type: BillingType,
    ) -> GatewayResult<Option<Charge>> {
        let id = self
            .references
            .lock()
            .unwrap()
            .get(&(external_reference.to_string(), billing_type))
            .cloned();
        match id {
            Some(id) => self.get_charge(&id).await.map(Some),
            None => Ok(None),
        }
    }

    async fn get_pix_qr_code(&self, charge_id: &str) -> GatewayResult<PixQrCode> {
        Ok(PixQrCode {
            payload: format!("00020101021226820014br.gov.bcb.pix{charge_id}"),
            encoded_image: Some("iVBORw0KGgoAAAANSUhEUg==".to_string()),
            expiration_date: None,
        })
    }
}

pub struct TestApp {
    pub router: Router,
    pub pool: SqlitePool,
    pub gateway: Arc<FakeGateway>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(test_config(&[])).await
    }

    pub async fn with_config(config: AppConfig) -> Self {
        let pool = test_pool().await;
        let gateway = FakeGateway::new();
        let state = AppState {
            db_pool: pool.clone(),
            gateway: gateway.clone(),
            config: Arc::new(config),
        };
        let router = web::routes::create_router(state).layer(SessionManagerLayer::new(MemoryStore::default()));
        Self { router, pool, gateway }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8_lossy(&bytes).to_string();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        TestResponse {
            status,
            headers,
            body,
            text,
        }
    }

    /// Faz login com o token de admin e devolve o cookie da sessão.
    pub async fn login(&self) -> String {
        let response = self
            .send(json_request(Method::POST, "/api/admin/login", json!({ "token": ADMIN_TOKEN }), None))
            .await;
        assert_eq!(response.status, StatusCode::OK, "login falhou: {}", response.text);
        response.session_cookie().expect("login sem cookie de sessão")
    }

    /// Submete o formulário de exemplo e devolve o id da pré-matrícula.
    pub async fn submit(&self, form: Value) -> String {
        let response = self
            .send(json_request(Method::POST, "/api/create-pre-registration", form, None))
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.text);
        response.body["preRegistrationId"].as_str().unwrap().to_string()
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
    pub text: String,
}

impl TestResponse {
    pub fn session_cookie(&self) -> Option<String> {
        self.headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_string)
    }

    pub fn location(&self) -> Option<&str> {
        self.headers.get(header::LOCATION).and_then(|v| v.to_str().ok())
    }
}

pub fn json_request(method: Method, uri: &str, body: Value, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn delete(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

pub fn webhook_request(token: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/api/asaas-webhook")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header("asaas-access-token", token);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn payment_event(event: &str, payment_id: &str, status: &str) -> String {
    json!({
        "event": event,
        "payment": { "id": payment_id, "status": status, "billingType": "PIX" }
    })
    .to_string()
}

pub fn valid_form() -> Value {
    json!({
        "nome": "Maria Souza",
        "email": "maria@exemplo.com",
        "telefone": "(11) 98765-4321",
        "cpf": "529.982.247-25",
        "idade": 9,
        "plano": "Pré-matrícula Métis",
        "horario": "manha",
        "diaPreferencia": "Segunda, Quarta",
        "amount": 250.0,
        "postalCode": "01310-100",
        "addressNumber": "1000",
        "complement": "Apto 12"
    })
}
