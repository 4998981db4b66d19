// tests/checkout.rs
mod support;

use axum::http::{Method, StatusCode};
use metis::{
    config::ChargeMode,
    error::AppError,
    gateway::{BillingType, NewCharge, PaymentGateway},
    models::pre_registration::{PaymentStatus, PreRegistrationForm},
    services::{checkout_service, pre_registration_service},
};
use serde_json::{json, Value};
use std::sync::atomic::Ordering;
use support::{json_request, payment_event, test_config, test_pool, valid_form, webhook_request, FakeGateway, TestApp, WEBHOOK_TOKEN};

fn form(value: Value) -> PreRegistrationForm {
    serde_json::from_value(value).unwrap()
}

async fn count_rows(pool: &sqlx::SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn valid_submit_stores_one_pending_row_with_customer() {
    let pool = test_pool().await;
    let gateway = FakeGateway::new();

    let registro = checkout_service::submit(&pool, gateway.as_ref(), ChargeMode::OnDemand, form(valid_form()))
        .await
        .unwrap();

    assert_eq!(count_rows(&pool, "pre_registrations").await, 1);
    let stored = pre_registration_service::find(&pool, &registro.id).await.unwrap().unwrap();
    assert_eq!(stored.payment_status, PaymentStatus::Pending);
    assert_eq!(stored.gateway_customer_id.as_deref(), Some("cus_000001"));
    assert_eq!(stored.cpf, "52998224725");
    assert_eq!(stored.payment_method, None);
    // Em modo on-demand nenhuma cobrança é criada na submissão
    assert_eq!(gateway.charges_created(), 0);
}

#[tokio::test]
async fn malformed_cpf_is_rejected_before_any_gateway_call() {
    let app = TestApp::new().await;
    let mut body = valid_form();
    body["cpf"] = json!("123.456");

    let response = app
        .send(json_request(Method::POST, "/api/create-pre-registration", body, None))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message"], "Dados inválidos");
    let fields: Vec<&str> = response.body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["cpf"]);
    assert_eq!(app.gateway.customers_created(), 0);
    assert_eq!(count_rows(&app.pool, "pre_registrations").await, 0);
}

#[tokio::test]
async fn non_ascii_digits_in_cep_are_rejected() {
    let app = TestApp::new().await;
    let mut body = valid_form();
    body["postalCode"] = json!("٠١٣١٠-١٠٠");

    let response = app
        .send(json_request(Method::POST, "/api/create-pre-registration", body, None))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["errors"][0]["field"], "postalCode");
    assert_eq!(app.gateway.customers_created(), 0);
    assert_eq!(count_rows(&app.pool, "pre_registrations").await, 0);
}

#[tokio::test]
async fn missing_address_fields_are_reported_in_camel_case() {
    let app = TestApp::new().await;
    let mut body = valid_form();
    body["postalCode"] = json!("123");
    body["addressNumber"] = json!("");

    let response = app
        .send(json_request(Method::POST, "/api/create-pre-registration", body, None))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = response.body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"postalCode"));
    assert!(fields.contains(&"addressNumber"));
}

#[tokio::test]
async fn non_json_body_is_bad_request() {
    let app = TestApp::new().await;
    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/api/create-pre-registration")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{nome:"))
        .unwrap();

    let response = app.send(request).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(app.gateway.customers_created(), 0);
}

#[tokio::test]
async fn customer_failure_is_502_and_row_stays_without_customer() {
    let app = TestApp::new().await;
    app.gateway.fail_customer.store(true, Ordering::SeqCst);

    let response = app
        .send(json_request(Method::POST, "/api/create-pre-registration", valid_form(), None))
        .await;

    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
    assert!(!response.text.contains("falha_simulada"));

    let registros = pre_registration_service::list(&app.pool).await.unwrap();
    assert_eq!(registros.len(), 1);
    assert_eq!(registros[0].payment_status, PaymentStatus::Pending);
    assert!(registros[0].gateway_customer_id.is_none());

    // Sem cliente não se pode pedir cobrança
    let uri = format!("/api/create-boleto-payment/{}", registros[0].id);
    let response = app.send(json_request(Method::POST, &uri, json!({}), None)).await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(app.gateway.charges_created(), 0);
}

#[tokio::test]
async fn pix_charge_then_received_webhook_marks_paid() {
    let app = TestApp::new().await;
    let id = app.submit(valid_form()).await;

    let response = app
        .send(json_request(Method::POST, &format!("/api/create-pix-payment/{id}"), json!({}), None))
        .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.text);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["paymentType"], "PIX");
    assert!(!response.body["qrCode"].as_str().unwrap().is_empty());
    assert!(response.body["qrCodeImage"].is_string());
    let payment_id = response.body["paymentId"].as_str().unwrap().to_string();

    {
        let charges = app.gateway.charges.lock().unwrap();
        assert_eq!(charges[0].value, 250.0);
        assert_eq!(charges[0].external_reference, id);
    }

    app.gateway.set_status(&payment_id, "RECEIVED");
    let response = app
        .send(webhook_request(
            Some(WEBHOOK_TOKEN),
            &payment_event("PAYMENT_RECEIVED", &payment_id, "RECEIVED"),
        ))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["received"], true);

    let response = app.send(support::get(&format!("/api/pre-registration/{id}"), None)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["paymentStatus"], "paid");
    assert_eq!(response.body["paymentMethod"], "PIX");
    assert_eq!(response.body["pixChargeId"], payment_id.as_str());
    assert!(response.body["boletoChargeId"].is_null());
}

#[tokio::test]
async fn each_billing_type_round_trips_to_its_payment_method() {
    let cases = [
        ("boleto", BillingType::Boleto, "CONFIRMED"),
        ("creditcard", BillingType::CreditCard, "CONFIRMED"),
        ("pix", BillingType::Pix, "RECEIVED"),
    ];
    for (path, billing_type, status) in cases {
        let app = TestApp::new().await;
        let id = app.submit(valid_form()).await;
        let response = app
            .send(json_request(Method::POST, &format!("/api/create-{path}-payment/{id}"), json!({}), None))
            .await;
        assert_eq!(response.status, StatusCode::OK);
        let payment_id = response.body["paymentId"].as_str().unwrap().to_string();

        app.gateway.set_status(&payment_id, status);
        let event = format!("PAYMENT_{status}");
        let response = app
            .send(webhook_request(Some(WEBHOOK_TOKEN), &payment_event(&event, &payment_id, status)))
            .await;
        assert_eq!(response.status, StatusCode::OK);

        let stored = pre_registration_service::find(&app.pool, &id).await.unwrap().unwrap();
        assert_eq!(stored.payment_status, PaymentStatus::Paid);
        assert_eq!(stored.payment_method, Some(billing_type));
    }
}

#[tokio::test]
async fn boleto_response_carries_slip_url_and_due_date() {
    let app = TestApp::new().await;
    let id = app.submit(valid_form()).await;

    let response = app
        .send(json_request(Method::POST, &format!("/api/create-boleto-payment/{id}"), json!({}), None))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body["bankSlipUrl"].as_str().unwrap().contains("/b/pdf/"));
    assert!(response.body.get("qrCode").is_none());
    let expected = (chrono::Utc::now().date_naive() + chrono::Days::new(7)).format("%Y-%m-%d").to_string();
    assert_eq!(response.body["dueDate"], expected.as_str());
}

#[tokio::test]
async fn second_request_for_same_type_is_409_without_new_charge() {
    let app = TestApp::new().await;
    let id = app.submit(valid_form()).await;
    let uri = format!("/api/create-boleto-payment/{id}");

    let first = app.send(json_request(Method::POST, &uri, json!({}), None)).await;
    assert_eq!(first.status, StatusCode::OK);
    let second = app.send(json_request(Method::POST, &uri, json!({}), None)).await;

    assert_eq!(second.status, StatusCode::CONFLICT);
    assert_eq!(second.body["paymentId"], first.body["paymentId"]);
    assert_eq!(app.gateway.charges_created(), 1);

    // Outro tipo continua permitido
    let pix = app
        .send(json_request(Method::POST, &format!("/api/create-pix-payment/{id}"), json!({}), None))
        .await;
    assert_eq!(pix.status, StatusCode::OK);
    assert_eq!(app.gateway.charges_created(), 2);
}

#[tokio::test]
async fn concurrent_boleto_requests_store_exactly_one_charge() {
    let pool = test_pool().await;
    let gateway = FakeGateway::new();
    let registro = checkout_service::submit(&pool, gateway.as_ref(), ChargeMode::OnDemand, form(valid_form()))
        .await
        .unwrap();

    let (a, b) = tokio::join!(
        checkout_service::request_charge(&pool, gateway.as_ref(), &registro.id, BillingType::Boleto),
        checkout_service::request_charge(&pool, gateway.as_ref(), &registro.id, BillingType::Boleto),
    );

    let results = [a, b];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(AppError::ChargeAlreadyExists { billing_type: BillingType::Boleto, .. }))));
    assert_eq!(gateway.charges_created(), 1);

    let charges = pre_registration_service::find_charges(&pool, &registro.id).await.unwrap();
    assert_eq!(charges.len(), 1);
    assert!(charges[0].gateway_charge_id.is_some());
}

#[tokio::test]
async fn gateway_failure_releases_the_reservation() {
    let app = TestApp::new().await;
    let id = app.submit(valid_form()).await;
    let uri = format!("/api/create-creditcard-payment/{id}");

    app.gateway.fail_charge.store(true, Ordering::SeqCst);
    let failed = app.send(json_request(Method::POST, &uri, json!({}), None)).await;
    assert_eq!(failed.status, StatusCode::BAD_GATEWAY);
    assert!(pre_registration_service::find_charges(&app.pool, &id).await.unwrap().is_empty());

    app.gateway.fail_charge.store(false, Ordering::SeqCst);
    let retried = app.send(json_request(Method::POST, &uri, json!({}), None)).await;
    assert_eq!(retried.status, StatusCode::OK);
    assert!(retried.body["url"].as_str().unwrap().starts_with("https://"));
}

/// Reserva `REQUESTING` sem id do gateway, criada há `idade` (ex.: "-10 minutes").
async fn seed_reservation(pool: &sqlx::SqlitePool, id: &str, billing_type: BillingType, idade: &str) {
    sqlx::query(
        "INSERT INTO charges (pre_registration_id, billing_type, status, created_at)
         VALUES (?1, ?2, 'REQUESTING', datetime('now', ?3))",
    )
    .bind(id)
    .bind(billing_type)
    .bind(idade)
    .execute(pool)
    .await
    .unwrap();
}

#[tokio::test]
async fn in_flight_reservation_blocks_same_type() {
    let app = TestApp::new().await;
    let id = app.submit(valid_form()).await;
    seed_reservation(&app.pool, &id, BillingType::Boleto, "-5 seconds").await;

    let response = app
        .send(json_request(Method::POST, &format!("/api/create-boleto-payment/{id}"), json!({}), None))
        .await;

    assert_eq!(response.status, StatusCode::CONFLICT);
    assert!(response.body["paymentId"].is_null());
    assert_eq!(app.gateway.charges_created(), 0);
}

#[tokio::test]
async fn abandoned_reservation_is_reclaimed() {
    let app = TestApp::new().await;
    let id = app.submit(valid_form()).await;
    seed_reservation(&app.pool, &id, BillingType::Boleto, "-10 minutes").await;
    let uri = format!("/api/create-boleto-payment/{id}");

    let first = app.send(json_request(Method::POST, &uri, json!({}), None)).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(app.gateway.charges_created(), 1);
    let payment_id = first.body["paymentId"].as_str().unwrap();

    let stored = pre_registration_service::find_charge(&app.pool, &id, BillingType::Boleto)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.gateway_charge_id.as_deref(), Some(payment_id));

    // Depois de retomada volta a valer a regra de uma cobrança por tipo
    let second = app.send(json_request(Method::POST, &uri, json!({}), None)).await;
    assert_eq!(second.status, StatusCode::CONFLICT);
    assert_eq!(second.body["paymentId"], payment_id);
    assert_eq!(app.gateway.charges_created(), 1);
}

#[tokio::test]
async fn reclaimed_reservation_adopts_charge_already_at_gateway() {
    let app = TestApp::new().await;
    let id = app.submit(valid_form()).await;
    let due_date = chrono::NaiveDate::from_ymd_opt(2030, 1, 15).unwrap();
    // O gateway criou a cobrança mas o pedido morreu antes de a gravar
    let orphan = app
        .gateway
        .create_charge(&NewCharge {
            customer_id: "cus_000001".into(),
            billing_type: BillingType::Pix,
            value: 250.0,
            due_date,
            description: "Métis".into(),
            external_reference: id.clone(),
        })
        .await
        .unwrap();
    seed_reservation(&app.pool, &id, BillingType::Pix, "-10 minutes").await;

    let response = app
        .send(json_request(Method::POST, &format!("/api/create-pix-payment/{id}"), json!({}), None))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["paymentId"], orphan.id.as_str());
    assert_eq!(response.body["dueDate"], "2030-01-15");
    assert_eq!(app.gateway.charges_created(), 1);

    // E o pagamento dessa cobrança passa a ser reconhecido
    app.gateway.set_status(&orphan.id, "RECEIVED");
    let response = app
        .send(webhook_request(
            Some(WEBHOOK_TOKEN),
            &payment_event("PAYMENT_RECEIVED", &orphan.id, "RECEIVED"),
        ))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let stored = pre_registration_service::find(&app.pool, &id).await.unwrap().unwrap();
    assert_eq!(stored.payment_status, PaymentStatus::Paid);
    assert_eq!(stored.payment_method, Some(BillingType::Pix));
}

#[tokio::test]
async fn unknown_pre_registration_is_404() {
    let app = TestApp::new().await;

    let response = app
        .send(json_request(Method::POST, "/api/create-pix-payment/nao-existe", json!({}), None))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = app.send(support::get("/api/pre-registration/nao-existe", None)).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(app.gateway.charges_created(), 0);
}

#[tokio::test]
async fn paid_pre_registration_refuses_new_charges() {
    let app = TestApp::new().await;
    let id = app.submit(valid_form()).await;
    pre_registration_service::mark_paid(&app.pool, &id, BillingType::Pix).await.unwrap();

    let response = app
        .send(json_request(Method::POST, &format!("/api/create-boleto-payment/{id}"), json!({}), None))
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(app.gateway.charges_created(), 0);
}

#[tokio::test]
async fn eager_mode_creates_all_three_charges_on_submit() {
    let app = TestApp::with_config(test_config(&[("CHARGE_MODE", "eager")])).await;
    let id = app.submit(valid_form()).await;

    assert_eq!(app.gateway.charges_created(), 3);
    let response = app.send(support::get(&format!("/api/pre-registration/{id}"), None)).await;
    for field in ["pixChargeId", "boletoChargeId", "creditCardChargeId"] {
        assert!(response.body[field].is_string(), "{field} em falta");
    }
}

#[tokio::test]
async fn payment_status_check_confirms_settled_charges() {
    let app = TestApp::new().await;
    let id = app.submit(valid_form()).await;
    let response = app
        .send(json_request(Method::POST, &format!("/api/create-creditcard-payment/{id}"), json!({}), None))
        .await;
    let payment_id = response.body["paymentId"].as_str().unwrap().to_string();

    let response = app.send(support::get(&format!("/api/payment-status/{id}"), None)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["paymentStatus"], "pending");
    assert_eq!(response.body["charges"][0]["status"], "PENDING");

    app.gateway.set_status(&payment_id, "CONFIRMED");
    let response = app.send(support::get(&format!("/api/payment-status/{id}"), None)).await;
    assert_eq!(response.body["paymentStatus"], "paid");
    assert_eq!(response.body["paymentMethod"], "CREDIT_CARD");
    assert_eq!(response.body["charges"][0]["billingType"], "CREDIT_CARD");
    assert_eq!(response.body["charges"][0]["status"], "CONFIRMED");
}

#[tokio::test]
async fn payment_status_keeps_last_known_state_when_gateway_is_down() {
    let app = TestApp::new().await;
    let id = app.submit(valid_form()).await;
    app.send(json_request(Method::POST, &format!("/api/create-pix-payment/{id}"), json!({}), None))
        .await;

    app.gateway.fail_get_charge.store(true, Ordering::SeqCst);
    let response = app.send(support::get(&format!("/api/payment-status/{id}"), None)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["paymentStatus"], "pending");
    assert_eq!(response.body["charges"][0]["status"], "PENDING");
}
