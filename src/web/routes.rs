// src/web/routes.rs
use crate::{
    state::AppState,
    web::{admin_handlers, auth_handlers, checkout_handlers, mw_admin, mw_auth, webhook_handlers},
};
use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

pub fn create_router(app_state: AppState) -> Router {
    // --- API pública (checkout + webhook) ---
    let public_api = Router::new()
        .route("/create-pre-registration", post(checkout_handlers::create_pre_registration))
        .route("/create-pix-payment/{id}", post(checkout_handlers::create_pix_payment))
        .route("/create-boleto-payment/{id}", post(checkout_handlers::create_boleto_payment))
        .route("/create-creditcard-payment/{id}", post(checkout_handlers::create_credit_card_payment))
        .route("/pre-registration/{id}", get(checkout_handlers::get_pre_registration))
        .route("/payment-status/{id}", get(checkout_handlers::payment_status))
        .route("/asaas-webhook", post(webhook_handlers::asaas_webhook))
        // Login/logout admin ficam fora do middleware
        .route("/admin/login", post(auth_handlers::api_login))
        .route("/admin/logout", post(auth_handlers::api_logout))
        .route("/admin/check-auth", get(auth_handlers::check_auth));

    // --- API admin --- (401 em JSON sem sessão)
    let admin_api = Router::new()
        .route(
            "/admin/moderadores",
            get(admin_handlers::list_moderadores).post(admin_handlers::create_moderador),
        )
        .route("/admin/moderadores/search", get(admin_handlers::search_moderadores))
        .route(
            "/admin/moderadores/{id}",
            get(admin_handlers::get_moderador)
                .put(admin_handlers::update_moderador)
                .delete(admin_handlers::delete_moderador),
        )
        .route(
            "/admin/turmas",
            get(admin_handlers::list_turmas).post(admin_handlers::create_turma),
        )
        .route("/admin/turmas/search", get(admin_handlers::search_turmas))
        .route(
            "/admin/turmas/{id}",
            get(admin_handlers::get_turma)
                .put(admin_handlers::update_turma)
                .delete(admin_handlers::delete_turma),
        )
        .route(
            "/admin/alunos",
            get(admin_handlers::list_alunos).post(admin_handlers::create_aluno),
        )
        .route("/admin/alunos/search", get(admin_handlers::search_alunos))
        .route(
            "/admin/alunos/{id}",
            get(admin_handlers::get_aluno)
                .put(admin_handlers::update_aluno)
                .delete(admin_handlers::delete_aluno),
        )
        .route("/admin/stats", get(admin_handlers::stats))
        .route("/admin/pre-registrations", get(admin_handlers::list_pre_registrations))
        .route_layer(middleware::from_fn(mw_admin::require_admin));

    // --- Páginas HTML ---
    let public_pages = Router::new()
        .route(
            "/admin/login",
            get(auth_handlers::show_login_form).post(auth_handlers::handle_login),
        )
        .route("/admin/logout", get(auth_handlers::handle_logout))
        .route("/health", get(|| async { Json(json!({ "status": "ok" })) }));

    // Sem login redireciona para /admin/login
    let protected_pages = Router::new()
        .route("/admin", get(auth_handlers::show_dashboard))
        .route_layer(middleware::from_fn(mw_auth::require_auth));

    // --- Router Final ---
    Router::new()
        .nest("/api", public_api.merge(admin_api))
        .merge(public_pages)
        .merge(protected_pages)
        .with_state(app_state)
}
