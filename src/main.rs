// src/main.rs
use axum::serve;
use metis::{
    config::AppConfig,
    db,
    gateway::{AsaasClient, PaymentGateway},
    services::user_service,
    state::AppState,
    web,
};
use std::sync::Arc;
use time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tower_sessions::{ExpiredDeletion, Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::SqliteStore;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- Configuração (lê .env) ---
    let config = AppConfig::from_env()?;

    // --- Configuração do Logging (Tracing) ---
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "metis=debug,tower_http=info,sqlx=warn,tower_sessions=info".into()),
        )
        .with(fmt::layer())
        .init();

    tracing::info!("🚀 Iniciando servidor Métis...");
    tracing::info!(
        "Asaas: {:?} em {} | cobranças: {:?}",
        config.asaas.environment,
        config.asaas.base_url,
        config.charge_mode
    );
    if config.webhook_token.is_none() {
        tracing::warn!("⚠️ ASAAS_WEBHOOK_TOKEN não definido: o webhook vai responder 500.");
    }

    // --- Configuração da Base de Dados ---
    let db_pool = match db::create_db_pool(&config.database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("❌ Falha crítica ao inicializar a base de dados: {}", e);
            return Err(anyhow::anyhow!("Falha ao conectar/migrar DB: {}", e));
        }
    };

    if let Some(bootstrap) = &config.admin_bootstrap {
        if user_service::ensure_user(&db_pool, bootstrap).await? {
            tracing::info!("👤 Utilizador admin '{}' criado.", bootstrap.username);
        }
    }

    // --- Configuração das Sessões ---
    let session_store = SqliteStore::new(db_pool.clone())
        .with_table_name("sessions")
        .map_err(|e| anyhow::anyhow!("Falha ao criar session store: {}", e))?;
    session_store.migrate().await?;

    let session_store_clone = session_store.clone();
    tokio::spawn(async move {
        if let Err(e) = session_store_clone
            .continuously_delete_expired(tokio::time::Duration::from_secs(60 * 60))
            .await
        {
            tracing::error!("Erro na task de limpeza de sessões: {:?}", e);
        }
    });
    tracing::info!("🧹 Tarefa de limpeza de sessões iniciada.");

    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(config.cookie_secure)
        .with_http_only(true)
        .with_expiry(Expiry::OnInactivity(Duration::days(1)));

    // --- Gateway de pagamentos ---
    let gateway: Arc<dyn PaymentGateway> = Arc::new(AsaasClient::new(&config.asaas)?);

    // --- Criação do Estado da Aplicação ---
    let addr = config.bind_addr;
    let app_state = AppState {
        db_pool,
        gateway,
        config: Arc::new(config),
    };

    tracing::info!("📡 Servidor escutando em http://{}", addr);
    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("❌ Falha ao iniciar listener em {}: {}", addr, e);
            return Err(e.into());
        }
    };

    let app = web::routes::create_router(app_state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(session_layer),
    );

    tracing::info!("👂 Servidor pronto para aceitar conexões...");
    if let Err(e) = serve(listener, app.into_make_service()).await {
        tracing::error!("❌ Erro fatal no servidor: {}", e);
        return Err(e.into());
    }

    Ok(())
}
