// src/config.rs
//! Configuração da aplicação, lida uma única vez no arranque.
//!
//! Tudo vem de variáveis de ambiente (com `.env` carregado pelo `dotenvy`).
//! A struct resultante é imutável e passada explicitamente a quem precisa
//! (pool da DB, cliente do gateway, estado dos handlers).

use std::net::SocketAddr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Variável de ambiente obrigatória em falta: {0}")]
    MissingRequired(&'static str),

    #[error("Valor inválido para {var}: '{value}'")]
    Invalid { var: &'static str, value: String },
}

/// Ambiente do Asaas (decide o URL base quando ASAAS_BASE_URL não é dado).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsaasEnvironment {
    Sandbox,
    Production,
}

impl AsaasEnvironment {
    pub fn default_base_url(self) -> &'static str {
        match self {
            AsaasEnvironment::Sandbox => "https://sandbox.asaas.com/api/v3",
            AsaasEnvironment::Production => "https://api.asaas.com/v3",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AsaasConfig {
    pub environment: AsaasEnvironment,
    pub api_key: String,
    pub base_url: String,
}

/// Quando as cobranças são criadas no gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeMode {
    /// Uma cobrança de cada vez, quando o cliente escolhe o meio de pagamento.
    OnDemand,
    /// As três cobranças logo na submissão da pré-matrícula.
    Eager,
}

/// Utilizador admin criado no arranque se ainda não existir.
#[derive(Debug, Clone)]
pub struct AdminBootstrap {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub admin_token: String,
    pub admin_bootstrap: Option<AdminBootstrap>,
    pub asaas: AsaasConfig,
    pub webhook_token: Option<String>,
    pub charge_mode: ChargeMode,
    pub cookie_secure: bool,
}

impl AppConfig {
    /// Carrega `.env` (se existir) e lê o ambiente do processo.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Constrói a configuração a partir de qualquer fonte chave -> valor.
    /// Valores vazios (ou só com espaços) contam como ausentes.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |key: &'static str| get(key).ok_or(ConfigError::MissingRequired(key));

        let database_url = required("DATABASE_URL")?;
        let admin_token = required("ADMIN_TOKEN")?;
        let api_key = required("ASAAS_API_KEY")?;

        let environment = match get("ASAAS_ENV").as_deref() {
            None | Some("sandbox") => AsaasEnvironment::Sandbox,
            Some("production") => AsaasEnvironment::Production,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "ASAAS_ENV",
                    value: other.to_string(),
                })
            }
        };
        let base_url = get("ASAAS_BASE_URL")
            .unwrap_or_else(|| environment.default_base_url().to_string())
            .trim_end_matches('/')
            .to_string();

        let charge_mode = match get("CHARGE_MODE").as_deref() {
            None | Some("on_demand") => ChargeMode::OnDemand,
            Some("eager") => ChargeMode::Eager,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "CHARGE_MODE",
                    value: other.to_string(),
                })
            }
        };

        let bind_raw = get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_addr = bind_raw.parse().map_err(|_| ConfigError::Invalid {
            var: "BIND_ADDR",
            value: bind_raw.clone(),
        })?;

        let admin_bootstrap = match (get("ADMIN_USERNAME"), get("ADMIN_PASSWORD")) {
            (Some(username), Some(password)) => Some(AdminBootstrap { username, password }),
            _ => None,
        };

        let cookie_secure = matches!(get("COOKIE_SECURE").as_deref(), Some("true") | Some("1"));

        Ok(AppConfig {
            database_url,
            bind_addr,
            admin_token,
            admin_bootstrap,
            asaas: AsaasConfig {
                environment,
                api_key,
                base_url,
            },
            webhook_token: get("ASAAS_WEBHOOK_TOKEN"),
            charge_mode,
            cookie_secure,
        })
    }
}
