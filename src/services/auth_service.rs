// src/services/auth_service.rs
use crate::{
    error::{AppError, AppResult},
    models::user::AdminLoginForm,
    services::user_service,
};
use sqlx::SqlitePool;

/// Verifica se a senha fornecida corresponde ao hash guardado.
pub async fn verify_password(password: &str, stored_hash: &str) -> AppResult<bool> {
    let password = password.to_string();
    let stored_hash = stored_hash.to_string();
    tokio::task::spawn_blocking(move || {
        tracing::debug!("Verificando hash bcrypt...");
        bcrypt::verify(&password, &stored_hash)
    })
    .await
    .map_err(|e| {
        tracing::error!("Erro na task spawn_blocking (verify_password): {:?}", e);
        AppError::InternalServerError
    })?
    .map_err(|e| {
        tracing::error!("Erro bcrypt ao verificar senha: {:?}", e);
        AppError::PasswordHashingError
    })
}

/// Gera um hash bcrypt para uma senha.
pub async fn hash_password(password: &str) -> AppResult<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || {
        tracing::debug!("Gerando hash bcrypt...");
        bcrypt::hash(&password, bcrypt::DEFAULT_COST)
    })
    .await
    .map_err(|e| {
        tracing::error!("Erro na task spawn_blocking (hash_password): {:?}", e);
        AppError::InternalServerError
    })?
    .map_err(|e| {
        tracing::error!("Erro bcrypt ao gerar hash: {:?}", e);
        AppError::PasswordHashingError
    })
}

/// Identidade guardada na sessão quando o login é feito com o token partilhado.
pub const TOKEN_IDENTITY: &str = "admin";

/// Valida um pedido de login admin e devolve a identidade a guardar na sessão.
///
/// O token tem prioridade: se vier preenchido, username/password são ignorados.
pub async fn authenticate_admin(
    db_pool: &SqlitePool,
    admin_token: &str,
    form: &AdminLoginForm,
) -> AppResult<String> {
    let filled = |v: &Option<String>| v.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);

    if let Some(token) = filled(&form.token) {
        if token == admin_token {
            tracing::info!("Login admin via token aceite");
            return Ok(TOKEN_IDENTITY.to_string());
        }
        tracing::warn!("Login admin via token recusado");
        return Err(AppError::InvalidCredentials);
    }

    let (Some(username), Some(password)) = (filled(&form.username), form.password.clone()) else {
        return Err(AppError::BadRequest(
            "Informe o token de acesso ou utilizador e senha.".to_string(),
        ));
    };

    match user_service::find_user_by_username(db_pool, &username).await? {
        Some(user) => {
            if verify_password(&password, &user.password_hash).await? {
                tracing::info!("Login admin de '{}' aceite", user.username);
                Ok(user.username)
            } else {
                tracing::warn!("Senha incorreta para '{}'", username);
                Err(AppError::InvalidCredentials)
            }
        }
        None => {
            tracing::warn!("Utilizador não encontrado: {}", username);
            Err(AppError::InvalidCredentials)
        }
    }
}
