/// Factory: build `AuthService` from application `Config`.
use std::sync::Arc;

use crate::config::Config;
use crate::error::AppError;
use crate::services::auth::AuthService;

pub fn build_auth_service(config: &Config) -> Result<Arc<AuthService>, AppError> {
    let auth = AuthService::new(
        config.auth_hmac_secret.as_bytes(),
        config.auth_leeway_seconds,
    )
    .map_err(|e| {
        tracing::error!(error = %e, "failed to build bearer token verifier");
        AppError::Internal
    })?;

    Ok(Arc::new(auth))
}
