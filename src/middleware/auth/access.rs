//! bearer token 検証 → AuthCtx を extensions に入れる
//!
//! Per call: header lookup → HS256 signature check → name/email claims → AuthCtx.
//! Any failure short-circuits with 401 and the handler is never polled.
//! The reason is logged with an internal category but never returned to the caller.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::{self, Next},
    response::Response,
};
use thiserror::Error;

use crate::api::v1::extractors::AuthCtx;
use crate::error::AppError;
use crate::services::auth::{AccessJwtError, AuthService, BearerError, extract_bearer_token};
use crate::state::AppState;

/// Routes registered on `router` before this call require a valid bearer token.
///
/// 例：
/// ```ignore
/// let protected = Router::new().route("/identities", get(list_identities));
/// let protected = middleware::auth::access::apply(protected, state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.layer(middleware::from_fn_with_state(state, access_middleware))
}

#[derive(Debug, Error)]
pub enum AuthFailure {
    #[error(transparent)]
    Credentials(#[from] BearerError),
    #[error(transparent)]
    Token(#[from] AccessJwtError),
}

impl AuthFailure {
    pub fn category(&self) -> &'static str {
        match self {
            Self::Credentials(_) => "malformed_credentials",
            Self::Token(e) => e.category(),
        }
    }
}

/// Synchronous part of the interceptor: call metadata in, verified context out.
pub fn authenticate(auth: &AuthService, headers: &HeaderMap) -> Result<AuthCtx, AuthFailure> {
    let token = extract_bearer_token(headers)?;
    let claims = auth.authenticate(token)?;
    Ok(AuthCtx::new(claims))
}

async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let auth_ctx = match authenticate(&state.auth, req.headers()) {
        Ok(ctx) => ctx,
        Err(err) => {
            tracing::warn!(
                category = err.category(),
                error = %err,
                "bearer authentication failed"
            );
            return Err(AppError::Unauthorized);
        }
    };

    tracing::debug!(
        name = %auth_ctx.name(),
        email = %auth_ctx.email(),
        "bearer token accepted"
    );

    // middleware → extractor への受け渡し
    req.extensions_mut().insert(auth_ctx);

    Ok(next.run(req).await)
}
