/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - /identities には bearer 認証を掛け、/health は素通しにする
 */
use axum::{Router, routing::get};

use crate::middleware::auth::access;
use crate::state::AppState;

use crate::api::v1::handlers::{
    health::health,
    identities::{add_identity, list_identities},
};

pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new().route("/identities", get(list_identities).post(add_identity));
    let protected = access::apply(protected, state);

    Router::new().route("/health", get(health)).merge(protected)
}
