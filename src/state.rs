/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - registry: IdentityRegistry, auth: AuthService, 一覧ストリームの期限
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;
use std::time::Duration;

use crate::repos::IdentityRegistry;
use crate::services::auth::AuthService;

#[derive(Clone, Debug)]
pub struct AppState {
    pub registry: Arc<IdentityRegistry>,
    pub auth: Arc<AuthService>,
    pub stream_timeout: Duration,
}

impl AppState {
    pub fn new(
        registry: Arc<IdentityRegistry>,
        auth: Arc<AuthService>,
        stream_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            auth,
            stream_timeout,
        }
    }
}
