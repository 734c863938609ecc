/*
 * Responsibility
 * - Handler から見える「認証済みコンテキスト」の型
 * - middleware が検証して request extensions に格納し、handler はこの型だけを受け取る
 *
 * Notes
 * - token の検証ロジックは middleware/services 側の責務
 */
use crate::services::auth::UserClaims;

/// 認証済みのリクエストに付与されるコンテキスト
///
/// - `claims` は署名検証と name/email の型チェックを通過した値のみ
#[derive(Debug, Clone)]
pub struct AuthCtx {
    claims: UserClaims,
}

impl AuthCtx {
    pub fn new(claims: UserClaims) -> Self {
        Self { claims }
    }

    pub fn name(&self) -> &str {
        &self.claims.name
    }

    pub fn email(&self) -> &str {
        &self.claims.email
    }
}
