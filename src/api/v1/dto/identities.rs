/*
 * Responsibility
 * - Identities の response DTO
 * - 一覧ストリームは 1 行 1 件の NDJSON にする
 */
use serde::Serialize;

use crate::repos::Identity;

#[derive(Debug, Serialize)]
pub struct IdentityResponse {
    pub id: String,
}

impl From<Identity> for IdentityResponse {
    fn from(identity: Identity) -> Self {
        Self { id: identity.id }
    }
}

impl IdentityResponse {
    /// Serialize as a single NDJSON line (trailing `\n` included).
    pub fn to_ndjson_line(&self) -> Result<String, serde_json::Error> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}
