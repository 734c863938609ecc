use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClaimsError {
    #[error("missing '{0}' claim")]
    Missing(&'static str),
    #[error("'{0}' claim is not a string")]
    NotAString(&'static str),
}

/// Identity asserted by a verified token. Lives only for the duration of one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserClaims {
    pub name: String,
    pub email: String,
}

impl UserClaims {
    /// Build claims from an already signature-verified payload.
    pub fn from_payload(payload: &Map<String, Value>) -> Result<Self, ClaimsError> {
        Ok(Self {
            name: string_claim(payload, "name")?,
            email: string_claim(payload, "email")?,
        })
    }
}

fn string_claim(payload: &Map<String, Value>, key: &'static str) -> Result<String, ClaimsError> {
    match payload.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(ClaimsError::NotAString(key)),
        None => Err(ClaimsError::Missing(key)),
    }
}
