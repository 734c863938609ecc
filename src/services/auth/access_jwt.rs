use jsonwebtoken::{Algorithm, DecodingKey, Validation, errors::ErrorKind};
use serde_json::{Map, Value};
use std::{collections::HashSet, error::Error as StdError, fmt};

use crate::services::auth::claims::{ClaimsError, UserClaims};

/// The only signing algorithm bearer tokens may declare.
pub const EXPECTED_ALGORITHM: Algorithm = Algorithm::HS256;

// Errors returned by bearer-token verification + claims extraction.
#[derive(Debug)]
pub enum AccessJwtError {
    /// Not a decodable `header.payload.signature` structure.
    Malformed(jsonwebtoken::errors::Error),
    /// Header declares something other than `EXPECTED_ALGORITHM`.
    UnexpectedAlgorithm(Algorithm),
    /// Signature mismatch, or a present `exp`/`nbf` that is out of range.
    Rejected(jsonwebtoken::errors::Error),
    /// Correctly signed, but the payload lacks usable `name`/`email`.
    InvalidClaims(ClaimsError),
}

impl AccessJwtError {
    /// Internal category used in logs. Never exposed to callers.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Malformed(_) | Self::UnexpectedAlgorithm(_) | Self::Rejected(_) => "verification",
            Self::InvalidClaims(_) => "invalid_claims",
        }
    }
}

impl fmt::Display for AccessJwtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed(e) => write!(f, "malformed token: {}", e),
            Self::UnexpectedAlgorithm(alg) => write!(f, "unexpected signing method: {:?}", alg),
            Self::Rejected(e) => write!(f, "jwt verification failed: {}", e),
            Self::InvalidClaims(e) => write!(f, "invalid claims: {}", e),
        }
    }
}

impl StdError for AccessJwtError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Malformed(e) | Self::Rejected(e) => Some(e),
            Self::InvalidClaims(e) => Some(e),
            Self::UnexpectedAlgorithm(_) => None,
        }
    }
}

impl From<ClaimsError> for AccessJwtError {
    fn from(e: ClaimsError) -> Self {
        Self::InvalidClaims(e)
    }
}

/// HS256 bearer-token verifier.
///
/// - The shared secret is injected from configuration and is not printable via Debug.
/// - Payloads are flat maps; `exp`/`nbf` are honoured when present but not required.
#[derive(Clone)]
pub struct AuthService {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("AuthService")
            .field("validation", &self.validation)
            .finish()
    }
}

impl AuthService {
    pub fn new(secret: &[u8], leeway_seconds: u64) -> Result<Self, String> {
        if secret.is_empty() {
            return Err("hmac secret must not be empty".to_string());
        }

        let mut validation = Validation::new(EXPECTED_ALGORITHM);
        validation.required_spec_claims = HashSet::new();
        validation.validate_aud = false;
        validation.validate_nbf = true;
        validation.leeway = leeway_seconds;

        Ok(Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        })
    }

    /// Parse the token, pin the algorithm and check the signature.
    ///
    /// The header is inspected first so that a foreign algorithm is reported as
    /// such instead of as a generic decode failure.
    pub fn verify_signature(&self, token: &str) -> Result<Map<String, Value>, AccessJwtError> {
        let header = jsonwebtoken::decode_header(token).map_err(AccessJwtError::Malformed)?;
        if header.alg != EXPECTED_ALGORITHM {
            return Err(AccessJwtError::UnexpectedAlgorithm(header.alg));
        }

        let data = jsonwebtoken::decode::<Map<String, Value>>(
            token,
            &self.decoding_key,
            &self.validation,
        )
        .map_err(|e| match e.kind() {
            ErrorKind::InvalidAlgorithm => AccessJwtError::UnexpectedAlgorithm(header.alg),
            ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) => {
                AccessJwtError::Malformed(e)
            }
            _ => AccessJwtError::Rejected(e),
        })?;

        Ok(data.claims)
    }

    /// Verify and convert into the claims handlers work with.
    ///
    /// This is the entry-point for the auth middleware.
    pub fn authenticate(&self, token: &str) -> Result<UserClaims, AccessJwtError> {
        let payload = self.verify_signature(token)?;
        Ok(UserClaims::from_payload(&payload)?)
    }
}
