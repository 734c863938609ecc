//! `Authorization: Bearer <token>` の取り出し
//!
//! The header must appear exactly once. The scheme is matched case-insensitively
//! and is followed by exactly one space; the token after it must be non-empty and
//! contain no whitespace at all (leading padding included).

use axum::http::{HeaderMap, header};
use thiserror::Error;

const SCHEME: &str = "bearer";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BearerError {
    #[error("missing authorization header")]
    Missing,
    #[error("multiple authorization headers")]
    Duplicated,
    #[error("authorization header is not visible ascii")]
    NotAscii,
    #[error("unsupported authorization scheme")]
    UnsupportedScheme,
    #[error("empty or malformed bearer token")]
    MalformedToken,
}

pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, BearerError> {
    let mut values = headers.get_all(header::AUTHORIZATION).iter();
    let value = values.next().ok_or(BearerError::Missing)?;
    if values.next().is_some() {
        return Err(BearerError::Duplicated);
    }

    let value = value.to_str().map_err(|_| BearerError::NotAscii)?;

    let (scheme, token) = value
        .split_once(' ')
        .ok_or(BearerError::UnsupportedScheme)?;
    if !scheme.eq_ignore_ascii_case(SCHEME) {
        return Err(BearerError::UnsupportedScheme);
    }

    if token.is_empty() || token.contains(char::is_whitespace) {
        return Err(BearerError::MalformedToken);
    }

    Ok(token)
}
