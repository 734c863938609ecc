pub mod access_jwt;
pub mod bearer;
pub mod claims;
pub mod factory;

pub use access_jwt::{AccessJwtError, AuthService};
pub use bearer::{BearerError, extract_bearer_token};
pub use claims::{ClaimsError, UserClaims};
pub use factory::build_auth_service;
