pub mod error;
pub mod identity_repo;

pub use error::DeliveryError;
pub use identity_repo::{Identity, IdentityRegistry, IdentitySink};
