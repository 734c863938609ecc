pub mod health;
pub mod identities;
