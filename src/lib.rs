//! In-memory identity registry served over HTTP behind HS256 bearer authentication.

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod repos;
pub mod services;
pub mod state;
