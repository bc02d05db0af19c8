//! Core library for the colis console.
//!
//! - [`api`]: authenticated request engine and resource wrappers
//! - [`auth`]: token store, storage backends and login session
//! - [`config`]: connection and storage settings
//! - [`models`]: wire types for packages, zones and users

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiClient, ApiConfig, ApiError, RequestConfig};
pub use auth::{Session, TokenStore};
pub use config::Config;
