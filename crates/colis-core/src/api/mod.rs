//! REST API client module for the colis backend.
//!
//! `ApiClient` is the authenticated request engine: it injects the bearer
//! token from the `TokenStore`, enforces per-call timeouts, and renews an
//! expired access token through a single shared refresh before retrying.
//! Resource wrappers (`colis()`, `zones()`, `users()`) sit on top of it.

pub mod client;
pub mod colis;
pub mod error;
pub mod refresh;
pub mod request;
pub mod users;
pub mod zones;

pub use client::{ApiClient, ApiConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT, NO_BODY};
pub use colis::ColisApi;
pub use error::{ApiError, ApiErrorPayload, SESSION_EXPIRED_MESSAGE};
pub use refresh::{Flight, RefreshError, SingleFlight, REFRESH_PATH};
pub use request::{Payload, RequestConfig};
pub use users::UsersApi;
pub use zones::ZonesApi;

impl ApiClient {
    pub fn colis(&self) -> ColisApi<'_> {
        ColisApi::new(self)
    }

    pub fn zones(&self) -> ZonesApi<'_> {
        ZonesApi::new(self)
    }

    pub fn users(&self) -> UsersApi<'_> {
        UsersApi::new(self)
    }
}
