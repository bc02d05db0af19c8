//! Authentication module for token persistence and login state.
//!
//! This module provides:
//! - `TokenStore`: the access/refresh token pair plus cached user profile
//! - `TokenStorage` backends: in-memory, JSON file, and OS keychain
//! - `Session`: login, logout, and startup session validation

pub mod credentials;
pub mod session;
pub mod storage;
pub mod tokens;

pub use credentials::KeyringStorage;
pub use session::{Session, SessionError};
pub use storage::{FileStorage, MemoryStorage, TokenStorage};
pub use tokens::{
    decode_token, TokenClaims, TokenPair, TokenStore, ACCESS_TOKEN_KEY,
    DEFAULT_EXPIRY_BUFFER_SECS, REFRESH_TOKEN_KEY, USER_KEY,
};
