//! Access-token refresh and the single-flight cell that guards it.
//!
//! At most one refresh exchange is in flight at any time. Every caller that
//! hits a 401 while one is running waits on that same exchange and sees its
//! outcome.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::auth::TokenStore;

/// Path of the refresh endpoint, relative to the API base URL
pub const REFRESH_PATH: &str = "/auth/refresh";

/// How a caller took part in a single-flight operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flight<T> {
    /// This caller started the operation
    Leader(T),
    /// This caller waited on an operation someone else started
    Joined(T),
}

impl<T> Flight<T> {
    pub fn is_leader(&self) -> bool {
        matches!(self, Flight::Leader(_))
    }

    pub fn into_inner(self) -> T {
        match self {
            Flight::Leader(value) | Flight::Joined(value) => value,
        }
    }
}

type SharedOp<T> = Shared<BoxFuture<'static, T>>;

/// Runs at most one instance of an async operation at a time.
///
/// The first caller of [`run`](Self::run) while idle becomes the leader and
/// installs its operation; callers arriving before it completes join it.
/// The operation removes itself from the cell as it completes, so a leader
/// that gets dropped mid-flight never leaves a stale result behind: any
/// joined caller keeps driving it to completion.
pub struct SingleFlight<T: Clone> {
    slot: Arc<Mutex<Option<(u64, SharedOp<T>)>>>,
    generation: AtomicU64,
}

impl<T> SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
            generation: AtomicU64::new(0),
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.slot.lock().is_some()
    }

    pub async fn run<F, Fut>(&self, make: F) -> Flight<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        // Check-and-install happens under one lock, never across an await
        let (op, leader) = {
            let mut slot = self.slot.lock();
            match slot.as_ref() {
                Some((_, op)) => (op.clone(), false),
                None => {
                    let id = self.generation.fetch_add(1, Ordering::Relaxed);
                    let cell = Arc::clone(&self.slot);
                    let work = make();
                    let op = async move {
                        let output = work.await;
                        let mut slot = cell.lock();
                        if matches!(slot.as_ref(), Some((current, _)) if *current == id) {
                            *slot = None;
                        }
                        output
                    }
                    .boxed()
                    .shared();
                    *slot = Some((id, op.clone()));
                    (op, true)
                }
            }
        };

        let output = op.await;
        if leader {
            Flight::Leader(output)
        } else {
            Flight::Joined(output)
        }
    }
}

impl<T> Default for SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Failure of the refresh exchange. Cloned to every waiter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefreshError {
    #[error("No refresh token available")]
    NoRefreshToken,

    #[error("Refresh rejected with status {status}")]
    Rejected { status: u16 },

    #[error("Refresh request failed: {0}")]
    Transport(String),

    #[error("Refresh timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("Invalid refresh response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    access_token: String,
    refresh_token: Option<String>,
}

/// One refresh-token exchange against `POST {base}/auth/refresh`.
///
/// Deliberately bypasses the request engine: a 401 here must not recurse
/// into another refresh.
#[derive(Clone)]
pub(crate) struct RefreshExchange {
    pub(crate) http: Client,
    pub(crate) url: String,
    pub(crate) timeout: Duration,
    pub(crate) tokens: TokenStore,
}

impl RefreshExchange {
    /// Exchange the stored refresh token and install the result.
    ///
    /// Returns the new access token. Tokens are left untouched on failure.
    pub(crate) async fn run(self) -> Result<String, RefreshError> {
        let result = self.exchange().await;
        if let Err(ref e) = result {
            warn!(error = %e, "Token refresh failed");
        }
        result
    }

    async fn exchange(&self) -> Result<String, RefreshError> {
        let refresh_token = self
            .tokens
            .refresh_token()
            .ok_or(RefreshError::NoRefreshToken)?;

        debug!(url = %self.url, "Refreshing access token");

        let send = self
            .http
            .post(&self.url)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&RefreshRequest {
                refresh_token: &refresh_token,
            })
            .send();

        let response = tokio::time::timeout(self.timeout, send)
            .await
            .map_err(|_| RefreshError::Timeout(self.timeout))?
            .map_err(|e| RefreshError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RefreshError::Rejected {
                status: status.as_u16(),
            });
        }

        let body = tokio::time::timeout(self.timeout, response.text())
            .await
            .map_err(|_| RefreshError::Timeout(self.timeout))?
            .map_err(|e| RefreshError::Transport(e.to_string()))?;

        let parsed: RefreshResponse = serde_json::from_str(&body)
            .map_err(|e| RefreshError::InvalidResponse(e.to_string()))?;

        match parsed.refresh_token.filter(|t| !t.is_empty()) {
            Some(rotated) => self.tokens.set_tokens(&crate::auth::TokenPair::new(
                parsed.access_token.clone(),
                rotated,
            )),
            None => self.tokens.set_access_token(&parsed.access_token),
        }

        info!("Access token refreshed");
        Ok(parsed.access_token)
    }
}
