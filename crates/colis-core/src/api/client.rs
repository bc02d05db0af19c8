//! Authenticated request engine for the colis REST API.
//!
//! Every call goes through one algorithm: build headers (bearer token unless
//! `skip_auth`), race the exchange against a timer, and on a 401 renew the
//! access token once through the shared refresh flight before retrying.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, error, warn};

use super::refresh::{Flight, RefreshError, RefreshExchange, SingleFlight, REFRESH_PATH};
use super::request::{Payload, RequestConfig};
use super::ApiError;
use crate::auth::TokenStore;

// ============================================================================
// Constants
// ============================================================================

/// Base URL used when nothing else is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:8081/api";

/// Default time allowed for one request/response exchange
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Message used when an error body carries no usable text
const GENERIC_ERROR_MESSAGE: &str = "An error occurred";

const JSON_CONTENT_TYPE: &str = "application/json";

/// Pass as the body of a verb call that sends none.
pub const NO_BODY: Option<&()> = None;

/// Connection settings for [`ApiClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// A request with its body already serialized, so it can be re-sent as-is.
#[derive(Debug)]
struct PreparedRequest {
    method: Method,
    url: String,
    body: Option<Vec<u8>>,
    headers: HeaderMap,
    skip_auth: bool,
    timeout: Duration,
}

/// Status, content kind and body text, read within the request timeout.
#[derive(Debug)]
struct RawResponse {
    status: StatusCode,
    is_json: bool,
    body: String,
    /// Access token the request carried, if any
    sent_token: Option<String>,
}

/// API client for the colis backend.
/// Clone is cheap - clones share the connection pool, token store and
/// refresh state.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

struct Inner {
    http: Client,
    base_url: String,
    timeout: Duration,
    tokens: TokenStore,
    refresh: SingleFlight<Result<String, RefreshError>>,
}

impl ApiClient {
    pub fn new(config: ApiConfig, tokens: TokenStore) -> Result<Self, ApiError> {
        let http = Client::builder()
            .user_agent(concat!("colis-console/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                base_url: config.base_url.trim_end_matches('/').to_string(),
                timeout: config.timeout,
                tokens,
                refresh: SingleFlight::new(),
            }),
        })
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.inner.tokens
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn default_timeout(&self) -> Duration {
        self.inner.timeout
    }

    /// Absolute URL for a path relative to the base URL
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.inner.base_url, path)
        } else {
            format!("{}/{}", self.inner.base_url, path)
        }
    }

    /// True while a token refresh is in flight
    pub fn is_refreshing(&self) -> bool {
        self.inner.refresh.is_in_flight()
    }

    // ===== Verbs =====

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        config: RequestConfig,
    ) -> Result<T, ApiError> {
        self.request(Method::GET, path, NO_BODY, config).await?.decode()
    }

    pub async fn post<T, B>(
        &self,
        path: &str,
        body: Option<&B>,
        config: RequestConfig,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, path, body, config).await?.decode()
    }

    pub async fn put<T, B>(
        &self,
        path: &str,
        body: Option<&B>,
        config: RequestConfig,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PUT, path, body, config).await?.decode()
    }

    pub async fn patch<T, B>(
        &self,
        path: &str,
        body: Option<&B>,
        config: RequestConfig,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PATCH, path, body, config).await?.decode()
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        config: RequestConfig,
    ) -> Result<T, ApiError> {
        self.request(Method::DELETE, path, NO_BODY, config).await?.decode()
    }

    /// Run one logical call and return the interpreted body.
    pub async fn request<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        config: RequestConfig,
    ) -> Result<Payload, ApiError>
    where
        B: Serialize + ?Sized,
    {
        let body = body.map(serde_json::to_vec).transpose()?;
        let request = PreparedRequest {
            method,
            url: self.url(path),
            body,
            headers: config.headers,
            skip_auth: config.skip_auth,
            timeout: config.timeout.unwrap_or(self.inner.timeout),
        };
        self.execute(&request).await
    }

    /// Renew the access token through the shared refresh flight.
    ///
    /// Joins a refresh that is already running instead of starting another.
    pub async fn refresh_tokens(&self) -> Result<String, ApiError> {
        Ok(self.run_refresh().await.into_inner()?)
    }

    // ===== Engine =====

    async fn execute(&self, request: &PreparedRequest) -> Result<Payload, ApiError> {
        let response = self.dispatch(request, None).await?;

        if response.status != StatusCode::UNAUTHORIZED || request.skip_auth {
            return self.interpret(request, response);
        }

        // A refresh finished after this request went out: its 401 is stale
        let current = self.inner.tokens.access_token();
        if current.is_some() && current != response.sent_token && !self.is_refreshing() {
            debug!(url = %request.url, "Received 401 for a replaced token, retrying");
            let retry = self.dispatch(request, None).await?;
            return self.finish_retry(request, retry);
        }

        debug!(url = %request.url, "Received 401, renewing access token");

        match self.run_refresh().await {
            Flight::Leader(Ok(_)) => {
                // Re-read the store: the retry carries whatever was installed
                let retry = self.dispatch(request, None).await?;
                self.finish_retry(request, retry)
            }
            Flight::Leader(Err(e)) => {
                warn!(url = %request.url, error = %e, "Session could not be renewed");
                Err(ApiError::SessionExpired)
            }
            Flight::Joined(Ok(token)) => {
                let retry = self.dispatch(request, Some(&token)).await?;
                self.finish_retry(request, retry)
            }
            Flight::Joined(Err(e)) => Err(e.into()),
        }
    }

    async fn run_refresh(&self) -> Flight<Result<String, RefreshError>> {
        let exchange = RefreshExchange {
            http: self.inner.http.clone(),
            url: self.url(REFRESH_PATH),
            timeout: self.inner.timeout,
            tokens: self.inner.tokens.clone(),
        };
        self.inner.refresh.run(move || exchange.run()).await
    }

    /// A retried request is never refreshed again; another 401 ends the
    /// session.
    fn finish_retry(
        &self,
        request: &PreparedRequest,
        response: RawResponse,
    ) -> Result<Payload, ApiError> {
        if response.status == StatusCode::UNAUTHORIZED {
            warn!(url = %request.url, "Retry after refresh still unauthorized");
            return Err(ApiError::SessionExpired);
        }
        self.interpret(request, response)
    }

    fn build_headers(
        &self,
        request: &PreparedRequest,
        token_override: Option<&str>,
    ) -> Result<HeaderMap, ApiError> {
        let mut headers = request.headers.clone();

        if !headers.contains_key(header::CONTENT_TYPE) {
            headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static(JSON_CONTENT_TYPE),
            );
        }

        if !request.skip_auth {
            let token = match token_override {
                Some(token) => Some(token.to_string()),
                None => self.inner.tokens.access_token(),
            };
            if let Some(token) = token {
                let value = HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|e| ApiError::InvalidHeader(format!("authorization: {}", e)))?;
                headers.insert(header::AUTHORIZATION, value);
            }
        }

        Ok(headers)
    }

    /// Send the request and read its body, racing both against the timeout.
    async fn dispatch(
        &self,
        request: &PreparedRequest,
        token_override: Option<&str>,
    ) -> Result<RawResponse, ApiError> {
        let headers = self.build_headers(request, token_override)?;
        let sent_token = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::to_string);

        let mut builder = self
            .inner
            .http
            .request(request.method.clone(), &request.url)
            .headers(headers);
        if let Some(ref body) = request.body {
            builder = builder.body(body.clone());
        }

        debug!(method = %request.method, url = %request.url, "Sending request");

        let exchange = async move {
            let response = builder.send().await?;
            let status = response.status();
            let is_json = response
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.contains(JSON_CONTENT_TYPE))
                .unwrap_or(false);
            let body = if status == StatusCode::NO_CONTENT {
                String::new()
            } else {
                response.text().await?
            };
            Ok::<_, ApiError>(RawResponse {
                status,
                is_json,
                body,
                sent_token,
            })
        };

        match tokio::time::timeout(request.timeout, exchange).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    url = %request.url,
                    timeout_ms = request.timeout.as_millis() as u64,
                    "Request timed out"
                );
                Err(ApiError::Timeout(request.timeout))
            }
        }
    }

    fn interpret(
        &self,
        request: &PreparedRequest,
        response: RawResponse,
    ) -> Result<Payload, ApiError> {
        if response.status == StatusCode::NO_CONTENT {
            return Ok(Payload::Empty);
        }

        if !response.status.is_success() {
            return Err(Self::error_from_response(request, &response));
        }

        if !response.is_json {
            return Ok(Payload::Text(response.body));
        }

        if response.body.trim().is_empty() {
            return Ok(Payload::Empty);
        }

        serde_json::from_str(&response.body)
            .map(Payload::Json)
            .map_err(|e| {
                ApiError::InvalidResponse(format!("Failed to parse JSON from {}: {}", request.url, e))
            })
    }

    fn error_from_response(request: &PreparedRequest, response: &RawResponse) -> ApiError {
        let (message, code) = if response.is_json {
            let data: Value = serde_json::from_str(&response.body)
                .unwrap_or_else(|_| Value::Object(Map::new()));
            (Self::error_message(&data), Self::error_code(&data))
        } else {
            let reason = response
                .status
                .canonical_reason()
                .unwrap_or(GENERIC_ERROR_MESSAGE);
            (reason.to_string(), None)
        };

        error!(
            url = %request.url,
            status = response.status.as_u16(),
            body = %ApiError::truncate_body(&response.body),
            "API request failed"
        );

        ApiError::Api {
            message,
            status: response.status.as_u16(),
            code,
        }
    }

    fn error_message(data: &Value) -> String {
        ["message", "error"]
            .iter()
            .filter_map(|field| data.get(*field).and_then(Value::as_str))
            .find(|text| !text.is_empty())
            .unwrap_or(GENERIC_ERROR_MESSAGE)
            .to_string()
    }

    fn error_code(data: &Value) -> Option<String> {
        match data.get("code")? {
            Value::String(code) => Some(code.clone()),
            Value::Number(code) => Some(code.to_string()),
            _ => None,
        }
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .field("timeout", &self.inner.timeout)
            .finish()
    }
}
