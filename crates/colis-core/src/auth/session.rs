//! Login state on top of the request engine.
//!
//! The engine never clears tokens when a refresh fails; deciding that a
//! session is over happens here.

use thiserror::Error;
use tracing::{debug, info, warn};

use super::tokens::{TokenPair, TokenStore, DEFAULT_EXPIRY_BUFFER_SECS};
use crate::api::colis::segment;
use crate::api::{ApiClient, ApiError, RequestConfig};
use crate::models::{AuthResponse, LoginCredentials, User};

const LOGIN_PATH: &str = "/auth/login";
const ME_PATH: &str = "/auth/me";
const OAUTH_PATH: &str = "/auth/oauth";

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Username and password are required")]
    MissingCredentials,

    #[error(transparent)]
    Api(#[from] ApiError),
}

pub struct Session {
    client: ApiClient,
}

impl Session {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn tokens(&self) -> &TokenStore {
        self.client.tokens()
    }

    pub fn is_authenticated(&self) -> bool {
        self.tokens().is_authenticated()
    }

    /// Authenticate with username and password, then persist the tokens and
    /// the returned profile.
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthResponse, SessionError> {
        if username.trim().is_empty() || password.trim().is_empty() {
            return Err(SessionError::MissingCredentials);
        }

        let credentials = LoginCredentials {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response: AuthResponse = self
            .client
            .post(LOGIN_PATH, Some(&credentials), RequestConfig::new().skip_auth())
            .await?;

        self.tokens().set_tokens(&TokenPair::new(
            response.access_token.clone(),
            response.refresh_token.clone(),
        ));
        self.tokens().set_cached_user(&response.user);

        info!(username = %response.user.username, "Logged in");
        Ok(response)
    }

    pub fn logout(&self) {
        self.tokens().clear_tokens();
        info!("Logged out");
    }

    /// Profile cached at login or by the last `refresh_user`
    pub fn current_user(&self) -> Option<User> {
        self.tokens().cached_user()
    }

    /// Fetch the profile from `/auth/me`. Any failure ends the session.
    pub async fn refresh_user(&self) -> Result<User, SessionError> {
        match self.client.get::<User>(ME_PATH, RequestConfig::default()).await {
            Ok(user) => {
                self.tokens().set_cached_user(&user);
                Ok(user)
            }
            Err(e) => {
                warn!(error = %e, "Failed to load current user, logging out");
                self.logout();
                Err(e.into())
            }
        }
    }

    /// Startup check: if the stored access token is expired, probe
    /// `/auth/me` so the engine gets a chance to refresh it. Clears the
    /// session when the probe fails.
    ///
    /// Returns whether the user is still authenticated.
    pub async fn restore(&self) -> bool {
        if !self.is_authenticated() {
            debug!("No stored session");
            return false;
        }

        if !self.tokens().is_token_expired(DEFAULT_EXPIRY_BUFFER_SECS) {
            return true;
        }

        debug!("Stored access token expired, probing session");
        match self.client.get::<User>(ME_PATH, RequestConfig::default()).await {
            Ok(user) => {
                self.tokens().set_cached_user(&user);
                true
            }
            Err(e) => {
                warn!(error = %e, "Stored session is no longer valid");
                self.tokens().clear_tokens();
                false
            }
        }
    }

    /// Redirect target for provider login. No request is made.
    pub fn oauth_url(&self, provider: &str) -> String {
        self.client
            .url(&format!("{}/{}", OAUTH_PATH, segment(provider.trim())))
    }
}
