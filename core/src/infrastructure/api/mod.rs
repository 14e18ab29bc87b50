//! Client for the third-party demo auth/profile API
//!
//! The core itself never depends on this module; it hangs off [`crate::Core`]
//! for the presentation layer. The auth protocol is the demo API's problem -
//! this is only the glue: token injection, 401 eviction, error folding.

pub mod auth;
pub mod types;
pub mod users;

pub use auth::AuthService;
pub use types::{Credentials, ProfileChanges, Session, SignupRequest, UserProfile};
pub use users::UserService;

use crate::device::CredentialStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

pub(crate) const ACCESS_TOKEN_KEY: &str = "accessToken";
pub(crate) const REFRESH_TOKEN_KEY: &str = "refreshToken";
pub(crate) const USER_KEY: &str = "user";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// API call errors. Server messages are preserved; transport details fold
/// into [`ApiError::Transport`].
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("not authenticated")]
    Unauthorized,

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("no refresh token available")]
    NoRefreshToken,
}

/// Thin reqwest wrapper shared by the auth and user services.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialStore>,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            credentials,
        })
    }

    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let request = self.http.post(self.url(path)).json(body);
        self.send(request).await
    }

    pub async fn put_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let request = self.http.put(self.url(path)).json(body);
        self.send(request).await
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(self.http.get(self.url(path))).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }

    async fn send<T: DeserializeOwned>(
        &self,
        mut request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        if let Some(token) = self.credentials.get(ACCESS_TOKEN_KEY).await {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            // The stored tokens are no longer valid; evict them so the shell
            // falls back to the login screen.
            warn!("401 from API, evicting stored tokens");
            self.credentials.delete(ACCESS_TOKEN_KEY).await;
            self.credentials.delete(REFRESH_TOKEN_KEY).await;
            return Err(ApiError::Unauthorized);
        }

        if !status.is_success() {
            let message = response
                .json::<types::ApiErrorBody>()
                .await
                .ok()
                .and_then(|body| body.message)
                .unwrap_or_else(|| "An unexpected error occurred".to_string());
            return Err(ApiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}
