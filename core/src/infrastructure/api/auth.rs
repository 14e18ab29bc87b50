//! Authentication against the demo API

use super::types::{Credentials, Session, SignupRequest, UserProfile};
use super::{ApiClient, ApiError, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY};
use crate::device::CredentialStore;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    access_token: String,
    refresh_token: String,
}

/// Login, signup, logout, and session inspection. Tokens and the serialized
/// profile live in the credential store.
pub struct AuthService {
    client: Arc<ApiClient>,
    credentials: Arc<dyn CredentialStore>,
}

impl AuthService {
    pub fn new(client: Arc<ApiClient>, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            client,
            credentials,
        }
    }

    /// Log in and persist the session.
    pub async fn login(&self, credentials: Credentials) -> Result<Session, ApiError> {
        let session: Session = self.client.post_json("/auth/login", &credentials).await?;

        self.credentials
            .set(ACCESS_TOKEN_KEY, &session.access_token)
            .await;
        self.credentials
            .set(REFRESH_TOKEN_KEY, &session.refresh_token)
            .await;
        if let Ok(user_json) = serde_json::to_string(&session.user) {
            self.credentials.set(USER_KEY, &user_json).await;
        }

        info!(username = %session.user.username, "logged in");
        Ok(session)
    }

    /// Register a new user. The demo API creates a mock record but does not
    /// persist it for login, so there is no auto-login; the caller sends the
    /// user back to the login screen.
    pub async fn signup(&self, request: SignupRequest) -> Result<UserProfile, ApiError> {
        self.client.post_json("/users/add", &request).await
    }

    /// Clear the stored session.
    pub async fn logout(&self) {
        self.credentials.delete(ACCESS_TOKEN_KEY).await;
        self.credentials.delete(REFRESH_TOKEN_KEY).await;
        self.credentials.delete(USER_KEY).await;
        info!("logged out");
    }

    /// The stored profile, if a session exists and parses.
    pub async fn current_user(&self) -> Option<UserProfile> {
        let user_json = self.credentials.get(USER_KEY).await?;
        match serde_json::from_str(&user_json) {
            Ok(user) => Some(user),
            Err(err) => {
                warn!(%err, "stored user profile is unreadable");
                None
            }
        }
    }

    pub async fn is_authenticated(&self) -> bool {
        self.credentials.get(ACCESS_TOKEN_KEY).await.is_some()
    }

    /// Exchange the stored refresh token for a new token pair.
    pub async fn refresh(&self) -> Result<String, ApiError> {
        let refresh_token = self
            .credentials
            .get(REFRESH_TOKEN_KEY)
            .await
            .ok_or(ApiError::NoRefreshToken)?;

        let response: RefreshResponse = self
            .client
            .post_json("/auth/refresh", &json!({ "refreshToken": refresh_token }))
            .await?;

        self.credentials
            .set(ACCESS_TOKEN_KEY, &response.access_token)
            .await;
        self.credentials
            .set(REFRESH_TOKEN_KEY, &response.refresh_token)
            .await;

        Ok(response.access_token)
    }

    /// Persist an updated profile (after a successful profile edit).
    pub async fn store_user(&self, user: &UserProfile) {
        if let Ok(user_json) = serde_json::to_string(user) {
            self.credentials.set(USER_KEY, &user_json).await;
        }
    }
}
