//! Profile updates against the demo API

use super::types::{ProfileChanges, UserProfile};
use super::{ApiClient, ApiError};
use std::sync::Arc;

pub struct UserService {
    client: Arc<ApiClient>,
}

impl UserService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Update the given profile fields and return the merged profile.
    pub async fn update_profile(
        &self,
        id: u64,
        changes: &ProfileChanges,
    ) -> Result<UserProfile, ApiError> {
        self.client.put_json(&format!("/users/{id}"), changes).await
    }
}
