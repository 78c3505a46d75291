use std::sync::Arc;

use async_trait::async_trait;
use clientkit::{ApiClient, ApiError};

use crate::model::{LoginRequest, MemberPatch, MemberProfile, PasswordChange, TokenPair};

/// Account operations for members.
#[async_trait]
pub trait MembersApi: Send + Sync {
    /// Exchange credentials for a token pair.
    async fn login(&self, credentials: LoginRequest) -> Result<TokenPair, ApiError>;

    /// Profile of the member the bearer token belongs to.
    async fn profile(&self) -> Result<MemberProfile, ApiError>;

    /// Apply a partial profile update, returning the updated profile.
    async fn update_profile(&self, patch: MemberPatch) -> Result<MemberProfile, ApiError>;

    /// Replace the account password.
    async fn change_password(&self, change: PasswordChange) -> Result<(), ApiError>;

    /// Permanently delete the account.
    async fn withdraw(&self) -> Result<(), ApiError>;
}

/// [`MembersApi`] over HTTP, bound to the member host client.
pub struct HttpMembersApi {
    client: Arc<ApiClient>,
}

impl HttpMembersApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MembersApi for HttpMembersApi {
    async fn login(&self, credentials: LoginRequest) -> Result<TokenPair, ApiError> {
        self.client.post_json("/members/login", &credentials).await
    }

    async fn profile(&self) -> Result<MemberProfile, ApiError> {
        self.client.get_json("/members/profile").await
    }

    async fn update_profile(&self, patch: MemberPatch) -> Result<MemberProfile, ApiError> {
        self.client.patch_json("/members/profile", &patch).await
    }

    async fn change_password(&self, change: PasswordChange) -> Result<(), ApiError> {
        self.client.post_json_unit("/members/password", &change).await
    }

    async fn withdraw(&self) -> Result<(), ApiError> {
        self.client.delete("/members/withdraw").await
    }
}
