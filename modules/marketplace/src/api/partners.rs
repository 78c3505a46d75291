use std::sync::Arc;

use async_trait::async_trait;
use clientkit::{ApiClient, ApiError};

use crate::model::{LoginRequest, PartnerPatch, PartnerProfile, TokenPair};

/// Account operations for partners.
#[async_trait]
pub trait PartnersApi: Send + Sync {
    /// Exchange credentials for a token pair.
    async fn login(&self, credentials: LoginRequest) -> Result<TokenPair, ApiError>;

    /// Profile of the partner the bearer token belongs to.
    async fn profile(&self) -> Result<PartnerProfile, ApiError>;

    /// Apply a partial profile update, returning the updated profile.
    async fn update_profile(&self, patch: PartnerPatch) -> Result<PartnerProfile, ApiError>;

    /// Permanently delete the account.
    async fn withdraw(&self) -> Result<(), ApiError>;
}

/// [`PartnersApi`] over HTTP, bound to the partner host client.
pub struct HttpPartnersApi {
    client: Arc<ApiClient>,
}

impl HttpPartnersApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PartnersApi for HttpPartnersApi {
    async fn login(&self, credentials: LoginRequest) -> Result<TokenPair, ApiError> {
        self.client.post_json("/partner/login", &credentials).await
    }

    async fn profile(&self) -> Result<PartnerProfile, ApiError> {
        self.client.get_json("/partner/profile").await
    }

    async fn update_profile(&self, patch: PartnerPatch) -> Result<PartnerProfile, ApiError> {
        self.client.patch_json("/partner/profile", &patch).await
    }

    async fn withdraw(&self) -> Result<(), ApiError> {
        self.client.delete("/partner/withdraw").await
    }
}
