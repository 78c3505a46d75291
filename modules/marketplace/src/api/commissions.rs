use std::sync::Arc;

use async_trait::async_trait;
use clientkit::{ApiClient, ApiError};

use crate::model::{Commission, CommissionPatch, NewCommission};

/// CRUD over the logged-in member's commissions.
///
/// Single-record operations address the commission by id in the query
/// string, matching the server's routing.
#[async_trait]
pub trait CommissionsApi: Send + Sync {
    /// Post a new cleaning request.
    async fn create(&self, new: NewCommission) -> Result<Commission, ApiError>;

    /// Every commission belonging to the logged-in member.
    async fn list(&self) -> Result<Vec<Commission>, ApiError>;

    /// One commission by id.
    async fn get(&self, id: i64) -> Result<Commission, ApiError>;

    /// Apply a partial update, returning the updated commission.
    async fn update(&self, id: i64, patch: CommissionPatch) -> Result<Commission, ApiError>;

    /// Withdraw a commission.
    async fn remove(&self, id: i64) -> Result<(), ApiError>;
}

/// [`CommissionsApi`] over HTTP, bound to the member host client.
pub struct HttpCommissionsApi {
    client: Arc<ApiClient>,
}

impl HttpCommissionsApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CommissionsApi for HttpCommissionsApi {
    async fn create(&self, new: NewCommission) -> Result<Commission, ApiError> {
        self.client.post_json("/members/commission", &new).await
    }

    async fn list(&self) -> Result<Vec<Commission>, ApiError> {
        self.client.get_json("/members/commission/list").await
    }

    async fn get(&self, id: i64) -> Result<Commission, ApiError> {
        self.client.get_json(&format!("/members/commission?id={id}")).await
    }

    async fn update(&self, id: i64, patch: CommissionPatch) -> Result<Commission, ApiError> {
        self.client
            .patch_json(&format!("/members/commission?id={id}"), &patch)
            .await
    }

    async fn remove(&self, id: i64) -> Result<(), ApiError> {
        self.client.delete(&format!("/members/commission?id={id}")).await
    }
}
