use std::sync::Arc;

use async_trait::async_trait;
use clientkit::{ApiClient, ApiError};

use crate::model::{Commission, Estimate, EstimatePatch, NewEstimate};

/// Estimate operations for partners, plus the partner's view of open
/// commissions to quote on.
#[async_trait]
pub trait EstimatesApi: Send + Sync {
    /// Submit a quote against a commission.
    async fn create(&self, new: NewEstimate) -> Result<Estimate, ApiError>;

    /// Every estimate submitted by the logged-in partner.
    async fn list(&self) -> Result<Vec<Estimate>, ApiError>;

    /// Apply a partial update, returning the updated estimate.
    async fn update(&self, id: i64, patch: EstimatePatch) -> Result<Estimate, ApiError>;

    /// Retract an estimate.
    async fn remove(&self, id: i64) -> Result<(), ApiError>;

    /// Commissions currently open for quoting.
    async fn open_commissions(&self) -> Result<Vec<Commission>, ApiError>;
}

/// [`EstimatesApi`] over HTTP, bound to the partner host client.
pub struct HttpEstimatesApi {
    client: Arc<ApiClient>,
}

impl HttpEstimatesApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EstimatesApi for HttpEstimatesApi {
    async fn create(&self, new: NewEstimate) -> Result<Estimate, ApiError> {
        self.client.post_json("/partner/estimate", &new).await
    }

    async fn list(&self) -> Result<Vec<Estimate>, ApiError> {
        self.client.get_json("/partner/estimate/list").await
    }

    async fn update(&self, id: i64, patch: EstimatePatch) -> Result<Estimate, ApiError> {
        self.client
            .patch_json(&format!("/partner/estimate?id={id}"), &patch)
            .await
    }

    async fn remove(&self, id: i64) -> Result<(), ApiError> {
        self.client.delete(&format!("/partner/estimate?id={id}")).await
    }

    async fn open_commissions(&self) -> Result<Vec<Commission>, ApiError> {
        self.client.get_json("/partner/commissionlist").await
    }
}
