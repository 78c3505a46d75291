//! Cache-aware access to commissions and estimates.
//!
//! Reads go through the shared [`QueryCache`]: the first read of a key
//! fetches, later reads are served from memory until a mutation
//! invalidates the key. Mutations call the API and, only on success,
//! publish invalidations on the [`InvalidationBus`] and seed the item key
//! with the record the server returned. A failed mutation leaves every
//! cache entry exactly as it was.

use std::sync::Arc;

use clientkit::{ApiError, Invalidation, InvalidationBus, QueryCache, QueryKey};

use crate::api::{CommissionsApi, EstimatesApi};
use crate::model::{
    Commission, CommissionPatch, Estimate, EstimatePatch, NewCommission, NewEstimate,
};

/// Cache resource names.
pub mod resources {
    /// The member's own commissions.
    pub const COMMISSIONS: &str = "commissions";
    /// The partner's submitted estimates.
    pub const ESTIMATES: &str = "estimates";
    /// Commissions open for quoting, as a partner sees them.
    pub const PARTNER_COMMISSIONS: &str = "partner_commissions";
}

/// Commission reads and mutations for the member side.
pub struct CommissionQueries {
    api: Arc<dyn CommissionsApi>,
    cache: Arc<QueryCache>,
    bus: Arc<InvalidationBus>,
}

impl CommissionQueries {
    pub fn new(api: Arc<dyn CommissionsApi>, cache: Arc<QueryCache>, bus: Arc<InvalidationBus>) -> Self {
        Self { api, cache, bus }
    }

    pub async fn list(&self) -> Result<Arc<Vec<Commission>>, ApiError> {
        self.cache
            .get_or_fetch(QueryKey::list(resources::COMMISSIONS), || self.api.list())
            .await
    }

    pub async fn get(&self, id: i64) -> Result<Arc<Commission>, ApiError> {
        self.cache
            .get_or_fetch(QueryKey::item(resources::COMMISSIONS, id), || self.api.get(id))
            .await
    }

    /// Create a commission. The list key is invalidated everywhere and the
    /// item key is seeded with the server's record, so an immediate read of
    /// the new commission costs no extra fetch.
    pub async fn create(&self, new: NewCommission) -> Result<Commission, ApiError> {
        let created = self.api.create(new).await?;
        self.bus
            .publish(&Invalidation::Key(QueryKey::list(resources::COMMISSIONS)));
        self.cache.seed(
            QueryKey::item(resources::COMMISSIONS, created.commission_id),
            Arc::new(created.clone()),
        );
        Ok(created)
    }

    pub async fn update(&self, id: i64, patch: CommissionPatch) -> Result<Commission, ApiError> {
        let updated = self.api.update(id, patch).await?;
        self.bus
            .publish(&Invalidation::Key(QueryKey::list(resources::COMMISSIONS)));
        self.cache.seed(
            QueryKey::item(resources::COMMISSIONS, id),
            Arc::new(updated.clone()),
        );
        Ok(updated)
    }

    pub async fn remove(&self, id: i64) -> Result<(), ApiError> {
        self.api.remove(id).await?;
        self.bus
            .publish(&Invalidation::Key(QueryKey::item(resources::COMMISSIONS, id)));
        self.bus
            .publish(&Invalidation::Key(QueryKey::list(resources::COMMISSIONS)));
        Ok(())
    }
}

/// Estimate reads and mutations for the partner side.
pub struct EstimateQueries {
    api: Arc<dyn EstimatesApi>,
    cache: Arc<QueryCache>,
    bus: Arc<InvalidationBus>,
}

impl EstimateQueries {
    pub fn new(api: Arc<dyn EstimatesApi>, cache: Arc<QueryCache>, bus: Arc<InvalidationBus>) -> Self {
        Self { api, cache, bus }
    }

    pub async fn list(&self) -> Result<Arc<Vec<Estimate>>, ApiError> {
        self.cache
            .get_or_fetch(QueryKey::list(resources::ESTIMATES), || self.api.list())
            .await
    }

    /// Commissions open for quoting. Cached under its own resource because
    /// it is the partner's view, not the member's commission list.
    pub async fn open_commissions(&self) -> Result<Arc<Vec<Commission>>, ApiError> {
        self.cache
            .get_or_fetch(QueryKey::list(resources::PARTNER_COMMISSIONS), || {
                self.api.open_commissions()
            })
            .await
    }

    /// Submit an estimate. Quoting a commission removes it from the open
    /// feed, so that list is invalidated along with the partner's own.
    pub async fn create(&self, new: NewEstimate) -> Result<Estimate, ApiError> {
        let created = self.api.create(new).await?;
        self.bus
            .publish(&Invalidation::Key(QueryKey::list(resources::ESTIMATES)));
        self.bus.publish(&Invalidation::Key(QueryKey::list(
            resources::PARTNER_COMMISSIONS,
        )));
        self.cache.seed(
            QueryKey::item(resources::ESTIMATES, created.id),
            Arc::new(created.clone()),
        );
        Ok(created)
    }

    pub async fn update(&self, id: i64, patch: EstimatePatch) -> Result<Estimate, ApiError> {
        let updated = self.api.update(id, patch).await?;
        self.bus
            .publish(&Invalidation::Key(QueryKey::list(resources::ESTIMATES)));
        self.cache.seed(
            QueryKey::item(resources::ESTIMATES, id),
            Arc::new(updated.clone()),
        );
        Ok(updated)
    }

    /// Retract an estimate. The quoted commission returns to the open
    /// feed, so that list is invalidated as well.
    pub async fn remove(&self, id: i64) -> Result<(), ApiError> {
        self.api.remove(id).await?;
        self.bus
            .publish(&Invalidation::Key(QueryKey::item(resources::ESTIMATES, id)));
        self.bus
            .publish(&Invalidation::Key(QueryKey::list(resources::ESTIMATES)));
        self.bus.publish(&Invalidation::Key(QueryKey::list(
            resources::PARTNER_COMMISSIONS,
        )));
        Ok(())
    }
}
