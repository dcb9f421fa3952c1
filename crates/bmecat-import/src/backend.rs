//! Capability seams between the importer and the remote shop.
//!
//! [`ShopwareClient`] implements both traits; tests substitute in-memory
//! fakes.

use async_trait::async_trait;
use bmecat_shopware::{ShopwareClient, ShopwareError, TaxRate};
use serde::Serialize;

/// Read access to shop-side reference data.
#[async_trait]
pub trait ReferenceSource: Send + Sync {
    async fn currency_id(&self, iso_code: &str) -> Result<Option<String>, ShopwareError>;

    async fn tax_rates(&self, limit: u32) -> Result<Vec<TaxRate>, ShopwareError>;
}

/// Bulk create-or-update of entities.
#[async_trait]
pub trait SyncTarget: Send + Sync {
    async fn sync_upsert<T>(&self, entity: &str, payload: &[T]) -> Result<(), ShopwareError>
    where
        T: Serialize + Sync;
}

#[async_trait]
impl ReferenceSource for ShopwareClient {
    async fn currency_id(&self, iso_code: &str) -> Result<Option<String>, ShopwareError> {
        ShopwareClient::currency_id(self, iso_code).await
    }

    async fn tax_rates(&self, limit: u32) -> Result<Vec<TaxRate>, ShopwareError> {
        ShopwareClient::tax_rates(self, limit).await
    }
}

#[async_trait]
impl SyncTarget for ShopwareClient {
    async fn sync_upsert<T>(&self, entity: &str, payload: &[T]) -> Result<(), ShopwareError>
    where
        T: Serialize + Sync,
    {
        ShopwareClient::sync_upsert(self, entity, payload).await
    }
}
