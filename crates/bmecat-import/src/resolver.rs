//! Run-scoped cache of shop reference ids.

use std::collections::{BTreeSet, HashMap};

use bmecat_core::{manufacturer_id, rate_key};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::backend::{ReferenceSource, SyncTarget};
use crate::error::ImportError;

/// Page size for the one-shot tax listing.
pub const TAX_PAGE_SIZE: u32 = 500;

/// Manufacturers are upserted in fixed groups of this size, without
/// failure isolation.
pub const MANUFACTURER_BATCH_SIZE: usize = 200;

pub const MANUFACTURER_ENTITY: &str = "product_manufacturer";

#[derive(Debug, Serialize)]
struct ManufacturerPayload<'a> {
    id: Uuid,
    name: &'a str,
}

/// Resolves currency codes, tax rates and manufacturer names to remote ids.
///
/// Every entry, once cached, is authoritative for the rest of the run.
#[derive(Debug, Default)]
pub struct ReferenceResolver {
    currencies: HashMap<String, String>,
    taxes: HashMap<Decimal, String>,
    taxes_loaded: bool,
    manufacturers: HashMap<String, Uuid>,
}

impl ReferenceResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Remote id for an ISO currency code, fetched once per code.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::UnknownCurrency`] if the shop has no such
    /// currency, or [`ImportError::Shopware`] if the lookup fails.
    pub async fn currency_id<S>(&mut self, source: &S, iso_code: &str) -> Result<String, ImportError>
    where
        S: ReferenceSource + ?Sized,
    {
        if let Some(id) = self.currencies.get(iso_code) {
            return Ok(id.clone());
        }
        let id = source
            .currency_id(iso_code)
            .await?
            .ok_or_else(|| ImportError::UnknownCurrency {
                iso_code: iso_code.to_string(),
            })?;
        self.currencies.insert(iso_code.to_string(), id.clone());
        Ok(id)
    }

    /// Bulk-load the shop's tax table. Later calls are no-ops.
    ///
    /// When several tax entities share a rate, the one listed last wins.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::Shopware`] if the listing fails.
    pub async fn load_taxes<S>(&mut self, source: &S) -> Result<(), ImportError>
    where
        S: ReferenceSource + ?Sized,
    {
        if self.taxes_loaded {
            return Ok(());
        }
        for tax in source.tax_rates(TAX_PAGE_SIZE).await? {
            self.taxes.insert(rate_key(tax.tax_rate), tax.id);
        }
        self.taxes_loaded = true;
        tracing::info!(count = self.taxes.len(), "loaded tax rates");
        Ok(())
    }

    /// Remote tax id for a percentage, matched to two decimal places.
    #[must_use]
    pub fn tax_id(&self, percent: Decimal) -> Option<&str> {
        self.taxes.get(&rate_key(percent)).map(String::as_str)
    }

    /// Deterministic manufacturer id; identical to the id used on upsert.
    #[must_use]
    pub fn manufacturer_id(&self, name: &str) -> Uuid {
        self.manufacturers
            .get(name)
            .copied()
            .unwrap_or_else(|| manufacturer_id(name))
    }

    /// Upsert every manufacturer name (in sorted order) before any product
    /// refers to it, and cache the ids used.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::Shopware`] on the first failing group; groups
    /// are not bisected.
    pub async fn upsert_manufacturers<T>(
        &mut self,
        target: &T,
        names: &BTreeSet<String>,
    ) -> Result<usize, ImportError>
    where
        T: SyncTarget + ?Sized,
    {
        let payload: Vec<ManufacturerPayload<'_>> = names
            .iter()
            .map(|name| ManufacturerPayload {
                id: manufacturer_id(name),
                name,
            })
            .collect();

        for chunk in payload.chunks(MANUFACTURER_BATCH_SIZE) {
            target.sync_upsert(MANUFACTURER_ENTITY, chunk).await?;
        }

        self.manufacturers
            .extend(payload.iter().map(|m| (m.name.to_string(), m.id)));
        tracing::info!(count = payload.len(), "upserted manufacturers");
        Ok(payload.len())
    }
}

#[cfg(test)]
#[path = "resolver_test.rs"]
mod tests;
