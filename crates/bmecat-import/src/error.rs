use bmecat_core::StoreError;
use bmecat_shopware::ShopwareError;
use rust_decimal::Decimal;
use thiserror::Error;

/// Conditions that abort an import run.
///
/// Per-record problems never surface here; they are counted in the run
/// statistics and written to the error log instead.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Shopware(#[from] ShopwareError),

    #[error("currency {iso_code} not found in Shopware")]
    UnknownCurrency { iso_code: String },

    #[error("tax rate {rate}% not available in Shopware")]
    UnmappedTaxRate { rate: Decimal },
}
