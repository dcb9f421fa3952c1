//! Request and response envelopes for the Shopware Admin API.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One operation inside a `/api/_action/sync` request body.
#[derive(Debug, Serialize)]
pub(crate) struct SyncOperation<'a, T> {
    pub entity: &'a str,
    pub action: &'static str,
    pub payload: &'a [T],
}

#[derive(Debug, Serialize)]
pub(crate) struct SearchRequest<'a> {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub filter: Vec<EqualsFilter<'a>>,
    pub limit: u32,
}

impl<'a> SearchRequest<'a> {
    pub fn equals(field: &'a str, value: &'a str, limit: u32) -> Self {
        Self {
            filter: vec![EqualsFilter {
                kind: "equals",
                field,
                value,
            }],
            limit,
        }
    }

    pub fn all(limit: u32) -> Self {
        Self {
            filter: Vec::new(),
            limit,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct EqualsFilter<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub field: &'a str,
    pub value: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EntityRef {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
}

/// A tax entity as listed by `/api/search/tax`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TaxRate {
    pub id: String,
    /// Percentage, e.g. `19` or `7`.
    #[serde(rename = "taxRate")]
    pub tax_rate: Decimal,
}
