//! Mapping of intermediate records to Shopware product payloads.

use bmecat_core::{
    gross_from_percent, product_id, resolve_rate, CustomFields, ProductRecord, Settings,
};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::resolver::ReferenceResolver;

pub const PRODUCT_ENTITY: &str = "product";

/// Storefront visibility used when a sales channel is configured without
/// an explicit `default_visibility` (30 = visible everywhere).
pub const DEFAULT_VISIBILITY: i32 = 30;

/// A `product` entity as sent to `/api/_action/sync`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
    pub id: Uuid,
    pub product_number: String,
    pub name: String,
    pub description: Option<String>,
    pub ean: Option<String>,
    pub manufacturer_id: Option<Uuid>,
    pub tax_id: String,
    pub price: Vec<PricePayload>,
    pub stock: i64,
    pub active: bool,
    pub custom_fields: CustomFields,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub visibilities: Vec<VisibilityPayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePayload {
    pub currency_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub net: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub gross: Decimal,
    pub linked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityPayload {
    pub sales_channel_id: String,
    pub visibility: i32,
}

/// Why a record could not be turned into a payload.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildError {
    /// Product number, name or a parseable net price is missing. The record
    /// is skipped and logged.
    MissingRequiredFields,
    /// The resolved percentage has no tax entity in the shop. Aborts the run.
    UnmappedTaxRate(Decimal),
}

/// Build the product payload for one record.
///
/// # Errors
///
/// See [`BuildError`].
pub fn build_product_payload(
    record: &ProductRecord,
    settings: &Settings,
    currency_id: &str,
    refs: &ReferenceResolver,
) -> Result<ProductPayload, BuildError> {
    let (Some(product_number), Some(name), Some(net)) =
        (record.product_number(), record.name(), record.price.net)
    else {
        return Err(BuildError::MissingRequiredFields);
    };

    let rate = resolve_rate(record.tax_rate, &settings.tax);
    let tax_id = refs.tax_id(rate).ok_or(BuildError::UnmappedTaxRate(rate))?;

    let visibilities = settings
        .shopware
        .sales_channel_id
        .as_ref()
        .map(|channel| VisibilityPayload {
            sales_channel_id: channel.clone(),
            visibility: settings
                .shopware
                .default_visibility
                .filter(|v| *v != 0)
                .unwrap_or(DEFAULT_VISIBILITY),
        })
        .into_iter()
        .collect();

    Ok(ProductPayload {
        id: product_id(product_number),
        product_number: product_number.to_string(),
        name: name.to_string(),
        description: record.description.clone(),
        ean: record.ean.clone(),
        manufacturer_id: record.manufacturer().map(|m| refs.manufacturer_id(m)),
        tax_id: tax_id.to_string(),
        price: vec![PricePayload {
            currency_id: currency_id.to_string(),
            net,
            gross: gross_from_percent(net, rate),
            linked: true,
        }],
        stock: 0,
        active: true,
        custom_fields: record.custom_fields.clone(),
        visibilities,
    })
}

#[cfg(test)]
#[path = "payload_test.rs"]
mod tests;
