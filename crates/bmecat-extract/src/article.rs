//! Field extraction from a single BMEcat item.

use bmecat_core::{parse_decimal, CustomFields, FeatureEntry, MappingConfig, PriceInfo, ProductRecord};
use rust_decimal::Decimal;

use crate::element::Element;

const PRICE_TAG: &str = "ARTICLE_PRICE";
const TAX_TAGS: [&str; 3] = ["TAX", "TAX_RATE", "TAX_RATE_PERCENT"];
const FEATURE_CONTAINERS: [&str; 2] = ["ARTICLE_FEATURES", "PRODUCT_FEATURES"];

/// Build a record from one item element.
///
/// Returns `None` (after logging a warning) when the product number or name
/// is missing; every other field is best-effort.
#[must_use]
pub fn parse_article(item: &Element, mapping: &MappingConfig) -> Option<ProductRecord> {
    let (product_number, name) = match (
        item.find_text(&mapping.product_number),
        item.find_text(&mapping.name),
    ) {
        (Some(product_number), Some(name)) => (product_number, name),
        (product_number, _) => {
            tracing::warn!(
                product_number = product_number.as_deref().unwrap_or(""),
                "skipping item without product number or name"
            );
            return None;
        }
    };

    let price = find_price(item, &mapping.price_selector.price_type);
    let currency = price
        .currency
        .or_else(|| Some(mapping.price_selector.currency.clone()));

    Some(ProductRecord {
        product_number: Some(product_number),
        name: Some(name),
        description: item.find_text(&mapping.description),
        ean: item.find_text(&mapping.ean),
        manufacturer: item.find_text(&mapping.manufacturer),
        price: PriceInfo {
            net: price.net,
            currency,
        },
        tax_rate: find_tax(item),
        custom_fields: CustomFields {
            etim: find_features(item),
            ..CustomFields::default()
        },
        media: find_media(item),
    })
}

/// First price entry whose `price_type` matches; an unparsable amount
/// leaves the net price absent but still selects that entry.
fn find_price(item: &Element, price_type: &str) -> PriceInfo {
    item.find_all(PRICE_TAG)
        .find(|price| price.attribute("price_type") == Some(price_type))
        .map(|price| PriceInfo {
            net: price
                .find_text("PRICE_AMOUNT")
                .and_then(|amount| parse_decimal(&amount)),
            currency: price.find_text("PRICE_CURRENCY"),
        })
        .unwrap_or_default()
}

/// The first tax tag present decides the outcome; an unparsable value does
/// not fall through to later candidates.
fn find_tax(item: &Element) -> Option<Decimal> {
    TAX_TAGS
        .iter()
        .find_map(|tag| item.find_text(tag))
        .and_then(|value| parse_decimal(&value))
}

fn find_features(item: &Element) -> Vec<FeatureEntry> {
    let mut features = Vec::new();
    for container_tag in FEATURE_CONTAINERS {
        for container in item.find_all(container_tag) {
            for feature in container.children_named("FEATURE") {
                let name = first_text(feature, "FNAME", "NAME");
                let value = first_text(feature, "FVALUE", "VALUE");
                if name.is_none() && value.is_none() {
                    continue;
                }
                features.push(FeatureEntry {
                    name,
                    value,
                    unit: first_text(feature, "FUNIT", "UNIT"),
                });
            }
        }
    }
    features
}

fn find_media(item: &Element) -> Vec<String> {
    item.find_all("MIME_INFO")
        .flat_map(|info| info.children_named("MIME"))
        .filter_map(|mime| mime.find_text("MIME_SOURCE"))
        .collect()
}

fn first_text(el: &Element, primary: &str, fallback: &str) -> Option<String> {
    el.find_text(primary).or_else(|| el.find_text(fallback))
}

#[cfg(test)]
#[path = "article_test.rs"]
mod tests;
