//! The intermediate product record shared by extraction and import.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One catalog item after extraction.
///
/// Decimals are written as strings so the record store keeps the catalog's
/// exact scale. Reading is lenient: numbers, numeric strings, `null` and
/// garbage (read as absent) are all accepted for `price.net` and `tax_rate`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    #[serde(rename = "productNumber", default)]
    pub product_number: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub ean: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub price: PriceInfo,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub tax_rate: Option<Decimal>,
    #[serde(rename = "customFields", default)]
    pub custom_fields: CustomFields,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub media: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceInfo {
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub net: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<String>,
}

/// Free-form custom field data, passed through to the shop unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomFields {
    #[serde(default)]
    pub etim: Vec<FeatureEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureEntry {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl ProductRecord {
    /// Product number, treating blank as absent.
    #[must_use]
    pub fn product_number(&self) -> Option<&str> {
        non_blank(self.product_number.as_deref())
    }

    /// Name, treating blank as absent.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        non_blank(self.name.as_deref())
    }

    /// Manufacturer name, treating blank as absent.
    #[must_use]
    pub fn manufacturer(&self) -> Option<&str> {
        non_blank(self.manufacturer.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

/// Parse a decimal in plain (`"10.50"`) or scientific (`"1.05e1"`) notation.
#[must_use]
pub fn parse_decimal(text: &str) -> Option<Decimal> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    text.parse::<Decimal>()
        .ok()
        .or_else(|| Decimal::from_scientific(text).ok())
}

fn lenient_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => parse_decimal(&n.to_string()),
        Some(Value::String(s)) => parse_decimal(&s),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn serializes_with_wire_field_names() {
        let record = ProductRecord {
            product_number: Some("ABC123".to_string()),
            name: Some("Test Product".to_string()),
            price: PriceInfo {
                net: Some(d("10.00")),
                currency: Some("EUR".to_string()),
            },
            tax_rate: Some(d("0.19")),
            custom_fields: CustomFields {
                etim: vec![FeatureEntry {
                    name: Some("Color".to_string()),
                    value: Some("Red".to_string()),
                    unit: None,
                }],
                extra: Map::new(),
            },
            ..ProductRecord::default()
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["productNumber"], "ABC123");
        assert_eq!(value["price"]["net"], "10.00");
        assert_eq!(value["tax_rate"], "0.19");
        assert_eq!(value["customFields"]["etim"][0], json!({"name": "Color", "value": "Red"}));
        assert!(value["description"].is_null());
        assert!(value.get("media").is_none(), "empty media should be omitted");
    }

    #[test]
    fn reads_numeric_and_string_decimals() {
        let record: ProductRecord = serde_json::from_value(json!({
            "productNumber": "A",
            "name": "N",
            "price": {"net": 10.5, "currency": "EUR"},
            "tax_rate": "19"
        }))
        .unwrap();
        assert_eq!(record.price.net, Some(d("10.5")));
        assert_eq!(record.tax_rate, Some(d("19")));
    }

    #[test]
    fn garbage_decimals_read_as_absent() {
        let record: ProductRecord = serde_json::from_value(json!({
            "productNumber": "A",
            "price": {"net": "ten"},
            "tax_rate": [1, 2]
        }))
        .unwrap();
        assert_eq!(record.price.net, None);
        assert_eq!(record.tax_rate, None);
        assert_eq!(record.name, None);
    }

    #[test]
    fn unknown_custom_fields_are_preserved() {
        let input = json!({
            "productNumber": "A",
            "name": "N",
            "customFields": {"etim": [], "supplier_class": "EC000001"}
        });
        let record: ProductRecord = serde_json::from_value(input).unwrap();
        assert_eq!(record.custom_fields.extra["supplier_class"], "EC000001");

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["customFields"]["supplier_class"], "EC000001");
    }

    #[test]
    fn blank_required_fields_count_as_missing() {
        let record = ProductRecord {
            product_number: Some("  ".to_string()),
            name: Some("N".to_string()),
            ..ProductRecord::default()
        };
        assert_eq!(record.product_number(), None);
        assert_eq!(record.name(), Some("N"));
    }

    #[test]
    fn parse_decimal_accepts_scientific_notation() {
        assert_eq!(parse_decimal("1.9e1"), Some(d("19")));
        assert_eq!(parse_decimal(" 7.5 "), Some(d("7.5")));
        assert_eq!(parse_decimal(""), None);
        assert_eq!(parse_decimal("n/a"), None);
    }
}
