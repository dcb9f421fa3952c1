//! Pipeline settings loaded from a YAML file.
//!
//! `${VAR}` placeholders in any string value are replaced with the matching
//! environment variable (empty when unset) before the document is
//! deserialized, so credentials can stay out of the file itself.

use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_yaml::Value;

use crate::error::ConfigError;
use crate::tax::TaxOverrides;

static ENV_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Z0-9_]+)\}").expect("valid env placeholder regex"));

/// Fully resolved pipeline settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Free-form label for the catalog source, used in log output.
    #[serde(default = "default_source_name")]
    pub source_name: String,
    pub mapping: MappingConfig,
    pub shopware: ShopwareConfig,
    #[serde(default)]
    pub tax: TaxConfig,
}

/// Tag names used to pull scalar fields out of each catalog item.
///
/// All names are matched against the local (namespace-stripped) tag name.
#[derive(Debug, Clone, Deserialize)]
pub struct MappingConfig {
    pub product_number: String,
    pub name: String,
    pub description: String,
    pub ean: String,
    pub manufacturer: String,
    /// Local name of the per-item element, `ARTICLE` for BMEcat 1.2.
    #[serde(default = "default_item_tag")]
    pub item_tag: String,
    #[serde(default)]
    pub price_selector: PriceSelector,
}

/// Selects which `ARTICLE_PRICE` entry feeds the net price.
#[derive(Debug, Clone, Deserialize)]
pub struct PriceSelector {
    /// Value of the `price_type` attribute to match, e.g. `"net_list"`.
    #[serde(default = "default_price_type")]
    pub price_type: String,
    /// ISO 4217 code used when the price carries no currency, and the
    /// currency resolved against the shop during import.
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl Default for PriceSelector {
    fn default() -> Self {
        Self {
            price_type: default_price_type(),
            currency: default_currency(),
        }
    }
}

#[derive(Clone, Deserialize)]
pub struct ShopwareConfig {
    pub base_url: String,
    #[serde(default, deserialize_with = "non_empty")]
    pub client_id: Option<String>,
    #[serde(default, deserialize_with = "non_empty")]
    pub client_secret: Option<String>,
    /// Pre-issued bearer token; takes precedence over client credentials.
    #[serde(default, deserialize_with = "non_empty")]
    pub token: Option<String>,
    #[serde(default, deserialize_with = "non_empty")]
    pub sales_channel_id: Option<String>,
    #[serde(default)]
    pub default_visibility: Option<i32>,
    /// Overall timeout applied to every request against the shop.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl std::fmt::Debug for ShopwareConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopwareConfig")
            .field("base_url", &self.base_url)
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[redacted]"),
            )
            .field("token", &self.token.as_ref().map(|_| "[redacted]"))
            .field("sales_channel_id", &self.sales_channel_id)
            .field("default_visibility", &self.default_visibility)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaxConfig {
    /// Percentage applied to records that carry no parseable tax rate.
    #[serde(default = "default_tax_rate")]
    pub default_rate: Decimal,
    /// Explicit rate redirects, keyed by the raw or normalized rate.
    #[serde(default, rename = "mapping", deserialize_with = "deserialize_overrides")]
    pub overrides: TaxOverrides,
}

impl Default for TaxConfig {
    fn default() -> Self {
        Self {
            default_rate: default_tax_rate(),
            overrides: TaxOverrides::default(),
        }
    }
}

impl Settings {
    /// Load settings from a YAML file, expanding `${VAR}` placeholders from
    /// the process environment.
    ///
    /// Calls `dotenvy::dotenv().ok()` first so a local `.env` file can supply
    /// the placeholders.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Parse`] if it is not valid YAML for this shape, or
    /// [`ConfigError::Validation`] if a required value is blank.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let settings = Self::from_yaml_with(&content, |key| std::env::var(key).ok())?;
        tracing::debug!(
            path = %path.display(),
            source_name = %settings.source_name,
            "loaded settings"
        );
        Ok(settings)
    }

    /// Parse settings from YAML text using the provided env-var lookup.
    ///
    /// Decoupled from the real environment so tests can drive expansion with
    /// a plain map.
    ///
    /// # Errors
    ///
    /// Same as [`Settings::load`], minus the I/O case.
    pub fn from_yaml_with<F>(content: &str, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw: Value = serde_yaml::from_str(content)?;
        let expanded = expand_env(raw, &lookup);
        let settings: Settings = serde_yaml::from_value(expanded)?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.shopware.base_url.trim().is_empty() {
            return Err(ConfigError::Validation(
                "shopware.base_url must be non-empty".to_string(),
            ));
        }

        let tags = [
            ("mapping.product_number", &self.mapping.product_number),
            ("mapping.name", &self.mapping.name),
            ("mapping.description", &self.mapping.description),
            ("mapping.ean", &self.mapping.ean),
            ("mapping.manufacturer", &self.mapping.manufacturer),
            ("mapping.item_tag", &self.mapping.item_tag),
        ];
        for (field, tag) in tags {
            if tag.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "{field} must name an XML tag"
                )));
            }
        }

        Ok(())
    }
}

fn expand_env<F>(value: Value, lookup: &F) -> Value
where
    F: Fn(&str) -> Option<String>,
{
    match value {
        Value::String(s) => Value::String(
            ENV_PATTERN
                .replace_all(&s, |caps: &Captures<'_>| {
                    lookup(&caps[1]).unwrap_or_default()
                })
                .into_owned(),
        ),
        Value::Sequence(items) => {
            Value::Sequence(items.into_iter().map(|v| expand_env(v, lookup)).collect())
        }
        Value::Mapping(map) => Value::Mapping(
            map.into_iter()
                .map(|(k, v)| (k, expand_env(v, lookup)))
                .collect(),
        ),
        other => other,
    }
}

fn non_empty<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

fn deserialize_overrides<'de, D>(deserializer: D) -> Result<TaxOverrides, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let table = Option::<serde_yaml::Mapping>::deserialize(deserializer)?.unwrap_or_default();
    let mut entries = Vec::with_capacity(table.len());
    for (key, value) in &table {
        let key = scalar_text(key)
            .ok_or_else(|| D::Error::custom("tax.mapping keys must be strings or numbers"))?;
        let rate = scalar_text(value)
            .and_then(|s| s.parse::<Decimal>().ok())
            .ok_or_else(|| D::Error::custom(format!("tax.mapping value for '{key}' is not a number")))?;
        entries.push((key, rate));
    }
    Ok(TaxOverrides::new(entries))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_owned()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn default_source_name() -> String {
    "bmecat".to_string()
}

fn default_item_tag() -> String {
    "ARTICLE".to_string()
}

fn default_price_type() -> String {
    "net_list".to_string()
}

fn default_currency() -> String {
    "EUR".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_tax_rate() -> Decimal {
    Decimal::from(19)
}
