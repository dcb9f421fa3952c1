pub mod config;
pub mod error;
pub mod ids;
pub mod record;
pub mod store;
pub mod tax;

pub use config::{MappingConfig, PriceSelector, Settings, ShopwareConfig, TaxConfig};
pub use error::{ConfigError, StoreError};
pub use ids::{manufacturer_id, product_id, stable_uuid};
pub use record::{parse_decimal, CustomFields, FeatureEntry, PriceInfo, ProductRecord};
pub use store::{append_ndjson, read_ndjson, write_ndjson, NdjsonReader, NdjsonWriter};
pub use tax::{calculate_gross, gross_from_percent, normalize_rate, rate_key, resolve_rate, TaxOverrides};
