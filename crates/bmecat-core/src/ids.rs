//! Deterministic entity identifiers.
//!
//! Ids are UUIDv5 in the URL namespace over `"{kind}:{key}"`, so re-importing
//! the same catalog upserts the same entities instead of creating duplicates.

use uuid::Uuid;

#[must_use]
pub fn stable_uuid(kind: &str, key: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, format!("{kind}:{key}").as_bytes())
}

#[must_use]
pub fn product_id(product_number: &str) -> Uuid {
    stable_uuid("product", product_number)
}

#[must_use]
pub fn manufacturer_id(name: &str) -> Uuid {
    stable_uuid("manufacturer", name)
}
