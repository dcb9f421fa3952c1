//! Upload of a BMEcat record store into Shopware through the sync API.

pub mod backend;
pub mod error;
pub mod importer;
pub mod payload;
pub mod resolver;
pub mod uploader;

#[cfg(test)]
mod testing;

pub use backend::{ReferenceSource, SyncTarget};
pub use error::ImportError;
pub use importer::{
    import_products, run_import, ImportStats, ERROR_LOG_NAME, MEDIA_QUEUE_NAME,
    MISSING_REQUIRED_FIELDS,
};
pub use payload::{build_product_payload, BuildError, ProductPayload, PRODUCT_ENTITY};
pub use resolver::ReferenceResolver;
pub use uploader::{upsert_isolating, BatchOutcome, BatchUploader, Rejection, DEFAULT_BATCH_SIZE};
