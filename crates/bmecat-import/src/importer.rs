//! End-to-end import of a record store into Shopware.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use bmecat_core::{append_ndjson, read_ndjson, NdjsonReader, ProductRecord, Settings, StoreError};
use bmecat_shopware::ShopwareClient;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::backend::{ReferenceSource, SyncTarget};
use crate::error::ImportError;
use crate::payload::{build_product_payload, BuildError, ProductPayload, PRODUCT_ENTITY};
use crate::resolver::ReferenceResolver;
use crate::uploader::{BatchUploader, FlushReport};

/// Side file collecting rejected records, next to the record store.
pub const ERROR_LOG_NAME: &str = "errors.ndjson";

/// Side file collecting media references for a later transfer step.
pub const MEDIA_QUEUE_NAME: &str = "media_queue.ndjson";

pub const MISSING_REQUIRED_FIELDS: &str = "missing_required_fields";

const PROGRESS_EVERY: usize = 100;

/// Counters for one import run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportStats {
    pub processed: usize,
    pub uploaded: usize,
    pub errors: usize,
}

impl fmt::Display for ImportStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Processed={} uploaded={} errors={}",
            self.processed, self.uploaded, self.errors
        )
    }
}

#[derive(Serialize)]
struct ErrorEntry<'a, T> {
    item: &'a T,
    reason: &'a str,
}

#[derive(Serialize)]
struct MediaEntry<'a> {
    #[serde(rename = "productNumber")]
    product_number: Option<&'a str>,
    media: &'a [String],
}

struct SideFiles {
    errors: PathBuf,
    media: PathBuf,
}

impl SideFiles {
    fn beside(ndjson_path: &Path) -> Self {
        let dir = ndjson_path.parent().unwrap_or_else(|| Path::new("."));
        Self {
            errors: dir.join(ERROR_LOG_NAME),
            media: dir.join(MEDIA_QUEUE_NAME),
        }
    }
}

/// Connect to the configured shop and import `ndjson_path`.
///
/// # Errors
///
/// Returns [`ImportError::Shopware`] if the client cannot authenticate, plus
/// everything [`import_products`] returns.
pub async fn run_import(
    ndjson_path: &Path,
    settings: &Settings,
    batch_size: usize,
) -> Result<ImportStats, ImportError> {
    let client = ShopwareClient::connect(&settings.shopware).await?;
    import_products(ndjson_path, settings, batch_size, &client).await
}

/// Import every record in `ndjson_path` through `backend`.
///
/// Shared references are resolved first (currency, tax table, all
/// manufacturers), then records are streamed, built into payloads and
/// uploaded in batches of `batch_size`. Records that cannot be built or are
/// refused by the shop are counted and appended to `errors.ndjson` next to
/// the store; the run continues.
///
/// # Errors
///
/// Aborts with [`ImportError::UnknownCurrency`] or
/// [`ImportError::UnmappedTaxRate`] when a shared reference is missing,
/// [`ImportError::Shopware`] when reference lookup or the manufacturer
/// upsert fails, and [`ImportError::Store`] on record store I/O or a
/// malformed line.
pub async fn import_products<B>(
    ndjson_path: &Path,
    settings: &Settings,
    batch_size: usize,
    backend: &B,
) -> Result<ImportStats, ImportError>
where
    B: ReferenceSource + SyncTarget + ?Sized,
{
    let side = SideFiles::beside(ndjson_path);
    let mut resolver = ReferenceResolver::new();

    let currency_id = resolver
        .currency_id(backend, &settings.mapping.price_selector.currency)
        .await?;
    resolver.load_taxes(backend).await?;

    let manufacturers = collect_manufacturer_names(ndjson_path)?;
    resolver.upsert_manufacturers(backend, &manufacturers).await?;

    let mut stats = ImportStats::default();
    let mut uploader = BatchUploader::new(PRODUCT_ENTITY, batch_size);

    let mut lines = read_ndjson::<Value>(ndjson_path)?;
    while let Some(raw) = lines.next() {
        let raw = raw?;
        let record = decode_record(&raw, &lines)?;
        stats.processed += 1;

        match build_product_payload(&record, settings, &currency_id, &resolver) {
            Ok(payload) => {
                if !record.media.is_empty() {
                    append_ndjson(
                        &side.media,
                        &MediaEntry {
                            product_number: record.product_number(),
                            media: &record.media,
                        },
                    )?;
                }
                if uploader.push(payload) {
                    let report = uploader.flush(backend).await;
                    record_flush(report, &mut stats, &side)?;
                }
            }
            Err(BuildError::MissingRequiredFields) => {
                tracing::warn!(
                    product_number = record.product_number().unwrap_or(""),
                    "skipping record with missing required fields"
                );
                stats.errors += 1;
                append_ndjson(
                    &side.errors,
                    &ErrorEntry {
                        item: &raw,
                        reason: MISSING_REQUIRED_FIELDS,
                    },
                )?;
            }
            Err(BuildError::UnmappedTaxRate(rate)) => {
                return Err(ImportError::UnmappedTaxRate { rate });
            }
        }

        if stats.processed % PROGRESS_EVERY == 0 {
            tracing::info!(processed = stats.processed, "import progress");
        }
    }

    if !uploader.is_empty() {
        let report = uploader.flush(backend).await;
        record_flush(report, &mut stats, &side)?;
    }

    tracing::info!(
        processed = stats.processed,
        uploaded = stats.uploaded,
        errors = stats.errors,
        "import finished"
    );
    Ok(stats)
}

fn record_flush(
    report: FlushReport<ProductPayload>,
    stats: &mut ImportStats,
    side: &SideFiles,
) -> Result<(), ImportError> {
    stats.uploaded += report.uploaded;
    for (payload, reason) in &report.rejected {
        stats.errors += 1;
        append_ndjson(
            &side.errors,
            &ErrorEntry {
                item: payload,
                reason,
            },
        )?;
    }
    Ok(())
}

/// The stored line is kept alongside the record so error entries carry it
/// verbatim, including values the lenient record fields read as absent.
fn decode_record(raw: &Value, lines: &NdjsonReader<Value>) -> Result<ProductRecord, ImportError> {
    ProductRecord::deserialize(raw).map_err(|source| {
        ImportError::Store(StoreError::Json {
            path: lines.path().display().to_string(),
            line: lines.line(),
            source,
        })
    })
}

/// Full first pass over the store collecting distinct, non-blank
/// manufacturer names in sorted order.
fn collect_manufacturer_names(ndjson_path: &Path) -> Result<BTreeSet<String>, ImportError> {
    let mut names = BTreeSet::new();
    for record in read_ndjson::<ProductRecord>(ndjson_path)? {
        if let Some(name) = record?.manufacturer() {
            names.insert(name.to_string());
        }
    }
    Ok(names)
}

#[cfg(test)]
#[path = "importer_test.rs"]
mod tests;
