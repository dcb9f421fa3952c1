//! Streaming BMEcat extraction into the line-delimited record store.

pub mod article;
pub mod element;
pub mod error;
pub mod input;
pub mod reader;

use std::path::Path;

use bmecat_core::{MappingConfig, NdjsonWriter, ProductRecord};

pub use article::parse_article;
pub use element::Element;
pub use error::ExtractError;
pub use input::{stage_input, STAGED_FILE_NAME};
pub use reader::ItemReader;

/// Lazily extract records from the catalog at `path`.
///
/// The sequence is single-pass; items missing required fields are dropped
/// (with a warning) and never appear in it.
///
/// # Errors
///
/// Returns [`ExtractError::Io`] if the file cannot be opened. Items yield
/// an error only for I/O failures while reading.
pub fn iter_products<'a>(
    path: &Path,
    mapping: &'a MappingConfig,
) -> Result<impl Iterator<Item = Result<ProductRecord, ExtractError>> + 'a, ExtractError> {
    let items = ItemReader::open(path, &mapping.item_tag)?;
    Ok(items.filter_map(move |item| match item {
        Ok(element) => parse_article(&element, mapping).map(Ok),
        Err(e) => Some(Err(e)),
    }))
}

/// Extract every record from `xml_path` into a fresh store file at
/// `output`, returning how many were written.
///
/// # Errors
///
/// Propagates extraction I/O errors and record store failures.
pub fn extract_to_ndjson(
    xml_path: &Path,
    mapping: &MappingConfig,
    output: &Path,
) -> Result<usize, ExtractError> {
    let mut writer = NdjsonWriter::create(output)?;
    for record in iter_products(xml_path, mapping)? {
        writer.write(&record?)?;
    }
    let written = writer.finish()?;
    tracing::info!(
        input = %xml_path.display(),
        output = %output.display(),
        records = written,
        "extracted catalog records"
    );
    Ok(written)
}
