use std::path::{Path, PathBuf};

use bmecat_core::Settings;
use bmecat_import::ImportStats;

pub(crate) const PRODUCTS_FILE_NAME: &str = "products.ndjson";

pub(crate) fn staged_xml(workdir: &Path) -> PathBuf {
    workdir.join(bmecat_extract::STAGED_FILE_NAME)
}

pub(crate) fn products_store(workdir: &Path) -> PathBuf {
    workdir.join(PRODUCTS_FILE_NAME)
}

pub(crate) async fn extract(input: &Path, workdir: &Path) -> anyhow::Result<PathBuf> {
    Ok(bmecat_extract::stage_input(input, workdir).await?)
}

/// Runs the blocking XML pass off the async executor.
pub(crate) async fn parse(
    settings: &Settings,
    input: PathBuf,
    output: PathBuf,
) -> anyhow::Result<PathBuf> {
    let mapping = settings.mapping.clone();
    let written = tokio::task::spawn_blocking(move || {
        bmecat_extract::extract_to_ndjson(&input, &mapping, &output).map(|_| output)
    })
    .await??;
    Ok(written)
}

pub(crate) async fn import(
    settings: &Settings,
    ndjson: &Path,
    batch_size: usize,
) -> anyhow::Result<ImportStats> {
    let stats = bmecat_import::run_import(ndjson, settings, batch_size).await?;
    Ok(stats)
}
