//! Staging of the source catalog into the working directory.

use std::path::{Path, PathBuf};

use async_zip::tokio::read::fs::ZipFileReader;
use tokio_util::compat::FuturesAsyncReadCompatExt;

use crate::error::ExtractError;

/// File name of the staged catalog inside the working directory.
pub const STAGED_FILE_NAME: &str = "input.xml";

/// Copy `input` into `workdir/input.xml`.
///
/// A `.zip` input is unpacked instead: the first member whose name ends in
/// `.xml` (case-insensitive, archive order) is streamed to the target.
///
/// # Errors
///
/// Returns [`ExtractError::NoXmlMember`] for an archive without an XML
/// member, [`ExtractError::Zip`] for an unreadable archive, or
/// [`ExtractError::Io`] on filesystem failures.
pub async fn stage_input(input: &Path, workdir: &Path) -> Result<PathBuf, ExtractError> {
    tokio::fs::create_dir_all(workdir)
        .await
        .map_err(|e| io_error(workdir, e))?;
    let target = workdir.join(STAGED_FILE_NAME);

    if is_zip(input) {
        unzip_first_xml(input, &target).await?;
    } else if !same_file(input, &target).await {
        tokio::fs::copy(input, &target)
            .await
            .map_err(|e| io_error(input, e))?;
    }

    tracing::info!(
        input = %input.display(),
        staged = %target.display(),
        "staged catalog input"
    );
    Ok(target)
}

async fn unzip_first_xml(archive: &Path, target: &Path) -> Result<(), ExtractError> {
    let zip = ZipFileReader::new(archive).await?;
    let (index, member) = zip
        .file()
        .entries()
        .iter()
        .enumerate()
        .find_map(|(idx, entry)| {
            let name = entry.filename().as_str().ok()?;
            name.to_ascii_lowercase()
                .ends_with(".xml")
                .then(|| (idx, name.to_string()))
        })
        .ok_or_else(|| ExtractError::NoXmlMember {
            path: archive.display().to_string(),
        })?;

    tracing::debug!(archive = %archive.display(), member = %member, "extracting XML member");

    let mut reader = Box::pin(zip.reader_without_entry(index).await?.compat());
    let mut out = tokio::fs::File::create(target)
        .await
        .map_err(|e| io_error(target, e))?;
    tokio::io::copy(&mut reader, &mut out)
        .await
        .map_err(|e| io_error(target, e))?;
    Ok(())
}

fn is_zip(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"))
}

async fn same_file(a: &Path, b: &Path) -> bool {
    match (tokio::fs::canonicalize(a).await, tokio::fs::canonicalize(b).await) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn io_error(path: &Path, source: std::io::Error) -> ExtractError {
    ExtractError::Io {
        path: path.display().to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zip_detection_is_case_insensitive() {
        assert!(is_zip(Path::new("catalog.ZIP")));
        assert!(is_zip(Path::new("/data/catalog.zip")));
        assert!(!is_zip(Path::new("catalog.xml")));
        assert!(!is_zip(Path::new("zip")));
    }
}
