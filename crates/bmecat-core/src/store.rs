//! Line-delimited JSON record store.
//!
//! One self-contained JSON object per line, non-ASCII escaped as `\uXXXX`
//! so the files stay plain ASCII. Files are re-readable any number of times.

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StoreError;

/// Buffered writer appending one JSON line per item.
pub struct NdjsonWriter {
    path: PathBuf,
    out: BufWriter<File>,
    written: usize,
}

impl NdjsonWriter {
    /// Create or truncate `path`, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file or its parents cannot be created.
    pub fn create(path: &Path) -> Result<Self, StoreError> {
        Self::open(path, OpenOptions::new().write(true).create(true).truncate(true))
    }

    /// Open `path` for appending, creating it (and its parents) if missing.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file or its parents cannot be opened.
    pub fn append(path: &Path) -> Result<Self, StoreError> {
        Self::open(path, OpenOptions::new().append(true).create(true))
    }

    fn open(path: &Path, options: &OpenOptions) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }
        let file = options.open(path).map_err(|e| io_error(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            out: BufWriter::new(file),
            written: 0,
        })
    }

    /// Serialize `item` as a single line.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Json`] if the item cannot be serialized, or
    /// [`StoreError::Io`] on write failure.
    pub fn write<T: Serialize + ?Sized>(&mut self, item: &T) -> Result<(), StoreError> {
        let mut ser = serde_json::Serializer::with_formatter(&mut self.out, AsciiFormatter);
        item.serialize(&mut ser).map_err(|e| StoreError::Json {
            path: self.path.display().to_string(),
            line: self.written + 1,
            source: e,
        })?;
        self.out
            .write_all(b"\n")
            .map_err(|e| io_error(&self.path, e))?;
        self.written += 1;
        Ok(())
    }

    /// Flush buffered lines and return how many were written by this writer.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the flush fails.
    pub fn finish(mut self) -> Result<usize, StoreError> {
        self.out.flush().map_err(|e| io_error(&self.path, e))?;
        Ok(self.written)
    }
}

/// Write every item to `path`, replacing any previous content.
///
/// # Errors
///
/// Propagates any [`StoreError`] from creating, writing or flushing the file.
pub fn write_ndjson<T, I>(path: &Path, items: I) -> Result<usize, StoreError>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let mut writer = NdjsonWriter::create(path)?;
    for item in items {
        writer.write(&item)?;
    }
    writer.finish()
}

/// Append a single item to `path`.
///
/// # Errors
///
/// Propagates any [`StoreError`] from opening, writing or flushing the file.
pub fn append_ndjson<T: Serialize + ?Sized>(path: &Path, item: &T) -> Result<(), StoreError> {
    let mut writer = NdjsonWriter::append(path)?;
    writer.write(item)?;
    writer.finish().map(|_| ())
}

/// Open `path` for lazy, line-by-line deserialization.
///
/// # Errors
///
/// Returns [`StoreError::Io`] if the file cannot be opened.
pub fn read_ndjson<T: DeserializeOwned>(path: &Path) -> Result<NdjsonReader<T>, StoreError> {
    let file = File::open(path).map_err(|e| io_error(path, e))?;
    Ok(NdjsonReader {
        path: path.to_path_buf(),
        input: BufReader::new(file),
        line: 0,
        buf: String::new(),
        _marker: PhantomData,
    })
}

/// Iterator over the records of a store file. Blank lines are skipped.
pub struct NdjsonReader<T> {
    path: PathBuf,
    input: BufReader<File>,
    line: usize,
    buf: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> NdjsonReader<T> {
    /// One-based number of the line most recently read, counting blanks.
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<T: DeserializeOwned> Iterator for NdjsonReader<T> {
    type Item = Result<T, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.input.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(io_error(&self.path, e))),
            }
            self.line += 1;

            let trimmed = self.buf.trim();
            if trimmed.is_empty() {
                continue;
            }
            return Some(serde_json::from_str(trimmed).map_err(|e| StoreError::Json {
                path: self.path.display().to_string(),
                line: self.line,
                source: e,
            }));
        }
    }
}

fn io_error(path: &Path, source: io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Compact formatter that escapes every non-ASCII character as one or two
/// UTF-16 `\uXXXX` units.
struct AsciiFormatter;

impl serde_json::ser::Formatter for AsciiFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if fragment.is_ascii() {
            return writer.write_all(fragment.as_bytes());
        }

        let mut units = [0u16; 2];
        for ch in fragment.chars() {
            if ch.is_ascii() {
                let mut byte = [0u8; 1];
                writer.write_all(ch.encode_utf8(&mut byte).as_bytes())?;
            } else {
                for unit in ch.encode_utf16(&mut units) {
                    write!(writer, "\\u{unit:04x}")?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
