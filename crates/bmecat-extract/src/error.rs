use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] async_zip::error::ZipError),

    #[error(transparent)]
    Store(#[from] bmecat_core::StoreError),

    #[error("no XML file found inside ZIP archive {path}")]
    NoXmlMember { path: String },
}
