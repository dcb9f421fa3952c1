use thiserror::Error;

/// Errors returned by the Shopware Admin API client.
#[derive(Debug, Error)]
pub enum ShopwareError {
    /// Network, TLS or timeout failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Shopware auth requires a token or client credentials")]
    MissingCredentials,

    #[error("invalid Shopware base URL \"{base_url}\": {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },

    #[error("unexpected HTTP status {status} from {url}: {body}")]
    UnexpectedStatus {
        status: u16,
        url: String,
        body: String,
    },

    /// The sync endpoint answered successfully but reported per-item errors.
    #[error("sync of {entity} returned errors: {errors}")]
    SyncRejected {
        entity: String,
        errors: serde_json::Value,
    },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}
