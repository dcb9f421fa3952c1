//! HTTP client for the Shopware Admin API.
//!
//! Authenticates once per client (static token or client-credentials grant)
//! and exposes the handful of endpoints the importer needs: bulk sync and
//! searches for currencies, tax rates and manufacturers.

use std::collections::HashMap;
use std::time::Duration;

use bmecat_core::ShopwareConfig;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::error::ShopwareError;
use crate::types::{
    EntityRef, SearchRequest, SearchResponse, SyncOperation, TaxRate, TokenResponse,
};

/// Client for one Shopware instance, holding a bearer token.
pub struct ShopwareClient {
    client: Client,
    base_url: Url,
    token: String,
}

impl ShopwareClient {
    /// Builds the HTTP client and acquires a token.
    ///
    /// A configured `token` is used as-is. Otherwise `client_id` and
    /// `client_secret` are exchanged at `/api/oauth/token`. The token is not
    /// renewed for the lifetime of the client.
    ///
    /// # Errors
    ///
    /// - [`ShopwareError::MissingCredentials`] if neither a token nor both
    ///   client credentials are configured.
    /// - [`ShopwareError::InvalidBaseUrl`] if `base_url` does not parse.
    /// - [`ShopwareError::Http`] / [`ShopwareError::UnexpectedStatus`] if the
    ///   token exchange fails.
    pub async fn connect(config: &ShopwareConfig) -> Result<Self, ShopwareError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("bmecat-sync/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let normalised = format!("{}/", config.base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| ShopwareError::InvalidBaseUrl {
            base_url: config.base_url.clone(),
            reason: e.to_string(),
        })?;

        let token = match &config.token {
            Some(token) => token.clone(),
            None => {
                let (Some(client_id), Some(client_secret)) =
                    (&config.client_id, &config.client_secret)
                else {
                    return Err(ShopwareError::MissingCredentials);
                };
                fetch_token(&client, &base_url, client_id, client_secret).await?
            }
        };

        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    /// Upserts `payload` as entities of type `entity` in a single sync call.
    ///
    /// An empty payload is a no-op and sends nothing.
    ///
    /// # Errors
    ///
    /// - [`ShopwareError::UnexpectedStatus`] for an HTTP status >= 400.
    /// - [`ShopwareError::SyncRejected`] when the response carries a
    ///   non-empty `errors` member.
    /// - [`ShopwareError::Http`] on transport failure or timeout.
    pub async fn sync_upsert<T>(&self, entity: &str, payload: &[T]) -> Result<(), ShopwareError>
    where
        T: Serialize + Sync,
    {
        if payload.is_empty() {
            return Ok(());
        }

        let suffix = Uuid::new_v4().simple().to_string();
        let key = format!("write-{entity}-{}", &suffix[..8]);
        let mut body = HashMap::with_capacity(1);
        body.insert(
            key,
            SyncOperation {
                entity,
                action: "upsert",
                payload,
            },
        );

        let response: serde_json::Value = self.post_json("api/_action/sync", &body).await?;
        if let Some(errors) = response.get("errors").filter(|e| !is_empty_json(e)) {
            return Err(ShopwareError::SyncRejected {
                entity: entity.to_string(),
                errors: errors.clone(),
            });
        }

        tracing::debug!(entity, count = payload.len(), "sync upsert accepted");
        Ok(())
    }

    /// Looks up a currency id by ISO 4217 code. `None` if the shop does not
    /// know the code.
    ///
    /// # Errors
    ///
    /// Returns [`ShopwareError::Http`], [`ShopwareError::UnexpectedStatus`]
    /// or [`ShopwareError::Deserialize`] if the search fails.
    pub async fn currency_id(&self, iso_code: &str) -> Result<Option<String>, ShopwareError> {
        let found: SearchResponse<EntityRef> = self
            .post_json(
                "api/search/currency",
                &SearchRequest::equals("isoCode", iso_code, 1),
            )
            .await?;
        Ok(found.data.into_iter().next().map(|entity| entity.id))
    }

    /// Lists up to `limit` tax entities.
    ///
    /// # Errors
    ///
    /// Returns [`ShopwareError::Http`], [`ShopwareError::UnexpectedStatus`]
    /// or [`ShopwareError::Deserialize`] if the search fails.
    pub async fn tax_rates(&self, limit: u32) -> Result<Vec<TaxRate>, ShopwareError> {
        let found: SearchResponse<TaxRate> = self
            .post_json("api/search/tax", &SearchRequest::all(limit))
            .await?;
        Ok(found.data)
    }

    /// Looks up an existing manufacturer id by exact name.
    ///
    /// # Errors
    ///
    /// Returns [`ShopwareError::Http`], [`ShopwareError::UnexpectedStatus`]
    /// or [`ShopwareError::Deserialize`] if the search fails.
    pub async fn manufacturer_id(&self, name: &str) -> Result<Option<String>, ShopwareError> {
        let found: SearchResponse<EntityRef> = self
            .post_json(
                "api/search/product-manufacturer",
                &SearchRequest::equals("name", name, 1),
            )
            .await?;
        Ok(found.data.into_iter().next().map(|entity| entity.id))
    }

    fn endpoint(&self, path: &str) -> Result<Url, ShopwareError> {
        self.base_url
            .join(path)
            .map_err(|e| ShopwareError::InvalidBaseUrl {
                base_url: self.base_url.to_string(),
                reason: e.to_string(),
            })
    }

    /// POSTs a JSON body with the bearer token and parses the JSON response.
    /// An empty response body parses as `{}`.
    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ShopwareError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        let response = self
            .client
            .post(url.clone())
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if status.is_client_error() || status.is_server_error() {
            return Err(ShopwareError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
                body: text,
            });
        }

        parse_body(&text, url.as_str())
    }
}

async fn fetch_token(
    client: &Client,
    base_url: &Url,
    client_id: &str,
    client_secret: &str,
) -> Result<String, ShopwareError> {
    let url = base_url
        .join("api/oauth/token")
        .map_err(|e| ShopwareError::InvalidBaseUrl {
            base_url: base_url.to_string(),
            reason: e.to_string(),
        })?;
    let response = client
        .post(url.clone())
        .form(&[
            ("grant_type", "client_credentials"),
            ("client_id", client_id),
            ("client_secret", client_secret),
        ])
        .send()
        .await?;

    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
        return Err(ShopwareError::UnexpectedStatus {
            status: status.as_u16(),
            url: url.to_string(),
            body: text,
        });
    }

    let token: TokenResponse = parse_body(&text, url.as_str())?;
    tracing::info!(client_id, "obtained Shopware access token");
    Ok(token.access_token)
}

fn parse_body<T: DeserializeOwned>(text: &str, context: &str) -> Result<T, ShopwareError> {
    let text = if text.trim().is_empty() { "{}" } else { text };
    serde_json::from_str(text).map_err(|e| ShopwareError::Deserialize {
        context: context.to_string(),
        source: e,
    })
}

fn is_empty_json(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::Bool(b) => !b,
        serde_json::Value::Array(items) => items.is_empty(),
        serde_json::Value::Object(map) => map.is_empty(),
        serde_json::Value::String(s) => s.is_empty(),
        serde_json::Value::Number(_) => false,
    }
}
