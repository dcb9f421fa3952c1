//! Integration tests for `ShopwareClient` using wiremock HTTP mocks.

use bmecat_core::ShopwareConfig;
use bmecat_shopware::{ShopwareClient, ShopwareError};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(base_url: &str) -> ShopwareConfig {
    ShopwareConfig {
        base_url: base_url.to_string(),
        client_id: None,
        client_secret: None,
        token: Some("static-token".to_string()),
        sales_channel_id: None,
        default_visibility: None,
        timeout_secs: 5,
    }
}

async fn test_client(server: &MockServer) -> ShopwareClient {
    ShopwareClient::connect(&config(&server.uri()))
        .await
        .expect("client construction should not fail")
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

#[tokio::test]
async fn client_credentials_are_exchanged_for_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/oauth/token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("client_id=integration"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"access_token": "fresh-token"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/search/currency"))
        .and(header("authorization", "Bearer fresh-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [{"id": "cur-eur"}]})))
        .mount(&server)
        .await;

    let cfg = ShopwareConfig {
        token: None,
        client_id: Some("integration".to_string()),
        client_secret: Some("secret".to_string()),
        ..config(&server.uri())
    };
    let client = ShopwareClient::connect(&cfg).await.unwrap();
    let id = client.currency_id("EUR").await.unwrap();
    assert_eq!(id.as_deref(), Some("cur-eur"));
}

#[tokio::test]
async fn missing_credentials_fail_without_network() {
    let server = MockServer::start().await;
    let cfg = ShopwareConfig {
        token: None,
        client_id: Some("only-id".to_string()),
        ..config(&server.uri())
    };

    let result = ShopwareClient::connect(&cfg).await;
    assert!(matches!(result, Err(ShopwareError::MissingCredentials)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn rejected_token_exchange_is_unexpected_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/oauth/token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid_client"))
        .mount(&server)
        .await;

    let cfg = ShopwareConfig {
        token: None,
        client_id: Some("id".to_string()),
        client_secret: Some("wrong".to_string()),
        ..config(&server.uri())
    };
    match ShopwareClient::connect(&cfg).await {
        Err(ShopwareError::UnexpectedStatus { status, body, .. }) => {
            assert_eq!(status, 401);
            assert_eq!(body, "invalid_client");
        }
        Err(other) => panic!("expected UnexpectedStatus, got: {other:?}"),
        Ok(_) => panic!("expected UnexpectedStatus, got a client"),
    }
}

// ---------------------------------------------------------------------------
// Sync
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sync_upsert_posts_keyed_operation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/_action/sync"))
        .and(header("authorization", "Bearer static-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server).await;
    let payload = vec![json!({"id": "p1"}), json!({"id": "p2"})];
    client.sync_upsert("product", &payload).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: Value = requests[0].body_json().unwrap();
    let (key, operation) = body.as_object().unwrap().iter().next().unwrap();
    assert!(key.starts_with("write-product-"), "unexpected key {key}");
    assert_eq!(key.len(), "write-product-".len() + 8);
    assert_eq!(operation["entity"], "product");
    assert_eq!(operation["action"], "upsert");
    assert_eq!(operation["payload"], json!([{"id": "p1"}, {"id": "p2"}]));
}

#[tokio::test]
async fn empty_sync_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/_action/sync"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_client(&server).await;
    let payload: Vec<Value> = Vec::new();
    client.sync_upsert("product", &payload).await.unwrap();
}

#[tokio::test]
async fn sync_error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/_action/sync"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"errors": [{"detail": "bad"}]})))
        .mount(&server)
        .await;

    let client = test_client(&server).await;
    let result = client.sync_upsert("product", &[json!({"id": "p1"})]).await;
    assert!(
        matches!(result, Err(ShopwareError::UnexpectedStatus { status: 400, .. })),
        "expected 400 UnexpectedStatus, got: {result:?}"
    );
}

#[tokio::test]
async fn sync_errors_member_is_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/_action/sync"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"errors": [{"code": "CONTENT__INVALID"}]})),
        )
        .mount(&server)
        .await;

    let client = test_client(&server).await;
    match client.sync_upsert("product", &[json!({"id": "p1"})]).await {
        Err(ShopwareError::SyncRejected { entity, errors }) => {
            assert_eq!(entity, "product");
            assert_eq!(errors[0]["code"], "CONTENT__INVALID");
        }
        other => panic!("expected SyncRejected, got: {other:?}"),
    }
}

#[tokio::test]
async fn sync_with_empty_body_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/_action/sync"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let client = test_client(&server).await;
    client
        .sync_upsert("product_manufacturer", &[json!({"id": "m1", "name": "Acme"})])
        .await
        .unwrap();
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[tokio::test]
async fn currency_lookup_filters_by_iso_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/search/currency"))
        .and(body_partial_json(json!({
            "filter": [{"type": "equals", "field": "isoCode", "value": "CHF"}],
            "limit": 1
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server).await;
    assert_eq!(client.currency_id("CHF").await.unwrap(), None);
}

#[tokio::test]
async fn tax_rates_are_listed_with_limit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/search/tax"))
        .and(body_partial_json(json!({"limit": 500})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 2,
            "data": [
                {"id": "tax-19", "taxRate": 19.0, "name": "Standard rate"},
                {"id": "tax-7", "taxRate": 7, "name": "Reduced rate"}
            ]
        })))
        .mount(&server)
        .await;

    let client = test_client(&server).await;
    let rates = client.tax_rates(500).await.unwrap();
    assert_eq!(rates.len(), 2);
    assert_eq!(rates[0].id, "tax-19");
    assert_eq!(rates[0].tax_rate, Decimal::from(19));
    assert_eq!(rates[1].tax_rate, Decimal::from(7));
}

#[tokio::test]
async fn manufacturer_lookup_returns_first_match() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/search/product-manufacturer"))
        .and(body_partial_json(json!({
            "filter": [{"type": "equals", "field": "name", "value": "Acme"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [{"id": "man-1"}]})))
        .mount(&server)
        .await;

    let client = test_client(&server).await;
    assert_eq!(
        client.manufacturer_id("Acme").await.unwrap().as_deref(),
        Some("man-1")
    );
}

#[tokio::test]
async fn base_url_path_prefix_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/shop/api/search/tax"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = ShopwareClient::connect(&config(&format!("{}/shop/", server.uri())))
        .await
        .unwrap();
    assert!(client.tax_rates(500).await.unwrap().is_empty());
}
