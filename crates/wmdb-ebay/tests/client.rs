//! Integration tests for `EbayClient` using wiremock HTTP mocks.

use wiremock::matchers::{body_string_contains, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use wmdb_ebay::{EbayClient, EbayError};

fn test_client(base_url: &str) -> EbayClient {
    EbayClient::with_base_urls("test-id", "test-secret", 30, base_url, base_url)
        .expect("client construction should not fail")
}

fn token_body() -> serde_json::Value {
    serde_json::json!({
        "access_token": "v^1.1#test-token",
        "expires_in": 7200,
        "token_type": "Application Access Token"
    })
}

async fn mount_token_endpoint(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/identity/v1/oauth2/token"))
        .and(header_exists("authorization"))
        .and(body_string_contains("grant_type=client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn search_items_returns_parsed_page() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    let body = serde_json::json!({
        "total": 2,
        "itemSummaries": [
            {
                "itemId": "v1|111|0",
                "title": "Rolex Submariner Date 116610LN Black Ceramic",
                "price": { "value": "10500.00", "currency": "USD" },
                "condition": "Pre-owned",
                "itemWebUrl": "https://www.ebay.com/itm/111",
                "image": { "imageUrl": "https://i.ebayimg.com/images/g/111/s-l1600.jpg" },
                "seller": { "username": "watch-dealer" },
                "itemLocation": { "country": "US" },
                "itemCreationDate": "2025-06-01T12:00:00.000Z"
            },
            {
                "itemId": "v1|222|0",
                "title": "Omega Speedmaster Professional Moonwatch",
                "price": { "value": "5200.00", "currency": "USD" },
                "condition": "Excellent",
                "itemWebUrl": "https://www.ebay.com/itm/222"
            }
        ]
    });

    Mock::given(method("GET"))
        .and(path("/buy/browse/v1/item_summary/search"))
        .and(query_param("q", "rolex submariner"))
        .and(query_param("limit", "50"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let page = client
        .search_items("rolex submariner", 50, 0)
        .await
        .expect("should parse search page");

    assert_eq!(page.total, Some(2));
    assert_eq!(page.item_summaries.len(), 2);
    assert_eq!(page.item_summaries[0].item_id, "v1|111|0");
    assert_eq!(
        page.item_summaries[0]
            .price
            .as_ref()
            .map(|p| p.value.as_str()),
        Some("10500.00")
    );
    assert!(page.item_summaries[1].image.is_none());
}

#[tokio::test]
async fn token_is_fetched_once_and_reused() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/identity/v1/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body()))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/buy/browse/v1/item_summary/search"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "total": 0 })),
        )
        .expect(2)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    client.search_items("rolex", 10, 0).await.expect("first search");
    client.search_items("omega", 10, 0).await.expect("second search");
    // Mock expectations assert the token endpoint was hit exactly once.
}

#[tokio::test]
async fn transient_server_error_is_retried() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    // First search attempt hits a 500; the retry lands on the healthy mock.
    Mock::given(method("GET"))
        .and(path("/buy/browse/v1/item_summary/search"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/buy/browse/v1/item_summary/search"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "total": 0 })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri()).with_retry_policy(2, 0);
    let page = client
        .search_items("rolex", 10, 0)
        .await
        .expect("retry should recover from a transient 500");
    assert_eq!(page.total, Some(0));
}

#[tokio::test]
async fn rate_limited_response_surfaces_retry_after() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("GET"))
        .and(path("/buy/browse/v1/item_summary/search"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
        .mount(&server)
        .await;

    // Retries disabled so the rate-limit error itself is observable.
    let client = test_client(&server.uri()).with_retry_policy(0, 0);
    let result = client.search_items("rolex", 10, 0).await;

    assert!(
        matches!(
            result,
            Err(EbayError::RateLimited {
                retry_after_secs: Some(7)
            })
        ),
        "expected RateLimited with retry_after 7, got: {result:?}"
    );
}

#[tokio::test]
async fn auth_failure_surfaces_as_auth_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/identity/v1/oauth2/token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "error": "invalid_client",
            "error_description": "client authentication failed"
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let result = client.search_items("rolex", 10, 0).await;

    assert!(matches!(result, Err(EbayError::Auth(_))));
    let msg = result.unwrap_err().to_string();
    assert!(
        msg.contains("invalid_client"),
        "expected error message to carry the auth body, got: {msg}"
    );
}

#[tokio::test]
async fn unexpected_status_is_reported_with_url() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("GET"))
        .and(path("/buy/browse/v1/item_summary/search"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let result = client.search_items("rolex", 10, 0).await;

    assert!(
        matches!(result, Err(EbayError::UnexpectedStatus { status: 400, .. })),
        "expected UnexpectedStatus(400), got: {result:?}"
    );
}
