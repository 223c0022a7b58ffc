//! Integration tests for `QueryParser` using wiremock HTTP mocks.

use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use wmdb_query::QueryParser;

fn test_parser(base_url: &str) -> QueryParser {
    QueryParser::new(Some("test-key".to_string()), base_url, "gpt-4o-mini", 30)
        .expect("parser construction should not fail")
}

fn completion_body(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [
            {
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }
        ]
    })
}

#[tokio::test]
async fn remote_parse_extracts_structured_filters() {
    let server = MockServer::start().await;

    let payload = r#"{"brand":"Rolex","model":"Submariner","reference":"116610LN","max_price":"12000","min_condition":"unworn","keywords":["ceramic"]}"#;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_string_contains("unworn rolex submariner"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(payload)))
        .mount(&server)
        .await;

    let parser = test_parser(&server.uri());
    let parsed = parser
        .parse_remote("unworn rolex submariner 116610LN under 12k ceramic")
        .await
        .expect("remote parse should succeed");

    assert_eq!(parsed.brand.as_deref(), Some("Rolex"));
    assert_eq!(parsed.model.as_deref(), Some("Submariner"));
    assert_eq!(parsed.reference.as_deref(), Some("116610LN"));
    assert_eq!(parsed.keywords, vec!["ceramic"]);
}

#[tokio::test]
async fn remote_parse_tolerates_fenced_json() {
    let server = MockServer::start().await;

    let fenced = "```json\n{\"brand\":\"Omega\",\"model\":\"Speedmaster\"}\n```";

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(fenced)))
        .mount(&server)
        .await;

    let parser = test_parser(&server.uri());
    let parsed = parser
        .parse_remote("omega speedmaster")
        .await
        .expect("fenced payload should still parse");

    assert_eq!(parsed.brand.as_deref(), Some("Omega"));
    assert_eq!(parsed.model.as_deref(), Some("Speedmaster"));
}

#[tokio::test]
async fn parse_falls_back_when_remote_errors() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let parser = test_parser(&server.uri());
    let parsed = parser.parse("rolex submariner 116610LN").await;

    // Fallback parser answers despite the 500.
    assert_eq!(parsed.brand.as_deref(), Some("Rolex"));
    assert_eq!(parsed.reference.as_deref(), Some("116610LN"));
}

#[tokio::test]
async fn parse_falls_back_when_model_emits_garbage() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion_body("Sorry, I cannot help with that.")),
        )
        .mount(&server)
        .await;

    let parser = test_parser(&server.uri());
    let parsed = parser.parse("omega seamaster under 5k").await;

    assert_eq!(parsed.brand.as_deref(), Some("Omega"));
    assert_eq!(parsed.model.as_deref(), Some("Seamaster"));
    assert_eq!(
        parsed.max_price,
        Some(rust_decimal::Decimal::new(5_000, 0))
    );
}
