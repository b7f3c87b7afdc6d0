use askviridium::{AskBackend, AskClient, AskRequest, ErrorKind};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_structured_request_posts_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/ask-viridium-ai"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "material_name": "Steel",
            "manufacturer_name": "AcmeCo",
            "work_content": "cutting"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": "Use carbide tooling."})))
        .expect(1)
        .mount(&server)
        .await;

    let client = AskClient::new(&server.uri());
    let response = client
        .ask(&AskRequest::structured("Steel", "AcmeCo", "cutting"))
        .await
        .unwrap();

    assert_eq!(response.result, "Use carbide tooling.");
}

#[tokio::test]
async fn test_free_text_request_posts_message_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/ask-viridium-ai"))
        .and(body_json(json!({"message": "Hello"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": 200,
            "message": "Success",
            "result": "Hi there"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = AskClient::new(&server.uri());
    let response = client.ask(&AskRequest::free_text("Hello")).await.unwrap();

    assert_eq!(response.result, "Hi there");
    assert_eq!(response.message, Some(json!("Success")));
}

#[tokio::test]
async fn test_unexpected_envelope_fields_do_not_fail_the_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/ask-viridium-ai"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": "R",
            "status": "success",
            "message": {"detail": "ok"},
            "identifier": 7
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = AskClient::new(&server.uri());
    let response = client.ask(&AskRequest::free_text("Hello")).await.unwrap();

    assert_eq!(response.result, "R");
}

#[tokio::test]
async fn test_server_error_is_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/ask-viridium-ai"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let client = AskClient::new(&server.uri());
    let err = client.ask(&AskRequest::free_text("Hello")).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Http);
    assert!(err.to_string().contains("boom"));
}

#[tokio::test]
async fn test_malformed_body_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/ask-viridium-ai"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Hello World!"))
        .mount(&server)
        .await;

    let client = AskClient::new(&server.uri());
    let err = client.ask(&AskRequest::free_text("Hello")).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Parse);
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    // Nothing listens on port 1.
    let client = AskClient::new("http://127.0.0.1:1");
    let err = client.ask(&AskRequest::free_text("Hello")).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Network);
    assert!(!client.health_check().await);
}

#[tokio::test]
async fn test_health_check_reports_up() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": 200})))
        .mount(&server)
        .await;

    assert!(AskClient::new(&server.uri()).health_check().await);
}
