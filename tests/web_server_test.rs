use askviridium::web_server::build_app;
use askviridium::AskClient;
use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_server(backend_url: &str) -> TestServer {
    let app = build_app(AskClient::new(backend_url)).unwrap();
    TestServer::new(app).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let server = test_server("http://127.0.0.1:1");

    let response = server.get("/v1/health").await;

    response.assert_status_ok();
    response.assert_json(&json!({
        "status": 200,
        "message": "Server is running",
        "result": null,
    }));
}

#[tokio::test]
async fn test_ask_stub_answers_structured_request() {
    let server = test_server("http://127.0.0.1:1");

    let response = server
        .post("/v1/ask-viridium-ai")
        .json(&json!({"material_name": "Steel", "manufacturer_name": "AcmeCo", "work_content": "cutting"}))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["result"], "Hello World!");
    assert_eq!(body["message"], "Success");
}

#[tokio::test]
async fn test_ask_stub_answers_free_text_request() {
    let server = test_server("http://127.0.0.1:1");

    let response = server.post("/v1/ask-viridium-ai").json(&json!({"message": ""})).await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["result"], "Hello World!");
}

#[tokio::test]
async fn test_ask_stub_reports_missing_parameters() {
    let server = test_server("http://127.0.0.1:1");

    let response = server
        .post("/v1/ask-viridium-ai")
        .json(&json!({"material_name": "Steel"}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    response.assert_json(&json!({
        "status": 400,
        "message": "Missing parameters",
        "result": null,
        "missing_parameters": ["manufacturer_name", "work_content"],
    }));
}

#[tokio::test]
async fn test_ask_stub_wraps_non_json_body_in_envelope() {
    let server = test_server("http://127.0.0.1:1");

    let response = server.post("/v1/ask-viridium-ai").text("material=Steel").await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["status"], 400);
    assert_eq!(body["message"], "Invalid JSON body");
    assert_eq!(body["result"], Value::Null);
    assert!(body["reason"].is_string());
}

#[tokio::test]
async fn test_index_renders_empty_widget() {
    let server = test_server("http://127.0.0.1:1");

    let response = server.get("/").await;

    response.assert_status_ok();
    let page = response.text();
    assert!(page.contains("Ask Viridium AI"));
    assert!(page.contains(r#"class="ask-button""#));
    assert!(page.contains(r#"class="chat-messages""#));
    assert!(!page.contains(r#"class="message "#));
}

#[tokio::test]
async fn test_widget_ask_flow_through_backend() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/ask-viridium-ai"))
        .and(body_json(json!({
            "material_name": "Steel",
            "manufacturer_name": "AcmeCo",
            "work_content": "cutting"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": "Use carbide tooling."})))
        .expect(1)
        .mount(&backend)
        .await;
    let server = test_server(&backend.uri());

    let response = server
        .post("/widget/ask")
        .form(&[
            ("material_name", "Steel"),
            ("manufacturer_name", "AcmeCo"),
            ("work_content", "cutting"),
        ])
        .await;
    response.assert_status(StatusCode::SEE_OTHER);

    let messages: Value = server.get("/widget/messages").await.json();
    assert_eq!(messages, json!([{"sender": "AI", "text": "Use carbide tooling."}]));

    let page = server.get("/").await.text();
    assert!(page.contains("<strong>AI:</strong> Use carbide tooling."));
}

#[tokio::test]
async fn test_widget_send_flow_escapes_and_disables_input() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/ask-viridium-ai"))
        .and(body_json(json!({"message": "<b>Hello</b>"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": "Hi there"})))
        .expect(1)
        .mount(&backend)
        .await;
    let server = test_server(&backend.uri());

    server
        .post("/widget/send")
        .form(&[("message", "<b>Hello</b>")])
        .await
        .assert_status(StatusCode::SEE_OTHER);

    let messages: Value = server.get("/widget/messages").await.json();
    assert_eq!(
        messages,
        json!([
            {"sender": "User", "text": "<b>Hello</b>"},
            {"sender": "AI", "text": "Hi there"},
        ])
    );

    let page = server.get("/").await.text();
    assert!(page.contains("&lt;b&gt;Hello"));
    assert!(!page.contains("<b>Hello"));
    assert!(page.contains(" disabled>"));
}

#[tokio::test]
async fn test_widget_backend_failure_renders_error() {
    let server = test_server("http://127.0.0.1:1");

    server
        .post("/widget/ask")
        .form(&[("material_name", "Steel")])
        .await
        .assert_status(StatusCode::SEE_OTHER);

    let messages: Value = server.get("/widget/messages").await.json();
    assert_eq!(
        messages,
        json!([{
            "sender": "Error",
            "text": "An error occurred while getting the response from AI."
        }])
    );
}
