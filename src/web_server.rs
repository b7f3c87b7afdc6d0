use anyhow::{Context, Result};
use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect},
    routing::{get, post},
    serve, Form, Json, Router,
};
use minijinja::Environment;
use serde::Deserialize;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc};
use tokio::sync::Mutex;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{debug, error, info, warn};

use crate::ask_client::{AskBackend, AskClient};
use crate::constants;
use crate::message::ChatMessage;
use crate::templates;
use crate::widget::{ChatWidget, PendingAsk, WidgetEvent};

// Shared application state
#[derive(Clone)]
pub struct AppState {
    templates: Arc<Environment<'static>>,
    // The lock is never held while a request is in flight.
    widget: Arc<Mutex<ChatWidget>>,
    backend: AskClient,
}

#[derive(Debug, Deserialize)]
struct AskForm {
    #[serde(default)]
    material_name: String,
    #[serde(default)]
    manufacturer_name: String,
    #[serde(default)]
    work_content: String,
}

// A disabled chat input is not submitted by the browser, hence the Option.
#[derive(Debug, Deserialize)]
struct SendForm {
    message: Option<String>,
}

async fn index_handler(
    State(state): State<AppState>,
) -> Result<Html<String>, (StatusCode, Html<String>)> {
    let widget = state.widget.lock().await;
    templates::render_page(&state.templates, widget.state())
        .map(Html)
        .map_err(|e| {
            error!("Failed to render widget page: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(format!("Internal Server Error: {}", e)),
            )
        })
}

async fn messages_handler(State(state): State<AppState>) -> Json<Vec<ChatMessage>> {
    let widget = state.widget.lock().await;
    Json(widget.messages().to_vec())
}

// Sends the request without holding the widget lock, then applies the reply.
async fn run_pending(state: &AppState, pending: Option<PendingAsk>) {
    let Some(pending) = pending else {
        return;
    };
    let outcome = state.backend.ask(&pending.request).await;
    let mut widget = state.widget.lock().await;
    // The error detail is logged by the widget; the page shows the fixed text.
    let _ = widget.complete(pending, outcome);
}

async fn widget_ask_handler(State(state): State<AppState>, Form(form): Form<AskForm>) -> Redirect {
    debug!(?form, "Ask AI submitted");
    let pending = {
        let mut widget = state.widget.lock().await;
        widget.set_structured_fields(form.material_name, form.manufacturer_name, form.work_content);
        widget.dispatch(WidgetEvent::AskClicked)
    };
    run_pending(&state, pending).await;
    Redirect::to("/")
}

async fn widget_send_handler(State(state): State<AppState>, Form(form): Form<SendForm>) -> Redirect {
    debug!(?form, "Chat message submitted");
    let pending = {
        let mut widget = state.widget.lock().await;
        if let Some(message) = form.message {
            widget.set_chat_input(message);
        }
        widget.dispatch(WidgetEvent::SendClicked)
    };
    run_pending(&state, pending).await;
    Redirect::to("/")
}

fn api_response(
    status: StatusCode,
    message: &str,
    result: Option<Value>,
    additional_data: Option<Value>,
) -> (StatusCode, Json<Value>) {
    let mut body = json!({
        "status": status.as_u16(),
        "message": message,
        "result": result,
    });
    if let (Some(Value::Object(extra)), Value::Object(map)) = (additional_data, &mut body) {
        map.extend(extra);
    }
    (status, Json(body))
}

fn missing_params(body: &Value, required: &[&str]) -> Vec<String> {
    required
        .iter()
        .filter(|param| body.get(**param).is_none())
        .map(|param| param.to_string())
        .collect()
}

// Development stand-in for the AI service: validates the body and answers
// with a canned result.
async fn ask_stub_handler(body: Result<Json<Value>, JsonRejection>) -> (StatusCode, Json<Value>) {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!(%rejection, "Ask request body rejected");
            return api_response(
                StatusCode::BAD_REQUEST,
                "Invalid JSON body",
                None,
                Some(json!({ "reason": rejection.body_text() })),
            );
        }
    };

    let required: &[&str] = if body.get("message").is_some() {
        &["message"]
    } else {
        &["material_name", "manufacturer_name", "work_content"]
    };

    let missing = missing_params(&body, required);
    if !missing.is_empty() {
        warn!(?missing, "Ask request missing parameters");
        return api_response(
            StatusCode::BAD_REQUEST,
            "Missing parameters",
            None,
            Some(json!({ "missing_parameters": missing })),
        );
    }

    api_response(
        StatusCode::OK,
        "Success",
        Some(Value::String(constants::STUB_RESULT.to_string())),
        None,
    )
}

async fn health_handler() -> (StatusCode, Json<Value>) {
    api_response(StatusCode::OK, "Server is running", None, None)
}

pub fn build_app(backend: AskClient) -> Result<Router> {
    let templates = templates::create_template_env().context("Failed to initialize template engine")?;

    let mut widget = ChatWidget::new();
    widget.initialize();

    let state = AppState {
        templates: Arc::new(templates),
        widget: Arc::new(Mutex::new(widget)),
        backend,
    };

    // Serve static files from the configured static directory
    let static_files_service = ServeDir::new(constants::STATIC_DIR.as_str()).not_found_service(
        tower::service_fn(|_req: Request| async {
            Ok::<_, Infallible>((StatusCode::NOT_FOUND, "Not Found").into_response())
        }),
    );

    let api = Router::new()
        .route("/ask-viridium-ai", post(ask_stub_handler))
        .route("/health", get(health_handler));

    let app = Router::new()
        .route("/", get(index_handler))
        .route("/widget/ask", post(widget_ask_handler))
        .route("/widget/send", post(widget_send_handler))
        .route("/widget/messages", get(messages_handler))
        .nest(constants::API_VERSION, api)
        .nest_service("/static", static_files_service)
        .with_state(state)
        .layer(TraceLayer::new_for_http()); // Add request logging

    Ok(app)
}

pub async fn start_web_server(port: u16, backend_url: &str) -> Result<()> {
    let app = build_app(AskClient::new(backend_url))?;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Web server listening on http://{}", addr);
    info!("Widget backend: {}", backend_url);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context(format!("Failed to bind to address {}", addr))?;

    serve(listener, app.into_make_service())
        .await
        .context("Web server failed")?;

    Ok(())
}
