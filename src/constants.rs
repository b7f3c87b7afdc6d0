// Constants shared by the widget, the client and the web server.
// Values that depend on the deployment are read from the environment.

use std::env;

pub const API_VERSION: &str = "/v1";
pub const ASK_ENDPOINT: &str = "/v1/ask-viridium-ai";
pub const HEALTH_ENDPOINT: &str = "/v1/health";

/// Fixed user-facing text for every failed ask.
pub const ASK_ERROR_TEXT: &str = "An error occurred while getting the response from AI.";

/// Canned answer returned by the development stub of the ask endpoint.
pub const STUB_RESULT: &str = "Hello World!";

pub const DEFAULT_PORT: u16 = 8000;

lazy_static::lazy_static! {
    pub static ref ASKVIRIDIUM_URL: String = env::var("ASKVIRIDIUM_URL")
        .unwrap_or_else(|_| format!("http://127.0.0.1:{}", DEFAULT_PORT));
    pub static ref STATIC_DIR: String = env::var("ASKVIRIDIUM_STATIC_DIR").unwrap_or_else(|_| "static".to_string());
}
