pub mod ask_client;
pub mod chat;
pub mod constants;
pub mod message;
pub mod templates;
pub mod web_server;
pub mod widget;

pub use ask_client::{AskBackend, AskClient, AskError, AskRequest, AskResponse, ErrorKind};
pub use message::{ChatMessage, Sender};
pub use widget::{ChatWidget, Key, PendingAsk, WidgetEvent, WidgetState};
