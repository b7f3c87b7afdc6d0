//! Chat widget controller.
//!
//! The widget owns its state explicitly: the three structured fields, the chat
//! input, the chat-enabled flag and the message list. UI surfaces (the web
//! page, the terminal chat) feed it [`WidgetEvent`]s and read the state back.
//!
//! Every submit is split in two halves so callers can show the local echo
//! before the network call resolves:
//!
//! * `begin_*` performs the synchronous effects and returns a [`PendingAsk`]
//! * [`ChatWidget::complete`] applies the backend outcome
//!
//! Completions are applied in the order they arrive. Nothing correlates or
//! cancels overlapping requests.

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::ask_client::{AskBackend, AskError, AskRequest, AskResponse, ErrorKind};
use crate::constants;
use crate::message::{ChatMessage, Sender};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Backspace,
    Char(char),
}

/// The listeners bound by [`ChatWidget::initialize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetEvent {
    /// Click on the "Ask AI" button.
    AskClicked,
    /// Click on the "Send" button.
    SendClicked,
    /// Keypress delivered to the chat input field.
    KeyPress(Key),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AskKind {
    Structured,
    FreeText,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAsk {
    pub id: u64,
    pub kind: AskKind,
    pub request: AskRequest,
}

#[derive(Debug, Clone, Serialize)]
pub struct WidgetState {
    pub material_name: String,
    pub manufacturer_name: String,
    pub work_content: String,
    pub chat_input: String,
    pub chat_enabled: bool,
    messages: Vec<ChatMessage>,
}

impl Default for WidgetState {
    fn default() -> Self {
        Self {
            material_name: String::new(),
            manufacturer_name: String::new(),
            work_content: String::new(),
            chat_input: String::new(),
            chat_enabled: true,
            messages: Vec::new(),
        }
    }
}

impl WidgetState {
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }
}

#[derive(Debug, Default)]
pub struct ChatWidget {
    state: WidgetState,
    listeners_bound: bool,
    next_request_id: u64,
}

impl ChatWidget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &WidgetState {
        &self.state
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.state.messages()
    }

    pub fn is_chat_enabled(&self) -> bool {
        self.state.chat_enabled
    }

    pub fn is_initialized(&self) -> bool {
        self.listeners_bound
    }

    /// Binds the ask button, the send button and the Enter key on the chat
    /// input. Returns false if the listeners were already bound.
    pub fn initialize(&mut self) -> bool {
        if self.listeners_bound {
            warn!("Chat widget already initialized; ignoring second initialize()");
            return false;
        }
        self.listeners_bound = true;
        info!("Chat widget listeners bound");
        true
    }

    pub fn set_structured_fields(
        &mut self,
        material_name: impl Into<String>,
        manufacturer_name: impl Into<String>,
        work_content: impl Into<String>,
    ) {
        self.state.material_name = material_name.into();
        self.state.manufacturer_name = manufacturer_name.into();
        self.state.work_content = work_content.into();
    }

    /// Replaces the chat input value. A disabled field keeps its value.
    pub fn set_chat_input(&mut self, value: impl Into<String>) -> bool {
        if !self.state.chat_enabled {
            debug!("Chat input is disabled; value not changed");
            return false;
        }
        self.state.chat_input = value.into();
        true
    }

    pub fn enable_chat(&mut self) {
        self.state.chat_enabled = true;
    }

    pub fn disable_chat(&mut self) {
        self.state.chat_enabled = false;
    }

    /// Appends one entry to the end of the message list.
    pub fn render_message(&mut self, sender: Sender, text: impl Into<String>) -> &ChatMessage {
        self.state.messages.push(ChatMessage::new(sender, text));
        let idx = self.state.messages.len() - 1;
        &self.state.messages[idx]
    }

    /// Routes an event to its flow. Returns the issued request, if any.
    pub fn dispatch(&mut self, event: WidgetEvent) -> Option<PendingAsk> {
        if !self.listeners_bound {
            debug!(?event, "Event ignored: listeners not bound");
            return None;
        }

        match event {
            WidgetEvent::AskClicked => Some(self.begin_ask_ai()),
            WidgetEvent::SendClicked => Some(self.begin_chat_message()),
            WidgetEvent::KeyPress(key) => {
                // A disabled input field receives no key events.
                if !self.state.chat_enabled {
                    debug!(?key, "Keypress ignored: chat input disabled");
                    return None;
                }
                match key {
                    Key::Enter => Some(self.begin_chat_message()),
                    Key::Char(c) => {
                        self.state.chat_input.push(c);
                        None
                    }
                    Key::Backspace => {
                        self.state.chat_input.pop();
                        None
                    }
                }
            }
        }
    }

    /// Local half of the "Ask AI" flow. The fields are sent as-is.
    pub fn begin_ask_ai(&mut self) -> PendingAsk {
        let request = AskRequest::structured(
            self.state.material_name.clone(),
            self.state.manufacturer_name.clone(),
            self.state.work_content.clone(),
        );
        self.issue(AskKind::Structured, request)
    }

    /// Local half of the chat flow: echo and clear a non-empty input. An empty
    /// input still issues a request with an empty message.
    pub fn begin_chat_message(&mut self) -> PendingAsk {
        let message = self.state.chat_input.trim().to_string();

        if !message.is_empty() {
            self.render_message(Sender::User, message.clone());
            self.state.chat_input.clear();
        }

        self.issue(AskKind::FreeText, AskRequest::free_text(message))
    }

    fn issue(&mut self, kind: AskKind, request: AskRequest) -> PendingAsk {
        self.next_request_id += 1;
        let pending = PendingAsk {
            id: self.next_request_id,
            kind,
            request,
        };
        debug!(id = pending.id, ?kind, "Ask issued");
        pending
    }

    /// Applies a backend outcome and returns the message it rendered.
    ///
    /// Structured asks enable the chat input whether they succeed or fail.
    /// Free-text asks disable it in both cases.
    pub fn complete(
        &mut self,
        pending: PendingAsk,
        outcome: Result<AskResponse, AskError>,
    ) -> Result<ChatMessage, ErrorKind> {
        debug!(id = pending.id, kind = ?pending.kind, ok = outcome.is_ok(), "Ask completed");

        let result = match outcome {
            Ok(response) => Ok(self.render_message(Sender::AI, response.result).clone()),
            Err(e) => {
                error!(id = pending.id, error = %e, "Error getting response from AI");
                self.render_message(Sender::Error, constants::ASK_ERROR_TEXT);
                Err(e.kind())
            }
        };

        match pending.kind {
            AskKind::Structured => self.enable_chat(),
            AskKind::FreeText => self.disable_chat(),
        }

        result
    }

    /// Runs the full flow for one event against `backend`. Returns `None` when
    /// the event does not trigger a request.
    pub async fn handle_event<B: AskBackend>(
        &mut self,
        event: WidgetEvent,
        backend: &B,
    ) -> Option<Result<ChatMessage, ErrorKind>> {
        let pending = self.dispatch(event)?;
        let outcome = backend.ask(&pending.request).await;
        Some(self.complete(pending, outcome))
    }

    pub async fn submit_ask_ai<B: AskBackend>(&mut self, backend: &B) -> Result<ChatMessage, ErrorKind> {
        let pending = self.begin_ask_ai();
        let outcome = backend.ask(&pending.request).await;
        self.complete(pending, outcome)
    }

    pub async fn submit_chat_message<B: AskBackend>(
        &mut self,
        backend: &B,
    ) -> Result<ChatMessage, ErrorKind> {
        let pending = self.begin_chat_message();
        let outcome = backend.ask(&pending.request).await;
        self.complete(pending, outcome)
    }
}
