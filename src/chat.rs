// Terminal front end for the chat widget.
// Each input line is turned into widget events; new messages are printed as
// `Sender: text`.

use anyhow::{Context, Result};
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{info, warn};

use crate::ask_client::{AskBackend, AskClient};
use crate::widget::{ChatWidget, Key, WidgetEvent};

const HELP_TEXT: &str = "Type a message and press Enter to chat.\n\
    /ask <material> | <manufacturer> | <work>  ask AI about a material\n\
    /send [text]  press the send button (works while the input is disabled)\n\
    /quit  leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Plain text: typed into the chat input, then Enter.
    Type(String),
    Ask {
        material_name: String,
        manufacturer_name: String,
        work_content: String,
    },
    Send(Option<String>),
    Help,
    Quit,
}

pub fn parse_line(line: &str) -> ChatCommand {
    let trimmed = line.trim_end_matches(['\r', '\n']);

    if let Some(rest) = trimmed.strip_prefix("/ask") {
        let mut parts = rest.splitn(3, '|').map(|p| p.trim().to_string());
        return ChatCommand::Ask {
            material_name: parts.next().unwrap_or_default(),
            manufacturer_name: parts.next().unwrap_or_default(),
            work_content: parts.next().unwrap_or_default(),
        };
    }
    if let Some(rest) = trimmed.strip_prefix("/send") {
        let text = rest.trim();
        return ChatCommand::Send((!text.is_empty()).then(|| text.to_string()));
    }
    match trimmed.trim() {
        "/quit" | "/exit" => ChatCommand::Quit,
        "/help" => ChatCommand::Help,
        _ => ChatCommand::Type(trimmed.to_string()),
    }
}

/// Drives `widget` from `input` until `/quit` or end of input.
pub async fn run_chat<R, W, B>(input: R, output: &mut W, widget: &mut ChatWidget, backend: &B) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    B: AskBackend,
{
    widget.initialize();
    let mut printed = widget.messages().len();
    let mut lines = input.lines();

    output.write_all(format!("{}\n", HELP_TEXT).as_bytes()).await?;

    while let Some(line) = lines.next_line().await.context("Failed to read chat input")? {
        let events: Vec<WidgetEvent> = match parse_line(&line) {
            ChatCommand::Quit => break,
            ChatCommand::Help => {
                output.write_all(format!("{}\n", HELP_TEXT).as_bytes()).await?;
                continue;
            }
            ChatCommand::Ask {
                material_name,
                manufacturer_name,
                work_content,
            } => {
                widget.set_structured_fields(material_name, manufacturer_name, work_content);
                vec![WidgetEvent::AskClicked]
            }
            ChatCommand::Send(text) => {
                if let Some(text) = text {
                    if !widget.set_chat_input(text) {
                        output.write_all(b"(chat input is disabled; sending its current value)\n").await?;
                    }
                }
                vec![WidgetEvent::SendClicked]
            }
            ChatCommand::Type(text) => {
                if !widget.is_chat_enabled() {
                    warn!("Typed line dropped: chat input disabled");
                    output
                        .write_all(b"(chat input is disabled; use /ask or /send)\n")
                        .await?;
                    continue;
                }
                text.chars()
                    .map(|c| WidgetEvent::KeyPress(Key::Char(c)))
                    .chain(std::iter::once(WidgetEvent::KeyPress(Key::Enter)))
                    .collect()
            }
        };

        for event in events {
            if let Some(pending) = widget.dispatch(event) {
                // Show the local echo before waiting on the backend.
                printed = print_new_messages(output, widget, printed).await?;
                let outcome = backend.ask(&pending.request).await;
                let _ = widget.complete(pending, outcome);
            }
        }
        printed = print_new_messages(output, widget, printed).await?;
    }

    output.flush().await?;
    Ok(())
}

async fn print_new_messages<W: AsyncWrite + Unpin>(
    output: &mut W,
    widget: &ChatWidget,
    already_printed: usize,
) -> Result<usize> {
    let messages = widget.messages();
    for message in &messages[already_printed..] {
        output.write_all(format!("{}\n", message).as_bytes()).await?;
    }
    output.flush().await?;
    Ok(messages.len())
}

pub async fn run_terminal_chat(base_url: &str) -> Result<()> {
    let client = AskClient::new(base_url);
    if client.health_check().await {
        info!("Ask Viridium service at {} is up", client.base_url());
    } else {
        warn!("Ask Viridium service at {} did not answer the health check", client.base_url());
    }

    let mut widget = ChatWidget::new();
    let mut stdout = io::stdout();
    run_chat(BufReader::new(io::stdin()), &mut stdout, &mut widget, &client).await
}
