use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use askviridium::ask_client::AskClient;
use askviridium::widget::{ChatWidget, WidgetEvent};
use askviridium::{chat, constants, web_server};

// Define the command-line interface structure using clap
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

// Define the available subcommands
#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Serve the chat widget page and the development ask API.
    Serve {
        #[arg(long, env = "WEBSITES_PORT", default_value_t = constants::DEFAULT_PORT, help = "Port for the web server.")]
        port: u16,
        #[arg(long, help = "Base URL the widget sends its questions to. Defaults to this server.")]
        backend_url: Option<String>,
    },
    /// Chat with Ask Viridium AI from the terminal.
    Chat {
        #[arg(long, env = "ASKVIRIDIUM_URL", default_value_t = constants::ASKVIRIDIUM_URL.clone())]
        base_url: String,
    },
    /// Ask once about a material and print the answer.
    Ask {
        #[arg(long)]
        material: String,
        #[arg(long)]
        manufacturer: String,
        #[arg(long)]
        work: String,
        #[arg(long, env = "ASKVIRIDIUM_URL", default_value_t = constants::ASKVIRIDIUM_URL.clone())]
        base_url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (ASKVIRIDIUM_URL, WEBSITES_PORT, ...)
    dotenvy::dotenv().ok();

    // Reads log level from RUST_LOG (e.g., RUST_LOG=info,askviridium=debug).
    // Logs go to stderr so stdout stays clean for chat output.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    info!("askviridium starting with command: {:?}", cli.command);

    match cli.command {
        Commands::Serve { port, backend_url } => {
            let backend_url = backend_url.unwrap_or_else(|| format!("http://127.0.0.1:{}", port));

            let mut server_handle =
                tokio::spawn(async move { web_server::start_web_server(port, &backend_url).await });

            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Ctrl-C received, shutting down...");
                    server_handle.abort();
                }
                res = &mut server_handle => {
                    match res {
                        Ok(Ok(())) => info!("Web server task completed."),
                        Ok(Err(e)) => {
                            error!("Web server failed: {:?}", e);
                            return Err(e);
                        }
                        Err(e) if e.is_panic() => anyhow::bail!("Web server task panicked: {:?}", e),
                        Err(e) => anyhow::bail!("Web server task failed: {:?}", e),
                    }
                }
            }
            info!("Shutdown complete.");
        }
        Commands::Chat { base_url } => {
            info!("Starting terminal chat against {}", base_url);
            chat::run_terminal_chat(&base_url)
                .await
                .context("Chat session failed")?;
            info!("Chat session finished.");
        }
        Commands::Ask {
            material,
            manufacturer,
            work,
            base_url,
        } => {
            let client = AskClient::new(&base_url);
            let mut widget = ChatWidget::new();
            widget.initialize();
            widget.set_structured_fields(material, manufacturer, work);

            let outcome = widget.handle_event(WidgetEvent::AskClicked, &client).await;
            for message in widget.messages() {
                println!("{}", message);
            }
            if let Some(Err(kind)) = outcome {
                anyhow::bail!("Ask failed ({:?} error)", kind);
            }
        }
    }

    Ok(())
}
