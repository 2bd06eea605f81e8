//! Terminal chat against a running proxy.
//!
//! Commands: `/new` starts a new conversation, `/business` and `/general`
//! switch context, `/quit` exits. Ctrl-C stops the answer being streamed.

use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use portfolio_chat::adapters::transport::HttpChatTransport;
use portfolio_chat::application::{ChatSurface, StreamRelay, SubmitError, DEFAULT_GREETING};
use portfolio_chat::config::AppConfig;
use portfolio_chat::domain::chat::{ChatContext, CONNECTION_ERROR_SENTINEL};

const CONNECTION_ERROR_TEXT: &str =
    "[Sorry, I couldn't reach the assistant. Please try again, or get in touch directly.]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;
    config.relay.validate().context("invalid relay configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let transport = HttpChatTransport::new(config.relay.transport_config());
    let relay = StreamRelay::new(Arc::new(transport)).with_timeout(config.relay.timeout());
    let surface = ChatSurface::new(Arc::new(relay), DEFAULT_GREETING);

    println!("Connected to {}", config.relay.endpoint);
    println!("{}\n", DEFAULT_GREETING);

    let mut context = ChatContext::General;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("[{}] > ", context);
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match line.trim() {
            "/quit" => break,
            "/new" => {
                surface.new_conversation();
                println!("{}\n", DEFAULT_GREETING);
                continue;
            }
            "/business" | "/general" => {
                context = line.trim().trim_start_matches('/').parse()?;
                continue;
            }
            _ => {}
        }

        let mut printed = 0;
        let submit = surface.submit_with(&line, context, |text| {
            if text == CONNECTION_ERROR_SENTINEL {
                println!("\n{}", CONNECTION_ERROR_TEXT);
                return;
            }
            if let Some(delta) = text.get(printed..) {
                print!("{}", delta);
                let _ = std::io::stdout().flush();
            }
            printed = text.len();
        });
        tokio::pin!(submit);

        let result = tokio::select! {
            result = &mut submit => result,
            _ = tokio::signal::ctrl_c() => {
                surface.stop();
                let result = (&mut submit).await;
                print!(" [stopped]");
                result
            }
        };

        match result {
            Ok(()) => println!("\n"),
            Err(SubmitError::EmptyMessage) => {}
        }
    }

    Ok(())
}
