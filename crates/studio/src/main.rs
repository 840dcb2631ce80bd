use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::level_filters::LevelFilter;

mod app;
mod client;
mod command;
mod view;

use app::{Flow, Studio};
use client::BackendClient;
use command::Command;

#[derive(Parser)]
#[command(name = "studio")]
#[command(about = "Edit videos by chatting with the AI editor from your terminal")]
struct Cli {
    /// Base URL of the editing daemon
    #[arg(long, default_value = "http://localhost:8000")]
    backend: String,

    /// Video URL to import before the prompt opens
    #[arg(long)]
    video: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::INFO)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut studio = Studio::new(BackendClient::new(&cli.backend));
    println!("studio connected to {} (type /help for commands)", cli.backend);

    if let Some(url) = cli.video {
        studio.run(Command::Import { url, name: None }).await;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let command = match command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };
        if studio.run(command).await == Flow::Quit {
            break;
        }
    }
    Ok(())
}
