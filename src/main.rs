mod client;
mod config;
mod constant;
mod error;
mod feed;
mod pipeline;
mod publish;
mod select;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use std::process::ExitCode;

use crate::config::Config;
use crate::error::ErrorKind;
use crate::feed::{KeywordFilter, RemoteFeed};
use crate::pipeline::{PipelineBuilder, RunOutcome};
use crate::publish::message::test_message;
use crate::publish::{GraphClient, MessageFormatter};

#[derive(Debug, Parser)]
#[command(version, about = "Posts a random feed entry to a social-media page")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Log what would be posted without calling the page API
    #[arg(long, global = true)]
    dry_run: bool,
}

#[derive(Debug, Clone, Copy, Subcommand)]
enum Command {
    /// Fetch the feed and post one random entry (default)
    Post,
    /// Post a timestamped text message to check page connectivity
    Ping,
}

#[tokio::main]
async fn main() -> ExitCode {
    setup_env_and_tracing();
    let cli = Cli::parse();

    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            return ExitCode::from(ErrorKind::ConfigurationMissing.exit_code());
        }
    };
    if cli.dry_run {
        config.dry_run = true;
    }

    let code = match cli.command.unwrap_or(Command::Post) {
        Command::Post => run_post(&config).await,
        Command::Ping => run_ping(&config).await,
    };
    ExitCode::from(code)
}

async fn run_post(config: &Config) -> u8 {
    let pipeline = PipelineBuilder::new(RemoteFeed::new(config))
        .with_filter(KeywordFilter::new(&config.keywords))
        .with_formatter(MessageFormatter::from_config(config))
        .build(GraphClient::new(config));

    let outcome = pipeline.run_once(&mut rand::thread_rng()).await;
    if let RunOutcome::Published(post) = &outcome {
        tracing::info!("Published post {}", post.id.as_deref().unwrap_or("(no id)"));
    }
    outcome.exit_code(config.fail_on_error)
}

async fn run_ping(config: &Config) -> u8 {
    tracing::info!("Starting page test post process...");
    let message = test_message(&chrono::Local::now());
    let result = GraphClient::new(config).post_text(&message).await;
    tracing::info!("Page test post process finished.");

    match result {
        Ok(_) => 0,
        Err(e) if config.fail_on_error => e.kind().exit_code(),
        Err(_) => 0,
    }
}

pub fn setup_env_and_tracing() {
    dotenv::dotenv().ok();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
