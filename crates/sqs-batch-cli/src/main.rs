use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use sqs_batch::{BatchCoordinator, RetryPolicy};

mod bench;
mod delete;
mod reader;
mod receive;
mod send;

#[tokio::main]
pub async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Cli::parse().run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "sqs-batch")]
#[command(about = "receive, send and delete AWS SQS messages in bulk", long_about = None)]
pub struct Cli {
    /// Override the SQS endpoint, e.g. http://localhost:4566 for LocalStack
    #[arg(long, global = true, env = "AWS_ENDPOINT_URL")]
    endpoint_url: Option<String>,

    #[arg(long, global = true, env = "AWS_REGION")]
    region: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Receive up to N messages and print them as JSON lines
    Receive(receive::ReceiveArgs),
    /// Send every line read from stdin as one message
    Send(send::SendArgs),
    /// Delete messages by the receipt handles read from stdin
    Delete(delete::DeleteArgs),
    /// Measure send, receive and delete throughput
    Bench(bench::BenchArgs),
}

/// Handling of entries SQS fails without blaming the request.
#[derive(Debug, Clone, Args)]
pub struct RetryArgs {
    /// Give up on an entry after this many attempts [default: retry forever]
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Initial delay before resubmitting failed entries, doubled per attempt
    #[arg(long, default_value_t = 0)]
    retry_delay_ms: u64,
}

impl RetryArgs {
    pub fn policy(&self) -> RetryPolicy {
        let policy = match self.max_attempts {
            Some(max_attempts) => RetryPolicy::bounded(max_attempts),
            None => RetryPolicy::unbounded(),
        };
        let defaults = RetryPolicy::default();

        policy.with_backoff(Duration::from_millis(self.retry_delay_ms), defaults.max_delay)
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config =
            sqs_batch::load_config(self.endpoint_url.as_deref(), self.region.as_deref()).await;
        let coordinator = BatchCoordinator::from_config(&config);

        match self.command {
            Commands::Receive(args) => receive::run(coordinator, args).await,
            Commands::Send(args) => send::run(coordinator, args).await,
            Commands::Delete(args) => delete::run(coordinator, args).await,
            Commands::Bench(args) => bench::run(coordinator, args).await,
        }
    }
}
