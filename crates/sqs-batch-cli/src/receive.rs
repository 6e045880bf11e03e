use std::time::Duration;

use anyhow::Context;
use aws_sdk_sqs::types::MessageSystemAttributeName;
use clap::Args;
use sqs_batch::{AttemptId, BatchCoordinator, ReceiveOptions, ReceiveParams};

#[derive(Debug, Args)]
pub struct ReceiveArgs {
    #[arg(long, env = "SQS_BATCH_QUEUE_URL")]
    queue_url: String,

    /// Most messages to receive
    #[arg(short = 'n', long, default_value_t = 10)]
    max_messages: usize,

    /// Total time to keep polling for messages
    #[arg(long, default_value_t = 1)]
    wait_seconds: u64,

    /// Long-poll wait of each ReceiveMessage call (at most 20)
    #[arg(long, default_value_t = 1)]
    round_wait: u64,

    #[arg(long)]
    visibility_timeout: Option<i32>,

    /// ReceiveRequestAttemptId sent with every call (FIFO queues)
    #[arg(long, conflicts_with = "fresh_attempt_id")]
    attempt_id: Option<String>,

    /// Send a new ReceiveRequestAttemptId with every call
    #[arg(long)]
    fresh_attempt_id: bool,

    /// System attribute to return, e.g. ApproximateReceiveCount or All
    #[arg(long = "attribute")]
    attributes: Vec<String>,

    /// Delete the messages after printing them
    #[arg(long)]
    delete: bool,
}

impl ReceiveArgs {
    fn params(&self) -> ReceiveParams {
        let attempt_id = match (&self.attempt_id, self.fresh_attempt_id) {
            (Some(token), _) => AttemptId::Fixed(token.clone()),
            (None, true) => AttemptId::PerRound,
            (None, false) => AttemptId::Omit,
        };

        let mut options = ReceiveOptions::default();
        if let Some(seconds) = self.visibility_timeout {
            options = options.with_visibility_timeout(seconds);
        }
        for name in &self.attributes {
            let name = MessageSystemAttributeName::from(name.as_str());
            options = options.with_system_attribute(name);
        }

        ReceiveParams::new(self.max_messages, Duration::from_secs(self.wait_seconds))
            .with_round_wait(Duration::from_secs(self.round_wait))
            .with_attempt_id(attempt_id)
            .with_options(options)
    }
}

pub async fn run(coordinator: BatchCoordinator, args: ReceiveArgs) -> anyhow::Result<()> {
    let messages = coordinator.receive(&args.queue_url, args.params()).await?;

    for message in &messages {
        println!("{}", serde_json::to_string(message).context("failed to encode message")?);
    }

    if args.delete && !messages.is_empty() {
        let acks = messages
            .iter()
            .enumerate()
            .map(|(i, m)| m.delete_entry(i.to_string()))
            .collect();
        let result = coordinator.delete_many(&args.queue_url, acks).await?;

        for failure in &result.failed {
            let index = failure.id.parse::<usize>().ok();
            let message_id = index
                .and_then(|i| messages.get(i))
                .map_or("?", |m| m.message_id.as_str());
            log::error!("could not delete message {message_id}: {}", failure.code);
        }
        if !result.failed.is_empty() {
            anyhow::bail!("{} messages could not be deleted", result.failed.len());
        }
    }

    Ok(())
}
