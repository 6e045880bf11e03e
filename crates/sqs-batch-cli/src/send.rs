use anyhow::Context;
use clap::Args;
use serde::Serialize;
use sqs_batch::{BatchCoordinator, BatchFailure, QueueClient, SendEntry};
use tokio::io::AsyncRead;

use crate::reader::{concurrent_lines, next_batch};
use crate::RetryArgs;

#[derive(Debug, Args)]
pub struct SendArgs {
    #[arg(long, env = "SQS_BATCH_QUEUE_URL")]
    queue_url: String,

    /// Number of lines handed to one bulk send
    #[arg(long, default_value_t = 100)]
    flush_size: usize,

    /// MessageGroupId applied to every message (FIFO queues)
    #[arg(long)]
    group_id: Option<String>,

    #[command(flatten)]
    pub(crate) retry: RetryArgs,
}

/// What `send` prints once stdin is exhausted.
#[derive(Debug, Default, Serialize)]
pub struct SendSummary {
    pub sent: usize,
    pub failed: Vec<BatchFailure>,
}

pub async fn run(coordinator: BatchCoordinator, args: SendArgs) -> anyhow::Result<()> {
    let coordinator = coordinator.with_retry_policy(args.retry.policy());
    let summary = send_lines(&coordinator, &args, tokio::io::stdin()).await?;

    println!("{}", serde_json::to_string(&summary)?);

    if !summary.failed.is_empty() {
        anyhow::bail!("{} messages could not be sent", summary.failed.len());
    }
    Ok(())
}

/// Sends every non-empty line of `input`, `flush_size` lines per bulk send.
/// The correlation id of a message is its line number.
pub async fn send_lines<C, R>(
    coordinator: &BatchCoordinator<C>,
    args: &SendArgs,
    input: R,
) -> anyhow::Result<SendSummary>
where
    C: QueueClient,
    R: AsyncRead + Unpin + Send + 'static,
{
    let flush_size = args.flush_size.max(1);
    let (reader, mut rx) = concurrent_lines(input, flush_size);
    let mut summary = SendSummary::default();

    loop {
        let lines = next_batch(&mut rx, flush_size).await;
        if lines.is_empty() {
            break;
        }

        let entries = lines
            .into_iter()
            .map(|line| {
                let entry = SendEntry::new(line.number.to_string(), line.text);
                match &args.group_id {
                    Some(group_id) => entry.with_group_id(group_id),
                    None => entry,
                }
            })
            .collect();

        let result = coordinator.send_many(&args.queue_url, entries).await?;
        summary.sent += result.successful.len();
        summary.failed.extend(result.failed);
    }

    reader.await.context("stdin reader task failed")?;
    Ok(summary)
}
