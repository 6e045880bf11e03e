use anyhow::Context;
use clap::Args;
use serde::Serialize;
use sqs_batch::{BatchCoordinator, BatchFailure, DeleteEntry, QueueClient};
use tokio::io::AsyncRead;

use crate::reader::{concurrent_lines, next_batch};
use crate::RetryArgs;

/// Receipt handles handed to one bulk delete.
const FLUSH_SIZE: usize = 100;

#[derive(Debug, Args)]
pub struct DeleteArgs {
    #[arg(long, env = "SQS_BATCH_QUEUE_URL")]
    queue_url: String,

    #[command(flatten)]
    retry: RetryArgs,
}

#[derive(Debug, Default, Serialize)]
pub struct DeleteSummary {
    pub deleted: usize,
    pub failed: Vec<BatchFailure>,
}

pub async fn run(coordinator: BatchCoordinator, args: DeleteArgs) -> anyhow::Result<()> {
    let coordinator = coordinator.with_retry_policy(args.retry.policy());
    let summary = delete_lines(&coordinator, &args.queue_url, tokio::io::stdin()).await?;

    println!("{}", serde_json::to_string(&summary)?);

    if !summary.failed.is_empty() {
        anyhow::bail!("{} messages could not be deleted", summary.failed.len());
    }
    Ok(())
}

/// Deletes one receipt handle per non-empty line; failures carry the line number as id.
pub async fn delete_lines<C, R>(
    coordinator: &BatchCoordinator<C>,
    queue_url: &str,
    input: R,
) -> anyhow::Result<DeleteSummary>
where
    C: QueueClient,
    R: AsyncRead + Unpin + Send + 'static,
{
    let (reader, mut rx) = concurrent_lines(input, FLUSH_SIZE);
    let mut summary = DeleteSummary::default();

    loop {
        let lines = next_batch(&mut rx, FLUSH_SIZE).await;
        if lines.is_empty() {
            break;
        }

        let entries = lines
            .into_iter()
            .map(|line| DeleteEntry::new(line.number.to_string(), line.text.trim()))
            .collect();

        let result = coordinator.delete_many(queue_url, entries).await?;
        summary.deleted += result.successful.len();
        summary.failed.extend(result.failed);
    }

    reader.await.context("stdin reader task failed")?;
    Ok(summary)
}
