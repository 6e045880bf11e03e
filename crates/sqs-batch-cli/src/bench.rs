use std::time::{Duration, Instant};

use clap::Args;
use serde::Serialize;
use sqs_batch::{BatchCoordinator, QueueClient, ReceiveParams, SendEntry};

/// Receive budget of one iteration.
const RECEIVE_WINDOW: Duration = Duration::from_secs(30);

#[derive(Debug, Args)]
pub struct BenchArgs {
    #[arg(long, env = "SQS_BATCH_QUEUE_URL")]
    queue_url: String,

    /// Messages to send, receive and delete per iteration
    #[arg(short = 'n', long, default_value_t = 100)]
    num_messages: usize,

    #[arg(short = 'i', long, default_value_t = 1)]
    iterations: usize,
}

/// Messages per second of each operation, one value per iteration, sorted ascending.
#[derive(Debug, Default, Serialize)]
pub struct Stats {
    pub send: Vec<f64>,
    pub receive: Vec<f64>,
    pub delete: Vec<f64>,
}

impl Stats {
    fn sort(&mut self) {
        for series in [&mut self.send, &mut self.receive, &mut self.delete] {
            series.sort_by(f64::total_cmp);
        }
    }
}

pub async fn run(coordinator: BatchCoordinator, args: BenchArgs) -> anyhow::Result<()> {
    let stats = bench(&coordinator, &args.queue_url, args.num_messages, args.iterations).await?;
    log::info!("stats: {}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

fn per_second(count: usize, elapsed: Duration) -> f64 {
    count as f64 / elapsed.as_secs_f64()
}

pub async fn bench<C: QueueClient>(
    coordinator: &BatchCoordinator<C>,
    queue_url: &str,
    num_messages: usize,
    iterations: usize,
) -> anyhow::Result<Stats> {
    let body = "a".repeat(1024);
    let mut stats = Stats::default();

    for run in 0..iterations {
        let entries = (0..num_messages)
            .map(|i| SendEntry::new(i.to_string(), body.as_str()))
            .collect();
        let started = Instant::now();
        let sent = coordinator.send_many(queue_url, entries).await?;
        let elapsed = started.elapsed();
        log::info!(
            "[run={run}] sent {} messages in {:.3} seconds ({:.0} / second; {} failed)",
            sent.successful.len(),
            elapsed.as_secs_f64(),
            per_second(sent.successful.len(), elapsed),
            sent.failed.len()
        );
        stats.send.push(per_second(sent.successful.len(), elapsed));

        let started = Instant::now();
        let received = coordinator
            .receive(queue_url, ReceiveParams::new(num_messages, RECEIVE_WINDOW))
            .await?;
        let elapsed = started.elapsed();
        log::info!(
            "[run={run}] received {} messages in {:.3} seconds ({:.0} / second)",
            received.len(),
            elapsed.as_secs_f64(),
            per_second(received.len(), elapsed)
        );
        stats.receive.push(per_second(received.len(), elapsed));

        let acks = received
            .iter()
            .map(|m| m.delete_entry(m.message_id.as_str()))
            .collect();
        let started = Instant::now();
        let deleted = coordinator.delete_many(queue_url, acks).await?;
        let elapsed = started.elapsed();
        log::info!(
            "[run={run}] deleted {} messages in {:.3} seconds ({:.0} / second; {} failed)",
            deleted.successful.len(),
            elapsed.as_secs_f64(),
            per_second(deleted.successful.len(), elapsed),
            deleted.failed.len()
        );
        stats.delete.push(per_second(deleted.successful.len(), elapsed));
    }

    stats.sort();
    Ok(stats)
}
