//! Bulk receive.
//!
//! SQS returns at most ten messages per `ReceiveMessage` call. [`BatchCoordinator::receive`]
//! keeps polling until the requested number of messages has arrived or the
//! batching window has closed, whichever comes first. Whatever was received
//! by then is returned, even if it is fewer messages than requested.

use std::time::Duration;

use aws_sdk_sqs::types::MessageSystemAttributeName;
use tokio::time::Instant;

use crate::client::{QueueClient, ReceiveBatchRequest, MAX_BATCH_SIZE, MAX_WAIT_TIME_SECONDS};
use crate::coordinator::BatchCoordinator;
use crate::error::Result;
use crate::model::Message;

/// `ReceiveRequestAttemptId` handling across the rounds of one bulk receive.
///
/// Only meaningful for FIFO queues, where SQS uses the token to replay the
/// result of a receive call that is retried.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AttemptId {
    /// Rounds carry no attempt id.
    #[default]
    Omit,
    /// Every round carries the same caller-supplied token.
    Fixed(String),
    /// Every round carries a freshly generated token.
    PerRound,
}

impl AttemptId {
    fn for_round(&self) -> Option<String> {
        match self {
            AttemptId::Omit => None,
            AttemptId::Fixed(token) => Some(token.clone()),
            AttemptId::PerRound => Some(uuid::Uuid::new_v4().to_string()),
        }
    }
}

/// Options forwarded unchanged to every `ReceiveMessage` round.
///
/// Queue URL, message count, wait time and attempt id are managed by the
/// receive loop and cannot be set here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReceiveOptions {
    pub visibility_timeout: Option<i32>,
    pub message_system_attribute_names: Vec<MessageSystemAttributeName>,
    pub message_attribute_names: Vec<String>,
}

impl ReceiveOptions {
    pub fn with_visibility_timeout(mut self, seconds: i32) -> Self {
        self.visibility_timeout = Some(seconds);
        self
    }

    pub fn with_system_attribute(mut self, name: MessageSystemAttributeName) -> Self {
        self.message_system_attribute_names.push(name);
        self
    }

    pub fn with_message_attribute(mut self, name: impl Into<String>) -> Self {
        self.message_attribute_names.push(name.into());
        self
    }
}

/// Parameters of one bulk receive.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiveParams {
    /// Most messages to return
    pub max_messages: usize,
    /// Total time to keep polling
    pub batch_window: Duration,
    /// Long-poll wait of each round, rounded up to whole seconds between 1 and 20
    pub round_wait: Duration,
    pub attempt_id: AttemptId,
    pub options: ReceiveOptions,
}

impl Default for ReceiveParams {
    fn default() -> Self {
        Self {
            max_messages: MAX_BATCH_SIZE,
            batch_window: Duration::from_secs(1),
            round_wait: Duration::from_secs(1),
            attempt_id: AttemptId::Omit,
            options: ReceiveOptions::default(),
        }
    }
}

impl ReceiveParams {
    pub fn new(max_messages: usize, batch_window: Duration) -> Self {
        Self {
            max_messages,
            batch_window,
            ..Self::default()
        }
    }

    pub fn with_round_wait(mut self, round_wait: Duration) -> Self {
        self.round_wait = round_wait;
        self
    }

    pub fn with_attempt_id(mut self, attempt_id: AttemptId) -> Self {
        self.attempt_id = attempt_id;
        self
    }

    pub fn with_options(mut self, options: ReceiveOptions) -> Self {
        self.options = options;
        self
    }
}

/// Call-scoped bookkeeping of a bulk receive.
#[derive(Debug)]
struct PollBudget {
    started: Instant,
    target: usize,
    window: Duration,
    round_wait_seconds: i32,
}

impl PollBudget {
    fn start(params: &ReceiveParams) -> Self {
        // whole seconds, rounded up, at least one
        let round_wait_seconds = params
            .round_wait
            .as_secs_f64()
            .ceil()
            .clamp(1.0, f64::from(MAX_WAIT_TIME_SECONDS)) as i32;

        Self {
            started: Instant::now(),
            target: params.max_messages,
            window: params.batch_window,
            round_wait_seconds,
        }
    }

    /// Size of the next round, or `None` once the target is met or the window closed.
    fn next_round(&self, received: usize) -> Option<i32> {
        if received >= self.target || self.started.elapsed() >= self.window {
            return None;
        }

        let wanted = (self.target - received).min(MAX_BATCH_SIZE);
        Some(wanted as i32)
    }
}

impl<C: QueueClient> BatchCoordinator<C> {
    /// Receives up to `params.max_messages` messages from `queue_url`.
    ///
    /// Issues `ReceiveMessage` calls of at most ten messages each until enough
    /// messages arrived or `params.batch_window` elapsed. A round that returns
    /// nothing still counts against the window. Messages are returned in the
    /// order the rounds completed.
    ///
    /// # Errors
    ///
    /// The first failing `ReceiveMessage` call aborts the whole receive.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use sqs_batch::{BatchCoordinator, ReceiveParams};
    /// use std::time::Duration;
    ///
    /// # async fn example() -> sqs_batch::Result<()> {
    /// let coordinator = BatchCoordinator::from_env().await;
    /// let params = ReceiveParams::new(50, Duration::from_secs(5));
    ///
    /// let messages = coordinator
    ///     .receive("https://sqs.us-east-1.amazonaws.com/123/my-queue", params)
    ///     .await?;
    /// println!("got {} messages", messages.len());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn receive(&self, queue_url: &str, params: ReceiveParams) -> Result<Vec<Message>> {
        let budget = PollBudget::start(&params);
        let mut batch: Vec<Message> = Vec::with_capacity(params.max_messages.min(1000));
        let mut rounds = 0usize;

        while let Some(max_messages) = budget.next_round(batch.len()) {
            if self.is_cancelled() {
                log::debug!("receive cancelled after {rounds} rounds");
                break;
            }

            rounds += 1;
            let messages = self
                .client
                .receive_batch(ReceiveBatchRequest {
                    queue_url,
                    max_messages,
                    wait_time_seconds: budget.round_wait_seconds,
                    attempt_id: params.attempt_id.for_round(),
                    options: &params.options,
                })
                .await?;

            log::debug!(
                "receive round {rounds} returned {} of {max_messages} requested messages",
                messages.len()
            );
            batch.extend(messages);
        }

        log::info!(
            "received {} of {} messages from {queue_url} in {rounds} rounds ({:.3}s)",
            batch.len(),
            params.max_messages,
            budget.started.elapsed().as_secs_f64()
        );

        Ok(batch)
    }
}
