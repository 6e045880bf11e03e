//! The coordinator holding the queue client shared by the bulk operations.

use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_sqs as sqs;
use tokio_util::sync::CancellationToken;

use crate::client::QueueClient;
use crate::retry::RetryPolicy;

/// Runs bulk receive, send and delete operations against a queue service.
///
/// The coordinator keeps no state between calls; operations on clones of the
/// same coordinator may run concurrently.
///
/// # Example
///
/// ```no_run
/// use sqs_batch::{BatchCoordinator, SendEntry};
///
/// # async fn example() -> sqs_batch::Result<()> {
/// let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
/// let coordinator = BatchCoordinator::from_config(&config);
///
/// let entries = (0..25)
///     .map(|i| SendEntry::new(i.to_string(), format!("message {i}")))
///     .collect();
/// let result = coordinator
///     .send_many("https://sqs.us-east-1.amazonaws.com/123/my-queue", entries)
///     .await?;
///
/// assert_eq!(result.successful.len() + result.failed.len(), 25);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct BatchCoordinator<C = sqs::Client> {
    pub(crate) client: C,
    pub(crate) retry: RetryPolicy,
    pub(crate) cancel: Option<CancellationToken>,
}

impl BatchCoordinator {
    /// Creates a coordinator backed by an SQS client built from `config`.
    pub fn from_config(config: &SdkConfig) -> Self {
        Self::new(sqs::Client::new(config))
    }

    /// Creates a coordinator from the ambient AWS configuration
    /// (environment, shared profile, region discovery).
    pub async fn from_env() -> Self {
        let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
        Self::from_config(&config)
    }
}

impl<C: QueueClient> BatchCoordinator<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            retry: RetryPolicy::default(),
            cancel: None,
        }
    }

    /// Replaces the default policy, which retries transient entry failures forever.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Stops operations between rounds once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }
}
