//! The single-batch primitives the coordinator is built on.

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{BatchResult, DeleteEntry, DeleteSuccess, Message, SendEntry, SendSuccess};
use crate::receive::ReceiveOptions;

/// Most entries SQS accepts in one batch call, and most messages one receive returns.
pub const MAX_BATCH_SIZE: usize = 10;

/// Longest long-poll wait SQS accepts for one receive call, in seconds.
pub const MAX_WAIT_TIME_SECONDS: i32 = 20;

/// One round of `ReceiveMessage`.
#[derive(Debug, Clone)]
pub struct ReceiveBatchRequest<'a> {
    pub queue_url: &'a str,
    /// At most [`MAX_BATCH_SIZE`]
    pub max_messages: i32,
    /// At most [`MAX_WAIT_TIME_SECONDS`]
    pub wait_time_seconds: i32,
    pub attempt_id: Option<String>,
    pub options: &'a ReceiveOptions,
}

/// A queue service handle exposing the three batch primitives.
///
/// Implementations perform exactly one remote call per method. Entries
/// rejected individually are reported in the returned [`BatchResult`]; an
/// `Err` means the call failed as a whole.
///
/// [`aws_sdk_sqs::Client`] implements this trait.
#[async_trait]
pub trait QueueClient: Send + Sync {
    async fn receive_batch(&self, request: ReceiveBatchRequest<'_>) -> Result<Vec<Message>>;

    async fn send_batch(
        &self,
        queue_url: &str,
        entries: &[SendEntry],
    ) -> Result<BatchResult<SendSuccess>>;

    async fn delete_batch(
        &self,
        queue_url: &str,
        entries: &[DeleteEntry],
    ) -> Result<BatchResult<DeleteSuccess>>;
}
