//! Error types for bulk queue operations.

use aws_sdk_sqs::error::SdkError;
use aws_sdk_sqs::operation::delete_message_batch::DeleteMessageBatchError;
use aws_sdk_sqs::operation::receive_message::ReceiveMessageError;
use aws_sdk_sqs::operation::send_message_batch::SendMessageBatchError;
use thiserror::Error;

/// Failure of a whole bulk operation.
///
/// Individual entries that SQS rejects are not errors; they are reported in
/// [`BatchResult::failed`](crate::BatchResult), and so are entries left unsent
/// by a cancelled operation. A `BatchError` means a remote call failed as a whole.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("failed to receive messages")]
    ReceiveFailed(#[source] Box<SdkError<ReceiveMessageError>>),

    #[error("failed to send message batch")]
    SendFailed(#[source] Box<SdkError<SendMessageBatchError>>),

    #[error("failed to delete message batch")]
    DeleteFailed(#[source] Box<SdkError<DeleteMessageBatchError>>),

    #[error("failed to build batch entry: {0}")]
    InvalidEntry(String),

    #[error("malformed response from queue service: {0}")]
    MalformedResponse(String),

    /// Call-level failure reported by a non-SDK [`QueueClient`](crate::QueueClient).
    #[error("queue client error: {0}")]
    Client(String),
}

impl From<SdkError<ReceiveMessageError>> for BatchError {
    fn from(e: SdkError<ReceiveMessageError>) -> Self {
        Self::ReceiveFailed(Box::new(e))
    }
}

impl From<SdkError<SendMessageBatchError>> for BatchError {
    fn from(e: SdkError<SendMessageBatchError>) -> Self {
        Self::SendFailed(Box::new(e))
    }
}

impl From<SdkError<DeleteMessageBatchError>> for BatchError {
    fn from(e: SdkError<DeleteMessageBatchError>) -> Self {
        Self::DeleteFailed(Box::new(e))
    }
}

pub type Result<T, E = BatchError> = std::result::Result<T, E>;
