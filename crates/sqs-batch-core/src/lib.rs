//! # sqs-batch-core
//!
//! Bulk receive, send and delete on top of the AWS SQS batch APIs.
//!
//! SQS caps every batch call at ten entries and reports failures per entry.
//! This crate hides both limits: callers hand over any number of messages and
//! get back a complete account of what happened to each of them.
//!
//! ## Features
//!
//! - **Bulk receive**: poll until a target number of messages arrived or a
//!   time window closed
//! - **Bulk send / delete**: chunk entries into batches of ten and resubmit
//!   entries that failed transiently
//! - **Retry policy**: retry forever (the default) or give up after a number
//!   of attempts, with optional exponential backoff
//!
//! ## Example
//!
//! ```no_run
//! use sqs_batch::{BatchCoordinator, ReceiveParams};
//! use std::time::Duration;
//!
//! # async fn example() -> sqs_batch::Result<()> {
//! let config = sqs_batch::load_config(Some("http://localhost:4566"), None).await;
//! let coordinator = BatchCoordinator::from_config(&config);
//! let queue_url = "http://localhost:4566/000000000000/jobs";
//!
//! let messages = coordinator
//!     .receive(queue_url, ReceiveParams::new(100, Duration::from_secs(5)))
//!     .await?;
//!
//! let acks = messages
//!     .iter()
//!     .enumerate()
//!     .map(|(i, m)| m.delete_entry(i.to_string()))
//!     .collect();
//! let deleted = coordinator.delete_many(queue_url, acks).await?;
//! println!("acknowledged {} messages", deleted.successful.len());
//! # Ok(())
//! # }
//! ```

mod batch;
mod client;
mod coordinator;
mod delete;
mod error;
mod model;
mod receive;
mod retry;
mod send;
mod sqs;

#[cfg(test)]
mod test_utils;

pub use batch::{CANCELLED_CODE, NO_RESPONSE_CODE};
pub use client::{QueueClient, ReceiveBatchRequest, MAX_BATCH_SIZE, MAX_WAIT_TIME_SECONDS};
pub use coordinator::BatchCoordinator;
pub use error::{BatchError, Result};
pub use model::{
    BatchFailure, BatchResult, Correlated, DeleteEntry, DeleteSuccess, Message, SendEntry,
    SendSuccess,
};
pub use receive::{AttemptId, ReceiveOptions, ReceiveParams};
pub use retry::RetryPolicy;
pub use sqs::load_config;
