//! Entries submitted to the batch primitives and the results they produce.

use std::collections::HashMap;

/// Anything carrying the caller-assigned correlation id of a batch entry.
///
/// Request entries, success entries and failures all implement it so the
/// chunk engine can match responses back to the entries that produced them.
pub trait Correlated {
    fn id(&self) -> &str;
}

/// A message received from a queue.
///
/// Only `message_id` and `receipt_handle` are guaranteed by the service; the
/// receipt handle is what [`DeleteEntry`] needs to acknowledge the message.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct Message {
    /// Identifier assigned by SQS
    pub message_id: String,
    /// Handle used to delete or change visibility of the message
    pub receipt_handle: String,
    /// The message content
    pub body: String,
    /// MD5 digest of the body, when SQS returned one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub md5_of_body: Option<String>,
    /// `MessageGroupId` for messages received from FIFO queues
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    /// System attributes requested through `ReceiveOptions`
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub attributes: HashMap<String, String>,
    /// String values of the custom message attributes requested
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub message_attributes: HashMap<String, String>,
}

impl Message {
    /// Creates a message with only the required fields set.
    pub fn new(
        message_id: impl Into<String>,
        receipt_handle: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            message_id: message_id.into(),
            receipt_handle: receipt_handle.into(),
            body: body.into(),
            md5_of_body: None,
            group_id: None,
            attributes: HashMap::new(),
            message_attributes: HashMap::new(),
        }
    }

    /// Builds the entry that deletes this message, correlated by `id`.
    pub fn delete_entry(&self, id: impl Into<String>) -> DeleteEntry {
        DeleteEntry::new(id, self.receipt_handle.clone())
    }
}

/// One message to submit through `SendMessageBatch`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SendEntry {
    pub id: String,
    pub body: String,
    pub delay_seconds: Option<i32>,
    /// Required for FIFO queues
    pub group_id: Option<String>,
    pub deduplication_id: Option<String>,
}

impl SendEntry {
    pub fn new(id: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            body: body.into(),
            delay_seconds: None,
            group_id: None,
            deduplication_id: None,
        }
    }

    pub fn with_delay_seconds(mut self, delay_seconds: i32) -> Self {
        self.delay_seconds = Some(delay_seconds);
        self
    }

    pub fn with_group_id(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    pub fn with_deduplication_id(mut self, deduplication_id: impl Into<String>) -> Self {
        self.deduplication_id = Some(deduplication_id.into());
        self
    }
}

impl Correlated for SendEntry {
    fn id(&self) -> &str {
        &self.id
    }
}

/// One receipt handle to submit through `DeleteMessageBatch`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeleteEntry {
    pub id: String,
    pub receipt_handle: String,
}

impl DeleteEntry {
    pub fn new(id: impl Into<String>, receipt_handle: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            receipt_handle: receipt_handle.into(),
        }
    }
}

impl Correlated for DeleteEntry {
    fn id(&self) -> &str {
        &self.id
    }
}

/// A message SQS accepted from a send batch.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct SendSuccess {
    pub id: String,
    pub message_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub md5_of_body: Option<String>,
    /// Only set for FIFO queues
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<String>,
}

impl Correlated for SendSuccess {
    fn id(&self) -> &str {
        &self.id
    }
}

/// A receipt handle SQS deleted from a delete batch.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct DeleteSuccess {
    pub id: String,
}

impl Correlated for DeleteSuccess {
    fn id(&self) -> &str {
        &self.id
    }
}

/// A single entry SQS rejected within an otherwise successful batch call.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct BatchFailure {
    pub id: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// `true` when the request itself was at fault. Such failures are never retried.
    pub sender_fault: bool,
}

impl BatchFailure {
    pub fn new(id: impl Into<String>, code: impl Into<String>, sender_fault: bool) -> Self {
        Self {
            id: id.into(),
            code: code.into(),
            message: None,
            sender_fault,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl Correlated for BatchFailure {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Outcome of a batch call, or of a whole bulk operation.
///
/// For a bulk operation every submitted entry ends up in exactly one of the
/// two lists. `successful` is in completion order.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct BatchResult<S> {
    pub successful: Vec<S>,
    pub failed: Vec<BatchFailure>,
}

impl<S> BatchResult<S> {
    pub fn new(successful: Vec<S>, failed: Vec<BatchFailure>) -> Self {
        Self { successful, failed }
    }

    pub fn len(&self) -> usize {
        self.successful.len() + self.failed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.successful.is_empty() && self.failed.is_empty()
    }

    /// `true` when nothing ended up in `failed`.
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }
}

impl<S> Default for BatchResult<S> {
    fn default() -> Self {
        Self {
            successful: Vec::new(),
            failed: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_serializes_without_empty_optionals() {
        let message = Message::new("m-1", "rh-1", "hello");
        let json = serde_json::to_value(&message).unwrap();

        assert_eq!(json["message_id"], "m-1");
        assert_eq!(json["receipt_handle"], "rh-1");
        assert_eq!(json["body"], "hello");
        assert!(json.get("group_id").is_none());
        assert!(json.get("attributes").is_none());
    }

    #[test]
    fn delete_entry_carries_receipt_handle() {
        let message = Message::new("m-1", "rh-1", "hello");
        let entry = message.delete_entry("0");

        assert_eq!(entry, DeleteEntry::new("0", "rh-1"));
    }

    #[test]
    fn batch_result_counts_both_partitions() {
        let result = BatchResult::new(
            vec![DeleteSuccess { id: "a".into() }],
            vec![BatchFailure::new("b", "ReceiptHandleIsInvalid", true)],
        );

        assert_eq!(result.len(), 2);
        assert!(!result.is_empty());
        assert!(!result.is_complete_success());
        assert!(BatchResult::<DeleteSuccess>::default().is_empty());
    }
}
