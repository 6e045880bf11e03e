//! Amazon SQS implementation of [`QueueClient`] and client construction.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::{meta::region::RegionProviderChain, BehaviorVersion, Region, SdkConfig};
use aws_sdk_sqs as sqs;
use sqs::types::{
    BatchResultErrorEntry, DeleteMessageBatchRequestEntry, MessageSystemAttributeName,
    SendMessageBatchRequestEntry,
};

use crate::client::{QueueClient, ReceiveBatchRequest};
use crate::error::{BatchError, Result};
use crate::model::{
    BatchFailure, BatchResult, DeleteEntry, DeleteSuccess, Message, SendEntry, SendSuccess,
};

/// Loads an AWS SDK config from the environment.
///
/// `region` takes precedence over the default provider chain, which in turn
/// falls back to `us-east-1`. `endpoint_url` overrides the SQS endpoint, e.g.
/// to target LocalStack.
///
/// # Example
///
/// ```no_run
/// # async fn example() {
/// let config = sqs_batch::load_config(Some("http://localhost:4566"), None).await;
/// let coordinator = sqs_batch::BatchCoordinator::from_config(&config);
/// # }
/// ```
pub async fn load_config(endpoint_url: Option<&str>, region: Option<&str>) -> SdkConfig {
    let region = RegionProviderChain::first_try(region.map(|r| Region::new(r.to_owned())))
        .or_default_provider()
        .or_else(Region::from_static("us-east-1"));

    let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(region);
    if let Some(endpoint_url) = endpoint_url {
        loader = loader.endpoint_url(endpoint_url);
    }

    loader.load().await
}

#[async_trait]
impl QueueClient for sqs::Client {
    async fn receive_batch(&self, request: ReceiveBatchRequest<'_>) -> Result<Vec<Message>> {
        let options = request.options;
        let output = self
            .receive_message()
            .queue_url(request.queue_url)
            .max_number_of_messages(request.max_messages)
            .wait_time_seconds(request.wait_time_seconds)
            .set_receive_request_attempt_id(request.attempt_id)
            .set_visibility_timeout(options.visibility_timeout)
            .set_message_system_attribute_names(non_empty(&options.message_system_attribute_names))
            .set_message_attribute_names(non_empty(&options.message_attribute_names))
            .send()
            .await?;

        output
            .messages
            .unwrap_or_default()
            .into_iter()
            .map(message_from_sdk)
            .collect()
    }

    async fn send_batch(
        &self,
        queue_url: &str,
        entries: &[SendEntry],
    ) -> Result<BatchResult<SendSuccess>> {
        let entries = entries.iter().map(send_entry_to_sdk).collect::<Result<Vec<_>>>()?;

        let output = self
            .send_message_batch()
            .queue_url(queue_url)
            .set_entries(Some(entries))
            .send()
            .await?;

        let successful = output
            .successful
            .into_iter()
            .map(|entry| SendSuccess {
                id: entry.id,
                message_id: entry.message_id,
                md5_of_body: Some(entry.md5_of_message_body),
                sequence_number: entry.sequence_number,
            })
            .collect();
        let failed = output.failed.into_iter().map(failure_from_sdk).collect();

        Ok(BatchResult::new(successful, failed))
    }

    async fn delete_batch(
        &self,
        queue_url: &str,
        entries: &[DeleteEntry],
    ) -> Result<BatchResult<DeleteSuccess>> {
        let entries = entries.iter().map(delete_entry_to_sdk).collect::<Result<Vec<_>>>()?;

        let output = self
            .delete_message_batch()
            .queue_url(queue_url)
            .set_entries(Some(entries))
            .send()
            .await?;

        let successful = output
            .successful
            .into_iter()
            .map(|entry| DeleteSuccess { id: entry.id })
            .collect();
        let failed = output.failed.into_iter().map(failure_from_sdk).collect();

        Ok(BatchResult::new(successful, failed))
    }
}

fn non_empty<T: Clone>(values: &[T]) -> Option<Vec<T>> {
    (!values.is_empty()).then(|| values.to_vec())
}

fn send_entry_to_sdk(entry: &SendEntry) -> Result<SendMessageBatchRequestEntry> {
    SendMessageBatchRequestEntry::builder()
        .id(&entry.id)
        .message_body(&entry.body)
        .set_delay_seconds(entry.delay_seconds)
        .set_message_group_id(entry.group_id.clone())
        .set_message_deduplication_id(entry.deduplication_id.clone())
        .build()
        .map_err(|e| BatchError::InvalidEntry(e.to_string()))
}

fn delete_entry_to_sdk(entry: &DeleteEntry) -> Result<DeleteMessageBatchRequestEntry> {
    DeleteMessageBatchRequestEntry::builder()
        .id(&entry.id)
        .receipt_handle(&entry.receipt_handle)
        .build()
        .map_err(|e| BatchError::InvalidEntry(e.to_string()))
}

fn failure_from_sdk(entry: BatchResultErrorEntry) -> BatchFailure {
    BatchFailure {
        id: entry.id,
        code: entry.code,
        message: entry.message,
        sender_fault: entry.sender_fault,
    }
}

/// Converts an SDK message, rejecting messages SQS returned without an id or
/// receipt handle.
///
/// See the [SQS Message reference][api].
///
/// [api]: https://docs.aws.amazon.com/AWSSimpleQueueService/latest/APIReference/API_Message.html
fn message_from_sdk(message: sqs::types::Message) -> Result<Message> {
    let message_id = message
        .message_id
        .ok_or_else(|| BatchError::MalformedResponse("message without MessageId".into()))?;
    let receipt_handle = message.receipt_handle.ok_or_else(|| {
        BatchError::MalformedResponse(format!("message {message_id} without ReceiptHandle"))
    })?;

    let attributes: HashMap<String, String> = message
        .attributes
        .unwrap_or_default()
        .into_iter()
        .map(|(name, value)| (name.as_str().to_owned(), value))
        .collect();
    let group_id = attributes
        .get(MessageSystemAttributeName::MessageGroupId.as_str())
        .cloned();

    // binary attribute values are dropped
    let message_attributes = message
        .message_attributes
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(name, value)| value.string_value.map(|v| (name, v)))
        .collect();

    Ok(Message {
        message_id,
        receipt_handle,
        body: message.body.unwrap_or_default(),
        md5_of_body: message.md5_of_body,
        group_id,
        attributes,
        message_attributes,
    })
}
