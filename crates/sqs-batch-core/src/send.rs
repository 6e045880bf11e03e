use crate::batch::dispatch_chunked;
use crate::client::QueueClient;
use crate::coordinator::BatchCoordinator;
use crate::error::Result;
use crate::model::{BatchResult, SendEntry, SendSuccess};

impl<C: QueueClient> BatchCoordinator<C> {
    /// Sends any number of messages to `queue_url`.
    ///
    /// Entries are submitted through `SendMessageBatch` ten at a time. Entries
    /// that fail through no fault of the sender are resubmitted in a later
    /// batch according to the coordinator's [`RetryPolicy`](crate::RetryPolicy).
    /// Every entry ends up in exactly one of `successful` or `failed`.
    ///
    /// Correlation ids only need to be unique within one batch call; entries
    /// sharing an id are never placed in the same call.
    ///
    /// # Errors
    ///
    /// Fails as soon as a whole `SendMessageBatch` call fails. Entries sent
    /// before that are not reported.
    ///
    /// Once the coordinator is cancelled no further calls are made; entries
    /// not yet sent are reported in `failed` with code
    /// [`CANCELLED_CODE`](crate::CANCELLED_CODE), next to everything settled
    /// before.
    pub async fn send_many(
        &self,
        queue_url: &str,
        entries: Vec<SendEntry>,
    ) -> Result<BatchResult<SendSuccess>> {
        let requested = entries.len();
        let client = &self.client;

        let result = dispatch_chunked(entries, &self.retry, self.cancel.as_ref(), move |chunk| {
            async move { client.send_batch(queue_url, &chunk).await }
        })
        .await?;

        log::info!(
            "sent {} of {requested} messages to {queue_url} ({} failed)",
            result.successful.len(),
            result.failed.len()
        );

        Ok(result)
    }
}
