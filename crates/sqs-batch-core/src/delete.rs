use crate::batch::dispatch_chunked;
use crate::client::QueueClient;
use crate::coordinator::BatchCoordinator;
use crate::error::Result;
use crate::model::{BatchResult, DeleteEntry, DeleteSuccess};

impl<C: QueueClient> BatchCoordinator<C> {
    /// Deletes any number of messages from `queue_url` by receipt handle.
    ///
    /// Works like [`send_many`](Self::send_many): ten entries per
    /// `DeleteMessageBatch` call, transient failures resubmitted in later
    /// calls, every entry settled exactly once. An expired or malformed
    /// receipt handle is the sender's fault and is reported in `failed`.
    pub async fn delete_many(
        &self,
        queue_url: &str,
        entries: Vec<DeleteEntry>,
    ) -> Result<BatchResult<DeleteSuccess>> {
        let requested = entries.len();
        let client = &self.client;

        let result = dispatch_chunked(entries, &self.retry, self.cancel.as_ref(), move |chunk| {
            async move { client.delete_batch(queue_url, &chunk).await }
        })
        .await?;

        log::info!(
            "deleted {} of {requested} messages from {queue_url} ({} failed)",
            result.successful.len(),
            result.failed.len()
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{FakeQueue, Outcome};
    use crate::{
        BatchCoordinator, BatchResult, DeleteEntry, DeleteSuccess, Message, QueueClient,
        ReceiveBatchRequest, ReceiveParams, Result, SendEntry, SendSuccess, CANCELLED_CODE,
    };
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    const URL: &str = "https://sqs.test/000000000000/delete";

    fn entries(count: usize) -> Vec<DeleteEntry> {
        (0..count)
            .map(|i| DeleteEntry::new(i.to_string(), format!("rh-{i}")))
            .collect()
    }

    #[tokio::test]
    async fn empty_input_makes_no_calls() {
        let fake = FakeQueue::default();
        let coordinator = BatchCoordinator::new(fake.clone());

        let result = coordinator.delete_many(URL, Vec::new()).await.unwrap();

        assert!(result.is_empty());
        assert!(fake.delete_calls().is_empty());
    }

    #[tokio::test]
    async fn chunks_in_input_order() {
        let fake = FakeQueue::default();
        let coordinator = BatchCoordinator::new(fake.clone());

        let result = coordinator.delete_many(URL, entries(27)).await.unwrap();

        let calls = fake.delete_calls();
        let sizes: Vec<usize> = calls.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![10, 10, 7]);
        assert_eq!(calls[2][0].id, "20");

        let order: Vec<String> = result.successful.into_iter().map(|s| s.id).collect();
        let expected: Vec<String> = (0..27).map(|i| i.to_string()).collect();
        assert_eq!(order, expected);
    }

    #[tokio::test]
    async fn invalid_receipt_handles_fail_without_retry() {
        let fake = FakeQueue::default();
        fake.script("2", &[Outcome::Permanent]);
        fake.script("4", &[Outcome::Permanent]);
        let coordinator = BatchCoordinator::new(fake.clone());

        let result = coordinator.delete_many(URL, entries(6)).await.unwrap();

        assert_eq!(fake.delete_calls().len(), 1);
        assert_eq!(result.successful.len(), 4);
        let failed: Vec<&str> = result.failed.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(failed, vec!["2", "4"]);
    }

    #[tokio::test]
    async fn transient_and_unanswered_entries_are_retried() {
        let fake = FakeQueue::default();
        fake.script("1", &[Outcome::Transient, Outcome::Transient]);
        fake.script("12", &[Outcome::Unanswered]);
        let coordinator = BatchCoordinator::new(fake.clone());

        let result = coordinator.delete_many(URL, entries(15)).await.unwrap();

        let calls: Vec<Vec<String>> = fake
            .delete_calls()
            .into_iter()
            .map(|call| call.into_iter().map(|e| e.id).collect())
            .collect();
        // second call: the five untried entries first, then the retried one
        assert_eq!(calls[1], vec!["10", "11", "12", "13", "14", "1"]);
        assert_eq!(calls[2], vec!["1", "12"]);
        assert_eq!(calls.len(), 3);
        assert_eq!(result.successful.len(), 15);
        assert!(result.failed.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn acknowledges_received_messages() {
        let fake = FakeQueue::with_messages(14);
        let coordinator = BatchCoordinator::new(fake.clone());

        let received = coordinator
            .receive(URL, ReceiveParams::new(14, Duration::from_secs(5)))
            .await
            .unwrap();
        let acks = received
            .iter()
            .enumerate()
            .map(|(i, m)| m.delete_entry(i.to_string()))
            .collect();
        let result = coordinator.delete_many(URL, acks).await.unwrap();

        assert_eq!(result.successful.len(), 14);
        assert_eq!(fake.delete_calls().len(), 2);
    }

    #[tokio::test]
    async fn cancelled_before_start_makes_no_calls() {
        let fake = FakeQueue::default();
        let token = CancellationToken::new();
        token.cancel();
        let coordinator = BatchCoordinator::new(fake.clone()).with_cancellation(token);

        let result = coordinator.delete_many(URL, entries(3)).await.unwrap();

        assert!(fake.delete_calls().is_empty());
        assert!(result.successful.is_empty());
        let unsent: Vec<&str> = result.failed.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(unsent, vec!["0", "1", "2"]);
        assert!(result.failed.iter().all(|f| f.code == CANCELLED_CODE));
    }

    #[tokio::test]
    async fn cancelled_midway_reports_acknowledged_handles() {
        let fake = FakeQueue::default();
        let token = CancellationToken::new();
        let coordinator = BatchCoordinator::new(CancelAfterFirstCall {
            inner: fake.clone(),
            token: token.clone(),
        })
        .with_cancellation(token);

        let result = coordinator.delete_many(URL, entries(14)).await.unwrap();

        assert_eq!(fake.delete_calls().len(), 1);
        assert_eq!(result.successful.len(), 10);
        assert_eq!(result.failed.len(), 4);
        assert_eq!(result.failed[0].id, "10");
    }

    /// Cancels `token` once the first delete call has been answered.
    struct CancelAfterFirstCall {
        inner: FakeQueue,
        token: CancellationToken,
    }

    #[async_trait]
    impl QueueClient for CancelAfterFirstCall {
        async fn receive_batch(&self, request: ReceiveBatchRequest<'_>) -> Result<Vec<Message>> {
            self.inner.receive_batch(request).await
        }

        async fn send_batch(
            &self,
            queue_url: &str,
            entries: &[SendEntry],
        ) -> Result<BatchResult<SendSuccess>> {
            self.inner.send_batch(queue_url, entries).await
        }

        async fn delete_batch(
            &self,
            queue_url: &str,
            entries: &[DeleteEntry],
        ) -> Result<BatchResult<DeleteSuccess>> {
            let result = self.inner.delete_batch(queue_url, entries).await;
            self.token.cancel();
            result
        }
    }
}
