//! In-memory queue used by the unit tests.
//!
//! `FakeQueue` behaves like a single SQS queue: receives drain the messages it
//! holds (or long-poll on tokio's clock when it is empty), successful sends
//! enqueue new messages, and every call is recorded. Individual entries can be
//! scripted to fail, and whole calls can be made to fail.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::client::{QueueClient, ReceiveBatchRequest, MAX_BATCH_SIZE};
use crate::error::{BatchError, Result};
use crate::model::{
    BatchFailure, BatchResult, Correlated, DeleteEntry, DeleteSuccess, Message, SendEntry,
    SendSuccess,
};
use crate::receive::ReceiveOptions;

/// Scripted outcome for one attempt of one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// `sender_fault = false`
    Transient,
    /// `sender_fault = true`
    Permanent,
    /// Left out of the response entirely
    Unanswered,
}

/// A recorded `receive_batch` call.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiveCall {
    pub queue_url: String,
    pub max_messages: i32,
    pub wait_time_seconds: i32,
    pub attempt_id: Option<String>,
    pub options: ReceiveOptions,
}

#[derive(Default)]
struct State {
    available: VecDeque<Message>,
    next_message: usize,
    receive_calls: Vec<ReceiveCall>,
    send_calls: Vec<Vec<SendEntry>>,
    delete_calls: Vec<Vec<DeleteEntry>>,
    scripted: HashMap<String, VecDeque<Outcome>>,
    fail_receive_call: Option<usize>,
    fail_batch_call: Option<usize>,
}

impl State {
    fn push_message(&mut self, body: String) -> Message {
        let n = self.next_message;
        self.next_message += 1;
        let message = Message::new(format!("m-{n}"), format!("rh-{n}"), body);
        self.available.push_back(message.clone());
        message
    }

    fn next_outcome(&mut self, id: &str) -> Option<Outcome> {
        self.scripted.get_mut(id).and_then(VecDeque::pop_front)
    }

    fn batch_calls(&self) -> usize {
        self.send_calls.len() + self.delete_calls.len()
    }
}

#[derive(Clone, Default)]
pub struct FakeQueue {
    state: Arc<Mutex<State>>,
}

impl FakeQueue {
    /// A queue holding `count` messages with bodies `body-0`, `body-1`, ...
    pub fn with_messages(count: usize) -> Self {
        let fake = Self::default();
        {
            let mut state = fake.lock();
            for i in 0..count {
                state.push_message(format!("body-{i}"));
            }
        }
        fake
    }

    /// The next `outcomes.len()` attempts of entry `id` fail as scripted; later attempts succeed.
    pub fn script(&self, id: &str, outcomes: &[Outcome]) {
        self.lock()
            .scripted
            .entry(id.to_owned())
            .or_default()
            .extend(outcomes.iter().copied());
    }

    /// Fails the `n`th receive call (1-based) as a whole.
    pub fn fail_receive_call(&self, n: usize) {
        self.lock().fail_receive_call = Some(n);
    }

    /// Fails the `n`th send or delete call (1-based) as a whole.
    pub fn fail_batch_call(&self, n: usize) {
        self.lock().fail_batch_call = Some(n);
    }

    pub fn available(&self) -> usize {
        self.lock().available.len()
    }

    pub fn receive_calls(&self) -> Vec<ReceiveCall> {
        self.lock().receive_calls.clone()
    }

    pub fn send_calls(&self) -> Vec<Vec<SendEntry>> {
        self.lock().send_calls.clone()
    }

    pub fn delete_calls(&self) -> Vec<Vec<DeleteEntry>> {
        self.lock().delete_calls.clone()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }
}

/// Mirrors the request validation SQS applies to batch calls.
fn validate_batch<E: Correlated>(entries: &[E]) -> Result<()> {
    if entries.is_empty() {
        return Err(BatchError::Client("EmptyBatchRequest".into()));
    }
    if entries.len() > MAX_BATCH_SIZE {
        return Err(BatchError::Client("TooManyEntriesInBatchRequest".into()));
    }
    let mut ids = HashSet::new();
    if !entries.iter().all(|e| ids.insert(e.id())) {
        return Err(BatchError::Client("BatchEntryIdsNotDistinct".into()));
    }
    Ok(())
}

fn respond<E: Correlated, S>(
    state: &mut State,
    entries: &[E],
    mut succeed: impl FnMut(&mut State, &E) -> S,
) -> BatchResult<S> {
    let mut result = BatchResult::default();
    for entry in entries {
        match state.next_outcome(entry.id()) {
            None => {
                let success = succeed(state, entry);
                result.successful.push(success);
            }
            Some(Outcome::Transient) => result.failed.push(
                BatchFailure::new(entry.id(), "InternalError", false)
                    .with_message("internal failure"),
            ),
            Some(Outcome::Permanent) => result.failed.push(
                BatchFailure::new(entry.id(), "InvalidParameterValue", true)
                    .with_message("invalid entry"),
            ),
            Some(Outcome::Unanswered) => {}
        }
    }
    result
}

#[async_trait]
impl QueueClient for FakeQueue {
    async fn receive_batch(&self, request: ReceiveBatchRequest<'_>) -> Result<Vec<Message>> {
        let wait = {
            let mut state = self.lock();
            state.receive_calls.push(ReceiveCall {
                queue_url: request.queue_url.to_owned(),
                max_messages: request.max_messages,
                wait_time_seconds: request.wait_time_seconds,
                attempt_id: request.attempt_id.clone(),
                options: request.options.clone(),
            });

            if state.fail_receive_call == Some(state.receive_calls.len()) {
                return Err(BatchError::Client("OverLimit".into()));
            }

            if !state.available.is_empty() {
                let count = (request.max_messages.max(0) as usize).min(state.available.len());
                return Ok(state.available.drain(..count).collect());
            }

            Duration::from_secs(request.wait_time_seconds.max(0) as u64)
        };

        tokio::time::sleep(wait).await;
        Ok(Vec::new())
    }

    async fn send_batch(
        &self,
        _queue_url: &str,
        entries: &[SendEntry],
    ) -> Result<BatchResult<SendSuccess>> {
        let mut state = self.lock();
        state.send_calls.push(entries.to_vec());
        if state.fail_batch_call == Some(state.batch_calls()) {
            return Err(BatchError::Client("ServiceUnavailable".into()));
        }
        validate_batch(entries)?;

        Ok(respond(&mut state, entries, |state, entry| {
            let message = state.push_message(entry.body.clone());
            SendSuccess {
                id: entry.id.clone(),
                message_id: message.message_id,
                md5_of_body: None,
                sequence_number: None,
            }
        }))
    }

    async fn delete_batch(
        &self,
        _queue_url: &str,
        entries: &[DeleteEntry],
    ) -> Result<BatchResult<DeleteSuccess>> {
        let mut state = self.lock();
        state.delete_calls.push(entries.to_vec());
        if state.fail_batch_call == Some(state.batch_calls()) {
            return Err(BatchError::Client("ServiceUnavailable".into()));
        }
        validate_batch(entries)?;

        Ok(respond(&mut state, entries, |state, entry| {
            state
                .available
                .retain(|m| m.receipt_handle != entry.receipt_handle);
            DeleteSuccess {
                id: entry.id.clone(),
            }
        }))
    }
}
