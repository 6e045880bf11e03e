//! Chunked dispatch shared by bulk send and bulk delete.
//!
//! Entries are submitted in chunks of at most ten, in input order. Entries
//! SQS rejects as the sender's fault are final. All other failures are
//! requeued behind the entries not yet attempted, so a retry never delays
//! the first attempt of a later entry. Entries still queued when the
//! operation is cancelled are reported as failed with [`CANCELLED_CODE`].

use std::collections::VecDeque;
use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::client::MAX_BATCH_SIZE;
use crate::error::Result;
use crate::model::{BatchFailure, BatchResult, Correlated};
use crate::retry::RetryPolicy;

/// Failure code reported for entries the service never answered for.
pub const NO_RESPONSE_CODE: &str = "NoResponse";

/// Failure code reported for entries not sent because the operation was cancelled.
pub const CANCELLED_CODE: &str = "Cancelled";

#[derive(Debug)]
struct Pending<E> {
    entry: E,
    attempts: u32,
}

/// Submits `entries` through `call` until every entry is settled.
///
/// `call` performs one remote batch call with at most [`MAX_BATCH_SIZE`]
/// entries. A failing call aborts the operation. Cancellation does not: the
/// entries settled so far are returned along with the unsent ones.
pub(crate) async fn dispatch_chunked<E, S, F, Fut>(
    entries: Vec<E>,
    retry: &RetryPolicy,
    cancel: Option<&CancellationToken>,
    mut call: F,
) -> Result<BatchResult<S>>
where
    E: Correlated + Clone,
    S: Correlated,
    F: FnMut(Vec<E>) -> Fut,
    Fut: Future<Output = Result<BatchResult<S>>>,
{
    let total = entries.len();
    let mut pending: VecDeque<Pending<E>> = entries
        .into_iter()
        .map(|entry| Pending { entry, attempts: 0 })
        .collect();
    let mut result = BatchResult::default();
    let mut rounds = 0usize;

    while !pending.is_empty() {
        if cancel.is_some_and(CancellationToken::is_cancelled) {
            log::warn!(
                "cancelled after {rounds} batch calls with {} entries unsent",
                pending.len()
            );
            result.failed.extend(pending.drain(..).map(|p| {
                BatchFailure::new(p.entry.id(), CANCELLED_CODE, false)
                    .with_message("operation cancelled before the entry was sent")
            }));
            break;
        }

        let chunk = next_chunk(&mut pending);
        rounds += 1;

        let retried = chunk.iter().map(|p| p.attempts).max().unwrap_or(0);
        let delay = retry.delay_for(retried);
        if !delay.is_zero() {
            log::debug!("round {rounds}: backing off {delay:?} before retrying");
            tokio::time::sleep(delay).await;
        }

        let request = chunk.iter().map(|p| p.entry.clone()).collect();
        let response = call(request).await?;

        let requeue = settle(chunk, response, retry, &mut result);
        if !requeue.is_empty() {
            log::warn!(
                "round {rounds}: requeueing {} transiently failed entries",
                requeue.len()
            );
        }
        pending.extend(requeue);
    }

    log::debug!(
        "settled {total} entries in {rounds} batch calls ({} successful, {} failed)",
        result.successful.len(),
        result.failed.len()
    );

    Ok(result)
}

/// Takes the next chunk off the front of `pending`.
///
/// SQS rejects a batch whose entries share an id, so an entry whose id is
/// already in the chunk stays queued, ahead of everything behind it.
fn next_chunk<E: Correlated>(pending: &mut VecDeque<Pending<E>>) -> Vec<Pending<E>> {
    let mut chunk: Vec<Pending<E>> = Vec::with_capacity(MAX_BATCH_SIZE);
    let mut deferred = Vec::new();

    while chunk.len() < MAX_BATCH_SIZE {
        let Some(next) = pending.pop_front() else {
            break;
        };
        if chunk.iter().any(|p| p.entry.id() == next.entry.id()) {
            deferred.push(next);
        } else {
            chunk.push(next);
        }
    }

    for entry in deferred.into_iter().rev() {
        pending.push_front(entry);
    }

    chunk
}

/// Moves every entry of `chunk` into `result` or into the returned requeue list.
fn settle<E: Correlated, S: Correlated>(
    chunk: Vec<Pending<E>>,
    response: BatchResult<S>,
    retry: &RetryPolicy,
    result: &mut BatchResult<S>,
) -> Vec<Pending<E>> {
    let mut slots: Vec<Option<Pending<E>>> = chunk.into_iter().map(Some).collect();
    let mut requeue = Vec::new();

    for success in response.successful {
        if take_slot(&mut slots, success.id()).is_some() {
            result.successful.push(success);
        } else {
            log::warn!("ignoring success for unknown entry {}", success.id());
        }
    }

    for failure in response.failed {
        let Some(mut pending) = take_slot(&mut slots, failure.id()) else {
            log::warn!("ignoring failure for unknown entry {}", failure.id());
            continue;
        };

        if failure.sender_fault {
            result.failed.push(failure);
            continue;
        }

        pending.attempts += 1;
        if retry.gives_up_after(pending.attempts) {
            log::warn!(
                "giving up on entry {} after {} attempts: {}",
                failure.id,
                pending.attempts,
                failure.code
            );
            result.failed.push(failure);
        } else {
            log::debug!("entry {} failed transiently: {}", failure.id, failure.code);
            requeue.push(pending);
        }
    }

    for mut pending in slots.into_iter().flatten() {
        let id = pending.entry.id().to_owned();
        log::warn!("entry {id} missing from batch response");

        pending.attempts += 1;
        if retry.gives_up_after(pending.attempts) {
            result.failed.push(
                BatchFailure::new(id, NO_RESPONSE_CODE, false)
                    .with_message("entry missing from batch response"),
            );
        } else {
            requeue.push(pending);
        }
    }

    requeue
}

fn take_slot<E: Correlated>(slots: &mut [Option<Pending<E>>], id: &str) -> Option<Pending<E>> {
    slots
        .iter_mut()
        .find(|slot| slot.as_ref().is_some_and(|p| p.entry.id() == id))
        .and_then(Option::take)
}
