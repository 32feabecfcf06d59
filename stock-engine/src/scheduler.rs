//! Bounded-concurrency batch runner
//!
//! Runs a list of independent async tasks with at most `limit` in
//! flight. Admission follows list order and is greedy: whenever ANY
//! running task finishes, the next queued one starts immediately — a
//! slow task never holds a slot hostage for its faster siblings.
//! Tasks are tagged with their index and outcomes scattered back into
//! a pre-sized vector, so the output has the same length and
//! index-to-task correspondence as the input, regardless of
//! completion order; a task's own failure is one `Err` slot, never a
//! reason to abort its siblings.
//!
//! There is deliberately no cancellation or timeout here. A caller
//! that wants to abandon a batch has to wait for it to drain — the
//! remote stores offer no way to revoke a request already in flight.

use futures::stream::{self, StreamExt};
use std::future::Future;

/// Run `tasks` with at most `limit` concurrently in flight.
///
/// A `limit` of 0 is treated as 1; an empty batch yields an empty
/// vector.
pub async fn run_bounded<T, E, F>(tasks: Vec<F>, limit: usize) -> Vec<Result<T, E>>
where
    F: Future<Output = Result<T, E>>,
{
    let limit = limit.max(1);
    let total = tasks.len();

    let mut outcomes: Vec<Option<Result<T, E>>> = Vec::with_capacity(total);
    outcomes.resize_with(total, || None);

    let mut running = stream::iter(
        tasks
            .into_iter()
            .enumerate()
            .map(|(index, task)| async move { (index, task.await) }),
    )
    .buffer_unordered(limit);

    while let Some((index, outcome)) = running.next().await {
        outcomes[index] = Some(outcome);
    }

    // every index was filled exactly once
    outcomes.into_iter().flatten().collect()
}
