//! Bounded-concurrency driver for fetch tasks.
//!
//! Tasks are pulled from the source iterator only when a slot frees up, so a
//! large batch is never materialised up front. All task futures are polled
//! cooperatively from the calling task; nothing is spawned.

use std::future::Future;
use std::pin::pin;

use futures::StreamExt;
use futures::stream;

use crate::models::{FetchOutcome, FetchTask};

/// Drain `tasks`, running at most `concurrency_limit` dispatched futures at a
/// time, and hand every completed outcome to `apply` as soon as it lands.
///
/// Returns the number of tasks that reached a terminal outcome, once the
/// iterator is exhausted and every dispatched future has finished.
pub async fn run<I, D, Fut, A>(
    tasks: I,
    concurrency_limit: usize,
    dispatch: D,
    mut apply: A,
) -> usize
where
    I: IntoIterator<Item = FetchTask>,
    D: FnMut(FetchTask) -> Fut,
    Fut: Future<Output = (FetchTask, FetchOutcome)>,
    A: FnMut(&FetchTask, &FetchOutcome),
{
    let mut completions = pin!(
        stream::iter(tasks)
            .map(dispatch)
            .buffer_unordered(concurrency_limit.max(1))
    );

    let mut completed = 0;
    while let Some((task, outcome)) = completions.next().await {
        apply(&task, &outcome);
        completed += 1;
    }
    completed
}
