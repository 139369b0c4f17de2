use std::future::Future;
use std::sync::Arc;

use relay_logging::relay_error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Runs `task` over every item with at most `concurrency` tasks in flight.
///
/// Results come back in completion order, each paired with the item that produced it.
/// An item whose task panicked is reported last with `None`. `on_done` is called on the
/// coordinating task as each result arrives.
pub async fn run_bounded<T, R, F, Fut>(
    items: Vec<T>,
    concurrency: usize,
    task: F,
    mut on_done: impl FnMut(&T, Option<&R>),
) -> Vec<(T, Option<R>)>
where
    T: Clone + Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Fut,
    Fut: Future<Output = R> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();

    for (slot, item) in items.iter().cloned().enumerate() {
        let semaphore = semaphore.clone();
        let work = task(item);
        tasks.spawn(async move {
            // Held until the task finishes; the semaphore is never closed.
            let _permit = semaphore.acquire_owned().await;
            (slot, work.await)
        });
    }

    let mut finished = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((slot, result)) => {
                finished[slot] = true;
                let item = items[slot].clone();
                on_done(&item, Some(&result));
                out.push((item, Some(result)));
            }
            Err(err) => relay_error!("worker task ended abnormally: {}", err),
        }
    }

    for (item, done) in items.into_iter().zip(finished) {
        if !done {
            on_done(&item, None);
            out.push((item, None));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn never_exceeds_concurrency_budget() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let results = run_bounded(
            (0..24).collect::<Vec<u32>>(),
            3,
            |n| {
                let in_flight = in_flight.clone();
                let peak = peak.clone();
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    n * 2
                }
            },
            |_, _| {},
        )
        .await;

        assert_eq!(results.len(), 24);
        assert!(peak.load(Ordering::SeqCst) <= 3);
        for (n, doubled) in results {
            assert_eq!(doubled, Some(n * 2));
        }
    }

    #[tokio::test]
    async fn panicked_task_keeps_its_item() {
        let results = run_bounded(
            vec![1u32, 2, 3],
            2,
            |n| async move {
                if n == 2 {
                    panic!("boom");
                }
                n
            },
            |_, _| {},
        )
        .await;

        assert_eq!(results.len(), 3);
        assert_eq!(results.last(), Some(&(2, None)));
    }
}
