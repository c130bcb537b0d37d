//! Bounded-concurrency execution over an ordered list of inputs.
//!
//! [`run_bounded`] starts `min(limit, inputs.len())` workers. Workers pull
//! the next index from a shared cursor and store each result into the slot
//! with the same index, so output order always matches input order no
//! matter when tasks complete.
//!
//! The run is all-or-nothing. The first failure sets a stop flag: workers
//! let their in-flight task finish but launch nothing new, and the caller
//! receives that first error while any successful results are dropped.
//!
//! All workers are polled by the caller's task, so tasks may borrow from
//! the caller and no `'static` bound is needed.

use futures::future::join_all;
use std::future::Future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::{debug, trace};

/// Run `task` over every input with at most `limit` tasks in flight.
///
/// A `limit` of 0 is treated as 1.
pub async fn run_bounded<'a, I, T, E, F, Fut>(
    inputs: &'a [I],
    limit: usize,
    task: F,
) -> Result<Vec<T>, E>
where
    F: Fn(&'a I) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let total = inputs.len();
    if total == 0 {
        return Ok(Vec::new());
    }

    let workers = limit.max(1).min(total);
    debug!(total, workers, "Starting bounded run");

    let cursor = AtomicUsize::new(0);
    let stop = AtomicBool::new(false);
    let slots: Mutex<Vec<Option<T>>> = Mutex::new((0..total).map(|_| None).collect());
    let first_error: Mutex<Option<E>> = Mutex::new(None);

    let worker = |worker_id: usize| {
        let (cursor, stop, slots, first_error, task) = (&cursor, &stop, &slots, &first_error, &task);
        async move {
            loop {
                if stop.load(Ordering::SeqCst) {
                    trace!(worker_id, "Stop flag set, worker exiting");
                    break;
                }
                let index = cursor.fetch_add(1, Ordering::SeqCst);
                if index >= total {
                    break;
                }

                trace!(worker_id, index, "Launching task");
                match task(&inputs[index]).await {
                    Ok(value) => {
                        lock(slots)[index] = Some(value);
                    }
                    Err(err) => {
                        stop.store(true, Ordering::SeqCst);
                        let mut first = lock(first_error);
                        if first.is_none() {
                            debug!(worker_id, index, "Task failed, no further launches");
                            *first = Some(err);
                        }
                    }
                }
            }
        }
    };

    join_all((0..workers).map(worker)).await;

    if let Some(err) = into_inner(first_error) {
        return Err(err);
    }

    // Every index was claimed and succeeded, so every slot is filled
    Ok(into_inner(slots).into_iter().flatten().collect())
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn into_inner<T>(mutex: Mutex<T>) -> T {
    mutex
        .into_inner()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
