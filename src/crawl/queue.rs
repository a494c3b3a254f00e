// src/crawl/queue.rs
//! Bounded-concurrency task queue with dynamic termination detection.
//!
//! Tasks may enqueue further tasks while running, so "the queue looks
//! empty" is not the same as "the queue is finished" — a sibling still in
//! flight may be about to produce more work. Completion is therefore
//! inferred from two triggers: an explicit close (budget reached, or the
//! caller declaring no more enqueues) once everything drains, or a quiet
//! timeout elapsing after the last settlement with nothing pending or in
//! flight.
//!
//! The scheduler is a single coordinating task; every piece of shared
//! bookkeeping lives under one lock, so admission and termination
//! decisions are made against a consistent snapshot.

use crate::error::CrawlError;
use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

/// Shared queue bookkeeping. Mutated only under the queue's lock.
struct QueueState<T> {
    pending: VecDeque<BoxFuture<'static, T>>,
    in_flight: usize,
    /// Settlements recorded by the queue itself.
    settled: u64,
    /// Successes reported by the caller via [`TaskQueue::report_accepted`].
    accepted: u64,
    /// No further enqueues will be honored.
    closed: bool,
    /// The completion signal has fired.
    completed: bool,
    outputs: Vec<T>,
    /// Clock for the quiet timeout; starts at queue creation so a queue
    /// that never receives work still terminates.
    last_settled_at: Instant,
}

/// Executor for deferred units of work, generic over the task output.
///
/// At most `max_concurrent` tasks run at once; an optional total cap on
/// externally reported successes shuts the queue down early; completion
/// fires at most once per queue instance.
pub struct TaskQueue<T> {
    state: Mutex<QueueState<T>>,
    /// Wakes the scheduler after enqueues, settlements and counter updates.
    wake: Notify,
    /// Broadcast once when completion fires.
    done: Notify,
    max_concurrent: usize,
    total_cap: Option<u64>,
    quiet_timeout: Duration,
}

impl<T: Send + 'static> TaskQueue<T> {
    /// Creates the queue and spawns its scheduler.
    ///
    /// A `total_cap` of `None` means unbounded. Fails for a zero
    /// concurrency limit.
    pub fn new(
        max_concurrent: usize,
        total_cap: Option<u64>,
        quiet_timeout: Duration,
    ) -> Result<Arc<Self>, CrawlError> {
        if max_concurrent == 0 {
            return Err(CrawlError::Configuration(
                "max_concurrent_request must be bigger than 0".to_string(),
            ));
        }

        let queue = Arc::new(Self {
            state: Mutex::new(QueueState {
                pending: VecDeque::new(),
                in_flight: 0,
                settled: 0,
                accepted: 0,
                closed: false,
                completed: false,
                outputs: Vec::new(),
                last_settled_at: Instant::now(),
            }),
            wake: Notify::new(),
            done: Notify::new(),
            max_concurrent,
            total_cap,
            quiet_timeout,
        });

        tokio::spawn(Arc::clone(&queue).run_scheduler());
        Ok(queue)
    }

    /// Appends a task to pending work. No-op once the queue is closed.
    pub fn enqueue<F>(&self, task: F)
    where
        F: Future<Output = T> + Send + 'static,
    {
        {
            let mut state = self.state.lock();
            if state.closed {
                return;
            }
            state.pending.push_back(task.boxed());
        }
        self.wake.notify_one();
    }

    /// Declares that no further `enqueue` calls will happen.
    ///
    /// Completion can then fire as soon as the queue drains, without
    /// waiting out the quiet period.
    pub fn mark_no_more_enqueues(&self) {
        self.state.lock().closed = true;
        self.wake.notify_one();
    }

    /// Advances the externally tracked success counter.
    ///
    /// One settled task can accept several units of follow-up work whose
    /// admission must be visible to the budget check before scheduling
    /// proceeds, which is why this counter is driven by the caller rather
    /// than derived from settlements.
    pub fn report_accepted(&self, n: u64) {
        if n == 0 {
            return;
        }
        self.state.lock().accepted += n;
        self.wake.notify_one();
    }

    /// Resolves once the queue judges itself finished.
    ///
    /// Any number of callers may wait; completion fires at most once per
    /// queue instance, and late callers return immediately.
    pub async fn completed(&self) {
        loop {
            let done = self.done.notified();
            if self.state.lock().completed {
                return;
            }
            done.await;
        }
    }

    /// Drains the recorded task outputs. Meaningful once [`completed`]
    /// has resolved.
    ///
    /// [`completed`]: TaskQueue::completed
    pub fn take_outputs(&self) -> Vec<T> {
        std::mem::take(&mut self.state.lock().outputs)
    }

    async fn run_scheduler(self: Arc<Self>) {
        loop {
            let wake = self.wake.notified();
            let Some(deadline) = Self::tick(&self) else {
                break;
            };
            tokio::select! {
                _ = wake => {}
                _ = tokio::time::sleep_until(deadline) => {}
            }
        }
    }

    /// One scheduling pass. Returns the next recheck deadline, or `None`
    /// once completion has fired.
    fn tick(queue: &Arc<Self>) -> Option<Instant> {
        let mut state = queue.state.lock();
        if state.completed {
            return None;
        }

        // Let the caller's bookkeeping catch up before making admission
        // decisions: a settled task may still be registering the work it
        // accepted.
        let lagging = state.accepted != 0 && state.settled != 0 && state.accepted < state.settled;

        if !lagging {
            if let Some(cap) = queue.total_cap {
                if state.accepted >= cap {
                    log::debug!(
                        "queue reached its cap of {} accepted tasks; dropping {} pending",
                        cap,
                        state.pending.len()
                    );
                    state.pending.clear();
                    state.closed = true;
                    return queue.fire(&mut state);
                }
            }

            while state.in_flight < queue.max_concurrent {
                let Some(task) = state.pending.pop_front() else {
                    break;
                };
                state.in_flight += 1;
                let worker_queue = Arc::clone(queue);
                tokio::spawn(async move {
                    let output = task.await;
                    worker_queue.settle(output);
                });
            }

            log::debug!(
                "queue tick: {} in flight / {} pending / {} settled / {} accepted",
                state.in_flight,
                state.pending.len(),
                state.settled,
                state.accepted
            );

            let drained = state.in_flight == 0 && state.pending.is_empty();
            if drained
                && (state.closed || state.last_settled_at.elapsed() >= queue.quiet_timeout)
            {
                return queue.fire(&mut state);
            }
        }

        // Recheck when the quiet period expires. If it already has (but
        // completion is blocked on in-flight work or lagging bookkeeping),
        // fall back to a periodic recheck one quiet period out; the
        // settlement that unblocks us will wake the scheduler sooner.
        let target = state.last_settled_at + queue.quiet_timeout;
        let now = Instant::now();
        Some(if target > now {
            target
        } else {
            now + queue.quiet_timeout
        })
    }

    fn settle(&self, output: T) {
        {
            let mut state = self.state.lock();
            state.in_flight -= 1;
            state.settled += 1;
            state.outputs.push(output);
            state.last_settled_at = Instant::now();
        }
        self.wake.notify_one();
    }

    fn fire(&self, state: &mut QueueState<T>) -> Option<Instant> {
        state.completed = true;
        state.closed = true;
        self.done.notify_waiters();
        None
    }
}
