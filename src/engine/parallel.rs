// src/engine/parallel.rs
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{FlowError, FlowResult, TaskError};
use super::task::{Completion, Task};
use super::validate;

/// Run `tasks` with at most `limit` of them in flight at any moment.
///
/// `None` (or any limit covering every task) starts all tasks before a single
/// outcome is looked at. Results are returned in submission order. The first
/// failure is returned as soon as it is observed; tasks that are already
/// running are left to finish on their own and their outcomes are discarded.
/// Under a real cap, tasks still waiting for a slot are never started.
pub async fn parallel<T>(tasks: Vec<Task<T>>, limit: Option<usize>) -> FlowResult<Vec<T>>
where
    T: Send + 'static,
{
    validate::check_collection(Some(tasks.as_slice()), true, |_| true)?;
    let limit = validate::check_limit(limit, tasks.len())?;

    BoundedScheduler::new(tasks, limit).run().await
}

type Outcome<T> = (usize, Result<T, TaskError>);

/// Per-invocation admission state
pub(crate) struct BoundedScheduler<T> {
    run_id: Uuid,
    limit: usize,
    slots: Arc<Semaphore>,
    pending: VecDeque<(usize, Task<T>)>,
    results: Vec<Option<T>>,
    outstanding: usize,
}

impl<T> BoundedScheduler<T>
where
    T: Send + 'static,
{
    pub(crate) fn new(tasks: Vec<Task<T>>, limit: usize) -> Self {
        let total = tasks.len();
        // More permits than tasks would never be used
        let limit = limit.clamp(1, total.max(1));

        Self {
            run_id: Uuid::new_v4(),
            limit,
            slots: Arc::new(Semaphore::new(limit)),
            pending: tasks.into_iter().enumerate().collect(),
            results: (0..total).map(|_| None).collect(),
            outstanding: total,
        }
    }

    /// Number of admitted tasks that have not completed yet
    fn running(&self) -> usize {
        self.limit - self.slots.available_permits()
    }

    pub(crate) async fn run(mut self) -> FlowResult<Vec<T>> {
        info!(
            "Parallel run {} with {} tasks, limit {}",
            self.run_id, self.outstanding, self.limit
        );

        let (tx, mut rx) = mpsc::unbounded_channel::<Outcome<T>>();

        // Uncapped: nothing ever waits on a slot, so an early failure must not
        // keep later tasks from starting
        if self.limit >= self.pending.len() {
            while !self.pending.is_empty() {
                let permit = self
                    .slots
                    .clone()
                    .try_acquire_owned()
                    .map_err(|_| FlowError::Internal("no free slot in an uncapped run".to_string()))?;
                self.admit(permit, &tx);
            }
        }

        while self.outstanding > 0 {
            tokio::select! {
                biased;

                Some((index, outcome)) = rx.recv() => {
                    self.record(index, outcome)?;
                }

                permit = self.slots.clone().acquire_owned(), if !self.pending.is_empty() => {
                    let permit = permit
                        .map_err(|_| FlowError::Internal("admission semaphore closed".to_string()))?;
                    self.admit(permit, &tx);
                }

                else => {
                    return Err(FlowError::Internal("outcome channel closed".to_string()));
                }
            }
        }

        debug!("Parallel run {} finished", self.run_id);
        self.results
            .into_iter()
            .collect::<Option<Vec<T>>>()
            .ok_or_else(|| FlowError::Internal("result slot left empty".to_string()))
    }

    fn admit(&mut self, permit: OwnedSemaphorePermit, tx: &mpsc::UnboundedSender<Outcome<T>>) {
        let Some((index, task)) = self.pending.pop_front() else {
            return;
        };

        debug!(
            "Parallel run {}: admitting task {} ({} running)",
            self.run_id,
            index,
            self.running()
        );

        let tx = tx.clone();
        task(Completion::new(move |outcome| {
            // The slot frees up only once the outcome is queued
            let _ = tx.send((index, outcome));
            drop(permit);
        }));
    }

    fn record(&mut self, index: usize, outcome: Result<T, TaskError>) -> FlowResult<()> {
        match outcome {
            Ok(value) => {
                self.results[index] = Some(value);
                self.outstanding -= 1;
                debug!(
                    "Parallel run {}: task {} succeeded, {} outstanding",
                    self.run_id, index, self.outstanding
                );
                Ok(())
            }
            Err(source) => {
                warn!(
                    "Parallel run {}: task {} failed, abandoning {} pending: {}",
                    self.run_id,
                    index,
                    self.pending.len(),
                    source
                );
                Err(FlowError::Task { index, source })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::task::task;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::Instant;

    /// Tracks how many tasks run at once
    #[derive(Default)]
    struct Gauge {
        running: AtomicUsize,
        peak: AtomicUsize,
        started: AtomicUsize,
    }

    impl Gauge {
        fn enter(&self) {
            self.started.fetch_add(1, Ordering::SeqCst);
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
        }

        fn leave(&self) {
            self.running.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn sleeper(gauge: Arc<Gauge>, millis: u64, value: u64) -> Task<u64> {
        task(move |done| {
            gauge.enter();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(millis)).await;
                gauge.leave();
                done.succeed(value);
            });
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_limit_one_runs_back_to_back() {
        let gauge = Arc::new(Gauge::default());
        let tasks = (0..3).map(|i| sleeper(gauge.clone(), 100, i)).collect();

        let start = Instant::now();
        let results = parallel(tasks, Some(1)).await.unwrap();
        let elapsed = start.elapsed();

        assert_eq!(results, vec![0, 1, 2]);
        assert_eq!(gauge.peak.load(Ordering::SeqCst), 1);
        assert!(elapsed >= Duration::from_millis(300), "{:?}", elapsed);
        assert!(elapsed < Duration::from_millis(400), "{:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_running_count_never_exceeds_limit() {
        let gauge = Arc::new(Gauge::default());
        let tasks = (0..10)
            .map(|i| sleeper(gauge.clone(), 10 + (i * 7) % 30, i))
            .collect();

        let results = parallel(tasks, Some(3)).await.unwrap();

        assert_eq!(results, (0..10).collect::<Vec<_>>());
        assert_eq!(gauge.peak.load(Ordering::SeqCst), 3);
        assert_eq!(gauge.started.load(Ordering::SeqCst), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_omitted_limit_starts_everything_at_once() {
        let gauge = Arc::new(Gauge::default());
        let tasks = (0..5).map(|i| sleeper(gauge.clone(), 100, i)).collect();

        let start = Instant::now();
        parallel(tasks, None).await.unwrap();

        assert_eq!(gauge.peak.load(Ordering::SeqCst), 5);
        assert!(start.elapsed() < Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_results_follow_submission_order() {
        let gauge = Arc::new(Gauge::default());
        let tasks = vec![
            sleeper(gauge.clone(), 300, 10),
            sleeper(gauge.clone(), 100, 20),
            sleeper(gauge.clone(), 200, 30),
        ];
        assert_eq!(parallel(tasks, None).await.unwrap(), vec![10, 20, 30]);
    }

    #[tokio::test]
    async fn test_synchronous_completions() {
        let tasks: Vec<Task<usize>> = (0..4).map(|i| task(move |done| done.succeed(i * i))).collect();
        assert_eq!(parallel(tasks, Some(2)).await.unwrap(), vec![0, 1, 4, 9]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_error_is_reported_once() {
        let finished = Arc::new(AtomicUsize::new(0));
        let counter = finished.clone();
        let tasks: Vec<Task<u64>> = vec![
            task(|done| {
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    done.fail(anyhow::anyhow!("E"));
                });
            }),
            task(move |done| {
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    counter.fetch_add(1, Ordering::SeqCst);
                    done.succeed(2);
                });
            }),
        ];

        let err = parallel(tasks, None).await.unwrap_err();
        match err {
            FlowError::Task { index, source } => {
                assert_eq!(index, 0);
                assert_eq!(source.to_string(), "E");
            }
            other => panic!("unexpected {:?}", other),
        }

        // The sibling is not cancelled, its result just goes nowhere
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_stops_admission() {
        let gauge = Arc::new(Gauge::default());
        let mut tasks: Vec<Task<u64>> = vec![task(|done| done.fail(anyhow::anyhow!("bad input")))];
        tasks.extend((0..3).map(|i| sleeper(gauge.clone(), 10, i)));

        let err = parallel(tasks, Some(1)).await.unwrap_err();
        assert!(matches!(err, FlowError::Task { index: 0, .. }));
        assert_eq!(gauge.started.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_uncapped_run_starts_every_task_after_early_failure() {
        for limit in [None, Some(3), Some(10)] {
            let started = Arc::new(AtomicUsize::new(0));
            let finished = Arc::new(AtomicUsize::new(0));
            let mut tasks: Vec<Task<u64>> = vec![task({
                let started = started.clone();
                move |done| {
                    started.fetch_add(1, Ordering::SeqCst);
                    done.fail(anyhow::anyhow!("E"))
                }
            })];
            tasks.extend((0..2).map(|i| {
                let (started, finished) = (started.clone(), finished.clone());
                task(move |done| {
                    started.fetch_add(1, Ordering::SeqCst);
                    finished.fetch_add(1, Ordering::SeqCst);
                    done.succeed(i)
                })
            }));

            let err = parallel(tasks, limit).await.unwrap_err();
            assert!(matches!(err, FlowError::Task { index: 0, .. }), "{:?}", limit);
            assert_eq!(started.load(Ordering::SeqCst), 3, "{:?}", limit);
            assert_eq!(finished.load(Ordering::SeqCst), 2, "{:?}", limit);
        }
    }

    #[tokio::test]
    async fn test_abandoned_task_frees_its_slot() {
        let tasks: Vec<Task<u8>> = vec![task(drop), task(|done| done.succeed(1))];
        let err = parallel(tasks, Some(1)).await.unwrap_err();
        assert!(matches!(err, FlowError::Task { index: 0, source: TaskError::Abandoned }));
    }

    #[tokio::test]
    async fn test_validation_launches_nothing() {
        let err = parallel::<u8>(Vec::new(), None).await.unwrap_err();
        assert!(matches!(err, FlowError::EmptyCollection));

        let started = Arc::new(AtomicUsize::new(0));
        let counter = started.clone();
        let tasks: Vec<Task<u8>> = vec![task(move |done| {
            counter.fetch_add(1, Ordering::SeqCst);
            done.succeed(0)
        })];
        let err = parallel(tasks, Some(0)).await.unwrap_err();
        assert!(matches!(err, FlowError::LimitRange));
        assert_eq!(started.load(Ordering::SeqCst), 0);
    }
}
