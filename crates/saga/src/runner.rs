//! Reusable saga-step runner.
//!
//! A [`Saga`] executes an ordered list of steps on the caller's task. Each
//! forward step that succeeds registers a [`CompensatingAction`]. When a later
//! step fails, the registered actions run once each in reverse order (LIFO)
//! and the original error is returned.
//!
//! There is no saga log. If the future driving a saga is dropped mid-flight,
//! committed steps stay committed and nothing is compensated.

use std::future::Future;
use std::time::Instant;

use async_trait::async_trait;

use crate::error::{Result, SagaError};
use crate::state::SagaState;

/// An action that semantically reverses a completed forward step.
#[async_trait]
pub trait CompensatingAction: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Runs the compensation. Called at most once.
    async fn execute(&self) -> Result<()>;
}

/// A single in-flight saga instance.
pub struct Saga<'a> {
    saga_type: &'static str,
    state: SagaState,
    compensations: Vec<Box<dyn CompensatingAction + 'a>>,
    started: Instant,
}

impl<'a> Saga<'a> {
    /// Creates a saga that has not run any step yet.
    pub fn new(saga_type: &'static str) -> Self {
        Self {
            saga_type,
            state: SagaState::NotStarted,
            compensations: Vec::new(),
            started: Instant::now(),
        }
    }

    pub fn state(&self) -> SagaState {
        self.state
    }

    /// Returns how many compensations are registered and not yet run.
    pub fn pending_compensations(&self) -> usize {
        self.compensations.len()
    }

    /// Runs a forward step and registers `compensation` if it succeeds.
    ///
    /// On failure, previously registered compensations run in reverse order
    /// and the step's error is returned. `compensation` itself is discarded
    /// because its forward step never took effect.
    pub async fn step<T, E, F, C>(
        &mut self,
        name: &'static str,
        forward: F,
        compensation: C,
    ) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, E>>,
        E: Into<SagaError>,
        C: CompensatingAction + 'a,
    {
        self.begin(name)?;

        match forward.await {
            Ok(value) => {
                self.compensations.push(Box::new(compensation));
                tracing::debug!(saga_type = self.saga_type, step = name, "saga step completed");
                Ok(value)
            }
            Err(e) => Err(self.fail(name, e.into()).await),
        }
    }

    /// Runs the final local step and completes the saga.
    ///
    /// The final step registers no compensation of its own.
    pub async fn finish<T, E, F>(&mut self, name: &'static str, local: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, E>>,
        E: Into<SagaError>,
    {
        self.begin(name)?;

        match local.await {
            Ok(value) => {
                self.compensations.clear();
                self.state = SagaState::Completed;

                let duration = self.started.elapsed().as_secs_f64();
                metrics::counter!("saga_completed_total", "saga_type" => self.saga_type)
                    .increment(1);
                metrics::histogram!("saga_duration_seconds", "saga_type" => self.saga_type)
                    .record(duration);
                tracing::info!(saga_type = self.saga_type, duration, "saga completed");
                Ok(value)
            }
            Err(e) => Err(self.fail(name, e.into()).await),
        }
    }

    fn begin(&mut self, step: &'static str) -> Result<()> {
        if !self.state.can_run() {
            return Err(SagaError::InvalidState {
                expected: "NotStarted or Running".to_string(),
                actual: self.state,
            });
        }

        if self.state == SagaState::NotStarted {
            self.state = SagaState::Running;
            self.started = Instant::now();
            metrics::counter!("saga_executions_total", "saga_type" => self.saga_type)
                .increment(1);
        }

        tracing::info!(saga_type = self.saga_type, step, "saga step started");
        Ok(())
    }

    /// Compensates every registered step in reverse order and marks the saga
    /// as failed. Returns `error` unchanged.
    async fn fail(&mut self, step: &'static str, error: SagaError) -> SagaError {
        tracing::warn!(
            saga_type = self.saga_type,
            step,
            error = %error,
            compensations = self.compensations.len(),
            "saga step failed"
        );

        if self.state.can_compensate() && !self.compensations.is_empty() {
            self.state = SagaState::Compensating;

            while let Some(action) = self.compensations.pop() {
                match action.execute().await {
                    Ok(()) => {
                        metrics::counter!(
                            "saga_compensations_total",
                            "saga_type" => self.saga_type
                        )
                        .increment(1);
                        tracing::info!(
                            saga_type = self.saga_type,
                            compensation = action.name(),
                            "compensation completed"
                        );
                    }
                    Err(e) => {
                        metrics::counter!(
                            "saga_compensation_failures_total",
                            "saga_type" => self.saga_type
                        )
                        .increment(1);
                        tracing::error!(
                            saga_type = self.saga_type,
                            compensation = action.name(),
                            failed_step = step,
                            error = %e,
                            inconsistent = true,
                            "compensation failed, remote and local state have diverged"
                        );
                    }
                }
            }
        }

        self.state = SagaState::Failed;
        metrics::counter!("saga_failed_total", "saga_type" => self.saga_type).increment(1);
        metrics::histogram!("saga_duration_seconds", "saga_type" => self.saga_type)
            .record(self.started.elapsed().as_secs_f64());

        error
    }
}

impl Drop for Saga<'_> {
    fn drop(&mut self) {
        if !self.compensations.is_empty() {
            tracing::warn!(
                saga_type = self.saga_type,
                state = %self.state,
                pending = self.compensations.len(),
                "saga dropped with committed steps that were never compensated"
            );
        }
    }
}

impl std::fmt::Debug for Saga<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Saga")
            .field("saga_type", &self.saga_type)
            .field("state", &self.state)
            .field("pending_compensations", &self.compensations.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use store::StoreError;

    use super::*;
    use crate::services::CounterError;

    type Log = Arc<Mutex<Vec<&'static str>>>;

    struct Recorder {
        name: &'static str,
        log: Log,
        fail: bool,
    }

    impl Recorder {
        fn new(name: &'static str, log: &Log) -> Self {
            Self {
                name,
                log: Arc::clone(log),
                fail: false,
            }
        }

        fn failing(name: &'static str, log: &Log) -> Self {
            Self {
                fail: true,
                ..Self::new(name, log)
            }
        }
    }

    #[async_trait]
    impl CompensatingAction for Recorder {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn execute(&self) -> Result<()> {
            self.log.lock().unwrap().push(self.name);
            if self.fail {
                return Err(CounterError::Unavailable("down".to_string()).into());
            }
            Ok(())
        }
    }

    fn ok() -> std::result::Result<(), SagaError> {
        Ok(())
    }

    fn storage_failure() -> std::result::Result<(), StoreError> {
        Err(StoreError::Unavailable("disk".to_string()))
    }

    #[tokio::test]
    async fn test_completed_saga_runs_no_compensation() {
        let log = Log::default();
        let mut saga = Saga::new("Test");
        assert_eq!(saga.state(), SagaState::NotStarted);

        saga.step("one", async { ok() }, Recorder::new("undo_one", &log))
            .await
            .unwrap();
        assert_eq!(saga.state(), SagaState::Running);
        assert_eq!(saga.pending_compensations(), 1);

        let value = saga.finish("two", async { Ok::<_, SagaError>(7) }).await.unwrap();
        assert_eq!(value, 7);
        assert_eq!(saga.state(), SagaState::Completed);
        assert_eq!(saga.pending_compensations(), 0);
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_first_step_failure_compensates_nothing() {
        let log = Log::default();
        let mut saga = Saga::new("Test");

        let err = saga
            .step(
                "one",
                async { Err::<(), _>(CounterError::Unavailable("down".to_string())) },
                Recorder::new("undo_one", &log),
            )
            .await
            .unwrap_err();

        assert!(err.is_remote());
        assert_eq!(saga.state(), SagaState::Failed);
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_local_failure_compensates_in_reverse_order() {
        let log = Log::default();
        let mut saga = Saga::new("Test");

        saga.step("one", async { ok() }, Recorder::new("undo_one", &log))
            .await
            .unwrap();
        saga.step("two", async { ok() }, Recorder::new("undo_two", &log))
            .await
            .unwrap();

        let err = saga.finish("three", async { storage_failure() }).await.unwrap_err();

        assert!(err.is_storage());
        assert_eq!(saga.state(), SagaState::Failed);
        assert_eq!(*log.lock().unwrap(), vec!["undo_two", "undo_one"]);
    }

    #[tokio::test]
    async fn test_failed_compensation_keeps_original_error() {
        let log = Log::default();
        let mut saga = Saga::new("Test");

        saga.step("one", async { ok() }, Recorder::new("undo_one", &log))
            .await
            .unwrap();
        saga.step("two", async { ok() }, Recorder::failing("undo_two", &log))
            .await
            .unwrap();

        let err = saga.finish("three", async { storage_failure() }).await.unwrap_err();

        // The failing compensation does not stop the remaining ones.
        assert!(err.is_storage());
        assert_eq!(*log.lock().unwrap(), vec!["undo_two", "undo_one"]);
        assert_eq!(saga.state(), SagaState::Failed);
    }

    #[tokio::test]
    async fn test_dropped_saga_leaves_committed_steps_alone() {
        let log = Log::default();
        let run = async {
            let mut saga = Saga::new("Test");
            saga.step("one", async { ok() }, Recorder::new("undo_one", &log))
                .await?;
            saga.finish("two", std::future::pending::<std::result::Result<(), SagaError>>())
                .await
        };

        let elapsed = tokio::time::timeout(Duration::from_millis(20), run).await;

        assert!(elapsed.is_err());
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_terminal_saga_rejects_steps() {
        let log = Log::default();
        let mut saga = Saga::new("Test");
        saga.finish("only", async { ok() }).await.unwrap();

        let err = saga
            .step("late", async { ok() }, Recorder::new("undo_late", &log))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SagaError::InvalidState {
                actual: SagaState::Completed,
                ..
            }
        ));
        assert!(log.lock().unwrap().is_empty());
    }
}
