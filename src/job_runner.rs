use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::database::Database;
use crate::errors::WorkerError;
use crate::invoker::{self, PaymentOutcome};
use crate::params::PaymentParams;
use crate::report::{render, ReportStyle};
use crate::trigger::TriggerSource;

/// Iteration count owned by the runner. Starts at zero; `next()` returns 1
/// on the first call. Exactly one increment happens per loop iteration,
/// whether the attempt succeeds or fails.
#[derive(Debug, Default)]
pub struct IterationCounter {
    count: u64,
}

impl IterationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self) -> u64 {
        self.count += 1;
        self.count
    }

    pub fn value(&self) -> u64 {
        self.count
    }
}

/// Drives periodic execution of the payment procedure.
///
/// One runner performs strictly sequential invocations: per iteration it
/// opens a fresh connection, executes the call, prints the decoded outputs
/// and waits for the next trigger. Failed attempts are logged and the loop
/// keeps going; no state carries over from one attempt to the next.
pub struct JobRunner {
    database: Arc<dyn Database>,
    params: PaymentParams,
    style: ReportStyle,
    counter: IterationCounter,
}

impl JobRunner {
    pub fn new(database: Arc<dyn Database>, params: PaymentParams, style: ReportStyle) -> Self {
        Self {
            database,
            params,
            style,
            counter: IterationCounter::new(),
        }
    }

    /// Number of iterations attempted so far.
    pub fn iterations(&self) -> u64 {
        self.counter.value()
    }

    /// One full invocation: open a connection, execute, decode.
    #[instrument(skip(self), fields(invocation = %uuid::Uuid::new_v4()))]
    pub async fn run_once(&self) -> Result<PaymentOutcome, WorkerError> {
        tracing::debug!("opening database connection");
        let mut conn = self.database.connect().await?;
        invoker::invoke(conn.as_mut(), &self.params).await
    }

    /// Runs invocations until the token is cancelled.
    ///
    /// Cancellation raised mid-call or mid-wait stops the loop quietly; it
    /// is a stop signal, not an error. Any other failure is logged with its
    /// iteration number and the next trigger still fires.
    pub async fn run(&mut self, mut trigger: impl TriggerSource, cancel: CancellationToken) {
        tracing::info!("payment worker running");
        while !cancel.is_cancelled() {
            let iteration = self.counter.next();
            let attempt = tokio::select! {
                result = self.run_once() => Some(result),
                _ = cancel.cancelled() => None,
            };
            match attempt {
                None => break,
                Some(Ok(outcome)) => {
                    for line in render(&outcome, &self.style, iteration) {
                        println!("{line}");
                    }
                }
                Some(Err(error)) => {
                    tracing::error!(iteration, %error, "payment invocation failed");
                }
            }
            if !trigger.wait(&cancel).await {
                break;
            }
        }
        tracing::info!(iterations = self.counter.value(), "payment worker stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Connection;
    use crate::procedure::{OutputRow, ProcedureCall, SqlValue};
    use crate::trigger::IntervalTrigger;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Scripted database: one entry per expected connect. `cancel_after`
    /// raises the token once that many connects have been served.
    struct ScriptedDatabase {
        connects: AtomicUsize,
        calls: Arc<AtomicUsize>,
        fail_connects: Vec<usize>,
        cancel_after: usize,
        cancel: CancellationToken,
    }

    impl ScriptedDatabase {
        fn new(cancel: CancellationToken, cancel_after: usize) -> Self {
            Self {
                connects: AtomicUsize::new(0),
                calls: Arc::new(AtomicUsize::new(0)),
                fail_connects: vec![],
                cancel_after,
                cancel,
            }
        }

        fn failing_on(mut self, connect_no: usize) -> Self {
            self.fail_connects.push(connect_no);
            self
        }

        fn connect_count(&self) -> usize {
            self.connects.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Database for ScriptedDatabase {
        async fn connect(&self) -> Result<Box<dyn Connection>, WorkerError> {
            let n = self.connects.fetch_add(1, Ordering::SeqCst) + 1;
            if n >= self.cancel_after {
                self.cancel.cancel();
            }
            if self.fail_connects.contains(&n) {
                return Err(WorkerError::connection(anyhow!("listener unreachable")));
            }
            Ok(Box::new(ScriptedConnection {
                calls: self.calls.clone(),
            }))
        }
    }

    struct ScriptedConnection {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Connection for ScriptedConnection {
        async fn call(&mut self, call: ProcedureCall) -> Result<OutputRow, WorkerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut row = OutputRow::new();
            for out in call.outputs() {
                row.set(out.name, None);
            }
            row.set("OUTP_REFNO", Some(SqlValue::Number(dec!(1))));
            Ok(row)
        }
    }

    fn runner_with(database: Arc<dyn Database>) -> JobRunner {
        JobRunner::new(database, PaymentParams::default(), ReportStyle::default())
    }

    #[test]
    fn counter_starts_at_one_and_increments_by_one() {
        let mut counter = IterationCounter::new();
        assert_eq!(counter.value(), 0);
        assert_eq!(counter.next(), 1);
        assert_eq!(counter.next(), 2);
        assert_eq!(counter.value(), 2);
    }

    #[tokio::test]
    async fn run_once_yields_exactly_one_outcome() {
        let cancel = CancellationToken::new();
        let database = Arc::new(ScriptedDatabase::new(cancel, usize::MAX));
        let runner = runner_with(database.clone());
        let outcome = runner.run_once().await.unwrap();
        assert_eq!(outcome.ref_no, Some(dec!(1)));
        assert_eq!(database.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancellation_during_the_wait_stops_without_another_invocation() {
        let cancel = CancellationToken::new();
        let database = Arc::new(ScriptedDatabase::new(cancel.clone(), 1));
        let mut runner = runner_with(database.clone());
        runner
            .run(IntervalTrigger::new(Duration::from_secs(60)), cancel)
            .await;
        assert_eq!(database.connect_count(), 1);
        assert_eq!(runner.iterations(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn a_failed_attempt_does_not_stop_the_loop() {
        let cancel = CancellationToken::new();
        let database = Arc::new(ScriptedDatabase::new(cancel.clone(), 2).failing_on(1));
        let mut runner = runner_with(database.clone());
        runner
            .run(IntervalTrigger::new(Duration::from_secs(60)), cancel)
            .await;
        // Connect 1 fails, the 60s wait elapses, connect 2 succeeds and
        // raises the stop signal.
        assert_eq!(database.connect_count(), 2);
        assert_eq!(runner.iterations(), 2);
        assert_eq!(database.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn a_pre_raised_signal_prevents_any_invocation() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let database = Arc::new(ScriptedDatabase::new(cancel.clone(), usize::MAX));
        let mut runner = runner_with(database.clone());
        runner
            .run(IntervalTrigger::new(Duration::from_secs(60)), cancel)
            .await;
        assert_eq!(database.connect_count(), 0);
        assert_eq!(runner.iterations(), 0);
    }

    #[tokio::test]
    async fn conversion_failure_aborts_before_any_remote_call() {
        let cancel = CancellationToken::new();
        let database = Arc::new(ScriptedDatabase::new(cancel, usize::MAX));
        let params = PaymentParams {
            payment_amount: "not-a-number".to_owned(),
            ..PaymentParams::default()
        };
        let runner = JobRunner::new(database.clone(), params, ReportStyle::default());
        let err = runner.run_once().await.unwrap_err();
        assert!(matches!(
            err.kind(),
            crate::errors::WorkerErrorKind::Conversion { .. }
        ));
        assert_eq!(database.calls.load(Ordering::SeqCst), 0);
    }
}
