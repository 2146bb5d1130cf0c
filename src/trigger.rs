use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::errors::WorkerError;

/// Supplies the pause between iterations. Implementations must return early
/// when the token fires; a raised cancellation is the only way the wait
/// resolves to `false`.
#[async_trait]
pub trait TriggerSource: Send {
    /// Waits for the next trigger. `false` means the runner should stop.
    async fn wait(&mut self, cancel: &CancellationToken) -> bool;
}

/// Fixed delay after every iteration, success or failure. This is the
/// self-driven-loop flavour of the worker.
pub struct IntervalTrigger {
    period: Duration,
}

impl IntervalTrigger {
    pub fn new(period: Duration) -> Self {
        Self { period }
    }
}

#[async_trait]
impl TriggerSource for IntervalTrigger {
    async fn wait(&mut self, cancel: &CancellationToken) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(self.period) => true,
            _ = cancel.cancelled() => false,
        }
    }
}

/// Fires on a cron schedule evaluated in UTC, the externally-scheduled
/// flavour. `0 * * * * *` reproduces the observed every-minute trigger.
#[derive(Debug)]
pub struct CronTrigger {
    schedule: cron::Schedule,
}

impl CronTrigger {
    pub fn new(expr: &str) -> Result<Self, WorkerError> {
        let schedule = expr
            .parse()
            .map_err(|e| WorkerError::configuration(format!("bad cron expression '{expr}': {e}")))?;
        Ok(Self { schedule })
    }
}

#[async_trait]
impl TriggerSource for CronTrigger {
    async fn wait(&mut self, cancel: &CancellationToken) -> bool {
        let now = Utc::now();
        let Some(next) = self.schedule.after(&now).next() else {
            // A schedule with no future firing is exhausted; stop cleanly.
            return false;
        };
        let pause = (next - now).to_std().unwrap_or(Duration::ZERO);
        tokio::select! {
            _ = tokio::time::sleep(pause) => true,
            _ = cancel.cancelled() => false,
        }
    }
}
