/*!
Periodic worker around the `API_MICRO_EPAYMENT_PKG.DO_PAYEMENT` stored
procedure.

On every trigger the worker opens a database connection, invokes the
procedure with a fixed parameter set, reads four output parameters back and
prints them in a stable line format. One `JobRunner` covers both deployment
flavours via a pluggable [`trigger::TriggerSource`]: a fixed delay between
iterations, or a cron schedule.

# Example
```no_run
use std::sync::Arc;
use std::time::Duration;

use epayment_worker::{IntervalTrigger, JobRunner, PaymentParams, ReportStyle};
use tokio_util::sync::CancellationToken;

# async fn demo(database: Arc<dyn epayment_worker::Database>) {
let mut runner = JobRunner::new(database, PaymentParams::default(), ReportStyle::default());
let cancel = CancellationToken::new();
runner
    .run(IntervalTrigger::new(Duration::from_secs(60)), cancel)
    .await;
# }
```
*/
pub mod config;
pub mod database;
pub mod errors;
pub mod invoker;
pub mod params;
pub mod procedure;
pub mod report;
pub mod trigger;

pub mod job_runner;
#[cfg(feature = "oracle-db")]
pub mod oracle_db;

pub use config::{CliConfig, FileConfig, TriggerConfig, WorkerConfig, ORACLE_CONNECTION};
pub use database::{Connection, Database};
pub use errors::{WorkerError, WorkerErrorKind};
pub use invoker::{PaymentOutcome, PROCEDURE};
pub use job_runner::{IterationCounter, JobRunner};
pub use params::PaymentParams;
pub use report::{render, NullMarker, ReportStyle};
pub use trigger::{CronTrigger, IntervalTrigger, TriggerSource};
