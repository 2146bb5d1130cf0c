use async_trait::async_trait;

use crate::errors::WorkerError;
use crate::procedure::{OutputRow, ProcedureCall};

/// Source of per-invocation connections. The runner opens a fresh
/// connection for every attempt and drops it afterwards; nothing is pooled
/// or reused across iterations.
#[async_trait]
pub trait Database: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn Connection>, WorkerError>;
}

/// One open connection, good for executing stored-procedure calls.
#[async_trait]
pub trait Connection: Send {
    /// Executes the call and reads back every declared output bind.
    async fn call(&mut self, call: ProcedureCall) -> Result<OutputRow, WorkerError>;
}
