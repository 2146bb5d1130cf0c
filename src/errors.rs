use std::fmt::{Debug, Display, Formatter};

/// Everything that can abort a single invocation attempt.
///
/// Cancellation is deliberately absent: a raised cancellation signal stops
/// the runner quietly and never surfaces as an error.
#[derive(Debug)]
pub enum WorkerErrorKind {
    /// The named connection string is not present in the configuration.
    MissingConnectionString(String),
    /// Malformed configuration value (connection string, cron expression, ...).
    Configuration(String),
    /// The database could not be reached or the connection could not be opened.
    Connection(anyhow::Error),
    /// A number-typed input field holds non-numeric text.
    Conversion { field: &'static str, value: String },
    /// The stored-procedure call itself failed, or its output parameters
    /// could not be decoded.
    ProcedureExecution(anyhow::Error),
}

#[derive(Debug)]
pub struct WorkerError {
    error_kind: WorkerErrorKind,
}

impl WorkerError {
    pub fn new(error_kind: WorkerErrorKind) -> Self {
        Self { error_kind }
    }

    pub fn kind(&self) -> &WorkerErrorKind {
        &self.error_kind
    }

    pub fn missing_connection_string(name: &str) -> Self {
        Self::new(WorkerErrorKind::MissingConnectionString(name.to_owned()))
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(WorkerErrorKind::Configuration(message.into()))
    }

    pub fn connection(source: impl Into<anyhow::Error>) -> Self {
        Self::new(WorkerErrorKind::Connection(source.into()))
    }

    pub fn conversion(field: &'static str, value: impl Into<String>) -> Self {
        Self::new(WorkerErrorKind::Conversion {
            field,
            value: value.into(),
        })
    }

    pub fn procedure(source: impl Into<anyhow::Error>) -> Self {
        Self::new(WorkerErrorKind::ProcedureExecution(source.into()))
    }
}

impl Display for WorkerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.error_kind {
            WorkerErrorKind::MissingConnectionString(name) => {
                write!(f, "connection string '{name}' not found")
            }
            WorkerErrorKind::Configuration(message) => {
                write!(f, "invalid configuration: {message}")
            }
            WorkerErrorKind::Connection(source) => {
                write!(f, "failed to open database connection: {source}")
            }
            WorkerErrorKind::Conversion { field, value } => {
                write!(f, "input parameter {field} is not a number: '{value}'")
            }
            WorkerErrorKind::ProcedureExecution(source) => {
                write!(f, "stored procedure execution failed: {source}")
            }
        }
    }
}

impl std::error::Error for WorkerError {}

impl From<WorkerErrorKind> for WorkerError {
    fn from(error_kind: WorkerErrorKind) -> Self {
        Self::new(error_kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_offending_field() {
        let err = WorkerError::conversion("INP_PAYMENT_AMOUNT", "abc");
        assert_eq!(
            err.to_string(),
            "input parameter INP_PAYMENT_AMOUNT is not a number: 'abc'"
        );
    }

    #[test]
    fn display_names_the_missing_connection_string() {
        let err = WorkerError::missing_connection_string("OracleDb");
        assert_eq!(err.to_string(), "connection string 'OracleDb' not found");
    }
}
