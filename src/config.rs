use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::errors::WorkerError;
use crate::params::PaymentParams;
use crate::report::{NullMarker, ReportStyle};

/// Name of the connection string the worker requires.
pub const ORACLE_CONNECTION: &str = "OracleDb";

/// CLI arguments that participate in config resolution. TOML values
/// override these where present.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub connection_string: Option<String>,
    pub interval_secs: Option<u64>,
    pub cron: Option<String>,
}

/// On-disk configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub connection_strings: HashMap<String, String>,
    pub worker: WorkerSection,
    pub payment: PaymentParams,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkerSection {
    pub interval_secs: Option<u64>,
    pub cron: Option<String>,
    pub null_marker: NullMarker,
    pub print_counter: bool,
}

impl Default for WorkerSection {
    fn default() -> Self {
        Self {
            interval_secs: None,
            cron: None,
            null_marker: NullMarker::default(),
            print_counter: true,
        }
    }
}

/// Fallback period between iterations when neither the file nor the CLI
/// sets one.
pub const DEFAULT_INTERVAL_SECS: u64 = 60;

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, WorkerError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            WorkerError::configuration(format!("cannot read config file {path:?}: {e}"))
        })?;
        toml::from_str(&text)
            .map_err(|e| WorkerError::configuration(format!("cannot parse {path:?}: {e}")))
    }
}

/// How the runner is triggered between iterations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerConfig {
    Interval(Duration),
    Cron(String),
}

/// Fully resolved worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    connection_strings: HashMap<String, String>,
    pub trigger: TriggerConfig,
    pub style: ReportStyle,
    pub payment: PaymentParams,
}

impl WorkerConfig {
    /// Merge CLI arguments and optional file config; file values win.
    pub fn resolve(cli: &CliConfig, file: Option<FileConfig>) -> Self {
        let file = file.unwrap_or_default();

        let mut connection_strings = file.connection_strings;
        if let Some(cli_conn) = &cli.connection_string {
            connection_strings
                .entry(ORACLE_CONNECTION.to_owned())
                .or_insert_with(|| cli_conn.to_owned());
        }

        let cron = file.worker.cron.clone().or_else(|| cli.cron.clone());
        let trigger = match cron {
            Some(expr) => TriggerConfig::Cron(expr),
            None => {
                let secs = file
                    .worker
                    .interval_secs
                    .or(cli.interval_secs)
                    .unwrap_or(DEFAULT_INTERVAL_SECS);
                TriggerConfig::Interval(Duration::from_secs(secs))
            }
        };

        Self {
            connection_strings,
            trigger,
            style: ReportStyle {
                null_marker: file.worker.null_marker,
                print_counter: file.worker.print_counter,
            },
            payment: file.payment,
        }
    }

    /// Looks up a named connection string. Absence is fatal for the
    /// invocation that needs it.
    pub fn connection_string(&self, name: &str) -> Result<&str, WorkerError> {
        self.connection_strings
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| WorkerError::missing_connection_string(name))
    }
}
