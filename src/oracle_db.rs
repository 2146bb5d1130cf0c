//! Oracle driver backend, enabled with the `oracle-db` cargo feature.
//!
//! Driver calls are blocking, so every connect/execute runs on the tokio
//! blocking pool and the connection travels in and out of the closure.

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use oracle::sql_type::OracleType;
use rust_decimal::Decimal;

use crate::database::{Connection, Database};
use crate::errors::WorkerError;
use crate::procedure::{OutputRow, ProcedureCall, SqlType, SqlValue};

/// Connects with credentials parsed from an ADO-style connection string,
/// the format the `OracleDb` entry has always used:
/// `User Id=...;Password=...;Data Source=...`.
pub struct OracleDatabase {
    username: String,
    password: String,
    connect_string: String,
}

impl OracleDatabase {
    pub fn from_connection_string(raw: &str) -> Result<Self, WorkerError> {
        let mut username = None;
        let mut password = None;
        let mut connect_string = None;
        for pair in raw.split(';').filter(|p| !p.trim().is_empty()) {
            let Some((key, value)) = pair.split_once('=') else {
                return Err(WorkerError::configuration(format!(
                    "malformed connection string fragment '{pair}'"
                )));
            };
            match key.trim().to_ascii_lowercase().as_str() {
                "user id" => username = Some(value.trim().to_owned()),
                "password" => password = Some(value.trim().to_owned()),
                "data source" => connect_string = Some(value.trim().to_owned()),
                // ODP.NET carries pooling knobs and the like; not ours.
                _ => {}
            }
        }
        let missing = |what: &str| {
            WorkerError::configuration(format!("connection string is missing '{what}'"))
        };
        Ok(Self {
            username: username.ok_or_else(|| missing("User Id"))?,
            password: password.ok_or_else(|| missing("Password"))?,
            connect_string: connect_string.ok_or_else(|| missing("Data Source"))?,
        })
    }
}

#[async_trait]
impl Database for OracleDatabase {
    async fn connect(&self) -> Result<Box<dyn Connection>, WorkerError> {
        let username = self.username.clone();
        let password = self.password.clone();
        let connect_string = self.connect_string.clone();
        let conn = tokio::task::spawn_blocking(move || {
            oracle::Connection::connect(&username, &password, &connect_string)
        })
        .await
        .map_err(WorkerError::connection)?
        .map_err(WorkerError::connection)?;
        Ok(Box::new(OracleConnection { inner: Some(conn) }))
    }
}

struct OracleConnection {
    inner: Option<oracle::Connection>,
}

#[async_trait]
impl Connection for OracleConnection {
    async fn call(&mut self, call: ProcedureCall) -> Result<OutputRow, WorkerError> {
        let conn = self
            .inner
            .take()
            .ok_or_else(|| WorkerError::procedure(anyhow!("connection already consumed")))?;
        let (result, conn) = tokio::task::spawn_blocking(move || {
            let result = execute_call(&conn, &call);
            (result, conn)
        })
        .await
        .map_err(WorkerError::procedure)?;
        self.inner = Some(conn);
        result
    }
}

fn execute_call(conn: &oracle::Connection, call: &ProcedureCall) -> Result<OutputRow, WorkerError> {
    let block = call.block();
    let mut stmt = conn
        .statement(&block)
        .build()
        .map_err(WorkerError::procedure)?;

    for input in call.inputs() {
        match &input.value {
            SqlValue::Varchar(s) => stmt.bind(input.name, s),
            // Bound as text; the server converts to NUMBER without loss.
            SqlValue::Number(n) => stmt.bind(input.name, &n.to_string()),
            SqlValue::Timestamp(t) => stmt.bind(input.name, t),
        }
        .map_err(WorkerError::procedure)?;
    }
    for output in call.outputs() {
        let sql_type = match output.sql_type {
            SqlType::Varchar { max_len } => OracleType::Varchar2(max_len),
            SqlType::Number => OracleType::Number(0, 0),
            SqlType::Date => OracleType::Date,
        };
        stmt.bind(output.name, &sql_type)
            .map_err(WorkerError::procedure)?;
    }

    stmt.execute(&[]).map_err(WorkerError::procedure)?;

    let mut row = OutputRow::new();
    for output in call.outputs() {
        let value = match output.sql_type {
            SqlType::Varchar { .. } => {
                let v: Option<String> = stmt.bind_value(output.name).map_err(WorkerError::procedure)?;
                v.map(SqlValue::Varchar)
            }
            SqlType::Number => {
                let v: Option<String> = stmt.bind_value(output.name).map_err(WorkerError::procedure)?;
                v.map(|text| {
                    text.parse::<Decimal>()
                        .map(SqlValue::Number)
                        .map_err(|e| {
                            WorkerError::procedure(anyhow!(
                                "output {} is not a decimal ('{text}'): {e}",
                                output.name
                            ))
                        })
                })
                .transpose()?
            }
            SqlType::Date => {
                let v: Option<NaiveDateTime> =
                    stmt.bind_value(output.name).map_err(WorkerError::procedure)?;
                v.map(SqlValue::Timestamp)
            }
        };
        row.set(output.name, value);
    }
    Ok(row)
}
