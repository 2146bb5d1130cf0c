use std::collections::HashMap;

use anyhow::anyhow;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use crate::errors::WorkerError;

/// A value travelling through a named bind parameter.
#[derive(Clone, Debug, PartialEq)]
pub enum SqlValue {
    Varchar(String),
    Number(Decimal),
    Timestamp(NaiveDateTime),
}

/// Declared type of an output bind, fixed before execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SqlType {
    Varchar { max_len: u32 },
    Number,
    Date,
}

#[derive(Clone, Debug)]
pub struct InputParam {
    pub name: &'static str,
    pub value: SqlValue,
}

#[derive(Clone, Copy, Debug)]
pub struct OutputParam {
    pub name: &'static str,
    pub sql_type: SqlType,
}

/// A stored-procedure call: the procedure name plus its named input
/// parameters and output declarations, in bind order.
///
/// # Example
/// ```
/// # use epayment_worker::procedure::{ProcedureCall, SqlType};
/// let call = ProcedureCall::new("PKG.PROC")
///     .input_varchar("INP_CODE", "EN")
///     .output("OUTP_REFNO", SqlType::Number);
/// assert_eq!(call.block(), "BEGIN PKG.PROC(:INP_CODE, :OUTP_REFNO); END;");
/// ```
#[derive(Clone, Debug)]
pub struct ProcedureCall {
    name: &'static str,
    inputs: Vec<InputParam>,
    outputs: Vec<OutputParam>,
}

impl ProcedureCall {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            inputs: vec![],
            outputs: vec![],
        }
    }

    pub fn input_varchar(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.inputs.push(InputParam {
            name,
            value: SqlValue::Varchar(value.into()),
        });
        self
    }

    pub fn input_number(mut self, name: &'static str, value: Decimal) -> Self {
        self.inputs.push(InputParam {
            name,
            value: SqlValue::Number(value),
        });
        self
    }

    pub fn output(mut self, name: &'static str, sql_type: SqlType) -> Self {
        self.outputs.push(OutputParam { name, sql_type });
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn inputs(&self) -> &[InputParam] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[OutputParam] {
        &self.outputs
    }

    /// Renders the anonymous PL/SQL block that invokes the procedure, with
    /// one named bind per parameter, inputs first, in declaration order.
    pub fn block(&self) -> String {
        let binds = self
            .inputs
            .iter()
            .map(|p| p.name)
            .chain(self.outputs.iter().map(|p| p.name))
            .map(|name| format!(":{name}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!("BEGIN {}({}); END;", self.name, binds)
    }
}

/// Output binds read back after execution. Every declared output is present
/// as a key; a NULL column is a `None` value.
#[derive(Debug, Default)]
pub struct OutputRow {
    values: HashMap<String, Option<SqlValue>>,
}

impl OutputRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &str, value: Option<SqlValue>) {
        self.values.insert(name.to_owned(), value);
    }

    fn get(&self, name: &str) -> Result<&Option<SqlValue>, WorkerError> {
        self.values
            .get(name)
            .ok_or_else(|| WorkerError::procedure(anyhow!("output parameter {name} was not bound")))
    }

    pub fn varchar(&self, name: &str) -> Result<Option<String>, WorkerError> {
        match self.get(name)? {
            None => Ok(None),
            Some(SqlValue::Varchar(s)) => Ok(Some(s.to_owned())),
            Some(other) => Err(type_mismatch(name, "varchar", other)),
        }
    }

    pub fn number(&self, name: &str) -> Result<Option<Decimal>, WorkerError> {
        match self.get(name)? {
            None => Ok(None),
            Some(SqlValue::Number(n)) => Ok(Some(*n)),
            Some(other) => Err(type_mismatch(name, "number", other)),
        }
    }

    pub fn timestamp(&self, name: &str) -> Result<Option<NaiveDateTime>, WorkerError> {
        match self.get(name)? {
            None => Ok(None),
            Some(SqlValue::Timestamp(t)) => Ok(Some(*t)),
            Some(other) => Err(type_mismatch(name, "date", other)),
        }
    }
}

fn type_mismatch(name: &str, expected: &str, got: &SqlValue) -> WorkerError {
    WorkerError::procedure(anyhow!(
        "output parameter {name} is not a {expected}: {got:?}"
    ))
}
