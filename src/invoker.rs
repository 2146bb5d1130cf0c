use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use tracing::instrument;

use crate::database::Connection;
use crate::errors::WorkerError;
use crate::params::PaymentParams;
use crate::procedure::{OutputRow, ProcedureCall, SqlType};

/// Fully qualified name of the payment procedure. The spelling (including
/// the transposed "PAYEMENT" and the mixed-case output names) is the
/// database-side contract and must not be normalized.
pub const PROCEDURE: &str = "API_MICRO_EPAYMENT_PKG.DO_PAYEMENT";

pub const ERROR_MESSAGE_MAX_LEN: u32 = 4000;

/// The four output parameters of one procedure call, each independently
/// nullable. Produced once per successful call, consumed for display,
/// never retained.
#[derive(Clone, Debug, PartialEq)]
pub struct PaymentOutcome {
    pub payment_date: Option<NaiveDateTime>,
    pub ref_no: Option<Decimal>,
    pub error_code: Option<Decimal>,
    pub error_message: Option<String>,
}

/// Maps the parameter set onto the procedure's named bind contract.
///
/// Number-typed fields are parsed here, so a non-numeric value fails the
/// attempt before any connection is touched.
pub fn build_call(params: &PaymentParams) -> Result<ProcedureCall, WorkerError> {
    Ok(ProcedureCall::new(PROCEDURE)
        .input_varchar("INP_LANG_CODE", &params.lang_code)
        .input_number("INP_SENDER_ID", to_number("INP_SENDER_ID", &params.sender_id)?)
        .input_number(
            "INP_PROVIDER_CODE",
            to_number("INP_PROVIDER_CODE", &params.provider_code)?,
        )
        .input_varchar("INP_SENDER_TRANSACTION_ID", &params.sender_transaction_id)
        .input_varchar("INP_ACQUIRER_RRN", &params.acquirer_rrn)
        .input_varchar("INP_Customer_Idno", &params.customer_idno)
        .input_number("INP_SERVICE_ID", to_number("INP_SERVICE_ID", &params.service_id)?)
        .input_number(
            "INP_PAYMENT_AMOUNT",
            to_number("INP_PAYMENT_AMOUNT", &params.payment_amount)?,
        )
        .input_number(
            "INP_PAYMENT_TYPE",
            to_number("INP_PAYMENT_TYPE", &params.payment_type)?,
        )
        .output("OUTP_PAYMENT_DATE", SqlType::Date)
        .output("OUTP_REFNO", SqlType::Number)
        .output("OUTP_error_code", SqlType::Number)
        .output(
            "OUTP_error_message",
            SqlType::Varchar {
                max_len: ERROR_MESSAGE_MAX_LEN,
            },
        ))
}

pub fn decode_outputs(row: &OutputRow) -> Result<PaymentOutcome, WorkerError> {
    Ok(PaymentOutcome {
        payment_date: row.timestamp("OUTP_PAYMENT_DATE")?,
        ref_no: row.number("OUTP_REFNO")?,
        error_code: row.number("OUTP_error_code")?,
        error_message: row.varchar("OUTP_error_message")?,
    })
}

/// One complete invocation against an open connection: build the call,
/// execute it, decode the outputs. No retries, no state, errors propagate.
#[instrument(skip_all, fields(procedure = PROCEDURE))]
pub async fn invoke(
    conn: &mut dyn Connection,
    params: &PaymentParams,
) -> Result<PaymentOutcome, WorkerError> {
    let call = build_call(params)?;
    tracing::debug!("executing stored procedure");
    let row = conn.call(call).await?;
    decode_outputs(&row)
}

fn to_number(field: &'static str, raw: &str) -> Result<Decimal, WorkerError> {
    raw.trim()
        .parse::<Decimal>()
        .map_err(|_| WorkerError::conversion(field, raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::WorkerErrorKind;
    use crate::procedure::SqlValue;
    use rust_decimal_macros::dec;

    #[test]
    fn call_matches_the_bind_contract_exactly() {
        let call = build_call(&PaymentParams::default()).unwrap();
        assert_eq!(call.name(), "API_MICRO_EPAYMENT_PKG.DO_PAYEMENT");

        let input_names: Vec<_> = call.inputs().iter().map(|p| p.name).collect();
        assert_eq!(
            input_names,
            [
                "INP_LANG_CODE",
                "INP_SENDER_ID",
                "INP_PROVIDER_CODE",
                "INP_SENDER_TRANSACTION_ID",
                "INP_ACQUIRER_RRN",
                "INP_Customer_Idno",
                "INP_SERVICE_ID",
                "INP_PAYMENT_AMOUNT",
                "INP_PAYMENT_TYPE",
            ]
        );

        let output_names: Vec<_> = call.outputs().iter().map(|p| p.name).collect();
        assert_eq!(
            output_names,
            [
                "OUTP_PAYMENT_DATE",
                "OUTP_REFNO",
                "OUTP_error_code",
                "OUTP_error_message",
            ]
        );
        assert_eq!(
            call.outputs()[3].sql_type,
            SqlType::Varchar { max_len: 4000 }
        );
    }

    #[test]
    fn number_fields_are_parsed_as_decimals() {
        let call = build_call(&PaymentParams::default()).unwrap();
        let amount = call
            .inputs()
            .iter()
            .find(|p| p.name == "INP_PAYMENT_AMOUNT")
            .unwrap();
        assert_eq!(amount.value, SqlValue::Number(dec!(100.50)));
    }

    #[test]
    fn non_numeric_number_field_fails_with_a_conversion_error() {
        let mut cases: Vec<(&'static str, PaymentParams)> = Vec::new();
        let mut p = PaymentParams::default();
        p.sender_id = "x".into();
        cases.push(("INP_SENDER_ID", p));
        let mut p = PaymentParams::default();
        p.provider_code = "x".into();
        cases.push(("INP_PROVIDER_CODE", p));
        let mut p = PaymentParams::default();
        p.service_id = "x".into();
        cases.push(("INP_SERVICE_ID", p));
        let mut p = PaymentParams::default();
        p.payment_amount = "12,5".into();
        cases.push(("INP_PAYMENT_AMOUNT", p));
        let mut p = PaymentParams::default();
        p.payment_type = "".into();
        cases.push(("INP_PAYMENT_TYPE", p));

        for (field, params) in cases {
            let err = build_call(&params).unwrap_err();
            match err.kind() {
                WorkerErrorKind::Conversion { field: f, .. } => assert_eq!(*f, field),
                other => panic!("expected conversion error for {field}, got {other:?}"),
            }
        }
    }

    #[test]
    fn decode_passes_nulls_through_independently() {
        let mut row = OutputRow::new();
        row.set("OUTP_PAYMENT_DATE", None);
        row.set("OUTP_REFNO", Some(SqlValue::Number(dec!(77))));
        row.set("OUTP_error_code", None);
        row.set("OUTP_error_message", Some(SqlValue::Varchar("ok".into())));
        let outcome = decode_outputs(&row).unwrap();
        assert_eq!(outcome.payment_date, None);
        assert_eq!(outcome.ref_no, Some(dec!(77)));
        assert_eq!(outcome.error_code, None);
        assert_eq!(outcome.error_message.as_deref(), Some("ok"));
    }
}
