use serde::Deserialize;

use crate::invoker::PaymentOutcome;

/// Casing of the literal printed for an absent output value. Both spellings
/// exist in deployed log scrapers, so neither is hardcoded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub enum NullMarker {
    #[serde(rename = "NULL")]
    Upper,
    #[default]
    #[serde(rename = "Null")]
    Capitalized,
}

impl NullMarker {
    pub fn as_str(&self) -> &'static str {
        match self {
            NullMarker::Upper => "NULL",
            NullMarker::Capitalized => "Null",
        }
    }
}

/// How results are written to stdout. The execution-counter header is only
/// printed when a counting loop drives the worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReportStyle {
    pub null_marker: NullMarker,
    pub print_counter: bool,
}

impl Default for ReportStyle {
    fn default() -> Self {
        Self {
            null_marker: NullMarker::default(),
            print_counter: true,
        }
    }
}

/// Renders the lines for one outcome. The line shapes are a stable contract
/// for downstream log scraping; change them and scrapers break.
pub fn render(outcome: &PaymentOutcome, style: &ReportStyle, iteration: u64) -> Vec<String> {
    let null = style.null_marker.as_str();
    let mut lines = Vec::with_capacity(5);
    if style.print_counter {
        lines.push(format!(
            "---------------- Execution #{iteration} ----------------"
        ));
    }
    let payment_date = outcome
        .payment_date
        .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string());
    let ref_no = outcome.ref_no.map(|n| n.to_string());
    let error_code = outcome.error_code.map(|n| n.to_string());
    lines.push(format!(
        "PaymentDate = \"{}\"",
        payment_date.as_deref().unwrap_or(null)
    ));
    lines.push(format!("RefNo = \"{}\"", ref_no.as_deref().unwrap_or(null)));
    lines.push(format!(
        "ErrorCode = \"{}\"",
        error_code.as_deref().unwrap_or(null)
    ));
    lines.push(format!(
        "Error Message = \"{}\"",
        outcome.error_message.as_deref().unwrap_or(null)
    ));
    lines
}
