use serde::Deserialize;

/// The nine inputs of one payment invocation, all carried as text the way
/// the upstream interface supplies them. Number-typed fields are parsed at
/// call-building time, not here.
///
/// `Default` holds the fixed sample values; a `[payment]` section in the
/// config file replaces any of them at runtime.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PaymentParams {
    pub lang_code: String,
    pub sender_id: String,
    pub provider_code: String,
    pub sender_transaction_id: String,
    pub acquirer_rrn: String,
    pub customer_idno: String,
    pub service_id: String,
    pub payment_amount: String,
    pub payment_type: String,
}

impl Default for PaymentParams {
    fn default() -> Self {
        Self {
            lang_code: "EN".to_owned(),
            sender_id: "123".to_owned(),
            provider_code: "456".to_owned(),
            sender_transaction_id: "TX123".to_owned(),
            acquirer_rrn: "RRN123".to_owned(),
            customer_idno: "CID123".to_owned(),
            service_id: "10".to_owned(),
            payment_amount: "100.50".to_owned(),
            payment_type: "1".to_owned(),
        }
    }
}
