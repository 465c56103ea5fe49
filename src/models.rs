use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// Wire shape of a transaction event as published onto the log.
///
/// `event_id` is carried through to the store but is not a dedup key:
/// redelivery of the same event writes a second row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionEvent {
    #[serde(default)]
    pub event_id: Option<String>,
    pub account_number: String,
    pub amount: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_txn_type")]
    pub txn_type: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "Utc::now")]
    pub occurred_at: DateTime<Utc>,
}

fn default_currency() -> String {
    "ZAR".to_string()
}

fn default_txn_type() -> String {
    "Credit".to_string()
}
