use rusqlite::Connection;

use crate::error::Result;
use crate::models::TransactionEvent;

/// Persists the enriched record in one statement: the row is fully present
/// with its category or absent. There is no natural-key dedup, so a
/// redelivered event writes a second row (see DESIGN.md).
pub fn write(conn: &Connection, event: &TransactionEvent, category_id: i64) -> Result<i64> {
    conn.execute(
        "INSERT INTO transactions (event_id, account_number, amount, currency, txn_type, description, category_id, occurred_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            event.event_id,
            event.account_number,
            event.amount,
            event.currency,
            event.txn_type,
            event.description,
            category_id,
            event.occurred_at.to_rfc3339(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}
