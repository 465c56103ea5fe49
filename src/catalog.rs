use rusqlite::Connection;

use crate::error::{Result, TellerError};

pub fn find_by_name(conn: &Connection, name: &str) -> Result<Option<i64>> {
    let mut stmt = conn.prepare_cached("SELECT id FROM categories WHERE name = ?1")?;
    match stmt.query_row([name], |row| row.get(0)) {
        Ok(id) => Ok(Some(id)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Maps a category name to its id, creating the row on first sight.
///
/// The insert is advisory: under concurrent consumers the same new name may
/// be inserted by several callers at once, and the UNIQUE(name) constraint
/// picks the winner. Losers re-read and return the winner's id. Any other
/// insert failure propagates. A re-read miss after a uniqueness conflict
/// means the catalog itself is inconsistent and halts the consumer.
pub fn resolve(conn: &Connection, name: &str) -> Result<i64> {
    if let Some(id) = find_by_name(conn, name)? {
        return Ok(id);
    }
    match conn.execute("INSERT INTO categories (name) VALUES (?1)", [name]) {
        Ok(_) => Ok(conn.last_insert_rowid()),
        Err(e) if is_unique_violation(&e) => find_by_name(conn, name)?
            .ok_or_else(|| TellerError::CatalogInconsistent(name.to_string())),
        Err(e) => Err(e.into()),
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(err, rusqlite::Error::SqliteFailure(e, _)
        if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE)
}
