//! Rule table creation

use rusqlite::Connection;

use crate::error::AdapterError;

/// Create the rule table and its uniqueness constraint if missing
pub fn create_table(conn: &Connection, table: &str) -> Result<(), AdapterError> {
    let sql = format!(
        "CREATE TABLE IF NOT EXISTS {table} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            ptype TEXT NOT NULL DEFAULT '',
            v0 TEXT NOT NULL DEFAULT '',
            v1 TEXT NOT NULL DEFAULT '',
            v2 TEXT NOT NULL DEFAULT '',
            v3 TEXT NOT NULL DEFAULT '',
            v4 TEXT NOT NULL DEFAULT '',
            v5 TEXT NOT NULL DEFAULT '',
            UNIQUE (ptype, v0, v1, v2, v3, v4, v5)
        );"
    );
    conn.execute_batch(&sql).map_err(AdapterError::Schema)?;
    tracing::info!(table, "Rule table ready");
    Ok(())
}
