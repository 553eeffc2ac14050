//! Builds `ClassMetadata` from an existing SQLite table.
//!
//! Foreign-key columns become associations named after the column without
//! its `_id` suffix; every other column becomes a field. Tables without a
//! primary key are identified by `rowid`.

use super::{DbError, DbResult};
use crate::model::metadata::ClassMetadata;
use rusqlite::Connection;

const ROWID_IDENTIFIER: &str = "rowid";

/// Reflects metadata for `entity_name` stored in `table`.
///
/// # Errors
/// - `DbError::MissingTable` when `table` has no columns.
pub fn reflect_metadata(
    conn: &Connection,
    entity_name: &str,
    table: &str,
) -> DbResult<ClassMetadata> {
    let join_columns = foreign_key_columns(conn, table)?;

    let mut stmt = conn.prepare("SELECT name, pk FROM pragma_table_info(?1) ORDER BY cid;")?;
    let mut rows = stmt.query([table])?;
    let mut metadata = ClassMetadata::new(entity_name).with_table(table);
    let mut seen_any = false;
    let mut identifier: Option<String> = None;

    while let Some(row) = rows.next()? {
        seen_any = true;
        let column: String = row.get(0)?;
        let pk: i64 = row.get(1)?;

        if pk == 1 && identifier.is_none() {
            identifier = Some(column.clone());
        }
        if join_columns.contains(&column) {
            let field = column
                .strip_suffix("_id")
                .filter(|stem| !stem.is_empty())
                .unwrap_or(column.as_str())
                .to_string();
            metadata = metadata.with_association(field, column.as_str());
            continue;
        }
        metadata = metadata.with_field(column);
    }

    if !seen_any {
        return Err(DbError::MissingTable(table.to_string()));
    }
    let identifier = identifier.unwrap_or_else(|| ROWID_IDENTIFIER.to_string());
    Ok(metadata.with_identifier(identifier))
}

fn foreign_key_columns(conn: &Connection, table: &str) -> DbResult<Vec<String>> {
    let mut stmt = conn.prepare("SELECT \"from\" FROM pragma_foreign_key_list(?1);")?;
    let mut rows = stmt.query([table])?;
    let mut columns = Vec::new();
    while let Some(row) = rows.next()? {
        columns.push(row.get(0)?);
    }
    Ok(columns)
}
