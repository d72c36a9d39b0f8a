use std::path::Path;

use rusqlite::{Connection, params};
use serde_json::Value;
use ulid::Ulid;

use crate::ClientResult;
use crate::contracts::types::AuditRecord;
use crate::state::map_sqlite_error;
use crate::statement::now_timestamp;

pub const ACTION_AUTO_MATCH: &str = "auto_match";
pub const ACTION_MATCH: &str = "match";
pub const ACTION_UNMATCH: &str = "unmatch";
pub const ACTION_IGNORE: &str = "ignore";
pub const ACTION_DELETE_STATEMENT: &str = "delete_statement";

pub const ENTITY_BANK_TRANSACTION: &str = "bank_transaction";
pub const ENTITY_BANK_STATEMENT: &str = "bank_statement";

pub const AUTO_MATCH_ACTOR: &str = "system:auto_match";

pub(crate) struct AuditEntry<'a> {
    pub(crate) performed_by: &'a str,
    pub(crate) action: &'a str,
    pub(crate) entity_type: &'a str,
    pub(crate) entity_id: &'a str,
    pub(crate) old_values: Value,
    pub(crate) new_values: Value,
}

/// Appends one record. The log is never updated or pruned.
pub(crate) fn append(
    connection: &Connection,
    db_path: &Path,
    entry: &AuditEntry<'_>,
) -> ClientResult<String> {
    let audit_id = format!("aud_{}", Ulid::new());
    connection
        .execute(
            "INSERT INTO audit_log (
                audit_id,
                performed_by,
                action,
                entity_type,
                entity_id,
                old_values,
                new_values,
                created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                &audit_id,
                entry.performed_by,
                entry.action,
                entry.entity_type,
                entry.entity_id,
                entry.old_values.to_string(),
                entry.new_values.to_string(),
                now_timestamp(),
            ],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    Ok(audit_id)
}

/// Records for one entity, oldest first.
pub(crate) fn list_for_entity(
    connection: &Connection,
    db_path: &Path,
    entity_type: &str,
    entity_id: &str,
) -> ClientResult<Vec<AuditRecord>> {
    let mut statement = connection
        .prepare(
            "SELECT
                audit_id,
                performed_by,
                action,
                entity_type,
                entity_id,
                old_values,
                new_values,
                created_at
             FROM audit_log
             WHERE entity_type = ?1 AND entity_id = ?2
             ORDER BY rowid ASC",
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    let rows_iter = statement
        .query_map(params![entity_type, entity_id], |row| {
            let old_values = row.get::<_, String>(5)?;
            let new_values = row.get::<_, String>(6)?;
            Ok(AuditRecord {
                audit_id: row.get(0)?,
                performed_by: row.get(1)?,
                action: row.get(2)?,
                entity_type: row.get(3)?,
                entity_id: row.get(4)?,
                old_values: serde_json::from_str(&old_values).unwrap_or(Value::Null),
                new_values: serde_json::from_str(&new_values).unwrap_or(Value::Null),
                created_at: row.get(7)?,
            })
        })
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut rows = Vec::new();
    for row in rows_iter {
        rows.push(row.map_err(|error| map_sqlite_error(db_path, &error))?);
    }
    Ok(rows)
}
