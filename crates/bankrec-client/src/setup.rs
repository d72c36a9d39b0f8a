use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};

use crate::migrations::{
    EXPECTED_USER_VERSION, REQUIRED_INDEX_NAMES, REQUIRED_META_KEYS, run_pending,
    safe_repair_statement,
};
use crate::state::{
    ensure_store_directory, map_sqlite_error, open_connection, resolve_store_home, store_db_path,
};
use crate::{ClientError, ClientResult};

const INTERNAL_META_COLUMNS: [&str; 2] = ["key", "value"];
const BANK_STATEMENTS_COLUMNS: [&str; 11] = [
    "statement_id",
    "file_name",
    "file_hash",
    "import_date",
    "statement_date",
    "total_credits",
    "total_debits",
    "record_count",
    "status",
    "format_id",
    "format_confidence",
];
const BANK_TRANSACTIONS_COLUMNS: [&str; 13] = [
    "line_id",
    "statement_id",
    "line_no",
    "transaction_date",
    "description",
    "amount",
    "direction",
    "balance",
    "reconciliation_state",
    "matched_transaction_id",
    "match_category",
    "match_confidence",
    "prior_payment_status",
];
const PARTIES_COLUMNS: [&str; 2] = ["id", "name"];
const LEDGER_TRANSACTIONS_COLUMNS: [&str; 7] = [
    "id",
    "voucher_no",
    "voucher_type",
    "date",
    "total_amount",
    "party_id",
    "payment_status",
];
const AUDIT_LOG_COLUMNS: [&str; 8] = [
    "audit_id",
    "performed_by",
    "action",
    "entity_type",
    "entity_id",
    "old_values",
    "new_values",
    "created_at",
];

const REQUIRED_CORE_TABLES: [(&str, &[&str]); 6] = [
    ("internal_meta", &INTERNAL_META_COLUMNS),
    ("bank_statements", &BANK_STATEMENTS_COLUMNS),
    ("bank_transactions", &BANK_TRANSACTIONS_COLUMNS),
    ("parties", &PARTIES_COLUMNS),
    ("ledger_transactions", &LEDGER_TRANSACTIONS_COLUMNS),
    ("audit_log", &AUDIT_LOG_COLUMNS),
];

#[derive(Debug, Clone)]
pub struct SetupContext {
    pub db_path: String,
    pub schema_version: String,
}

pub fn ensure_initialized() -> ClientResult<SetupContext> {
    load_setup(None)
}

pub fn ensure_initialized_at(home_override: &Path) -> ClientResult<SetupContext> {
    load_setup(Some(home_override))
}

/// Opens (creating if needed) the store under the resolved home, migrates it,
/// repairs missing indexes and meta rows, then verifies the result.
pub(crate) fn load_setup(home_override: Option<&Path>) -> ClientResult<SetupContext> {
    let store_home = resolve_store_home(home_override)?;
    ensure_store_directory(&store_home)?;

    let db_path = store_db_path(&store_home);
    let mut connection = open_connection(&db_path)?;
    run_pending(&mut connection).map_err(|error| map_migration_error(&db_path, &error))?;

    let check = SchemaCheck {
        connection: &connection,
        db_path: &db_path,
    };
    check.require_core_tables()?;
    check.repair()?;
    check.require_user_version()?;
    check.require_meta()?;
    check.require_indexes()?;
    let schema_version = check
        .meta_value("schema_version")?
        .unwrap_or_else(|| "v1".to_string());

    Ok(SetupContext {
        db_path: db_path.display().to_string(),
        schema_version,
    })
}

fn map_migration_error(db_path: &Path, error: &rusqlite_migration::Error) -> ClientError {
    if let rusqlite_migration::Error::RusqliteError { err, .. } = error {
        let mapped = map_sqlite_error(db_path, err);
        if matches!(
            mapped.code.as_str(),
            "LEDGER_LOCKED" | "LEDGER_CORRUPT" | "LEDGER_PERMISSION_DENIED"
        ) {
            return mapped;
        }
    }
    ClientError::migration_failed(db_path, &error.to_string())
}

struct SchemaCheck<'a> {
    connection: &'a Connection,
    db_path: &'a Path,
}

impl SchemaCheck<'_> {
    fn sqlite_error(&self, error: &rusqlite::Error) -> ClientError {
        map_sqlite_error(self.db_path, error)
    }

    fn corrupt(&self) -> ClientError {
        ClientError::ledger_corrupt(self.db_path)
    }

    fn require_core_tables(&self) -> ClientResult<()> {
        for (table_name, required_columns) in REQUIRED_CORE_TABLES {
            if !self.object_exists("table", table_name)? {
                return Err(self.corrupt());
            }
            let columns = self.table_columns(table_name)?;
            if required_columns
                .iter()
                .any(|required| !columns.iter().any(|column| column == required))
            {
                return Err(self.corrupt());
            }
        }
        Ok(())
    }

    /// Meta rows are only inserted when absent; a drifted value fails `require_meta`.
    fn repair(&self) -> ClientResult<()> {
        for (meta_key, default_value) in REQUIRED_META_KEYS {
            self.connection
                .execute(
                    "INSERT OR IGNORE INTO internal_meta (key, value) VALUES (?1, ?2)",
                    params![meta_key, default_value],
                )
                .map_err(|error| self.sqlite_error(&error))?;
        }

        for index_name in REQUIRED_INDEX_NAMES {
            if self.object_exists("index", index_name)? {
                continue;
            }
            let sql = safe_repair_statement(index_name).ok_or_else(|| {
                ClientError::ledger_failure(self.db_path, "No repair SQL is embedded for this index.")
            })?;
            tracing::warn!(index = index_name, "recreating missing index");
            self.connection
                .execute_batch(&sql)
                .map_err(|error| self.sqlite_error(&error))?;
        }
        Ok(())
    }

    fn require_user_version(&self) -> ClientResult<()> {
        let user_version = self
            .connection
            .query_row("PRAGMA user_version", [], |row| row.get::<_, i64>(0))
            .map_err(|error| self.sqlite_error(&error))?;
        if user_version == EXPECTED_USER_VERSION {
            Ok(())
        } else {
            Err(self.corrupt())
        }
    }

    fn require_meta(&self) -> ClientResult<()> {
        for (meta_key, expected_value) in REQUIRED_META_KEYS {
            if self.meta_value(meta_key)?.as_deref() != Some(expected_value) {
                return Err(self.corrupt());
            }
        }
        Ok(())
    }

    fn require_indexes(&self) -> ClientResult<()> {
        for index_name in REQUIRED_INDEX_NAMES {
            if !self.object_exists("index", index_name)? {
                return Err(self.corrupt());
            }
        }
        Ok(())
    }

    fn meta_value(&self, key: &str) -> ClientResult<Option<String>> {
        self.connection
            .query_row(
                "SELECT value FROM internal_meta WHERE key = ?1 LIMIT 1",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(|error| self.sqlite_error(&error))
    }

    fn object_exists(&self, object_type: &str, object_name: &str) -> ClientResult<bool> {
        self.connection
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = ?1 AND name = ?2 LIMIT 1",
                params![object_type, object_name],
                |_row| Ok(()),
            )
            .optional()
            .map(|found| found.is_some())
            .map_err(|error| self.sqlite_error(&error))
    }

    fn table_columns(&self, table_name: &str) -> ClientResult<Vec<String>> {
        // PRAGMA cannot bind parameters; only names from REQUIRED_CORE_TABLES reach here.
        if !REQUIRED_CORE_TABLES
            .iter()
            .any(|(required, _)| *required == table_name)
        {
            return Err(ClientError::ledger_failure(
                self.db_path,
                "Refused to inspect a table outside the core schema.",
            ));
        }

        let mut statement = self
            .connection
            .prepare(&format!("PRAGMA table_info({table_name})"))
            .map_err(|error| self.sqlite_error(&error))?;
        let columns = statement
            .query_map([], |row| row.get::<_, String>(1))
            .map_err(|error| self.sqlite_error(&error))?
            .collect::<Result<Vec<String>, _>>()
            .map_err(|error| self.sqlite_error(&error))?;
        Ok(columns)
    }
}
