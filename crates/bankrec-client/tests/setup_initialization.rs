mod support;

use std::fs;

use bankrec_client::migrations::{EXPECTED_USER_VERSION, REQUIRED_INDEX_NAMES};
use bankrec_client::setup::ensure_initialized_at;
use rusqlite::Connection;

use support::bankrec_testkit::{Workspace, query_i64, query_string, workspace};

fn initialized() -> Workspace {
    let ws = workspace();
    let context = ensure_initialized_at(&ws.home);
    assert!(context.is_ok(), "setup failed: {:?}", context.err());
    ws
}

/// Runs `sql` against the store outside the client, as a tampering user would.
fn tamper(ws: &Workspace, sql: &str) {
    let connection = Connection::open(ws.db_path());
    assert!(connection.is_ok());
    if let Ok(conn) = connection {
        assert!(conn.execute_batch(sql).is_ok(), "tamper failed: {sql}");
    }
}

fn setup_error_code(ws: &Workspace) -> Option<String> {
    ensure_initialized_at(&ws.home).err().map(|error| error.code)
}

fn object_count(ws: &Workspace, object_type: &str, name: &str) -> i64 {
    query_i64(
        &ws.db_path(),
        &format!("SELECT COUNT(*) FROM sqlite_master WHERE type = '{object_type}' AND name = '{name}'"),
    )
}

fn column_count(ws: &Workspace, table: &str, column: &str) -> i64 {
    query_i64(
        &ws.db_path(),
        &format!("SELECT COUNT(*) FROM pragma_table_info('{table}') WHERE name = '{column}'"),
    )
}

#[test]
fn setup_creates_store_db_at_home_override() {
    let ws = workspace();
    let context = ensure_initialized_at(&ws.home);
    assert!(context.is_ok());
    if let Ok(setup_context) = context {
        assert!(setup_context.db_path.ends_with("bankrec.db"));
        assert_eq!(setup_context.schema_version, "v1");
    }
    assert!(ws.db_path().exists());
}

#[test]
fn setup_is_idempotent_and_migrations_apply_once() {
    let ws = initialized();
    let again = ensure_initialized_at(&ws.home);
    assert!(again.is_ok());
    assert_eq!(
        query_i64(&ws.db_path(), "PRAGMA user_version"),
        EXPECTED_USER_VERSION
    );
}

#[test]
fn setup_creates_statement_ledger_and_audit_tables() {
    let ws = initialized();

    for table in [
        "bank_statements",
        "bank_transactions",
        "parties",
        "ledger_transactions",
        "audit_log",
    ] {
        assert_eq!(object_count(&ws, "table", table), 1, "missing {table}");
    }
    for (table, column) in [
        ("bank_statements", "file_hash"),
        ("bank_transactions", "reconciliation_state"),
        ("bank_transactions", "prior_payment_status"),
        ("ledger_transactions", "payment_status"),
        ("audit_log", "performed_by"),
    ] {
        assert_eq!(column_count(&ws, table, column), 1, "missing {table}.{column}");
    }
    for index_name in REQUIRED_INDEX_NAMES {
        assert_eq!(object_count(&ws, "index", index_name), 1, "missing {index_name}");
    }
}

#[test]
fn setup_recreates_a_dropped_index() {
    let ws = initialized();
    tamper(&ws, "DROP INDEX uq_bank_transactions_matched_transaction;");
    assert_eq!(
        object_count(&ws, "index", "uq_bank_transactions_matched_transaction"),
        0
    );

    assert!(ensure_initialized_at(&ws.home).is_ok());
    assert_eq!(
        object_count(&ws, "index", "uq_bank_transactions_matched_transaction"),
        1
    );
}

#[test]
fn setup_restores_a_deleted_meta_key() {
    let ws = initialized();
    tamper(
        &ws,
        "DELETE FROM internal_meta WHERE key = 'import_contract_version';",
    );

    assert!(ensure_initialized_at(&ws.home).is_ok());
    assert_eq!(
        query_string(
            &ws.db_path(),
            "SELECT value FROM internal_meta WHERE key = 'import_contract_version'"
        ),
        Some("v1".to_string())
    );
}

#[test]
fn setup_rejects_a_drifted_meta_value() {
    let ws = initialized();
    tamper(
        &ws,
        "UPDATE internal_meta SET value = 'v9' WHERE key = 'schema_version';",
    );
    assert_eq!(setup_error_code(&ws), Some("LEDGER_CORRUPT".to_string()));
}

#[test]
fn setup_fails_when_core_table_missing() {
    let ws = initialized();
    tamper(&ws, "DROP TABLE audit_log;");
    assert_eq!(setup_error_code(&ws), Some("LEDGER_CORRUPT".to_string()));
}

#[test]
fn setup_maps_locked_database_to_ledger_locked() {
    let ws = initialized();
    let connection = Connection::open(ws.db_path());
    assert!(connection.is_ok());
    if let Ok(conn) = connection {
        assert!(conn.execute_batch("BEGIN EXCLUSIVE;").is_ok());
        assert_eq!(setup_error_code(&ws), Some("LEDGER_LOCKED".to_string()));
        assert!(conn.execute_batch("ROLLBACK;").is_ok());
    }
}

#[test]
fn setup_maps_corrupt_database_to_ledger_corrupt() {
    let ws = workspace();
    assert!(fs::create_dir_all(&ws.home).is_ok());
    assert!(fs::write(ws.db_path(), "not-a-sqlite-database").is_ok());

    assert_eq!(setup_error_code(&ws), Some("LEDGER_CORRUPT".to_string()));
}
