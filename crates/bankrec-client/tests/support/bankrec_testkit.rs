#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use bankrec_client::commands::ledger::{self, LoadOptions};
use bankrec_client::commands::statement::{self, ImportOptions};
use bankrec_client::{ClientResult, SuccessEnvelope};
use rusqlite::Connection;
use serde_json::{Value, json};
use tempfile::{TempDir, tempdir};

pub const STATEMENT_HEADER: &str = "Date,Description,Amount,Type,Balance";

pub struct Workspace {
    pub dir: TempDir,
    pub home: PathBuf,
}

impl Workspace {
    pub fn db_path(&self) -> PathBuf {
        self.home.join("bankrec.db")
    }

    pub fn write(&self, name: &str, body: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        let result = fs::write(&path, body);
        assert!(result.is_ok());
        path
    }
}

pub fn workspace() -> Workspace {
    let dir = tempdir();
    assert!(dir.is_ok());
    match dir {
        Ok(dir) => {
            let home = dir.path().join("bankrec-home");
            Workspace { dir, home }
        }
        Err(error) => panic!("tempdir failed: {error}"),
    }
}

pub fn statement_csv(rows: &[&str]) -> String {
    let mut body = String::from(STATEMENT_HEADER);
    body.push('\n');
    for row in rows {
        body.push_str(row);
        body.push('\n');
    }
    body
}

pub fn import_file(
    workspace: &Workspace,
    path: &Path,
    auto_reconcile: bool,
) -> ClientResult<SuccessEnvelope> {
    statement::import_with_options(ImportOptions {
        path: Some(path.display().to_string()),
        auto_reconcile,
        home_override: Some(&workspace.home),
        ..ImportOptions::default()
    })
}

/// Writes `body` under `name` and imports it, returning the envelope as JSON.
pub fn import_ok(workspace: &Workspace, name: &str, body: &str, auto_reconcile: bool) -> Value {
    let path = workspace.write(name, body);
    let result = import_file(workspace, &path, auto_reconcile);
    assert!(result.is_ok(), "import failed: {:?}", result.err());
    match result {
        Ok(envelope) => to_json(&envelope),
        Err(_) => Value::Null,
    }
}

pub fn load_ledger(workspace: &Workspace, fixture: &Value) -> Value {
    let path = workspace.write("ledger.json", &fixture.to_string());
    let result = ledger::load_with_options(LoadOptions {
        path: path.display().to_string(),
        home_override: Some(&workspace.home),
    });
    assert!(result.is_ok(), "ledger load failed: {:?}", result.err());
    match result {
        Ok(envelope) => to_json(&envelope),
        Err(_) => Value::Null,
    }
}

pub fn sale(id: i64, amount: f64, date: &str, party_id: Option<i64>) -> Value {
    json!({
        "id": id,
        "voucher_no": format!("V-{id}"),
        "voucher_type": "sale",
        "date": date,
        "total_amount": amount,
        "party_id": party_id,
    })
}

pub fn purchase(id: i64, amount: f64, date: &str, party_id: Option<i64>) -> Value {
    json!({
        "id": id,
        "voucher_no": format!("P-{id}"),
        "voucher_type": "purchase",
        "date": date,
        "total_amount": amount,
        "party_id": party_id,
    })
}

pub fn fixture(transactions: Vec<Value>) -> Value {
    json!({
        "parties": [
            {"id": 1, "name": "Acme Traders"},
            {"id": 2, "name": "Globex Supplies"}
        ],
        "transactions": transactions,
    })
}

pub fn to_json(envelope: &SuccessEnvelope) -> Value {
    let value = serde_json::to_value(envelope);
    assert!(value.is_ok());
    value.unwrap_or(Value::Null)
}

pub fn statement_id(payload: &Value) -> String {
    payload["data"]["statement_id"]
        .as_str()
        .unwrap_or_default()
        .to_string()
}

pub fn query_i64(db_path: &Path, sql: &str) -> i64 {
    let connection = Connection::open(db_path);
    assert!(connection.is_ok());
    if let Ok(conn) = connection {
        let value = conn.query_row(sql, [], |row| row.get::<_, i64>(0));
        assert!(value.is_ok(), "query failed: {sql}");
        if let Ok(count) = value {
            return count;
        }
    }
    0
}

pub fn query_string(db_path: &Path, sql: &str) -> Option<String> {
    let connection = Connection::open(db_path).ok()?;
    connection
        .query_row(sql, [], |row| row.get::<_, Option<String>>(0))
        .ok()
        .flatten()
}

pub fn payment_status(db_path: &Path, transaction_id: i64) -> Option<String> {
    query_string(
        db_path,
        &format!("SELECT payment_status FROM ledger_transactions WHERE id = {transaction_id}"),
    )
}

/// Line ids of a statement in line order.
pub fn line_ids(db_path: &Path, statement_id: &str) -> Vec<String> {
    let connection = Connection::open(db_path);
    assert!(connection.is_ok());
    let mut ids = Vec::new();
    if let Ok(conn) = connection {
        let statement = conn.prepare(
            "SELECT line_id FROM bank_transactions WHERE statement_id = ?1 ORDER BY line_no",
        );
        assert!(statement.is_ok());
        if let Ok(mut stmt) = statement {
            let rows = stmt.query_map([statement_id], |row| row.get::<_, String>(0));
            assert!(rows.is_ok());
            if let Ok(iter) = rows {
                for row in iter.flatten() {
                    ids.push(row);
                }
            }
        }
    }
    ids
}
