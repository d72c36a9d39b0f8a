use std::path::Path;

use serde_json::{Value, json};
use thiserror::Error;

pub(crate) const IMPORT_HELP_COMMAND: &str = "bankrec statement import --help";

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ClientError {
    pub code: String,
    pub message: String,
    pub recovery_steps: Vec<String>,
    pub data: Option<Value>,
}

impl ClientError {
    pub fn new(code: &str, message: &str, recovery_steps: Vec<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            recovery_steps,
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn invalid_argument(message: &str) -> Self {
        Self::invalid_argument_for_command(message, None)
    }

    pub fn invalid_argument_for_command(message: &str, command: Option<&str>) -> Self {
        let help_hint = match command {
            Some(cmd) => format!("Run `bankrec {cmd} --help` for usage."),
            None => "Run `bankrec --help` for usage.".to_string(),
        };
        let error = Self::new("INVALID_ARGUMENT", message, vec![help_hint]);
        if let Some(cmd) = command {
            return error.with_data(json!({
                "command_hint": cmd,
            }));
        }
        error
    }

    pub fn invalid_argument_with_recovery(message: &str, recovery_steps: Vec<String>) -> Self {
        Self::new("INVALID_ARGUMENT", message, recovery_steps)
    }

    pub fn import_error(message: &str) -> Self {
        Self::new(
            "IMPORT_ERROR",
            message,
            vec![
                "Verify the statement file exists and is readable.".to_string(),
                format!("Run `{IMPORT_HELP_COMMAND}` for accepted inputs."),
            ],
        )
    }

    /// Wraps any non-import failure raised while importing so callers only
    /// ever see the three import error codes.
    pub fn import_error_from(cause: &ClientError) -> Self {
        if matches!(
            cause.code.as_str(),
            "IMPORT_ERROR" | "NO_TRANSACTIONS_FOUND" | "DUPLICATE_FILE"
        ) {
            return cause.clone();
        }
        Self::new("IMPORT_ERROR", &cause.message, cause.recovery_steps.clone()).with_data(json!({
            "cause": cause.code,
        }))
    }

    pub fn no_transactions_found(file_name: &str, skipped_rows: i64) -> Self {
        Self::new(
            "NO_TRANSACTIONS_FOUND",
            &format!("No transactions could be parsed from `{file_name}`. Nothing was written."),
            vec![
                "Check that the file is a delimited bank statement export with a header row."
                    .to_string(),
                "Make sure the header names a date column and an amount, debit, or credit column."
                    .to_string(),
            ],
        )
        .with_data(json!({
            "file_name": file_name,
            "skipped_rows": skipped_rows,
        }))
    }

    pub fn duplicate_file(file_hash: &str, existing_statement_id: Option<&str>) -> Self {
        Self::new(
            "DUPLICATE_FILE",
            "This file was already imported. No rows were written.",
            vec![
                "Run `bankrec statement list` to find the existing statement.".to_string(),
                "Delete that statement first if you really need to re-import it.".to_string(),
            ],
        )
        .with_data(json!({
            "file_hash": file_hash,
            "existing_statement_id": existing_statement_id,
        }))
    }

    pub fn statement_not_found(statement_id: &str) -> Self {
        Self::new(
            "STATEMENT_NOT_FOUND",
            &format!("Statement `{statement_id}` was not found."),
            vec!["Run `bankrec statement list` to find a valid statement id.".to_string()],
        )
        .with_data(json!({
            "statement_id": statement_id,
        }))
    }

    pub fn line_not_found(line_id: &str) -> Self {
        Self::new(
            "LINE_NOT_FOUND",
            &format!("Bank transaction line `{line_id}` was not found."),
            vec!["Run `bankrec statement show <statement_id>` to list line ids.".to_string()],
        )
        .with_data(json!({
            "line_id": line_id,
        }))
    }

    pub fn transaction_not_found(transaction_id: i64) -> Self {
        Self::new(
            "TRANSACTION_NOT_FOUND",
            &format!("Accounting transaction `{transaction_id}` was not found."),
            vec!["Run `bankrec ledger load <path>` to load accounting transactions.".to_string()],
        )
        .with_data(json!({
            "transaction_id": transaction_id,
        }))
    }

    pub fn line_already_reconciled(line_id: &str, matched_transaction_id: Option<i64>) -> Self {
        Self::new(
            "LINE_ALREADY_RECONCILED",
            &format!("Line `{line_id}` is already reconciled. Nothing was changed."),
            vec![format!(
                "Run `bankrec reconcile unmatch {line_id}` first to release the existing match."
            )],
        )
        .with_data(json!({
            "line_id": line_id,
            "matched_transaction_id": matched_transaction_id,
        }))
    }

    pub fn line_ignored(line_id: &str) -> Self {
        Self::new(
            "LINE_IGNORED",
            &format!("Line `{line_id}` is marked ignored. Nothing was changed."),
            vec![format!(
                "Run `bankrec reconcile unmatch {line_id}` to return it to the unreconciled pool."
            )],
        )
        .with_data(json!({
            "line_id": line_id,
        }))
    }

    pub fn line_not_reconciled(line_id: &str) -> Self {
        Self::new(
            "LINE_NOT_RECONCILED",
            &format!("Line `{line_id}` is not reconciled. Nothing was changed."),
            Vec::new(),
        )
        .with_data(json!({
            "line_id": line_id,
        }))
    }

    pub fn transaction_already_matched(transaction_id: i64, matched_line_id: &str) -> Self {
        Self::new(
            "TRANSACTION_ALREADY_MATCHED",
            &format!(
                "Accounting transaction `{transaction_id}` is already matched to line `{matched_line_id}`. Nothing was changed."
            ),
            vec![format!(
                "Run `bankrec reconcile unmatch {matched_line_id}` to release it first."
            )],
        )
        .with_data(json!({
            "transaction_id": transaction_id,
            "matched_line_id": matched_line_id,
        }))
    }

    pub fn invalid_ledger_fixture(message: &str) -> Self {
        Self::invalid_argument_with_recovery(
            message,
            vec![
                "Provide a JSON object with `parties` and `transactions` arrays.".to_string(),
                "Run `bankrec ledger load --help` for the fixture layout.".to_string(),
            ],
        )
    }

    pub fn internal_serialization(message: &str) -> Self {
        Self::new("INTERNAL_SERIALIZATION_ERROR", message, Vec::new())
    }

    pub fn ledger_permission_denied(path: &Path, detail: &str) -> Self {
        let location = path.display().to_string();
        Self::new(
            "LEDGER_PERMISSION_DENIED",
            &format!("Cannot open the reconciliation store at `{location}`: {detail}"),
            vec![format!(
                "Grant write access to `{location}` or set `BANKREC_HOME` to a writable directory."
            )],
        )
    }

    pub fn ledger_locked(path: &Path) -> Self {
        let location = path.display().to_string();
        Self::new(
            "LEDGER_LOCKED",
            &format!("Reconciliation store is locked at `{location}`."),
            vec![format!(
                "Close other processes using `{location}` so the lock is released."
            )],
        )
    }

    pub fn ledger_corrupt(path: &Path) -> Self {
        let location = path.display().to_string();
        Self::new(
            "LEDGER_CORRUPT",
            &format!("Reconciliation store appears corrupt at `{location}`."),
            vec![format!(
                "Replace `{location}` with a valid SQLite file or restore from backup."
            )],
        )
    }

    pub fn migration_failed(path: &Path, detail: &str) -> Self {
        let location = path.display().to_string();
        Self::new(
            "MIGRATION_FAILED",
            &format!("Store migration failed at `{location}`: {detail}"),
            vec!["Resolve conflicting schema objects referenced in the error details.".to_string()],
        )
    }

    pub fn ledger_failure(path: &Path, detail: &str) -> Self {
        let location = path.display().to_string();
        Self::new(
            "LEDGER_FAILURE",
            &format!("Reconciliation store operation failed at `{location}`: {detail}"),
            Vec::new(),
        )
    }

    pub fn is_internal(&self) -> bool {
        self.code.starts_with("INTERNAL_")
            || matches!(
                self.code.as_str(),
                "LEDGER_PERMISSION_DENIED"
                    | "LEDGER_LOCKED"
                    | "LEDGER_CORRUPT"
                    | "MIGRATION_FAILED"
                    | "LEDGER_FAILURE"
            )
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
