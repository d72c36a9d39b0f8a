use std::path::Path;

use tracing::info;

use crate::commands::{DEFAULT_ACTOR, open_store};
use crate::config::{EngineConfig, Tolerance};
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::{StatementDetailData, StatementListData};
use crate::setup::load_setup;
use crate::state::commit;
use crate::statement::store::{
    delete_statement, list_lines, list_statements, reconciliation_status, require_statement,
};
use crate::statement::{self, ImportRequest};
use crate::{ClientError, ClientResult};

#[derive(Debug)]
pub struct ImportOptions<'a> {
    pub path: Option<String>,
    pub auto_reconcile: bool,
    pub tolerance: Option<Tolerance>,
    pub date_window_days: Option<i64>,
    pub home_override: Option<&'a Path>,
    pub stdin_override: Option<Vec<u8>>,
    pub file_name_override: Option<String>,
}

impl Default for ImportOptions<'_> {
    fn default() -> Self {
        Self {
            path: None,
            auto_reconcile: true,
            tolerance: None,
            date_window_days: None,
            home_override: None,
            stdin_override: None,
            file_name_override: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct StatementOptions<'a> {
    pub statement_id: String,
    pub home_override: Option<&'a Path>,
}

#[derive(Debug, Default)]
pub struct DeleteOptions<'a> {
    pub statement_id: String,
    pub performed_by: Option<String>,
    pub home_override: Option<&'a Path>,
}

pub fn import(path: Option<String>) -> ClientResult<SuccessEnvelope> {
    import_with_options(ImportOptions {
        path,
        ..ImportOptions::default()
    })
}

/// Imports one statement file. Every failure is reported with one of the
/// import codes: `NO_TRANSACTIONS_FOUND`, `DUPLICATE_FILE` or `IMPORT_ERROR`.
#[doc(hidden)]
pub fn import_with_options(options: ImportOptions<'_>) -> ClientResult<SuccessEnvelope> {
    run_import(options).map_err(|error| ClientError::import_error_from(&error))
}

fn run_import(options: ImportOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let config = EngineConfig::from_env()?.with_overrides(options.tolerance, options.date_window_days)?;
    let setup = load_setup(options.home_override)?;
    let data = statement::execute(
        &setup,
        ImportRequest {
            path: options.path,
            stdin_override: options.stdin_override,
            file_name: options.file_name_override,
            auto_reconcile: options.auto_reconcile,
            config,
        },
    )?;
    success("statement import", data)
}

pub fn list() -> ClientResult<SuccessEnvelope> {
    list_with_options(None)
}

#[doc(hidden)]
pub fn list_with_options(home_override: Option<&Path>) -> ClientResult<SuccessEnvelope> {
    let store = open_store(home_override)?;
    let rows = list_statements(store.connection(), store.db_path())?;
    success("statement list", StatementListData { rows })
}

pub fn show(statement_id: &str) -> ClientResult<SuccessEnvelope> {
    show_with_options(StatementOptions {
        statement_id: statement_id.to_string(),
        home_override: None,
    })
}

#[doc(hidden)]
pub fn show_with_options(options: StatementOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let store = open_store(options.home_override)?;
    let statement = require_statement(store.connection(), store.db_path(), &options.statement_id)?;
    let lines = list_lines(
        store.connection(),
        store.db_path(),
        &options.statement_id,
        None,
    )?;
    success("statement show", StatementDetailData { statement, lines })
}

pub fn status(statement_id: &str) -> ClientResult<SuccessEnvelope> {
    status_with_options(StatementOptions {
        statement_id: statement_id.to_string(),
        home_override: None,
    })
}

#[doc(hidden)]
pub fn status_with_options(options: StatementOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let store = open_store(options.home_override)?;
    let data =
        reconciliation_status(store.connection(), store.db_path(), &options.statement_id)?;
    success("statement status", data)
}

pub fn delete(statement_id: &str) -> ClientResult<SuccessEnvelope> {
    delete_with_options(DeleteOptions {
        statement_id: statement_id.to_string(),
        performed_by: None,
        home_override: None,
    })
}

#[doc(hidden)]
pub fn delete_with_options(options: DeleteOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let mut store = open_store(options.home_override)?;
    let db_path = store.db_path().to_path_buf();
    let performed_by = options
        .performed_by
        .unwrap_or_else(|| DEFAULT_ACTOR.to_string());

    let transaction = store.immediate()?;
    let data = delete_statement(
        &transaction,
        &db_path,
        &options.statement_id,
        &performed_by,
    )?;
    commit(transaction, &db_path)?;

    info!(
        statement_id = %options.statement_id,
        deleted_lines = data.deleted_lines,
        "statement deleted"
    );
    success("statement delete", data)
}
