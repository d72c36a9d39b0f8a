pub mod detect;
pub mod fingerprint;
pub(crate) mod input;
pub mod parse;
pub(crate) mod store;
pub(crate) mod values;

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::contracts::types::{ImportData, UnmatchedLine};
use crate::parties::list_parties;
use crate::reconcile::matcher::auto_match_statement;
use crate::reconcile::suggest::unmatched_line;
use crate::setup::SetupContext;
use crate::state::{Store, commit};
use crate::{ClientError, ClientResult};

pub(crate) const STATE_UNRECONCILED: &str = "unreconciled";
pub(crate) const STATE_RECONCILED: &str = "reconciled";
pub(crate) const STATE_IGNORED: &str = "ignored";

pub(crate) const STATUS_IMPORTED: &str = "imported";
pub(crate) const STATUS_PROCESSING: &str = "processing";
pub(crate) const STATUS_RECONCILED: &str = "reconciled";
pub(crate) const STATUS_PARTIALLY_RECONCILED: &str = "partially_reconciled";

const UNMATCHED_PREVIEW_LIMIT: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Credit,
    Debit,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Credit => "credit",
            Self::Debit => "debit",
        }
    }
}

#[derive(Debug)]
pub(crate) struct ImportRequest {
    pub(crate) path: Option<String>,
    pub(crate) stdin_override: Option<Vec<u8>>,
    pub(crate) file_name: Option<String>,
    pub(crate) auto_reconcile: bool,
    pub(crate) config: EngineConfig,
}

/// Detect, parse, guard, persist, then auto-match.
///
/// Nothing is written unless the statement parses and its fingerprint is new.
/// Auto-matching runs after the statement commits and is best-effort.
pub(crate) fn execute(setup: &SetupContext, request: ImportRequest) -> ClientResult<ImportData> {
    let source = input::resolve_source(request.path, request.stdin_override, request.file_name)?;
    let text = source.text();

    let guess = detect::detect_format(&text, &source.file_name);
    let report = parse::parse_statement(&text, guess.format, &source.file_name)?;
    let file_hash = fingerprint::file_fingerprint(&source.bytes);

    let db_path = PathBuf::from(&setup.db_path);
    let mut store = Store::open(&db_path)?;

    if let Some(existing) =
        fingerprint::find_statement_by_fingerprint(store.connection(), &db_path, &file_hash)?
    {
        return Err(ClientError::duplicate_file(&file_hash, Some(&existing)));
    }

    let inserted = {
        let transaction = store.immediate()?;
        if let Some(existing) =
            fingerprint::find_statement_by_fingerprint(&transaction, &db_path, &file_hash)?
        {
            return Err(ClientError::duplicate_file(&file_hash, Some(&existing)));
        }
        let inserted = store::insert_statement_with_lines(
            &transaction,
            &db_path,
            &store::NewStatement {
                file_name: &source.file_name,
                file_hash: &file_hash,
                format: guess.format,
                format_confidence: guess.confidence,
            },
            &report.lines,
        )?;
        commit(transaction, &db_path)?;
        inserted
    };

    info!(
        statement_id = %inserted.statement_id,
        file_name = %source.file_name,
        format = guess.format.as_str(),
        record_count = inserted.record_count,
        skipped = report.skipped_count,
        "statement imported"
    );

    let mut matched_count = 0_i64;
    if request.auto_reconcile {
        match auto_match_statement(&mut store, &inserted.statement_id, &request.config) {
            Ok(outcome) => matched_count = outcome.matched_count,
            Err(error) => warn!(
                statement_id = %inserted.statement_id,
                code = %error.code,
                message = %error.message,
                "auto-match failed; statement kept unmatched"
            ),
        }
    }

    let unmatched = store::list_lines(
        store.connection(),
        &db_path,
        &inserted.statement_id,
        Some(STATE_UNRECONCILED),
    )?;
    let parties = list_parties(store.connection(), &db_path)?;
    let transactions = unmatched
        .iter()
        .take(UNMATCHED_PREVIEW_LIMIT)
        .map(|line| unmatched_line(line, &parties, request.config.suggestion_threshold))
        .collect::<Vec<UnmatchedLine>>();

    Ok(ImportData {
        success: true,
        statement_id: inserted.statement_id,
        file_name: source.file_name,
        total_transactions: inserted.record_count,
        total_credits: inserted.total_credits,
        total_debits: inserted.total_debits,
        matched_count,
        unmatched_count: unmatched.len() as i64,
        skipped_rows: report.skipped_count,
        warnings: report.warnings,
        transactions,
        format: guess.format,
        confidence: guess.confidence,
    })
}

pub(crate) fn now_timestamp() -> String {
    let now = SystemTime::now().duration_since(UNIX_EPOCH);
    match now {
        Ok(duration) => format!("{}", duration.as_secs()),
        Err(_) => "0".to_string(),
    }
}
