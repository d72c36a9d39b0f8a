use std::path::Path;

use chrono::{NaiveDate, TimeDelta};
use rusqlite::Connection;
use serde_json::json;
use tracing::{debug, info};

use crate::audit::{self, AuditEntry};
use crate::config::EngineConfig;
use crate::contracts::types::{AutoMatchDecision, AutoReconcileData, StatementLine, UnmatchedLine};
use crate::ledger::{self, LedgerTransaction};
use crate::parties::list_parties;
use crate::reconcile::scoring::{
    MatchCandidate, MatchLimits, match_confidence, meets_floor, rank_candidates, score_candidate,
};
use crate::reconcile::suggest::unmatched_line;
use crate::reconcile::{CATEGORY_AUTO, voucher_type_for};
use crate::state::{Store, commit};
use crate::statement::store::{
    apply_match, list_lines, refresh_status, require_statement, set_statement_status,
};
use crate::statement::{STATE_UNRECONCILED, STATUS_PROCESSING};
use crate::{ClientError, ClientResult};

/// Binds each unreconciled line of a statement to at most one open
/// accounting transaction, in line order, inside one write transaction.
/// Lines left over carry a party suggestion.
pub fn auto_match_statement(
    store: &mut Store,
    statement_id: &str,
    config: &EngineConfig,
) -> ClientResult<AutoReconcileData> {
    let db_path = store.db_path().to_path_buf();
    let transaction = store.immediate()?;

    require_statement(&transaction, &db_path, statement_id)?;
    set_statement_status(&transaction, &db_path, statement_id, STATUS_PROCESSING)?;

    let lines = list_lines(
        &transaction,
        &db_path,
        statement_id,
        Some(STATE_UNRECONCILED),
    )?;

    let parties = list_parties(&transaction, &db_path)?;

    let mut matches = Vec::new();
    let mut unmatched = Vec::<UnmatchedLine>::new();
    for line in &lines {
        let Some(best) = best_candidate(&transaction, &db_path, line, config)? else {
            debug!(line_id = %line.line_id, "no candidate cleared the floor");
            unmatched.push(unmatched_line(line, &parties, config.suggestion_threshold));
            continue;
        };
        matches.push(accept_match(&transaction, &db_path, line, &best)?);
    }

    let status = refresh_status(&transaction, &db_path, statement_id)?;
    commit(transaction, &db_path)?;

    let matched_count = matches.len() as i64;
    let unmatched_count = unmatched.len() as i64;
    info!(
        statement_id,
        matched_count, unmatched_count, status = %status, "auto-match finished"
    );

    Ok(AutoReconcileData {
        statement_id: statement_id.to_string(),
        status,
        matched_count,
        unmatched_count,
        matches,
        unmatched,
    })
}

/// Builds the pool for `line`, scores it and returns the head of the ranking.
fn best_candidate(
    connection: &Connection,
    db_path: &Path,
    line: &StatementLine,
    config: &EngineConfig,
) -> ClientResult<Option<MatchCandidate>> {
    let Some(line_date) = line
        .transaction_date
        .as_deref()
        .and_then(|value| NaiveDate::parse_from_str(value, "%Y-%m-%d").ok())
    else {
        return Ok(None);
    };

    let Some(voucher_type) = voucher_type_for(&line.direction) else {
        return Ok(None);
    };

    let limits = MatchLimits {
        amount: config
            .tolerance
            .limit_for(line.amount, config.min_amount_tolerance),
        date_days: config.date_window_days,
    };
    let (from, to) = window_bounds(line_date, config.date_window_days);
    let pool = ledger::open_candidates(connection, db_path, voucher_type, from, to)?;

    let scored = pool
        .iter()
        .filter_map(|candidate| score_pool_entry(line, line_date, candidate, &limits))
        // Pooled candidates score at least the floor; this only guards the ranking.
        .filter(|candidate| meets_floor(candidate.score))
        .collect::<Vec<MatchCandidate>>();

    for candidate in &scored {
        debug!(
            line_id = %line.line_id,
            transaction_id = candidate.transaction_id,
            amount_delta = candidate.amount_delta,
            date_delta_days = candidate.date_delta_days,
            score = candidate.score,
            "scored candidate"
        );
    }

    Ok(rank_candidates(scored).into_iter().next())
}

// Ledger dates are compared as `YYYY-MM-DD` text, so bounds stay within four-digit years.
const EARLIEST_LEDGER_DATE: NaiveDate = match NaiveDate::from_ymd_opt(1, 1, 1) {
    Some(date) => date,
    None => NaiveDate::MIN,
};
const LATEST_LEDGER_DATE: NaiveDate = match NaiveDate::from_ymd_opt(9999, 12, 31) {
    Some(date) => date,
    None => NaiveDate::MAX,
};

/// Inclusive date range around `line_date`, saturating at the ledger's date limits.
fn window_bounds(line_date: NaiveDate, days: i64) -> (NaiveDate, NaiveDate) {
    let Some(window) = TimeDelta::try_days(days) else {
        return (EARLIEST_LEDGER_DATE, LATEST_LEDGER_DATE);
    };
    let from = line_date
        .checked_sub_signed(window)
        .map_or(EARLIEST_LEDGER_DATE, |date| date.max(EARLIEST_LEDGER_DATE));
    let to = line_date
        .checked_add_signed(window)
        .map_or(LATEST_LEDGER_DATE, |date| date.min(LATEST_LEDGER_DATE));
    (from, to)
}

fn score_pool_entry(
    line: &StatementLine,
    line_date: NaiveDate,
    candidate: &LedgerTransaction,
    limits: &MatchLimits,
) -> Option<MatchCandidate> {
    let candidate_date = NaiveDate::parse_from_str(&candidate.date, "%Y-%m-%d").ok()?;
    let amount_delta = (line.amount - candidate.total_amount).abs();
    let date_delta_days = (line_date - candidate_date).num_days().abs();
    if !limits.admits(amount_delta, date_delta_days) {
        return None;
    }

    Some(MatchCandidate {
        transaction_id: candidate.id,
        total_amount: candidate.total_amount,
        amount_delta,
        date_delta_days,
        score: score_candidate(amount_delta, date_delta_days, limits),
    })
}

fn accept_match(
    connection: &Connection,
    db_path: &Path,
    line: &StatementLine,
    candidate: &MatchCandidate,
) -> ClientResult<AutoMatchDecision> {
    let Some(accounting) = ledger::get_transaction(connection, db_path, candidate.transaction_id)?
    else {
        return Err(ClientError::transaction_not_found(
            candidate.transaction_id,
        ));
    };

    let confidence = match_confidence(line.amount, candidate.amount_delta);
    let payment_status = ledger::settled_status(line.amount, accounting.total_amount);

    apply_match(
        connection,
        db_path,
        &line.line_id,
        accounting.id,
        CATEGORY_AUTO,
        confidence,
        &accounting.payment_status,
    )?;
    ledger::set_payment_status(connection, db_path, accounting.id, payment_status)?;

    audit::append(
        connection,
        db_path,
        &AuditEntry {
            performed_by: audit::AUTO_MATCH_ACTOR,
            action: audit::ACTION_AUTO_MATCH,
            entity_type: audit::ENTITY_BANK_TRANSACTION,
            entity_id: &line.line_id,
            old_values: json!({
                "reconciliation_state": line.reconciliation_state,
                "matched_transaction_id": null,
                "payment_status": accounting.payment_status,
            }),
            new_values: json!({
                "reconciliation_state": "reconciled",
                "matched_transaction_id": accounting.id,
                "match_category": CATEGORY_AUTO,
                "match_confidence": confidence,
                "score": candidate.score,
                "payment_status": payment_status,
            }),
        },
    )?;

    debug!(
        line_id = %line.line_id,
        transaction_id = accounting.id,
        confidence,
        "auto-matched line"
    );

    Ok(AutoMatchDecision {
        line_id: line.line_id.clone(),
        transaction_id: accounting.id,
        score: candidate.score,
        confidence,
        payment_status: payment_status.to_string(),
    })
}
