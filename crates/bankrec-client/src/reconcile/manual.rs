use serde_json::json;
use tracing::info;

use crate::audit::{self, AuditEntry};
use crate::contracts::types::{AuditRecord, LineActionData};
use crate::ledger;
use crate::reconcile::CATEGORY_MANUAL;
use crate::reconcile::scoring::match_confidence;
use crate::state::{Store, commit};
use crate::statement::store::{
    apply_match, clear_match, line_matched_to, mark_ignored, refresh_status, require_line,
};
use crate::statement::{STATE_IGNORED, STATE_RECONCILED, STATE_UNRECONCILED};
use crate::{ClientError, ClientResult};

/// Manually binds `line_id` to accounting transaction `transaction_id`.
///
/// Every rejection happens before the first write, so a failed call leaves
/// both the line and the accounting transaction untouched.
pub fn match_line(
    store: &mut Store,
    line_id: &str,
    transaction_id: i64,
    performed_by: &str,
) -> ClientResult<LineActionData> {
    let db_path = store.db_path().to_path_buf();
    let transaction = store.immediate()?;

    let line = require_line(&transaction, &db_path, line_id)?;
    let accounting = ledger::get_transaction(&transaction, &db_path, transaction_id)?
        .ok_or_else(|| ClientError::transaction_not_found(transaction_id))?;

    match line.reconciliation_state.as_str() {
        STATE_RECONCILED => {
            return Err(ClientError::line_already_reconciled(
                line_id,
                line.matched_transaction_id,
            ));
        }
        STATE_IGNORED => return Err(ClientError::line_ignored(line_id)),
        _ => {}
    }

    if let Some(holder) = line_matched_to(&transaction, &db_path, transaction_id)? {
        return Err(ClientError::transaction_already_matched(
            transaction_id,
            &holder,
        ));
    }

    let amount_delta = (line.amount - accounting.total_amount).abs();
    let confidence = match_confidence(line.amount, amount_delta);
    let payment_status = ledger::settled_status(line.amount, accounting.total_amount);

    apply_match(
        &transaction,
        &db_path,
        line_id,
        transaction_id,
        CATEGORY_MANUAL,
        confidence,
        &accounting.payment_status,
    )?;
    ledger::set_payment_status(&transaction, &db_path, transaction_id, payment_status)?;
    let statement_status = refresh_status(&transaction, &db_path, &line.statement_id)?;

    let audit_id = audit::append(
        &transaction,
        &db_path,
        &AuditEntry {
            performed_by,
            action: audit::ACTION_MATCH,
            entity_type: audit::ENTITY_BANK_TRANSACTION,
            entity_id: line_id,
            old_values: json!({
                "reconciliation_state": line.reconciliation_state,
                "matched_transaction_id": line.matched_transaction_id,
                "payment_status": accounting.payment_status,
            }),
            new_values: json!({
                "reconciliation_state": STATE_RECONCILED,
                "matched_transaction_id": transaction_id,
                "match_category": CATEGORY_MANUAL,
                "match_confidence": confidence,
                "payment_status": payment_status,
            }),
        },
    )?;

    let updated = require_line(&transaction, &db_path, line_id)?;
    commit(transaction, &db_path)?;

    info!(line_id, transaction_id, performed_by, "manual match recorded");

    Ok(LineActionData {
        line_id: line_id.to_string(),
        action: audit::ACTION_MATCH.to_string(),
        audit_id,
        statement_status,
        line: updated,
    })
}

/// Returns a reconciled or ignored line to the unreconciled pool.
pub fn unmatch_line(
    store: &mut Store,
    line_id: &str,
    performed_by: &str,
) -> ClientResult<LineActionData> {
    let db_path = store.db_path().to_path_buf();
    let transaction = store.immediate()?;

    let line = require_line(&transaction, &db_path, line_id)?;
    if line.reconciliation_state == STATE_UNRECONCILED {
        return Err(ClientError::line_not_reconciled(line_id));
    }

    let mut restored_status = None;
    if let Some(transaction_id) = line.matched_transaction_id {
        let prior = line
            .prior_payment_status
            .clone()
            .unwrap_or_else(|| ledger::PAYMENT_UNPAID.to_string());
        ledger::set_payment_status(&transaction, &db_path, transaction_id, &prior)?;
        restored_status = Some(prior);
    }

    clear_match(&transaction, &db_path, line_id)?;
    let statement_status = refresh_status(&transaction, &db_path, &line.statement_id)?;

    let audit_id = audit::append(
        &transaction,
        &db_path,
        &AuditEntry {
            performed_by,
            action: audit::ACTION_UNMATCH,
            entity_type: audit::ENTITY_BANK_TRANSACTION,
            entity_id: line_id,
            old_values: json!({
                "reconciliation_state": line.reconciliation_state,
                "matched_transaction_id": line.matched_transaction_id,
                "match_category": line.match_category,
                "match_confidence": line.match_confidence,
            }),
            new_values: json!({
                "reconciliation_state": STATE_UNRECONCILED,
                "matched_transaction_id": null,
                "payment_status": restored_status,
            }),
        },
    )?;

    let updated = require_line(&transaction, &db_path, line_id)?;
    commit(transaction, &db_path)?;

    info!(line_id, performed_by, "line unmatched");

    Ok(LineActionData {
        line_id: line_id.to_string(),
        action: audit::ACTION_UNMATCH.to_string(),
        audit_id,
        statement_status,
        line: updated,
    })
}

/// Marks an unreconciled line as ignored, e.g. bank fees with no voucher.
pub fn ignore_line(
    store: &mut Store,
    line_id: &str,
    performed_by: &str,
) -> ClientResult<LineActionData> {
    let db_path = store.db_path().to_path_buf();
    let transaction = store.immediate()?;

    let line = require_line(&transaction, &db_path, line_id)?;
    match line.reconciliation_state.as_str() {
        STATE_RECONCILED => {
            return Err(ClientError::line_already_reconciled(
                line_id,
                line.matched_transaction_id,
            ));
        }
        STATE_IGNORED => return Err(ClientError::line_ignored(line_id)),
        _ => {}
    }

    mark_ignored(&transaction, &db_path, line_id)?;
    let statement_status = refresh_status(&transaction, &db_path, &line.statement_id)?;

    let audit_id = audit::append(
        &transaction,
        &db_path,
        &AuditEntry {
            performed_by,
            action: audit::ACTION_IGNORE,
            entity_type: audit::ENTITY_BANK_TRANSACTION,
            entity_id: line_id,
            old_values: json!({ "reconciliation_state": line.reconciliation_state }),
            new_values: json!({ "reconciliation_state": STATE_IGNORED }),
        },
    )?;

    let updated = require_line(&transaction, &db_path, line_id)?;
    commit(transaction, &db_path)?;

    info!(line_id, performed_by, "line ignored");

    Ok(LineActionData {
        line_id: line_id.to_string(),
        action: audit::ACTION_IGNORE.to_string(),
        audit_id,
        statement_status,
        line: updated,
    })
}

pub fn audit_trail(store: &Store, line_id: &str) -> ClientResult<Vec<AuditRecord>> {
    let connection = store.connection();
    require_line(connection, store.db_path(), line_id)?;
    audit::list_for_entity(
        connection,
        store.db_path(),
        audit::ENTITY_BANK_TRANSACTION,
        line_id,
    )
}
