use std::path::Path;

use rusqlite::{Connection, OptionalExtension, Row, params};
use serde_json::json;
use ulid::Ulid;

use crate::audit::{self, AuditEntry};
use crate::contracts::types::{
    DeleteStatementData, ReconciliationStatusData, StateBucket, StatementLine, StatementSummary,
};
use crate::ledger;
use crate::state::{is_unique_violation, map_sqlite_error};
use crate::statement::detect::BankFormat;
use crate::statement::parse::ParsedLine;
use crate::statement::values::round_money;
use crate::statement::{
    Direction, STATE_IGNORED, STATE_RECONCILED, STATE_UNRECONCILED, STATUS_IMPORTED,
    STATUS_PARTIALLY_RECONCILED, STATUS_RECONCILED, now_timestamp,
};
use crate::{ClientError, ClientResult};

const STATEMENT_COLUMNS: &str = "statement_id, file_name, file_hash, import_date, statement_date,
    total_credits, total_debits, record_count, status, format_id, format_confidence";

const LINE_COLUMNS: &str = "line_id, statement_id, line_no, transaction_date, description,
    amount, direction, balance, reconciliation_state, matched_transaction_id, match_category,
    match_confidence, prior_payment_status";

pub(crate) struct NewStatement<'a> {
    pub(crate) file_name: &'a str,
    pub(crate) file_hash: &'a str,
    pub(crate) format: BankFormat,
    pub(crate) format_confidence: f64,
}

#[derive(Debug, Clone)]
pub(crate) struct InsertedStatement {
    pub(crate) statement_id: String,
    pub(crate) total_credits: f64,
    pub(crate) total_debits: f64,
    pub(crate) record_count: i64,
}

pub(crate) fn insert_statement_with_lines(
    connection: &Connection,
    db_path: &Path,
    statement: &NewStatement<'_>,
    lines: &[ParsedLine],
) -> ClientResult<InsertedStatement> {
    let statement_id = format!("stmt_{}", Ulid::new());
    let total_credits = round_money(
        lines
            .iter()
            .filter(|line| line.direction == Direction::Credit)
            .map(|line| line.amount)
            .sum(),
    );
    let total_debits = round_money(
        lines
            .iter()
            .filter(|line| line.direction == Direction::Debit)
            .map(|line| line.amount)
            .sum(),
    );
    let statement_date = lines
        .iter()
        .filter_map(|line| line.date)
        .max()
        .map(|date| date.format("%Y-%m-%d").to_string());
    let record_count = lines.len() as i64;

    connection
        .execute(
            "INSERT INTO bank_statements (
                statement_id,
                file_name,
                file_hash,
                import_date,
                statement_date,
                total_credits,
                total_debits,
                record_count,
                status,
                format_id,
                format_confidence
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                &statement_id,
                statement.file_name,
                statement.file_hash,
                now_timestamp(),
                statement_date,
                total_credits,
                total_debits,
                record_count,
                STATUS_IMPORTED,
                statement.format.as_str(),
                statement.format_confidence,
            ],
        )
        .map_err(|error| {
            if is_unique_violation(&error) {
                ClientError::duplicate_file(statement.file_hash, None)
            } else {
                map_sqlite_error(db_path, &error)
            }
        })?;

    let mut insert = connection
        .prepare(
            "INSERT INTO bank_transactions (
                line_id,
                statement_id,
                line_no,
                transaction_date,
                description,
                amount,
                direction,
                balance,
                reconciliation_state
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    for (index, line) in lines.iter().enumerate() {
        let line_id = format!("line_{}", Ulid::new());
        insert
            .execute(params![
                &line_id,
                &statement_id,
                index as i64 + 1,
                line.date.map(|date| date.format("%Y-%m-%d").to_string()),
                &line.description,
                line.amount,
                line.direction.as_str(),
                line.balance,
                STATE_UNRECONCILED,
            ])
            .map_err(|error| map_sqlite_error(db_path, &error))?;
    }

    Ok(InsertedStatement {
        statement_id,
        total_credits,
        total_debits,
        record_count,
    })
}

pub(crate) fn get_statement(
    connection: &Connection,
    db_path: &Path,
    statement_id: &str,
) -> ClientResult<Option<StatementSummary>> {
    let sql = format!("SELECT {STATEMENT_COLUMNS} FROM bank_statements WHERE statement_id = ?1");
    connection
        .query_row(&sql, [statement_id], statement_from_row)
        .optional()
        .map_err(|error| map_sqlite_error(db_path, &error))
}

pub(crate) fn require_statement(
    connection: &Connection,
    db_path: &Path,
    statement_id: &str,
) -> ClientResult<StatementSummary> {
    get_statement(connection, db_path, statement_id)?
        .ok_or_else(|| ClientError::statement_not_found(statement_id))
}

pub(crate) fn list_statements(
    connection: &Connection,
    db_path: &Path,
) -> ClientResult<Vec<StatementSummary>> {
    let sql = format!(
        "SELECT {STATEMENT_COLUMNS} FROM bank_statements
         ORDER BY CAST(import_date AS INTEGER) DESC, statement_id DESC"
    );
    let mut statement = connection
        .prepare(&sql)
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    let rows_iter = statement
        .query_map([], statement_from_row)
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut rows = Vec::new();
    for row in rows_iter {
        rows.push(row.map_err(|error| map_sqlite_error(db_path, &error))?);
    }
    Ok(rows)
}

pub(crate) fn list_lines(
    connection: &Connection,
    db_path: &Path,
    statement_id: &str,
    state: Option<&str>,
) -> ClientResult<Vec<StatementLine>> {
    let sql = format!(
        "SELECT {LINE_COLUMNS} FROM bank_transactions
         WHERE statement_id = ?1 AND (?2 IS NULL OR reconciliation_state = ?2)
         ORDER BY line_no ASC"
    );
    let mut statement = connection
        .prepare(&sql)
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    let rows_iter = statement
        .query_map(params![statement_id, state], line_from_row)
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut rows = Vec::new();
    for row in rows_iter {
        rows.push(row.map_err(|error| map_sqlite_error(db_path, &error))?);
    }
    Ok(rows)
}

pub(crate) fn get_line(
    connection: &Connection,
    db_path: &Path,
    line_id: &str,
) -> ClientResult<Option<StatementLine>> {
    let sql = format!("SELECT {LINE_COLUMNS} FROM bank_transactions WHERE line_id = ?1");
    connection
        .query_row(&sql, [line_id], line_from_row)
        .optional()
        .map_err(|error| map_sqlite_error(db_path, &error))
}

pub(crate) fn require_line(
    connection: &Connection,
    db_path: &Path,
    line_id: &str,
) -> ClientResult<StatementLine> {
    get_line(connection, db_path, line_id)?.ok_or_else(|| ClientError::line_not_found(line_id))
}

/// Line currently holding a match on `transaction_id`, if any.
pub(crate) fn line_matched_to(
    connection: &Connection,
    db_path: &Path,
    transaction_id: i64,
) -> ClientResult<Option<String>> {
    connection
        .query_row(
            "SELECT line_id FROM bank_transactions WHERE matched_transaction_id = ?1 LIMIT 1",
            [transaction_id],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .map_err(|error| map_sqlite_error(db_path, &error))
}

pub(crate) fn apply_match(
    connection: &Connection,
    db_path: &Path,
    line_id: &str,
    transaction_id: i64,
    category: &str,
    confidence: f64,
    prior_payment_status: &str,
) -> ClientResult<()> {
    let updated = connection.execute(
        "UPDATE bank_transactions
             SET reconciliation_state = ?2,
                 matched_transaction_id = ?3,
                 match_category = ?4,
                 match_confidence = ?5,
                 prior_payment_status = ?6
             WHERE line_id = ?1",
        params![
            line_id,
            STATE_RECONCILED,
            transaction_id,
            category,
            confidence,
            prior_payment_status
        ],
    );

    match updated {
        Ok(_) => Ok(()),
        Err(error) if is_unique_violation(&error) => {
            let holder = line_matched_to(connection, db_path, transaction_id)?.unwrap_or_default();
            Err(ClientError::transaction_already_matched(
                transaction_id,
                &holder,
            ))
        }
        Err(error) => Err(map_sqlite_error(db_path, &error)),
    }
}

pub(crate) fn clear_match(connection: &Connection, db_path: &Path, line_id: &str) -> ClientResult<()> {
    connection
        .execute(
            "UPDATE bank_transactions
             SET reconciliation_state = ?2,
                 matched_transaction_id = NULL,
                 match_category = NULL,
                 match_confidence = NULL,
                 prior_payment_status = NULL
             WHERE line_id = ?1",
            params![line_id, STATE_UNRECONCILED],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    Ok(())
}

pub(crate) fn mark_ignored(connection: &Connection, db_path: &Path, line_id: &str) -> ClientResult<()> {
    connection
        .execute(
            "UPDATE bank_transactions SET reconciliation_state = ?2 WHERE line_id = ?1",
            params![line_id, STATE_IGNORED],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    Ok(())
}

pub(crate) fn set_statement_status(
    connection: &Connection,
    db_path: &Path,
    statement_id: &str,
    status: &str,
) -> ClientResult<()> {
    connection
        .execute(
            "UPDATE bank_statements SET status = ?2 WHERE statement_id = ?1",
            params![statement_id, status],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    Ok(())
}

/// Recomputes statement status from its line states and stores it.
pub(crate) fn refresh_status(
    connection: &Connection,
    db_path: &Path,
    statement_id: &str,
) -> ClientResult<String> {
    let unreconciled = connection
        .query_row(
            "SELECT COUNT(*) FROM bank_transactions
             WHERE statement_id = ?1 AND reconciliation_state = ?2",
            params![statement_id, STATE_UNRECONCILED],
            |row| row.get::<_, i64>(0),
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let status = if unreconciled == 0 {
        STATUS_RECONCILED
    } else {
        STATUS_PARTIALLY_RECONCILED
    };
    set_statement_status(connection, db_path, statement_id, status)?;
    Ok(status.to_string())
}

pub(crate) fn reconciliation_status(
    connection: &Connection,
    db_path: &Path,
    statement_id: &str,
) -> ClientResult<ReconciliationStatusData> {
    let statement = require_statement(connection, db_path, statement_id)?;

    let mut buckets = connection
        .prepare(
            "SELECT
                reconciliation_state,
                COUNT(*),
                ROUND(COALESCE(SUM(amount), 0), 2),
                SUM(CASE WHEN match_category = 'auto' THEN 1 ELSE 0 END),
                SUM(CASE WHEN match_category = 'manual' THEN 1 ELSE 0 END)
             FROM bank_transactions
             WHERE statement_id = ?1
             GROUP BY reconciliation_state",
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    let rows_iter = buckets
        .query_map([statement_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, i64>(4)?,
            ))
        })
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut data = ReconciliationStatusData {
        statement_id: statement.statement_id,
        status: statement.status,
        total_lines: 0,
        unreconciled: StateBucket::default(),
        reconciled: StateBucket::default(),
        ignored: StateBucket::default(),
        auto_matched: 0,
        manual_matched: 0,
    };

    for row in rows_iter {
        let (state, count, amount, auto, manual) =
            row.map_err(|error| map_sqlite_error(db_path, &error))?;
        data.total_lines += count;
        data.auto_matched += auto;
        data.manual_matched += manual;
        let bucket = StateBucket { count, amount };
        match state.as_str() {
            STATE_RECONCILED => data.reconciled = bucket,
            STATE_IGNORED => data.ignored = bucket,
            _ => data.unreconciled = bucket,
        }
    }

    Ok(data)
}

/// Deletes a statement and its lines, releasing every match they held.
pub(crate) fn delete_statement(
    connection: &Connection,
    db_path: &Path,
    statement_id: &str,
    performed_by: &str,
) -> ClientResult<DeleteStatementData> {
    let statement = require_statement(connection, db_path, statement_id)?;
    let lines = list_lines(connection, db_path, statement_id, None)?;

    let mut restored = 0_i64;
    for line in &lines {
        if let (Some(transaction_id), Some(prior)) =
            (line.matched_transaction_id, line.prior_payment_status.as_deref())
        {
            ledger::set_payment_status(connection, db_path, transaction_id, prior)?;
            restored += 1;
        }
    }

    let deleted_lines = connection
        .execute(
            "DELETE FROM bank_transactions WHERE statement_id = ?1",
            [statement_id],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))? as i64;
    connection
        .execute(
            "DELETE FROM bank_statements WHERE statement_id = ?1",
            [statement_id],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    audit::append(
        connection,
        db_path,
        &AuditEntry {
            performed_by,
            action: audit::ACTION_DELETE_STATEMENT,
            entity_type: audit::ENTITY_BANK_STATEMENT,
            entity_id: statement_id,
            old_values: json!({
                "file_name": statement.file_name,
                "file_hash": statement.file_hash,
                "record_count": statement.record_count,
                "status": statement.status,
            }),
            new_values: json!({
                "deleted_lines": deleted_lines,
                "restored_transactions": restored,
            }),
        },
    )?;

    Ok(DeleteStatementData {
        statement_id: statement_id.to_string(),
        deleted_lines,
        restored_transactions: restored,
    })
}

fn statement_from_row(row: &Row<'_>) -> rusqlite::Result<StatementSummary> {
    Ok(StatementSummary {
        statement_id: row.get(0)?,
        file_name: row.get(1)?,
        file_hash: row.get(2)?,
        import_date: row.get(3)?,
        statement_date: row.get(4)?,
        total_credits: row.get(5)?,
        total_debits: row.get(6)?,
        record_count: row.get(7)?,
        status: row.get(8)?,
        format_id: row.get(9)?,
        format_confidence: row.get(10)?,
    })
}

fn line_from_row(row: &Row<'_>) -> rusqlite::Result<StatementLine> {
    Ok(StatementLine {
        line_id: row.get(0)?,
        statement_id: row.get(1)?,
        line_no: row.get(2)?,
        transaction_date: row.get(3)?,
        description: row.get(4)?,
        amount: row.get(5)?,
        direction: row.get(6)?,
        balance: row.get(7)?,
        reconciliation_state: row.get(8)?,
        matched_transaction_id: row.get(9)?,
        match_category: row.get(10)?,
        match_confidence: row.get(11)?,
        prior_payment_status: row.get(12)?,
    })
}
