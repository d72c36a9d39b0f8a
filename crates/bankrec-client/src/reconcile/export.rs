use std::path::Path;

use csv::WriterBuilder;
use rusqlite::Connection;

use crate::state::map_sqlite_error;
use crate::statement::STATE_RECONCILED;
use crate::statement::store::require_statement;
use crate::{ClientError, ClientResult};

pub const EXPORT_HEADER: [&str; 8] = [
    "bank_date",
    "description",
    "bank_amount",
    "type",
    "voucher_no",
    "accounting_date",
    "party",
    "accounting_amount",
];

#[derive(Debug, Clone, PartialEq)]
pub struct MatchedRow {
    pub bank_date: Option<String>,
    pub description: String,
    pub bank_amount: f64,
    pub direction: String,
    pub voucher_no: String,
    pub accounting_date: String,
    pub party: Option<String>,
    pub accounting_amount: f64,
}

pub(crate) fn matched_rows(
    connection: &Connection,
    db_path: &Path,
    statement_id: &str,
) -> ClientResult<Vec<MatchedRow>> {
    require_statement(connection, db_path, statement_id)?;

    let mut statement = connection
        .prepare(
            "SELECT
                b.transaction_date,
                b.description,
                b.amount,
                b.direction,
                t.voucher_no,
                t.date,
                p.name,
                t.total_amount
             FROM bank_transactions b
             JOIN ledger_transactions t ON t.id = b.matched_transaction_id
             LEFT JOIN parties p ON p.id = t.party_id
             WHERE b.statement_id = ?1 AND b.reconciliation_state = ?2
             ORDER BY b.line_no ASC",
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    let rows_iter = statement
        .query_map([statement_id, STATE_RECONCILED], |row| {
            Ok(MatchedRow {
                bank_date: row.get(0)?,
                description: row.get(1)?,
                bank_amount: row.get(2)?,
                direction: row.get(3)?,
                voucher_no: row.get(4)?,
                accounting_date: row.get(5)?,
                party: row.get(6)?,
                accounting_amount: row.get(7)?,
            })
        })
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut rows = Vec::new();
    for row in rows_iter {
        rows.push(row.map_err(|error| map_sqlite_error(db_path, &error))?);
    }
    Ok(rows)
}

/// Renders matched rows as CSV with a fixed header.
pub fn render_csv(rows: &[MatchedRow]) -> ClientResult<String> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(EXPORT_HEADER).map_err(csv_error)?;

    for row in rows {
        writer
            .write_record([
                row.bank_date.clone().unwrap_or_default(),
                row.description.clone(),
                format!("{:.2}", row.bank_amount),
                row.direction.clone(),
                row.voucher_no.clone(),
                row.accounting_date.clone(),
                row.party.clone().unwrap_or_default(),
                format!("{:.2}", row.accounting_amount),
            ])
            .map_err(csv_error)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|error| ClientError::internal_serialization(&error.to_string()))?;
    String::from_utf8(bytes).map_err(|error| ClientError::internal_serialization(&error.to_string()))
}

fn csv_error(error: csv::Error) -> ClientError {
    ClientError::internal_serialization(&error.to_string())
}
