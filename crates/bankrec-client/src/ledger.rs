use std::path::Path;

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Deserialize;

use crate::parties::{Party, upsert_party};
use crate::state::map_sqlite_error;
use crate::{ClientError, ClientResult};

pub const PAYMENT_UNPAID: &str = "unpaid";
pub const PAYMENT_PARTIAL: &str = "partial";
pub const PAYMENT_PAID: &str = "paid";

const VOUCHER_TYPES: [&str; 6] = ["sale", "purchase", "expense", "receipt", "payment", "journal"];
const PAYMENT_STATUSES: [&str; 3] = [PAYMENT_UNPAID, PAYMENT_PARTIAL, PAYMENT_PAID];

/// Accounting transaction as recorded in the books.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerTransaction {
    pub id: i64,
    pub voucher_no: String,
    pub voucher_type: String,
    pub date: String,
    pub total_amount: f64,
    pub party_id: Option<i64>,
    pub payment_status: String,
}

pub(crate) fn get_transaction(
    connection: &Connection,
    db_path: &Path,
    transaction_id: i64,
) -> ClientResult<Option<LedgerTransaction>> {
    connection
        .query_row(
            "SELECT id, voucher_no, voucher_type, date, total_amount, party_id, payment_status
             FROM ledger_transactions WHERE id = ?1",
            [transaction_id],
            transaction_from_row,
        )
        .optional()
        .map_err(|error| map_sqlite_error(db_path, &error))
}

/// Open transactions of `voucher_type` dated within `[from, to]` that no bank
/// line currently points at.
pub(crate) fn open_candidates(
    connection: &Connection,
    db_path: &Path,
    voucher_type: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> ClientResult<Vec<LedgerTransaction>> {
    let mut statement = connection
        .prepare(
            "SELECT t.id, t.voucher_no, t.voucher_type, t.date, t.total_amount, t.party_id,
                    t.payment_status
             FROM ledger_transactions t
             WHERE t.voucher_type = ?1
               AND t.payment_status <> 'paid'
               AND t.date BETWEEN ?2 AND ?3
               AND NOT EXISTS (
                   SELECT 1 FROM bank_transactions b
                   WHERE b.matched_transaction_id = t.id
               )
             ORDER BY t.id ASC",
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    let rows_iter = statement
        .query_map(
            params![
                voucher_type,
                from.format("%Y-%m-%d").to_string(),
                to.format("%Y-%m-%d").to_string()
            ],
            transaction_from_row,
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut rows = Vec::new();
    for row in rows_iter {
        rows.push(row.map_err(|error| map_sqlite_error(db_path, &error))?);
    }
    Ok(rows)
}

pub(crate) fn set_payment_status(
    connection: &Connection,
    db_path: &Path,
    transaction_id: i64,
    status: &str,
) -> ClientResult<()> {
    connection
        .execute(
            "UPDATE ledger_transactions SET payment_status = ?2 WHERE id = ?1",
            params![transaction_id, status],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    Ok(())
}

/// Payment status after a bank amount settles a transaction of `total_amount`.
pub fn settled_status(bank_amount: f64, total_amount: f64) -> &'static str {
    if bank_amount >= total_amount - 0.01 {
        PAYMENT_PAID
    } else {
        PAYMENT_PARTIAL
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerFixture {
    #[serde(default)]
    pub parties: Vec<FixtureParty>,
    #[serde(default)]
    pub transactions: Vec<FixtureTransaction>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureParty {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureTransaction {
    pub id: i64,
    pub voucher_no: String,
    pub voucher_type: String,
    pub date: String,
    pub total_amount: f64,
    #[serde(default)]
    pub party_id: Option<i64>,
    #[serde(default)]
    pub payment_status: Option<String>,
}

pub(crate) fn parse_fixture(content: &str) -> ClientResult<LedgerFixture> {
    let mut fixture = serde_json::from_str::<LedgerFixture>(content).map_err(|error| {
        ClientError::invalid_ledger_fixture(&format!("Ledger fixture is not valid JSON: {error}"))
    })?;

    for transaction in &mut fixture.transactions {
        if !VOUCHER_TYPES.contains(&transaction.voucher_type.as_str()) {
            return Err(ClientError::invalid_ledger_fixture(&format!(
                "Transaction {} has unknown voucher_type `{}`.",
                transaction.id, transaction.voucher_type
            )));
        }
        let Ok(date) = NaiveDate::parse_from_str(&transaction.date, "%Y-%m-%d") else {
            return Err(ClientError::invalid_ledger_fixture(&format!(
                "Transaction {} has date `{}`; expected YYYY-MM-DD.",
                transaction.id, transaction.date
            )));
        };
        // Candidate pools compare dates as text, so store the zero-padded form.
        transaction.date = date.format("%Y-%m-%d").to_string();
        if let Some(status) = &transaction.payment_status
            && !PAYMENT_STATUSES.contains(&status.as_str())
        {
            return Err(ClientError::invalid_ledger_fixture(&format!(
                "Transaction {} has unknown payment_status `{status}`.",
                transaction.id
            )));
        }
        if !transaction.total_amount.is_finite() || transaction.total_amount < 0.0 {
            return Err(ClientError::invalid_ledger_fixture(&format!(
                "Transaction {} has an invalid total_amount.",
                transaction.id
            )));
        }
    }

    Ok(fixture)
}

/// Upserts fixture parties then transactions. Returns `(parties, transactions)`.
pub(crate) fn load_fixture(
    connection: &Connection,
    db_path: &Path,
    fixture: &LedgerFixture,
) -> ClientResult<(i64, i64)> {
    for party in &fixture.parties {
        upsert_party(
            connection,
            db_path,
            &Party {
                id: party.id,
                name: party.name.clone(),
            },
        )?;
    }

    for transaction in &fixture.transactions {
        connection
            .execute(
                "INSERT INTO ledger_transactions (
                    id,
                    voucher_no,
                    voucher_type,
                    date,
                    total_amount,
                    party_id,
                    payment_status
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(id) DO UPDATE SET
                    voucher_no = excluded.voucher_no,
                    voucher_type = excluded.voucher_type,
                    date = excluded.date,
                    total_amount = excluded.total_amount,
                    party_id = excluded.party_id,
                    payment_status = CASE
                        WHEN EXISTS (
                            SELECT 1 FROM bank_transactions b
                            WHERE b.matched_transaction_id = ledger_transactions.id
                        ) THEN ledger_transactions.payment_status
                        ELSE excluded.payment_status
                    END",
                params![
                    transaction.id,
                    &transaction.voucher_no,
                    &transaction.voucher_type,
                    &transaction.date,
                    transaction.total_amount,
                    transaction.party_id,
                    transaction.payment_status.as_deref().unwrap_or(PAYMENT_UNPAID),
                ],
            )
            .map_err(|error| map_sqlite_error(db_path, &error))?;
    }

    Ok((
        fixture.parties.len() as i64,
        fixture.transactions.len() as i64,
    ))
}

fn transaction_from_row(row: &Row<'_>) -> rusqlite::Result<LedgerTransaction> {
    Ok(LedgerTransaction {
        id: row.get(0)?,
        voucher_no: row.get(1)?,
        voucher_type: row.get(2)?,
        date: row.get(3)?,
        total_amount: row.get(4)?,
        party_id: row.get(5)?,
        payment_status: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::{parse_fixture, settled_status};

    #[test]
    fn settled_status_allows_one_cent_shortfall() {
        assert_eq!(settled_status(10000.0, 10000.0), "paid");
        assert_eq!(settled_status(9999.99, 10000.0), "paid");
        assert_eq!(settled_status(9990.0, 10000.0), "partial");
        assert_eq!(settled_status(12000.0, 10000.0), "paid");
    }

    #[test]
    fn fixture_rejects_unknown_voucher_types_and_bad_dates() {
        let bad_type = parse_fixture(
            r#"{"transactions":[{"id":1,"voucher_no":"V1","voucher_type":"gift","date":"2024-03-01","total_amount":1}]}"#,
        );
        assert!(bad_type.is_err());

        let bad_date = parse_fixture(
            r#"{"transactions":[{"id":1,"voucher_no":"V1","voucher_type":"sale","date":"01/03/2024","total_amount":1}]}"#,
        );
        assert!(bad_date.is_err());
        if let Err(error) = bad_date {
            assert_eq!(error.code, "INVALID_ARGUMENT");
        }
    }

    #[test]
    fn fixture_dates_are_zero_padded() {
        let fixture = parse_fixture(
            r#"{"transactions":[{"id":1,"voucher_no":"V1","voucher_type":"sale","date":"2024-3-5","total_amount":1}]}"#,
        );
        assert!(fixture.is_ok());
        if let Ok(value) = fixture {
            assert_eq!(value.transactions[0].date, "2024-03-05");
        }
    }

    #[test]
    fn fixture_defaults_missing_sections() {
        let fixture = parse_fixture(r#"{"parties":[{"id":7,"name":"Acme Traders"}]}"#);
        assert!(fixture.is_ok());
        if let Ok(value) = fixture {
            assert_eq!(value.parties.len(), 1);
            assert!(value.transactions.is_empty());
        }
    }
}
