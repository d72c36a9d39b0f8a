use std::io;

use serde_json::Value;

use super::format::{
    self, Column, f64_field, format_amount, format_epoch, i64_field, opt_str_field, str_field,
};

const DESCRIPTION_WIDTH: usize = 40;

pub fn render_import(data: &Value) -> io::Result<String> {
    let statement_id = data
        .get("statement_id")
        .and_then(Value::as_str)
        .ok_or_else(|| io::Error::other("import output requires statement_id"))?;

    let mut lines = vec![
        format!("Imported {}.", str_field(data, "file_name")),
        String::new(),
    ];
    lines.extend(format::key_value_rows(
        &[
            ("Statement ID:", statement_id.to_string()),
            (
                "Format:",
                format!(
                    "{} (confidence {:.2})",
                    str_field(data, "format"),
                    f64_field(data, "confidence")
                ),
            ),
            ("Lines:", i64_field(data, "total_transactions").to_string()),
            ("Credits:", format_amount(f64_field(data, "total_credits"))),
            ("Debits:", format_amount(f64_field(data, "total_debits"))),
            ("Matched:", i64_field(data, "matched_count").to_string()),
            ("Unmatched:", i64_field(data, "unmatched_count").to_string()),
            ("Skipped rows:", i64_field(data, "skipped_rows").to_string()),
        ],
        2,
    ));

    let warnings = data
        .get("warnings")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    if !warnings.is_empty() {
        lines.push(String::new());
        lines.push("Warnings:".to_string());
        lines.extend(
            warnings
                .iter()
                .filter_map(Value::as_str)
                .map(|warning| format!("  - {warning}")),
        );
    }

    let unmatched = data
        .get("transactions")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    if !unmatched.is_empty() {
        lines.push(String::new());
        lines.push("Needs attention:".to_string());
        let rows = unmatched
            .iter()
            .map(|line| {
                vec![
                    str_field(line, "line_id").to_string(),
                    opt_str_field(line, "date"),
                    str_field(line, "description").to_string(),
                    format_amount(f64_field(line, "amount")),
                    str_field(line, "type").to_string(),
                    suggestion_label(line.get("suggested_party")),
                ]
            })
            .collect::<Vec<_>>();
        lines.extend(format::render_table(
            &[
                Column::left("Line ID"),
                Column::left("Date"),
                Column::left("Description").capped(DESCRIPTION_WIDTH),
                Column::right("Amount"),
                Column::left("Type"),
                Column::left("Suggested party"),
            ],
            &rows,
        ));
    }

    Ok(lines.join("\n"))
}

pub(super) fn suggestion_label(party: Option<&Value>) -> String {
    match party {
        Some(party) if !party.is_null() => format!(
            "{} ({:.2})",
            str_field(party, "name"),
            f64_field(party, "similarity")
        ),
        _ => "-".to_string(),
    }
}

pub fn render_statement_list(data: &Value) -> io::Result<String> {
    let rows = data
        .get("rows")
        .and_then(Value::as_array)
        .ok_or_else(|| io::Error::other("statement list output requires rows"))?;

    if rows.is_empty() {
        return Ok(
            "No statements imported yet.\n\nRun `bankrec statement import <path>` to add one."
                .to_string(),
        );
    }

    let table_rows = rows
        .iter()
        .map(|row| {
            vec![
                str_field(row, "statement_id").to_string(),
                str_field(row, "file_name").to_string(),
                format_epoch(str_field(row, "import_date")),
                opt_str_field(row, "statement_date"),
                i64_field(row, "record_count").to_string(),
                str_field(row, "status").to_string(),
            ]
        })
        .collect::<Vec<_>>();

    let mut lines = vec![format!("Statements ({})", rows.len()), String::new()];
    lines.extend(format::render_table(
        &[
            Column::left("Statement ID"),
            Column::left("File").capped(32),
            Column::left("Imported"),
            Column::left("Statement date"),
            Column::right("Lines"),
            Column::left("Status"),
        ],
        &table_rows,
    ));
    Ok(lines.join("\n"))
}

pub fn render_statement_detail(data: &Value) -> io::Result<String> {
    let statement = data
        .get("statement")
        .ok_or_else(|| io::Error::other("statement show output requires statement"))?;
    let lines_data = data
        .get("lines")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut lines = vec![
        format!("Statement {}", str_field(statement, "statement_id")),
        String::new(),
    ];
    lines.extend(format::key_value_rows(
        &[
            ("File:", str_field(statement, "file_name").to_string()),
            ("Imported:", format_epoch(str_field(statement, "import_date"))),
            ("Statement date:", opt_str_field(statement, "statement_date")),
            ("Format:", str_field(statement, "format_id").to_string()),
            ("Status:", str_field(statement, "status").to_string()),
            ("Credits:", format_amount(f64_field(statement, "total_credits"))),
            ("Debits:", format_amount(f64_field(statement, "total_debits"))),
        ],
        2,
    ));

    lines.push(String::new());
    if lines_data.is_empty() {
        lines.push("No lines.".to_string());
        return Ok(lines.join("\n"));
    }

    let rows = lines_data
        .iter()
        .map(|line| {
            vec![
                i64_field(line, "line_no").to_string(),
                str_field(line, "line_id").to_string(),
                opt_str_field(line, "transaction_date"),
                str_field(line, "description").to_string(),
                format_amount(f64_field(line, "amount")),
                str_field(line, "direction").to_string(),
                str_field(line, "reconciliation_state").to_string(),
                line.get("matched_transaction_id")
                    .and_then(Value::as_i64)
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect::<Vec<_>>();
    lines.extend(format::render_table(
        &[
            Column::right("#"),
            Column::left("Line ID"),
            Column::left("Date"),
            Column::left("Description").capped(DESCRIPTION_WIDTH),
            Column::right("Amount"),
            Column::left("Type"),
            Column::left("State"),
            Column::right("Txn"),
        ],
        &rows,
    ));
    Ok(lines.join("\n"))
}

pub fn render_status(data: &Value) -> io::Result<String> {
    let statement_id = data
        .get("statement_id")
        .and_then(Value::as_str)
        .ok_or_else(|| io::Error::other("status output requires statement_id"))?;

    let bucket = |key: &str| -> String {
        let value = data.get(key).cloned().unwrap_or(Value::Null);
        format!(
            "{} ({})",
            i64_field(&value, "count"),
            format_amount(f64_field(&value, "amount"))
        )
    };

    let mut lines = vec![format!("Statement {statement_id}"), String::new()];
    lines.extend(format::key_value_rows(
        &[
            ("Status:", str_field(data, "status").to_string()),
            ("Lines:", i64_field(data, "total_lines").to_string()),
            ("Unreconciled:", bucket("unreconciled")),
            ("Reconciled:", bucket("reconciled")),
            ("Ignored:", bucket("ignored")),
            ("Auto matched:", i64_field(data, "auto_matched").to_string()),
            ("Manual matched:", i64_field(data, "manual_matched").to_string()),
        ],
        2,
    ));
    Ok(lines.join("\n"))
}

pub fn render_delete(data: &Value) -> io::Result<String> {
    let statement_id = data
        .get("statement_id")
        .and_then(Value::as_str)
        .ok_or_else(|| io::Error::other("delete output requires statement_id"))?;

    Ok(format!(
        "Deleted statement {statement_id}.\n\n{}",
        format::key_value_rows(
            &[
                ("Lines removed:", i64_field(data, "deleted_lines").to_string()),
                (
                    "Transactions restored:",
                    i64_field(data, "restored_transactions").to_string(),
                ),
            ],
            2,
        )
        .join("\n")
    ))
}
