use std::io;

use serde_json::Value;

use super::format::{
    self, Column, f64_field, format_amount, format_epoch, i64_field, opt_str_field, str_field,
};
use super::statement_text::suggestion_label;

pub fn render_auto(data: &Value) -> io::Result<String> {
    let statement_id = data
        .get("statement_id")
        .and_then(Value::as_str)
        .ok_or_else(|| io::Error::other("auto reconcile output requires statement_id"))?;
    let matches = data
        .get("matches")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut lines = vec![
        format!(
            "Auto-matched {} line(s) on {statement_id}; {} still unmatched.",
            i64_field(data, "matched_count"),
            i64_field(data, "unmatched_count")
        ),
        format!("Statement status: {}", str_field(data, "status")),
    ];

    if !matches.is_empty() {
        lines.push(String::new());
        let rows = matches
            .iter()
            .map(|decision| {
                vec![
                    str_field(decision, "line_id").to_string(),
                    i64_field(decision, "transaction_id").to_string(),
                    format!("{:.0}", f64_field(decision, "confidence")),
                    str_field(decision, "payment_status").to_string(),
                ]
            })
            .collect::<Vec<_>>();
        lines.extend(format::render_table(
            &[
                Column::left("Line ID"),
                Column::right("Txn"),
                Column::right("Confidence"),
                Column::left("Payment"),
            ],
            &rows,
        ));
    }

    let unmatched = data
        .get("unmatched")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    if !unmatched.is_empty() {
        lines.push(String::new());
        lines.push("Still unmatched:".to_string());
        let rows = unmatched
            .iter()
            .map(|line| {
                vec![
                    str_field(line, "line_id").to_string(),
                    opt_str_field(line, "date"),
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
                Column::right("Amount"),
                Column::left("Type"),
                Column::left("Suggested party"),
            ],
            &rows,
        ));
    }

    Ok(lines.join("\n"))
}

pub fn render_line_action(data: &Value) -> io::Result<String> {
    let line = data
        .get("line")
        .ok_or_else(|| io::Error::other("line action output requires line"))?;
    let action = str_field(data, "action");

    let headline = match action {
        "match" => format!(
            "Matched {} to transaction {}.",
            str_field(data, "line_id"),
            opt_i64(line, "matched_transaction_id")
        ),
        "unmatch" => format!("Unmatched {}.", str_field(data, "line_id")),
        "ignore" => format!("Ignored {}.", str_field(data, "line_id")),
        other => format!("{other} {}.", str_field(data, "line_id")),
    };

    let mut lines = vec![headline, String::new()];
    lines.extend(format::key_value_rows(
        &[
            ("Line state:", str_field(line, "reconciliation_state").to_string()),
            ("Category:", opt_str_field(line, "match_category")),
            ("Statement status:", str_field(data, "statement_status").to_string()),
            ("Audit ID:", str_field(data, "audit_id").to_string()),
        ],
        2,
    ));
    Ok(lines.join("\n"))
}

fn opt_i64(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_i64)
        .map(|id| id.to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub fn render_audit(data: &Value) -> io::Result<String> {
    let line_id = str_field(data, "line_id");
    let rows = data
        .get("rows")
        .and_then(Value::as_array)
        .ok_or_else(|| io::Error::other("audit output requires rows"))?;

    if rows.is_empty() {
        return Ok(format!("No audit entries for {line_id}."));
    }

    let table_rows = rows
        .iter()
        .map(|row| {
            vec![
                format_epoch(str_field(row, "created_at")),
                str_field(row, "action").to_string(),
                str_field(row, "performed_by").to_string(),
                compact_json(row.get("old_values")),
                compact_json(row.get("new_values")),
            ]
        })
        .collect::<Vec<_>>();

    let mut lines = vec![format!("Audit trail for {line_id}"), String::new()];
    lines.extend(format::render_table(
        &[
            Column::left("When"),
            Column::left("Action"),
            Column::left("By"),
            Column::left("Before").capped(48),
            Column::left("After").capped(48),
        ],
        &table_rows,
    ));
    Ok(lines.join("\n"))
}

fn compact_json(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "-".to_string(),
        Some(value) => value.to_string(),
    }
}
