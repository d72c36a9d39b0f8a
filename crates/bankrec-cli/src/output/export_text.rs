use std::io;

use serde_json::Value;

use super::format::{self, i64_field, str_field};

/// Inline exports return the CSV body untouched so it can be piped.
pub fn render_export(data: &Value) -> io::Result<String> {
    if let Some(csv) = data.get("csv").and_then(Value::as_str) {
        return Ok(csv.trim_end_matches('\n').to_string());
    }

    let path = data
        .get("output_path")
        .and_then(Value::as_str)
        .ok_or_else(|| io::Error::other("export output requires csv or output_path"))?;
    Ok(format!(
        "Wrote {} matched row(s) from {} to {path}.",
        i64_field(data, "row_count"),
        str_field(data, "statement_id")
    ))
}

pub fn render_ledger_load(data: &Value) -> io::Result<String> {
    let mut lines = vec![
        format!("Loaded ledger fixture {}.", str_field(data, "path")),
        String::new(),
    ];
    lines.extend(format::key_value_rows(
        &[
            ("Parties:", i64_field(data, "parties_upserted").to_string()),
            (
                "Transactions:",
                i64_field(data, "transactions_upserted").to_string(),
            ),
        ],
        2,
    ));
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{render_export, render_ledger_load};

    #[test]
    fn inline_export_is_raw_csv() {
        let rendered = render_export(&json!({
            "statement_id": "stmt_01",
            "row_count": 1,
            "csv": "Date,Description,Amount\n2024-03-03,NEFT CR,10000.00\n"
        }));
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            assert_eq!(text, "Date,Description,Amount\n2024-03-03,NEFT CR,10000.00");
        }
    }

    #[test]
    fn file_export_reports_the_path() {
        let rendered = render_export(&json!({
            "statement_id": "stmt_01",
            "row_count": 3,
            "output_path": "/tmp/out.csv"
        }));
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            assert_eq!(text, "Wrote 3 matched row(s) from stmt_01 to /tmp/out.csv.");
        }
    }

    #[test]
    fn ledger_load_counts_upserts() {
        let rendered = render_ledger_load(&json!({
            "path": "ledger.json",
            "parties_upserted": 2,
            "transactions_upserted": 5
        }));
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            assert!(text.starts_with("Loaded ledger fixture ledger.json."));
            assert!(text.contains("Transactions:  5"));
        }
    }
}
