use std::fs;
use std::path::{Path, PathBuf};

use crate::commands::open_store;
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::ExportData;
use crate::reconcile::export::{matched_rows, render_csv};
use crate::state::map_io_error;
use crate::ClientResult;

#[derive(Debug, Default)]
pub struct ExportOptions<'a> {
    pub statement_id: String,
    pub output_path: Option<PathBuf>,
    pub home_override: Option<&'a Path>,
}

pub fn run(statement_id: &str, output_path: Option<PathBuf>) -> ClientResult<SuccessEnvelope> {
    run_with_options(ExportOptions {
        statement_id: statement_id.to_string(),
        output_path,
        home_override: None,
    })
}

/// Matched lines as CSV. Written to `output_path` when given, otherwise
/// returned inline in `data.csv`.
#[doc(hidden)]
pub fn run_with_options(options: ExportOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let store = open_store(options.home_override)?;
    let rows = matched_rows(store.connection(), store.db_path(), &options.statement_id)?;
    let csv = render_csv(&rows)?;

    let data = match options.output_path {
        Some(path) => {
            fs::write(&path, csv.as_bytes()).map_err(|error| map_io_error(&path, &error))?;
            ExportData {
                statement_id: options.statement_id,
                row_count: rows.len() as i64,
                output_path: Some(path.display().to_string()),
                csv: None,
            }
        }
        None => ExportData {
            statement_id: options.statement_id,
            row_count: rows.len() as i64,
            output_path: None,
            csv: Some(csv),
        },
    };

    success("export", data)
}
