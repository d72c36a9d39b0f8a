mod error_text;
mod export_text;
mod format;
mod json;
mod mode;
mod reconcile_text;
mod statement_text;

use std::io;

use bankrec_client::{ClientError, SuccessEnvelope};

use crate::stdout_io::write_stdout_line;

pub use mode::{OutputMode, mode_for_command};

pub fn print_success(success: &SuccessEnvelope, mode: OutputMode) -> io::Result<()> {
    let body = match mode {
        OutputMode::Text => render_text_success(success)?,
        OutputMode::Json => json::render_success_json(success)?,
    };
    write_stdout_line(&body)
}

pub fn print_failure(error: &ClientError, mode: OutputMode) -> io::Result<()> {
    let body = match mode {
        OutputMode::Json => json::render_error_json(error)?,
        OutputMode::Text => error_text::render_error(error),
    };
    write_stdout_line(&body)
}

/// Import failures keep the flat `{success, error, message}` JSON shape.
pub fn print_import_failure(error: &ClientError, mode: OutputMode) -> io::Result<()> {
    let body = match mode {
        OutputMode::Json => json::render_import_failure_json(error)?,
        OutputMode::Text => error_text::render_error(error),
    };
    write_stdout_line(&body)
}

fn render_text_success(success: &SuccessEnvelope) -> io::Result<String> {
    match success.command.as_str() {
        "statement import" => statement_text::render_import(&success.data),
        "statement list" => statement_text::render_statement_list(&success.data),
        "statement show" => statement_text::render_statement_detail(&success.data),
        "statement status" => statement_text::render_status(&success.data),
        "statement delete" => statement_text::render_delete(&success.data),
        "reconcile auto" => reconcile_text::render_auto(&success.data),
        "reconcile match" | "reconcile unmatch" | "reconcile ignore" => {
            reconcile_text::render_line_action(&success.data)
        }
        "reconcile audit" => reconcile_text::render_audit(&success.data),
        "export" => export_text::render_export(&success.data),
        "ledger load" => export_text::render_ledger_load(&success.data),
        _ => Err(io::Error::other(format!(
            "unsupported text output command `{}`",
            success.command
        ))),
    }
}
