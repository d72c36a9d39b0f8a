mod cli;
mod dispatch;
mod output;
mod stdout_io;

use std::process::ExitCode;

use bankrec_client::ClientError;
use clap::{Parser, error::ErrorKind};
use stdout_io::write_stdout_text;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "BANKREC_LOG";
const DEFAULT_LOG_FILTER: &str = "warn";

const ROOT_HELP: &str = "bankrec - bank statement reconciliation engine

Usage:
  bankrec <command>

Start here:
  bankrec ledger load <fixture.json>
  bankrec statement import --help
  bankrec statement list
";

const TOP_LEVEL_HELP: &str = "bankrec - bank statement reconciliation engine

USAGE: bankrec <command>

Get set up:
  1. bankrec ledger load <fixture.json>             Load parties and open transactions
  2. bankrec statement import <path>                Import a statement and auto-reconcile
  3. bankrec statement status <statement-id>        See what is still unreconciled

Work the exceptions:
  bankrec reconcile match <line-id> <txn-id>        Match a line by hand
  bankrec reconcile unmatch <line-id>               Undo a match or an ignore
  bankrec reconcile ignore <line-id>                Mark a line as not needing a match
  bankrec reconcile auto <statement-id>             Rerun automatic matching
  bankrec reconcile audit <line-id>                 Show who changed a line and when

Review and export:
  bankrec statement list                            List imported statements
  bankrec statement show <statement-id>             Show every line of a statement
  bankrec export <statement-id> [-o file.csv]       Export matched lines as CSV
  bankrec statement delete <statement-id>           Delete a statement and release its matches

Every command accepts --json. Set BANKREC_HOME to choose the data directory
and BANKREC_LOG to raise log verbosity on stderr (for example `debug`).
";

fn main() -> ExitCode {
    init_logging();
    match run() {
        Ok(code) => code,
        Err(code) => code,
    }
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run() -> Result<ExitCode, ExitCode> {
    let raw_args = std::env::args().collect::<Vec<String>>();
    if raw_args.len() == 1 {
        if write_stdout_text(ROOT_HELP).is_err() {
            return Err(ExitCode::from(2));
        }
        return Ok(ExitCode::SUCCESS);
    }

    let cli = match cli::Cli::try_parse() {
        Ok(value) => value,
        Err(err) => return Err(report_parse_error(&err, &raw_args)),
    };
    let mode = output::mode_for_command(&cli.command);
    tracing::debug!(?mode, "dispatching command");

    match dispatch::dispatch(&cli) {
        Ok(success) => {
            if output::print_success(&success, mode).is_err() {
                return Err(ExitCode::from(2));
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            tracing::debug!(code = %error.code, "command failed");
            let printed = if dispatch::is_statement_import(&cli) {
                output::print_import_failure(&error, mode)
            } else {
                output::print_failure(&error, mode)
            };
            if printed.is_err() {
                return Err(ExitCode::from(2));
            }
            Err(exit_code_for_error(&error))
        }
    }
}

fn report_parse_error(err: &clap::Error, raw_args: &[String]) -> ExitCode {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
            let text = if is_top_level_help_request(raw_args) {
                TOP_LEVEL_HELP.to_string()
            } else {
                err.to_string()
            };
            return match write_stdout_text(&text) {
                Ok(()) => ExitCode::SUCCESS,
                Err(_) => ExitCode::from(2),
            };
        }
        ErrorKind::DisplayVersion => {
            return match write_stdout_text(&err.to_string()) {
                Ok(()) => ExitCode::SUCCESS,
                Err(_) => ExitCode::from(2),
            };
        }
        _ => {}
    }

    let command_hint = if matches!(
        err.kind(),
        ErrorKind::MissingRequiredArgument
            | ErrorKind::InvalidValue
            | ErrorKind::ValueValidation
            | ErrorKind::WrongNumberOfValues
            | ErrorKind::UnknownArgument
            | ErrorKind::InvalidSubcommand
            | ErrorKind::ArgumentConflict
    ) {
        command_path_from_args(raw_args)
    } else {
        None
    };
    let clean_message = strip_clap_boilerplate(&err.to_string());
    let parse_error = ClientError::invalid_argument_for_command(&clean_message, command_hint);
    let mode = infer_requested_output_mode(raw_args);
    let printed = if command_hint == Some("statement import") {
        output::print_import_failure(&parse_error, mode)
    } else {
        output::print_failure(&parse_error, mode)
    };
    if printed.is_err() {
        return ExitCode::from(2);
    }
    ExitCode::from(1)
}

fn is_top_level_help_request(raw_args: &[String]) -> bool {
    raw_args.len() == 2 && matches!(raw_args[1].as_str(), "--help" | "-h")
}

/// Drops clap's trailing usage and "For more information" lines.
fn strip_clap_boilerplate(message: &str) -> String {
    let trimmed = if let Some(pos) = message.find("\n\nUsage:") {
        &message[..pos]
    } else if let Some(pos) = message.find("\nFor more information") {
        &message[..pos]
    } else {
        message
    };
    trimmed.trim_end().to_string()
}

/// Longest known subcommand path named by the raw args, used for help hints.
fn command_path_from_args(raw_args: &[String]) -> Option<&'static str> {
    let words: Vec<&str> = raw_args
        .iter()
        .skip(1)
        .filter(|value| !value.starts_with('-'))
        .map(String::as_str)
        .collect();

    match words.as_slice() {
        ["statement", "import", ..] => Some("statement import"),
        ["statement", "list", ..] => Some("statement list"),
        ["statement", "show", ..] => Some("statement show"),
        ["statement", "status", ..] => Some("statement status"),
        ["statement", "delete", ..] => Some("statement delete"),
        ["statement", ..] => Some("statement"),
        ["reconcile", "auto", ..] => Some("reconcile auto"),
        ["reconcile", "match", ..] => Some("reconcile match"),
        ["reconcile", "unmatch", ..] => Some("reconcile unmatch"),
        ["reconcile", "ignore", ..] => Some("reconcile ignore"),
        ["reconcile", "audit", ..] => Some("reconcile audit"),
        ["reconcile", ..] => Some("reconcile"),
        ["ledger", "load", ..] => Some("ledger load"),
        ["ledger", ..] => Some("ledger"),
        ["export", ..] => Some("export"),
        _ => None,
    }
}

fn exit_code_for_error(error: &ClientError) -> ExitCode {
    if error.is_internal() {
        ExitCode::from(2)
    } else {
        ExitCode::from(1)
    }
}

fn infer_requested_output_mode(raw_args: &[String]) -> output::OutputMode {
    if raw_args.iter().skip(1).any(|value| value == "--json") {
        return output::OutputMode::Json;
    }
    output::OutputMode::Text
}

#[cfg(test)]
mod tests {
    use super::{command_path_from_args, infer_requested_output_mode, strip_clap_boilerplate};
    use crate::output::OutputMode;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn command_path_prefers_the_longest_known_prefix() {
        assert_eq!(
            command_path_from_args(&args(&["bankrec", "reconcile", "match", "line_1"])),
            Some("reconcile match")
        );
        assert_eq!(
            command_path_from_args(&args(&["bankrec", "statement", "bogus"])),
            Some("statement")
        );
        assert_eq!(
            command_path_from_args(&args(&["bankrec", "--json", "export", "stmt_1"])),
            Some("export")
        );
        assert_eq!(command_path_from_args(&args(&["bankrec", "frobnicate"])), None);
    }

    #[test]
    fn strips_usage_and_more_information_tail() {
        let message = "error: unexpected argument '--x' found\n\nUsage: bankrec export <ID>\n\nFor more information, try '--help'.\n";
        assert_eq!(
            strip_clap_boilerplate(message),
            "error: unexpected argument '--x' found"
        );
    }

    #[test]
    fn json_flag_anywhere_requests_json_errors() {
        assert_eq!(
            infer_requested_output_mode(&args(&["bankrec", "statement", "show", "--json"])),
            OutputMode::Json
        );
        assert_eq!(
            infer_requested_output_mode(&args(&["bankrec", "statement", "show"])),
            OutputMode::Text
        );
    }
}
