use std::path::PathBuf;

use bankrec_client::commands::{export, ledger, reconcile, statement};
use bankrec_client::{ClientResult, SuccessEnvelope};

use crate::cli::{Cli, Commands, LedgerCommand, ReconcileCommand, StatementCommand};

pub fn dispatch(cli: &Cli) -> ClientResult<SuccessEnvelope> {
    match &cli.command {
        Commands::Statement { command } => dispatch_statement(command),
        Commands::Reconcile { command } => dispatch_reconcile(command),
        Commands::Export {
            statement_id,
            output,
            ..
        } => export::run(statement_id, output.as_ref().map(PathBuf::from)),
        Commands::Ledger { command } => match command {
            LedgerCommand::Load { path, .. } => ledger::load(path),
        },
    }
}

fn dispatch_statement(command: &StatementCommand) -> ClientResult<SuccessEnvelope> {
    match command {
        StatementCommand::Import {
            path,
            no_auto_reconcile,
            file_name,
            tuning,
            ..
        } => statement::import_with_options(statement::ImportOptions {
            path: path.clone(),
            auto_reconcile: !*no_auto_reconcile,
            tolerance: tuning.tolerance(),
            date_window_days: tuning.date_window,
            file_name_override: file_name.clone(),
            ..statement::ImportOptions::default()
        }),
        StatementCommand::List { .. } => statement::list(),
        StatementCommand::Show { statement_id, .. } => statement::show(statement_id),
        StatementCommand::Status { statement_id, .. } => statement::status(statement_id),
        StatementCommand::Delete {
            statement_id, by, ..
        } => statement::delete_with_options(statement::DeleteOptions {
            statement_id: statement_id.clone(),
            performed_by: by.clone(),
            home_override: None,
        }),
    }
}

fn dispatch_reconcile(command: &ReconcileCommand) -> ClientResult<SuccessEnvelope> {
    match command {
        ReconcileCommand::Auto {
            statement_id,
            tuning,
            ..
        } => reconcile::auto_with_options(reconcile::AutoOptions {
            statement_id: statement_id.clone(),
            tolerance: tuning.tolerance(),
            date_window_days: tuning.date_window,
            home_override: None,
        }),
        ReconcileCommand::Match {
            line_id,
            transaction_id,
            by,
            ..
        } => reconcile::match_with_options(reconcile::MatchOptions {
            line_id: line_id.clone(),
            transaction_id: *transaction_id,
            performed_by: by.clone(),
            home_override: None,
        }),
        ReconcileCommand::Unmatch { line_id, by, .. } => {
            reconcile::unmatch_with_options(line_options(line_id, by))
        }
        ReconcileCommand::Ignore { line_id, by, .. } => {
            reconcile::ignore_with_options(line_options(line_id, by))
        }
        ReconcileCommand::Audit { line_id, .. } => reconcile::audit(line_id),
    }
}

fn line_options(line_id: &str, by: &Option<String>) -> reconcile::LineOptions<'static> {
    reconcile::LineOptions {
        line_id: line_id.to_string(),
        performed_by: by.clone(),
        home_override: None,
    }
}

/// `true` when failures of this command use the flat import failure shape.
pub fn is_statement_import(cli: &Cli) -> bool {
    matches!(
        cli.command,
        Commands::Statement {
            command: StatementCommand::Import { .. }
        }
    )
}

#[cfg(test)]
mod tests {
    use crate::cli::parse_from;

    use super::is_statement_import;

    #[test]
    fn only_statement_import_uses_import_failure_shape() {
        let cases: [(&[&str], bool); 4] = [
            (&["bankrec", "statement", "import", "march.csv"], true),
            (&["bankrec", "statement", "import", "-", "--json"], true),
            (&["bankrec", "statement", "list"], false),
            (&["bankrec", "reconcile", "auto", "stmt_1"], false),
        ];

        for (args, expected) in cases {
            let parsed = parse_from(args);
            assert!(parsed.is_ok());
            if let Ok(cli) = parsed {
                assert_eq!(is_statement_import(&cli), expected, "{args:?}");
            }
        }
    }
}
