use bankrec_client::config::{MAX_DATE_WINDOW_DAYS, Tolerance};
use clap::{Args, Parser, Subcommand};

pub fn parse_non_negative_amount(value: &str) -> Result<f64, String> {
    let parsed = value
        .trim()
        .parse::<f64>()
        .map_err(|_| "value must be a number".to_string())?;
    if !parsed.is_finite() || parsed < 0.0 {
        return Err("value must be zero or greater".to_string());
    }
    Ok(parsed)
}

pub fn parse_window_days(value: &str) -> Result<i64, String> {
    let parsed = value
        .trim()
        .parse::<i64>()
        .map_err(|_| "date window must be a whole number of days".to_string())?;
    if !(0..=MAX_DATE_WINDOW_DAYS).contains(&parsed) {
        return Err(format!(
            "date window must be between 0 and {MAX_DATE_WINDOW_DAYS} days"
        ));
    }
    Ok(parsed)
}

/// Extended help shown after `bankrec statement import --help`.
pub const STATEMENT_IMPORT_AFTER_HELP: &str = "\
How import works:
  <path> is a delimited bank statement export (CSV, semicolon or tab).
  Use `-` or omit <path> to read the statement from stdin.

  The issuing bank is detected from the header row and file name.
  Known layouts: hdfc, icici, sbi, axis, kotak. Anything else is parsed
  with generic column keywords (date, description/narration, debit,
  credit, amount, type, balance).

  Rows without a usable amount are skipped and reported as warnings.
  Importing the same bytes twice is rejected with DUPLICATE_FILE.

After import:
  Unless --no-auto-reconcile is given, every line is matched against open
  accounting transactions (sales for credits, purchases for debits).
  Lines that stay unmatched are listed with a suggested party.

Tuning (flags override environment):
  BANKREC_AMOUNT_TOLERANCE_PCT   default 1.0
  BANKREC_MIN_AMOUNT_TOLERANCE   default 0
  BANKREC_DATE_WINDOW_DAYS       default 7
  BANKREC_SUGGESTION_THRESHOLD   default 0.6
";

/// Extended help shown after `bankrec ledger load --help`.
pub const LEDGER_LOAD_AFTER_HELP: &str = "\
Fixture layout:
  {
    \"parties\": [{\"id\": 1, \"name\": \"Acme Traders\"}],
    \"transactions\": [
      {
        \"id\": 101,
        \"voucher_no\": \"INV-101\",
        \"voucher_type\": \"sale\",
        \"date\": \"2024-03-03\",
        \"total_amount\": 10000.0,
        \"party_id\": 1,
        \"payment_status\": \"unpaid\"
      }
    ]
  }

  voucher_type is one of sale, purchase, expense, receipt, payment, journal.
  payment_status is one of unpaid, partial, paid (default unpaid).
  Rows are upserted by id, so loading a fixture twice is safe.
";

#[derive(Debug, Parser)]
#[command(
    name = "bankrec",
    version,
    about = "bank statement reconciliation engine",
    disable_help_subcommand = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Import and inspect bank statements
    #[command(arg_required_else_help = true)]
    Statement {
        #[command(subcommand)]
        command: StatementCommand,
    },
    /// Match bank lines to accounting transactions
    #[command(arg_required_else_help = true)]
    Reconcile {
        #[command(subcommand)]
        command: ReconcileCommand,
    },
    /// Export matched lines of a statement as CSV
    Export {
        /// The statement ID to export (e.g. stmt_abc123)
        statement_id: String,
        /// Write the CSV to this path instead of stdout
        #[arg(long, short)]
        output: Option<String>,
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
    /// Load accounting collaborators (parties and transactions)
    #[command(arg_required_else_help = true)]
    Ledger {
        #[command(subcommand)]
        command: LedgerCommand,
    },
}

#[derive(Debug, Clone, Default, Args)]
pub struct MatchTuning {
    /// Amount tolerance as a percentage of the line amount
    #[arg(long, value_parser = parse_non_negative_amount, conflicts_with = "tolerance_abs")]
    pub tolerance_pct: Option<f64>,
    /// Amount tolerance as a fixed amount
    #[arg(long, value_parser = parse_non_negative_amount)]
    pub tolerance_abs: Option<f64>,
    /// Days either side of the line date to search for candidates
    #[arg(long, value_parser = parse_window_days)]
    pub date_window: Option<i64>,
}

impl MatchTuning {
    pub fn tolerance(&self) -> Option<Tolerance> {
        match (self.tolerance_pct, self.tolerance_abs) {
            (Some(pct), _) => Some(Tolerance::Percent(pct)),
            (None, Some(units)) => Some(Tolerance::Absolute(units)),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
pub enum StatementCommand {
    /// Import a bank statement file and auto-match its lines
    #[command(after_long_help = STATEMENT_IMPORT_AFTER_HELP)]
    Import {
        /// Path to the statement file (use `-` for stdin)
        path: Option<String>,
        /// Store the statement without running the auto-matcher
        #[arg(long)]
        no_auto_reconcile: bool,
        /// File name to record when reading from stdin
        #[arg(long)]
        file_name: Option<String>,
        #[command(flatten)]
        tuning: MatchTuning,
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
    /// List imported statements, newest first
    List {
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
    /// Show a statement and all of its lines
    Show {
        /// The statement ID to show (e.g. stmt_abc123)
        statement_id: String,
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
    /// Summarise reconciliation progress of a statement
    Status {
        /// The statement ID to summarise (e.g. stmt_abc123)
        statement_id: String,
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
    /// Delete a statement and release every match it holds
    Delete {
        /// The statement ID to delete (e.g. stmt_abc123)
        statement_id: String,
        /// Name recorded in the audit log
        #[arg(long)]
        by: Option<String>,
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum ReconcileCommand {
    /// Run the auto-matcher over a statement's unreconciled lines
    Auto {
        /// The statement ID to reconcile (e.g. stmt_abc123)
        statement_id: String,
        #[command(flatten)]
        tuning: MatchTuning,
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
    /// Manually match a bank line to an accounting transaction
    Match {
        /// The bank line ID (e.g. line_abc123)
        line_id: String,
        /// The accounting transaction ID
        transaction_id: i64,
        /// Name recorded in the audit log
        #[arg(long)]
        by: Option<String>,
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
    /// Return a matched or ignored line to the unreconciled pool
    Unmatch {
        /// The bank line ID (e.g. line_abc123)
        line_id: String,
        /// Name recorded in the audit log
        #[arg(long)]
        by: Option<String>,
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
    /// Mark a line as needing no accounting counterpart
    Ignore {
        /// The bank line ID (e.g. line_abc123)
        line_id: String,
        /// Name recorded in the audit log
        #[arg(long)]
        by: Option<String>,
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
    /// Show the audit trail of a bank line
    Audit {
        /// The bank line ID (e.g. line_abc123)
        line_id: String,
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum LedgerCommand {
    /// Upsert parties and accounting transactions from a JSON fixture
    #[command(after_long_help = LEDGER_LOAD_AFTER_HELP)]
    Load {
        /// Path to the JSON fixture
        path: String,
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
pub fn parse_from<I, T>(itr: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(itr)
}

#[cfg(test)]
mod tests {
    use bankrec_client::config::Tolerance;
    use clap::error::ErrorKind;

    use super::{Commands, ReconcileCommand, StatementCommand, parse_from, parse_window_days};

    #[test]
    fn parse_command_paths() {
        let cases: [Vec<&str>; 16] = [
            vec!["bankrec", "statement", "import", "./march.csv"],
            vec!["bankrec", "statement", "import", "-", "--file-name", "march.csv"],
            vec!["bankrec", "statement", "import"],
            vec!["bankrec", "statement", "import", "./march.csv", "--no-auto-reconcile"],
            vec!["bankrec", "statement", "list", "--json"],
            vec!["bankrec", "statement", "show", "stmt_1"],
            vec!["bankrec", "statement", "status", "stmt_1", "--json"],
            vec!["bankrec", "statement", "delete", "stmt_1", "--by", "alice"],
            vec!["bankrec", "reconcile", "auto", "stmt_1", "--date-window", "3"],
            vec!["bankrec", "reconcile", "match", "line_1", "101"],
            vec!["bankrec", "reconcile", "match", "line_1", "101", "--by", "alice", "--json"],
            vec!["bankrec", "reconcile", "unmatch", "line_1"],
            vec!["bankrec", "reconcile", "ignore", "line_1", "--json"],
            vec!["bankrec", "reconcile", "audit", "line_1"],
            vec!["bankrec", "export", "stmt_1", "--output", "matched.csv"],
            vec!["bankrec", "ledger", "load", "./ledger.json", "--json"],
        ];

        for case in cases {
            let parsed = parse_from(case.clone());
            assert!(parsed.is_ok(), "failed to parse: {case:?}");
        }
    }

    #[test]
    fn import_flags_are_carried_through() {
        let parsed = parse_from([
            "bankrec",
            "statement",
            "import",
            "march.csv",
            "--tolerance-abs",
            "25",
            "--no-auto-reconcile",
            "--json",
        ]);
        assert!(parsed.is_ok());
        if let Ok(cli) = parsed {
            match cli.command {
                Commands::Statement {
                    command:
                        StatementCommand::Import {
                            path,
                            no_auto_reconcile,
                            tuning,
                            json,
                            ..
                        },
                } => {
                    assert_eq!(path.as_deref(), Some("march.csv"));
                    assert!(no_auto_reconcile);
                    assert!(json);
                    assert_eq!(tuning.tolerance(), Some(Tolerance::Absolute(25.0)));
                    assert_eq!(tuning.date_window, None);
                }
                other => panic!("unexpected command: {other:?}"),
            }
        }
    }

    #[test]
    fn tolerance_flags_conflict() {
        let parsed = parse_from([
            "bankrec",
            "reconcile",
            "auto",
            "stmt_1",
            "--tolerance-pct",
            "1",
            "--tolerance-abs",
            "5",
        ]);
        assert!(parsed.is_err());
        if let Err(err) = parsed {
            assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
        }
    }

    #[test]
    fn negative_tuning_values_are_rejected() {
        let pct = parse_from([
            "bankrec",
            "reconcile",
            "auto",
            "stmt_1",
            "--tolerance-pct=-1",
        ]);
        assert!(pct.is_err());

        let window = parse_from([
            "bankrec",
            "reconcile",
            "auto",
            "stmt_1",
            "--date-window=-2",
        ]);
        assert!(window.is_err());
    }

    #[test]
    fn date_window_is_capped_at_a_century() {
        assert_eq!(parse_window_days("36500"), Ok(36500));
        assert!(parse_window_days("36501").is_err());

        let parsed = parse_from([
            "bankrec",
            "reconcile",
            "auto",
            "stmt_1",
            "--date-window",
            "100000000",
        ]);
        assert!(parsed.is_err());
        if let Err(err) = parsed {
            assert_eq!(err.kind(), ErrorKind::ValueValidation);
        }
    }

    #[test]
    fn match_requires_numeric_transaction_id() {
        let parsed = parse_from(["bankrec", "reconcile", "match", "line_1", "abc"]);
        assert!(parsed.is_err());
        if let Err(err) = parsed {
            assert_eq!(err.kind(), ErrorKind::ValueValidation);
        }

        let parsed = parse_from(["bankrec", "reconcile", "match", "line_1", "7"]);
        assert!(parsed.is_ok());
        if let Ok(cli) = parsed {
            assert!(matches!(
                cli.command,
                Commands::Reconcile {
                    command: ReconcileCommand::Match {
                        transaction_id: 7,
                        ..
                    }
                }
            ));
        }
    }

    #[test]
    fn bare_groups_show_help() {
        for group in ["statement", "reconcile", "ledger"] {
            let parsed = parse_from(["bankrec", group]);
            assert!(parsed.is_err());
            if let Err(err) = parsed {
                assert_eq!(
                    err.kind(),
                    ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                );
            }
        }
    }

    #[test]
    fn unknown_command_is_rejected() {
        let parsed = parse_from(["bankrec", "import", "create"]);
        assert!(parsed.is_err());
    }
}
