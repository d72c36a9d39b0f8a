use crate::cli::{Commands, LedgerCommand, ReconcileCommand, StatementCommand};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum OutputMode {
    Text,
    Json,
}

impl OutputMode {
    fn from_flag(json: bool) -> Self {
        if json { Self::Json } else { Self::Text }
    }
}

pub fn mode_for_command(command: &Commands) -> OutputMode {
    let json = match command {
        Commands::Statement { command } => match command {
            StatementCommand::Import { json, .. }
            | StatementCommand::List { json }
            | StatementCommand::Show { json, .. }
            | StatementCommand::Status { json, .. }
            | StatementCommand::Delete { json, .. } => *json,
        },
        Commands::Reconcile { command } => match command {
            ReconcileCommand::Auto { json, .. }
            | ReconcileCommand::Match { json, .. }
            | ReconcileCommand::Unmatch { json, .. }
            | ReconcileCommand::Ignore { json, .. }
            | ReconcileCommand::Audit { json, .. } => *json,
        },
        Commands::Export { json, .. } => *json,
        Commands::Ledger { command } => match command {
            LedgerCommand::Load { json, .. } => *json,
        },
    };
    OutputMode::from_flag(json)
}
