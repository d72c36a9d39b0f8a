use std::fs;
use std::path::Path;

use tracing::info;

use crate::commands::open_store;
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::LedgerLoadData;
use crate::ledger::{load_fixture, parse_fixture};
use crate::state::commit;
use crate::{ClientError, ClientResult};

#[derive(Debug, Default)]
pub struct LoadOptions<'a> {
    pub path: String,
    pub home_override: Option<&'a Path>,
}

pub fn load(path: &str) -> ClientResult<SuccessEnvelope> {
    load_with_options(LoadOptions {
        path: path.to_string(),
        home_override: None,
    })
}

/// Upserts parties and accounting transactions from a JSON fixture file.
#[doc(hidden)]
pub fn load_with_options(options: LoadOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let content = fs::read_to_string(&options.path).map_err(|error| {
        ClientError::invalid_ledger_fixture(&format!(
            "Could not read ledger fixture `{}`: {error}",
            options.path
        ))
    })?;
    let fixture = parse_fixture(&content)?;

    let mut store = open_store(options.home_override)?;
    let db_path = store.db_path().to_path_buf();
    let transaction = store.immediate()?;
    let (parties_upserted, transactions_upserted) = load_fixture(&transaction, &db_path, &fixture)?;
    commit(transaction, &db_path)?;

    info!(
        path = %options.path,
        parties_upserted, transactions_upserted, "ledger fixture loaded"
    );

    success(
        "ledger load",
        LedgerLoadData {
            path: options.path,
            parties_upserted,
            transactions_upserted,
        },
    )
}
