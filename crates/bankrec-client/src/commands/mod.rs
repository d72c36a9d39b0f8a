pub mod export;
pub mod ledger;
pub mod reconcile;
pub mod statement;

use std::path::{Path, PathBuf};

use crate::ClientResult;
use crate::setup::load_setup;
use crate::state::Store;

pub const DEFAULT_ACTOR: &str = "cli";

fn open_store(home_override: Option<&Path>) -> ClientResult<Store> {
    let setup = load_setup(home_override)?;
    Store::open(&PathBuf::from(&setup.db_path))
}
