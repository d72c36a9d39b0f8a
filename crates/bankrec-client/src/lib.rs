pub mod audit;
pub mod commands;
pub mod config;
pub mod contracts;
pub mod error;
pub mod ledger;
pub mod migrations;
pub mod parties;
pub mod reconcile;
pub mod setup;
pub mod state;
pub mod statement;

pub use contracts::envelope::{FailureEnvelope, ImportFailure, SuccessEnvelope};
pub use error::{ClientError, ClientResult};

pub const API_VERSION: &str = env!("CARGO_PKG_VERSION");
