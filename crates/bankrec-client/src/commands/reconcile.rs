use std::path::Path;

use crate::ClientResult;
use crate::commands::{DEFAULT_ACTOR, open_store};
use crate::config::{EngineConfig, Tolerance};
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::AuditTrailData;
use crate::reconcile::manual;
use crate::reconcile::matcher::auto_match_statement;

#[derive(Debug, Default)]
pub struct AutoOptions<'a> {
    pub statement_id: String,
    pub tolerance: Option<Tolerance>,
    pub date_window_days: Option<i64>,
    pub home_override: Option<&'a Path>,
}

#[derive(Debug, Default)]
pub struct MatchOptions<'a> {
    pub line_id: String,
    pub transaction_id: i64,
    pub performed_by: Option<String>,
    pub home_override: Option<&'a Path>,
}

#[derive(Debug, Default)]
pub struct LineOptions<'a> {
    pub line_id: String,
    pub performed_by: Option<String>,
    pub home_override: Option<&'a Path>,
}

pub fn auto(statement_id: &str) -> ClientResult<SuccessEnvelope> {
    auto_with_options(AutoOptions {
        statement_id: statement_id.to_string(),
        ..AutoOptions::default()
    })
}

#[doc(hidden)]
pub fn auto_with_options(options: AutoOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let config =
        EngineConfig::from_env()?.with_overrides(options.tolerance, options.date_window_days)?;
    let mut store = open_store(options.home_override)?;
    let data = auto_match_statement(&mut store, &options.statement_id, &config)?;
    success("reconcile auto", data)
}

pub fn match_line(line_id: &str, transaction_id: i64) -> ClientResult<SuccessEnvelope> {
    match_with_options(MatchOptions {
        line_id: line_id.to_string(),
        transaction_id,
        ..MatchOptions::default()
    })
}

#[doc(hidden)]
pub fn match_with_options(options: MatchOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let mut store = open_store(options.home_override)?;
    let data = manual::match_line(
        &mut store,
        &options.line_id,
        options.transaction_id,
        actor(options.performed_by.as_deref()),
    )?;
    success("reconcile match", data)
}

pub fn unmatch(line_id: &str) -> ClientResult<SuccessEnvelope> {
    unmatch_with_options(LineOptions {
        line_id: line_id.to_string(),
        ..LineOptions::default()
    })
}

#[doc(hidden)]
pub fn unmatch_with_options(options: LineOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let mut store = open_store(options.home_override)?;
    let data = manual::unmatch_line(
        &mut store,
        &options.line_id,
        actor(options.performed_by.as_deref()),
    )?;
    success("reconcile unmatch", data)
}

pub fn ignore(line_id: &str) -> ClientResult<SuccessEnvelope> {
    ignore_with_options(LineOptions {
        line_id: line_id.to_string(),
        ..LineOptions::default()
    })
}

#[doc(hidden)]
pub fn ignore_with_options(options: LineOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let mut store = open_store(options.home_override)?;
    let data = manual::ignore_line(
        &mut store,
        &options.line_id,
        actor(options.performed_by.as_deref()),
    )?;
    success("reconcile ignore", data)
}

pub fn audit(line_id: &str) -> ClientResult<SuccessEnvelope> {
    audit_with_options(LineOptions {
        line_id: line_id.to_string(),
        ..LineOptions::default()
    })
}

#[doc(hidden)]
pub fn audit_with_options(options: LineOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let store = open_store(options.home_override)?;
    let rows = manual::audit_trail(&store, &options.line_id)?;
    success(
        "reconcile audit",
        AuditTrailData {
            line_id: options.line_id,
            rows,
        },
    )
}

fn actor(performed_by: Option<&str>) -> &str {
    match performed_by {
        Some(value) if !value.trim().is_empty() => value,
        _ => DEFAULT_ACTOR,
    }
}
