use std::env;

use crate::{ClientError, ClientResult};

pub const AMOUNT_TOLERANCE_PCT_ENV_VAR: &str = "BANKREC_AMOUNT_TOLERANCE_PCT";
pub const MIN_AMOUNT_TOLERANCE_ENV_VAR: &str = "BANKREC_MIN_AMOUNT_TOLERANCE";
pub const DATE_WINDOW_DAYS_ENV_VAR: &str = "BANKREC_DATE_WINDOW_DAYS";
pub const SUGGESTION_THRESHOLD_ENV_VAR: &str = "BANKREC_SUGGESTION_THRESHOLD";

const DEFAULT_AMOUNT_TOLERANCE_PCT: f64 = 1.0;
const DEFAULT_MIN_AMOUNT_TOLERANCE: f64 = 0.0;
const DEFAULT_DATE_WINDOW_DAYS: i64 = 7;
const DEFAULT_SUGGESTION_THRESHOLD: f64 = 0.6;

/// Widest accepted date window, roughly one hundred years.
pub const MAX_DATE_WINDOW_DAYS: i64 = 36_500;

/// How far a candidate's amount may drift from the bank line amount.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tolerance {
    /// Percentage of the bank line amount (1.0 means 1%).
    Percent(f64),
    /// Fixed amount in currency units.
    Absolute(f64),
}

impl Tolerance {
    /// Absolute amount limit for a line of `amount`, never below `floor`.
    pub fn limit_for(&self, amount: f64, floor: f64) -> f64 {
        let raw = match self {
            Self::Percent(pct) => amount.abs() * pct / 100.0,
            Self::Absolute(units) => *units,
        };
        raw.max(floor)
    }
}

/// Engine tuning knobs resolved from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub tolerance: Tolerance,
    pub min_amount_tolerance: f64,
    pub date_window_days: i64,
    pub suggestion_threshold: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tolerance: Tolerance::Percent(DEFAULT_AMOUNT_TOLERANCE_PCT),
            min_amount_tolerance: DEFAULT_MIN_AMOUNT_TOLERANCE,
            date_window_days: DEFAULT_DATE_WINDOW_DAYS,
            suggestion_threshold: DEFAULT_SUGGESTION_THRESHOLD,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> ClientResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> ClientResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let tolerance_pct = read_f64(&lookup, AMOUNT_TOLERANCE_PCT_ENV_VAR)?
            .unwrap_or(DEFAULT_AMOUNT_TOLERANCE_PCT);
        let min_amount_tolerance = read_f64(&lookup, MIN_AMOUNT_TOLERANCE_ENV_VAR)?
            .unwrap_or(defaults.min_amount_tolerance);
        let date_window_days =
            read_i64(&lookup, DATE_WINDOW_DAYS_ENV_VAR)?.unwrap_or(defaults.date_window_days);
        let suggestion_threshold = read_f64(&lookup, SUGGESTION_THRESHOLD_ENV_VAR)?
            .unwrap_or(defaults.suggestion_threshold);

        let config = Self {
            tolerance: Tolerance::Percent(tolerance_pct),
            min_amount_tolerance,
            date_window_days,
            suggestion_threshold,
        };
        config.validate()?;
        Ok(config)
    }

    /// Applies per-call overrides on top of the resolved values.
    pub fn with_overrides(
        mut self,
        tolerance: Option<Tolerance>,
        date_window_days: Option<i64>,
    ) -> ClientResult<Self> {
        if let Some(value) = tolerance {
            self.tolerance = value;
        }
        if let Some(value) = date_window_days {
            self.date_window_days = value;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> ClientResult<()> {
        let tolerance_value = match self.tolerance {
            Tolerance::Percent(value) | Tolerance::Absolute(value) => value,
        };
        if !tolerance_value.is_finite() || tolerance_value < 0.0 {
            return Err(ClientError::invalid_argument(
                "Amount tolerance must be a non-negative number.",
            ));
        }
        if !self.min_amount_tolerance.is_finite() || self.min_amount_tolerance < 0.0 {
            return Err(ClientError::invalid_argument(
                "Minimum amount tolerance must be a non-negative number.",
            ));
        }
        if !(0..=MAX_DATE_WINDOW_DAYS).contains(&self.date_window_days) {
            return Err(ClientError::invalid_argument(&format!(
                "Date window must be between 0 and {MAX_DATE_WINDOW_DAYS} days."
            )));
        }
        if !(0.0..=1.0).contains(&self.suggestion_threshold) {
            return Err(ClientError::invalid_argument(
                "Suggestion threshold must be between 0 and 1.",
            ));
        }
        Ok(())
    }
}

fn read_f64<F>(lookup: &F, key: &str) -> ClientResult<Option<f64>>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<f64>()
        .map(Some)
        .map_err(|_| invalid_env_value(key, trimmed))
}

fn read_i64<F>(lookup: &F, key: &str) -> ClientResult<Option<i64>>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<i64>()
        .map(Some)
        .map_err(|_| invalid_env_value(key, trimmed))
}

fn invalid_env_value(key: &str, value: &str) -> ClientError {
    ClientError::invalid_argument_with_recovery(
        &format!("Environment variable `{key}` has invalid value `{value}`."),
        vec![format!("Unset `{key}` or set it to a valid number.")],
    )
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::{EngineConfig, MAX_DATE_WINDOW_DAYS, Tolerance};

    fn config_from(pairs: &[(&str, &str)]) -> crate::ClientResult<EngineConfig> {
        let values = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect::<HashMap<String, String>>();
        EngineConfig::from_lookup(|key| values.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_environment_is_empty() {
        let config = config_from(&[]);
        assert!(config.is_ok());
        if let Ok(value) = config {
            assert_eq!(value, EngineConfig::default());
            assert_eq!(value.tolerance, Tolerance::Percent(1.0));
            assert_eq!(value.date_window_days, 7);
        }
    }

    #[test]
    fn environment_values_override_defaults() {
        let config = config_from(&[
            ("BANKREC_AMOUNT_TOLERANCE_PCT", "2.5"),
            ("BANKREC_MIN_AMOUNT_TOLERANCE", "1"),
            ("BANKREC_DATE_WINDOW_DAYS", "3"),
            ("BANKREC_SUGGESTION_THRESHOLD", "0.8"),
        ]);
        assert!(config.is_ok());
        if let Ok(value) = config {
            assert_eq!(value.tolerance, Tolerance::Percent(2.5));
            assert_eq!(value.min_amount_tolerance, 1.0);
            assert_eq!(value.date_window_days, 3);
            assert_eq!(value.suggestion_threshold, 0.8);
        }
    }

    #[test]
    fn malformed_values_are_invalid_arguments() {
        let config = config_from(&[("BANKREC_DATE_WINDOW_DAYS", "a week")]);
        assert!(config.is_err());
        if let Err(error) = config {
            assert_eq!(error.code, "INVALID_ARGUMENT");
        }

        let negative = config_from(&[("BANKREC_AMOUNT_TOLERANCE_PCT", "-1")]);
        assert!(negative.is_err());
    }

    #[test]
    fn overrides_take_precedence() {
        let config = EngineConfig::default().with_overrides(Some(Tolerance::Absolute(5.0)), Some(0));
        assert!(config.is_ok());
        if let Ok(value) = config {
            assert_eq!(value.tolerance, Tolerance::Absolute(5.0));
            assert_eq!(value.date_window_days, 0);
        }
    }

    #[test]
    fn oversized_date_window_is_rejected() {
        let from_env = config_from(&[("BANKREC_DATE_WINDOW_DAYS", "100000000")]);
        assert!(from_env.is_err());
        if let Err(error) = from_env {
            assert_eq!(error.code, "INVALID_ARGUMENT");
        }

        let at_limit = EngineConfig::default().with_overrides(None, Some(MAX_DATE_WINDOW_DAYS));
        assert!(at_limit.is_ok());

        let huge = EngineConfig::default().with_overrides(None, Some(i64::MAX / 2));
        assert!(huge.is_err());
        if let Err(error) = huge {
            assert_eq!(error.code, "INVALID_ARGUMENT");
        }
    }

    #[test]
    fn tolerance_limit_respects_floor() {
        assert!((Tolerance::Percent(1.0).limit_for(10000.0, 0.0) - 100.0).abs() < 1e-9);
        assert!((Tolerance::Percent(1.0).limit_for(50.0, 2.0) - 2.0).abs() < 1e-9);
        assert!((Tolerance::Absolute(3.0).limit_for(50.0, 0.0) - 3.0).abs() < 1e-9);
    }
}
