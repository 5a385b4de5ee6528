// src/config.rs

use std::env;

use anyhow::{Context, bail};
use tracing_subscriber::EnvFilter;

use crate::models::dossier::{DossierStatus, StepRange, StepRangeTable};

// --- Business constants ---

/// Steps of the CNAM approval workflow.
pub const TOTAL_STEPS: i32 = 7;
/// A recall becomes "upcoming" this many days before its due date.
pub const UPCOMING_WINDOW_DAYS: i64 = 90;
pub const ACCESSORY_RENEWAL_YEARS: i32 = 2;
pub const DEVICE_RENEWAL_YEARS: i32 = 7;
pub const DEFAULT_DOSSIER_NUMBER: &str = "N/A";

// --- Policy ---

/// What the dossier mutation boundary does with a status/step combination
/// that the range table does not allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepPolicy {
    Off,
    #[default]
    Warn,
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub step_policy: StepPolicy,
    pub allow_step_regression: bool,
    pub step_ranges: StepRangeTable,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            step_policy: StepPolicy::default(),
            allow_step_regression: true,
            step_ranges: StepRangeTable::default(),
        }
    }
}

impl CoreConfig {
    /// Reads the policy knobs from the process environment (and `.env`).
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = Self::from_lookup(|key| env::var(key).ok())?;

        tracing::info!(
            policy = ?config.step_policy,
            allow_regression = config.allow_step_regression,
            "CNAM core configuration loaded"
        );
        Ok(config)
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup("CNAM_STEP_POLICY") {
            config.step_policy = parse_policy(&raw).context("CNAM_STEP_POLICY")?;
        }

        if let Some(raw) = lookup("CNAM_ALLOW_STEP_REGRESSION") {
            config.allow_step_regression =
                parse_bool(&raw).context("CNAM_ALLOW_STEP_REGRESSION")?;
        }

        for status in DossierStatus::ALL {
            let key = format!("CNAM_STEP_RANGE_{}", status.code());
            if let Some(raw) = lookup(&key) {
                let range = parse_range(&raw).with_context(|| key.clone())?;
                config.step_ranges = config.step_ranges.with_range(status, range);
            }
        }

        Ok(config)
    }
}

fn parse_policy(raw: &str) -> anyhow::Result<StepPolicy> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "off" => Ok(StepPolicy::Off),
        "warn" => Ok(StepPolicy::Warn),
        "reject" => Ok(StepPolicy::Reject),
        other => bail!("unknown step policy '{other}' (expected off, warn or reject)"),
    }
}

fn parse_bool(raw: &str) -> anyhow::Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => bail!("expected a boolean, got '{other}'"),
    }
}

fn parse_range(raw: &str) -> anyhow::Result<StepRange> {
    let (min, max) = raw
        .trim()
        .split_once('-')
        .with_context(|| format!("expected 'min-max', got '{raw}'"))?;
    let min: i32 = min.trim().parse().context("range minimum")?;
    let max: i32 = max.trim().parse().context("range maximum")?;

    if min < 1 || max > TOTAL_STEPS || min > max {
        bail!("step range {min}-{max} must lie within 1-{TOTAL_STEPS}");
    }
    Ok(StepRange { min, max })
}

/// Installs the fmt subscriber used by host binaries. Safe to call twice.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_permissive() {
        let config = CoreConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.step_policy, StepPolicy::Warn);
        assert!(config.allow_step_regression);
        assert_eq!(config.step_ranges.range_for(DossierStatus::Termine), StepRange::FULL);
    }

    #[test]
    fn reads_policy_and_ranges() {
        let config = CoreConfig::from_lookup(lookup(&[
            ("CNAM_STEP_POLICY", "Reject"),
            ("CNAM_ALLOW_STEP_REGRESSION", "false"),
            ("CNAM_STEP_RANGE_TERMINE", "7-7"),
        ]))
        .unwrap();

        assert_eq!(config.step_policy, StepPolicy::Reject);
        assert!(!config.allow_step_regression);
        assert_eq!(
            config.step_ranges.range_for(DossierStatus::Termine),
            StepRange { min: 7, max: 7 }
        );
        assert_eq!(config.step_ranges.range_for(DossierStatus::EnCours), StepRange::FULL);
    }

    #[test]
    fn rejects_malformed_values() {
        assert!(CoreConfig::from_lookup(lookup(&[("CNAM_STEP_POLICY", "strict")])).is_err());
        assert!(CoreConfig::from_lookup(lookup(&[("CNAM_STEP_RANGE_APPROUVE", "0-9")])).is_err());
        assert!(CoreConfig::from_lookup(lookup(&[("CNAM_STEP_RANGE_APPROUVE", "5")])).is_err());
        assert!(CoreConfig::from_lookup(lookup(&[("CNAM_ALLOW_STEP_REGRESSION", "maybe")])).is_err());
    }

    #[test]
    fn tracing_init_is_idempotent() {
        init_tracing();
        init_tracing();
        tracing::info!("still logging");
    }
}
