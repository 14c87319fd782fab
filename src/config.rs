use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::env;
use std::time::Duration;

use crate::constants;

/// Mock chain latency window and fault injection
#[derive(Clone, Debug, PartialEq)]
pub struct ChainSettings {
    pub min_latency: Duration,
    pub max_latency: Duration,
    /// Probability in `[0, 1]` that a confirmation is rejected
    pub failure_rate: f64,
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            min_latency: Duration::from_millis(constants::DEFAULT_CHAIN_MIN_LATENCY_MS),
            max_latency: Duration::from_millis(constants::DEFAULT_CHAIN_MAX_LATENCY_MS),
            failure_rate: constants::DEFAULT_CHAIN_FAILURE_RATE,
        }
    }
}

/// Application configuration loaded from the environment
#[derive(Clone)]
pub struct AppConfig {
    pub ledger_base_date: DateTime<Utc>,
    pub chain: ChainSettings,
    pub operator_id: String,
    pub operator_passcode: String,
    pub bcrypt_cost: u32,
    pub display_timezone: Tz,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("ledger_base_date", &self.ledger_base_date)
            .field("chain", &self.chain)
            .field("operator_id", &self.operator_id)
            .field("operator_passcode", &"<redacted>")
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("display_timezone", &self.display_timezone)
            .finish()
    }
}

impl AppConfig {
    /// Load from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from an arbitrary key lookup; unset keys fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_date_raw = lookup("LEDGER_BASE_DATE")
            .unwrap_or_else(|| constants::DEFAULT_LEDGER_BASE_DATE.to_string());
        let ledger_base_date = DateTime::parse_from_rfc3339(&base_date_raw)
            .with_context(|| format!("Invalid LEDGER_BASE_DATE: {base_date_raw}"))?
            .with_timezone(&Utc);

        let min_latency_ms = parse_or(&lookup, "CHAIN_MIN_LATENCY_MS", constants::DEFAULT_CHAIN_MIN_LATENCY_MS)?;
        let max_latency_ms = parse_or(&lookup, "CHAIN_MAX_LATENCY_MS", constants::DEFAULT_CHAIN_MAX_LATENCY_MS)?;
        if min_latency_ms > max_latency_ms {
            bail!("CHAIN_MIN_LATENCY_MS ({min_latency_ms}) exceeds CHAIN_MAX_LATENCY_MS ({max_latency_ms})");
        }

        let failure_rate: f64 = parse_or(&lookup, "CHAIN_FAILURE_RATE", constants::DEFAULT_CHAIN_FAILURE_RATE)?;
        if !(0.0..=1.0).contains(&failure_rate) {
            bail!("CHAIN_FAILURE_RATE must be within [0, 1], got {failure_rate}");
        }

        let bcrypt_cost: u32 = parse_or(&lookup, "BCRYPT_COST", bcrypt::DEFAULT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            bail!("BCRYPT_COST must be within [4, 31], got {bcrypt_cost}");
        }

        let tz_raw = lookup("DISPLAY_TIMEZONE")
            .unwrap_or_else(|| constants::DEFAULT_DISPLAY_TIMEZONE.to_string());
        let display_timezone: Tz = tz_raw
            .parse()
            .map_err(|e| anyhow!("Invalid DISPLAY_TIMEZONE '{tz_raw}': {e}"))?;

        Ok(Self {
            ledger_base_date,
            chain: ChainSettings {
                min_latency: Duration::from_millis(min_latency_ms),
                max_latency: Duration::from_millis(max_latency_ms),
                failure_rate,
            },
            operator_id: lookup("OPERATOR_ID").unwrap_or_else(|| constants::DEFAULT_OPERATOR_ID.to_string()),
            operator_passcode: lookup("OPERATOR_PASSCODE")
                .unwrap_or_else(|| constants::DEFAULT_OPERATOR_PASSCODE.to_string()),
            bcrypt_cost,
            display_timezone,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("Invalid {key} '{raw}': {e}")),
        None => Ok(default),
    }
}
