use anyhow::{Context, Result};
use std::path::PathBuf;

pub(crate) const DEFAULT_HORIZON_MONTHS: u32 = 24;
/// Longest rolling window accepted, 100 years.
pub(crate) const MAX_HORIZON_MONTHS: u32 = 1_200;

pub(crate) const HORIZON_ENV: &str = "LEDGERLOOP_HORIZON_MONTHS";
pub(crate) const DB_PATH_ENV: &str = "LEDGERLOOP_DB";

/// Rolling window length for open-ended templates.
///
/// Returns the override when it parses as a non-negative integer, otherwise
/// [`DEFAULT_HORIZON_MONTHS`]. Values above [`MAX_HORIZON_MONTHS`] are
/// capped.
pub(crate) fn resolve_horizon_months(env_override: Option<&str>) -> u32 {
    env_override
        .and_then(|raw| raw.trim().parse::<u32>().ok())
        .map_or(DEFAULT_HORIZON_MONTHS, |months| months.min(MAX_HORIZON_MONTHS))
}

#[derive(Debug, Clone)]
pub(crate) struct Config {
    pub(crate) db_path: PathBuf,
    pub(crate) horizon_months: u32,
}

impl Config {
    /// Read the process environment once; everything downstream gets the
    /// resolved values passed in.
    pub(crate) fn from_env() -> Result<Self> {
        let horizon = std::env::var(HORIZON_ENV).ok();
        let db = std::env::var(DB_PATH_ENV).ok();
        Self::from_overrides(horizon.as_deref(), db.as_deref())
    }

    pub(crate) fn from_overrides(horizon: Option<&str>, db_path: Option<&str>) -> Result<Self> {
        let horizon_months = resolve_horizon_months(horizon);
        if let Some(raw) = horizon {
            match raw.trim().parse::<u32>() {
                Err(_) => tracing::warn!(value = raw, "ignoring unparseable {HORIZON_ENV}"),
                Ok(months) if months > MAX_HORIZON_MONTHS => tracing::warn!(
                    value = months,
                    cap = MAX_HORIZON_MONTHS,
                    "{HORIZON_ENV} too large, capping"
                ),
                Ok(_) => {}
            }
        }
        let db_path = match db_path.map(str::trim).filter(|p| !p.is_empty()) {
            Some(p) => PathBuf::from(p),
            None => default_db_path()?,
        };
        Ok(Self {
            db_path,
            horizon_months,
        })
    }
}

fn default_db_path() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("com", "ledgerloop", "LedgerLoop")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    let data_dir = proj_dirs.data_dir();
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
    Ok(data_dir.join("ledgerloop.db"))
}
