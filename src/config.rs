use anyhow::{Context, Result};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::upload::CHUNK_SIZE;

const DEFAULT_UPLOAD_TIMEOUT_SECS: u64 = 300;

/// Runtime settings, read from `SALECHECK_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Config {
    pub(crate) db_path: PathBuf,
    pub(crate) chunk_size: usize,
    pub(crate) upload_timeout: Duration,
}

impl Config {
    pub(crate) fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let db_path = match lookup("SALECHECK_DB").filter(|p| !p.trim().is_empty()) {
            Some(path) => PathBuf::from(path),
            None => default_db_path()?,
        };
        let chunk_size = positive_or_default(&lookup, "SALECHECK_CHUNK_SIZE", CHUNK_SIZE);
        let timeout_secs = positive_or_default(
            &lookup,
            "SALECHECK_UPLOAD_TIMEOUT_SECS",
            DEFAULT_UPLOAD_TIMEOUT_SECS,
        );

        Ok(Self {
            db_path,
            chunk_size,
            upload_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn positive_or_default<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + PartialOrd + Default + std::fmt::Display + Copy,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().parse::<T>() {
        Ok(value) if value > T::default() => value,
        _ => {
            log::warn!("ignoring {key}={raw}: expected a positive integer, using {default}");
            default
        }
    }
}

fn default_db_path() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("com", "salecheck", "salecheck")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    let data_dir = proj_dirs.data_dir();
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
    Ok(data_dir.join("salecheck.db"))
}
