use anyhow::{Context, Result};
use std::path::PathBuf;

pub(crate) const DB_PATH_VAR: &str = "FINTRACK_DB";
pub(crate) const LOG_VAR: &str = "FINTRACK_LOG";
pub(crate) const DEFAULT_LOG_FILTER: &str = "fintrack=warn";
const DB_FILE_NAME: &str = "fintrack.db";

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Config {
    pub(crate) db_path: PathBuf,
    pub(crate) log_filter: String,
}

impl Config {
    pub(crate) fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let db_path = match non_empty(DB_PATH_VAR) {
            Some(path) => PathBuf::from(path),
            None => default_db_path()?,
        };
        let log_filter = non_empty(LOG_VAR).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Ok(Self {
            db_path,
            log_filter,
        })
    }

    /// Create the directory that will hold the database file.
    pub(crate) fn ensure_data_dir(&self) -> Result<()> {
        if let Some(dir) = self.db_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create data directory: {}", dir.display()))?;
        }
        Ok(())
    }
}

fn default_db_path() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("com", "fintrack", "FinTrack")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    Ok(proj_dirs.data_dir().join(DB_FILE_NAME))
}
