use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::columns::ColumnMap;
use crate::source::DataSource;

pub const CONFIG_FILE: &str = "dashboard_config.json";

const DEFAULT_DATA_FILE: &str = "patient_satisfaction_data.csv";
const DEFAULT_REMOTE_TTL_SECS: u64 = 300;
const DEFAULT_ADMIN_PASSWORD: &str = "admin1234";

/// Runtime configuration, read from `dashboard_config.json` when present.
///
/// Every field has a default so an empty `{}` (or no file at all) yields a
/// working local-file setup.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Raw-input CSV consumed by the primary ingestion path; also the
    /// fallback when a remote fetch fails and the admin-import target.
    pub data_file: String,
    /// Remote CSV export endpoint. When set, loading goes through it.
    pub remote_csv_url: Option<String>,
    pub remote_ttl_secs: u64,
    pub admin_password: String,
    /// Extra header renaming pairs layered over the built-in table, for
    /// newer schema versions of the same survey.
    pub column_overrides: HashMap<String, String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_file: DEFAULT_DATA_FILE.to_string(),
            remote_csv_url: None,
            remote_ttl_secs: DEFAULT_REMOTE_TTL_SECS,
            admin_password: DEFAULT_ADMIN_PASSWORD.to_string(),
            column_overrides: HashMap::new(),
        }
    }
}

impl AppConfig {
    /// A missing config file is not an error; a malformed one is.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn source(&self) -> DataSource {
        match &self.remote_csv_url {
            Some(url) => DataSource::Remote {
                url: url.clone(),
                ttl: Duration::from_secs(self.remote_ttl_secs),
                fallback: Some(PathBuf::from(&self.data_file)),
            },
            None => DataSource::Local {
                path: PathBuf::from(&self.data_file),
            },
        }
    }

    /// Built-in header table plus any configured overrides.
    pub fn column_map(&self) -> ColumnMap {
        let mut map = ColumnMap::default();
        for (source, canonical) in &self.column_overrides {
            map.insert(source, canonical);
        }
        map
    }
}
