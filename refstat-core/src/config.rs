//! Settings for referrer tracking.
//!
//! Loaded from `~/.config/refstat/config.toml` unless a path is given. A
//! missing file yields the defaults; a malformed one is an error.

use crate::error::Result;
use crate::model::ReferrerDefinition;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_CONFIG_DIR: &str = "~/.config/refstat";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const DATABASE_FILE_NAME: &str = "refstat.db";

/// Starter file written by `refstat init`
pub const DEFAULT_CONFIG: &str = r#"# refstat configuration

# Log visits from every referrer, classifying the built-in catalog of
# search engines and backlinks. When false, only the hosts below are logged.
track_all_referrers = true

# database = "~/.config/refstat/refstat.db"

# Hosts defined here replace built-in entries with the same host.
# [[hosts]]
# host = "news.ycombinator.com"
# type = "backlink"
# name = "Hacker News"
# primary_url = "https://news.ycombinator.com/"
"#;

const DATABASE_PLACEHOLDER: &str = "# database = \"~/.config/refstat/refstat.db\"";

/// Starter config pointing at `database`. The default location stays
/// commented out so the file keeps following the default.
pub fn starter_config(database: &Path) -> String {
    if database == Settings::default_dir().join(DATABASE_FILE_NAME) {
        return DEFAULT_CONFIG.to_string();
    }

    let value = toml::Value::String(database.to_string_lossy().into_owned());
    DEFAULT_CONFIG.replace(DATABASE_PLACEHOLDER, &format!("database = {}", value))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub track_all_referrers: bool,
    pub database: Option<String>,
    pub hosts: Vec<ReferrerDefinition>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            track_all_referrers: true,
            database: None,
            hosts: Vec::new(),
        }
    }
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

impl Settings {
    pub fn default_dir() -> PathBuf {
        expand(DEFAULT_CONFIG_DIR)
    }

    pub fn default_path() -> PathBuf {
        Self::default_dir().join(CONFIG_FILE_NAME)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let settings = Self::from_toml(&contents)?;
        debug!(
            "Loaded config from {} ({} host overrides)",
            path.display(),
            settings.hosts.len()
        );
        Ok(settings)
    }

    /// Configured database location, or the default one, with `~` expanded.
    pub fn database_path(&self) -> PathBuf {
        match self.database {
            Some(ref path) => expand(path),
            None => Self::default_dir().join(DATABASE_FILE_NAME),
        }
    }
}
