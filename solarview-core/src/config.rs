//! Startup configuration.
//!
//! Loaded once from a TOML file and passed by value into the constructors
//! that need it. String values may carry surrounding quotes, which are
//! stripped.

use crate::data::cache::YearCache;
use crate::data::pattern::{FilePattern, PatternError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Shortest wildcard run that can hold a four-digit year.
const MIN_WILDCARD_WIDTH: usize = 4;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl From<PatternError> for ConfigError {
    fn from(e: PatternError) -> Self {
        ConfigError::Invalid(e.to_string())
    }
}

/// Portal account.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Where and how to reach the portal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalSettings {
    pub base_url: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
}

impl Default for PortalSettings {
    fn default() -> Self {
        Self {
            base_url: "https://server.growatt.com/".into(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub dir: PathBuf,
    /// File-name template; one `?` run holds the year.
    pub pattern: String,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./"),
            pattern: "solarviewdata_????.json.br".into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// TrueType font used for axis labels, legend and title. Without it the
    /// image is written without text.
    pub font_path: Option<PathBuf>,
}

/// The complete configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolarviewConfig {
    pub account: Credentials,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub portal: PortalSettings,
    #[serde(default)]
    pub render: RenderSettings,
}

impl SolarviewConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let mut config: SolarviewConfig = toml::from_str(content)?;
        config.strip_quotes();
        config.validate()?;
        Ok(config)
    }

    fn strip_quotes(&mut self) {
        strip_in_place(&mut self.account.username);
        strip_in_place(&mut self.account.password);
        strip_in_place(&mut self.cache.pattern);
        strip_in_place(&mut self.portal.base_url);
        if let Some(dir) = self.cache.dir.to_str() {
            let stripped = strip_value(dir);
            if stripped.len() != dir.len() {
                self.cache.dir = PathBuf::from(stripped);
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.account.username.trim().is_empty() {
            return Err(ConfigError::Invalid("account.username is empty".into()));
        }
        if self.portal.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("portal.base_url is empty".into()));
        }
        if self.portal.timeout_secs == 0 {
            return Err(ConfigError::Invalid("portal.timeout_secs must be positive".into()));
        }
        let pattern = self.file_pattern()?;
        if pattern.width() < MIN_WILDCARD_WIDTH {
            return Err(ConfigError::Invalid(format!(
                "cache.pattern '{pattern}' needs at least {MIN_WILDCARD_WIDTH} '?' characters"
            )));
        }
        Ok(())
    }

    pub fn file_pattern(&self) -> Result<FilePattern, ConfigError> {
        Ok(FilePattern::parse(&self.cache.pattern)?)
    }

    /// The cache described by the `[cache]` section.
    pub fn year_cache(&self) -> Result<YearCache, ConfigError> {
        Ok(YearCache::new(self.cache.dir.clone(), self.file_pattern()?))
    }
}

fn strip_value(value: &str) -> &str {
    value.trim_matches(|c| c == '"' || c == '\'')
}

fn strip_in_place(value: &mut String) {
    let stripped = strip_value(value);
    if stripped.len() != value.len() {
        *value = stripped.to_string();
    }
}
