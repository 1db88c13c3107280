//! Application configuration, read once at startup from an optional TOML file.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::domain::ScanSettings;
use crate::util::logging::LoggingConfig;

const APP_QUALIFIER: &str = "com";
const APP_ORG: &str = "TradeUpScanner";
const APP_NAME: &str = "TradeUpScanner";
const CONFIG_FILENAME: &str = "config.toml";

pub const DEFAULT_SKINS_URL: &str =
    "https://raw.githubusercontent.com/ByMykel/CSGO-API/main/public/api/en/skins.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub scan: ScanSettings,
    pub prices: PriceSourceConfig,
    pub catalog: CatalogConfig,
    pub report: ReportConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct PriceSourceConfig {
    pub url: String,
    pub app_id: u32,
    pub currency: String,
    /// Multiplier from the quoted minimum listing price to the price actually paid.
    pub conversion_factor: f64,
    pub cache_ttl_secs: u64,
    /// Overrides the platform data directory.
    pub cache_path: Option<PathBuf>,
}

impl Default for PriceSourceConfig {
    fn default() -> Self {
        Self {
            url: "https://api.skinport.com/v1/items".into(),
            app_id: 730,
            currency: "EUR".into(),
            conversion_factor: 1.40,
            cache_ttl_secs: 3600,
            cache_path: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub path: PathBuf,
    pub source_url: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("database.json"),
            source_url: DEFAULT_SKINS_URL.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub path: PathBuf,
    /// Entries above this ROI get the hot marker.
    pub hot_roi: f64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("profitable_tradeups.txt"),
            hot_roi: 30.0,
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&content)?;
        debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// An explicit path must exist. Without one, `./config.toml` and then the
    /// platform config directory are tried, falling back to defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let candidates = [Some(PathBuf::from(CONFIG_FILENAME)), default_config_path()];
        match candidates.into_iter().flatten().find(|p| p.is_file()) {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let scan = &self.scan;
        if !(0.0..1.0).contains(&scan.sell_fee) {
            return Err(invalid("scan.sell_fee", "must be in [0, 1)"));
        }
        if scan.max_cost.is_nan() || scan.max_cost <= 0.0 {
            return Err(invalid("scan.max_cost", "must be positive"));
        }
        if scan.float_buffer.is_nan() || scan.float_buffer < 0.0 {
            return Err(invalid("scan.float_buffer", "must not be negative"));
        }
        if !scan.min_roi.is_finite() {
            return Err(invalid("scan.min_roi", "must be a finite number"));
        }
        let factor = self.prices.conversion_factor;
        if factor.is_nan() || factor <= 0.0 {
            return Err(invalid("prices.conversion_factor", "must be positive"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.to_string(),
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME)
        .map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
}
