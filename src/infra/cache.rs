//! Persistent on-disk caching for marketplace prices with TTL.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::PriceMap;

const PRICES_CACHE_FILENAME: &str = "prices_cache.json";
const CACHE_DIR_NAME: &str = "tradeup-scanner";

/// Default cache TTL: 1 hour. Listings move quickly, a stale map skews every ROI.
pub const PRICES_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("failed to write cache: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode cache: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Raw listing prices as returned by the marketplace, before conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceCache {
    /// Unix timestamp (seconds) when this cache was created.
    pub cached_at: u64,
    /// Currency the marketplace quoted in.
    pub currency: String,
    /// Listing name → lowest listing price.
    pub entries: HashMap<String, f64>,
}

impl PriceCache {
    /// Create a new cache with current timestamp.
    pub fn new(currency: String, entries: HashMap<String, f64>) -> Self {
        Self {
            cached_at: unix_now(),
            currency,
            entries,
        }
    }

    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.age() > ttl
    }

    /// Get cache age as Duration.
    pub fn age(&self) -> Duration {
        Duration::from_secs(unix_now().saturating_sub(self.cached_at))
    }

    /// Human-readable age string.
    pub fn age_string(&self) -> String {
        let secs = self.age().as_secs();
        if secs < 60 {
            format!("{secs}s")
        } else if secs < 3600 {
            format!("{}m", secs / 60)
        } else if secs < 86400 {
            format!("{}h", secs / 3600)
        } else {
            format!("{}d", secs / 86400)
        }
    }

    /// Prices multiplied by `conversion_factor`, ready for a scan.
    pub fn to_price_map(&self, conversion_factor: f64) -> PriceMap {
        self.entries
            .iter()
            .map(|(listing, price)| (listing.clone(), price * conversion_factor))
            .collect()
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Default cache file path (in the platform's local data directory).
pub fn default_price_cache_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CACHE_DIR_NAME)
        .join(PRICES_CACHE_FILENAME)
}

/// Load the price cache from disk, if it exists and parses.
pub fn load_price_cache(path: &Path) -> Option<PriceCache> {
    if !path.exists() {
        debug!(path = %path.display(), "no price cache found");
        return None;
    }

    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<PriceCache>(&content) {
            Ok(cache) => {
                debug!(
                    path = %path.display(),
                    entries = cache.entries.len(),
                    age = %cache.age_string(),
                    "loaded price cache"
                );
                Some(cache)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to parse price cache");
                None
            }
        },
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read price cache");
            None
        }
    }
}

/// Load the price cache only if it is younger than `ttl`.
pub fn load_fresh_price_cache(path: &Path, ttl: Duration) -> Option<PriceCache> {
    let cache = load_price_cache(path)?;
    if cache.is_expired(ttl) {
        info!(age = %cache.age_string(), "price cache expired");
        return None;
    }
    Some(cache)
}

/// Save the price cache to disk.
pub fn save_price_cache(path: &Path, cache: &PriceCache) -> Result<(), CacheError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string(cache)?; // compact, the listing set is large
    fs::write(path, content)?;
    info!(
        entries = cache.entries.len(),
        path = %path.display(),
        "saved price cache"
    );
    Ok(())
}
