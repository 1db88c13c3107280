//! Thin asynchronous client for the marketplace item listing endpoint.
//!
//! - Fetches the lowest listing price of every item in one request.
//! - Serves a disk cache while it is younger than the configured TTL.
//! - A failed fetch is fatal: a scan never runs on partial prices.

use std::{
    collections::HashMap,
    path::PathBuf,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use reqwest::{header, Client, StatusCode, Url};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::PriceMap;
use crate::infra::cache::{
    default_price_cache_path, load_fresh_price_cache, save_price_cache, PriceCache,
};
use crate::util::config::PriceSourceConfig;
use crate::util::version::user_agent;

#[derive(Debug, Error)]
pub enum PriceClientError {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("http request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("rate limited by the marketplace; wait a few minutes and retry")]
    RateLimited,
    #[error("marketplace returned status {0}")]
    Status(StatusCode),
    #[error("marketplace returned no priced listings")]
    Empty,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CacheStatus {
    Fresh,
    Cached,
}

#[derive(Clone, Debug)]
pub struct CachedPayload<T> {
    pub data: T,
    pub fetched_at: SystemTime,
    pub status: CacheStatus,
}

impl<T> CachedPayload<T> {
    fn new(data: T, fetched_at: SystemTime, status: CacheStatus) -> Self {
        Self {
            data,
            fetched_at,
            status,
        }
    }

    /// Time since the data left the marketplace.
    pub fn age(&self) -> Duration {
        SystemTime::now()
            .duration_since(self.fetched_at)
            .unwrap_or_default()
    }
}

#[derive(Clone)]
pub struct PriceClient {
    http: Client,
    items_url: Url,
    currency: String,
    conversion_factor: f64,
    cache_path: PathBuf,
    ttl: Duration,
}

impl PriceClient {
    pub fn new(config: &PriceSourceConfig) -> Result<Self, PriceClientError> {
        let mut items_url = Url::parse(&config.url)?;
        items_url
            .query_pairs_mut()
            .append_pair("app_id", &config.app_id.to_string())
            .append_pair("currency", &config.currency);
        let http = Client::builder().user_agent(user_agent()).build()?;

        Ok(Self {
            http,
            items_url,
            currency: config.currency.clone(),
            conversion_factor: config.conversion_factor,
            cache_path: config
                .cache_path
                .clone()
                .unwrap_or_else(default_price_cache_path),
            ttl: Duration::from_secs(config.cache_ttl_secs),
        })
    }

    pub fn with_cache_path(mut self, path: PathBuf) -> Self {
        self.cache_path = path;
        self
    }

    /// Current prices, from the disk cache when fresh, else from the marketplace.
    pub async fn get_prices(&self) -> Result<CachedPayload<PriceMap>, PriceClientError> {
        if let Some(cache) = load_fresh_price_cache(&self.cache_path, self.ttl) {
            info!(
                entries = cache.entries.len(),
                age = %cache.age_string(),
                "serving cached prices"
            );
            return Ok(self.payload(&cache, CacheStatus::Cached));
        }

        self.refresh().await
    }

    /// Force a fetch from the marketplace and rewrite the cache.
    pub async fn refresh(&self) -> Result<CachedPayload<PriceMap>, PriceClientError> {
        info!(url = %self.items_url, "fetching marketplace prices");
        let entries = self.fetch_listings().await?;
        if entries.is_empty() {
            return Err(PriceClientError::Empty);
        }

        let cache = PriceCache::new(self.currency.clone(), entries);
        if let Err(e) = save_price_cache(&self.cache_path, &cache) {
            warn!(error = %e, "failed to save price cache");
        }

        info!(entries = cache.entries.len(), "prices loaded");
        Ok(self.payload(&cache, CacheStatus::Fresh))
    }

    fn payload(&self, cache: &PriceCache, status: CacheStatus) -> CachedPayload<PriceMap> {
        let fetched_at = UNIX_EPOCH + Duration::from_secs(cache.cached_at);
        CachedPayload::new(cache.to_price_map(self.conversion_factor), fetched_at, status)
    }

    async fn fetch_listings(&self) -> Result<HashMap<String, f64>, PriceClientError> {
        let response = self
            .http
            .get(self.items_url.clone())
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => return Err(PriceClientError::RateLimited),
            status if !status.is_success() => return Err(PriceClientError::Status(status)),
            _ => {}
        }

        let listings: Vec<ListingDto> = response.json().await?;
        Ok(collect_listings(listings))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListingDto {
    #[serde(default)]
    market_hash_name: Option<String>,
    #[serde(default, deserialize_with = "price_from_json")]
    min_price: Option<f64>,
}

/// Listing name → lowest price, skipping unnamed or unpriced listings.
pub(crate) fn collect_listings(listings: Vec<ListingDto>) -> HashMap<String, f64> {
    listings
        .into_iter()
        .filter_map(|dto| {
            let name = dto.market_hash_name?;
            let price = dto.min_price.filter(|p| p.is_finite() && *p > 0.0)?;
            Some((name, price))
        })
        .collect()
}

fn price_from_json<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct PriceOrNull;

    impl<'de> serde::de::Visitor<'de> for PriceOrNull {
        type Value = Option<f64>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a price as number, numeric string or null")
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value as f64))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value as f64))
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.trim().parse::<f64>().ok())
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(None)
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(PriceOrNull)
}
