//! Item catalog: the collection document on disk, and how to rebuild it from
//! the community skins dump.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::{Catalog, Item, Rarity};
use crate::util::version::user_agent;

/// Weapon categories that take part in trade-ups.
const TRADEABLE_CATEGORIES: [&str; 4] = [
    "sfui_invpanel_filter_rifle",
    "sfui_invpanel_filter_pistol",
    "sfui_invpanel_filter_smg",
    "sfui_invpanel_filter_heavy",
];

/// Collections with fewer items than this cannot produce a useful trade-up.
const MIN_COLLECTION_SIZE: usize = 2;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog file not found: {0}")]
    Missing(PathBuf),
    #[error("failed to read catalog: {0}")]
    Read(#[source] io::Error),
    #[error("invalid catalog document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to write catalog: {0}")]
    Write(#[source] io::Error),
    #[error("http request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("source contained no tradeable items")]
    Empty,
}

/// Load the catalog document. Any failure here aborts the run.
pub fn load_catalog(path: &Path) -> Result<Catalog, CatalogError> {
    if !path.exists() {
        return Err(CatalogError::Missing(path.to_path_buf()));
    }
    let content = fs::read_to_string(path).map_err(CatalogError::Read)?;
    let catalog: Catalog = serde_json::from_str(&content)?;
    info!(
        collections = catalog.collection_count(),
        items = catalog.item_count(),
        path = %path.display(),
        "catalog loaded"
    );
    Ok(catalog)
}

pub fn save_catalog(path: &Path, catalog: &Catalog) -> Result<(), CatalogError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(CatalogError::Write)?;
    }
    let content = serde_json::to_string_pretty(catalog)?;
    fs::write(path, content).map_err(CatalogError::Write)?;
    info!(
        collections = catalog.collection_count(),
        items = catalog.item_count(),
        path = %path.display(),
        "catalog saved"
    );
    Ok(())
}

/// Download the skins dump and turn it into a catalog.
pub async fn fetch_catalog(source_url: &str) -> Result<Catalog, CatalogError> {
    info!(url = source_url, "downloading skins dump");
    let http = Client::builder().user_agent(user_agent()).build()?;
    let skins: Vec<SkinDto> = http
        .get(source_url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    info!(entries = skins.len(), "skins dump downloaded");

    let catalog = build_catalog(skins);
    if catalog.item_count() == 0 {
        return Err(CatalogError::Empty);
    }
    Ok(catalog)
}

#[derive(Debug, Deserialize)]
pub struct SkinDto {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    category: Option<IdDto>,
    #[serde(default)]
    weapon: Option<IdDto>,
    #[serde(default)]
    min_float: Option<f64>,
    #[serde(default)]
    max_float: Option<f64>,
    #[serde(default)]
    rarity: Option<NamedDto>,
    #[serde(default)]
    collections: Vec<NamedDto>,
}

#[derive(Debug, Default, Deserialize)]
struct IdDto {
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NamedDto {
    #[serde(default)]
    name: Option<String>,
}

impl SkinDto {
    /// Knives, gloves and agents never enter a trade-up.
    fn is_tradeable_weapon(&self) -> bool {
        let category = self
            .category
            .as_ref()
            .and_then(|c| c.id.as_deref())
            .unwrap_or_default();
        if category.is_empty() || TRADEABLE_CATEGORIES.contains(&category) {
            return true;
        }

        let weapon = self
            .weapon
            .as_ref()
            .and_then(|w| w.id.as_deref())
            .unwrap_or_default();
        !weapon.is_empty() && !weapon.contains("knife") && !weapon.contains("glove")
    }

    fn into_entry(self) -> Option<(String, Item)> {
        if !self.is_tradeable_weapon() {
            return None;
        }
        let name = self.name?;
        let (min_float, max_float) = (self.min_float?, self.max_float?);
        // Contraband and the glove/knife grades have no trade-up slot.
        let rarity = self.rarity.and_then(|r| r.name).and_then(|r| Rarity::from_label(&r))?;
        let collection = self.collections.into_iter().next().and_then(|c| c.name)?;

        Some((collection, Item::new(name, rarity, min_float, max_float)))
    }
}

pub fn build_catalog(skins: Vec<SkinDto>) -> Catalog {
    let total = skins.len();
    let mut catalog = Catalog::new();
    let mut kept = 0_usize;

    for (collection, item) in skins.into_iter().filter_map(SkinDto::into_entry) {
        catalog.insert(collection, item);
        kept += 1;
    }
    catalog.retain_min_size(MIN_COLLECTION_SIZE);

    debug!(total, kept, collections = catalog.collection_count(), "catalog built");
    catalog
}
