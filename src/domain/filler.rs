//! Cheapest filler per (grade, exterior).
//!
//! A mixed trade-up pads the main item with copies of a cheap filler. The
//! filler's own next-grade items become extra possible outcomes, so each
//! entry keeps its outcome set alongside the price.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;

use super::entities::{Catalog, Item, PriceMap, Rarity, WearTier};
use super::float_math::trade_float;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FillerCandidate {
    pub item_name: String,
    pub collection: String,
    pub rarity: Rarity,
    pub wear: WearTier,
    pub price: f64,
    pub min_float: f64,
    pub max_float: f64,
    /// Next-grade items of the filler's collection.
    pub outcomes: Vec<Item>,
}

impl FillerCandidate {
    /// Float the filler is assumed to be bought at: a typical value for its
    /// exterior, raised to the lowest float the item can actually have there.
    pub fn assumed_float(&self) -> f64 {
        let anchor: f64 = match self.wear {
            WearTier::FactoryNew => 0.035,
            WearTier::MinimalWear => 0.10,
            _ => 0.20,
        };
        let floor = self.wear.lower_bound().max(self.min_float);
        anchor.max(floor)
    }

    pub fn assumed_trade_float(&self) -> f64 {
        trade_float(self.assumed_float(), self.min_float, self.max_float)
    }

    /// Ordering used to pick the index entry: cheaper first, then by item
    /// name and collection so equal prices resolve the same way every run.
    fn preference(&self, other: &FillerCandidate) -> Ordering {
        self.price
            .partial_cmp(&other.price)
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.item_name.cmp(&other.item_name))
            .then_with(|| self.collection.cmp(&other.collection))
    }
}

/// Built once per scan from the catalog and current prices; read-only afterwards.
#[derive(Clone, Debug, Default)]
pub struct FillerIndex {
    entries: HashMap<(Rarity, WearTier), FillerCandidate>,
}

impl FillerIndex {
    pub fn build(catalog: &Catalog, prices: &PriceMap) -> Self {
        let mut entries: HashMap<(Rarity, WearTier), FillerCandidate> = HashMap::new();

        for (collection, items) in catalog.collections() {
            for item in items {
                let Some(next) = item.rarity.next() else {
                    continue;
                };
                let outcomes: Vec<Item> = items
                    .iter()
                    .filter(|candidate| candidate.rarity == next)
                    .cloned()
                    .collect();
                if !outcomes.iter().any(Item::can_be_factory_new) {
                    continue;
                }

                for wear in WearTier::FILLER {
                    let Some(price) = prices.price(&item.name, wear) else {
                        continue;
                    };
                    let candidate = FillerCandidate {
                        item_name: item.name.clone(),
                        collection: collection.to_string(),
                        rarity: item.rarity,
                        wear,
                        price,
                        min_float: item.min_float,
                        max_float: item.max_float,
                        outcomes: outcomes.clone(),
                    };

                    let key = (item.rarity, wear);
                    let replace = entries
                        .get(&key)
                        .map(|current| candidate.preference(current) == Ordering::Less)
                        .unwrap_or(true);
                    if replace {
                        entries.insert(key, candidate);
                    }
                }
            }
        }

        tracing::debug!(entries = entries.len(), "filler index built");
        Self { entries }
    }

    pub fn get(&self, rarity: Rarity, wear: WearTier) -> Option<&FillerCandidate> {
        self.entries.get(&(rarity, wear))
    }

    /// Registered fillers for `rarity`, Factory New first.
    pub fn for_rarity(&self, rarity: Rarity) -> impl Iterator<Item = &FillerCandidate> {
        WearTier::FILLER
            .into_iter()
            .filter_map(move |wear| self.get(rarity, wear))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
