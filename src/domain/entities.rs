use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Item quality grade. A trade-up consumes ten items of one grade and yields one of the next.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rarity {
    #[serde(rename = "Consumer Grade")]
    Consumer,
    #[serde(rename = "Industrial Grade")]
    Industrial,
    #[serde(rename = "Mil-Spec Grade")]
    MilSpec,
    #[serde(rename = "Restricted")]
    Restricted,
    #[serde(rename = "Classified")]
    Classified,
    #[serde(rename = "Covert")]
    Covert,
}

impl Rarity {
    pub const ALL: [Rarity; 6] = [
        Rarity::Consumer,
        Rarity::Industrial,
        Rarity::MilSpec,
        Rarity::Restricted,
        Rarity::Classified,
        Rarity::Covert,
    ];

    /// The grade a trade-up of this grade produces. `None` for the top grade.
    pub fn next(self) -> Option<Rarity> {
        match self {
            Rarity::Consumer => Some(Rarity::Industrial),
            Rarity::Industrial => Some(Rarity::MilSpec),
            Rarity::MilSpec => Some(Rarity::Restricted),
            Rarity::Restricted => Some(Rarity::Classified),
            Rarity::Classified => Some(Rarity::Covert),
            Rarity::Covert => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Rarity::Consumer => "Consumer Grade",
            Rarity::Industrial => "Industrial Grade",
            Rarity::MilSpec => "Mil-Spec Grade",
            Rarity::Restricted => "Restricted",
            Rarity::Classified => "Classified",
            Rarity::Covert => "Covert",
        }
    }

    pub fn from_label(label: &str) -> Option<Rarity> {
        Rarity::ALL.into_iter().find(|rarity| rarity.label() == label)
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Exterior band of an item, ordered from best (Factory New) to worst.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WearTier {
    FactoryNew,
    MinimalWear,
    FieldTested,
    WellWorn,
    BattleScarred,
}

/// Half-open `[lower, upper)` float bounds per tier, in tier order.
const WEAR_BOUNDS: [(WearTier, f64, f64); 5] = [
    (WearTier::FactoryNew, 0.00, 0.07),
    (WearTier::MinimalWear, 0.07, 0.15),
    (WearTier::FieldTested, 0.15, 0.38),
    (WearTier::WellWorn, 0.38, 0.45),
    (WearTier::BattleScarred, 0.45, 1.00),
];

impl WearTier {
    pub const ALL: [WearTier; 5] = [
        WearTier::FactoryNew,
        WearTier::MinimalWear,
        WearTier::FieldTested,
        WearTier::WellWorn,
        WearTier::BattleScarred,
    ];

    /// Tiers a main input may be bought in.
    pub const PURCHASABLE: [WearTier; 3] = [
        WearTier::FactoryNew,
        WearTier::MinimalWear,
        WearTier::FieldTested,
    ];

    /// Tiers indexed as filler candidates.
    pub const FILLER: [WearTier; 2] = [WearTier::FactoryNew, WearTier::MinimalWear];

    /// Exclusive upper bound of Factory New, the target of every trade-up here.
    pub const TOP_TIER_UPPER: f64 = 0.07;

    /// Tier containing `float`. Values past the last bound fall into Battle-Scarred.
    pub fn from_float(float: f64) -> WearTier {
        WEAR_BOUNDS
            .iter()
            .find(|(_, _, upper)| float < *upper)
            .map(|(tier, _, _)| *tier)
            .unwrap_or(WearTier::BattleScarred)
    }

    pub fn bounds(self) -> (f64, f64) {
        let (_, lower, upper) = WEAR_BOUNDS[self as usize];
        (lower, upper)
    }

    pub fn lower_bound(self) -> f64 {
        self.bounds().0
    }

    pub fn upper_bound(self) -> f64 {
        self.bounds().1
    }

    /// Marketplace exterior label, e.g. `Factory New`.
    pub fn label(self) -> &'static str {
        match self {
            WearTier::FactoryNew => "Factory New",
            WearTier::MinimalWear => "Minimal Wear",
            WearTier::FieldTested => "Field-Tested",
            WearTier::WellWorn => "Well-Worn",
            WearTier::BattleScarred => "Battle-Scarred",
        }
    }
}

impl fmt::Display for WearTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A skin with its float caps, as listed in the catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub rarity: Rarity,
    #[serde(rename = "min")]
    pub min_float: f64,
    #[serde(rename = "max")]
    pub max_float: f64,
}

impl Item {
    pub fn new(name: impl Into<String>, rarity: Rarity, min_float: f64, max_float: f64) -> Self {
        Self {
            name: name.into(),
            rarity,
            min_float,
            max_float,
        }
    }

    pub fn float_range(&self) -> f64 {
        self.max_float - self.min_float
    }

    /// True when a float of this item can land in Factory New at all.
    pub fn can_be_factory_new(&self) -> bool {
        self.min_float < WearTier::TOP_TIER_UPPER
    }

    /// Marketplace listing name for this item in the given exterior.
    pub fn listing_name(&self, wear: WearTier) -> String {
        listing_name(&self.name, wear)
    }
}

pub fn listing_name(item_name: &str, wear: WearTier) -> String {
    format!("{item_name} ({})", wear.label())
}

/// Collection name → items. Ordered so every scan visits collections identically.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    collections: BTreeMap<String, Vec<Item>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, collection: impl Into<String>, item: Item) {
        self.collections
            .entry(collection.into())
            .or_default()
            .push(item);
    }

    pub fn collections(&self) -> impl Iterator<Item = (&str, &[Item])> {
        self.collections
            .iter()
            .map(|(name, items)| (name.as_str(), items.as_slice()))
    }

    pub fn collection(&self, name: &str) -> Option<&[Item]> {
        self.collections.get(name).map(Vec::as_slice)
    }

    pub fn collection_count(&self) -> usize {
        self.collections.len()
    }

    pub fn item_count(&self) -> usize {
        self.collections.values().map(Vec::len).sum()
    }

    /// Drops collections holding fewer than `min_items` items.
    pub fn retain_min_size(&mut self, min_items: usize) {
        self.collections.retain(|_, items| items.len() >= min_items);
    }
}

impl FromIterator<(String, Vec<Item>)> for Catalog {
    fn from_iter<I: IntoIterator<Item = (String, Vec<Item>)>>(iter: I) -> Self {
        Self {
            collections: iter.into_iter().collect(),
        }
    }
}

/// Items of one collection grouped by grade.
pub fn group_by_rarity(items: &[Item]) -> BTreeMap<Rarity, Vec<&Item>> {
    let mut grouped: BTreeMap<Rarity, Vec<&Item>> = BTreeMap::new();
    for item in items {
        grouped.entry(item.rarity).or_default().push(item);
    }
    grouped
}

/// Listing name → price, already converted to the scan currency.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceMap {
    prices: HashMap<String, f64>,
}

impl PriceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a price. Non-positive or non-finite prices are ignored.
    pub fn insert(&mut self, listing: impl Into<String>, price: f64) {
        if price.is_finite() && price > 0.0 {
            self.prices.insert(listing.into(), price);
        }
    }

    pub fn get(&self, listing: &str) -> Option<f64> {
        self.prices.get(listing).copied()
    }

    pub fn price(&self, item_name: &str, wear: WearTier) -> Option<f64> {
        self.get(&listing_name(item_name, wear))
    }

    /// Sale price of a trade-up outcome: its own exterior, else the Minimal Wear
    /// listing, else zero.
    pub fn outcome_price(&self, item_name: &str, wear: WearTier) -> f64 {
        self.price(item_name, wear)
            .or_else(|| self.price(item_name, WearTier::MinimalWear))
            .unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

impl FromIterator<(String, f64)> for PriceMap {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        let mut map = PriceMap::new();
        for (listing, price) in iter {
            map.insert(listing, price);
        }
        map
    }
}

/// Knobs of one scan, fixed for the whole run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    /// Upper bound on the total input cost of one trade-up.
    pub max_cost: f64,
    /// Minimum return on investment, in percent. Candidates must exceed it.
    pub min_roi: f64,
    /// Fraction of the sale price kept by the marketplace.
    pub sell_fee: f64,
    /// Minimum distance between the safe float ceiling and the tier's effective floor.
    pub float_buffer: f64,
    /// Also try 3+7 and 1+9 compositions with the cheapest filler.
    pub mixed_mode: bool,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            max_cost: 25.0,
            min_roi: 10.0,
            sell_fee: 0.15,
            float_buffer: 0.015,
            mixed_mode: true,
        }
    }
}

impl ScanSettings {
    /// Share of an outcome's listing price the trader actually receives.
    pub fn net_factor(&self) -> f64 {
        1.0 - self.sell_fee
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rarity_successor_chain_ends_at_covert() {
        assert_eq!(Rarity::MilSpec.next(), Some(Rarity::Restricted));
        assert_eq!(Rarity::Classified.next(), Some(Rarity::Covert));
        assert_eq!(Rarity::Covert.next(), None);
    }

    #[test]
    fn rarity_labels_round_trip() {
        for rarity in Rarity::ALL {
            assert_eq!(Rarity::from_label(rarity.label()), Some(rarity));
        }
        assert_eq!(Rarity::from_label("Contraband"), None);
    }

    #[test]
    fn wear_tier_lookup_is_lower_inclusive() {
        assert_eq!(WearTier::from_float(0.0), WearTier::FactoryNew);
        assert_eq!(WearTier::from_float(0.0699), WearTier::FactoryNew);
        assert_eq!(WearTier::from_float(0.07), WearTier::MinimalWear);
        assert_eq!(WearTier::from_float(0.15), WearTier::FieldTested);
        assert_eq!(WearTier::from_float(0.3799), WearTier::FieldTested);
        assert_eq!(WearTier::from_float(0.38), WearTier::WellWorn);
        assert_eq!(WearTier::from_float(0.45), WearTier::BattleScarred);
        assert_eq!(WearTier::from_float(1.0), WearTier::BattleScarred);
    }

    #[test]
    fn bounds_follow_tier_order() {
        assert_eq!(WearTier::MinimalWear.bounds(), (0.07, 0.15));
        assert_eq!(WearTier::BattleScarred.upper_bound(), 1.0);
        for pair in WearTier::ALL.windows(2) {
            assert_eq!(pair[0].upper_bound(), pair[1].lower_bound());
        }
    }

    #[test]
    fn outcome_price_falls_back_to_minimal_wear_then_zero() {
        let mut prices = PriceMap::new();
        prices.insert("AK-47 | Slate (Minimal Wear)", 3.5);
        prices.insert("AK-47 | Slate (Factory New)", 7.0);
        prices.insert("M4A4 | Tooth Fairy (Minimal Wear)", 2.0);

        assert_eq!(prices.outcome_price("AK-47 | Slate", WearTier::FactoryNew), 7.0);
        assert_eq!(prices.outcome_price("M4A4 | Tooth Fairy", WearTier::FactoryNew), 2.0);
        assert_eq!(prices.outcome_price("P250 | Sand Dune", WearTier::FactoryNew), 0.0);
    }

    #[test]
    fn price_map_ignores_non_positive_prices() {
        let prices: PriceMap = vec![
            ("A (Factory New)".to_string(), 0.0),
            ("B (Factory New)".to_string(), -1.0),
            ("C (Factory New)".to_string(), 1.25),
        ]
        .into_iter()
        .collect();
        assert_eq!(prices.len(), 1);
        assert_eq!(prices.price("C", WearTier::FactoryNew), Some(1.25));
    }

    #[test]
    fn catalog_parses_collection_document() {
        let json = r#"{
            "The Alpha Collection": [
                {"name": "Tec-9 | Sandstorm", "rarity": "Mil-Spec Grade", "min": 0.1, "max": 0.7},
                {"name": "AWP | Atheris", "rarity": "Restricted", "min": 0.0, "max": 1.0}
            ]
        }"#;
        let catalog: Catalog = serde_json::from_str(json).unwrap();
        let items = catalog.collection("The Alpha Collection").unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].rarity, Rarity::MilSpec);
        assert_eq!(items[1].listing_name(WearTier::FieldTested), "AWP | Atheris (Field-Tested)");
    }
}
