//! Scored trade-ups and their ranking.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use super::entities::{Rarity, WearTier};

/// Composition of the ten input slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum TradeUpMode {
    /// Ten copies of the main item.
    Pure,
    /// Three main copies, seven filler.
    ThreeSeven,
    /// One main copy, nine filler.
    OneNine,
}

impl TradeUpMode {
    pub const MIXED: [TradeUpMode; 2] = [TradeUpMode::ThreeSeven, TradeUpMode::OneNine];

    pub fn main_count(self) -> u8 {
        match self {
            TradeUpMode::Pure => 10,
            TradeUpMode::ThreeSeven => 3,
            TradeUpMode::OneNine => 1,
        }
    }

    pub fn filler_count(self) -> u8 {
        10 - self.main_count()
    }

    pub fn label(self) -> &'static str {
        match self {
            TradeUpMode::Pure => "10x",
            TradeUpMode::ThreeSeven => "3x+7x",
            TradeUpMode::OneNine => "1x+9x",
        }
    }
}

impl fmt::Display for TradeUpMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Whether an outcome comes from the main item's collection or the filler's.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum OutcomeSource {
    Main,
    Filler,
}

impl OutcomeSource {
    pub fn tag(self) -> &'static str {
        match self {
            OutcomeSource::Main => "MAIN",
            OutcomeSource::Filler => "FILLER",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OutcomeDetail {
    pub source: OutcomeSource,
    pub item_name: String,
    pub wear: WearTier,
    /// Emulated output float at the safe ceiling.
    pub float: f64,
    pub probability: f64,
    /// Sale price after the marketplace fee.
    pub net_value: f64,
}

impl OutcomeDetail {
    /// True when this single outcome is worth more than the whole trade-up cost.
    pub fn covers(&self, cost: f64) -> bool {
        self.net_value > cost
    }
}

/// Filler side of a mixed trade-up.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FillerPurchase {
    pub item_name: String,
    pub collection: String,
    pub wear: WearTier,
    pub price: f64,
    pub count: u8,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Candidate {
    pub mode: TradeUpMode,
    pub collection: String,
    pub rarity: Rarity,

    // Main input
    pub main_item: String,
    pub wear: WearTier,
    pub main_price: f64,
    /// Highest main float verified safe; buy strictly at or below it.
    pub max_safe_float: f64,
    /// Gap between `max_safe_float` and the lowest float the exterior allows.
    pub buffer: f64,

    pub filler: Option<FillerPurchase>,

    // Economics
    pub cost: f64,
    pub expected_value: f64,
    pub roi: f64,

    pub outcomes: Vec<OutcomeDetail>,
}

impl Candidate {
    pub fn key(&self) -> (String, TradeUpMode) {
        (self.main_item.clone(), self.mode)
    }

    pub fn main_count(&self) -> u8 {
        self.mode.main_count()
    }

    pub fn expected_profit(&self) -> f64 {
        self.expected_value - self.cost
    }

    /// Share of outcomes (by probability) that alone repay the cost.
    pub fn win_probability(&self) -> f64 {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.covers(self.cost))
            .map(|outcome| outcome.probability)
            .sum()
    }
}

/// Return on investment in percent.
pub fn roi_percent(cost: f64, expected_value: f64) -> f64 {
    (expected_value - cost) / cost * 100.0
}

/// Best candidate per (main item, mode) seen during one scan.
#[derive(Clone, Debug, Default)]
pub struct ResultSet {
    best: HashMap<(String, TradeUpMode), Candidate>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `candidate` if its key is new or it beats the stored ROI strictly.
    /// Returns whether it was stored.
    pub fn offer(&mut self, candidate: Candidate) -> bool {
        let key = candidate.key();
        match self.best.get(&key) {
            Some(current) if candidate.roi <= current.roi => false,
            _ => {
                self.best.insert(key, candidate);
                true
            }
        }
    }

    /// Folds another result set in with the same keep-the-best rule.
    pub fn merge(&mut self, other: ResultSet) {
        for candidate in other.best.into_values() {
            self.offer(candidate);
        }
    }

    pub fn get(&self, main_item: &str, mode: TradeUpMode) -> Option<&Candidate> {
        self.best.get(&(main_item.to_string(), mode))
    }

    pub fn len(&self) -> usize {
        self.best.len()
    }

    pub fn is_empty(&self) -> bool {
        self.best.is_empty()
    }

    /// Candidates ordered by descending ROI.
    pub fn into_ranked(self) -> Vec<Candidate> {
        let mut ranked: Vec<Candidate> = self.best.into_values().collect();
        sort_candidates(&mut ranked, CandidateSort::Roi, true);
        ranked
    }
}

/// Sorting options for scan output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CandidateSort {
    #[default]
    Roi,
    ExpectedProfit,
    Cost,
    SafetyBuffer,
}

/// Sort candidates by the given criteria. Ties fall back to item name, then mode.
pub fn sort_candidates(candidates: &mut [Candidate], sort: CandidateSort, descending: bool) {
    candidates.sort_by(|a, b| {
        let ord = match sort {
            CandidateSort::Roi => a.roi.partial_cmp(&b.roi),
            CandidateSort::ExpectedProfit => a.expected_profit().partial_cmp(&b.expected_profit()),
            CandidateSort::Cost => a.cost.partial_cmp(&b.cost),
            CandidateSort::SafetyBuffer => a.buffer.partial_cmp(&b.buffer),
        }
        .unwrap_or(Ordering::Equal);
        let ord = if descending { ord.reverse() } else { ord };
        ord.then_with(|| a.main_item.cmp(&b.main_item))
            .then_with(|| a.mode.cmp(&b.mode))
    });
}

/// Filter options applied to scan output before reporting.
#[derive(Clone, Debug, Default)]
pub struct CandidateFilter {
    pub min_roi: Option<f64>,
    pub max_cost: Option<f64>,
    pub min_buffer: Option<f64>,
    pub rarity: Option<Rarity>,
    pub mode: Option<TradeUpMode>,
    pub collection: Option<String>,
}

impl CandidateFilter {
    pub fn matches(&self, candidate: &Candidate) -> bool {
        if let Some(min) = self.min_roi {
            if candidate.roi < min { return false; }
        }
        if let Some(max) = self.max_cost {
            if candidate.cost > max { return false; }
        }
        if let Some(min) = self.min_buffer {
            if candidate.buffer < min { return false; }
        }
        if let Some(rarity) = self.rarity {
            if candidate.rarity != rarity { return false; }
        }
        if let Some(mode) = self.mode {
            if candidate.mode != mode { return false; }
        }
        if let Some(ref collection) = self.collection {
            if &candidate.collection != collection { return false; }
        }

        true
    }

    pub fn apply(&self, candidates: Vec<Candidate>) -> Vec<Candidate> {
        candidates.into_iter().filter(|c| self.matches(c)).collect()
    }
}
