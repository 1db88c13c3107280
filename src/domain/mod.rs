//! Trade-up evaluation: float emulation, filler selection, feasibility and scoring.

pub mod candidate;
pub mod entities;
pub mod evaluation;
pub mod feasibility;
pub mod filler;
pub mod float_math;

pub use candidate::{
    roi_percent, sort_candidates, Candidate, CandidateFilter, CandidateSort, FillerPurchase,
    OutcomeDetail, OutcomeSource, ResultSet, TradeUpMode,
};
pub use entities::{listing_name, Catalog, Item, PriceMap, Rarity, ScanSettings, WearTier};
pub use evaluation::{scan, ScanReport, ScanRun, ScanStats};
pub use feasibility::{resolve, FeasibilityQuery, Infeasibility, SafeFloat};
pub use filler::{FillerCandidate, FillerIndex};
