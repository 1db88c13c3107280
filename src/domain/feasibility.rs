//! Maximum safe purchase float for the main input of a trade-up.
//!
//! The ceiling is first solved algebraically from the weighted-average wear
//! rule, then checked against the single-precision blend the client performs.
//! If the emulated blend pushes any outcome out of Factory New, the ceiling is
//! lowered in fixed steps until every outcome stays inside.

use std::fmt;

use super::entities::{Item, WearTier};
use super::filler::FillerCandidate;
use super::float_math::{average_trade_float, blend_output, real_float, trade_float};

/// Output float the algebraic solve aims for, just under the Factory New bound.
pub const TARGET_OUTPUT_FLOAT: f64 = 0.0699;
/// Attempts the rounding reconciliation makes before giving up.
pub const RECONCILE_ATTEMPTS: usize = 15;
/// Float decrement between reconciliation attempts.
pub const RECONCILE_STEP: f64 = 0.001;

/// One resolver question: can `main` bought in `wear` feed a trade-up whose
/// outcomes all come out Factory New?
#[derive(Clone, Copy, Debug)]
pub struct FeasibilityQuery<'a> {
    pub main: &'a Item,
    pub wear: WearTier,
    /// Next-grade items of the main item's collection.
    pub outcomes: &'a [Item],
    /// Copies of the main item among the ten inputs.
    pub main_count: u8,
    /// Item filling the remaining `10 - main_count` slots.
    pub filler: Option<&'a FillerCandidate>,
    /// Minimum gap between the safe ceiling and the tier's effective floor.
    pub min_buffer: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SafeFloat {
    /// Highest main-item float verified to keep every outcome Factory New.
    pub max_float: f64,
    /// Lowest float the main item can have in the requested exterior.
    pub floor: f64,
    /// `max_float - floor`.
    pub margin: f64,
    /// Emulated average trade float at `max_float`.
    pub avg_trade_float: f64,
    /// Trade float assumed for every filler copy.
    pub filler_trade_float: f64,
    /// Reconciliation steps taken below the algebraic ceiling.
    pub steps: usize,
}

/// Why a combination cannot be made safe. Expected and frequent; not an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Infeasibility {
    InvalidComposition,
    NoOutcomes,
    DegenerateRange,
    Unreachable,
    NegativeMainTrade,
    BelowFloor,
    Unreconciled,
    InsufficientBuffer,
}

impl Infeasibility {
    pub fn reason(self) -> &'static str {
        match self {
            Infeasibility::InvalidComposition => "invalid main/filler composition",
            Infeasibility::NoOutcomes => "no next-grade outcomes",
            Infeasibility::DegenerateRange => "main item has a zero float range",
            Infeasibility::Unreachable => "an outcome can never be Factory New",
            Infeasibility::NegativeMainTrade => "filler alone exceeds the allowed average",
            Infeasibility::BelowFloor => "safe ceiling lies below the exterior floor",
            Infeasibility::Unreconciled => "rounding reconciliation found no safe float",
            Infeasibility::InsufficientBuffer => "safe margin smaller than the float buffer",
        }
    }
}

impl fmt::Display for Infeasibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

/// Highest average trade float that keeps every outcome under the target,
/// clamped to 1. `Err` when some outcome can never be Factory New.
pub fn required_average_trade(outcomes: &[Item]) -> Result<f64, Infeasibility> {
    if outcomes.is_empty() {
        return Err(Infeasibility::NoOutcomes);
    }

    let mut required: f64 = 1.0;
    for outcome in outcomes {
        let range = outcome.float_range();
        if range == 0.0 {
            if outcome.min_float >= WearTier::TOP_TIER_UPPER {
                return Err(Infeasibility::Unreachable);
            }
            continue;
        }
        required = required.min((TARGET_OUTPUT_FLOAT - outcome.min_float) / range);
    }

    if required <= 0.0 {
        return Err(Infeasibility::Unreachable);
    }
    Ok(required)
}

/// True when every outcome blended from `avg_trade` stays strictly Factory New.
pub fn all_outcomes_factory_new(avg_trade: f64, outcomes: &[Item]) -> bool {
    outcomes.iter().all(|outcome| {
        blend_output(avg_trade, outcome.min_float, outcome.max_float) < WearTier::TOP_TIER_UPPER
    })
}

pub fn resolve(query: &FeasibilityQuery<'_>) -> Result<SafeFloat, Infeasibility> {
    let main_count = query.main_count;
    if !(1..=10).contains(&main_count) || (main_count < 10 && query.filler.is_none()) {
        return Err(Infeasibility::InvalidComposition);
    }
    if query.main.float_range() <= 0.0 {
        return Err(Infeasibility::DegenerateRange);
    }

    let filler_trade = query
        .filler
        .map(FillerCandidate::assumed_trade_float)
        .unwrap_or(0.0);
    let filler_count = f64::from(10 - main_count);

    let required = required_average_trade(query.outcomes)?;

    let max_main_trade =
        ((10.0 * required - filler_count * filler_trade) / f64::from(main_count)).min(1.0);
    if max_main_trade < 0.0 {
        return Err(Infeasibility::NegativeMainTrade);
    }

    let main = query.main;
    let estimate = real_float(max_main_trade, main.min_float, main.max_float);
    let (tier_lower, tier_upper) = query.wear.bounds();
    let floor = tier_lower.max(main.min_float);
    if estimate < floor {
        return Err(Infeasibility::BelowFloor);
    }

    let (max_float, avg_trade_float, steps) =
        reconcile(query, estimate.min(tier_upper), floor, filler_trade)
            .ok_or(Infeasibility::Unreconciled)?;

    let margin = max_float - floor;
    if margin < query.min_buffer {
        return Err(Infeasibility::InsufficientBuffer);
    }

    Ok(SafeFloat {
        max_float,
        floor,
        margin,
        avg_trade_float,
        filler_trade_float: filler_trade,
        steps,
    })
}

/// Walks the candidate float down from `start` until the emulated blend keeps
/// every outcome Factory New. Returns the accepted float, its average trade
/// float and the number of steps taken.
pub(crate) fn reconcile(
    query: &FeasibilityQuery<'_>,
    start: f64,
    floor: f64,
    filler_trade: f64,
) -> Option<(f64, f64, usize)> {
    let main = query.main;
    let mut candidate = start;

    for step in 0..RECONCILE_ATTEMPTS {
        if candidate < floor {
            return None;
        }
        let main_trade = trade_float(candidate, main.min_float, main.max_float);
        let avg = average_trade_float(main_trade, query.main_count, filler_trade);
        if all_outcomes_factory_new(avg, query.outcomes) {
            return Some((candidate, avg, step));
        }
        candidate -= RECONCILE_STEP;
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Rarity;

    fn item(name: &str, min: f64, max: f64) -> Item {
        Item::new(name, Rarity::MilSpec, min, max)
    }

    fn outcome(name: &str, min: f64, max: f64) -> Item {
        Item::new(name, Rarity::Restricted, min, max)
    }

    fn query<'a>(main: &'a Item, wear: WearTier, outcomes: &'a [Item]) -> FeasibilityQuery<'a> {
        FeasibilityQuery {
            main,
            wear,
            outcomes,
            main_count: 10,
            filler: None,
            min_buffer: 0.015,
        }
    }

    fn fn_filler(min: f64, max: f64) -> FillerCandidate {
        FillerCandidate {
            item_name: "Filler".into(),
            collection: "Filler Collection".into(),
            rarity: Rarity::MilSpec,
            wear: WearTier::FactoryNew,
            price: 0.05,
            min_float: min,
            max_float: max,
            outcomes: vec![outcome("Filler Out", 0.0, 1.0)],
        }
    }

    #[test]
    fn pure_trade_up_targets_just_below_factory_new() {
        let main = item("Main", 0.0, 1.0);
        let outcomes = [outcome("Out", 0.0, 1.0)];
        let safe = resolve(&query(&main, WearTier::FactoryNew, &outcomes)).unwrap();

        assert!((safe.max_float - 0.0699).abs() < 1e-12);
        assert_eq!(safe.floor, 0.0);
        assert_eq!(safe.steps, 0);
        assert!(all_outcomes_factory_new(safe.avg_trade_float, &outcomes));
    }

    #[test]
    fn tightest_outcome_binds() {
        let main = item("Main", 0.0, 0.5);
        let outcomes = [outcome("Wide", 0.0, 0.8), outcome("Narrow", 0.0, 1.0)];
        let safe = resolve(&query(&main, WearTier::FactoryNew, &outcomes)).unwrap();

        // Narrow needs avg <= 0.0699, which is 0.03495 on a [0, 0.5] item.
        assert!((safe.max_float - 0.034_95).abs() < 1e-12);
        assert!((safe.margin - 0.034_95).abs() < 1e-12);
    }

    #[test]
    fn unreachable_outcome_rejects() {
        let main = item("Main", 0.0, 1.0);
        let outcomes = [outcome("Ok", 0.0, 0.8), outcome("Worn", 0.1, 0.6)];
        assert_eq!(
            resolve(&query(&main, WearTier::FactoryNew, &outcomes)),
            Err(Infeasibility::Unreachable)
        );
        assert_eq!(required_average_trade(&[]), Err(Infeasibility::NoOutcomes));
    }

    #[test]
    fn zero_range_outcome_is_skipped_when_already_factory_new() {
        let outcomes = [outcome("Fixed", 0.02, 0.02), outcome("Out", 0.0, 1.0)];
        assert!((required_average_trade(&outcomes).unwrap() - 0.0699).abs() < 1e-12);

        let stuck = [outcome("Fixed", 0.08, 0.08)];
        assert_eq!(required_average_trade(&stuck), Err(Infeasibility::Unreachable));
    }

    #[test]
    fn ceiling_below_exterior_floor_rejects() {
        let main = item("Main", 0.06, 0.8);
        let outcomes = [outcome("Out", 0.0, 0.7)];

        let mw = resolve(&query(&main, WearTier::MinimalWear, &outcomes)).unwrap();
        assert!((mw.max_float - 0.133_894_285_714_285_7).abs() < 1e-9);
        assert_eq!(mw.floor, 0.07);

        assert_eq!(
            resolve(&query(&main, WearTier::FieldTested, &outcomes)),
            Err(Infeasibility::BelowFloor)
        );
    }

    #[test]
    fn filler_lets_main_item_go_higher() {
        let main = item("Main", 0.0, 1.0);
        let outcomes = [outcome("Out", 0.0, 1.0)];
        let filler = fn_filler(0.0, 1.0);

        let mixed = FeasibilityQuery {
            main_count: 1,
            filler: Some(&filler),
            ..query(&main, WearTier::FieldTested, &outcomes)
        };
        let safe = resolve(&mixed).unwrap();
        // Capped at the Field-Tested upper bound.
        assert_eq!(safe.max_float, 0.38);
        assert_eq!(safe.floor, 0.15);
        assert!((safe.filler_trade_float - 0.035).abs() < 1e-12);
        assert!(all_outcomes_factory_new(safe.avg_trade_float, &outcomes));
    }

    #[test]
    fn heavy_filler_float_leaves_no_room() {
        let main = item("Main", 0.0, 1.0);
        let outcomes = [outcome("Out", 0.0, 0.1)];
        let mut filler = fn_filler(0.0, 0.04);
        filler.wear = WearTier::FactoryNew;

        let mixed = FeasibilityQuery {
            main_count: 1,
            filler: Some(&filler),
            ..query(&main, WearTier::FactoryNew, &outcomes)
        };
        // Filler trade float 0.875 over nine slots exceeds the allowed 0.699 average.
        assert_eq!(resolve(&mixed), Err(Infeasibility::NegativeMainTrade));
    }

    #[test]
    fn buffer_boundary_splits_items_a_ten_thousandth_apart() {
        let outcomes = [outcome("Out", 0.0, 1.0)];

        let roomy = item("Roomy", 0.055, 1.0);
        let safe = resolve(&query(&roomy, WearTier::FactoryNew, &outcomes)).unwrap();
        assert_eq!(safe.max_float, 0.07);
        assert!(safe.margin >= 0.015);

        let tight = item("Tight", 0.0551, 1.0);
        assert_eq!(
            resolve(&query(&tight, WearTier::FactoryNew, &outcomes)),
            Err(Infeasibility::InsufficientBuffer)
        );
    }

    #[test]
    fn main_min_float_above_safe_ceiling_minus_buffer_rejects() {
        // Ceiling is capped at 0.07; 0.06 sits above 0.07 - 0.015.
        let main = item("Main", 0.06, 1.0);
        let outcomes = [outcome("Out", 0.0, 1.0)];
        assert_eq!(
            resolve(&query(&main, WearTier::FactoryNew, &outcomes)),
            Err(Infeasibility::InsufficientBuffer)
        );

        let relaxed = FeasibilityQuery {
            min_buffer: 0.005,
            ..query(&main, WearTier::FactoryNew, &outcomes)
        };
        assert!(resolve(&relaxed).is_ok());
    }

    #[test]
    fn larger_buffer_never_admits_more() {
        let outcomes = [outcome("Out", 0.0, 0.8), outcome("Other", 0.01, 0.5)];
        let mains = [
            item("A", 0.0, 1.0),
            item("B", 0.03, 0.6),
            item("C", 0.06, 0.8),
            item("D", 0.0, 0.08),
        ];
        let buffers = [0.0, 0.005, 0.01, 0.015, 0.03, 0.06];

        for main in &mains {
            for wear in WearTier::PURCHASABLE {
                let mut previously_feasible = true;
                for buffer in buffers {
                    let q = FeasibilityQuery {
                        min_buffer: buffer,
                        ..query(main, wear, &outcomes)
                    };
                    let feasible = resolve(&q).is_ok();
                    assert!(
                        previously_feasible || !feasible,
                        "{} {wear} became feasible at buffer {buffer}",
                        main.name
                    );
                    previously_feasible = feasible;
                }
            }
        }
    }

    #[test]
    fn accepted_float_is_never_below_floor_or_unsafe() {
        let outcomes = [outcome("Out", 0.0, 0.7), outcome("Other", 0.02, 0.9)];
        let filler = fn_filler(0.0, 0.5);
        for (min, max) in [(0.0, 1.0), (0.06, 0.8), (0.1, 0.5), (0.0, 0.45)] {
            let main = item("Main", min, max);
            for wear in WearTier::PURCHASABLE {
                for (count, filler) in [(10, None), (3, Some(&filler)), (1, Some(&filler))] {
                    let q = FeasibilityQuery {
                        main_count: count,
                        filler,
                        min_buffer: 0.0,
                        ..query(&main, wear, &outcomes)
                    };
                    if let Ok(safe) = resolve(&q) {
                        assert!(safe.max_float >= safe.floor);
                        assert!(safe.floor >= wear.lower_bound().max(min));
                        for out in &outcomes {
                            let blended =
                                blend_output(safe.avg_trade_float, out.min_float, out.max_float);
                            assert!(blended < 0.07);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn reconciliation_steps_down_from_unsafe_start() {
        let main = item("Main", 0.0, 1.0);
        let outcomes = [outcome("Out", 0.0, 1.0)];
        let q = query(&main, WearTier::FactoryNew, &outcomes);

        let (float, avg, steps) = reconcile(&q, 0.0705, 0.0, 0.0).unwrap();
        assert_eq!(steps, 1);
        assert!((float - 0.0695).abs() < 1e-12);
        assert!(blend_output(avg, 0.0, 1.0) < 0.07);
    }

    #[test]
    fn reconciliation_gives_up_after_budget() {
        let main = item("Main", 0.0, 1.0);
        let outcomes = [outcome("Out", 0.0, 1.0)];
        let q = query(&main, WearTier::FactoryNew, &outcomes);

        assert!(reconcile(&q, 0.09, 0.0, 0.0).is_none());
        assert!(reconcile(&q, 0.0705, 0.07, 0.0).is_none());
    }

    #[test]
    fn degenerate_compositions_reject() {
        let main = item("Main", 0.0, 1.0);
        let outcomes = [outcome("Out", 0.0, 1.0)];
        let no_filler = FeasibilityQuery {
            main_count: 3,
            ..query(&main, WearTier::FactoryNew, &outcomes)
        };
        assert_eq!(resolve(&no_filler), Err(Infeasibility::InvalidComposition));

        let fixed = item("Fixed", 0.03, 0.03);
        assert_eq!(
            resolve(&query(&fixed, WearTier::FactoryNew, &outcomes)),
            Err(Infeasibility::DegenerateRange)
        );
    }
}
