use tracing::{debug, info, trace};

use super::candidate::{
    roi_percent, Candidate, FillerPurchase, OutcomeDetail, OutcomeSource, ResultSet, TradeUpMode,
};
use super::entities::{group_by_rarity, Catalog, Item, PriceMap, Rarity, ScanSettings, WearTier};
use super::feasibility::{resolve, FeasibilityQuery, Infeasibility, SafeFloat};
use super::filler::{FillerCandidate, FillerIndex};
use super::float_math::{blend_output, wear_tier_of};

/// Counters collected over one scan.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub collections: usize,
    pub rarity_groups: usize,
    /// Resolver invocations (main item × mode × filler × exterior with a price).
    pub combinations: usize,
    pub infeasible: usize,
    pub over_budget: usize,
    pub worthless: usize,
    pub below_roi: usize,
    pub offered: usize,
}

pub struct ScanReport {
    /// Retained candidates, best ROI first.
    pub candidates: Vec<Candidate>,
    pub stats: ScanStats,
    pub fillers: usize,
}

/// Runs a full scan over `catalog` with the given prices and settings.
pub fn scan(catalog: &Catalog, prices: &PriceMap, settings: &ScanSettings) -> ScanReport {
    ScanRun::new(catalog, prices, settings).run()
}

/// State owned by a single scan: the filler index built from this run's
/// prices, and the best-per-key results. Both are dropped with the run.
pub struct ScanRun<'a> {
    catalog: &'a Catalog,
    prices: &'a PriceMap,
    settings: &'a ScanSettings,
    fillers: FillerIndex,
}

impl<'a> ScanRun<'a> {
    pub fn new(catalog: &'a Catalog, prices: &'a PriceMap, settings: &'a ScanSettings) -> Self {
        let fillers = FillerIndex::build(catalog, prices);
        Self {
            catalog,
            prices,
            settings,
            fillers,
        }
    }

    pub fn run(self) -> ScanReport {
        info!(
            collections = self.catalog.collection_count(),
            items = self.catalog.item_count(),
            prices = self.prices.len(),
            fillers = self.fillers.len(),
            mixed_mode = self.settings.mixed_mode,
            "starting trade-up scan"
        );

        let mut stats = ScanStats::default();
        let mut results = ResultSet::new();

        for (collection, items) in self.catalog.collections() {
            stats.collections += 1;
            let found = self.scan_collection(collection, items, &mut stats);
            debug!(collection, retained = found.len(), "collection scanned");
            results.merge(found);
        }

        info!(
            combinations = stats.combinations,
            infeasible = stats.infeasible,
            retained = results.len(),
            "scan finished"
        );

        ScanReport {
            candidates: results.into_ranked(),
            stats,
            fillers: self.fillers.len(),
        }
    }

    /// Best candidates of one collection. Collections are independent, so
    /// their result sets can be merged in any order under the same rule.
    pub fn scan_collection(
        &self,
        collection: &str,
        items: &[Item],
        stats: &mut ScanStats,
    ) -> ResultSet {
        let mut results = ResultSet::new();
        let grouped = group_by_rarity(items);

        for (&rarity, inputs) in &grouped {
            let Some(next) = rarity.next() else {
                continue;
            };
            let Some(next_items) = grouped.get(&next) else {
                continue;
            };
            if !next_items.iter().all(|item| item.can_be_factory_new()) {
                trace!(collection, %rarity, "outcomes cannot all be Factory New");
                continue;
            }
            stats.rarity_groups += 1;

            let outcomes: Vec<Item> = next_items.iter().map(|item| (*item).clone()).collect();
            for &main in inputs {
                let trade = TradeUp {
                    collection,
                    rarity,
                    main,
                    outcomes: &outcomes,
                };
                self.simulate(&trade, TradeUpMode::Pure, None, &mut results, stats);

                if self.settings.mixed_mode {
                    for filler in self.fillers.for_rarity(rarity) {
                        for mode in TradeUpMode::MIXED {
                            self.simulate(&trade, mode, Some(filler), &mut results, stats);
                        }
                    }
                }
            }
        }

        results
    }

    fn simulate(
        &self,
        trade: &TradeUp<'_>,
        mode: TradeUpMode,
        filler: Option<&FillerCandidate>,
        results: &mut ResultSet,
        stats: &mut ScanStats,
    ) {
        for wear in WearTier::PURCHASABLE {
            let Some(main_price) = self.prices.price(&trade.main.name, wear) else {
                continue;
            };
            stats.combinations += 1;

            let query = FeasibilityQuery {
                main: trade.main,
                wear,
                outcomes: trade.outcomes,
                main_count: mode.main_count(),
                filler,
                min_buffer: self.settings.float_buffer,
            };
            let safe = match resolve(&query) {
                Ok(safe) => safe,
                Err(reason) => {
                    stats.infeasible += 1;
                    log_infeasible(trade, mode, wear, reason);
                    continue;
                }
            };

            match self.score(trade, mode, wear, main_price, filler, &safe) {
                Ok(candidate) => {
                    stats.offered += 1;
                    results.offer(candidate);
                }
                Err(Rejection::OverBudget) => stats.over_budget += 1,
                Err(Rejection::Worthless) => stats.worthless += 1,
                Err(Rejection::BelowRoi) => stats.below_roi += 1,
            }
        }
    }

    fn score(
        &self,
        trade: &TradeUp<'_>,
        mode: TradeUpMode,
        wear: WearTier,
        main_price: f64,
        filler: Option<&FillerCandidate>,
        safe: &SafeFloat,
    ) -> Result<Candidate, Rejection> {
        let main_count = mode.main_count();
        let filler_count = mode.filler_count();
        let filler_price = filler.map(|f| f.price).unwrap_or(0.0);

        let cost = f64::from(main_count) * main_price + f64::from(filler_count) * filler_price;
        if cost > self.settings.max_cost {
            return Err(Rejection::OverBudget);
        }

        let mut outcomes = self.price_outcomes(
            OutcomeSource::Main,
            trade.outcomes,
            main_count,
            safe.avg_trade_float,
        );
        if let Some(filler) = filler {
            outcomes.extend(self.price_outcomes(
                OutcomeSource::Filler,
                &filler.outcomes,
                filler_count,
                safe.avg_trade_float,
            ));
        }

        let expected_value: f64 = outcomes.iter().map(|o| o.net_value * o.probability).sum();
        if expected_value == 0.0 {
            return Err(Rejection::Worthless);
        }

        let roi = roi_percent(cost, expected_value);
        if roi <= self.settings.min_roi {
            return Err(Rejection::BelowRoi);
        }

        Ok(Candidate {
            mode,
            collection: trade.collection.to_string(),
            rarity: trade.rarity,
            main_item: trade.main.name.clone(),
            wear,
            main_price,
            max_safe_float: safe.max_float,
            buffer: safe.margin,
            filler: filler.map(|f| FillerPurchase {
                item_name: f.item_name.clone(),
                collection: f.collection.clone(),
                wear: f.wear,
                price: f.price,
                count: filler_count,
            }),
            cost,
            expected_value,
            roi,
            outcomes,
        })
    }

    /// Prices every outcome of one side of the trade-up. Each outcome gets an
    /// equal share of the side's `slots / 10` probability.
    fn price_outcomes(
        &self,
        source: OutcomeSource,
        outcomes: &[Item],
        slots: u8,
        avg_trade: f64,
    ) -> Vec<OutcomeDetail> {
        if outcomes.is_empty() || slots == 0 {
            return Vec::new();
        }
        let probability = f64::from(slots) / 10.0 / outcomes.len() as f64;
        let net_factor = self.settings.net_factor();

        outcomes
            .iter()
            .map(|outcome| {
                let float = blend_output(avg_trade, outcome.min_float, outcome.max_float);
                let wear = wear_tier_of(float);
                let net_value = self.prices.outcome_price(&outcome.name, wear) * net_factor;
                OutcomeDetail {
                    source,
                    item_name: outcome.name.clone(),
                    wear,
                    float,
                    probability,
                    net_value,
                }
            })
            .collect()
    }
}

/// The fixed part of one enumeration step: a main item and its outcome pool.
struct TradeUp<'a> {
    collection: &'a str,
    rarity: Rarity,
    main: &'a Item,
    outcomes: &'a [Item],
}

enum Rejection {
    OverBudget,
    Worthless,
    BelowRoi,
}

fn log_infeasible(trade: &TradeUp<'_>, mode: TradeUpMode, wear: WearTier, reason: Infeasibility) {
    trace!(
        collection = trade.collection,
        item = %trade.main.name,
        %mode,
        %wear,
        %reason,
        "combination infeasible"
    );
}
