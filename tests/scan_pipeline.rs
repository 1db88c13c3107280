use std::collections::HashSet;
use std::fs;

use time::OffsetDateTime;
use tradeup_scanner::domain::{
    scan, CandidateFilter, OutcomeSource, PriceMap, ScanSettings, TradeUpMode, WearTier,
};
use tradeup_scanner::infra::catalog::load_catalog;
use tradeup_scanner::infra::report::{write_report, ReportHeader};

const CATALOG: &str = r#"{
    "Alpha": [
        {"name": "Gun A", "rarity": "Mil-Spec Grade", "min": 0.0, "max": 1.0},
        {"name": "Rifle X", "rarity": "Restricted", "min": 0.0, "max": 1.0},
        {"name": "Rifle Y", "rarity": "Restricted", "min": 0.0, "max": 0.8}
    ],
    "Beta": [
        {"name": "Cheap Gun", "rarity": "Mil-Spec Grade", "min": 0.0, "max": 1.0},
        {"name": "Beta Rifle", "rarity": "Restricted", "min": 0.0, "max": 1.0}
    ],
    "Gamma": [
        {"name": "Gun G", "rarity": "Mil-Spec Grade", "min": 0.0, "max": 1.0},
        {"name": "Rifle G1", "rarity": "Restricted", "min": 0.0, "max": 1.0},
        {"name": "Rifle G2", "rarity": "Restricted", "min": 0.08, "max": 0.5}
    ]
}"#;

fn prices() -> PriceMap {
    [
        ("Gun A (Factory New)", 0.50),
        ("Gun A (Minimal Wear)", 0.20),
        ("Rifle X (Factory New)", 10.0),
        ("Rifle Y (Factory New)", 6.0),
        ("Cheap Gun (Factory New)", 0.05),
        ("Cheap Gun (Minimal Wear)", 0.03),
        ("Beta Rifle (Factory New)", 3.0),
        ("Beta Rifle (Minimal Wear)", 1.0),
        ("Gun G (Factory New)", 0.01),
        ("Rifle G1 (Factory New)", 500.0),
    ]
    .into_iter()
    .map(|(name, price)| (name.to_string(), price))
    .collect()
}

fn load_fixture() -> (tempfile::TempDir, tradeup_scanner::domain::Catalog) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("database.json");
    fs::write(&path, CATALOG).unwrap();
    let catalog = load_catalog(&path).unwrap();
    (dir, catalog)
}

#[test]
fn pure_scan_skips_collections_with_unreachable_outcomes() {
    let (_dir, catalog) = load_fixture();
    let settings = ScanSettings {
        mixed_mode: false,
        ..ScanSettings::default()
    };

    let report = scan(&catalog, &prices(), &settings);

    assert_eq!(report.stats.collections, 3);
    // Gamma is skipped: Rifle G2 can never come out Factory New.
    assert_eq!(report.stats.rarity_groups, 2);
    assert!(report.candidates.iter().all(|c| c.mode == TradeUpMode::Pure));
    assert!(report.candidates.iter().all(|c| c.collection != "Gamma"));

    let gun_a = report
        .candidates
        .iter()
        .find(|c| c.main_item == "Gun A")
        .expect("Gun A pure trade-up");
    assert_eq!(gun_a.wear, WearTier::FactoryNew);
    assert!((gun_a.roi - 36.0).abs() < 1e-6);
}

#[test]
fn every_retained_candidate_honours_the_scan_invariants() {
    let (_dir, catalog) = load_fixture();
    let settings = ScanSettings::default();

    let report = scan(&catalog, &prices(), &settings);
    assert!(!report.candidates.is_empty());

    let mut keys = HashSet::new();
    for c in &report.candidates {
        assert!(keys.insert(c.key()), "duplicate key {:?}", c.key());
        assert!(c.roi > settings.min_roi);
        assert!(c.cost <= settings.max_cost);
        assert!(c.expected_value > 0.0);
        assert!(c.buffer >= settings.float_buffer);
        assert!(c.max_safe_float <= c.wear.upper_bound());
        assert!(c
            .outcomes
            .iter()
            .filter(|o| o.source == OutcomeSource::Main)
            .all(|o| o.float < 0.07 && o.wear == WearTier::FactoryNew));
        assert_eq!(c.filler.is_some(), c.mode != TradeUpMode::Pure);

        let total: f64 = c.outcomes.iter().map(|o| o.probability).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    // Ranked by descending ROI.
    assert!(report
        .candidates
        .windows(2)
        .all(|pair| pair[0].roi >= pair[1].roi));
}

#[test]
fn mixed_mode_uses_the_cheapest_reachable_filler() {
    let (_dir, catalog) = load_fixture();
    let report = scan(&catalog, &prices(), &ScanSettings::default());

    let mixed: Vec<_> = report
        .candidates
        .iter()
        .filter(|c| c.mode != TradeUpMode::Pure)
        .collect();
    assert!(!mixed.is_empty());
    // Gamma cannot be traded up, yet Gun G still fills: Rifle G1 can come out Factory New.
    for c in mixed {
        let filler = c.filler.as_ref().unwrap();
        assert_eq!(filler.count, c.mode.filler_count());
        assert!(filler.item_name == "Gun G" || filler.item_name == "Cheap Gun");
        if filler.wear == WearTier::FactoryNew {
            assert_eq!(filler.item_name, "Gun G");
        }
    }
}

#[test]
fn filtered_results_are_written_as_a_report() {
    let (dir, catalog) = load_fixture();
    let settings = ScanSettings::default();
    let report = scan(&catalog, &prices(), &settings);

    let filter = CandidateFilter {
        mode: Some(TradeUpMode::Pure),
        ..CandidateFilter::default()
    };
    let pure = filter.apply(report.candidates);
    assert!(pure.iter().all(|c| c.mode == TradeUpMode::Pure));

    let path = dir.path().join("profitable_tradeups.txt");
    let header = ReportHeader {
        generated_at: OffsetDateTime::UNIX_EPOCH,
        min_roi: settings.min_roi,
        hot_roi: 30.0,
        currency: "EUR".into(),
    };
    write_report(&path, &pure, &header).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("ROI > 10%"));
    // Cheap Gun: 10 x 0.05 in, Beta Rifle at 3.00 out, 410 %.
    assert!(text.contains("#1 [ROI: 410.00%] [HOT] | 10x | Mil-Spec Grade"));
    assert!(text.contains("#2 [ROI: 36.00%] [HOT] | 10x | Mil-Spec Grade"));
    assert!(text.contains("Main:   10x Gun A (Factory New)"));
    assert!(!text.contains("Filler:"));
}
