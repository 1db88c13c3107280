use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{info, warn};

use tradeup_scanner::domain::{
    scan, sort_candidates, CandidateFilter, CandidateSort, Rarity, TradeUpMode,
};
use tradeup_scanner::infra::{
    catalog::{fetch_catalog, load_catalog, save_catalog},
    prices::PriceClient,
    report::{write_report, ReportHeader},
};
use tradeup_scanner::util::{
    config::AppConfig,
    version::{version_label, APP_NAME},
};

/// Finds Counter-Strike trade-up contracts whose expected value beats their cost.
#[derive(Parser, Debug)]
#[command(name = "tradeup_scanner")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log filter, overrides the configured level
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan the catalog and write the ranked report (default)
    Scan(ScanArgs),
    /// Refresh the price cache only
    Prices {
        /// Ignore a fresh cache and fetch anyway
        #[arg(long)]
        force: bool,
    },
    /// Rebuild the catalog file from the community skins dump
    Catalog {
        /// Write here instead of the configured catalog path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Default)]
struct ScanArgs {
    /// Fetch prices even when the cache is fresh
    #[arg(long)]
    refresh: bool,

    /// Only try pure 10x trade-ups
    #[arg(long)]
    no_mixed: bool,

    /// Order of the report
    #[arg(long, value_enum, default_value_t = SortArg::Roi)]
    sort: SortArg,

    /// Keep only one composition
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Keep only one input rarity, e.g. "mil-spec"
    #[arg(long, value_parser = parse_rarity)]
    rarity: Option<Rarity>,

    /// Keep only candidates whose float buffer is at least this wide
    #[arg(long)]
    min_buffer: Option<f64>,

    /// Keep only candidates from this collection
    #[arg(long)]
    collection: Option<String>,

    /// Number of entries echoed to the terminal [default: 10]
    #[arg(long)]
    top: Option<usize>,

    /// Write the report here instead of the configured path
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum SortArg {
    #[default]
    Roi,
    Profit,
    Cost,
    Buffer,
}

impl From<SortArg> for CandidateSort {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Roi => CandidateSort::Roi,
            SortArg::Profit => CandidateSort::ExpectedProfit,
            SortArg::Cost => CandidateSort::Cost,
            SortArg::Buffer => CandidateSort::SafetyBuffer,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Pure,
    #[value(name = "3+7")]
    ThreeSeven,
    #[value(name = "1+9")]
    OneNine,
}

impl From<ModeArg> for TradeUpMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Pure => TradeUpMode::Pure,
            ModeArg::ThreeSeven => TradeUpMode::ThreeSeven,
            ModeArg::OneNine => TradeUpMode::OneNine,
        }
    }
}

/// Accepts the full grade label in any case, with or without the "Grade" suffix.
fn parse_rarity(input: &str) -> Result<Rarity, String> {
    let wanted = input.trim().to_lowercase();
    Rarity::ALL
        .into_iter()
        .find(|rarity| {
            let label = rarity.label().to_lowercase();
            label == wanted || label.trim_end_matches(" grade") == wanted
        })
        .ok_or_else(|| format!("unknown rarity '{input}'"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::discover(cli.config.as_deref()).context("loading configuration")?;
    if let Some(level) = cli.log_level.clone() {
        config.logging = config.logging.with_level(level);
    }
    config.logging.init();
    info!(version = %version_label(), "{APP_NAME} starting");

    match cli.command.unwrap_or(Command::Scan(ScanArgs::default())) {
        Command::Scan(args) => run_scan(&config, args).await,
        Command::Prices { force } => refresh_prices(&config, force).await,
        Command::Catalog { output } => rebuild_catalog(&config, output).await,
    }
}

async fn run_scan(config: &AppConfig, args: ScanArgs) -> Result<()> {
    let catalog = load_catalog(&config.catalog.path).context("loading catalog")?;

    let client = PriceClient::new(&config.prices)?;
    let payload = if args.refresh {
        client.refresh().await
    } else {
        client.get_prices().await
    }
    .context("loading marketplace prices")?;

    info!(
        status = ?payload.status,
        age_secs = payload.age().as_secs(),
        "prices ready"
    );

    let mut settings = config.scan.clone();
    if args.no_mixed {
        settings.mixed_mode = false;
    }

    let report = scan(&catalog, &payload.data, &settings);
    let stats = &report.stats;
    info!(
        collections = stats.collections,
        rarity_groups = stats.rarity_groups,
        combinations = stats.combinations,
        infeasible = stats.infeasible,
        over_budget = stats.over_budget,
        worthless = stats.worthless,
        below_roi = stats.below_roi,
        fillers = report.fillers,
        "scan statistics"
    );

    let filter = CandidateFilter {
        min_buffer: args.min_buffer,
        rarity: args.rarity,
        mode: args.mode.map(TradeUpMode::from),
        collection: args.collection,
        ..CandidateFilter::default()
    };
    let mut candidates = filter.apply(report.candidates);
    sort_candidates(&mut candidates, args.sort.into(), args.sort != SortArg::Cost);

    let path = args.output.unwrap_or_else(|| config.report.path.clone());
    let header = ReportHeader::now(settings.min_roi, config.report.hot_roi, &config.prices.currency);
    write_report(&path, &candidates, &header).context("writing report")?;

    if candidates.is_empty() {
        println!("No trade-ups above {}% ROI.", settings.min_roi);
        return Ok(());
    }
    println!("{} trade-ups written to {}", candidates.len(), path.display());
    for (rank, c) in candidates.iter().take(args.top.unwrap_or(10)).enumerate() {
        println!(
            "#{:<3} {:>7.2}%  {:<6} {:<40} {:<16} max float < {:.5}  cost {:.2}",
            rank + 1,
            c.roi,
            c.mode.label(),
            c.main_item,
            c.wear.label(),
            c.max_safe_float,
            c.cost
        );
    }
    Ok(())
}

async fn refresh_prices(config: &AppConfig, force: bool) -> Result<()> {
    let client = PriceClient::new(&config.prices)?;
    let payload = if force {
        client.refresh().await
    } else {
        client.get_prices().await
    }
    .context("loading marketplace prices")?;

    println!(
        "{} prices available ({:?}, {}m old)",
        payload.data.len(),
        payload.status,
        payload.age().as_secs() / 60
    );
    Ok(())
}

async fn rebuild_catalog(config: &AppConfig, output: Option<PathBuf>) -> Result<()> {
    let path = output.unwrap_or_else(|| config.catalog.path.clone());
    if path.exists() {
        warn!(path = %path.display(), "overwriting existing catalog");
    }

    let catalog = fetch_catalog(&config.catalog.source_url)
        .await
        .context("building catalog")?;
    save_catalog(&path, &catalog)?;

    println!(
        "{} items in {} collections written to {}",
        catalog.item_count(),
        catalog.collection_count(),
        path.display()
    );
    Ok(())
}
