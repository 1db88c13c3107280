//! Plain-text ranked report of profitable trade-ups.

use std::{fmt::Write as _, fs, io, path::Path};

use thiserror::Error;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::info;

use crate::domain::{listing_name, Candidate};

const RULE_WIDTH: usize = 70;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write report: {0}")]
    Io(#[from] io::Error),
    #[error("failed to format timestamp: {0}")]
    Timestamp(#[from] time::error::Format),
    #[error("failed to render report: {0}")]
    Fmt(#[from] std::fmt::Error),
}

/// Everything the report states besides the candidates themselves.
#[derive(Clone, Debug)]
pub struct ReportHeader {
    pub generated_at: OffsetDateTime,
    pub min_roi: f64,
    /// Entries with a strictly higher ROI get the hot marker.
    pub hot_roi: f64,
    pub currency: String,
}

impl ReportHeader {
    pub fn now(min_roi: f64, hot_roi: f64, currency: impl Into<String>) -> Self {
        Self {
            generated_at: OffsetDateTime::now_utc(),
            min_roi,
            hot_roi,
            currency: currency.into(),
        }
    }
}

/// Render `candidates` in the order given; callers pass them ranked.
pub fn render_report(
    candidates: &[Candidate],
    header: &ReportHeader,
) -> Result<String, ReportError> {
    let mut out = String::new();
    let stamp = header.generated_at.format(&Rfc3339)?;
    let cur = header.currency.as_str();

    writeln!(out, "TRADE-UP REPORT - {stamp}")?;
    writeln!(out, "Trade-float formula, 32-bit output | ROI > {}%", header.min_roi)?;
    writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;
    writeln!(out)?;

    if candidates.is_empty() {
        writeln!(out, "No profitable trade-ups found.")?;
        return Ok(out);
    }

    for (rank, c) in candidates.iter().enumerate() {
        let marker = if c.roi > header.hot_roi { " [HOT]" } else { "" };
        writeln!(
            out,
            "#{} [ROI: {:.2}%]{} | {} | {}",
            rank + 1,
            c.roi,
            marker,
            c.mode,
            c.rarity
        )?;
        writeln!(out, "   Collection: {}", c.collection)?;
        writeln!(
            out,
            "   Main:   {}x {} @ {:.2} {cur}",
            c.main_count(),
            listing_name(&c.main_item, c.wear),
            c.main_price
        )?;
        writeln!(
            out,
            "           Max float < {:.5} (buffer {:.4})",
            c.max_safe_float, c.buffer
        )?;
        if let Some(filler) = &c.filler {
            writeln!(
                out,
                "   Filler: {}x {} @ {:.2} {cur} ({})",
                filler.count,
                listing_name(&filler.item_name, filler.wear),
                filler.price,
                filler.collection
            )?;
        }
        writeln!(
            out,
            "   Cost: {:.2} {cur} -> Expected: {:.2} {cur} (win chance {:.1}%)",
            c.cost,
            c.expected_value,
            c.win_probability() * 100.0
        )?;
        writeln!(out, "   Outcomes:")?;
        for o in &c.outcomes {
            let mark = if o.covers(c.cost) { "+" } else { "-" };
            writeln!(
                out,
                "     {mark} [{}] {} (F:{:.5}) {:.1}%: {:.2} {cur}",
                o.source.tag(),
                listing_name(&o.item_name, o.wear),
                o.float,
                o.probability * 100.0,
                o.net_value
            )?;
        }
        writeln!(out, "{}", "-".repeat(RULE_WIDTH))?;
    }

    Ok(out)
}

pub fn write_report(
    path: &Path,
    candidates: &[Candidate],
    header: &ReportHeader,
) -> Result<(), ReportError> {
    let content = render_report(candidates, header)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    info!(entries = candidates.len(), path = %path.display(), "report written");
    Ok(())
}
