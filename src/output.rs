//! Tabular and JSON summaries of the coloured communities.
//!
//! Supports JSON logging, CSV export and JSON export.

use anyhow::Result;
use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use tracing::{debug, info};

use crate::aggregate::{ModeTotals, SectorTotals};
use crate::atlas::Atlas;
use crate::color::{Color, Colorizer, share_percent};
use crate::modes::TravelMode;

/// One community's share of a mode and the colour it is drawn with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommunitySummary {
    pub comm_code: String,
    pub name: String,
    pub sector: Option<String>,
    pub count: Option<u64>,
    pub sum: Option<u64>,
    pub percent: Option<f64>,
    pub bucket: Option<&'static str>,
    pub color: Color,
}

#[derive(Debug, Serialize)]
pub struct DatasetSummary {
    pub generated_at: DateTime<Utc>,
    pub mode: TravelMode,
    pub totals: ModeTotals,
    pub sectors: SectorTotals,
    pub missing_rows: Vec<String>,
    pub orphan_rows: Vec<String>,
    pub communities: Vec<CommunitySummary>,
}

/// One row per boundary, in boundary-file order.
pub fn summarize(atlas: &Atlas, mode: TravelMode, colorizer: &Colorizer) -> Vec<CommunitySummary> {
    let totals = atlas.dataset().totals();
    atlas
        .boundaries()
        .iter()
        .map(|b| {
            let record = atlas.record(&b.comm_code);
            CommunitySummary {
                comm_code: b.comm_code.clone(),
                name: b.name.clone(),
                sector: record
                    .and_then(|r| r.sector.clone())
                    .or_else(|| b.sector.clone()),
                count: record.map(|r| r.count(mode)),
                sum: record.map(|r| r.sum),
                percent: record.and_then(|r| share_percent(mode, r, totals).ok()),
                bucket: colorizer.bucket(mode, record, totals).map(|b| b.label()),
                color: colorizer.bucket_color(mode, record, totals),
            }
        })
        .collect()
}

pub fn dataset_summary(atlas: &Atlas, mode: TravelMode, colorizer: &Colorizer) -> DatasetSummary {
    DatasetSummary {
        generated_at: Utc::now(),
        mode,
        totals: atlas.dataset().totals().clone(),
        sectors: atlas.dataset().sectors().clone(),
        missing_rows: atlas.report().missing_rows.clone(),
        orphan_rows: atlas.report().orphan_rows.clone(),
        communities: summarize(atlas, mode, colorizer),
    }
}

/// Logs a value as pretty-printed JSON.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Writes a value as pretty-printed JSON, replacing any existing file.
pub fn write_json(path: &str, value: &impl Serialize) -> Result<()> {
    debug!(path, "Writing JSON");
    let mut file = File::create(path)?;
    serde_json::to_writer_pretty(&mut file, value)?;
    file.write_all(b"\n")?;
    Ok(())
}

/// Writes summary rows as CSV with a header, replacing any existing file.
pub fn write_summary_csv(path: &str, rows: &[CommunitySummary]) -> Result<()> {
    debug!(path, rows = rows.len(), "Writing CSV summary");
    let file = File::create(path)?;

    let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(())
}
