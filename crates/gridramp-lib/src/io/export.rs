//! CSV writers for the analysis result tables.

use crate::detectors::edac::EdacEvent;
use crate::metrics::pv::SlopeSummary;
use anyhow::{Context, Result};
use csv::WriterBuilder;
use std::fs::File;
use std::path::Path;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Write the per-event table. The steepest-slope column converts from MW/h
/// to MW/s, the unit operators use when reading shedding ramps.
pub fn write_events_csv(path: &Path, events: &[EdacEvent]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = WriterBuilder::new().from_writer(file);
    writer.write_record([
        "day",
        "onset",
        "recovery",
        "duration_s",
        "min_slope_mw_per_s",
        "min_slope_time",
        "frequency_hz",
        "trigger_time",
    ])?;
    for event in events {
        writer.write_record([
            event.onset.date().to_string(),
            event.onset.format(TIME_FORMAT).to_string(),
            event.recovery.format(TIME_FORMAT).to_string(),
            format!("{:.1}", event.duration_secs),
            format!("{:.4}", event.min_slope_mw_per_h / 3600.0),
            event.min_slope_time.format(TIME_FORMAT).to_string(),
            format!("{:.3}", event.frequency_hz),
            event.trigger.format(TIME_FORMAT).to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the per-(day, channel) PV ramp table, slopes in MW/h.
pub fn write_slopes_csv(path: &Path, summaries: &[SlopeSummary]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = WriterBuilder::new().from_writer(file);
    writer.write_record([
        "day",
        "channel",
        "max_slope_mw_per_h",
        "max_time",
        "max_period",
        "min_slope_mw_per_h",
        "min_time",
        "min_period",
    ])?;
    for summary in summaries {
        writer.write_record([
            summary.day.to_string(),
            summary.channel.clone(),
            format!("{:.2}", summary.max_slope_mw_per_h),
            summary.max_time.format("%H:%M").to_string(),
            summary.max_period.clone(),
            format!("{:.2}", summary.min_slope_mw_per_h),
            summary.min_time.format("%H:%M").to_string(),
            summary.min_period.clone(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
