//! Daily ramp-rate summaries for PV generation curves.

use crate::error::AnalysisError;
use crate::series::TimeSeries;
use crate::slope::{find_extremum_in_hours, hourly_slope, ExtremumMode};
use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Time-of-day window over whole hours, `[start, end)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HourWindow {
    pub start: u32,
    pub end: u32,
}

/// Tunable parameters for the PV daily slope summary.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct PvConfig {
    /// Moving-average width for the analysis curve, seconds.
    pub smooth_period_secs: u32,
    /// Window searched for the steepest ramp-up.
    pub morning: HourWindow,
    /// Window searched for the steepest ramp-down.
    pub afternoon: HourWindow,
}

impl Default for PvConfig {
    fn default() -> Self {
        Self {
            smooth_period_secs: 3600,
            morning: HourWindow { start: 6, end: 11 },
            afternoon: HourWindow { start: 14, end: 19 },
        }
    }
}

/// Ramp summary for one channel on one day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlopeSummary {
    pub day: NaiveDate,
    pub channel: String,
    /// Steepest morning ramp-up, MW/h.
    pub max_slope_mw_per_h: f64,
    pub max_time: NaiveDateTime,
    /// Hour-period label of the block holding the maximum, e.g. "P09".
    pub max_period: String,
    /// Steepest afternoon ramp-down, MW/h.
    pub min_slope_mw_per_h: f64,
    pub min_time: NaiveDateTime,
    pub min_period: String,
}

/// The one-hour block containing `t`, as `(start, end)`.
pub fn hour_block(t: NaiveDateTime) -> (NaiveDateTime, NaiveDateTime) {
    let start = t - Duration::minutes(i64::from(t.minute())) - Duration::seconds(i64::from(t.second()));
    (start, start + Duration::hours(1))
}

/// Label of the hour block containing `t`, named after the block's end hour.
/// 08:23 sits in the 08:00-09:00 block and reads "P09"; the last block of
/// the day wraps to "P00".
pub fn period_label(t: NaiveDateTime) -> String {
    let (_, end) = hour_block(t);
    format!("P{:02}", end.hour())
}

/// Summarize one day of one channel: steepest ramp-up in the morning
/// window, steepest ramp-down in the afternoon window.
///
/// `smoothed` is the moving-average curve for the day; callers smooth once
/// and reuse the same curve for charts.
pub fn daily_slope_summary(
    channel: &str,
    smoothed: &TimeSeries,
    cfg: &PvConfig,
) -> Result<SlopeSummary, AnalysisError> {
    let day = smoothed
        .day()
        .ok_or(AnalysisError::TooFewSamples { len: 0 })?;
    let slopes = hourly_slope(smoothed)?;
    let max = find_extremum_in_hours(&slopes, cfg.morning.start, cfg.morning.end, ExtremumMode::Max)?;
    let min = find_extremum_in_hours(
        &slopes,
        cfg.afternoon.start,
        cfg.afternoon.end,
        ExtremumMode::Min,
    )?;
    Ok(SlopeSummary {
        day,
        channel: channel.to_string(),
        max_slope_mw_per_h: max.value,
        max_time: max.time,
        max_period: period_label(max.time),
        min_slope_mw_per_h: min.value,
        min_time: min.time,
        min_period: period_label(min.time),
    })
}
