//! Under-frequency event detection on EDAC telemetry.
//!
//! A day of telemetry carries a grid frequency channel and a shed-load power
//! channel on one axis. Samples where the frequency sits below the scheme's
//! set point are clustered into segments, and each segment's first sample
//! (the trigger) anchors a search over the smoothed power derivative for the
//! moment shedding started and the moment the drop stopped.

use crate::error::AnalysisError;
use crate::frame::{Frame, FREQ_CHANNEL, POWER_CHANNEL};
use crate::series::TimeSeries;
use crate::slope::{find_extremum, hourly_slope, ExtremumMode};
use crate::smooth::savgol;
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Tunable parameters for EDAC event detection.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct EdacConfig {
    /// Frequency set point in Hz; samples strictly below it are active.
    pub threshold_hz: f64,
    /// How far back from the trigger to look for the ramp onset, seconds.
    pub lookback_secs: i64,
    /// Slope below `-drop_tolerance` (MW/h) marks the onset.
    pub drop_tolerance: f64,
    /// First slope above this value (MW/h) after the trigger marks recovery.
    pub recovery_tolerance: f64,
    /// Savitzky-Golay window applied to power before differencing.
    pub savgol_window: usize,
    /// Savitzky-Golay polynomial degree.
    pub savgol_degree: usize,
}

impl Default for EdacConfig {
    fn default() -> Self {
        Self {
            threshold_hz: 59.3,
            lookback_secs: 120,
            drop_tolerance: 0.05,
            recovery_tolerance: -0.1,
            savgol_window: 7,
            savgol_degree: 2,
        }
    }
}

/// A gap-clustered run of below-threshold samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// 0-based id, increasing chronologically.
    pub id: usize,
    /// Indices into the day's sample axis, in order.
    pub indices: Vec<usize>,
}

impl Segment {
    /// Index of the trigger sample, the first of the run.
    pub fn trigger_index(&self) -> usize {
        self.indices[0]
    }
}

/// One detected under-frequency event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdacEvent {
    /// When shedding started ramping.
    pub onset: NaiveDateTime,
    /// When the drop stopped falling.
    pub recovery: NaiveDateTime,
    /// First sample below the frequency set point.
    pub trigger: NaiveDateTime,
    /// `recovery - onset`, never negative.
    pub duration_secs: f64,
    /// Steepest power drop inside `[onset, recovery]`, MW/h.
    pub min_slope_mw_per_h: f64,
    pub min_slope_time: NaiveDateTime,
    /// Frequency reading at the trigger sample, Hz.
    pub frequency_hz: f64,
}

fn secs_between(earlier: NaiveDateTime, later: NaiveDateTime) -> f64 {
    (later - earlier).num_milliseconds() as f64 / 1000.0
}

/// Cluster below-threshold samples into segments.
///
/// Two selected samples stay in one segment while their spacing is at most
/// 1.5x the nominal cadence, taken from the day's first two samples. NaN
/// frequency readings never select. One selected sample is one segment; an
/// empty selection is no segments.
pub fn segment_active(
    timestamps: &[NaiveDateTime],
    values: &[f64],
    threshold: f64,
) -> Vec<Segment> {
    let selected: Vec<usize> = values
        .iter()
        .enumerate()
        .filter(|&(_, &v)| v < threshold)
        .map(|(i, _)| i)
        .collect();
    if selected.is_empty() {
        return Vec::new();
    }
    let nominal = if timestamps.len() >= 2 {
        secs_between(timestamps[0], timestamps[1])
    } else {
        f64::INFINITY
    };
    let max_gap = 1.5 * nominal;

    let mut segments = Vec::new();
    let mut current = Segment {
        id: 0,
        indices: vec![selected[0]],
    };
    for pair in selected.windows(2) {
        let (prev, next) = (pair[0], pair[1]);
        if secs_between(timestamps[prev], timestamps[next]) > max_gap {
            let id = current.id;
            segments.push(current);
            current = Segment {
                id: id + 1,
                indices: vec![next],
            };
        } else {
            current.indices.push(next);
        }
    }
    segments.push(current);
    segments
}

/// Earliest sample in `[trigger - lookback, trigger]` whose slope falls
/// below `-drop_tolerance`. Falls back to the trigger itself when nothing in
/// the lookback window qualifies.
fn search_onset(slopes: &TimeSeries, trigger: NaiveDateTime, cfg: &EdacConfig) -> NaiveDateTime {
    let from = trigger - Duration::seconds(cfg.lookback_secs);
    for i in slopes.range_indices(from, trigger) {
        if slopes.values[i] < -cfg.drop_tolerance {
            return slopes.timestamps[i];
        }
    }
    trigger
}

/// First sample at or after the trigger whose slope rises above the recovery
/// tolerance. Falls back to the day's last sample when the slope never
/// turns.
fn search_recovery(slopes: &TimeSeries, trigger: NaiveDateTime, cfg: &EdacConfig) -> NaiveDateTime {
    let end = match slopes.last_timestamp() {
        Some(t) => t,
        None => return trigger,
    };
    for i in slopes.range_indices(trigger, end) {
        if slopes.values[i] > cfg.recovery_tolerance {
            return slopes.timestamps[i];
        }
    }
    end
}

/// Detect and characterize every under-frequency event in one day of
/// telemetry.
///
/// The frame must carry the canonical `freq` and `power` channels. A day
/// where nothing crosses the set point yields an empty vec; the power
/// derivative is only computed once something does. Events come back in
/// trigger order with `onset <= trigger <= recovery`.
pub fn analyze_day(day: &Frame, cfg: &EdacConfig) -> Result<Vec<EdacEvent>, AnalysisError> {
    let freq = day.series(FREQ_CHANNEL)?;
    let segments = segment_active(&day.timestamps, &freq.values, cfg.threshold_hz);
    if segments.is_empty() {
        return Ok(Vec::new());
    }

    let power = day.series(POWER_CHANNEL)?;
    let smoothed = savgol(&power, cfg.savgol_window, cfg.savgol_degree);
    let slopes = hourly_slope(&smoothed)?;

    let mut events = Vec::with_capacity(segments.len());
    for segment in &segments {
        let trigger_idx = segment.trigger_index();
        let trigger = day.timestamps[trigger_idx];
        let onset = search_onset(&slopes, trigger, cfg);
        let recovery = search_recovery(&slopes, trigger, cfg);
        let steepest = find_extremum(&slopes, onset, recovery, ExtremumMode::Min)?;
        events.push(EdacEvent {
            onset,
            recovery,
            trigger,
            duration_secs: secs_between(onset, recovery),
            min_slope_mw_per_h: steepest.value,
            min_slope_time: steepest.time,
            frequency_hz: freq.values[trigger_idx],
        });
    }
    Ok(events)
}
