use crate::error::AnalysisError;
use crate::series::TimeSeries;
use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Which end of the ordering an extremum query looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtremumMode {
    Min,
    Max,
}

/// An extremal sample of a derivative series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extremum {
    pub time: NaiveDateTime,
    pub value: f64,
}

/// Backward difference scaled to a per-hour rate, using the actual spacing
/// between each pair of consecutive timestamps.
///
/// Across a data gap the difference spreads over the real elapsed time
/// instead of pretending the cadence held. The first sample has no
/// predecessor and is NaN.
pub fn hourly_slope(series: &TimeSeries) -> Result<TimeSeries, AnalysisError> {
    if series.len() < 2 {
        return Err(AnalysisError::TooFewSamples { len: series.len() });
    }
    let mut values = Vec::with_capacity(series.len());
    values.push(f64::NAN);
    for i in 1..series.len() {
        let step = series.timestamps[i] - series.timestamps[i - 1];
        let hours = step.num_milliseconds() as f64 / 3_600_000.0;
        values.push((series.values[i] - series.values[i - 1]) / hours);
    }
    Ok(TimeSeries::new(series.timestamps.clone(), values))
}

fn improves(mode: ExtremumMode, candidate: f64, incumbent: f64) -> bool {
    match mode {
        ExtremumMode::Min => candidate < incumbent,
        ExtremumMode::Max => candidate > incumbent,
    }
}

/// Extremal sample within the closed interval `[from, to]`.
///
/// NaN samples are never candidates and ties resolve to the earliest
/// timestamp. An interval with no finite sample at all is reported as an
/// error so a mis-sized window does not pass silently.
pub fn find_extremum(
    series: &TimeSeries,
    from: NaiveDateTime,
    to: NaiveDateTime,
    mode: ExtremumMode,
) -> Result<Extremum, AnalysisError> {
    let mut best: Option<Extremum> = None;
    for i in series.range_indices(from, to) {
        let value = series.values[i];
        if value.is_nan() {
            continue;
        }
        if best.map_or(true, |b| improves(mode, value, b.value)) {
            best = Some(Extremum {
                time: series.timestamps[i],
                value,
            });
        }
    }
    best.ok_or(AnalysisError::EmptyInterval { from, to })
}

/// Extremal sample among those whose time of day falls in the hour window
/// `[start_hour, end_hour)`.
pub fn find_extremum_in_hours(
    series: &TimeSeries,
    start_hour: u32,
    end_hour: u32,
    mode: ExtremumMode,
) -> Result<Extremum, AnalysisError> {
    let mut best: Option<Extremum> = None;
    for (time, value) in series.iter() {
        let hour = time.hour();
        if hour < start_hour || hour >= end_hour || value.is_nan() {
            continue;
        }
        if best.map_or(true, |b| improves(mode, value, b.value)) {
            best = Some(Extremum { time, value });
        }
    }
    best.ok_or(AnalysisError::EmptyHourWindow {
        start_hour,
        end_hour,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 14)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn assert_close(a: f64, b: f64, tol: f64) {
        assert!((a - b).abs() < tol, "{} vs {}", a, b);
    }

    #[test]
    fn slope_uses_the_local_timestamp_spacing() {
        // 2 s cadence with a 10 s hole before the last sample
        let series = TimeSeries::new(
            vec![at(10, 0, 0), at(10, 0, 2), at(10, 0, 4), at(10, 0, 14)],
            vec![100.0, 99.0, 99.0, 104.0],
        );
        let slopes = hourly_slope(&series).unwrap();
        assert!(slopes.values[0].is_nan());
        assert_close(slopes.values[1], -1.0 / (2.0 / 3600.0), 1e-9);
        assert_close(slopes.values[2], 0.0, 1e-9);
        assert_close(slopes.values[3], 5.0 / (10.0 / 3600.0), 1e-9);
    }

    #[test]
    fn slope_needs_two_samples() {
        let series = TimeSeries::new(vec![at(10, 0, 0)], vec![1.0]);
        assert_eq!(
            hourly_slope(&series).unwrap_err(),
            AnalysisError::TooFewSamples { len: 1 }
        );
    }

    #[test]
    fn extremum_ties_resolve_to_the_earliest_sample() {
        let series = TimeSeries::new(
            (0..5).map(|i| at(10, i, 0)).collect(),
            vec![3.0, 7.0, 2.0, 7.0, 2.0],
        );
        let max = find_extremum(&series, at(10, 0, 0), at(10, 4, 0), ExtremumMode::Max).unwrap();
        assert_eq!(max.time, at(10, 1, 0));
        let min = find_extremum(&series, at(10, 0, 0), at(10, 4, 0), ExtremumMode::Min).unwrap();
        assert_eq!(min.time, at(10, 2, 0));
    }

    #[test]
    fn extremum_skips_nan_and_honors_the_interval() {
        let series = TimeSeries::new(
            (0..4).map(|i| at(10, i, 0)).collect(),
            vec![f64::NAN, 5.0, 9.0, 1.0],
        );
        let max = find_extremum(&series, at(10, 0, 0), at(10, 1, 0), ExtremumMode::Max).unwrap();
        assert_eq!(max.time, at(10, 1, 0));
        assert_close(max.value, 5.0, 1e-12);
    }

    #[test]
    fn empty_interval_is_an_error() {
        let series = TimeSeries::new(vec![at(10, 0, 0), at(10, 1, 0)], vec![f64::NAN, 2.0]);
        let err =
            find_extremum(&series, at(10, 0, 0), at(10, 0, 30), ExtremumMode::Min).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::EmptyInterval {
                from: at(10, 0, 0),
                to: at(10, 0, 30),
            }
        );
    }

    #[test]
    fn hour_window_is_half_open() {
        let timestamps: Vec<NaiveDateTime> =
            (0..5).map(|i| at(9, 0, 0) + Duration::hours(i)).collect();
        let series = TimeSeries::new(timestamps, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        // [10, 12) sees the 10:00 and 11:00 samples only
        let max = find_extremum_in_hours(&series, 10, 12, ExtremumMode::Max).unwrap();
        assert_eq!(max.time, at(11, 0, 0));
        assert_close(max.value, 3.0, 1e-12);
    }

    #[test]
    fn flat_series_reports_the_first_in_window_sample() {
        let timestamps: Vec<NaiveDateTime> =
            (0..6).map(|i| at(6, 0, 0) + Duration::minutes(30 * i)).collect();
        let series = TimeSeries::new(timestamps, vec![0.0; 6]);
        let max = find_extremum_in_hours(&series, 7, 9, ExtremumMode::Max).unwrap();
        let min = find_extremum_in_hours(&series, 7, 9, ExtremumMode::Min).unwrap();
        assert_eq!(max.time, at(7, 0, 0));
        assert_eq!(min.time, at(7, 0, 0));
        assert_close(max.value, 0.0, 1e-12);
    }

    #[test]
    fn empty_hour_window_is_an_error() {
        let series = TimeSeries::new(vec![at(3, 0, 0), at(4, 0, 0)], vec![1.0, 2.0]);
        let err = find_extremum_in_hours(&series, 6, 11, ExtremumMode::Max).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::EmptyHourWindow {
                start_hour: 6,
                end_hour: 11,
            }
        );
    }
}
