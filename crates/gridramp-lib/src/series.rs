use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// One value channel over an explicit timestamp axis.
///
/// Timestamps are strictly increasing. A value of NaN means the grid point
/// exists but carries no data: an empty resample bin, an unparseable cell,
/// or the first sample of a derivative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSeries {
    pub timestamps: Vec<NaiveDateTime>,
    pub values: Vec<f64>,
}

impl TimeSeries {
    pub fn new(timestamps: Vec<NaiveDateTime>, values: Vec<f64>) -> Self {
        debug_assert_eq!(timestamps.len(), values.len());
        Self { timestamps, values }
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Nominal sampling interval in seconds, taken from the first two
    /// samples. The telemetry cadence is established the same way.
    pub fn nominal_interval_secs(&self) -> Option<f64> {
        if self.timestamps.len() < 2 {
            return None;
        }
        let step = self.timestamps[1] - self.timestamps[0];
        Some(step.num_milliseconds() as f64 / 1000.0)
    }

    pub fn first_timestamp(&self) -> Option<NaiveDateTime> {
        self.timestamps.first().copied()
    }

    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.timestamps.last().copied()
    }

    /// Calendar date of the first sample.
    pub fn day(&self) -> Option<NaiveDate> {
        self.first_timestamp().map(|t| t.date())
    }

    /// Index range of the samples with `from <= t <= to`.
    pub fn range_indices(&self, from: NaiveDateTime, to: NaiveDateTime) -> Range<usize> {
        let start = self.timestamps.partition_point(|&t| t < from);
        let end = self.timestamps.partition_point(|&t| t <= to);
        start..end.max(start)
    }

    /// Value at an exact timestamp, if one exists on the axis.
    pub fn value_at(&self, t: NaiveDateTime) -> Option<f64> {
        let idx = self.timestamps.binary_search(&t).ok()?;
        Some(self.values[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDateTime, f64)> + '_ {
        self.timestamps
            .iter()
            .copied()
            .zip(self.values.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn t(secs: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 14)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
            + chrono::Duration::seconds(secs as i64)
    }

    fn sample_series() -> TimeSeries {
        TimeSeries::new(vec![t(0), t(2), t(4), t(6)], vec![1.0, 2.0, 3.0, 4.0])
    }

    #[test]
    fn nominal_interval_from_first_two_samples() {
        let series = sample_series();
        assert_eq!(series.nominal_interval_secs(), Some(2.0));

        let single = TimeSeries::new(vec![t(0)], vec![1.0]);
        assert_eq!(single.nominal_interval_secs(), None);
    }

    #[test]
    fn range_indices_are_inclusive_on_both_ends() {
        let series = sample_series();
        assert_eq!(series.range_indices(t(2), t(4)), 1..3);
        assert_eq!(series.range_indices(t(1), t(5)), 1..3);
        assert_eq!(series.range_indices(t(0), t(6)), 0..4);
        assert!(series.range_indices(t(7), t(9)).is_empty());
        assert!(series.range_indices(t(5), t(3)).is_empty());
    }

    #[test]
    fn value_at_requires_exact_timestamp() {
        let series = sample_series();
        assert_eq!(series.value_at(t(4)), Some(3.0));
        assert_eq!(series.value_at(t(3)), None);
    }
}
