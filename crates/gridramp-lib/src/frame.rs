use crate::error::AnalysisError;
use crate::series::TimeSeries;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Canonical channel names produced by the EDAC loader.
pub const FREQ_CHANNEL: &str = "freq";
pub const POWER_CHANNEL: &str = "power";

/// Named value channels sharing one strictly increasing timestamp axis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    pub timestamps: Vec<NaiveDateTime>,
    pub channels: Vec<Channel>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub name: String,
    pub values: Vec<f64>,
}

impl Frame {
    pub fn new(timestamps: Vec<NaiveDateTime>) -> Self {
        Self {
            timestamps,
            channels: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn push_channel(&mut self, name: impl Into<String>, values: Vec<f64>) {
        debug_assert_eq!(values.len(), self.timestamps.len());
        self.channels.push(Channel {
            name: name.into(),
            values,
        });
    }

    pub fn channel_names(&self) -> Vec<String> {
        self.channels.iter().map(|c| c.name.clone()).collect()
    }

    pub fn channel(&self, name: &str) -> Option<&[f64]> {
        self.channels
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Extract one channel as an owned series.
    pub fn series(&self, name: &str) -> Result<TimeSeries, AnalysisError> {
        let values = self.channel(name).ok_or_else(|| AnalysisError::MissingChannel {
            name: name.to_string(),
        })?;
        Ok(TimeSeries::new(self.timestamps.clone(), values.to_vec()))
    }

    /// Nominal sampling interval in seconds, from the first two samples.
    pub fn nominal_interval_secs(&self) -> Option<f64> {
        if self.timestamps.len() < 2 {
            return None;
        }
        let step = self.timestamps[1] - self.timestamps[0];
        Some(step.num_milliseconds() as f64 / 1000.0)
    }

    /// Calendar date of the first sample.
    pub fn day(&self) -> Option<NaiveDate> {
        self.timestamps.first().map(|t| t.date())
    }

    /// Split into per-day frames, chronological. Each day is analyzed on its
    /// own, so nothing here carries state across the boundary.
    pub fn split_by_day(&self) -> Vec<Frame> {
        let mut days = Vec::new();
        let mut start = 0usize;
        while start < self.timestamps.len() {
            let date = self.timestamps[start].date();
            let mut end = start + 1;
            while end < self.timestamps.len() && self.timestamps[end].date() == date {
                end += 1;
            }
            let mut day = Frame::new(self.timestamps[start..end].to_vec());
            for ch in &self.channels {
                day.push_channel(ch.name.clone(), ch.values[start..end].to_vec());
            }
            days.push(day);
            start = end;
        }
        days
    }

    /// Row-wise sum over all channels. NaN cells are skipped; a row where
    /// every channel is NaN stays NaN.
    pub fn total(&self) -> TimeSeries {
        let mut values = Vec::with_capacity(self.timestamps.len());
        for i in 0..self.timestamps.len() {
            let mut acc = 0.0;
            let mut seen = false;
            for ch in &self.channels {
                let v = ch.values[i];
                if !v.is_nan() {
                    acc += v;
                    seen = true;
                }
            }
            values.push(if seen { acc } else { f64::NAN });
        }
        TimeSeries::new(self.timestamps.clone(), values)
    }
}
