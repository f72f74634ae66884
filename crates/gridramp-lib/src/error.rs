use chrono::NaiveDateTime;
use thiserror::Error;

/// Failures raised by the analysis routines.
///
/// A day where nothing crosses the frequency threshold, or a boundary search
/// that finds no qualifying sample, is not an error; those cases resolve to
/// empty results or documented fallbacks. These variants mark input that is
/// genuinely unusable or a query that selects nothing at all.
#[derive(Debug, Error, PartialEq)]
pub enum AnalysisError {
    /// Differencing needs a predecessor for at least one sample.
    #[error("series has {len} sample(s), need at least 2 for a derivative")]
    TooFewSamples { len: usize },

    /// An extremum query over a time interval found no finite sample.
    #[error("no finite samples between {from} and {to}")]
    EmptyInterval {
        from: NaiveDateTime,
        to: NaiveDateTime,
    },

    /// A time-of-day extremum window selected no finite sample.
    #[error("no finite samples in hour window [{start_hour}, {end_hour})")]
    EmptyHourWindow { start_hour: u32, end_hour: u32 },

    /// A frame was asked for a channel it does not carry.
    #[error("channel {name:?} not present in frame")]
    MissingChannel { name: String },
}
