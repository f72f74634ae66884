pub mod config;
pub mod detectors;
pub mod error;
pub mod frame;
pub mod io;
pub mod metrics;
pub mod plot;
pub mod series;
pub mod slope;
pub mod smooth;

pub use error::AnalysisError;
pub use frame::*;
pub use series::*;
