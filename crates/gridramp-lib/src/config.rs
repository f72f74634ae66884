use crate::detectors::edac::EdacConfig;
use crate::metrics::pv::PvConfig;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Analysis settings loadable from a TOML file.
///
/// Both tables and every field inside them are optional; anything missing
/// falls back to the built-in defaults, so a config file only needs to name
/// what it changes.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub edac: EdacConfig,
    pub pv: PvConfig,
}

pub fn read_config(path: &Path) -> Result<AnalysisConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config: AnalysisConfig =
        toml::from_str(&contents).with_context(|| format!("parsing config {}", path.display()))?;
    Ok(config)
}
