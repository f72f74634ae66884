//! CSV loaders for the two telemetry exports.
//!
//! EDAC telemetry is wide: one row per timestamp with frequency and power
//! columns. PV generation arrives long: one row per (timestamp, plant) pair,
//! pivoted here into a frame with one channel per plant.

use crate::frame::{Frame, FREQ_CHANNEL, POWER_CHANNEL};
use anyhow::{bail, Context, Result};
use chrono::NaiveDateTime;
use csv::{ReaderBuilder, StringRecord};
use std::fs::File;
use std::path::Path;

/// Parse `%Y-%m-%d %H:%M:%S`, tolerating a `T` separator.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .with_context(|| format!("unrecognized timestamp {:?}", raw))
}

fn locate_column(headers: &StringRecord, requested: &str, hint: &str) -> Result<usize> {
    headers
        .iter()
        .position(|name| name.trim().eq_ignore_ascii_case(requested))
        .ok_or_else(|| anyhow::anyhow!("missing {} column ({})", hint, requested))
}

/// Empty or unparseable cells load as NaN, the same representation used for
/// empty resample bins.
fn parse_value(field: Option<&str>) -> f64 {
    field
        .and_then(|v| v.trim().parse::<f64>().ok())
        .unwrap_or(f64::NAN)
}

fn ensure_increasing(timestamps: &[NaiveDateTime], path: &Path) -> Result<()> {
    for pair in timestamps.windows(2) {
        if pair[1] <= pair[0] {
            bail!(
                "timestamps not strictly increasing in {} (at {})",
                path.display(),
                pair[1]
            );
        }
    }
    Ok(())
}

/// Read EDAC telemetry into a frame with the canonical `freq` and `power`
/// channels.
pub fn load_edac_csv(
    path: &Path,
    timestamp_col: &str,
    frequency_col: &str,
    power_col: &str,
) -> Result<Frame> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);
    let headers = reader.headers().context("reading header")?.clone();
    let ts_idx = locate_column(&headers, timestamp_col, "timestamp")?;
    let freq_idx = locate_column(&headers, frequency_col, "frequency")?;
    let power_idx = locate_column(&headers, power_col, "power")?;

    let mut timestamps = Vec::new();
    let mut freq = Vec::new();
    let mut power = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("reading row {}", row + 2))?;
        let raw_ts = record
            .get(ts_idx)
            .ok_or_else(|| anyhow::anyhow!("missing timestamp in row {}", row + 2))?;
        timestamps.push(parse_timestamp(raw_ts).with_context(|| format!("row {}", row + 2))?);
        freq.push(parse_value(record.get(freq_idx)));
        power.push(parse_value(record.get(power_idx)));
    }
    ensure_increasing(&timestamps, path)?;

    let mut frame = Frame::new(timestamps);
    frame.push_channel(FREQ_CHANNEL, freq);
    frame.push_channel(POWER_CHANNEL, power);
    Ok(frame)
}

/// Read a long-format PV export and pivot it into one channel per plant.
///
/// Channels keep the order in which plants first appear in the file. A
/// (timestamp, plant) pair absent from the file loads as NaN.
pub fn load_pv_csv(
    path: &Path,
    timestamp_col: &str,
    plant_col: &str,
    value_col: &str,
) -> Result<Frame> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);
    let headers = reader.headers().context("reading header")?.clone();
    let ts_idx = locate_column(&headers, timestamp_col, "timestamp")?;
    let plant_idx = locate_column(&headers, plant_col, "plant")?;
    let value_idx = locate_column(&headers, value_col, "value")?;

    let mut rows: Vec<(NaiveDateTime, String, f64)> = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("reading row {}", row + 2))?;
        let raw_ts = record
            .get(ts_idx)
            .ok_or_else(|| anyhow::anyhow!("missing timestamp in row {}", row + 2))?;
        let plant = record
            .get(plant_idx)
            .ok_or_else(|| anyhow::anyhow!("missing plant in row {}", row + 2))?
            .trim()
            .to_string();
        let ts = parse_timestamp(raw_ts).with_context(|| format!("row {}", row + 2))?;
        rows.push((ts, plant, parse_value(record.get(value_idx))));
    }
    if rows.is_empty() {
        bail!("no data rows in {}", path.display());
    }

    let mut timestamps: Vec<NaiveDateTime> = rows.iter().map(|r| r.0).collect();
    timestamps.sort_unstable();
    timestamps.dedup();

    let mut plants: Vec<String> = Vec::new();
    for (_, plant, _) in &rows {
        if !plants.iter().any(|p| p == plant) {
            plants.push(plant.clone());
        }
    }

    let mut frame = Frame::new(timestamps.clone());
    for plant in &plants {
        frame.push_channel(plant.clone(), vec![f64::NAN; timestamps.len()]);
    }
    for (ts, plant, value) in rows {
        if let (Ok(row), Some(col)) = (
            timestamps.binary_search(&ts),
            plants.iter().position(|p| p == &plant),
        ) {
            frame.channels[col].values[row] = value;
        }
    }
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn workspace_root() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .parent()
            .and_then(|p| p.parent())
            .expect("workspace root")
            .to_path_buf()
    }

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write");
        file
    }

    #[test]
    fn edac_fixture_loads_with_canonical_channels() {
        let path = workspace_root().join("test_data/edac_sample.csv");
        let frame = load_edac_csv(&path, "timestamp", "frequency_hz", "power_mw").unwrap();
        assert_eq!(frame.len(), 5);
        assert_eq!(frame.channel_names(), vec!["freq", "power"]);
        assert_eq!(frame.nominal_interval_secs(), Some(2.0));
        let freq = frame.channel(FREQ_CHANNEL).unwrap();
        assert!((freq[2] - 59.25).abs() < 1e-9);
        // the last power cell is blank in the fixture
        let power = frame.channel(POWER_CHANNEL).unwrap();
        assert!(power[4].is_nan());
    }

    #[test]
    fn pv_fixture_pivots_long_rows_into_plant_channels() {
        let path = workspace_root().join("test_data/pv_sample.csv");
        let frame = load_pv_csv(&path, "timestamp", "plant", "power_mw").unwrap();
        assert_eq!(frame.channel_names(), vec!["PVA", "PVB"]);
        assert_eq!(frame.len(), 4);
        let pvb = frame.channel("PVB").unwrap();
        // PVB has no row at 08:00:04
        assert!((pvb[0] - 8.0).abs() < 1e-9);
        assert!(pvb[1].is_nan());
        assert!((pvb[2] - 8.4).abs() < 1e-9);
        assert_eq!(frame.split_by_day().len(), 2);
    }

    #[test]
    fn both_timestamp_separators_parse() {
        assert!(parse_timestamp("2024-03-14 10:00:00").is_ok());
        assert!(parse_timestamp("2024-03-14T10:00:00").is_ok());
        assert!(parse_timestamp("14/03/2024 10:00").is_err());
    }

    #[test]
    fn out_of_order_timestamps_are_rejected() {
        let file = write_temp(
            "timestamp,frequency_hz,power_mw\n\
             2024-03-14 10:00:02,60.0,5.0\n\
             2024-03-14 10:00:00,60.0,5.0\n",
        );
        let err = load_edac_csv(file.path(), "timestamp", "frequency_hz", "power_mw").unwrap_err();
        assert!(err.to_string().contains("strictly increasing"));
    }

    #[test]
    fn a_missing_column_names_the_request() {
        let file = write_temp("timestamp,hz\n2024-03-14 10:00:00,60.0\n");
        let err = load_edac_csv(file.path(), "timestamp", "frequency_hz", "power_mw").unwrap_err();
        assert!(err.to_string().contains("frequency_hz"));
    }
}
