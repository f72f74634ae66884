use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gridramp_lib::config::{read_config, AnalysisConfig};
use gridramp_lib::detectors::edac::analyze_day;
use gridramp_lib::io::{csv as csv_io, export};
use gridramp_lib::metrics::pv::daily_slope_summary;
use gridramp_lib::smooth::{moving_average, resample_frame};
use std::fs;
use std::path::{Path, PathBuf};

mod charts;
mod simulate;

#[derive(Parser)]
#[command(
    name = "gridramp",
    version,
    about = "Ramp-rate summaries for PV generation and under-frequency event detection for EDAC telemetry"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect under-frequency events in EDAC telemetry, day by day
    Edac {
        /// CSV with timestamp, frequency and power columns
        #[arg(long)]
        input: PathBuf,
        /// Directory for events.csv and charts
        #[arg(long, default_value = "out/edac")]
        out_dir: PathBuf,
        /// TOML file with optional [edac] and [pv] tables
        #[arg(long)]
        config: Option<PathBuf>,
        /// Frequency set point in Hz (overrides the config file)
        #[arg(long)]
        threshold_hz: Option<f64>,
        /// Onset search window before the trigger, seconds
        #[arg(long)]
        lookback_secs: Option<i64>,
        /// Slope magnitude in MW/h that marks the onset
        #[arg(long)]
        drop_tolerance: Option<f64>,
        /// Slope in MW/h above which the drop has stopped
        #[arg(long)]
        recovery_tolerance: Option<f64>,
        #[arg(long, default_value = "timestamp")]
        timestamp_col: String,
        #[arg(long, default_value = "frequency_hz")]
        frequency_col: String,
        #[arg(long, default_value = "power_mw")]
        power_col: String,
        /// Render a PNG per day that has events
        #[arg(long)]
        charts: bool,
        /// Print each event as a JSON line on stdout
        #[arg(long)]
        json: bool,
    },
    /// Summarize PV ramp slopes per day, plant and resampling interval
    Pv {
        /// Long-format CSV with timestamp, plant and value columns
        #[arg(long)]
        input: PathBuf,
        /// Directory for per-interval slopes.csv files and charts
        #[arg(long, default_value = "out/pvgen")]
        out_dir: PathBuf,
        /// TOML file with optional [edac] and [pv] tables
        #[arg(long)]
        config: Option<PathBuf>,
        /// Resampling intervals in seconds
        #[arg(long, value_delimiter = ',', default_values_t = [4u32, 60, 300, 900])]
        intervals: Vec<u32>,
        /// Moving-average width in seconds (overrides the config file)
        #[arg(long)]
        smooth_period_secs: Option<u32>,
        #[arg(long, default_value = "timestamp")]
        timestamp_col: String,
        #[arg(long, default_value = "plant")]
        plant_col: String,
        #[arg(long, default_value = "power_mw")]
        value_col: String,
        /// Render a PNG per day and channel
        #[arg(long)]
        charts: bool,
        /// Print each summary as a JSON line on stdout
        #[arg(long)]
        json: bool,
    },
    /// Write synthetic PV and EDAC telemetry for demos and tests
    Simulate {
        #[arg(long, default_value = "out/sim")]
        out_dir: PathBuf,
        #[arg(long, default_value_t = 7)]
        seed: u64,
        #[arg(long, default_value_t = 2)]
        days: u32,
        /// Under-frequency episodes per day in the EDAC stream
        #[arg(long, default_value_t = 1)]
        episodes: u32,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Edac {
            input,
            out_dir,
            config,
            threshold_hz,
            lookback_secs,
            drop_tolerance,
            recovery_tolerance,
            timestamp_col,
            frequency_col,
            power_col,
            charts,
            json,
        } => cmd_edac(
            &input,
            &out_dir,
            config.as_deref(),
            threshold_hz,
            lookback_secs,
            drop_tolerance,
            recovery_tolerance,
            &timestamp_col,
            &frequency_col,
            &power_col,
            charts,
            json,
        ),
        Commands::Pv {
            input,
            out_dir,
            config,
            intervals,
            smooth_period_secs,
            timestamp_col,
            plant_col,
            value_col,
            charts,
            json,
        } => cmd_pv(
            &input,
            &out_dir,
            config.as_deref(),
            &intervals,
            smooth_period_secs,
            &timestamp_col,
            &plant_col,
            &value_col,
            charts,
            json,
        ),
        Commands::Simulate {
            out_dir,
            seed,
            days,
            episodes,
        } => simulate::cmd_simulate(&out_dir, seed, days, episodes),
    }
}

fn load_analysis_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    match path {
        Some(p) => read_config(p),
        None => Ok(AnalysisConfig::default()),
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_edac(
    input: &Path,
    out_dir: &Path,
    config: Option<&Path>,
    threshold_hz: Option<f64>,
    lookback_secs: Option<i64>,
    drop_tolerance: Option<f64>,
    recovery_tolerance: Option<f64>,
    timestamp_col: &str,
    frequency_col: &str,
    power_col: &str,
    charts: bool,
    json: bool,
) -> Result<()> {
    let mut cfg = load_analysis_config(config)?.edac;
    if let Some(v) = threshold_hz {
        cfg.threshold_hz = v;
    }
    if let Some(v) = lookback_secs {
        cfg.lookback_secs = v;
    }
    if let Some(v) = drop_tolerance {
        cfg.drop_tolerance = v;
    }
    if let Some(v) = recovery_tolerance {
        cfg.recovery_tolerance = v;
    }

    let frame = csv_io::load_edac_csv(input, timestamp_col, frequency_col, power_col)?;
    fs::create_dir_all(out_dir).with_context(|| format!("creating {}", out_dir.display()))?;
    let chart_dir = out_dir.join("plots");
    if charts {
        fs::create_dir_all(&chart_dir)
            .with_context(|| format!("creating {}", chart_dir.display()))?;
    }

    let mut all_events = Vec::new();
    for day in frame.split_by_day() {
        let date = match day.day() {
            Some(d) => d,
            None => continue,
        };
        log::info!(
            "analyzing {} ({} samples, cadence {:?} s)",
            date,
            day.len(),
            day.nominal_interval_secs()
        );
        match analyze_day(&day, &cfg) {
            Ok(events) if events.is_empty() => {
                log::info!("{}: no samples under {} Hz", date, cfg.threshold_hz);
            }
            Ok(events) => {
                log::info!("{}: {} event(s)", date, events.len());
                if json {
                    for event in &events {
                        println!("{}", serde_json::to_string(event)?);
                    }
                }
                if charts {
                    let path = chart_dir.join(format!("{}.png", date));
                    charts::draw_edac_chart(&path, &day, &events, &cfg)?;
                }
                all_events.extend(events);
            }
            Err(err) => {
                log::warn!("skipping {}: {}", date, err);
            }
        }
    }

    let events_path = out_dir.join("events.csv");
    export::write_events_csv(&events_path, &all_events)?;
    log::info!(
        "wrote {} event(s) to {}",
        all_events.len(),
        events_path.display()
    );
    Ok(())
}

/// Directory label for a resampling interval: minutes at or above one
/// minute, seconds below.
fn interval_label(interval_secs: u32) -> String {
    if interval_secs >= 60 {
        format!("{}m", interval_secs / 60)
    } else {
        format!("{}s", interval_secs)
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_pv(
    input: &Path,
    out_dir: &Path,
    config: Option<&Path>,
    intervals: &[u32],
    smooth_period_secs: Option<u32>,
    timestamp_col: &str,
    plant_col: &str,
    value_col: &str,
    charts: bool,
    json: bool,
) -> Result<()> {
    let mut cfg = load_analysis_config(config)?.pv;
    if let Some(v) = smooth_period_secs {
        cfg.smooth_period_secs = v;
    }

    let mut frame = csv_io::load_pv_csv(input, timestamp_col, plant_col, value_col)?;
    let total = frame.total();
    frame.push_channel("Total", total.values);

    for &interval in intervals {
        let label = interval_label(interval);
        let dir = out_dir.join(&label);
        fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
        let chart_dir = dir.join("plots");
        if charts {
            fs::create_dir_all(&chart_dir)
                .with_context(|| format!("creating {}", chart_dir.display()))?;
        }

        log::info!("resampling {} channel(s) to {}", frame.channels.len(), label);
        let resampled = resample_frame(&frame, interval);

        let mut summaries = Vec::new();
        for day in resampled.split_by_day() {
            let date = match day.day() {
                Some(d) => d,
                None => continue,
            };
            for name in day.channel_names() {
                let raw = match day.series(&name) {
                    Ok(series) => series,
                    Err(err) => {
                        log::warn!("skipping {} {}: {}", date, name, err);
                        continue;
                    }
                };
                let smoothed = moving_average(&raw, cfg.smooth_period_secs);
                match daily_slope_summary(&name, &smoothed, &cfg) {
                    Ok(summary) => {
                        if json {
                            println!("{}", serde_json::to_string(&summary)?);
                        }
                        if charts {
                            let path = chart_dir.join(format!("{}-{}.png", name, date));
                            charts::draw_pv_chart(&path, &raw, &smoothed, &summary)?;
                        }
                        summaries.push(summary);
                    }
                    Err(err) => {
                        log::warn!("skipping {} {} at {}: {}", date, name, label, err);
                    }
                }
            }
        }

        let slopes_path = dir.join("slopes.csv");
        export::write_slopes_csv(&slopes_path, &summaries)?;
        log::info!(
            "wrote {} summaries to {}",
            summaries.len(),
            slopes_path.display()
        );
    }
    Ok(())
}
