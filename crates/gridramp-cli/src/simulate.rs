//! Synthetic telemetry generator. The PV stream is a clear-sky bell per
//! plant with mild noise; the EDAC stream is a steady baseline with
//! scheduled under-frequency episodes whose power ramp starts shortly
//! before the frequency crosses the set point, the same lead the detector
//! searches for.

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, NaiveTime};
use csv::WriterBuilder;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs;
use std::path::Path;

const PV_STEP_SECS: i64 = 4;
const EDAC_STEP_SECS: i64 = 2;
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn cmd_simulate(out_dir: &Path, seed: u64, days: u32, episodes: u32) -> Result<()> {
    fs::create_dir_all(out_dir).with_context(|| format!("creating {}", out_dir.display()))?;
    let start = NaiveDate::from_ymd_opt(2024, 3, 11).context("calendar start date")?;
    let mut rng = StdRng::seed_from_u64(seed);

    let pv_path = out_dir.join("pv.csv");
    write_pv(&pv_path, start, days, &mut rng)?;
    log::info!("wrote {}", pv_path.display());

    let edac_path = out_dir.join("edac.csv");
    write_edac(&edac_path, start, days, episodes, &mut rng)?;
    log::info!("wrote {}", edac_path.display());
    Ok(())
}

fn write_pv(path: &Path, start: NaiveDate, days: u32, rng: &mut StdRng) -> Result<()> {
    let file = fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = WriterBuilder::new().from_writer(file);
    writer.write_record(["timestamp", "plant", "power_mw"])?;

    let plants = [("PV1", 52.0), ("PV2", 30.0)];
    for day in 0..days {
        let midnight = (start + Duration::days(i64::from(day))).and_time(NaiveTime::MIN);
        let mut t = 0i64;
        while t < 86_400 {
            let ts = midnight + Duration::seconds(t);
            let hour = t as f64 / 3600.0;
            for (plant, cap) in plants {
                let clear_sky = if (6.0..19.0).contains(&hour) {
                    let x = (hour - 12.5) / 3.2;
                    cap * (-x * x).exp()
                } else {
                    0.0
                };
                let noise = rng.gen_range(-0.4..0.4) * (clear_sky / 10.0).min(1.0);
                let value = (clear_sky + noise).max(0.0);
                writer.write_record([
                    ts.format(TIME_FORMAT).to_string(),
                    plant.to_string(),
                    format!("{:.3}", value),
                ])?;
            }
            t += PV_STEP_SECS;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Seconds-of-day spans `(ramp_start, bottom, recovered)` for one day's
/// episodes, kept well apart so each forms its own segment.
fn schedule_episodes(episodes: u32, rng: &mut StdRng) -> Vec<(i64, i64, i64)> {
    let mut starts: Vec<i64> = (0..episodes)
        .map(|_| rng.gen_range(9_000..70_000))
        .collect();
    starts.sort_unstable();
    for i in 1..starts.len() {
        if starts[i] < starts[i - 1] + 1_200 {
            starts[i] = starts[i - 1] + 1_200;
        }
    }
    starts
        .into_iter()
        .map(|s| {
            let drop = 40 + rng.gen_range(0..20);
            let recover = 60 + rng.gen_range(0..30);
            (s, s + drop, s + drop + recover)
        })
        .collect()
}

fn write_edac(
    path: &Path,
    start: NaiveDate,
    days: u32,
    episodes: u32,
    rng: &mut StdRng,
) -> Result<()> {
    let file = fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = WriterBuilder::new().from_writer(file);
    writer.write_record(["timestamp", "frequency_hz", "power_mw"])?;

    for day in 0..days {
        let midnight = (start + Duration::days(i64::from(day))).and_time(NaiveTime::MIN);
        let spans = schedule_episodes(episodes, rng);
        let mut t = 0i64;
        while t < 86_400 {
            let (freq, power) = sample_edac(t, &spans, rng);
            writer.write_record([
                (midnight + Duration::seconds(t)).format(TIME_FORMAT).to_string(),
                format!("{:.3}", freq),
                format!("{:.3}", power),
            ])?;
            t += EDAC_STEP_SECS;
        }
    }
    writer.flush()?;
    Ok(())
}

fn sample_edac(t: i64, spans: &[(i64, i64, i64)], rng: &mut StdRng) -> (f64, f64) {
    let base_freq = 60.0 + rng.gen_range(-0.015..0.015);
    let base_power = 150.0 + rng.gen_range(-0.5..0.5);
    for &(start, bottom, recovered) in spans {
        // the shed-load ramp leads the frequency crossing by 10 s
        let lead = start - 10;
        if t >= lead && t < bottom {
            let frac = (t - lead) as f64 / (bottom - lead) as f64;
            let freq = if t >= start {
                58.6 + rng.gen_range(-0.05..0.05)
            } else {
                base_freq
            };
            return (freq, 150.0 - 70.0 * frac);
        }
        if t >= bottom && t < recovered {
            let frac = (t - bottom) as f64 / (recovered - bottom) as f64;
            return (base_freq, 80.0 + 70.0 * frac);
        }
    }
    (base_freq, base_power)
}
