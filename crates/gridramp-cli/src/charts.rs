//! PNG rendering for the two chart styles: a per-day PV curve with its
//! extremum annotations, and a per-day EDAC chart with shed load on the
//! primary axis and grid frequency on a secondary one.

use anyhow::Result;
use chrono::{NaiveDateTime, Timelike};
use gridramp_lib::detectors::edac::{EdacConfig, EdacEvent};
use gridramp_lib::frame::{Frame, FREQ_CHANNEL, POWER_CHANNEL};
use gridramp_lib::metrics::pv::{hour_block, SlopeSummary};
use gridramp_lib::plot::{annotation_offsets, decimate_points, palette, Color};
use gridramp_lib::series::TimeSeries;
use gridramp_lib::smooth::savgol;
use plotters::prelude::*;
use std::path::Path;

const CHART_SIZE: (u32, u32) = (1100, 620);
const NOMINAL_HZ: f64 = 60.0;
const MAX_LINE_POINTS: usize = 4096;

fn rgb(color: Color) -> RGBColor {
    let (r, g, b) = color.rgb();
    RGBColor(r, g, b)
}

/// Fractional hour of day, the x coordinate of every chart.
fn hour_of_day(t: NaiveDateTime) -> f64 {
    f64::from(t.hour()) + f64::from(t.minute()) / 60.0 + f64::from(t.second()) / 3600.0
}

fn series_points(series: &TimeSeries) -> Vec<(f64, f64)> {
    series
        .iter()
        .filter(|(_, v)| !v.is_nan())
        .map(|(t, v)| (hour_of_day(t), v))
        .collect()
}

/// Value range with 15% headroom on both sides.
fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values {
        if v.is_nan() {
            continue;
        }
        min = min.min(v);
        max = max.max(v);
    }
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    let span = max - min;
    let pad = if span < 1e-6 { 0.5 } else { span * 0.15 };
    (min - pad, max + pad)
}

fn finite_mean(values: &[f64]) -> f64 {
    let mut acc = 0.0;
    let mut count = 0usize;
    for &v in values {
        if !v.is_nan() {
            acc += v;
            count += 1;
        }
    }
    if count == 0 {
        0.0
    } else {
        acc / count as f64
    }
}

/// One PV channel for one day: measured curve, smoothed curve, shaded hour
/// blocks around the two extrema, and offset slope labels.
pub fn draw_pv_chart(
    path: &Path,
    raw: &TimeSeries,
    smoothed: &TimeSeries,
    summary: &SlopeSummary,
) -> Result<()> {
    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let raw_points = decimate_points(&series_points(raw), MAX_LINE_POINTS);
    let smooth_points = decimate_points(&series_points(smoothed), MAX_LINE_POINTS);
    let (y_min, y_max) = padded_range(
        raw.values
            .iter()
            .copied()
            .chain(smoothed.values.iter().copied()),
    );
    let y_min = y_min.min(0.0);

    let mut chart = ChartBuilder::on(&root)
        .margin(12)
        .caption(
            format!("{} {}", summary.channel, summary.day),
            ("sans-serif", 26),
        )
        .x_label_area_size(36)
        .y_label_area_size(56)
        .build_cartesian_2d(0.0..24.0, y_min..y_max)?;
    chart
        .configure_mesh()
        .x_desc("Hour of day")
        .y_desc("Power (MW)")
        .x_labels(13)
        .light_line_style(WHITE.mix(0.7))
        .draw()?;

    // hour blocks holding the extrema go under the curves
    for (time, color) in [
        (summary.max_time, palette::PASTEL_GREEN),
        (summary.min_time, palette::MINT),
    ] {
        let (start, end) = hour_block(time);
        let x0 = hour_of_day(start);
        let x1 = if end.date() != start.date() {
            24.0
        } else {
            hour_of_day(end)
        };
        chart.draw_series(std::iter::once(Rectangle::new(
            [(x0, y_min), (x1, y_max)],
            rgb(color).mix(0.35).filled(),
        )))?;
    }

    chart
        .draw_series(LineSeries::new(raw_points, &rgb(palette::LIGHT_GRAY)))?
        .label("measured")
        .legend(|(x, y)| {
            PathElement::new(vec![(x, y), (x + 18, y)], rgb(palette::LIGHT_GRAY))
        });
    chart
        .draw_series(LineSeries::new(
            smooth_points,
            rgb(palette::SLATE).stroke_width(2),
        ))?
        .label("smoothed")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 18, y)], rgb(palette::SLATE)));

    let mean = finite_mean(&smoothed.values);
    let max_y = smoothed.value_at(summary.max_time).unwrap_or(0.0);
    let min_y = smoothed.value_at(summary.min_time).unwrap_or(0.0);
    let hours_apart = hour_of_day(summary.max_time) - hour_of_day(summary.min_time);
    let [max_off, min_off] = annotation_offsets(
        hour_of_day(summary.max_time) / 24.0,
        max_y > mean,
        hour_of_day(summary.min_time) / 24.0,
        min_y > mean,
        hours_apart,
    );

    let annotations = [
        (
            summary.max_time,
            max_y,
            max_off,
            format!("max {:.1} MW/h ({})", summary.max_slope_mw_per_h, summary.max_period),
        ),
        (
            summary.min_time,
            min_y,
            min_off,
            format!("min {:.1} MW/h ({})", summary.min_slope_mw_per_h, summary.min_period),
        ),
    ];
    for (time, y, (dx, dy), text) in annotations {
        chart.draw_series(std::iter::once(
            EmptyElement::at((hour_of_day(time), y))
                + Circle::new((0, 0), 4, rgb(palette::TURQUOISE).filled())
                + Text::new(text, (dx as i32, -dy as i32), ("sans-serif", 15)),
        ))?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.85))
        .border_style(rgb(palette::LIGHT_GRAY))
        .draw()?;
    root.present()?;
    Ok(())
}

/// One EDAC day: smoothed shed load with the frequency trace on a secondary
/// axis, reference lines at the nominal frequency and the set point, and a
/// shaded span per event.
pub fn draw_edac_chart(
    path: &Path,
    day: &Frame,
    events: &[EdacEvent],
    cfg: &EdacConfig,
) -> Result<()> {
    let power = day.series(POWER_CHANNEL)?;
    let freq = day.series(FREQ_CHANNEL)?;
    let smoothed = savgol(&power, cfg.savgol_window, cfg.savgol_degree);

    let power_points = decimate_points(&series_points(&smoothed), MAX_LINE_POINTS);
    let freq_points = decimate_points(&series_points(&freq), MAX_LINE_POINTS);
    let (p_min, p_max) = padded_range(smoothed.values.iter().copied());
    let (f_min, f_max) = padded_range(
        freq.values
            .iter()
            .copied()
            .chain([NOMINAL_HZ, cfg.threshold_hz]),
    );
    let date = day.day().map(|d| d.to_string()).unwrap_or_default();

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .margin(12)
        .caption(format!("EDAC {}", date), ("sans-serif", 26))
        .x_label_area_size(36)
        .y_label_area_size(56)
        .right_y_label_area_size(56)
        .build_cartesian_2d(0.0..24.0, p_min..p_max)?
        .set_secondary_coord(0.0..24.0, f_min..f_max);

    chart
        .configure_mesh()
        .x_desc("Hour of day")
        .y_desc("Shed load (MW)")
        .x_labels(13)
        .light_line_style(WHITE.mix(0.7))
        .draw()?;
    chart
        .configure_secondary_axes()
        .y_desc("Frequency (Hz)")
        .draw()?;

    for event in events {
        chart.draw_series(std::iter::once(Rectangle::new(
            [
                (hour_of_day(event.onset), p_min),
                (hour_of_day(event.recovery), p_max),
            ],
            rgb(palette::PASTEL_GREEN).mix(0.3).filled(),
        )))?;
    }

    chart
        .draw_series(LineSeries::new(
            power_points,
            rgb(palette::NAVY).stroke_width(2),
        ))?
        .label("shed load")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 18, y)], rgb(palette::NAVY)));
    chart
        .draw_secondary_series(LineSeries::new(freq_points, &rgb(palette::TEAL)))?
        .label("frequency")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 18, y)], rgb(palette::TEAL)));

    // dashed reference lines, drawn as alternating segments
    for (y, color) in [
        (NOMINAL_HZ, palette::LIGHT_GRAY),
        (cfg.threshold_hz, palette::TURQUOISE),
    ] {
        let mut x = 0.0;
        while x < 24.0 {
            chart.draw_secondary_series(LineSeries::new(
                vec![(x, y), ((x + 0.3).min(24.0), y)],
                rgb(color).stroke_width(1),
            ))?;
            x += 0.6;
        }
    }

    for event in events {
        let y = smoothed.value_at(event.min_slope_time).unwrap_or(0.0);
        chart.draw_series(std::iter::once(
            EmptyElement::at((hour_of_day(event.min_slope_time), y))
                + Circle::new((0, 0), 4, rgb(palette::INK).filled())
                + Text::new(
                    format!("{:.2} MW/s", event.min_slope_mw_per_h / 3600.0),
                    (8, -14),
                    ("sans-serif", 14),
                ),
        ))?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::LowerRight)
        .background_style(WHITE.mix(0.85))
        .border_style(rgb(palette::LIGHT_GRAY))
        .draw()?;
    root.present()?;
    Ok(())
}
