use crate::frame::Frame;
use crate::series::TimeSeries;
use chrono::{Duration, NaiveTime};

/// Average samples into equal-width bins of `interval_secs`, anchored at
/// midnight of the first sample's day and labeled by the left bin edge.
///
/// Every bin between the first and last occupied bin is emitted, so gaps in
/// the input become NaN rows on the output grid. A series already on the
/// target grid resamples to itself.
pub fn resample(series: &TimeSeries, interval_secs: u32) -> TimeSeries {
    if series.is_empty() || interval_secs == 0 {
        return series.clone();
    }
    let origin = series.timestamps[0].date().and_time(NaiveTime::MIN);
    let interval = i64::from(interval_secs);
    let bin_of = |t: chrono::NaiveDateTime| (t - origin).num_seconds().div_euclid(interval);

    let first_bin = bin_of(series.timestamps[0]);
    let last_bin = bin_of(series.timestamps[series.len() - 1]);
    let nbins = (last_bin - first_bin + 1) as usize;
    let mut sums = vec![0.0; nbins];
    let mut counts = vec![0usize; nbins];
    for (t, v) in series.iter() {
        if v.is_nan() {
            continue;
        }
        let idx = (bin_of(t) - first_bin) as usize;
        sums[idx] += v;
        counts[idx] += 1;
    }

    let mut timestamps = Vec::with_capacity(nbins);
    let mut values = Vec::with_capacity(nbins);
    for i in 0..nbins {
        let bin = first_bin + i as i64;
        timestamps.push(origin + Duration::seconds(bin * interval));
        values.push(if counts[i] > 0 {
            sums[i] / counts[i] as f64
        } else {
            f64::NAN
        });
    }
    TimeSeries::new(timestamps, values)
}

/// Resample every channel of a frame onto one shared grid.
///
/// The grid depends only on the timestamp axis, so all channels stay aligned.
pub fn resample_frame(frame: &Frame, interval_secs: u32) -> Frame {
    let mut out: Option<Frame> = None;
    for ch in &frame.channels {
        let series = TimeSeries::new(frame.timestamps.clone(), ch.values.clone());
        let resampled = resample(&series, interval_secs);
        let target = out.get_or_insert_with(|| Frame::new(resampled.timestamps.clone()));
        target.push_channel(ch.name.clone(), resampled.values);
    }
    out.unwrap_or_else(|| Frame::new(frame.timestamps.clone()))
}

/// Centered moving average with a window of `period_secs` worth of samples
/// (at least one).
///
/// Edge windows shrink to the samples that exist; an even-width window takes
/// its extra sample on the leading side. NaN samples are left out of each
/// mean, and a window with no finite sample stays NaN.
pub fn moving_average(series: &TimeSeries, period_secs: u32) -> TimeSeries {
    let n = series.len();
    if n == 0 {
        return series.clone();
    }
    let interval = series.nominal_interval_secs().unwrap_or(f64::from(period_secs));
    let width = if interval > 0.0 {
        ((f64::from(period_secs) / interval) as usize).max(1)
    } else {
        1
    };
    let after = (width - 1) / 2;
    let before = width - 1 - after;

    let mut values = Vec::with_capacity(n);
    for i in 0..n {
        let lo = i.saturating_sub(before);
        let hi = (i + after).min(n - 1);
        let mut acc = 0.0;
        let mut count = 0usize;
        for &v in &series.values[lo..=hi] {
            if !v.is_nan() {
                acc += v;
                count += 1;
            }
        }
        values.push(if count > 0 {
            acc / count as f64
        } else {
            f64::NAN
        });
    }
    TimeSeries::new(series.timestamps.clone(), values)
}

/// Savitzky-Golay filter: per sample, a least-squares polynomial of
/// `degree` fitted over `window_len` neighbors, evaluated at the sample.
///
/// Near the ends the polynomial fitted to the first or last full window is
/// evaluated at the off-center positions, so edges follow the local trend
/// instead of assuming symmetric neighbors. The window shrinks (staying odd)
/// when the series is shorter than `window_len`, and the degree clamps below
/// the effective window. NaN input samples poison the windows they touch.
pub fn savgol(series: &TimeSeries, window_len: usize, degree: usize) -> TimeSeries {
    TimeSeries::new(
        series.timestamps.clone(),
        savgol_values(&series.values, window_len, degree),
    )
}

pub fn savgol_values(values: &[f64], window_len: usize, degree: usize) -> Vec<f64> {
    let n = values.len();
    if n == 0 {
        return Vec::new();
    }
    let mut window = window_len.min(n);
    if window % 2 == 0 {
        window -= 1;
    }
    if window <= 1 {
        return values.to_vec();
    }
    let degree = degree.min(window - 1);
    let half = window / 2;

    let mut out = vec![0.0; n];
    match savgol_weights(window, degree, 0.0) {
        Some(center) => {
            for i in half..n - half {
                out[i] = dot_window(&center, &values[i - half..i - half + window]);
            }
        }
        None => return values.to_vec(),
    }
    for i in 0..half {
        let offset = i as f64 - half as f64;
        out[i] = match savgol_weights(window, degree, offset) {
            Some(w) => dot_window(&w, &values[..window]),
            None => values[i],
        };
    }
    for i in n - half..n {
        let offset = (i + window - n) as f64 - half as f64;
        out[i] = match savgol_weights(window, degree, offset) {
            Some(w) => dot_window(&w, &values[n - window..]),
            None => values[i],
        };
    }
    out
}

fn dot_window(weights: &[f64], window: &[f64]) -> f64 {
    weights.iter().zip(window).map(|(w, v)| w * v).sum()
}

/// Convolution weights that fit a polynomial over sample offsets
/// `-half..=half` and evaluate it at `eval` (0 for the window center).
///
/// Solves the normal equations of the Vandermonde system; the normal matrix
/// is positive definite whenever `degree < window`, so inversion only fails
/// on degenerate input.
fn savgol_weights(window: usize, degree: usize, eval: f64) -> Option<Vec<f64>> {
    let half = (window / 2) as i64;
    let ncoef = degree + 1;
    let mut normal = vec![vec![0.0; ncoef]; ncoef];
    for (r, row) in normal.iter_mut().enumerate() {
        for (c, cell) in row.iter_mut().enumerate() {
            *cell = (-half..=half)
                .map(|x| (x as f64).powi((r + c) as i32))
                .sum();
        }
    }
    let inv = invert(normal)?;

    let mut weights = Vec::with_capacity(window);
    for x in -half..=half {
        let x = x as f64;
        let mut w = 0.0;
        for (k, inv_row) in inv.iter().enumerate() {
            let mut a = 0.0;
            for (m, cell) in inv_row.iter().enumerate() {
                a += cell * x.powi(m as i32);
            }
            w += a * eval.powi(k as i32);
        }
        weights.push(w);
    }
    Some(weights)
}

/// Gauss-Jordan inversion with partial pivoting.
fn invert(matrix: Vec<Vec<f64>>) -> Option<Vec<Vec<f64>>> {
    let n = matrix.len();
    let mut aug: Vec<Vec<f64>> = matrix
        .into_iter()
        .enumerate()
        .map(|(i, mut row)| {
            row.extend((0..n).map(|j| if i == j { 1.0 } else { 0.0 }));
            row
        })
        .collect();

    for col in 0..n {
        let mut pivot = col;
        for row in col + 1..n {
            if aug[row][col].abs() > aug[pivot][col].abs() {
                pivot = row;
            }
        }
        if aug[pivot][col].abs() < 1e-12 {
            return None;
        }
        aug.swap(col, pivot);
        let div = aug[col][col];
        for x in aug[col].iter_mut() {
            *x /= div;
        }
        let base = aug[col].clone();
        for (row, r) in aug.iter_mut().enumerate() {
            if row == col {
                continue;
            }
            let factor = r[col];
            if factor == 0.0 {
                continue;
            }
            for (x, b) in r.iter_mut().zip(&base) {
                *x -= factor * b;
            }
        }
    }
    Some(aug.into_iter().map(|row| row[n..].to_vec()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn t(secs: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 14)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + Duration::seconds(secs)
    }

    fn series_at(step: i64, values: Vec<f64>) -> TimeSeries {
        let timestamps = (0..values.len() as i64).map(|i| t(i * step)).collect();
        TimeSeries::new(timestamps, values)
    }

    fn assert_series_eq(a: &TimeSeries, b: &TimeSeries) {
        assert_eq!(a.timestamps, b.timestamps);
        assert_eq!(a.values.len(), b.values.len());
        for (x, y) in a.values.iter().zip(&b.values) {
            match (x.is_nan(), y.is_nan()) {
                (true, true) => {}
                (false, false) => assert!((x - y).abs() < 1e-9, "{} vs {}", x, y),
                _ => panic!("NaN mismatch: {} vs {}", x, y),
            }
        }
    }

    fn assert_close(a: f64, b: f64, tol: f64) {
        assert!((a - b).abs() < tol, "{} vs {}", a, b);
    }

    #[test]
    fn resample_means_into_left_labeled_bins() {
        let series = TimeSeries::new(
            vec![t(0), t(2), t(4), t(10)],
            vec![1.0, 2.0, 3.0, 4.0],
        );
        let out = resample(&series, 4);
        assert_eq!(out.timestamps, vec![t(0), t(4), t(8)]);
        assert_close(out.values[0], 1.5, 1e-12);
        assert_close(out.values[1], 3.0, 1e-12);
        assert_close(out.values[2], 4.0, 1e-12);
    }

    #[test]
    fn resample_emits_nan_for_empty_bins() {
        let series = TimeSeries::new(vec![t(0), t(8)], vec![1.0, 5.0]);
        let out = resample(&series, 4);
        assert_eq!(out.timestamps, vec![t(0), t(4), t(8)]);
        assert!(out.values[1].is_nan());
    }

    #[test]
    fn resample_is_idempotent_on_its_own_output() {
        let series = TimeSeries::new(
            vec![t(0), t(2), t(4), t(16), t(18)],
            vec![1.0, 2.0, 3.0, 4.0, 5.0],
        );
        let once = resample(&series, 4);
        let twice = resample(&once, 4);
        assert_series_eq(&once, &twice);
    }

    #[test]
    fn resample_bins_are_anchored_at_midnight() {
        // 00:00:06 with 4 s bins lands in [4 s, 8 s), not in a bin that
        // starts at the first sample
        let series = TimeSeries::new(vec![t(6), t(7)], vec![2.0, 4.0]);
        let out = resample(&series, 4);
        assert_eq!(out.timestamps, vec![t(4)]);
        assert_close(out.values[0], 3.0, 1e-12);
    }

    #[test]
    fn moving_average_centers_odd_windows() {
        let series = series_at(2, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        let out = moving_average(&series, 6);
        let expect = [1.5, 2.0, 3.0, 4.0, 4.5];
        for (v, e) in out.values.iter().zip(expect) {
            assert_close(*v, e, 1e-12);
        }
    }

    #[test]
    fn moving_average_even_window_leans_on_the_leading_side() {
        let series = series_at(1, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        let out = moving_average(&series, 4);
        let expect = [0.5, 1.0, 1.5, 2.5, 3.5, 4.0];
        for (v, e) in out.values.iter().zip(expect) {
            assert_close(*v, e, 1e-12);
        }
    }

    #[test]
    fn moving_average_skips_nan_samples() {
        let series = series_at(2, vec![1.0, f64::NAN, 3.0]);
        let out = moving_average(&series, 6);
        assert_close(out.values[0], 1.0, 1e-12);
        assert_close(out.values[1], 2.0, 1e-12);
        assert_close(out.values[2], 3.0, 1e-12);
    }

    #[test]
    fn moving_average_window_never_drops_below_one_sample() {
        let series = series_at(300, vec![1.0, 5.0]);
        // period shorter than the cadence still averages the sample itself
        let out = moving_average(&series, 60);
        assert_close(out.values[0], 1.0, 1e-12);
        assert_close(out.values[1], 5.0, 1e-12);
    }

    #[test]
    fn savgol_weights_are_symmetric_at_the_center() {
        let w = savgol_weights(7, 2, 0.0).unwrap();
        assert_eq!(w.len(), 7);
        for i in 0..3 {
            assert_close(w[i], w[6 - i], 1e-9);
        }
        assert_close(w.iter().sum::<f64>(), 1.0, 1e-9);
    }

    #[test]
    fn savgol_reproduces_a_line_everywhere_including_edges() {
        let values: Vec<f64> = (0..12).map(|i| 2.0 * i as f64 + 1.0).collect();
        let out = savgol_values(&values, 7, 2);
        for (v, e) in out.iter().zip(&values) {
            assert_close(*v, *e, 1e-8);
        }
    }

    #[test]
    fn savgol_shrinks_the_window_for_short_series() {
        let values: Vec<f64> = (0..5).map(|i| 3.0 * i as f64).collect();
        let out = savgol_values(&values, 7, 2);
        for (v, e) in out.iter().zip(&values) {
            assert_close(*v, *e, 1e-8);
        }

        let two = savgol_values(&[1.0, 9.0], 7, 2);
        assert_eq!(two, vec![1.0, 9.0]);
    }

    #[test]
    fn savgol_reduces_pseudo_noise() {
        let clean: Vec<f64> = (0..200)
            .map(|i| (i as f64 * std::f64::consts::TAU / 50.0).sin() * 10.0)
            .collect();
        let noisy: Vec<f64> = clean
            .iter()
            .enumerate()
            .map(|(i, v)| v + ((i * 7919 % 1000) as f64 / 1000.0 - 0.5) * 2.0)
            .collect();
        let smoothed = savgol_values(&noisy, 7, 2);

        let mse = |xs: &[f64]| -> f64 {
            xs.iter()
                .zip(&clean)
                .map(|(x, c)| (x - c) * (x - c))
                .sum::<f64>()
                / xs.len() as f64
        };
        assert!(mse(&smoothed) < mse(&noisy));
    }

    #[test]
    fn resample_frame_keeps_channels_aligned() {
        let mut frame = Frame::new(vec![t(0), t(2), t(8)]);
        frame.push_channel("a", vec![1.0, 3.0, 5.0]);
        frame.push_channel("b", vec![f64::NAN, f64::NAN, 7.0]);
        let out = resample_frame(&frame, 4);
        assert_eq!(out.timestamps, vec![t(0), t(4), t(8)]);
        assert_close(out.channel("a").unwrap()[0], 2.0, 1e-12);
        assert!(out.channel("a").unwrap()[1].is_nan());
        assert!(out.channel("b").unwrap()[0].is_nan());
        assert_close(out.channel("b").unwrap()[2], 7.0, 1e-12);
    }
}
