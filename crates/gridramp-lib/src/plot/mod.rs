//! Backend-neutral plotting support: the shared palette, polyline
//! decimation, and the annotation placement rule for the PV charts. The CLI
//! turns these into plotters calls.

use serde::{Deserialize, Serialize};

/// RGB color packed as 0xRRGGBB.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color(pub u32);

impl Color {
    pub fn rgb(self) -> (u8, u8, u8) {
        (
            ((self.0 >> 16) & 0xFF) as u8,
            ((self.0 >> 8) & 0xFF) as u8,
            (self.0 & 0xFF) as u8,
        )
    }
}

/// House palette for the rendered charts.
pub mod palette {
    use super::Color;

    pub const BLACK: Color = Color(0x000000);
    pub const SLATE: Color = Color(0x3a606b);
    pub const TEAL: Color = Color(0x5bc0be);
    pub const LIGHT_GRAY: Color = Color(0xa7a9ac);
    pub const INK: Color = Color(0x0b132b);
    pub const NAVY: Color = Color(0x1c2541);
    pub const PASTEL_GREEN: Color = Color(0x9fedde);
    pub const MINT: Color = Color(0x6fffe9);
    pub const TURQUOISE: Color = Color(0x1f7a8c);
}

/// Thin a polyline down to at most `max_points` vertices for rendering,
/// keeping the first point of every bucket and always the last point.
pub fn decimate_points(points: &[(f64, f64)], max_points: usize) -> Vec<(f64, f64)> {
    if max_points == 0 || points.len() <= max_points {
        return points.to_vec();
    }
    let step = points.len().div_ceil(max_points);
    let mut out: Vec<(f64, f64)> = points.iter().step_by(step).copied().collect();
    if let Some(&last) = points.last() {
        if out.last() != Some(&last) {
            out.push(last);
        }
    }
    out
}

/// Offsets for the two PV extremum labels, `[(max_dx, max_dy), (min_dx,
/// min_dy)]` in chart points.
///
/// Each label pushes horizontally away from the nearer day edge and
/// vertically away from the curve mean. When the two extrema sit within two
/// hours of each other the maximum's label pulls in, the minimum's pushes
/// out, and the minimum flips to the other side of the curve so the texts
/// cannot collide.
pub fn annotation_offsets(
    max_rel_x: f64,
    max_above_mean: bool,
    min_rel_x: f64,
    min_above_mean: bool,
    hours_apart: f64,
) -> [(f64, f64); 2] {
    let mut max_dx = if max_rel_x < 0.5 { -1.0 } else { 1.0 };
    let mut max_dy = if max_above_mean { 1.0 } else { -1.0 };
    let mut min_dx = if min_rel_x < 0.5 { -1.0 } else { 1.0 };
    let mut min_dy = if min_above_mean { 1.0 } else { -1.0 };
    if hours_apart.abs() < 2.0 {
        max_dx *= 0.5;
        min_dx *= 1.5;
        max_dy *= 1.5;
        min_dy *= -1.5;
    }
    [
        (max_dx * 80.0, max_dy * 20.0),
        (min_dx * 80.0, min_dy * 20.0),
    ]
}
