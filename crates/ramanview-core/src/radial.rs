//! Radial grid mapping for the spatial heatmap.
//!
//! The instrument samples a (line, ring) grid where only half the rings are
//! physically measured; the other half mirrors the opposite side of the
//! sample. This module folds raw grid coordinates onto the instrumented
//! half, resolves a spectrum to a single intensity by wavelength window
//! matching, computes the outlier-clipped color domain, and exposes the
//! polar geometry contract — including its inverse, which the selected-cell
//! feedback loop depends on for hit-testing.

use std::collections::HashSet;
use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::config::{MirrorSpec, RadialLayout};
use crate::record::{Measurement, SeriesPoint};

// ---------------------------------------------------------------------------
// Cell types
// ---------------------------------------------------------------------------

/// A (line, ring) grid position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridCell {
    pub line: u32,
    pub ring: u32,
}

/// One resolved intensity at a folded grid position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridCellSample {
    pub line: u32,
    pub ring: u32,
    pub intensity: f64,
}

/// Input range of the color scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColorDomain {
    pub min: f64,
    pub max: f64,
}

impl ColorDomain {
    /// Position of `value` inside the domain, clamped to [0, 1].
    pub fn position(&self, value: f64) -> f64 {
        ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }
}

// ---------------------------------------------------------------------------
// Mirror fold
// ---------------------------------------------------------------------------

/// Fold a raw grid cell onto the instrumented half.
///
/// Rings beyond the physical half map to the opposite ring with the line
/// shifted by the quadrant offset, so both halves render as one continuous
/// double-width angular sweep sharing the radial scale. Deterministic and
/// invertible given the fold parameters; see [`unmirror_cell`].
pub fn mirror_cell(cell: GridCell, spec: &MirrorSpec) -> GridCell {
    if cell.ring > spec.physical_half() {
        GridCell {
            line: cell.line + spec.line_offset,
            ring: spec.ring_count + 1 - cell.ring,
        }
    } else {
        cell
    }
}

/// Exact inverse of [`mirror_cell`] over its defined domain.
pub fn unmirror_cell(cell: GridCell, spec: &MirrorSpec) -> GridCell {
    if cell.line > spec.line_offset {
        GridCell {
            line: cell.line - spec.line_offset,
            ring: spec.ring_count + 1 - cell.ring,
        }
    } else {
        cell
    }
}

// ---------------------------------------------------------------------------
// Wavelength resolution
// ---------------------------------------------------------------------------

/// First intensity whose wavelength lies in the half-open window
/// `[wavelength, wavelength + delta)`, or `None` when the series has no
/// point there — an omitted sample, not a zero.
pub fn match_intensity(series: &[SeriesPoint], wavelength: f64, delta: f64) -> Option<f64> {
    series
        .iter()
        .find(|p| p.wavelength >= wavelength && p.wavelength < wavelength + delta)
        .map(|p| p.intensity)
}

/// Estimate the instrument's sampling step from the data: the smallest
/// positive wavelength increment between consecutive points of any series.
pub fn derive_delta(measurements: &[Measurement]) -> Option<f64> {
    let mut best: Option<f64> = None;
    for m in measurements {
        for pair in m.series.windows(2) {
            let step = pair[1].wavelength - pair[0].wavelength;
            if step > 0.0 && best.is_none_or(|b| step < b) {
                best = Some(step);
            }
        }
    }
    best
}

/// Resolve every measurement of one patient to a folded grid sample at the
/// queried wavelength.
///
/// Measurements with no point in the window contribute nothing. When the
/// fold collapses two raw cells onto the same key, the first resolved
/// sample wins (explicit policy; collisions are counted in the log).
pub fn resolve_intensity(
    measurements: &[Measurement],
    patient_id: &str,
    wavelength: f64,
    spec: &MirrorSpec,
    delta: f64,
) -> Vec<GridCellSample> {
    let mut samples = Vec::new();
    let mut seen: HashSet<GridCell> = HashSet::new();
    let mut collisions = 0usize;

    for m in measurements.iter().filter(|m| m.patient_id == patient_id) {
        let Some(intensity) = match_intensity(&m.series, wavelength, delta) else {
            continue;
        };
        let cell = mirror_cell(
            GridCell {
                line: m.line,
                ring: m.ring,
            },
            spec,
        );
        if seen.insert(cell) {
            samples.push(GridCellSample {
                line: cell.line,
                ring: cell.ring,
                intensity,
            });
        } else {
            collisions += 1;
        }
    }

    if collisions > 0 {
        log::debug!("{collisions} mirrored cell collisions for {patient_id}, first sample kept");
    }
    samples
}

// ---------------------------------------------------------------------------
// Color domain
// ---------------------------------------------------------------------------

/// Interpolated quantile over a sorted slice (the convention the original
/// color scale used).
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let h = (n - 1) as f64 * q.clamp(0.0, 1.0);
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (h - lo as f64)
}

/// Color domain of a resolved sample set: the minimum and a clipped maximum
/// (`clip`-quantile rather than the raw max) so a single outlier cannot
/// saturate the scale. Recomputed per patient selection.
///
/// Degenerate inputs fall back to a safe range: empty → [0, 1], and a
/// single-valued set widens to unit width rather than producing NaN
/// geometry downstream.
pub fn color_domain(samples: &[GridCellSample], clip: f64) -> ColorDomain {
    if samples.is_empty() {
        return ColorDomain { min: 0.0, max: 1.0 };
    }
    let mut intensities: Vec<f64> = samples.iter().map(|s| s.intensity).collect();
    intensities.sort_by(|a, b| a.total_cmp(b));
    let min = intensities[0];
    let max = quantile(&intensities, clip);
    if max <= min {
        return ColorDomain {
            min,
            max: min + 1.0,
        };
    }
    ColorDomain { min, max }
}

// ---------------------------------------------------------------------------
// Polar geometry contract
// ---------------------------------------------------------------------------

/// Angular span of a folded line index: `[(line-1)·2π/L, line·2π/L)`.
pub fn arc_span(line: u32, line_total: u32) -> (f64, f64) {
    let sector = TAU / line_total.max(1) as f64;
    ((line - 1) as f64 * sector, line as f64 * sector)
}

/// Radius of a folded ring: linear interpolation over the layout bounds.
/// `radius_min` is strictly positive, leaving a hole at the center.
pub fn ring_radius(ring: u32, spec: &MirrorSpec, layout: &RadialLayout) -> f64 {
    let half = spec.physical_half();
    let t = if half <= 1 {
        0.0
    } else {
        (ring.saturating_sub(1)) as f64 / (half - 1) as f64
    };
    layout.radius_min + t * (layout.radius_max - layout.radius_min)
}

/// Invert the geometry: the folded cell under a polar position, or `None`
/// outside the annulus. This inversion is what turns a pointer event into a
/// selected grid cell.
pub fn cell_at(
    angle: f64,
    radius: f64,
    spec: &MirrorSpec,
    layout: &RadialLayout,
) -> Option<GridCell> {
    if radius < layout.radius_min || radius > layout.radius_max {
        return None;
    }
    let line_total = spec.line_total();
    if line_total == 0 {
        return None;
    }
    let sector = TAU / line_total as f64;
    let line = ((angle.rem_euclid(TAU) / sector).floor() as u32 + 1).min(line_total);

    let half = spec.physical_half();
    let t = (radius - layout.radius_min) / (layout.radius_max - layout.radius_min);
    let ring = if half <= 1 {
        1
    } else {
        ((t * (half - 1) as f64).round() as u32 + 1).min(half)
    };
    Some(GridCell { line, ring })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
