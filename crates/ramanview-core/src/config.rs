//! Engine configuration.
//!
//! Every constant the engine consumes from its environment lives here: the
//! wavelength match tolerance, the mirror fold parameters, the color-domain
//! clip, the flow level ordering, and the radial layout bounds. Callers
//! construct an [`EngineConfig`] once and pass the relevant pieces down;
//! nothing in the engine reaches for ambient globals.

use std::time::Duration;

use serde::Serialize;

use crate::flow::FlowLevel;

/// Parameters of the sampling-grid mirror fold.
///
/// The instrument only measures half of the rings; rings beyond the physical
/// half represent the mirrored opposite side of the sample. `ring_count` is
/// the full ring range R of the raw data, `line_offset` is the number of
/// instrumented lines per physical quadrant (the angular shift applied to
/// mirrored cells).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MirrorSpec {
    pub ring_count: u32,
    pub line_offset: u32,
}

impl MirrorSpec {
    /// Highest ring index on the instrumented half of the grid.
    pub fn physical_half(&self) -> u32 {
        self.ring_count / 2
    }

    /// Total angular sectors after mirroring (both halves).
    pub fn line_total(&self) -> u32 {
        self.line_offset * 2
    }
}

impl Default for MirrorSpec {
    fn default() -> Self {
        Self {
            ring_count: 50,
            line_offset: 4,
        }
    }
}

/// Radial bounds of the heatmap annulus.
///
/// `radius_min` is strictly positive so the rendering leaves a hole at the
/// center of the sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RadialLayout {
    pub radius_min: f64,
    pub radius_max: f64,
}

impl Default for RadialLayout {
    fn default() -> Self {
        Self {
            radius_min: 0.15,
            radius_max: 1.0,
        }
    }
}

/// All engine configuration in one place.
#[derive(Debug, Clone, Serialize)]
pub struct EngineConfig {
    /// Wavelength match tolerance Δ: a query at `w` matches the first series
    /// point in `[w, w + Δ)`. Empirically the instrument's sampling step;
    /// see [`crate::radial::derive_delta`] for a data-derived estimate.
    pub wavelength_step: f64,
    /// Mirror fold parameters of the sampling grid.
    pub mirror: MirrorSpec,
    /// Upper percentile used for the clipped color domain.
    pub intensity_clip: f64,
    /// Left-to-right ordering of the categorical flow levels.
    pub flow_levels: Vec<FlowLevel>,
    /// Radial bounds of the heatmap annulus.
    pub layout: RadialLayout,
    /// Settle delay for debounced viewport resizes.
    pub resize_settle: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            wavelength_step: 0.12,
            mirror: MirrorSpec::default(),
            intensity_clip: 0.95,
            flow_levels: FlowLevel::DEFAULT_ORDER.to_vec(),
            layout: RadialLayout::default(),
            resize_settle: Duration::from_millis(200),
        }
    }
}
