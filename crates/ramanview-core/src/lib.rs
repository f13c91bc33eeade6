//! # ramanview-core
//!
//! **Four linked views, one cohort.**
//!
//! `ramanview-core` is the derived-data engine behind the ramanview
//! dashboard: it turns two raw tables — patient metadata and long-format
//! spatial Raman spectra — into the datasets the four panels render, and it
//! carries the selection signals that link them.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use ramanview_core::{normalize, table, EngineConfig, SelectionHub};
//! use ramanview_core::views::RadialHeatmapView;
//!
//! let metadata = table::read_metadata_table("metadata.csv".as_ref()).unwrap();
//! let spectra = table::read_spectral_table("spectra.csv".as_ref()).unwrap();
//! let cohort = Arc::new(normalize(&metadata, &spectra));
//!
//! let config = EngineConfig::default();
//! let hub = Arc::new(SelectionHub::new());
//! hub.set_selected_patient(Some("P1".to_string()));
//! hub.set_selected_wavelength(Some(800.0));
//!
//! let heatmap = RadialHeatmapView::new(
//!     Arc::clone(&cohort),
//!     Arc::clone(&hub),
//!     config.mirror,
//!     config.layout,
//!     config.wavelength_step,
//!     config.intensity_clip,
//! );
//! println!("{} cells resolved", heatmap.output().samples.len());
//! ```
//!
//! ## Architecture
//!
//! Raw rows → Record Normalizer → {Flow Builder, Radial Mapper} → View
//! Adapters, with every adapter also reading (and writing) the
//! [`SelectionHub`] — the closed feedback loop that makes an interaction in
//! one panel filter or highlight the others.
//!
//! The normalized collections are read-only after the load; the selection
//! state is the only mutable shared state and every view recomputes its
//! output as a full replacement, so there is never a stale partial panel.

pub mod config;
pub mod flow;
pub mod radial;
pub mod record;
pub mod selection;
pub mod table;
pub mod views;

pub use config::{EngineConfig, MirrorSpec, RadialLayout};
pub use flow::{build_flow, EdgeEmphasis, FlowEdge, FlowGraph, FlowLevel, FlowNode};
pub use radial::{
    arc_span, cell_at, color_domain, derive_delta, mirror_cell, resolve_intensity, ring_radius,
    unmirror_cell, ColorDomain, GridCell, GridCellSample,
};
pub use record::{normalize, Measurement, NormalizedCohort, Patient, SeriesPoint};
pub use selection::{SelectionChange, SelectionField, SelectionHub, SelectionState};
pub use views::{
    FlowView, MetadataScatterView, RadialHeatmapView, ResizeDebouncer, SpectralSeriesView,
};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
