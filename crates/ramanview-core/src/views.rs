//! View adapters: one per panel of the dashboard.
//!
//! Each adapter owns the render-ready derivation for its panel. It reads the
//! immutable cohort plus the current selection snapshot, declares the
//! selection fields it depends on, and on any observed change fully replaces
//! its output — a recomputation never patches the previous result, so a
//! selection change mid-drag can't leave stale partial output visible.
//! Adapters drain their notification queue before recomputing ([`Self::pump`]
//! style), which coalesces a burst of writes into one recomputation per
//! rendered frame.
//!
//! A view handed a null selection produces a defined placeholder instead of
//! failing; a completely empty cohort renders as "no data".

use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::config::{MirrorSpec, RadialLayout};
use crate::flow::{build_flow, FlowGraph, FlowLevel};
use crate::radial::{
    arc_span, cell_at, color_domain, mirror_cell, resolve_intensity, ring_radius, ColorDomain,
    GridCell, GridCellSample,
};
use crate::record::{NormalizedCohort, SeriesPoint};
use crate::selection::{SelectionChange, SelectionField, SelectionHub};

const NO_DATA: &str = "no data";
const SELECT_PATIENT: &str = "select a patient";
const SELECT_PATIENT_AND_WAVELENGTH: &str = "select a patient and wavelength";
const NO_SAMPLES_IN_WINDOW: &str = "no samples at this wavelength";

// ---------------------------------------------------------------------------
// Flow view
// ---------------------------------------------------------------------------

/// Metadata overview panel. Cohort-global: it reads no selection field; its
/// only interaction is the node toggle defined by the flow builder.
pub struct FlowView {
    graph: FlowGraph,
    levels: Vec<FlowLevel>,
}

impl FlowView {
    pub fn new(cohort: &NormalizedCohort, levels: &[FlowLevel]) -> Self {
        Self {
            graph: build_flow(&cohort.patients, levels),
            levels: levels.to_vec(),
        }
    }

    pub fn graph(&self) -> &FlowGraph {
        &self.graph
    }

    pub fn levels(&self) -> &[FlowLevel] {
        &self.levels
    }

    pub fn toggle_node(&mut self, id: usize) {
        self.graph.toggle_node(id);
    }

    pub fn placeholder(&self) -> Option<&'static str> {
        self.graph.nodes.is_empty().then_some(NO_DATA)
    }
}

// ---------------------------------------------------------------------------
// Metadata scatter view
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub patient_id: String,
    pub age: f64,
    pub bmi: f64,
    pub stage: String,
    /// True for the currently selected patient.
    pub highlighted: bool,
}

/// Mean age/BMI crosshair for one stage group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageMean {
    pub stage: String,
    pub mean_age: f64,
    pub mean_bmi: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ScatterOutput {
    pub points: Vec<ScatterPoint>,
    pub stage_means: Vec<StageMean>,
    pub placeholder: Option<&'static str>,
}

/// Age-vs-BMI panel colored by stage. Clicking a point writes the selected
/// patient; the panel itself only depends on that field for highlighting.
pub struct MetadataScatterView {
    cohort: Arc<NormalizedCohort>,
    hub: Arc<SelectionHub>,
    rx: Receiver<SelectionChange>,
    output: ScatterOutput,
}

impl MetadataScatterView {
    pub fn new(cohort: Arc<NormalizedCohort>, hub: Arc<SelectionHub>) -> Self {
        let rx = hub.subscribe(&[SelectionField::Patient]);
        let mut view = Self {
            cohort,
            hub,
            rx,
            output: ScatterOutput::default(),
        };
        view.refresh();
        view
    }

    pub fn depends_on(field: SelectionField) -> bool {
        field == SelectionField::Patient
    }

    /// Drain pending notifications; recompute once if any arrived.
    pub fn pump(&mut self) -> bool {
        if self.rx.try_iter().count() == 0 {
            return false;
        }
        self.refresh();
        true
    }

    pub fn output(&self) -> &ScatterOutput {
        &self.output
    }

    /// Interaction: a click on a point selects that patient.
    pub fn select_patient(&self, patient_id: Option<&str>) {
        self.hub
            .set_selected_patient(patient_id.map(str::to_string));
    }

    /// Recompute the full output from the cohort and current selection.
    /// Also the entry point for the settled-resize re-derivation.
    pub fn refresh(&mut self) {
        if self.cohort.patients.is_empty() {
            self.output = ScatterOutput {
                placeholder: Some(NO_DATA),
                ..ScatterOutput::default()
            };
            return;
        }
        let selected = self.hub.snapshot().patient;

        let points = self
            .cohort
            .patients
            .iter()
            .map(|p| ScatterPoint {
                patient_id: p.id.clone(),
                age: p.age,
                bmi: p.bmi,
                stage: p.stage.clone(),
                highlighted: selected.as_deref() == Some(p.id.as_str()),
            })
            .collect();

        // Stage means in the fixed healthy → early → late order.
        let mut stage_means = Vec::new();
        for stage in [
            crate::record::STAGE_HEALTHY,
            crate::record::STAGE_EARLY,
            crate::record::STAGE_LATE,
        ] {
            let group: Vec<_> = self
                .cohort
                .patients
                .iter()
                .filter(|p| p.stage == stage)
                .collect();
            if group.is_empty() {
                continue;
            }
            let n = group.len() as f64;
            stage_means.push(StageMean {
                stage: stage.to_string(),
                mean_age: group.iter().map(|p| p.age).sum::<f64>() / n,
                mean_bmi: group.iter().map(|p| p.bmi).sum::<f64>() / n,
            });
        }

        self.output = ScatterOutput {
            points,
            stage_means,
            placeholder: None,
        };
    }
}

// ---------------------------------------------------------------------------
// Spectral series view
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TraceEmphasis {
    Full,
    /// Opacity-suppressed while another cell is selected.
    Suppressed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesTrace {
    pub line: u32,
    pub ring: u32,
    pub points: Vec<SeriesPoint>,
    pub emphasis: TraceEmphasis,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SeriesOutput {
    pub patient: Option<String>,
    pub traces: Vec<SeriesTrace>,
    pub placeholder: Option<&'static str>,
}

/// Wavelength/intensity panel: every series of the selected patient, with a
/// selected grid cell suppressing all traces but its own. The wavelength
/// cursor writes the selected wavelength.
pub struct SpectralSeriesView {
    cohort: Arc<NormalizedCohort>,
    hub: Arc<SelectionHub>,
    rx: Receiver<SelectionChange>,
    mirror: MirrorSpec,
    output: SeriesOutput,
}

impl SpectralSeriesView {
    pub fn new(cohort: Arc<NormalizedCohort>, hub: Arc<SelectionHub>, mirror: MirrorSpec) -> Self {
        let rx = hub.subscribe(&[SelectionField::Patient, SelectionField::Cell]);
        let mut view = Self {
            cohort,
            hub,
            rx,
            mirror,
            output: SeriesOutput::default(),
        };
        view.refresh();
        view
    }

    pub fn depends_on(field: SelectionField) -> bool {
        matches!(field, SelectionField::Patient | SelectionField::Cell)
    }

    pub fn pump(&mut self) -> bool {
        if self.rx.try_iter().count() == 0 {
            return false;
        }
        self.refresh();
        true
    }

    pub fn output(&self) -> &SeriesOutput {
        &self.output
    }

    /// Interaction: the wavelength cursor moved (or left the panel).
    pub fn hover_wavelength(&self, wavelength: Option<f64>) {
        self.hub.set_selected_wavelength(wavelength);
    }

    /// Recompute the full output from the cohort and current selection.
    pub fn refresh(&mut self) {
        if self.cohort.is_empty() {
            self.output = SeriesOutput {
                placeholder: Some(NO_DATA),
                ..SeriesOutput::default()
            };
            return;
        }
        let snapshot = self.hub.snapshot();
        let Some(patient) = snapshot.patient else {
            self.output = SeriesOutput {
                placeholder: Some(SELECT_PATIENT),
                ..SeriesOutput::default()
            };
            return;
        };

        let traces: Vec<SeriesTrace> = self
            .cohort
            .measurements_for(&patient)
            .map(|m| {
                // The selected cell lives in folded coordinates; compare the
                // measurement's raw position through the same fold.
                let folded = mirror_cell(
                    GridCell {
                        line: m.line,
                        ring: m.ring,
                    },
                    &self.mirror,
                );
                let emphasis = match snapshot.cell {
                    Some(cell) if cell != folded => TraceEmphasis::Suppressed,
                    _ => TraceEmphasis::Full,
                };
                SeriesTrace {
                    line: m.line,
                    ring: m.ring,
                    points: m.series.clone(),
                    emphasis,
                }
            })
            .collect();

        self.output = SeriesOutput {
            patient: Some(patient),
            traces,
            placeholder: None,
        };
    }
}

// ---------------------------------------------------------------------------
// Radial heatmap view
// ---------------------------------------------------------------------------

/// One renderable annulus sector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CellArc {
    pub cell: GridCell,
    pub angle_start: f64,
    pub angle_end: f64,
    pub radius: f64,
    pub intensity: f64,
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct HeatmapOutput {
    pub samples: Vec<GridCellSample>,
    pub arcs: Vec<CellArc>,
    pub domain: ColorDomain,
    pub placeholder: Option<&'static str>,
}

impl Default for HeatmapOutput {
    fn default() -> Self {
        Self {
            samples: Vec::new(),
            arcs: Vec::new(),
            domain: ColorDomain { min: 0.0, max: 1.0 },
            placeholder: None,
        }
    }
}

/// Spatial heatmap panel: folded grid samples for the selected
/// (patient, wavelength), colored over the clipped domain. Clicking inside
/// the annulus writes the selected grid cell via the inverse geometry.
pub struct RadialHeatmapView {
    cohort: Arc<NormalizedCohort>,
    hub: Arc<SelectionHub>,
    rx: Receiver<SelectionChange>,
    mirror: MirrorSpec,
    layout: RadialLayout,
    wavelength_step: f64,
    intensity_clip: f64,
    output: HeatmapOutput,
}

impl RadialHeatmapView {
    pub fn new(
        cohort: Arc<NormalizedCohort>,
        hub: Arc<SelectionHub>,
        mirror: MirrorSpec,
        layout: RadialLayout,
        wavelength_step: f64,
        intensity_clip: f64,
    ) -> Self {
        let rx = hub.subscribe(&[
            SelectionField::Patient,
            SelectionField::Wavelength,
            SelectionField::Cell,
        ]);
        let mut view = Self {
            cohort,
            hub,
            rx,
            mirror,
            layout,
            wavelength_step,
            intensity_clip,
            output: HeatmapOutput::default(),
        };
        view.refresh();
        view
    }

    pub fn depends_on(field: SelectionField) -> bool {
        matches!(
            field,
            SelectionField::Patient | SelectionField::Wavelength | SelectionField::Cell
        )
    }

    pub fn pump(&mut self) -> bool {
        if self.rx.try_iter().count() == 0 {
            return false;
        }
        self.refresh();
        true
    }

    pub fn output(&self) -> &HeatmapOutput {
        &self.output
    }

    pub fn mirror(&self) -> &MirrorSpec {
        &self.mirror
    }

    pub fn layout(&self) -> &RadialLayout {
        &self.layout
    }

    /// Interaction: a click at a polar position selects the cell under it.
    /// Returns the cell for the caller's benefit; clicks outside the
    /// annulus change nothing.
    pub fn click_at(&self, angle: f64, radius: f64) -> Option<GridCell> {
        let cell = cell_at(angle, radius, &self.mirror, &self.layout)?;
        self.hub.set_selected_cell(Some(cell));
        Some(cell)
    }

    /// Recompute the full output from the cohort and current selection.
    pub fn refresh(&mut self) {
        if self.cohort.is_empty() {
            self.output = HeatmapOutput {
                placeholder: Some(NO_DATA),
                ..HeatmapOutput::default()
            };
            return;
        }
        let snapshot = self.hub.snapshot();
        let (Some(patient), Some(wavelength)) = (snapshot.patient, snapshot.wavelength) else {
            self.output = HeatmapOutput {
                placeholder: Some(SELECT_PATIENT_AND_WAVELENGTH),
                ..HeatmapOutput::default()
            };
            return;
        };

        let samples = resolve_intensity(
            &self.cohort.measurements,
            &patient,
            wavelength,
            &self.mirror,
            self.wavelength_step,
        );
        // Clip recomputed per patient selection, never from a global pass.
        let domain = color_domain(&samples, self.intensity_clip);
        let line_total = self.mirror.line_total();
        let arcs = samples
            .iter()
            .map(|s| {
                let (angle_start, angle_end) = arc_span(s.line, line_total);
                let cell = GridCell {
                    line: s.line,
                    ring: s.ring,
                };
                CellArc {
                    cell,
                    angle_start,
                    angle_end,
                    radius: ring_radius(s.ring, &self.mirror, &self.layout),
                    intensity: s.intensity,
                    selected: snapshot.cell == Some(cell),
                }
            })
            .collect();

        let placeholder = samples.is_empty().then_some(NO_SAMPLES_IN_WINDOW);
        self.output = HeatmapOutput {
            samples,
            arcs,
            domain,
            placeholder,
        };
    }
}

// ---------------------------------------------------------------------------
// Resize debouncing
// ---------------------------------------------------------------------------

/// Last-event-wins settle timer for viewport resizes.
///
/// Every resize event overwrites the pending timestamp; [`Self::ready`]
/// fires once the settle delay has elapsed since the latest event, so a
/// continuous resize burst triggers exactly one full geometry re-derivation.
#[derive(Debug)]
pub struct ResizeDebouncer {
    settle: Duration,
    pending: Option<Instant>,
}

impl ResizeDebouncer {
    pub fn new(settle: Duration) -> Self {
        Self {
            settle,
            pending: None,
        }
    }

    /// Record a resize event at `now`.
    pub fn record(&mut self, now: Instant) {
        self.pending = Some(now);
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// True exactly once, when the latest recorded event has settled.
    pub fn ready(&mut self, now: Instant) -> bool {
        match self.pending {
            Some(at) if now.duration_since(at) >= self.settle => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::normalize;
    use crate::table::{MetadataRow, SpectralRow};

    fn metadata_row(id: &str, stage: &str, age: f64, bmi: f64) -> MetadataRow {
        MetadataRow {
            patient_id: id.to_string(),
            gender: "Female Gender".to_string(),
            age: Some(age),
            race: "White".to_string(),
            ethnicity: "Unknown".to_string(),
            bmi: Some(bmi),
            stage: stage.to_string(),
            spectral_data: "pos".to_string(),
        }
    }

    fn spectral_row(id: &str, line: u32, ring: u32, w: f64, i: f64) -> SpectralRow {
        SpectralRow {
            patient_id: id.to_string(),
            line: Some(line),
            ring: Some(ring),
            wavelength: Some(w),
            intensity: Some(i),
        }
    }

    fn cohort() -> Arc<NormalizedCohort> {
        let metadata = vec![
            metadata_row("P1", "III", 61.0, 27.3),
            metadata_row("P2", "I", 44.0, 21.0),
            metadata_row("P3", "", 52.0, 17.0),
        ];
        let spectral = vec![
            spectral_row("P1", 2, 5, 800.0, 4.2),
            spectral_row("P1", 2, 5, 800.12, 4.4),
            spectral_row("P1", 3, 40, 800.05, 12.4),
            spectral_row("P2", 1, 1, 800.0, 1.0),
        ];
        Arc::new(normalize(&metadata, &spectral))
    }

    fn empty_cohort() -> Arc<NormalizedCohort> {
        Arc::new(normalize(&[], &[]))
    }

    // -----------------------------------------------------------------------
    // Scatter view
    // -----------------------------------------------------------------------

    #[test]
    fn scatter_derives_points_and_stage_means() {
        let view = MetadataScatterView::new(cohort(), Arc::new(SelectionHub::new()));
        let out = view.output();
        assert_eq!(out.points.len(), 3);
        assert_eq!(out.stage_means.len(), 3);
        let late = out
            .stage_means
            .iter()
            .find(|m| m.stage == "Late Stage")
            .expect("late group");
        assert_eq!(late.mean_age, 61.0);
        assert_eq!(late.mean_bmi, 27.3);
    }

    #[test]
    fn scatter_click_propagates_and_highlights() {
        let hub = Arc::new(SelectionHub::new());
        let mut view = MetadataScatterView::new(cohort(), Arc::clone(&hub));
        view.select_patient(Some("P2"));

        assert_eq!(hub.snapshot().patient.as_deref(), Some("P2"));
        assert!(view.pump(), "own write arrives as a change");
        let highlighted: Vec<_> = view
            .output()
            .points
            .iter()
            .filter(|p| p.highlighted)
            .collect();
        assert_eq!(highlighted.len(), 1);
        assert_eq!(highlighted[0].patient_id, "P2");
    }

    #[test]
    fn scatter_ignores_wavelength_changes() {
        let hub = Arc::new(SelectionHub::new());
        let mut view = MetadataScatterView::new(cohort(), Arc::clone(&hub));
        hub.set_selected_wavelength(Some(800.0));
        assert!(!view.pump(), "wavelength is not a scatter dependency");
    }

    #[test]
    fn scatter_empty_cohort_placeholder() {
        let view = MetadataScatterView::new(empty_cohort(), Arc::new(SelectionHub::new()));
        assert_eq!(view.output().placeholder, Some(NO_DATA));
    }

    // -----------------------------------------------------------------------
    // Series view
    // -----------------------------------------------------------------------

    #[test]
    fn series_null_patient_renders_placeholder() {
        let view = SpectralSeriesView::new(
            cohort(),
            Arc::new(SelectionHub::new()),
            MirrorSpec::default(),
        );
        assert_eq!(view.output().placeholder, Some(SELECT_PATIENT));
        assert!(view.output().traces.is_empty());
    }

    #[test]
    fn series_shows_all_traces_for_selected_patient() {
        let hub = Arc::new(SelectionHub::new());
        let mut view = SpectralSeriesView::new(cohort(), Arc::clone(&hub), MirrorSpec::default());
        hub.set_selected_patient(Some("P1".to_string()));
        assert!(view.pump());

        let out = view.output();
        assert_eq!(out.traces.len(), 2);
        assert!(out
            .traces
            .iter()
            .all(|t| t.emphasis == TraceEmphasis::Full));
        // The two rows at (2, 5) merged into one trace.
        let merged = out
            .traces
            .iter()
            .find(|t| (t.line, t.ring) == (2, 5))
            .expect("merged trace");
        assert_eq!(merged.points.len(), 2);
    }

    #[test]
    fn scenario_selected_cell_suppresses_other_traces() {
        let hub = Arc::new(SelectionHub::new());
        let mut view = SpectralSeriesView::new(cohort(), Arc::clone(&hub), MirrorSpec::default());
        hub.set_selected_patient(Some("P1".to_string()));
        hub.set_selected_cell(Some(GridCell { line: 2, ring: 5 }));
        assert!(view.pump());

        let out = view.output();
        for trace in &out.traces {
            if (trace.line, trace.ring) == (2, 5) {
                assert_eq!(trace.emphasis, TraceEmphasis::Full);
            } else {
                assert_eq!(trace.emphasis, TraceEmphasis::Suppressed);
            }
        }
    }

    #[test]
    fn series_matches_selected_cell_in_folded_coordinates() {
        // Raw (3, 40) folds to (7, 11); selecting the folded cell must keep
        // the raw trace at full emphasis.
        let hub = Arc::new(SelectionHub::new());
        let mut view = SpectralSeriesView::new(cohort(), Arc::clone(&hub), MirrorSpec::default());
        hub.set_selected_patient(Some("P1".to_string()));
        hub.set_selected_cell(Some(GridCell { line: 7, ring: 11 }));
        assert!(view.pump());

        let trace = view
            .output()
            .traces
            .iter()
            .find(|t| (t.line, t.ring) == (3, 40))
            .expect("mirrored trace")
            .clone();
        assert_eq!(trace.emphasis, TraceEmphasis::Full);
    }

    #[test]
    fn series_coalesces_a_burst_into_one_recompute() {
        let hub = Arc::new(SelectionHub::new());
        let mut view = SpectralSeriesView::new(cohort(), Arc::clone(&hub), MirrorSpec::default());
        hub.set_selected_patient(Some("P1".to_string()));
        hub.set_selected_cell(Some(GridCell { line: 2, ring: 5 }));
        hub.set_selected_cell(None);
        // One pump handles the whole burst; only the final state matters.
        assert!(view.pump());
        assert!(!view.pump());
        assert!(view
            .output()
            .traces
            .iter()
            .all(|t| t.emphasis == TraceEmphasis::Full));
    }

    // -----------------------------------------------------------------------
    // Heatmap view
    // -----------------------------------------------------------------------

    fn heatmap(hub: &Arc<SelectionHub>, cohort_arc: Arc<NormalizedCohort>) -> RadialHeatmapView {
        RadialHeatmapView::new(
            cohort_arc,
            Arc::clone(hub),
            MirrorSpec::default(),
            RadialLayout::default(),
            0.12,
            0.95,
        )
    }

    #[test]
    fn heatmap_null_selection_renders_placeholder() {
        let hub = Arc::new(SelectionHub::new());
        let view = heatmap(&hub, cohort());
        assert_eq!(view.output().placeholder, Some(SELECT_PATIENT_AND_WAVELENGTH));

        let hub2 = Arc::new(SelectionHub::new());
        hub2.set_selected_patient(Some("P1".to_string()));
        let view = heatmap(&hub2, cohort());
        assert_eq!(view.output().placeholder, Some(SELECT_PATIENT_AND_WAVELENGTH));
    }

    #[test]
    fn heatmap_resolves_folded_samples_and_domain() {
        let hub = Arc::new(SelectionHub::new());
        hub.set_selected_patient(Some("P1".to_string()));
        hub.set_selected_wavelength(Some(800.0));
        let view = heatmap(&hub, cohort());

        let out = view.output();
        assert_eq!(out.placeholder, None);
        assert_eq!(out.samples.len(), 2);
        assert!(out
            .samples
            .iter()
            .any(|s| (s.line, s.ring) == (7, 11) && s.intensity == 12.4));
        assert_eq!(out.arcs.len(), out.samples.len());
        assert!(out.domain.max > out.domain.min);
    }

    #[test]
    fn heatmap_replaces_output_on_patient_change() {
        let hub = Arc::new(SelectionHub::new());
        hub.set_selected_patient(Some("P1".to_string()));
        hub.set_selected_wavelength(Some(800.0));
        let mut view = heatmap(&hub, cohort());
        assert_eq!(view.output().samples.len(), 2);

        hub.set_selected_patient(Some("P2".to_string()));
        assert!(view.pump());
        // Full replacement: no stale P1 samples survive.
        let out = view.output();
        assert_eq!(out.samples.len(), 1);
        assert_eq!((out.samples[0].line, out.samples[0].ring), (1, 1));
    }

    #[test]
    fn heatmap_click_inverts_geometry_and_selects_cell() {
        let hub = Arc::new(SelectionHub::new());
        hub.set_selected_patient(Some("P1".to_string()));
        hub.set_selected_wavelength(Some(800.0));
        let mut view = heatmap(&hub, cohort());

        let spec = MirrorSpec::default();
        let layout = RadialLayout::default();
        let (a0, a1) = arc_span(2, spec.line_total());
        let angle = (a0 + a1) / 2.0;
        let radius = ring_radius(5, &spec, &layout);

        let clicked = view.click_at(angle, radius).expect("inside annulus");
        assert_eq!(clicked, GridCell { line: 2, ring: 5 });
        assert_eq!(hub.snapshot().cell, Some(clicked));

        assert!(view.pump());
        let arc = view
            .output()
            .arcs
            .iter()
            .find(|a| a.cell == clicked)
            .copied()
            .expect("clicked arc");
        assert!(arc.selected);
    }

    #[test]
    fn heatmap_click_outside_annulus_changes_nothing() {
        let hub = Arc::new(SelectionHub::new());
        let view = heatmap(&hub, cohort());
        assert_eq!(view.click_at(0.3, 0.01), None);
        assert_eq!(hub.snapshot().cell, None);
    }

    #[test]
    fn heatmap_no_matching_window_is_empty_with_safe_domain() {
        let hub = Arc::new(SelectionHub::new());
        hub.set_selected_patient(Some("P1".to_string()));
        hub.set_selected_wavelength(Some(1200.0));
        let view = heatmap(&hub, cohort());

        let out = view.output();
        assert!(out.samples.is_empty());
        assert_eq!(out.placeholder, Some(NO_SAMPLES_IN_WINDOW));
        assert_eq!(out.domain, ColorDomain { min: 0.0, max: 1.0 });
    }

    #[test]
    fn heatmap_empty_cohort_placeholder() {
        let hub = Arc::new(SelectionHub::new());
        let view = heatmap(&hub, empty_cohort());
        assert_eq!(view.output().placeholder, Some(NO_DATA));
    }

    // -----------------------------------------------------------------------
    // Resize debouncing
    // -----------------------------------------------------------------------

    #[test]
    fn debouncer_fires_once_after_settle() {
        let mut debouncer = ResizeDebouncer::new(Duration::from_millis(200));
        let t0 = Instant::now();
        debouncer.record(t0);
        assert!(!debouncer.ready(t0 + Duration::from_millis(100)));
        assert!(debouncer.ready(t0 + Duration::from_millis(200)));
        assert!(!debouncer.ready(t0 + Duration::from_millis(300)), "fires once");
    }

    #[test]
    fn debouncer_last_event_wins() {
        let mut debouncer = ResizeDebouncer::new(Duration::from_millis(200));
        let t0 = Instant::now();
        debouncer.record(t0);
        debouncer.record(t0 + Duration::from_millis(150));
        // The first event's deadline passes unfired; the burst settles from
        // its final event.
        assert!(!debouncer.ready(t0 + Duration::from_millis(200)));
        assert!(debouncer.ready(t0 + Duration::from_millis(350)));
    }

    #[test]
    fn debouncer_idle_without_events() {
        let mut debouncer = ResizeDebouncer::new(Duration::from_millis(200));
        assert!(!debouncer.is_pending());
        assert!(!debouncer.ready(Instant::now()));
    }
}
