//! TUI application state and event loop.
//!
//! Design: four linked panels over one selection hub. The focused panel
//! owns the arrow keys; every selection write goes through the hub and the
//! other panels pick it up on the next frame's pump — one recomputation per
//! rendered frame no matter how fast the keys repeat.

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;

use ramanview_core::views::{
    MetadataScatterView, RadialHeatmapView, ResizeDebouncer, SpectralSeriesView,
};
use ramanview_core::{EngineConfig, FlowView, GridCell, NormalizedCohort, SelectionHub};

/// Frame poll interval; selection pumps run once per frame.
const TICK: Duration = Duration::from_millis(50);

// ---------------------------------------------------------------------------
// Panel focus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Panel {
    #[default]
    Cohort,
    Flow,
    Series,
    Heatmap,
}

impl Panel {
    pub fn next(self) -> Self {
        match self {
            Self::Cohort => Self::Flow,
            Self::Flow => Self::Series,
            Self::Series => Self::Heatmap,
            Self::Heatmap => Self::Cohort,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Cohort => "Cohort",
            Self::Flow => "Flow",
            Self::Series => "Series",
            Self::Heatmap => "Heatmap",
        }
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct App {
    cohort: Arc<NormalizedCohort>,
    hub: Arc<SelectionHub>,
    config: EngineConfig,
    flow: FlowView,
    scatter: MetadataScatterView,
    series: SpectralSeriesView,
    heatmap: RadialHeatmapView,
    focus: Panel,
    running: bool,
    patient_cursor: usize,
    flow_cursor: usize,
    /// Folded-grid cursor driven by the arrow keys when the heatmap panel
    /// has focus; Enter promotes it to the shared selected cell.
    cell_cursor: GridCell,
    /// Wavelength extent of the loaded spectra, if any.
    wavelength_range: Option<(f64, f64)>,
    resize: ResizeDebouncer,
}

impl App {
    pub fn new(cohort: NormalizedCohort, config: EngineConfig) -> Self {
        let cohort = Arc::new(cohort);
        let hub = Arc::new(SelectionHub::new());

        let wavelength_range = cohort
            .measurements
            .iter()
            .flat_map(|m| m.series.iter().map(|p| p.wavelength))
            .fold(None, |acc: Option<(f64, f64)>, w| match acc {
                None => Some((w, w)),
                Some((lo, hi)) => Some((lo.min(w), hi.max(w))),
            });

        let flow = FlowView::new(&cohort, &config.flow_levels);
        let scatter = MetadataScatterView::new(Arc::clone(&cohort), Arc::clone(&hub));
        let series =
            SpectralSeriesView::new(Arc::clone(&cohort), Arc::clone(&hub), config.mirror);
        let heatmap = RadialHeatmapView::new(
            Arc::clone(&cohort),
            Arc::clone(&hub),
            config.mirror,
            config.layout,
            config.wavelength_step,
            config.intensity_clip,
        );

        let resize = ResizeDebouncer::new(config.resize_settle);
        Self {
            cohort,
            hub,
            config,
            flow,
            scatter,
            series,
            heatmap,
            focus: Panel::default(),
            running: true,
            patient_cursor: 0,
            flow_cursor: 0,
            cell_cursor: GridCell { line: 1, ring: 1 },
            wavelength_range,
            resize,
        }
    }

    pub fn run(&mut self) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        // Install panic hook that restores terminal before printing the panic.
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen, crossterm::cursor::Show);
            original_hook(info);
        }));

        let result = self.run_loop(&mut terminal);

        let _ = std::panic::take_hook();
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            crossterm::cursor::Show
        )?;

        result
    }

    fn run_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> io::Result<()> {
        while self.running {
            // Coalesce whatever selection writes arrived since the last
            // frame into at most one recomputation per panel.
            self.pump_views();

            terminal.draw(|f| super::ui::draw(f, self))?;

            if event::poll(TICK)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        self.handle_key(key.code);
                    }
                    Event::Resize(..) => self.resize.record(Instant::now()),
                    _ => {}
                }
            }

            // A settled resize burst re-derives every panel in full; the
            // last event in the burst wins.
            if self.resize.ready(Instant::now()) {
                self.scatter.refresh();
                self.series.refresh();
                self.heatmap.refresh();
            }
        }
        Ok(())
    }

    fn pump_views(&mut self) {
        self.scatter.pump();
        self.series.pump();
        self.heatmap.pump();
    }

    pub(crate) fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::Char('c') => {
                // Clearing is always explicit: three null writes.
                self.hub.set_selected_patient(None);
                self.hub.set_selected_wavelength(None);
                self.hub.set_selected_cell(None);
            }
            KeyCode::Up | KeyCode::Char('k') => self.cursor_up(),
            KeyCode::Down | KeyCode::Char('j') => self.cursor_down(),
            KeyCode::Left | KeyCode::Char('h') => self.cursor_left(),
            KeyCode::Right | KeyCode::Char('l') => self.cursor_right(),
            KeyCode::Enter | KeyCode::Char(' ') => self.activate(),
            _ => {}
        }
    }

    fn cursor_up(&mut self) {
        match self.focus {
            Panel::Cohort => self.patient_cursor = self.patient_cursor.saturating_sub(1),
            Panel::Flow => self.flow_cursor = self.flow_cursor.saturating_sub(1),
            Panel::Heatmap => {
                let half = self.config.mirror.physical_half().max(1);
                self.cell_cursor.ring = (self.cell_cursor.ring + 1).min(half);
            }
            Panel::Series => {}
        }
    }

    fn cursor_down(&mut self) {
        match self.focus {
            Panel::Cohort => {
                let last = self.cohort.patients.len().saturating_sub(1);
                self.patient_cursor = (self.patient_cursor + 1).min(last);
            }
            Panel::Flow => {
                let last = self.flow.graph().nodes.len().saturating_sub(1);
                self.flow_cursor = (self.flow_cursor + 1).min(last);
            }
            Panel::Heatmap => self.cell_cursor.ring = self.cell_cursor.ring.saturating_sub(1).max(1),
            Panel::Series => {}
        }
    }

    fn cursor_left(&mut self) {
        match self.focus {
            Panel::Heatmap => {
                self.cell_cursor.line = self.cell_cursor.line.saturating_sub(1).max(1)
            }
            _ => self.step_wavelength(-1.0),
        }
    }

    fn cursor_right(&mut self) {
        match self.focus {
            Panel::Heatmap => {
                let total = self.config.mirror.line_total().max(1);
                self.cell_cursor.line = (self.cell_cursor.line + 1).min(total);
            }
            _ => self.step_wavelength(1.0),
        }
    }

    /// Move the shared wavelength cursor by one sampling step, clamped to
    /// the observed extent. Every step is a hub write; the heatmap panel
    /// coalesces however many arrive per frame.
    fn step_wavelength(&mut self, direction: f64) {
        let Some((lo, hi)) = self.wavelength_range else {
            return;
        };
        let current = self.hub.snapshot().wavelength.unwrap_or(lo);
        let next = (current + direction * self.config.wavelength_step).clamp(lo, hi);
        self.hub.set_selected_wavelength(Some(next));
    }

    fn activate(&mut self) {
        match self.focus {
            Panel::Cohort => {
                if let Some(patient) = self.cohort.patients.get(self.patient_cursor) {
                    self.scatter.select_patient(Some(&patient.id));
                }
            }
            Panel::Flow => {
                if let Some(&id) = self.flow_display_order().get(self.flow_cursor) {
                    self.flow.toggle_node(id);
                }
            }
            Panel::Heatmap => self.hub.set_selected_cell(Some(self.cell_cursor)),
            Panel::Series => {}
        }
    }

    /// Node ids in display order: grouped by level, stable within a level.
    pub fn flow_display_order(&self) -> Vec<usize> {
        let mut ids: Vec<usize> = (0..self.flow.graph().nodes.len()).collect();
        ids.sort_by_key(|&id| (self.flow.graph().nodes[id].level, id));
        ids
    }

    // --- Accessors for rendering ---

    pub fn cohort(&self) -> &NormalizedCohort {
        &self.cohort
    }
    pub fn hub(&self) -> &SelectionHub {
        &self.hub
    }
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
    pub fn focus(&self) -> Panel {
        self.focus
    }
    pub fn patient_cursor(&self) -> usize {
        self.patient_cursor
    }
    pub fn flow_cursor(&self) -> usize {
        self.flow_cursor
    }
    pub fn cell_cursor(&self) -> GridCell {
        self.cell_cursor
    }
    pub fn flow(&self) -> &FlowView {
        &self.flow
    }
    pub fn scatter(&self) -> &MetadataScatterView {
        &self.scatter
    }
    pub fn series(&self) -> &SpectralSeriesView {
        &self.series
    }
    pub fn heatmap(&self) -> &RadialHeatmapView {
        &self.heatmap
    }
    pub fn wavelength_range(&self) -> Option<(f64, f64)> {
        self.wavelength_range
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
