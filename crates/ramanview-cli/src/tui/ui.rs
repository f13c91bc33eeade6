//! TUI rendering — four linked panels.
//!
//! ┌──────────────────────────────────────────────────┐
//! │  ramanview    P1 · 801.32 · (7,11)    24 patients│
//! ├──────────────────────────┬───────────────────────┤
//! │  Flow                    │  Age vs BMI           │
//! │  BMI                     │   ·  ·   ●            │
//! │   ▸ Overweight   14 →    │     · ·      ·        │
//! │     Average      8 →     │  ·      ·             │
//! │  Stage                   │                       │
//! │   ● Late Stage   9 →     │                       │
//! ├──────────────────────────┼───────────────────────┤
//! │  Spectra (line 2 ring 5) │  Radial grid          │
//! │  ~~~/\~~~~_/\__          │      ▄▀▀▄             │
//! │  ___/~\______            │    ▐ ▖  ▌ ▌           │
//! │                          │      ▀▄▄▀             │
//! ├──────────────────────────┴───────────────────────┤
//! │  tab: focus   ↑↓←→ navigate   enter: select      │
//! └──────────────────────────────────────────────────┘

use ratatui::{
    prelude::*,
    widgets::{canvas::Canvas, canvas::Points, Block, Borders, Paragraph, Wrap},
};

use ramanview_core::views::TraceEmphasis;
use ramanview_core::{arc_span, ring_radius, record};

use super::app::{App, Panel};

pub fn draw(f: &mut Frame, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // title
            Constraint::Min(10),   // panels
            Constraint::Length(1), // keys
        ])
        .split(f.area());

    draw_title(f, rows[0], app);
    draw_panels(f, rows[1], app);
    draw_keys(f, rows[2]);
}

fn draw_title(f: &mut Frame, area: Rect, app: &App) {
    let selection = app.hub().snapshot();
    let patient = selection.patient.as_deref().unwrap_or("—");
    let wavelength = selection
        .wavelength
        .map(|w| format!("{w:.2}"))
        .unwrap_or_else(|| "—".to_string());
    let cell = selection
        .cell
        .map(|c| format!("({},{})", c.line, c.ring))
        .unwrap_or_else(|| "—".to_string());

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Line::from(vec![
            Span::styled(" ramanview ", Style::default().bold().fg(Color::Cyan)),
            Span::raw("  patient: "),
            Span::styled(patient, Style::default().bold().fg(Color::Yellow)),
            Span::raw("  λ: "),
            Span::styled(wavelength, Style::default().bold().fg(Color::Yellow)),
            Span::raw("  cell: "),
            Span::styled(cell, Style::default().bold().fg(Color::Yellow)),
            Span::styled(
                format!(
                    "  {} patients · {} cells  [{}] ",
                    app.cohort().patients.len(),
                    app.cohort().measurements.len(),
                    app.focus().label()
                ),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
    f.render_widget(block, area);
}

fn draw_panels(f: &mut Frame, area: Rect, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);
    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(rows[0]);
    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(rows[1]);

    draw_flow(f, top[0], app);
    draw_scatter(f, top[1], app);
    draw_series(f, bottom[0], app);
    draw_heatmap(f, bottom[1], app);
}

fn panel_block(title: &str, focused: bool) -> Block<'_> {
    let style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(style)
        .title(format!(" {title} "))
}

fn placeholder_widget<'a>(message: &'a str, block: Block<'a>) -> Paragraph<'a> {
    Paragraph::new(message)
        .style(Style::default().fg(Color::DarkGray))
        .block(block)
}

// ---------------------------------------------------------------------------
// Flow panel
// ---------------------------------------------------------------------------

fn draw_flow(f: &mut Frame, area: Rect, app: &App) {
    let focused = app.focus() == Panel::Flow;
    let block = panel_block("Metadata Flow (enter: toggle node)", focused);
    let graph = app.flow().graph();

    if let Some(message) = app.flow().placeholder() {
        f.render_widget(placeholder_widget(message, block), area);
        return;
    }

    let order = app.flow_display_order();
    let mut lines: Vec<Line> = Vec::new();
    let mut last_level = usize::MAX;
    for (display_idx, &id) in order.iter().enumerate() {
        let node = &graph.nodes[id];
        if node.level != last_level {
            last_level = node.level;
            let label = app
                .flow()
                .levels()
                .get(node.level)
                .map(|l| l.label())
                .unwrap_or("?");
            lines.push(Line::from(Span::styled(
                label,
                Style::default().bold().fg(Color::Cyan),
            )));
        }

        let pointer = if focused && display_idx == app.flow_cursor() {
            "▸"
        } else {
            " "
        };
        let marker = if graph.selected_node() == Some(id) {
            "●"
        } else {
            " "
        };
        let outgoing: u64 = graph
            .edges
            .iter()
            .filter(|e| e.source == id)
            .map(|e| e.weight as u64)
            .sum();
        let incoming: u64 = graph
            .edges
            .iter()
            .filter(|e| e.target == id)
            .map(|e| e.weight as u64)
            .sum();
        let count = if outgoing > 0 { outgoing } else { incoming };

        let style = if graph.selected_node() == Some(id) {
            Style::default().fg(Color::Yellow).bold()
        } else if graph.selected_node().is_some()
            && !graph
                .edges
                .iter()
                .any(|e| (e.source == id || e.target == id)
                    && e.emphasis == ramanview_core::EdgeEmphasis::Active)
        {
            // Everything not touching the toggled node dims with its edges.
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(
            format!("  {pointer}{marker} {:<26} {count:>4}", node.label),
            style,
        )));
    }

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false }).block(block);
    f.render_widget(paragraph, area);
}

// ---------------------------------------------------------------------------
// Scatter panel
// ---------------------------------------------------------------------------

fn stage_color(stage: &str) -> Color {
    match stage {
        record::STAGE_HEALTHY => Color::Green,
        record::STAGE_EARLY => Color::Yellow,
        record::STAGE_LATE => Color::Red,
        _ => Color::White,
    }
}

fn draw_scatter(f: &mut Frame, area: Rect, app: &App) {
    let focused = app.focus() == Panel::Cohort;
    let out = app.scatter().output();
    let block = panel_block("Age vs BMI (enter: select patient)", focused);

    if let Some(message) = out.placeholder {
        f.render_widget(placeholder_widget(message, block), area);
        return;
    }

    let (age_lo, age_hi) = extent(out.points.iter().map(|p| p.age));
    let (bmi_lo, bmi_hi) = extent(out.points.iter().map(|p| p.bmi));

    let mut lines: Vec<Line> = Vec::new();
    for (i, point) in out.points.iter().enumerate() {
        let pointer = if focused && i == app.patient_cursor() {
            "▸"
        } else {
            " "
        };
        let marker = if point.highlighted { "●" } else { "·" };
        let style = if point.highlighted {
            Style::default().fg(Color::White).bold()
        } else {
            Style::default().fg(stage_color(&point.stage))
        };
        lines.push(Line::from(Span::styled(
            format!(
                "{pointer}{marker} {:<8} age {:>5.1}  bmi {:>5.1}  {}",
                point.patient_id, point.age, point.bmi, point.stage
            ),
            style,
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!("ages [{age_lo:.0}, {age_hi:.0}]  bmi [{bmi_lo:.1}, {bmi_hi:.1}]"),
        Style::default().fg(Color::DarkGray),
    )));
    for mean in &out.stage_means {
        lines.push(Line::from(Span::styled(
            format!(
                "{:<12} mean age {:>5.1}  mean bmi {:>5.1}",
                mean.stage, mean.mean_age, mean.mean_bmi
            ),
            Style::default().fg(stage_color(&mean.stage)),
        )));
    }

    let paragraph = Paragraph::new(lines).block(block);
    f.render_widget(paragraph, area);
}

fn extent(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::MAX, f64::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)))
}

// ---------------------------------------------------------------------------
// Series panel
// ---------------------------------------------------------------------------

fn draw_series(f: &mut Frame, area: Rect, app: &App) {
    use ratatui::widgets::{Axis, Chart, Dataset, GraphType};

    let focused = app.focus() == Panel::Series;
    let out = app.series().output();
    let title = match &out.patient {
        Some(patient) => format!("Spectra — {patient} (←→: wavelength)"),
        None => "Spectra (←→: wavelength)".to_string(),
    };
    let block = panel_block(&title, focused);

    if let Some(message) = out.placeholder {
        f.render_widget(placeholder_widget(message, block), area);
        return;
    }

    let data: Vec<(TraceEmphasis, Vec<(f64, f64)>)> = out
        .traces
        .iter()
        .map(|t| {
            (
                t.emphasis,
                t.points
                    .iter()
                    .map(|p| (p.wavelength, p.intensity))
                    .collect(),
            )
        })
        .collect();

    let (x_lo, x_hi) = app.wavelength_range().unwrap_or((0.0, 1.0));
    let y_hi = data
        .iter()
        .flat_map(|(_, points)| points.iter().map(|&(_, y)| y))
        .fold(1.0_f64, f64::max);

    let datasets: Vec<Dataset> = data
        .iter()
        .map(|(emphasis, points)| {
            let color = match emphasis {
                TraceEmphasis::Full => Color::Cyan,
                TraceEmphasis::Suppressed => Color::DarkGray,
            };
            Dataset::default()
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(color))
                .data(points)
        })
        .collect();

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(Axis::default().bounds([x_lo, x_hi]).labels(vec![
            Line::from(format!("{x_lo:.1}")),
            Line::from(format!("{x_hi:.1}")),
        ]))
        .y_axis(Axis::default().bounds([0.0, y_hi * 1.1]).labels(vec![
            Line::from("0"),
            Line::from(format!("{:.1}", y_hi * 1.1)),
        ]));
    f.render_widget(chart, area);
}

// ---------------------------------------------------------------------------
// Heatmap panel
// ---------------------------------------------------------------------------

/// Gradient endpoints of the intensity color ramp.
const RAMP_LOW: (u8, u8, u8) = (255, 137, 187);
const RAMP_HIGH: (u8, u8, u8) = (74, 144, 226);

fn ramp(position: f64) -> Color {
    let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * position).round() as u8;
    Color::Rgb(
        lerp(RAMP_LOW.0, RAMP_HIGH.0),
        lerp(RAMP_LOW.1, RAMP_HIGH.1),
        lerp(RAMP_LOW.2, RAMP_HIGH.2),
    )
}

fn draw_heatmap(f: &mut Frame, area: Rect, app: &App) {
    let focused = app.focus() == Panel::Heatmap;
    let out = app.heatmap().output();
    let title = format!(
        "Radial grid — domain [{:.2}, {:.2}] (enter: select cell)",
        out.domain.min, out.domain.max
    );
    let block = panel_block(&title, focused);

    if let Some(message) = out.placeholder {
        f.render_widget(placeholder_widget(message, block), area);
        return;
    }

    let spec = *app.heatmap().mirror();
    let layout = *app.heatmap().layout();
    let cursor = app.cell_cursor();

    let canvas = Canvas::default()
        .block(block)
        .x_bounds([-1.15, 1.15])
        .y_bounds([-1.15, 1.15])
        .paint(|ctx| {
            for arc in &out.arcs {
                let color = if arc.selected {
                    Color::White
                } else {
                    ramp(out.domain.position(arc.intensity))
                };
                // Trace the sector at its radius; enough points to read as a
                // solid arc at canvas resolution.
                let coords: Vec<(f64, f64)> = (0..=12)
                    .map(|i| {
                        let angle = arc.angle_start
                            + (arc.angle_end - arc.angle_start) * i as f64 / 12.0;
                        (arc.radius * angle.cos(), arc.radius * angle.sin())
                    })
                    .collect();
                ctx.draw(&Points {
                    coords: &coords,
                    color,
                });
            }

            if focused {
                let (a0, a1) = arc_span(cursor.line, spec.line_total());
                let angle = (a0 + a1) / 2.0;
                let radius = ring_radius(cursor.ring, &spec, &layout);
                ctx.draw(&Points {
                    coords: &[(radius * angle.cos(), radius * angle.sin())],
                    color: Color::Yellow,
                });
            }
        });
    f.render_widget(canvas, area);
}

// ---------------------------------------------------------------------------
// Key bar
// ---------------------------------------------------------------------------

fn draw_keys(f: &mut Frame, area: Rect) {
    let bar = Paragraph::new(
        " tab: focus panel   ↑↓←→ navigate   enter: select/toggle   c: clear selection   q: quit",
    )
    .style(Style::default().bg(Color::DarkGray).fg(Color::White));
    f.render_widget(bar, area);
}
