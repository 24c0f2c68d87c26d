use crate::render::chart::{AxisConfig, AxisPosition, AxisRange, LineChartConfig, Series, SECONDARY_AXIS_ID};
use crate::render::Canvas;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

/// `#rrggbb` to a terminal colour; anything else is gray.
pub fn hex_color(hex: &str) -> Color {
    let h = hex.trim().trim_start_matches('#');
    if h.len() == 6 {
        if let Ok(v) = u32::from_str_radix(h, 16) {
            return Color::Rgb((v >> 16) as u8, (v >> 8) as u8, v as u8);
        }
    }
    Color::Gray
}

/// Map a secondary-axis value into the primary range so both series share one plot.
fn to_primary(value: f64, secondary: AxisRange, primary: AxisRange) -> f64 {
    let span = secondary.max - secondary.min;
    if span <= 0.0 {
        return primary.min;
    }
    primary.min + (value - secondary.min) / span * (primary.max - primary.min)
}

/// Contiguous runs of non-null points as `(index, value)` pairs; gaps break the line.
pub fn segments(series: &Series, map: impl Fn(f64) -> f64) -> Vec<Vec<(f64, f64)>> {
    let mut out = Vec::new();
    let mut current = Vec::new();
    for (i, value) in series.points.iter().enumerate() {
        match value {
            Some(v) => current.push((i as f64, map(*v))),
            None if !current.is_empty() => out.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

fn fallback_range(config: &LineChartConfig) -> AxisRange {
    let (lo, hi) = config
        .series
        .iter()
        .flat_map(|s| s.points.iter().flatten())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
    if lo.is_finite() && hi > lo {
        AxisRange { min: lo, max: hi }
    } else {
        AxisRange { min: 0.0, max: 5.0 }
    }
}

fn axis_labels(range: AxisRange) -> Vec<Span<'static>> {
    let mid = (range.min + range.max) / 2.0;
    [range.min, mid, range.max]
        .iter()
        .map(|v| Span::raw(format!("{v:.0}")))
        .collect()
}

/// Tick labels for a standalone axis column, `max` on the first plot row and
/// `min` on the last.
pub fn axis_column(axis: &AxisConfig, range: AxisRange, plot_rows: usize) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(""); plot_rows.max(3)];
    let last = lines.len() - 1;
    lines[0] = Line::from(format!("{:.0}", range.max));
    lines[last / 2] = Line::from(format!("{:.0}", (range.min + range.max) / 2.0));
    lines[last] = Line::from(format!("{:.0}", range.min));
    lines.insert(0, Line::from(Span::styled(axis.id, Style::default().fg(Color::Gray))));
    lines
}

/// Cursor position clamped to the chart's columns.
pub fn cursor_index(config: &LineChartConfig, cursor: usize) -> usize {
    cursor.min(config.point_count().saturating_sub(1))
}

pub fn draw_trend_chart(f: &mut Frame, area: Rect, canvas: &Canvas, cursor: usize) {
    let Some(config) = canvas.chart.as_ref() else {
        let p = Paragraph::new("Rendering chart…")
            .block(Block::default().borders(Borders::ALL).title("Chart"));
        f.render_widget(p, area);
        return;
    };

    let primary = config.primary_axis.range.unwrap_or_else(|| fallback_range(config));
    let secondary_axis = config.secondary_axis.as_ref().filter(|a| a.display);
    let secondary = secondary_axis.and_then(|a| a.range);
    let index = cursor_index(config, cursor);
    let readout = config.readout(index);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(6), Constraint::Length(readout.len() as u16 + 2)])
        .split(area);
    let (plot_area, axis_area) = match (secondary_axis, secondary) {
        (Some(axis), Some(_)) => {
            let cols = if axis.position == AxisPosition::Right {
                [Constraint::Min(10), Constraint::Length(6)]
            } else {
                [Constraint::Length(6), Constraint::Min(10)]
            };
            let split = Layout::default()
                .direction(Direction::Horizontal)
                .constraints(cols)
                .split(rows[0]);
            if axis.position == AxisPosition::Right {
                (split[0], Some(split[1]))
            } else {
                (split[1], Some(split[0]))
            }
        }
        _ => (rows[0], None),
    };

    let mut series_points: Vec<(Style, String, Vec<Vec<(f64, f64)>>)> = Vec::new();
    for s in &config.series {
        let on_secondary = s.axis_id == SECONDARY_AXIS_ID;
        let points = match (on_secondary, secondary) {
            (true, Some(sec)) => segments(s, |v| to_primary(v, sec, primary)),
            _ => segments(s, |v| v),
        };
        let label = if on_secondary {
            format!("{} (right axis)", s.label)
        } else {
            s.label.clone()
        };
        series_points.push((Style::default().fg(hex_color(&s.border_color)), label, points));
    }
    let crosshair = vec![(index as f64, primary.min), (index as f64, primary.max)];

    let mut datasets = vec![Dataset::default()
        .graph_type(GraphType::Line)
        .marker(symbols::Marker::Dot)
        .style(Style::default().fg(Color::DarkGray))
        .data(&crosshair)];
    for (style, label, runs) in &series_points {
        for (i, run) in runs.iter().enumerate() {
            let mut ds = Dataset::default()
                .graph_type(GraphType::Line)
                .marker(symbols::Marker::Braille)
                .style(*style)
                .data(run);
            if i == 0 {
                ds = ds.name(label.clone());
            }
            datasets.push(ds);
        }
    }

    let count = config.point_count().max(1);
    let x_labels: Vec<Span> = match (config.labels.first(), config.labels.last()) {
        (Some(first), Some(last)) if config.labels.len() > 1 => {
            vec![Span::raw(first.clone()), Span::raw(last.clone())]
        }
        (Some(only), _) => vec![Span::raw(only.clone())],
        _ => Vec::new(),
    };

    let mut title = vec![Span::styled(
        config.title.clone(),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    if let Some(axis) = secondary_axis {
        title.push(Span::styled(
            format!("  {}: {}", axis.id, axis.title),
            Style::default().fg(Color::Gray),
        ));
    }

    let chart = Chart::new(datasets)
        .block(Block::default().borders(Borders::ALL).title(Line::from(title)))
        .x_axis(
            Axis::default()
                .title(config.x_title.clone())
                .bounds([0.0, (count - 1).max(1) as f64])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .title(config.primary_axis.title.clone())
                .bounds([primary.min, primary.max])
                .labels(axis_labels(primary)),
        );
    f.render_widget(chart, plot_area);

    if let (Some(col), Some(axis), Some(range)) = (axis_area, secondary_axis, secondary) {
        // Border row on top, border plus x-axis labels and title below.
        let plot_rows = col.height.saturating_sub(5) as usize;
        f.render_widget(Paragraph::new(axis_column(axis, range, plot_rows)), col);
    }

    let lines: Vec<Line> = readout.into_iter().map(Line::from).collect();
    f.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Values (h/l to move)"),
        ),
        rows[1],
    );
}
