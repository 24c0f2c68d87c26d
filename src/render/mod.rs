//! Result rendering: analysis cards, the trend chart canvas and the explanation text.
//!
//! Rendering always rebuilds the analysis container from scratch. The chart
//! is not drawn here; [`render_results`] hands back a [`PendingChart`] that the
//! caller schedules after the configured deferral, so the canvas exists
//! before anything is drawn into it.

pub mod chart;
pub mod markup;
pub mod raster;

use crate::error::RenderError;
use crate::model::{AnalysisResult, ChartSpec};
use crate::ports::ChartRenderer;
use chart::{build_line_chart, LineChartConfig};
use markup::format_analysis_text;

pub const DEFAULT_VARIANCE_TITLE: &str = "Variance Analysis";
pub const DEFAULT_TREND_TITLE: &str = "Trend Analysis";
pub const EXPLANATION_TEXT: &str = "The AI-powered analysis highlights the key developments and trends for the selected segment. The data was automatically extracted from the available documents and economic indicators.";

pub type CanvasId = u64;

/// Drawing surface attached to the trend card.
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    pub id: CanvasId,
    pub chart: Option<LineChartConfig>,
    /// PNG snapshot of the drawn chart, embedded into document exports.
    pub snapshot_png: Option<Vec<u8>>,
}

impl Canvas {
    pub fn new(id: CanvasId) -> Self {
        Self {
            id,
            chart: None,
            snapshot_png: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardKind {
    Variance,
    Trend,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisCard {
    pub kind: CardKind,
    pub title: String,
    /// Formatter output for the card body.
    pub body_markup: Option<String>,
    pub summary: Option<String>,
    pub canvas: Option<Canvas>,
}

/// Chart waiting for its canvas to be drawn into.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingChart {
    pub canvas: CanvasId,
    pub spec: ChartSpec,
}

pub(crate) fn title_or(title: &Option<String>, default: &str) -> String {
    match title {
        Some(t) if !t.is_empty() => t.clone(),
        _ => default.to_string(),
    }
}

/// Replace `container` with cards for `result` and set the explanation text.
pub fn render_results(
    result: &AnalysisResult,
    container: &mut Vec<AnalysisCard>,
    explanation: &mut String,
    next_canvas: &mut CanvasId,
) -> Option<PendingChart> {
    container.clear();
    let mut pending = None;

    if let Some(variance) = &result.variance_analysis {
        container.push(AnalysisCard {
            kind: CardKind::Variance,
            title: title_or(&variance.title, DEFAULT_VARIANCE_TITLE),
            body_markup: Some(format_analysis_text(&variance.content)),
            summary: None,
            canvas: None,
        });
    }

    if let Some(trend) = &result.trend_analysis {
        let canvas = result.chart.as_ref().map(|spec| {
            *next_canvas += 1;
            pending = Some(PendingChart {
                canvas: *next_canvas,
                spec: spec.clone(),
            });
            Canvas::new(*next_canvas)
        });
        container.push(AnalysisCard {
            kind: CardKind::Trend,
            title: title_or(&trend.title, DEFAULT_TREND_TITLE),
            body_markup: None,
            summary: trend.summary.clone().filter(|s| !s.is_empty()),
            canvas,
        });
    }

    *explanation = EXPLANATION_TEXT.to_string();
    pending
}

/// Find a canvas that is still attached to the container.
pub fn find_canvas(container: &mut [AnalysisCard], id: CanvasId) -> Option<&mut Canvas> {
    container
        .iter_mut()
        .filter_map(|card| card.canvas.as_mut())
        .find(|canvas| canvas.id == id)
}

/// Draw a deferred chart. Fails without touching anything if the canvas was
/// replaced by a later render or no renderer is available.
pub fn draw_deferred_chart(
    container: &mut [AnalysisCard],
    id: CanvasId,
    spec: &ChartSpec,
    renderer: Option<&dyn ChartRenderer>,
) -> Result<(), RenderError> {
    let canvas = find_canvas(container, id).ok_or(RenderError::CanvasDetached(id))?;
    let renderer = renderer.ok_or(RenderError::ChartRendererUnavailable)?;
    renderer.draw(canvas, build_line_chart(spec))
}

/// PNG of the drawn trend chart, if any.
pub fn chart_snapshot(container: &[AnalysisCard]) -> Option<&[u8]> {
    container
        .iter()
        .filter_map(|card| card.canvas.as_ref())
        .find_map(|canvas| canvas.snapshot_png.as_deref())
}
