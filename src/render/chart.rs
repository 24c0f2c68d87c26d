//! Line-chart construction from the service's time series.
//!
//! [`build_line_chart`] is pure: it filters fiscal-year columns, shortens
//! labels, assigns the secondary index to the right axis and computes both
//! axis ranges. Renderers only consume the resulting [`LineChartConfig`].

use crate::model::{ChartSpec, Dataset};
use serde::Serialize;

/// Labels starting with this prefix are yearly aggregates and are not plotted.
pub const FISCAL_YEAR_PREFIX: &str = "FY";
/// Dataset labels containing this marker are plotted against the right axis.
pub const SECONDARY_MARKER: &str = "IFO";
pub const PRIMARY_AXIS_ID: &str = "y";
pub const SECONDARY_AXIS_ID: &str = "y1";

const LABEL_SHORTENING: (&str, &str) = (" 20", " '");
const AXIS_STEP: f64 = 5.0;
const SECONDARY_FALLBACK_RANGE: AxisRange = AxisRange {
    min: 70.0,
    max: 110.0,
};
const SECONDARY_BORDER: &str = "#34A853";
const SECONDARY_BACKGROUND: &str = "rgba(52, 168, 83, 0.2)";
const PRIMARY_PALETTE: &[(&str, &str)] = &[
    ("#4285F4", "rgba(66, 133, 244, 0.2)"),
    ("#EA4335", "rgba(234, 67, 53, 0.2)"),
    ("#FBBC05", "rgba(251, 188, 5, 0.2)"),
];

pub const CHART_TITLE: &str = "Provision for Credit Losses Over Time";
const X_AXIS_TITLE: &str = "Time Period";
const PRIMARY_AXIS_TITLE: &str = "Provision for Credit Losses (bps)";
const SECONDARY_AXIS_TITLE: &str = "IFO Business Climate Index";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AxisPosition {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisConfig {
    pub id: &'static str,
    pub title: String,
    pub position: AxisPosition,
    pub display: bool,
    /// `None` lets the renderer fit the axis to the data.
    pub range: Option<AxisRange>,
    pub grid_on_chart_area: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub label: String,
    pub points: Vec<Option<f64>>,
    pub border_color: String,
    pub background_color: String,
    pub axis_id: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineChartConfig {
    pub title: String,
    pub labels: Vec<String>,
    pub series: Vec<Series>,
    pub x_title: String,
    pub primary_axis: AxisConfig,
    pub secondary_axis: Option<AxisConfig>,
    pub tooltip_decimals: usize,
}

impl LineChartConfig {
    /// Tooltip line for one point, e.g. `LLP (bps): 12.50 bps`.
    pub fn tooltip_label(&self, series: &Series, value: Option<f64>) -> String {
        let mut label = series.label.clone();
        if !label.is_empty() {
            label.push_str(": ");
        }
        if let Some(v) = value {
            label.push_str(&format!("{:.*}", self.tooltip_decimals, v));
            if series.label.contains("bps") {
                label.push_str(" bps");
            }
        }
        label
    }

    /// Crosshair readout for one x position: the column label, then every
    /// dataset with a value there, whether or not a point sits under the cursor.
    pub fn readout(&self, index: usize) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(label) = self.labels.get(index) {
            lines.push(label.clone());
        }
        for series in &self.series {
            if let Some(Some(value)) = series.points.get(index) {
                lines.push(self.tooltip_label(series, Some(*value)));
            }
        }
        lines
    }

    pub fn axis_for(&self, series: &Series) -> &AxisConfig {
        match (&self.secondary_axis, series.axis_id) {
            (Some(axis), SECONDARY_AXIS_ID) => axis,
            _ => &self.primary_axis,
        }
    }

    /// Number of x positions the chart spans.
    pub fn point_count(&self) -> usize {
        self.series
            .iter()
            .map(|s| s.points.len())
            .chain(std::iter::once(self.labels.len()))
            .max()
            .unwrap_or(0)
    }
}

fn shorten_label(label: &str) -> String {
    label.replace(LABEL_SHORTENING.0, LABEL_SHORTENING.1)
}

/// Floor/ceil the data's extent to multiples of 5. Returns `None` without data.
pub fn rounded_range<I>(values: I) -> Option<AxisRange>
where
    I: IntoIterator<Item = f64>,
{
    let (min, max) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })?;
    let lo = (min / AXIS_STEP).floor() * AXIS_STEP;
    let mut hi = (max / AXIS_STEP).ceil() * AXIS_STEP;
    if hi <= lo {
        hi = lo + AXIS_STEP;
    }
    Some(AxisRange { min: lo, max: hi })
}

fn is_secondary(dataset: &Dataset) -> bool {
    dataset.label.contains(SECONDARY_MARKER)
}

/// Build the line-chart configuration for a trend card.
pub fn build_line_chart(spec: &ChartSpec) -> LineChartConfig {
    let dropped: Vec<usize> = spec
        .labels
        .iter()
        .enumerate()
        .filter(|(_, label)| label.starts_with(FISCAL_YEAR_PREFIX))
        .map(|(i, _)| i)
        .collect();

    let labels: Vec<String> = spec
        .labels
        .iter()
        .enumerate()
        .filter(|(i, _)| !dropped.contains(i))
        .map(|(_, label)| shorten_label(label))
        .collect();

    let secondary_index = spec.datasets.iter().position(is_secondary);

    let mut palette = PRIMARY_PALETTE.iter().cycle();
    let series: Vec<Series> = spec
        .datasets
        .iter()
        .enumerate()
        .map(|(idx, ds)| {
            let points = ds
                .data
                .iter()
                .enumerate()
                .filter(|(i, _)| !dropped.contains(i))
                .map(|(_, v)| *v)
                .collect();
            if Some(idx) == secondary_index {
                Series {
                    label: ds.label.clone(),
                    points,
                    border_color: SECONDARY_BORDER.to_string(),
                    background_color: SECONDARY_BACKGROUND.to_string(),
                    axis_id: SECONDARY_AXIS_ID,
                }
            } else {
                let (border, background) = palette.next().copied().unwrap_or(PRIMARY_PALETTE[0]);
                Series {
                    label: ds.label.clone(),
                    points,
                    border_color: ds.border_color.clone().unwrap_or_else(|| border.to_string()),
                    background_color: ds
                        .background_color
                        .clone()
                        .unwrap_or_else(|| background.to_string()),
                    axis_id: PRIMARY_AXIS_ID,
                }
            }
        })
        .collect();

    let primary_range = rounded_range(
        series
            .iter()
            .filter(|s| s.axis_id == PRIMARY_AXIS_ID)
            .flat_map(|s| s.points.iter().flatten().copied()),
    );

    let secondary_axis = series
        .iter()
        .find(|s| s.axis_id == SECONDARY_AXIS_ID)
        .map(|s| AxisConfig {
            id: SECONDARY_AXIS_ID,
            title: SECONDARY_AXIS_TITLE.to_string(),
            position: AxisPosition::Right,
            display: true,
            range: Some(
                rounded_range(s.points.iter().flatten().copied())
                    .unwrap_or(SECONDARY_FALLBACK_RANGE),
            ),
            grid_on_chart_area: false,
        });

    LineChartConfig {
        title: CHART_TITLE.to_string(),
        labels,
        series,
        x_title: X_AXIS_TITLE.to_string(),
        primary_axis: AxisConfig {
            id: PRIMARY_AXIS_ID,
            title: PRIMARY_AXIS_TITLE.to_string(),
            position: AxisPosition::Left,
            display: true,
            range: primary_range,
            grid_on_chart_area: true,
        },
        secondary_axis,
        tooltip_decimals: 2,
    }
}
