//! Report exports: plain text and DOCX.

pub mod docx;
pub mod text;

use crate::model::AnalysisResult;
use crate::render::{title_or, DEFAULT_TREND_TITLE, DEFAULT_VARIANCE_TITLE};
use crate::wizard::state::WizardState;
use serde::Serialize;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

pub const TEXT_FILENAME: &str = "variance-analysis-results.txt";
pub const DOCX_FILENAME: &str = "variance-analysis-report.docx";
pub const DOCUMENT_HEADING: &str = "BlueNova Bank Variance Analysis Report";

pub(crate) const NOT_SELECTED: &str = "Not selected";
pub(crate) const NONE_SELECTED: &str = "None selected";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExportFormat {
    Text,
    Docx,
}

impl ExportFormat {
    pub fn filename(self) -> &'static str {
        match self {
            ExportFormat::Text => TEXT_FILENAME,
            ExportFormat::Docx => DOCX_FILENAME,
        }
    }
}

/// Bytes ready to be saved under a fixed filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub filename: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSection {
    pub title: String,
    pub paragraphs: Vec<String>,
}

/// Format-neutral report handed to a [`crate::ports::DocumentBuilder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDocument {
    pub heading: String,
    pub metadata: Vec<String>,
    pub sections: Vec<ReportSection>,
    pub chart_png: Option<Vec<u8>>,
}

/// Local calendar date, UTC if the offset can't be determined.
pub fn today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}

pub fn format_date(date: Date) -> String {
    date.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| date.to_string())
}

pub(crate) fn segment_line(state: &WizardState) -> String {
    format!(
        "Segment: {}",
        state.segment.as_deref().unwrap_or(NOT_SELECTED)
    )
}

pub(crate) fn kpi_line(state: &WizardState) -> String {
    let kpis = if state.kpis.is_empty() {
        NONE_SELECTED.to_string()
    } else {
        state.kpis.iter().cloned().collect::<Vec<_>>().join(", ")
    };
    format!("KPIs: {kpis}")
}

fn paragraphs(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Assemble the document: heading, metadata, one section per non-empty part, chart.
pub fn build_report(
    state: &WizardState,
    results: &AnalysisResult,
    chart_png: Option<&[u8]>,
    date: Date,
) -> ReportDocument {
    let mut sections = Vec::new();

    if let Some(variance) = &results.variance_analysis {
        let body = paragraphs(&variance.content);
        if !body.is_empty() {
            sections.push(ReportSection {
                title: title_or(&variance.title, DEFAULT_VARIANCE_TITLE),
                paragraphs: body,
            });
        }
    }

    if let Some(trend) = &results.trend_analysis {
        let mut body = trend.summary.as_deref().map(paragraphs).unwrap_or_default();
        if body.is_empty() {
            body = paragraphs(&trend.content);
        }
        if !body.is_empty() {
            sections.push(ReportSection {
                title: title_or(&trend.title, DEFAULT_TREND_TITLE),
                paragraphs: body,
            });
        }
    }

    ReportDocument {
        heading: DOCUMENT_HEADING.to_string(),
        metadata: vec![
            segment_line(state),
            kpi_line(state),
            format!("Date: {}", format_date(date)),
        ],
        sections,
        chart_png: chart_png.map(<[u8]>::to_vec),
    }
}
