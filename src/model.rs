use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Segments offered on the first wizard step.
pub const SEGMENT_OPTIONS: &[&str] = &["Retail", "Corporate", "Investment", "Total"];

/// KPIs offered on the second wizard step.
pub const KPI_OPTIONS: &[&str] = &[
    "NPL",
    "LLP",
    "RAROC",
    "Cost/Income",
    "Net Interest Income",
    "Ifo",
    "PMI",
];

#[derive(Debug, Clone)]
pub struct WizardConfig {
    pub endpoint: String,
    pub request_timeout: Duration,
    /// Delay between rendering the trend card and drawing its chart.
    pub chart_deferral: Duration,
    pub export_dir: std::path::PathBuf,
    pub user_agent: String,
}

/// Metadata of a file picked in one of the upload targets. Contents are never read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub name: String,
    pub size_bytes: u64,
}

impl FileRef {
    pub fn new(name: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            name: name.into(),
            size_bytes,
        }
    }

    /// Read name and size of a file on disk.
    pub fn from_path(path: &std::path::Path) -> std::io::Result<Self> {
        let meta = std::fs::metadata(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self {
            name,
            size_bytes: meta.len(),
        })
    }
}

/// Body of the analysis POST.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub segment: Option<String>,
    pub kpis: Vec<String>,
    pub comments: String,
    #[serde(rename = "mainDocuments")]
    pub primary_file_names: Vec<String>,
    #[serde(rename = "additionalDocuments")]
    pub supplementary_file_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSection {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub summary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default, alias = "varianceAnalysis")]
    pub variance_analysis: Option<Section>,
    #[serde(default, alias = "trendAnalysis")]
    pub trend_analysis: Option<TrendSection>,
    #[serde(default)]
    pub chart: Option<ChartSpec>,
}

/// Time series returned by the service, in the shape a line-chart library consumes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChartSpec {
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub datasets: Vec<Dataset>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub data: Vec<Option<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, rename = "yAxisID", skip_serializing_if = "Option::is_none")]
    pub y_axis_id: Option<String>,
    // Remaining display hints (fill, tension, ...) pass through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Envelope returned by the analysis endpoint.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalysisResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub result: Option<AnalysisResult>,
    #[serde(default)]
    pub message: Option<String>,
}
