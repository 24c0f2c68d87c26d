//! Error types shared by the wizard core, the submission pipeline and the exporters.

use thiserror::Error;

/// A wizard step refused to advance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Bitte wählen Sie ein Segment aus.")]
    MissingSegment,

    #[error("Bitte wählen Sie mindestens eine KPI aus.")]
    NoKpiSelected,
}

/// Why a submission ended in the failed state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// The request never produced a usable HTTP response.
    #[error("{0}")]
    Transport(String),

    #[error("Server responded with {status}: {reason}")]
    Status { status: u16, reason: String },

    /// The service answered but reported `success: false`.
    #[error("{0}")]
    Application(String),
}

impl SubmitError {
    /// Text of the blocking alert shown to the user.
    pub fn alert_text(&self) -> String {
        match self {
            SubmitError::Application(message) => format!("Fehler bei der Analyse: {message}"),
            other => format!("Fehler: {other}"),
        }
    }
}

/// A presentation step could not run; the step is skipped and the rest of the pipeline continues.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no chart renderer configured")]
    ChartRendererUnavailable,

    #[error("no document builder configured")]
    DocumentBuilderUnavailable,

    #[error("canvas {0} is no longer attached to the analysis container")]
    CanvasDetached(u64),

    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("document packaging failed: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no analysis results available")]
    NoResults,

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}
