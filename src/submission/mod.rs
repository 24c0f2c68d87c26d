//! Submission pipeline: `Idle -> Submitting -> {Succeeded, Failed}`.
//!
//! The pipeline never performs I/O itself. [`begin`] prepares the request and
//! the overlay; the orchestrator runs the request through an
//! [`client::AnalysisService`] and feeds the outcome back to [`settle`].
//! There is no in-flight guard: every submit issues a request and the last
//! response to arrive wins.

pub mod client;

use crate::error::SubmitError;
use crate::model::{AnalysisRequest, AnalysisResponse, AnalysisResult};
use crate::wizard::state::WizardState;
use crate::wizard::view::View;
use tracing::{error, info, warn};

const UNKNOWN_ERROR: &str = "Unknown error";
const MISSING_RESULT: &str = "analysis response did not include a result";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubmissionPhase {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    Failed(SubmitError),
}

pub fn build_request(state: &WizardState) -> AnalysisRequest {
    AnalysisRequest {
        segment: state.segment.clone(),
        kpis: state.kpis.iter().cloned().collect(),
        comments: state.comments.clone(),
        primary_file_names: state.primary_files.iter().map(|f| f.name.clone()).collect(),
        supplementary_file_names: state
            .supplementary_files
            .iter()
            .map(|f| f.name.clone())
            .collect(),
    }
}

/// Enter Submitting: clear old results, show the overlay, build the request.
pub fn begin(state: &mut WizardState, view: &mut View, phase: &mut SubmissionPhase) -> AnalysisRequest {
    if *phase == SubmissionPhase::Submitting {
        warn!("submitting while a previous request is still outstanding");
    }
    state.results = None;
    view.show_overlay();
    *phase = SubmissionPhase::Submitting;
    let request = build_request(state);
    info!(
        segment = ?request.segment,
        kpis = request.kpis.len(),
        primary = request.primary_file_names.len(),
        supplementary = request.supplementary_file_names.len(),
        "submitting analysis request"
    );
    request
}

/// Reduce a service outcome to either a result or the reason for failure.
pub fn classify(outcome: Result<AnalysisResponse, SubmitError>) -> Result<AnalysisResult, SubmitError> {
    let response = outcome?;
    if !response.success {
        return Err(SubmitError::Application(
            response.message.unwrap_or_else(|| UNKNOWN_ERROR.to_string()),
        ));
    }
    response
        .result
        .ok_or_else(|| SubmitError::Transport(MISSING_RESULT.to_string()))
}

/// Leave Submitting. On success the result is stored and returned for
/// rendering; on failure the alert is queued. The overlay goes either way.
pub fn settle(
    outcome: Result<AnalysisResponse, SubmitError>,
    state: &mut WizardState,
    view: &mut View,
    phase: &mut SubmissionPhase,
) -> Option<AnalysisResult> {
    match classify(outcome) {
        Ok(result) => {
            info!("analysis received");
            state.results = Some(result.clone());
            view.remove_overlay();
            *phase = SubmissionPhase::Succeeded;
            Some(result)
        }
        Err(err) => {
            error!(error = %err, "analysis failed");
            view.remove_overlay();
            view.push_alert(err.alert_text());
            *phase = SubmissionPhase::Failed(err);
            None
        }
    }
}
