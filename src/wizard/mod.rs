//! The four-step wizard as an explicitly owned state machine.
//!
//! Every user gesture and every asynchronous completion arrives as an
//! [`Event`]; [`Wizard::handle`] dispatches on `(Component, Action)`, mutates
//! state and view, and returns the [`Command`]s the caller has to execute
//! (HTTP submission, deferred chart drawing, saving downloads). Nothing in
//! here blocks or performs I/O.

pub mod navigator;
pub mod selection;
pub mod state;
pub mod upload;
pub mod view;

use crate::error::{RenderError, SubmitError};
use crate::export::{self, Download, ExportFormat};
use crate::model::{AnalysisRequest, AnalysisResponse, ChartSpec, FileRef, WizardConfig};
use crate::ports::Renderers;
use crate::render::{self, CanvasId};
use crate::submission::{self, SubmissionPhase};
use state::{Step, WizardState};
use std::time::Duration;
use tracing::{info, warn};
use upload::{DragPhase, UploadTarget};
use view::View;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Navigator,
    StepIndicator,
    SegmentPicker,
    KpiPicker,
    Dropzone(UploadTarget),
    CommentBox,
    Submission,
    Results,
    Alert,
}

#[derive(Debug, Clone)]
pub enum Action {
    Next,
    Previous,
    Click(usize),
    Drag(DragPhase),
    FilesSelected(Vec<FileRef>),
    Input(String),
    Settled(Result<AnalysisResponse, SubmitError>),
    ChartDeferralElapsed { canvas: CanvasId, spec: ChartSpec },
    Download(ExportFormat),
    Dismiss,
}

impl Action {
    fn name(&self) -> &'static str {
        match self {
            Action::Next => "next",
            Action::Previous => "previous",
            Action::Click(_) => "click",
            Action::Drag(_) => "drag",
            Action::FilesSelected(_) => "files-selected",
            Action::Input(_) => "input",
            Action::Settled(_) => "settled",
            Action::ChartDeferralElapsed { .. } => "chart-deferral-elapsed",
            Action::Download(_) => "download",
            Action::Dismiss => "dismiss",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Event {
    pub component: Component,
    pub action: Action,
}

impl Event {
    pub fn new(component: Component, action: Action) -> Self {
        Self { component, action }
    }

    pub fn next() -> Self {
        Self::new(Component::Navigator, Action::Next)
    }

    pub fn previous() -> Self {
        Self::new(Component::Navigator, Action::Previous)
    }

    pub fn settled(outcome: Result<AnalysisResponse, SubmitError>) -> Self {
        Self::new(Component::Submission, Action::Settled(outcome))
    }

    pub fn download(format: ExportFormat) -> Self {
        Self::new(Component::Results, Action::Download(format))
    }
}

/// Side effects requested by the wizard.
#[derive(Debug, Clone)]
pub enum Command {
    Submit(AnalysisRequest),
    /// Feed back `ChartDeferralElapsed` for `canvas` after `delay`.
    DrawChartAfter {
        delay: Duration,
        canvas: CanvasId,
        spec: ChartSpec,
    },
    Save(Download),
}

pub struct Wizard {
    state: WizardState,
    view: View,
    phase: SubmissionPhase,
    renderers: Renderers,
    chart_deferral: Duration,
    next_canvas: CanvasId,
}

impl Wizard {
    pub fn new(cfg: &WizardConfig, renderers: Renderers) -> Self {
        Self {
            state: WizardState::default(),
            view: View::default(),
            phase: SubmissionPhase::Idle,
            renderers,
            chart_deferral: cfg.chart_deferral,
            next_canvas: 0,
        }
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn phase(&self) -> &SubmissionPhase {
        &self.phase
    }

    pub fn handle(&mut self, event: Event) -> Vec<Command> {
        let Event { component, action } = event;
        match (component, action) {
            (Component::Navigator, Action::Next) => self.next(),
            (Component::Navigator, Action::Previous) => {
                let index = navigator::previous_index(&self.state);
                navigator::go_to_step(&mut self.state, &mut self.view, index);
                Vec::new()
            }
            (Component::StepIndicator, Action::Click(index)) => self.indicator_click(index),
            (Component::SegmentPicker, Action::Click(index)) => {
                selection::select_segment(&mut self.state, &mut self.view, index);
                Vec::new()
            }
            (Component::KpiPicker, Action::Click(index)) => {
                selection::toggle_kpi(&mut self.state, &mut self.view, index);
                Vec::new()
            }
            (Component::Dropzone(target), Action::Drag(phase)) => {
                upload::drag(&mut self.view, target, phase);
                Vec::new()
            }
            (Component::Dropzone(target), Action::FilesSelected(files)) => {
                upload::select_files(&mut self.state, &mut self.view, target, files);
                Vec::new()
            }
            (Component::CommentBox, Action::Input(value)) => {
                upload::edit_comments(&mut self.state, &mut self.view, value);
                Vec::new()
            }
            (Component::Submission, Action::Settled(outcome)) => self.settle(outcome),
            (Component::Results, Action::ChartDeferralElapsed { canvas, spec }) => {
                let renderer = self.renderers.chart.as_deref();
                if let Err(err) = render::draw_deferred_chart(&mut self.view.analysis, canvas, &spec, renderer) {
                    warn!(error = %err, canvas, "chart not drawn");
                }
                Vec::new()
            }
            (Component::Results, Action::Download(format)) => self.download(format),
            (Component::Alert, Action::Dismiss) => {
                self.view.alerts.pop_front();
                Vec::new()
            }
            (component, action) => {
                warn!(?component, action = action.name(), "event ignored");
                Vec::new()
            }
        }
    }

    fn next(&mut self) -> Vec<Command> {
        match self.state.current_step {
            Step::Segment => {
                if selection::check_segment(&self.state, &mut self.view).is_ok() {
                    navigator::go_to_step(&mut self.state, &mut self.view, 1);
                }
            }
            Step::Kpis => {
                if selection::check_kpis(&self.state, &mut self.view).is_ok() {
                    navigator::go_to_step(&mut self.state, &mut self.view, 2);
                }
            }
            Step::Upload => {
                let request = submission::begin(&mut self.state, &mut self.view, &mut self.phase);
                return vec![Command::Submit(request)];
            }
            Step::Results => {
                let index = navigator::next_index(&self.state);
                navigator::go_to_step(&mut self.state, &mut self.view, index);
            }
        }
        Vec::new()
    }

    fn indicator_click(&mut self, index: usize) -> Vec<Command> {
        let current = self.state.current_step.index();
        if index <= current {
            navigator::go_to_step(&mut self.state, &mut self.view, index as isize);
            Vec::new()
        } else if index == current + 1 {
            self.next()
        } else {
            info!(index, current, "cannot skip ahead");
            Vec::new()
        }
    }

    fn settle(&mut self, outcome: Result<AnalysisResponse, SubmitError>) -> Vec<Command> {
        let Some(result) = submission::settle(outcome, &mut self.state, &mut self.view, &mut self.phase) else {
            return Vec::new();
        };
        let pending = render::render_results(
            &result,
            &mut self.view.analysis,
            &mut self.view.explanation,
            &mut self.next_canvas,
        );
        navigator::go_to_step(&mut self.state, &mut self.view, Step::Results.index() as isize);
        pending
            .map(|p| Command::DrawChartAfter {
                delay: self.chart_deferral,
                canvas: p.canvas,
                spec: p.spec,
            })
            .into_iter()
            .collect()
    }

    fn download(&mut self, format: ExportFormat) -> Vec<Command> {
        let Some(results) = self.state.results.as_ref() else {
            info!(?format, "no analysis results available for download");
            return Vec::new();
        };
        let date = export::today();
        let bytes = match format {
            ExportFormat::Text => export::text::build_text_export(&self.state, results, date).into_bytes(),
            ExportFormat::Docx => {
                let Some(builder) = self.renderers.document.as_deref() else {
                    let err = RenderError::DocumentBuilderUnavailable;
                    warn!(error = %err, "document export skipped");
                    self.view.push_alert(format!("Fehler: {err}"));
                    return Vec::new();
                };
                let snapshot = render::chart_snapshot(&self.view.analysis);
                let document = export::build_report(&self.state, results, snapshot, date);
                match builder.build(&document) {
                    Ok(bytes) => bytes,
                    Err(err) => {
                        warn!(error = %err, "document export failed");
                        self.view.push_alert(format!("Fehler: {err}"));
                        return Vec::new();
                    }
                }
            }
        };
        info!(filename = format.filename(), bytes = bytes.len(), "download prepared");
        vec![Command::Save(Download {
            filename: format.filename(),
            bytes,
        })]
    }
}
