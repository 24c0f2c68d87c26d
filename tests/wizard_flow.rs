use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;
use variance_wizard::error::SubmitError;
use variance_wizard::export::ExportFormat;
use variance_wizard::model::{AnalysisRequest, AnalysisResponse, FileRef, WizardConfig};
use variance_wizard::orchestrator::drive;
use variance_wizard::ports::stub::{OutlineDocumentBuilder, StubChartRenderer};
use variance_wizard::ports::Renderers;
use variance_wizard::submission::client::AnalysisService;
use variance_wizard::wizard::state::Step;
use variance_wizard::wizard::upload::UploadTarget;
use variance_wizard::wizard::{Action, Component, Event, Wizard};

/// Replays scripted responses and records every request.
struct Scripted {
    responses: Mutex<Vec<Result<AnalysisResponse, SubmitError>>>,
    requests: Mutex<Vec<AnalysisRequest>>,
}

impl Scripted {
    fn new(mut responses: Vec<Result<AnalysisResponse, SubmitError>>) -> Self {
        responses.reverse();
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl AnalysisService for Scripted {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResponse, SubmitError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| Err(SubmitError::Transport("no scripted response".into())))
    }
}

fn config(dir: &std::path::Path) -> WizardConfig {
    WizardConfig {
        endpoint: "http://localhost/api/analyze".into(),
        request_timeout: Duration::from_secs(1),
        chart_deferral: Duration::from_millis(1),
        export_dir: dir.to_path_buf(),
        user_agent: "test".into(),
    }
}

fn full_response() -> AnalysisResponse {
    serde_json::from_str(
        r##"{
            "success": true,
            "result": {
                "variance_analysis": {"title": "V", "content": "Up 5%"},
                "trend_analysis": {"title": "T", "content": "", "summary": "Stable trend"},
                "chart": {
                    "labels": ["FY22", "Q1 2023", "Q2 2023"],
                    "datasets": [
                        {"label": "LLP", "data": [1.0, 2.0, 3.0]},
                        {"label": "Ifo Index", "data": [null, 88.0, 91.0]}
                    ]
                }
            }
        }"##,
    )
    .unwrap()
}

async fn step(wizard: &mut Wizard, service: &Scripted, dir: &std::path::Path, component: Component, action: Action) {
    drive(wizard, service, dir, Event::new(component, action)).await.unwrap();
}

async fn fill_form(wizard: &mut Wizard, service: &Scripted, dir: &std::path::Path) {
    step(wizard, service, dir, Component::SegmentPicker, Action::Click(0)).await;
    step(wizard, service, dir, Component::Navigator, Action::Next).await;
    step(wizard, service, dir, Component::KpiPicker, Action::Click(1)).await;
    step(wizard, service, dir, Component::KpiPicker, Action::Click(0)).await;
    step(wizard, service, dir, Component::Navigator, Action::Next).await;
    step(
        wizard,
        service,
        dir,
        Component::Dropzone(UploadTarget::Primary),
        Action::FilesSelected(vec![FileRef::new("fds.xlsb", 2048)]),
    )
    .await;
    step(wizard, service, dir, Component::CommentBox, Action::Input("Q3".into())).await;
}

#[tokio::test]
async fn complete_run_renders_and_exports() {
    let dir = tempfile::tempdir().unwrap();
    let charts = StubChartRenderer::default();
    let mut wizard = Wizard::new(
        &config(dir.path()),
        Renderers {
            chart: Some(Box::new(charts.clone())),
            document: Some(Box::new(OutlineDocumentBuilder)),
        },
    );
    let service = Scripted::new(vec![Ok(full_response())]);

    fill_form(&mut wizard, &service, dir.path()).await;
    assert_eq!(wizard.state().current_step, Step::Upload);
    step(&mut wizard, &service, dir.path(), Component::Navigator, Action::Next).await;

    assert_eq!(wizard.state().current_step, Step::Results);
    assert!(wizard.view().overlay.is_none());
    assert_eq!(charts.draws(), 1);

    let requests = service.requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].segment.as_deref(), Some("Retail"));
    assert_eq!(requests[0].kpis, vec!["LLP".to_string(), "NPL".to_string()]);
    assert_eq!(requests[0].primary_file_names, vec!["fds.xlsb".to_string()]);

    let saved = drive(&mut wizard, &service, dir.path(), Event::download(ExportFormat::Text))
        .await
        .unwrap();
    assert_eq!(saved.len(), 1);
    let text = std::fs::read_to_string(&saved[0]).unwrap();
    assert!(text.contains("Retail"));
    assert!(text.contains("Up 5%"));
    assert!(text.contains("Stable trend"));

    let saved = drive(&mut wizard, &service, dir.path(), Event::download(ExportFormat::Docx))
        .await
        .unwrap();
    assert!(saved[0].ends_with(ExportFormat::Docx.filename()));
}

#[tokio::test]
async fn failed_submission_keeps_user_on_documents_step() {
    let dir = tempfile::tempdir().unwrap();
    let mut wizard = Wizard::new(&config(dir.path()), Renderers::default());
    let service = Scripted::new(vec![
        Err(SubmitError::Status {
            status: 502,
            reason: "Bad Gateway".into(),
        }),
        Ok(full_response()),
    ]);

    fill_form(&mut wizard, &service, dir.path()).await;
    step(&mut wizard, &service, dir.path(), Component::Navigator, Action::Next).await;

    assert_eq!(wizard.state().current_step, Step::Upload);
    assert!(wizard.view().overlay.is_none());
    assert_eq!(
        wizard.view().current_alert(),
        Some("Fehler: Server responded with 502: Bad Gateway")
    );

    step(&mut wizard, &service, dir.path(), Component::Alert, Action::Dismiss).await;
    step(&mut wizard, &service, dir.path(), Component::Navigator, Action::Next).await;
    assert_eq!(wizard.state().current_step, Step::Results);
    assert!(wizard.view().current_alert().is_none());
}

#[tokio::test]
async fn docx_export_without_builder_raises_alert() {
    let dir = tempfile::tempdir().unwrap();
    let mut wizard = Wizard::new(&config(dir.path()), Renderers::default());
    let service = Scripted::new(vec![Ok(full_response())]);

    fill_form(&mut wizard, &service, dir.path()).await;
    step(&mut wizard, &service, dir.path(), Component::Navigator, Action::Next).await;

    let saved = drive(&mut wizard, &service, dir.path(), Event::download(ExportFormat::Docx))
        .await
        .unwrap();
    assert!(saved.is_empty());
    assert!(wizard.view().current_alert().is_some());
}
