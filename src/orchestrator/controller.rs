//! Command execution loop.
//!
//! Submissions and chart timers run concurrently; their completions are
//! reported in arrival order, so with two requests in flight the later
//! response is applied last.

use super::downloads::save_download;
use crate::submission::client::AnalysisService;
use crate::wizard::{Action, Command, Component, Event, Wizard};
use anyhow::Result;
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{debug, info};

/// Messages from the UI thread to the controller.
#[derive(Debug, Clone)]
pub(crate) enum UiCommand {
    Wizard(Command),
    Quit,
}

/// Messages from the controller back to the UI thread.
#[derive(Debug, Clone)]
pub(crate) enum Feedback {
    Event(Event),
    Saved(PathBuf),
    Info(String),
}

fn chart_elapsed(canvas: u64, spec: crate::model::ChartSpec) -> Event {
    Event::new(Component::Results, Action::ChartDeferralElapsed { canvas, spec })
}

/// Run wizard commands until the UI quits or drops its sender.
pub(crate) async fn run_controller(
    service: Arc<dyn AnalysisService>,
    export_dir: PathBuf,
    feedback_tx: UnboundedSender<Feedback>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    let mut pending: FuturesUnordered<BoxFuture<'static, Event>> = FuturesUnordered::new();

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UiCommand::Wizard(Command::Submit(request))) => {
                        let service = service.clone();
                        pending.push(
                            async move { Event::settled(service.analyze(&request).await) }.boxed(),
                        );
                        debug!(in_flight = pending.len(), "request dispatched");
                    }
                    Some(UiCommand::Wizard(Command::DrawChartAfter { delay, canvas, spec })) => {
                        pending.push(
                            async move {
                                tokio::time::sleep(delay).await;
                                chart_elapsed(canvas, spec)
                            }
                            .boxed(),
                        );
                    }
                    Some(UiCommand::Wizard(Command::Save(download))) => {
                        let msg = match save_download(&export_dir, &download) {
                            Ok(path) => Feedback::Saved(path),
                            Err(e) => Feedback::Info(format!("Download failed: {e:#}")),
                        };
                        let _ = feedback_tx.send(msg);
                    }
                    Some(UiCommand::Quit) | None => {
                        info!(abandoned = pending.len(), "controller stopping");
                        break;
                    }
                }
            }
            Some(event) = pending.next(), if !pending.is_empty() => {
                if feedback_tx.send(Feedback::Event(event)).is_err() {
                    break;
                }
            }
        }
    }
    Ok(())
}

/// Feed `event` to the wizard and run every resulting command, in order,
/// until nothing is left to do. Returns the paths of saved downloads.
pub async fn drive(
    wizard: &mut Wizard,
    service: &dyn AnalysisService,
    export_dir: &Path,
    event: Event,
) -> Result<Vec<PathBuf>> {
    let mut queue = VecDeque::from([event]);
    let mut saved = Vec::new();
    while let Some(event) = queue.pop_front() {
        for cmd in wizard.handle(event) {
            match cmd {
                Command::Submit(request) => {
                    queue.push_back(Event::settled(service.analyze(&request).await));
                }
                Command::DrawChartAfter { delay, canvas, spec } => {
                    tokio::time::sleep(delay).await;
                    queue.push_back(chart_elapsed(canvas, spec));
                }
                Command::Save(download) => saved.push(save_download(export_dir, &download)?),
            }
        }
    }
    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SubmitError;
    use crate::model::{AnalysisRequest, AnalysisResponse, AnalysisResult, Section, WizardConfig};
    use crate::ports::Renderers;
    use async_trait::async_trait;
    use std::time::Duration;

    struct Canned(AnalysisResponse);

    #[async_trait]
    impl AnalysisService for Canned {
        async fn analyze(&self, _request: &AnalysisRequest) -> Result<AnalysisResponse, SubmitError> {
            Ok(self.0.clone())
        }
    }

    fn response(title: &str) -> AnalysisResponse {
        AnalysisResponse {
            success: true,
            message: None,
            result: Some(AnalysisResult {
                variance_analysis: Some(Section {
                    title: Some(title.into()),
                    content: "flat".into(),
                }),
                ..Default::default()
            }),
        }
    }

    #[tokio::test]
    async fn controller_reports_settled_requests() {
        let service: Arc<dyn AnalysisService> = Arc::new(Canned(response("ok")));
        let dir = tempfile::tempdir().unwrap();
        let (feedback_tx, mut feedback_rx) = tokio::sync::mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = tokio::sync::mpsc::unbounded_channel();
        let handle = tokio::spawn(run_controller(service, dir.path().to_path_buf(), feedback_tx, cmd_rx));

        cmd_tx
            .send(UiCommand::Wizard(Command::Submit(AnalysisRequest {
                segment: None,
                kpis: vec![],
                comments: String::new(),
                primary_file_names: vec![],
                supplementary_file_names: vec![],
            })))
            .unwrap();
        match feedback_rx.recv().await {
            Some(Feedback::Event(Event {
                component: Component::Submission,
                action: Action::Settled(Ok(resp)),
            })) => assert!(resp.success),
            other => panic!("unexpected feedback {other:?}"),
        }

        cmd_tx
            .send(UiCommand::Wizard(Command::Save(crate::export::Download {
                filename: "x.txt",
                bytes: b"hi".to_vec(),
            })))
            .unwrap();
        match feedback_rx.recv().await {
            Some(Feedback::Saved(path)) => assert_eq!(std::fs::read(path).unwrap(), b"hi"),
            other => panic!("unexpected feedback {other:?}"),
        }

        cmd_tx.send(UiCommand::Quit).unwrap();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn drive_settles_submission_inline() {
        let cfg = WizardConfig {
            endpoint: "http://localhost:5000/api/analyze".into(),
            request_timeout: Duration::from_secs(1),
            chart_deferral: Duration::from_millis(1),
            export_dir: std::env::temp_dir(),
            user_agent: "test".into(),
        };
        let mut wizard = Wizard::new(&cfg, Renderers::default());
        let service = Canned(response("Driven"));
        let dir = tempfile::tempdir().unwrap();

        for event in [
            Event::new(Component::SegmentPicker, Action::Click(3)),
            Event::next(),
            Event::new(Component::KpiPicker, Action::Click(2)),
            Event::next(),
            Event::next(),
        ] {
            drive(&mut wizard, &service, dir.path(), event).await.unwrap();
        }
        assert_eq!(wizard.view().analysis[0].title, "Driven");

        let saved = drive(
            &mut wizard,
            &service,
            dir.path(),
            Event::download(crate::export::ExportFormat::Text),
        )
        .await
        .unwrap();
        assert_eq!(saved, vec![dir.path().join("variance-analysis-results.txt")]);
    }
}
