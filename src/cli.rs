use crate::export::ExportFormat;
use crate::model::{FileRef, WizardConfig, KPI_OPTIONS, SEGMENT_OPTIONS};
use crate::orchestrator::drive;
use crate::ports::Renderers;
use crate::submission::client::{AnalysisService, HttpAnalysisService};
use crate::submission::SubmissionPhase;
use crate::wizard::state::Step;
use crate::wizard::upload::UploadTarget;
use crate::wizard::{Action, Component, Event, Wizard};
use anyhow::{bail, Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let mut out = std::io::LineWriter::new(std::io::stdout().lock());
        let mut err = std::io::LineWriter::new(std::io::stderr().lock());
        while let Some(line) = rx.blocking_recv() {
            let _ = match line {
                OutputLine::Stdout(msg) => writeln!(out, "{msg}"),
                OutputLine::Stderr(msg) => writeln!(err, "{msg}"),
            };
        }
        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "variance-wizard",
    version,
    about = "Collect segment, KPIs and documents, request a variance analysis and export the report"
)]
pub struct Cli {
    /// Analysis endpoint (JSON POST)
    #[arg(long, default_value = "http://localhost:5000/api/analyze")]
    pub endpoint: String,

    /// Request timeout
    #[arg(long, default_value = "120s")]
    pub timeout: humantime::Duration,

    /// Delay between rendering the trend card and drawing its chart
    #[arg(long, default_value = "100ms")]
    pub chart_deferral: humantime::Duration,

    /// Directory downloads are written to (default: current directory)
    #[arg(long)]
    pub export_dir: Option<PathBuf>,

    /// Directory for log files in TUI mode
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Run headless and print the analysis as JSON
    #[arg(long)]
    pub json: bool,

    /// Run headless and print the analysis as text
    #[arg(long)]
    pub text: bool,

    /// Segment to analyse (headless)
    #[arg(long)]
    pub segment: Option<String>,

    /// KPI to include; repeat for several (headless)
    #[arg(long = "kpi")]
    pub kpis: Vec<String>,

    /// Primary document; repeat for several (headless)
    #[arg(long)]
    pub primary: Vec<PathBuf>,

    /// Supplementary document; repeat for several (headless)
    #[arg(long)]
    pub supplementary: Vec<PathBuf>,

    /// Free-text comments sent with the request (headless)
    #[arg(long)]
    pub comments: Option<String>,

    /// Save the plain-text report after a headless run
    #[arg(long)]
    pub export_text: bool,

    /// Save the DOCX report after a headless run
    #[arg(long)]
    pub export_docx: bool,
}

impl Cli {
    pub fn is_headless(&self) -> bool {
        self.json || self.text
    }
}

/// Build a `WizardConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> WizardConfig {
    WizardConfig {
        endpoint: args.endpoint.clone(),
        request_timeout: Duration::from(args.timeout),
        chart_deferral: Duration::from(args.chart_deferral),
        export_dir: args
            .export_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(".")),
        user_agent: format!("variance-wizard/{}", env!("CARGO_PKG_VERSION")),
    }
}

pub async fn run(args: Cli) -> Result<()> {
    if args.json && args.text {
        bail!("--json and --text are mutually exclusive");
    }

    if !args.is_headless() {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(args).await;
        }
        #[cfg(not(feature = "tui"))]
        {
            return run_headless(args, false).await;
        }
    }

    let json = args.json;
    run_headless(args, json).await
}

/// Case-insensitive position of `wanted` in a catalogue.
fn option_index(catalogue: &[&str], wanted: &str, what: &str) -> Result<usize> {
    catalogue
        .iter()
        .position(|o| o.eq_ignore_ascii_case(wanted.trim()))
        .with_context(|| format!("unknown {what} '{wanted}' (expected one of: {})", catalogue.join(", ")))
}

fn file_refs(paths: &[PathBuf]) -> Result<Vec<FileRef>> {
    paths
        .iter()
        .map(|p| FileRef::from_path(p).with_context(|| format!("read {}", p.display())))
        .collect()
}

/// Drive a step's "next" and fail with the inline validation message if it didn't advance.
async fn advance(
    wizard: &mut Wizard,
    service: &dyn AnalysisService,
    export_dir: &Path,
    expected: Step,
) -> Result<()> {
    drive(wizard, service, export_dir, Event::next()).await?;
    if wizard.state().current_step == expected {
        return Ok(());
    }
    let view = wizard.view();
    let message = match (wizard.state().current_step, wizard.phase()) {
        (Step::Segment, _) => view.segment_validation.clone(),
        (Step::Kpis, _) => view.kpi_validation.clone(),
        (_, SubmissionPhase::Failed(err)) => err.alert_text(),
        _ => view.current_alert().unwrap_or("analysis failed").to_string(),
    };
    bail!(message)
}

/// Answer every step from the command line, submit, print and export.
async fn run_headless(args: Cli, json: bool) -> Result<()> {
    let cfg = build_config(&args);
    let service = HttpAnalysisService::new(&cfg)?;
    let mut wizard = Wizard::new(&cfg, Renderers::standard());
    let dir = cfg.export_dir.as_path();
    let (out_tx, out_handle) = spawn_output_writer();

    if let Some(segment) = args.segment.as_deref() {
        let index = option_index(SEGMENT_OPTIONS, segment, "segment")?;
        drive(&mut wizard, &service, dir, Event::new(Component::SegmentPicker, Action::Click(index))).await?;
    }
    advance(&mut wizard, &service, dir, Step::Kpis).await?;

    for kpi in &args.kpis {
        let index = option_index(KPI_OPTIONS, kpi, "KPI")?;
        drive(&mut wizard, &service, dir, Event::new(Component::KpiPicker, Action::Click(index))).await?;
    }
    advance(&mut wizard, &service, dir, Step::Upload).await?;

    for (target, paths) in [
        (UploadTarget::Primary, &args.primary),
        (UploadTarget::Supplementary, &args.supplementary),
    ] {
        let files = file_refs(paths)?;
        drive(&mut wizard, &service, dir, Event::new(Component::Dropzone(target), Action::FilesSelected(files))).await?;
    }
    if let Some(comments) = args.comments.clone() {
        drive(&mut wizard, &service, dir, Event::new(Component::CommentBox, Action::Input(comments))).await?;
    }

    let _ = out_tx.send(OutputLine::Stderr(format!("Submitting to {} ...", service.endpoint())));
    advance(&mut wizard, &service, dir, Step::Results).await?;

    let results = wizard
        .state()
        .results
        .clone()
        .ok_or(crate::error::ExportError::NoResults)?;
    if json {
        let _ = out_tx.send(OutputLine::Stdout(serde_json::to_string_pretty(&results)?));
    } else {
        let text = crate::export::text::build_text_export(wizard.state(), &results, crate::export::today());
        for line in text.lines() {
            let _ = out_tx.send(OutputLine::Stdout(line.to_string()));
        }
    }

    for (wanted, format) in [(args.export_text, ExportFormat::Text), (args.export_docx, ExportFormat::Docx)] {
        if !wanted {
            continue;
        }
        let saved = drive(&mut wizard, &service, dir, Event::download(format)).await?;
        if saved.is_empty() {
            let reason = wizard.view().current_alert().unwrap_or("nothing was written");
            bail!("{} export failed: {reason}", format.filename());
        }
        for path in saved {
            let _ = out_tx.send(OutputLine::Stderr(format!("Saved: {}", path.display())));
        }
    }

    drop(out_tx);
    let _ = out_handle.await;
    Ok(())
}
