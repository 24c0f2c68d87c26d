mod charts;
mod clipboard;
mod help;
mod state;

use crate::cli::{build_config, Cli};
use crate::orchestrator::{self, Feedback, UiCommand};
use crate::ports::Renderers;
use crate::render::markup::parse_markup;
use crate::render::AnalysisCard;
use crate::submission::client::{AnalysisService, HttpAnalysisService};
use crate::wizard::state::Step;
use crate::wizard::view::{Dropzone, OptionItem, View};
use crate::wizard::Wizard;
use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableBracketedPaste, EnableBracketedPaste, Event as TermEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs, Wrap},
    Terminal,
};
use state::{KeyOutcome, UiState, UploadFocus};
use std::sync::Arc;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

pub async fn run(args: Cli) -> Result<()> {
    let cfg = build_config(&args);
    let service: Arc<dyn AnalysisService> = Arc::new(HttpAnalysisService::new(&cfg)?);
    let (feedback_tx, feedback_rx) = mpsc::unbounded_channel::<Feedback>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let wizard = Wizard::new(&cfg, Renderers::standard());
    let ui_handle = std::thread::spawn(move || run_threaded(wizard, feedback_rx, cmd_tx));

    let res = orchestrator::run_controller(service, cfg.export_dir.clone(), feedback_tx, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res
}

/// Hand wizard commands to the controller.
fn dispatch(wizard: &mut Wizard, cmd_tx: &UnboundedSender<UiCommand>, events: Vec<crate::wizard::Event>) {
    for event in events {
        for cmd in wizard.handle(event) {
            let _ = cmd_tx.send(UiCommand::Wizard(cmd));
        }
    }
}

fn apply_feedback(wizard: &mut Wizard, ui: &mut UiState, cmd_tx: &UnboundedSender<UiCommand>, fb: Feedback) {
    match fb {
        Feedback::Event(event) => dispatch(wizard, cmd_tx, vec![event]),
        Feedback::Saved(path) => {
            ui.last_saved_path = Some(path.to_string_lossy().into_owned());
            ui.info = format!("Saved: {} (press 'y' to copy path)", path.display());
        }
        Feedback::Info(msg) => ui.info = msg,
    }
}

/// Run the TUI loop on a dedicated thread.
fn run_threaded(
    mut wizard: Wizard,
    mut feedback_rx: UnboundedReceiver<Feedback>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    let mut ui = UiState::default();
    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    let res = loop {
        while let Ok(fb) = feedback_rx.try_recv() {
            apply_feedback(&mut wizard, &mut ui, &cmd_tx, fb);
        }

        if last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| draw(f.area(), f, &wizard, &ui)).ok();
            last_tick = Instant::now();
        }

        if !event::poll(Duration::from_millis(10)).unwrap_or(false) {
            continue;
        }
        let step = wizard.state().current_step;
        let outcome = match event::read() {
            Ok(TermEvent::Key(k)) if k.kind == KeyEventKind::Press => {
                state::handle_key(&mut ui, step, wizard.view(), k.modifiers, k.code)
            }
            Ok(TermEvent::Paste(text)) => state::handle_paste(&mut ui, step, wizard.view(), &text),
            _ => KeyOutcome::Nothing,
        };
        match outcome {
            KeyOutcome::Events(events) => dispatch(&mut wizard, &cmd_tx, events),
            KeyOutcome::CopySavedPath => {
                ui.info = match ui.last_saved_path.as_deref() {
                    Some(path) => match clipboard::copy_to_clipboard(path) {
                        Ok(()) => format!("✓ Copied to clipboard: {}", clipboard::abbreviate(path, 60)),
                        Err(e) => format!("Clipboard copy failed: {e:#}"),
                    },
                    None => "Nothing saved yet. Save a report first (t/d)".into(),
                };
            }
            KeyOutcome::Quit => {
                let _ = cmd_tx.send(UiCommand::Quit);
                break Ok(());
            }
            KeyOutcome::Nothing => {}
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, DisableBracketedPaste, LeaveAlternateScreen).ok();
    res
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    Rect {
        x: area.x + (area.width - w) / 2,
        y: area.y + (area.height - h) / 2,
        width: w,
        height: h,
    }
}

fn draw(area: Rect, f: &mut ratatui::Frame, wizard: &Wizard, ui: &UiState) {
    let view = wizard.view();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(3)].as_ref())
        .split(area);

    let titles: Vec<Line> = Step::ALL
        .iter()
        .map(|s| Line::from(format!("{} {}", s.index() + 1, s.title())))
        .collect();
    let active = view.step_indicators.iter().position(|a| *a).unwrap_or(0);
    let tabs = Tabs::new(titles)
        .select(active)
        .block(Block::default().borders(Borders::ALL).title("BlueNova Variance Analysis"))
        .highlight_style(Style::default().fg(Color::Yellow));
    f.render_widget(tabs, chunks[0]);

    let body = chunks[1];
    match view.form_panels.iter().position(|a| *a).and_then(|i| Step::from_index(i as isize)) {
        Some(Step::Segment) => draw_options(
            body,
            f,
            "Select a segment",
            &view.segment_options,
            ui.cursor[0],
            &view.segment_validation,
            None,
            view.segment_next_enabled,
        ),
        Some(Step::Kpis) => draw_options(
            body,
            f,
            "Select KPIs",
            &view.kpi_options,
            ui.cursor[1],
            &view.kpi_validation,
            Some(&view.kpi_counter),
            view.kpi_next_enabled,
        ),
        Some(Step::Upload) => draw_upload(body, f, view, ui),
        Some(Step::Results) => draw_results(body, f, view, ui),
        None => {}
    }

    draw_status(chunks[2], f, ui);

    if let Some(overlay) = view.overlay.as_ref() {
        let popup = centered(body, 44, 5);
        f.render_widget(Clear, popup);
        f.render_widget(
            Paragraph::new(vec![Line::from(""), Line::from(overlay.message.clone()).centered()])
                .block(Block::default().borders(Borders::ALL)),
            popup,
        );
    }
    if let Some(alert) = view.current_alert() {
        let popup = centered(area, 64, 7);
        f.render_widget(Clear, popup);
        f.render_widget(
            Paragraph::new(vec![
                Line::from(alert.to_string()),
                Line::from(""),
                Line::from(Span::styled("enter: OK", Style::default().fg(Color::Magenta))),
            ])
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Hinweis")
                    .border_style(Style::default().fg(Color::Red)),
            ),
            popup,
        );
    }
    if ui.show_help {
        help::draw_help(centered(area, 70, 26), f);
    }
}

#[allow(clippy::too_many_arguments)]
fn draw_options(
    area: Rect,
    f: &mut ratatui::Frame,
    title: &str,
    options: &[OptionItem],
    cursor: usize,
    validation: &str,
    counter: Option<&str>,
    next_enabled: bool,
) {
    let mut lines: Vec<Line> = options
        .iter()
        .enumerate()
        .map(|(i, o)| {
            let marker = if o.selected { "[x]" } else { "[ ]" };
            let mut style = Style::default();
            if i == cursor {
                style = style.fg(Color::Yellow).add_modifier(Modifier::BOLD);
            }
            Line::from(Span::styled(format!(" {marker} {}", o.label), style))
        })
        .collect();
    lines.push(Line::from(""));
    if let Some(counter) = counter {
        lines.push(Line::from(Span::styled(counter.to_string(), Style::default().fg(Color::Gray))));
    }
    if !validation.is_empty() {
        lines.push(Line::from(Span::styled(validation.to_string(), Style::default().fg(Color::Red))));
    }
    let next_style = if next_enabled {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    lines.push(Line::from(Span::styled("Next →", next_style)));

    f.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title.to_string())),
        area,
    );
}

fn dropzone_lines(zone: &Dropzone) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(zone.caption.clone())];
    if zone.caption != zone.original_caption {
        lines.push(Line::from(Span::styled(
            zone.original_caption.clone(),
            Style::default().fg(Color::DarkGray),
        )));
    }
    lines.extend(zone.file_lines.iter().map(|l| Line::from(format!("  • {l}"))));
    lines
}

fn focus_block(title: &str, focused: bool, drag_active: bool) -> Block<'static> {
    let color = if drag_active {
        Color::Green
    } else if focused {
        Color::Yellow
    } else {
        Color::Reset
    };
    Block::default()
        .borders(Borders::ALL)
        .title(title.to_string())
        .border_style(Style::default().fg(color))
}

fn draw_upload(area: Rect, f: &mut ratatui::Frame, view: &View, ui: &UiState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(35), Constraint::Min(4)].as_ref())
        .split(area);

    for (row, zone, focus, title) in [
        (rows[0], &view.primary_dropzone, UploadFocus::Primary, "Hauptdokumente"),
        (rows[1], &view.supplementary_dropzone, UploadFocus::Supplementary, "Zusatzdokumente"),
    ] {
        let mut lines = dropzone_lines(zone);
        if let Some(prompt) = ui.prompt.as_ref().filter(|p| Some(p.target) == focus.target()) {
            lines.push(Line::from(vec![
                Span::styled("paths> ", Style::default().fg(Color::Magenta)),
                Span::raw(prompt.buffer.clone()),
            ]));
        }
        f.render_widget(
            Paragraph::new(lines)
                .wrap(Wrap { trim: false })
                .block(focus_block(title, ui.upload_focus == focus, zone.drag_active)),
            row,
        );
    }

    let comments: Vec<Line> = view.comment_box.lines().map(|l| Line::from(l.to_string())).collect();
    f.render_widget(
        Paragraph::new(comments)
            .wrap(Wrap { trim: false })
            .block(focus_block("Kommentare", ui.upload_focus == UploadFocus::Comments, false)),
        rows[2],
    );
}

fn markup_lines(markup: &str) -> Vec<Line<'static>> {
    parse_markup(markup)
        .into_iter()
        .map(|runs| {
            Line::from(
                runs.into_iter()
                    .map(|run| {
                        let mut style = Style::default();
                        if run.bold {
                            style = style.add_modifier(Modifier::BOLD);
                        }
                        if let Some(color) = run.color.as_deref() {
                            style = style.fg(charts::hex_color(color));
                        }
                        Span::styled(run.text, style)
                    })
                    .collect::<Vec<_>>(),
            )
        })
        .collect()
}

fn card_lines(card: &AnalysisCard) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(Span::styled(
        card.title.clone(),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    ))];
    if let Some(markup) = card.body_markup.as_deref() {
        lines.extend(markup_lines(markup));
    }
    if let Some(summary) = card.summary.as_deref() {
        lines.extend(summary.lines().map(|l| Line::from(l.to_string())));
    }
    lines.push(Line::from(""));
    lines
}

fn draw_results(area: Rect, f: &mut ratatui::Frame, view: &View, ui: &UiState) {
    let canvas = view.analysis.iter().find_map(|c| c.canvas.as_ref());
    let constraints = if canvas.is_some() {
        [Constraint::Min(6), Constraint::Length(22)]
    } else {
        [Constraint::Min(6), Constraint::Length(0)]
    };
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints.as_ref())
        .split(area);

    let mut lines: Vec<Line> = view.analysis.iter().flat_map(card_lines).collect();
    if !view.explanation.is_empty() {
        lines.push(Line::from(Span::styled(
            view.explanation.clone(),
            Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
        )));
    }
    f.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((ui.results_scroll, 0))
            .block(Block::default().borders(Borders::ALL).title("Analysis")),
        rows[0],
    );

    if let Some(canvas) = canvas {
        charts::draw_trend_chart(f, rows[1], canvas, ui.chart_cursor);
    }
}

fn draw_status(area: Rect, f: &mut ratatui::Frame, ui: &UiState) {
    let hint = Span::styled(
        "←/→ step  ? help  q quit",
        Style::default().fg(Color::DarkGray),
    );
    let mut spans = vec![hint];
    if !ui.info.is_empty() {
        spans.push(Span::raw("  "));
        spans.push(Span::raw(ui.info.clone()));
    }
    f.render_widget(
        Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL).title("Status")),
        area,
    );
}
