use crate::model::{FileRef, KPI_OPTIONS, SEGMENT_OPTIONS};
use crate::wizard::state::Step;
use crate::wizard::upload::{DragPhase, UploadTarget};
use crate::wizard::view::View;
use crate::wizard::{Action, Component, Event};
use crate::export::ExportFormat;
use crossterm::event::{KeyCode, KeyModifiers};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadFocus {
    #[default]
    Primary,
    Supplementary,
    Comments,
}

impl UploadFocus {
    fn cycle(self, forward: bool) -> Self {
        use UploadFocus::*;
        match (self, forward) {
            (Primary, true) | (Comments, false) => Supplementary,
            (Supplementary, true) | (Primary, false) => Comments,
            (Comments, true) | (Supplementary, false) => Primary,
        }
    }

    pub fn target(self) -> Option<UploadTarget> {
        match self {
            UploadFocus::Primary => Some(UploadTarget::Primary),
            UploadFocus::Supplementary => Some(UploadTarget::Supplementary),
            UploadFocus::Comments => None,
        }
    }
}

/// Typed list of paths for a drop target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPrompt {
    pub target: UploadTarget,
    pub buffer: String,
}

/// Terminal-only presentation state; everything the wizard owns lives in its `View`.
#[derive(Debug, Default)]
pub struct UiState {
    /// Highlighted option on the segment and KPI steps.
    pub cursor: [usize; 2],
    pub upload_focus: UploadFocus,
    pub prompt: Option<PathPrompt>,
    pub results_scroll: u16,
    /// Column the trend chart's crosshair sits on.
    pub chart_cursor: usize,
    pub show_help: bool,
    pub info: String,
    pub last_saved_path: Option<String>,
}

#[derive(Debug)]
pub enum KeyOutcome {
    Events(Vec<Event>),
    CopySavedPath,
    Quit,
    Nothing,
}

/// Split pasted or typed input into paths. Accepts newline- or comma-separated
/// lists, `file://` URIs and quoted names.
pub fn parse_path_list(input: &str) -> Vec<PathBuf> {
    input
        .split(['\n', ','])
        .map(|s| s.trim().trim_matches(|c| c == '"' || c == '\''))
        .map(|s| s.strip_prefix("file://").unwrap_or(s))
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Read metadata for each path; unreadable paths are reported in `errors`.
pub fn read_file_refs(paths: &[PathBuf], errors: &mut Vec<String>) -> Vec<FileRef> {
    paths
        .iter()
        .filter_map(|p| match FileRef::from_path(p) {
            Ok(f) => Some(f),
            Err(e) => {
                errors.push(format!("{}: {e}", p.display()));
                None
            }
        })
        .collect()
}

fn drop_events(ui: &mut UiState, target: UploadTarget, input: &str) -> KeyOutcome {
    let mut errors = Vec::new();
    let files = read_file_refs(&parse_path_list(input), &mut errors);
    ui.info = if errors.is_empty() {
        String::new()
    } else {
        format!("Skipped {}", errors.join("; "))
    };
    let zone = Component::Dropzone(target);
    let mut events = vec![
        Event::new(zone, Action::Drag(DragPhase::Enter)),
        Event::new(zone, Action::Drag(DragPhase::Drop)),
    ];
    if !files.is_empty() {
        events.push(Event::new(zone, Action::FilesSelected(files)));
    }
    KeyOutcome::Events(events)
}

fn one(component: Component, action: Action) -> KeyOutcome {
    KeyOutcome::Events(vec![Event::new(component, action)])
}

fn comment_edit(view: &View, edit: impl FnOnce(&mut String)) -> KeyOutcome {
    let mut value = view.comment_box.clone();
    edit(&mut value);
    one(Component::CommentBox, Action::Input(value))
}

fn move_cursor(cursor: &mut usize, len: usize, down: bool) {
    if len == 0 {
        return;
    }
    *cursor = if down {
        (*cursor + 1).min(len - 1)
    } else {
        cursor.saturating_sub(1)
    };
}

fn chart_columns(view: &View) -> usize {
    view.analysis
        .iter()
        .find_map(|card| card.canvas.as_ref()?.chart.as_ref())
        .map(|chart| chart.point_count())
        .unwrap_or(0)
}

/// Bracketed paste: a drop onto the focused target, or text for the comment box.
pub fn handle_paste(ui: &mut UiState, step: Step, view: &View, text: &str) -> KeyOutcome {
    if let Some(prompt) = ui.prompt.as_mut() {
        prompt.buffer.push_str(text);
        return KeyOutcome::Nothing;
    }
    if step != Step::Upload {
        return KeyOutcome::Nothing;
    }
    match ui.upload_focus.target() {
        Some(target) => drop_events(ui, target, text),
        None => comment_edit(view, |v| v.push_str(text)),
    }
}

pub fn handle_key(ui: &mut UiState, step: Step, view: &View, modifiers: KeyModifiers, code: KeyCode) -> KeyOutcome {
    if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
        return KeyOutcome::Quit;
    }

    if view.current_alert().is_some() {
        return match code {
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ') => one(Component::Alert, Action::Dismiss),
            _ => KeyOutcome::Nothing,
        };
    }

    if let Some(prompt) = ui.prompt.as_mut() {
        match code {
            KeyCode::Esc => ui.prompt = None,
            KeyCode::Backspace => {
                prompt.buffer.pop();
            }
            KeyCode::Char(c) => prompt.buffer.push(c),
            KeyCode::Enter => {
                if let Some(PathPrompt { target, buffer }) = ui.prompt.take() {
                    let mut errors = Vec::new();
                    let files = read_file_refs(&parse_path_list(&buffer), &mut errors);
                    ui.info = if errors.is_empty() {
                        String::new()
                    } else {
                        format!("Skipped {}", errors.join("; "))
                    };
                    return one(Component::Dropzone(target), Action::FilesSelected(files));
                }
            }
            _ => {}
        }
        return KeyOutcome::Nothing;
    }

    if ui.show_help {
        ui.show_help = false;
        return KeyOutcome::Nothing;
    }

    let typing = step == Step::Upload && ui.upload_focus == UploadFocus::Comments;
    match code {
        KeyCode::Right => return KeyOutcome::Events(vec![Event::next()]),
        KeyCode::Left => return KeyOutcome::Events(vec![Event::previous()]),
        KeyCode::Tab | KeyCode::BackTab if step == Step::Upload => {
            ui.upload_focus = ui.upload_focus.cycle(code == KeyCode::Tab);
            return KeyOutcome::Nothing;
        }
        KeyCode::Esc if typing => {
            ui.upload_focus = UploadFocus::Primary;
            return KeyOutcome::Nothing;
        }
        _ => {}
    }

    if typing {
        return match code {
            KeyCode::Char(c) => comment_edit(view, |v| v.push(c)),
            KeyCode::Enter => comment_edit(view, |v| v.push('\n')),
            KeyCode::Backspace => comment_edit(view, |v| {
                v.pop();
            }),
            _ => KeyOutcome::Nothing,
        };
    }

    match code {
        KeyCode::Char('q') | KeyCode::Esc => return KeyOutcome::Quit,
        KeyCode::Char('?') => {
            ui.show_help = true;
            return KeyOutcome::Nothing;
        }
        KeyCode::Char(d @ '1'..='4') => {
            let index = d as usize - '1' as usize;
            return one(Component::StepIndicator, Action::Click(index));
        }
        KeyCode::Char('n') => return KeyOutcome::Events(vec![Event::next()]),
        KeyCode::Char('b') => return KeyOutcome::Events(vec![Event::previous()]),
        _ => {}
    }

    match step {
        Step::Segment | Step::Kpis => {
            let (slot, len, component) = if step == Step::Segment {
                (0, SEGMENT_OPTIONS.len(), Component::SegmentPicker)
            } else {
                (1, KPI_OPTIONS.len(), Component::KpiPicker)
            };
            match code {
                KeyCode::Up | KeyCode::Char('k') => move_cursor(&mut ui.cursor[slot], len, false),
                KeyCode::Down | KeyCode::Char('j') => move_cursor(&mut ui.cursor[slot], len, true),
                KeyCode::Enter | KeyCode::Char(' ') => {
                    return one(component, Action::Click(ui.cursor[slot]));
                }
                _ => {}
            }
            KeyOutcome::Nothing
        }
        Step::Upload => {
            if let (KeyCode::Enter, Some(target)) = (code, ui.upload_focus.target()) {
                ui.prompt = Some(PathPrompt {
                    target,
                    buffer: String::new(),
                });
            }
            KeyOutcome::Nothing
        }
        Step::Results => match code {
            KeyCode::Up | KeyCode::Char('k') => {
                ui.results_scroll = ui.results_scroll.saturating_sub(1);
                KeyOutcome::Nothing
            }
            KeyCode::Down | KeyCode::Char('j') => {
                ui.results_scroll = ui.results_scroll.saturating_add(1);
                KeyOutcome::Nothing
            }
            KeyCode::Char('h') => {
                ui.chart_cursor = ui.chart_cursor.saturating_sub(1);
                KeyOutcome::Nothing
            }
            KeyCode::Char('l') => {
                let columns = chart_columns(view);
                move_cursor(&mut ui.chart_cursor, columns, true);
                KeyOutcome::Nothing
            }
            KeyCode::Char('t') => KeyOutcome::Events(vec![Event::download(ExportFormat::Text)]),
            KeyCode::Char('d') => KeyOutcome::Events(vec![Event::download(ExportFormat::Docx)]),
            KeyCode::Char('y') => KeyOutcome::CopySavedPath,
            _ => KeyOutcome::Nothing,
        },
    }
}
