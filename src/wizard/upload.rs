//! Drop targets and the comment field.

use super::state::WizardState;
use super::view::{Dropzone, View};
use crate::model::FileRef;
use serde::Serialize;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UploadTarget {
    Primary,
    Supplementary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragPhase {
    Enter,
    Over,
    Leave,
    Drop,
}

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// `0 Bytes`, `500 Bytes`, `1.5 KB`, `2 MB`.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut unit = 0;
    let mut value = bytes as f64;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let number = format!("{value:.2}");
    let number = number.trim_end_matches('0').trim_end_matches('.');
    format!("{number} {}", SIZE_UNITS[unit])
}

fn dropzone(view: &mut View, target: UploadTarget) -> &mut Dropzone {
    match target {
        UploadTarget::Primary => &mut view.primary_dropzone,
        UploadTarget::Supplementary => &mut view.supplementary_dropzone,
    }
}

pub fn drag(view: &mut View, target: UploadTarget, phase: DragPhase) {
    dropzone(view, target).drag_active = matches!(phase, DragPhase::Enter | DragPhase::Over);
}

/// Replace the target's file group. An empty selection leaves it untouched.
pub fn select_files(state: &mut WizardState, view: &mut View, target: UploadTarget, files: Vec<FileRef>) -> bool {
    if files.is_empty() {
        debug!(?target, "empty file selection ignored");
        return false;
    }
    info!(?target, count = files.len(), "files selected");

    let zone = dropzone(view, target);
    zone.caption = match files.len() {
        1 => "1 Datei ausgewählt".to_string(),
        n => format!("{n} Dateien ausgewählt"),
    };
    zone.file_lines = files
        .iter()
        .map(|f| format!("{} ({})", f.name, format_file_size(f.size_bytes)))
        .collect();

    match target {
        UploadTarget::Primary => state.primary_files = files,
        UploadTarget::Supplementary => state.supplementary_files = files,
    }
    true
}

pub fn edit_comments(state: &mut WizardState, view: &mut View, value: String) {
    view.comment_box = value.clone();
    state.comments = value;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_sizes_are_human_readable() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(500), "500 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(1_048_576), "1 MB");
        assert_eq!(format_file_size(1_300_000), "1.24 MB");
        assert_eq!(format_file_size(5 * 1024 * 1024 * 1024 * 1024), "5120 GB");
    }

    #[test]
    fn selection_replaces_previous_group() {
        let mut state = WizardState::default();
        let mut view = View::default();
        select_files(
            &mut state,
            &mut view,
            UploadTarget::Primary,
            vec![FileRef::new("a.pdf", 10), FileRef::new("b.pdf", 2048)],
        );
        assert_eq!(view.primary_dropzone.caption, "2 Dateien ausgewählt");
        assert_eq!(view.primary_dropzone.file_lines[1], "b.pdf (2 KB)");

        select_files(&mut state, &mut view, UploadTarget::Primary, vec![FileRef::new("c.xlsb", 0)]);
        assert_eq!(state.primary_files, vec![FileRef::new("c.xlsb", 0)]);
        assert_eq!(view.primary_dropzone.caption, "1 Datei ausgewählt");
        assert!(state.supplementary_files.is_empty());
    }

    #[test]
    fn empty_selection_is_ignored() {
        let mut state = WizardState::default();
        let mut view = View::default();
        select_files(&mut state, &mut view, UploadTarget::Supplementary, vec![FileRef::new("x", 1)]);
        assert!(!select_files(&mut state, &mut view, UploadTarget::Supplementary, vec![]));
        assert_eq!(state.supplementary_files.len(), 1);
    }

    #[test]
    fn drag_marker_follows_phase() {
        let mut view = View::default();
        drag(&mut view, UploadTarget::Primary, DragPhase::Enter);
        assert!(view.primary_dropzone.drag_active);
        drag(&mut view, UploadTarget::Primary, DragPhase::Over);
        assert!(view.primary_dropzone.drag_active);
        drag(&mut view, UploadTarget::Primary, DragPhase::Drop);
        assert!(!view.primary_dropzone.drag_active);
        drag(&mut view, UploadTarget::Supplementary, DragPhase::Enter);
        drag(&mut view, UploadTarget::Supplementary, DragPhase::Leave);
        assert!(!view.supplementary_dropzone.drag_active);
    }

    #[test]
    fn comments_mirror_every_edit() {
        let mut state = WizardState::default();
        let mut view = View::default();
        edit_comments(&mut state, &mut view, "Q".into());
        edit_comments(&mut state, &mut view, "Q4".into());
        assert_eq!(state.comments, "Q4");
        assert_eq!(view.comment_box, "Q4");
    }
}
