//! Presentation state observed by the UI. Controllers write it, the TUI and
//! headless runners only read it.

use super::state::STEP_COUNT;
use crate::model::{KPI_OPTIONS, SEGMENT_OPTIONS};
use crate::render::AnalysisCard;
use std::collections::VecDeque;

pub const OVERLAY_MESSAGE: &str = "Die KI generiert Ihre Analyse...";
pub const PRIMARY_CAPTION: &str = "Hauptdokumente hier ablegen oder auswählen";
pub const SUPPLEMENTARY_CAPTION: &str = "Zusatzdokumente hier ablegen oder auswählen";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionItem {
    pub label: String,
    pub selected: bool,
}

fn options(labels: &[&str]) -> Vec<OptionItem> {
    labels
        .iter()
        .map(|l| OptionItem {
            label: (*l).to_string(),
            selected: false,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dropzone {
    pub caption: String,
    pub original_caption: String,
    pub drag_active: bool,
    /// `name (size)` per selected file.
    pub file_lines: Vec<String>,
}

impl Dropzone {
    fn new(caption: &str) -> Self {
        Self {
            caption: caption.to_string(),
            original_caption: caption.to_string(),
            drag_active: false,
            file_lines: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlay {
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct View {
    pub step_indicators: [bool; STEP_COUNT],
    pub form_panels: [bool; STEP_COUNT],

    pub segment_options: Vec<OptionItem>,
    pub segment_next_enabled: bool,
    pub segment_validation: String,

    pub kpi_options: Vec<OptionItem>,
    pub kpi_next_enabled: bool,
    pub kpi_validation: String,
    pub kpi_counter: String,

    pub primary_dropzone: Dropzone,
    pub supplementary_dropzone: Dropzone,
    pub comment_box: String,

    pub overlay: Option<Overlay>,
    /// Blocking messages, oldest first.
    pub alerts: VecDeque<String>,

    pub analysis: Vec<AnalysisCard>,
    pub explanation: String,
}

impl Default for View {
    fn default() -> Self {
        let mut indicators = [false; STEP_COUNT];
        indicators[0] = true;
        Self {
            step_indicators: indicators,
            form_panels: indicators,
            segment_options: options(SEGMENT_OPTIONS),
            segment_next_enabled: false,
            segment_validation: String::new(),
            kpi_options: options(KPI_OPTIONS),
            kpi_next_enabled: false,
            kpi_validation: String::new(),
            kpi_counter: super::selection::kpi_counter_text(0),
            primary_dropzone: Dropzone::new(PRIMARY_CAPTION),
            supplementary_dropzone: Dropzone::new(SUPPLEMENTARY_CAPTION),
            comment_box: String::new(),
            overlay: None,
            alerts: VecDeque::new(),
            analysis: Vec::new(),
            explanation: String::new(),
        }
    }
}

impl View {
    /// Show the loading overlay; a second call keeps the single instance.
    pub fn show_overlay(&mut self) {
        if self.overlay.is_none() {
            self.overlay = Some(Overlay {
                message: OVERLAY_MESSAGE.to_string(),
            });
        }
    }

    pub fn remove_overlay(&mut self) {
        self.overlay = None;
    }

    pub fn push_alert(&mut self, message: impl Into<String>) {
        self.alerts.push_back(message.into());
    }

    pub fn current_alert(&self) -> Option<&str> {
        self.alerts.front().map(String::as_str)
    }
}
