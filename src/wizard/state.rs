use crate::model::{AnalysisResult, FileRef};
use serde::Serialize;
use std::collections::BTreeSet;

pub const STEP_COUNT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub enum Step {
    #[default]
    Segment,
    Kpis,
    Upload,
    Results,
}

impl Step {
    pub const ALL: [Step; STEP_COUNT] = [Step::Segment, Step::Kpis, Step::Upload, Step::Results];

    pub fn index(self) -> usize {
        self as usize
    }

    /// `None` outside `0..STEP_COUNT`.
    pub fn from_index(index: isize) -> Option<Step> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn title(self) -> &'static str {
        match self {
            Step::Segment => "Segment",
            Step::Kpis => "KPIs",
            Step::Upload => "Documents",
            Step::Results => "Analysis",
        }
    }
}

/// The user's answers plus the last analysis result.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WizardState {
    pub current_step: Step,
    pub segment: Option<String>,
    pub kpis: BTreeSet<String>,
    pub primary_files: Vec<FileRef>,
    pub supplementary_files: Vec<FileRef>,
    pub comments: String,
    pub results: Option<AnalysisResult>,
}
