use super::{format_date, kpi_line, segment_line};
use crate::model::AnalysisResult;
use crate::wizard::state::WizardState;
use time::Date;

pub const TEXT_HEADING: &str = "BlueNova Bank Variance Analysis Results";

/// Plain-text export of the current results.
pub fn build_text_export(state: &WizardState, results: &AnalysisResult, date: Date) -> String {
    let mut out = String::new();
    out.push_str(TEXT_HEADING);
    out.push('\n');
    out.push_str(&segment_line(state));
    out.push('\n');
    out.push_str(&kpi_line(state));
    out.push('\n');
    out.push_str(&format!("Date: {}\n\n", format_date(date)));

    let variance = results
        .variance_analysis
        .as_ref()
        .map(|v| v.content.as_str())
        .unwrap_or_default();
    let trend = results
        .trend_analysis
        .as_ref()
        .map(|t| match t.summary.as_deref() {
            Some(summary) if !summary.is_empty() => summary,
            _ => t.content.as_str(),
        })
        .unwrap_or_default();

    out.push_str(&format!("VARIANCE ANALYSIS:\n{variance}\n\n"));
    out.push_str(&format!("TREND ANALYSIS:\n{trend}\n"));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Section, TrendSection};
    use time::macros::date;

    #[test]
    fn text_export_layout() {
        let mut state = WizardState::default();
        state.segment = Some("Corporate".into());
        state.kpis.insert("RAROC".into());
        let results = AnalysisResult {
            variance_analysis: Some(Section {
                title: None,
                content: "RAROC improved.".into(),
            }),
            trend_analysis: Some(TrendSection {
                title: None,
                content: "details".into(),
                summary: Some("Upward.".into()),
            }),
            chart: None,
        };
        let text = build_text_export(&state, &results, date!(2024 - 11 - 02));
        assert_eq!(
            text,
            "BlueNova Bank Variance Analysis Results\n\
             Segment: Corporate\n\
             KPIs: RAROC\n\
             Date: 2024-11-02\n\
             \n\
             VARIANCE ANALYSIS:\n\
             RAROC improved.\n\
             \n\
             TREND ANALYSIS:\n\
             Upward.\n"
        );
    }

    #[test]
    fn trend_falls_back_to_content_and_defaults_show() {
        let results = AnalysisResult {
            trend_analysis: Some(TrendSection {
                title: None,
                content: "details".into(),
                summary: None,
            }),
            ..Default::default()
        };
        let text = build_text_export(&WizardState::default(), &results, date!(2024 - 01 - 01));
        assert!(text.contains("Segment: Not selected\n"));
        assert!(text.contains("KPIs: None selected\n"));
        assert!(text.ends_with("VARIANCE ANALYSIS:\n\n\nTREND ANALYSIS:\ndetails\n"));
    }

    #[test]
    fn both_headers_print_without_results() {
        let text = build_text_export(&WizardState::default(), &AnalysisResult::default(), date!(2024 - 01 - 01));
        assert!(text.ends_with("Date: 2024-01-01\n\nVARIANCE ANALYSIS:\n\n\nTREND ANALYSIS:\n\n"));
    }
}
