//! Segment and KPI pickers.

use super::state::WizardState;
use super::view::View;
use crate::error::ValidationError;
use tracing::{debug, warn};

pub fn kpi_counter_text(count: usize) -> String {
    match count {
        1 => "one KPI selected".to_string(),
        n => format!("{n} KPIs selected"),
    }
}

/// Select the segment at `index`, deselecting every other option.
pub fn select_segment(state: &mut WizardState, view: &mut View, index: usize) -> bool {
    let Some(label) = view.segment_options.get(index).map(|o| o.label.clone()) else {
        warn!(index, "segment option out of range");
        return false;
    };
    for (i, option) in view.segment_options.iter_mut().enumerate() {
        option.selected = i == index;
    }
    debug!(segment = %label, "segment selected");
    state.segment = Some(label);
    view.segment_next_enabled = true;
    view.segment_validation.clear();
    true
}

/// Flip the KPI at `index` in and out of the selection.
pub fn toggle_kpi(state: &mut WizardState, view: &mut View, index: usize) -> bool {
    let Some(option) = view.kpi_options.get_mut(index) else {
        warn!(index, "KPI option out of range");
        return false;
    };
    option.selected = !option.selected;
    if option.selected {
        state.kpis.insert(option.label.clone());
    } else {
        state.kpis.remove(&option.label);
    }
    debug!(kpi = %option.label, selected = option.selected, "KPI toggled");

    view.kpi_counter = kpi_counter_text(state.kpis.len());
    view.kpi_next_enabled = !state.kpis.is_empty();
    view.kpi_validation.clear();
    true
}

/// Check the segment step; on failure the inline message is set.
pub fn check_segment(state: &WizardState, view: &mut View) -> Result<(), ValidationError> {
    if state.segment.is_none() {
        let err = ValidationError::MissingSegment;
        view.segment_validation = err.to_string();
        return Err(err);
    }
    Ok(())
}

pub fn check_kpis(state: &WizardState, view: &mut View) -> Result<(), ValidationError> {
    if state.kpis.is_empty() {
        let err = ValidationError::NoKpiSelected;
        view.kpi_validation = err.to_string();
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_click_wins() {
        let mut state = WizardState::default();
        let mut view = View::default();
        select_segment(&mut state, &mut view, 0);
        select_segment(&mut state, &mut view, 2);
        assert_eq!(state.segment.as_deref(), Some("Investment"));
        let selected: Vec<_> = view
            .segment_options
            .iter()
            .filter(|o| o.selected)
            .map(|o| o.label.as_str())
            .collect();
        assert_eq!(selected, vec!["Investment"]);
        assert!(view.segment_next_enabled);
    }

    #[test]
    fn double_toggle_restores_selection() {
        let mut state = WizardState::default();
        let mut view = View::default();
        toggle_kpi(&mut state, &mut view, 1);
        toggle_kpi(&mut state, &mut view, 0);
        assert_eq!(view.kpi_counter, "2 KPIs selected");
        toggle_kpi(&mut state, &mut view, 0);
        assert_eq!(state.kpis.iter().collect::<Vec<_>>(), vec!["LLP"]);
        assert!(!view.kpi_options[0].selected);
        assert_eq!(view.kpi_counter, "one KPI selected");
        toggle_kpi(&mut state, &mut view, 1);
        assert!(state.kpis.is_empty());
        assert!(!view.kpi_next_enabled);
        assert_eq!(view.kpi_counter, "0 KPIs selected");
    }

    #[test]
    fn validation_message_set_then_cleared() {
        let mut state = WizardState::default();
        let mut view = View::default();
        assert_eq!(
            check_segment(&state, &mut view),
            Err(ValidationError::MissingSegment)
        );
        assert_eq!(view.segment_validation, "Bitte wählen Sie ein Segment aus.");
        select_segment(&mut state, &mut view, 1);
        assert!(view.segment_validation.is_empty());

        assert!(check_kpis(&state, &mut view).is_err());
        assert_eq!(view.kpi_validation, "Bitte wählen Sie mindestens eine KPI aus.");
        toggle_kpi(&mut state, &mut view, 3);
        assert!(view.kpi_validation.is_empty());
        assert!(check_kpis(&state, &mut view).is_ok());
    }

    #[test]
    fn out_of_range_option_is_ignored() {
        let mut state = WizardState::default();
        let mut view = View::default();
        assert!(!select_segment(&mut state, &mut view, 99));
        assert!(!toggle_kpi(&mut state, &mut view, 99));
        assert!(state.segment.is_none());
    }
}
