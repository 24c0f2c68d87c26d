use super::state::{Step, WizardState};
use super::view::View;
use tracing::{debug, error};

/// Show step `index`. Out-of-range indices are logged and leave everything unchanged.
pub fn go_to_step(state: &mut WizardState, view: &mut View, index: isize) -> bool {
    let Some(step) = Step::from_index(index) else {
        error!(index, "invalid step index");
        return false;
    };
    state.current_step = step;
    for (i, (indicator, panel)) in view
        .step_indicators
        .iter_mut()
        .zip(view.form_panels.iter_mut())
        .enumerate()
    {
        let active = i == step.index();
        *indicator = active;
        *panel = active;
    }
    debug!(step = ?step, "step shown");
    true
}

/// Index one before the current step (may be out of range).
pub fn previous_index(state: &WizardState) -> isize {
    state.current_step.index() as isize - 1
}

/// Index one after the current step (may be out of range).
pub fn next_index(state: &WizardState) -> isize {
    state.current_step.index() as isize + 1
}
