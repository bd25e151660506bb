use chrono::NaiveDate;
use std::time::{Duration, Instant};

use super::form::{EntryForm, FieldErrors, TimeEntry};

/// How long a submission result stays on screen.
pub const RESULT_DIALOG_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupState {
    Hidden,
    Visible,
    Submitting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitRejected {
    /// The popup is hidden or the exit confirmation is open.
    NotVisible,
    /// A submission is already in flight.
    InFlight,
    Invalid,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultDialog {
    pub message: String,
    pub is_error: bool,
    pub shown_at: Instant,
}

impl ResultDialog {
    pub fn new(message: impl Into<String>, is_error: bool, shown_at: Instant) -> Self {
        Self { message: message.into(), is_error, shown_at }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) >= RESULT_DIALOG_TIMEOUT
    }
}

/// State machine behind the entry popup.
///
/// Owns the form fields, the visibility state, the exit confirmation guard
/// and the result dialog. The UI thread drives it through the transition
/// methods and mirrors [`PopupController::is_shown`] onto the window.
#[derive(Debug)]
pub struct PopupController {
    state: PopupState,
    form: EntryForm,
    errors: FieldErrors,
    exit_confirm: bool,
    result: Option<ResultDialog>,
    focus_requested: bool,
}

impl Default for PopupController {
    fn default() -> Self {
        Self::new()
    }
}

impl PopupController {
    pub fn new() -> Self {
        Self {
            state: PopupState::Hidden,
            form: EntryForm::default(),
            errors: FieldErrors::default(),
            exit_confirm: false,
            result: None,
            focus_requested: false,
        }
    }

    pub fn state(&self) -> PopupState {
        self.state
    }

    pub fn is_shown(&self) -> bool {
        self.state != PopupState::Hidden
    }

    pub fn is_submitting(&self) -> bool {
        self.state == PopupState::Submitting
    }

    pub fn is_confirming_exit(&self) -> bool {
        self.exit_confirm
    }

    pub fn form(&self) -> &EntryForm {
        &self.form
    }

    /// Field edits are only accepted while the form is interactive.
    pub fn form_mut(&mut self) -> Option<&mut EntryForm> {
        (self.state == PopupState::Visible && !self.exit_confirm).then_some(&mut self.form)
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn result(&self) -> Option<&ResultDialog> {
        self.result.as_ref()
    }

    /// Hidden -> Visible with a fresh form. Returns false when nothing changed.
    pub fn show(&mut self, today: NaiveDate) -> bool {
        if self.state != PopupState::Hidden || self.exit_confirm {
            return false;
        }
        self.reset(today);
        self.state = PopupState::Visible;
        self.focus_requested = true;
        true
    }

    /// True once after each `show`, so the first field grabs focus a single time.
    pub fn take_focus_request(&mut self) -> bool {
        std::mem::take(&mut self.focus_requested)
    }

    /// Visible -> Submitting. The returned entry is what must be appended.
    pub fn begin_submit(&mut self) -> Result<TimeEntry, SubmitRejected> {
        match self.state {
            PopupState::Hidden => return Err(SubmitRejected::NotVisible),
            PopupState::Submitting => return Err(SubmitRejected::InFlight),
            PopupState::Visible if self.exit_confirm => return Err(SubmitRejected::NotVisible),
            PopupState::Visible => {}
        }

        match self.form.validate() {
            Ok(entry) => {
                self.errors = FieldErrors::default();
                self.state = PopupState::Submitting;
                Ok(entry)
            }
            Err(errors) => {
                self.errors = errors;
                Err(SubmitRejected::Invalid)
            }
        }
    }

    /// Completes the in-flight submission. Success clears and hides the form;
    /// failure keeps every field so the user can retry.
    pub fn finish_submit(&mut self, outcome: Result<(), String>, today: NaiveDate, now: Instant) {
        if self.state != PopupState::Submitting {
            tracing::warn!("Ignoring submission result with no submission in flight");
            return;
        }

        match outcome {
            Ok(()) => {
                self.result = Some(ResultDialog::new("Time entry added!", false, now));
                self.reset(today);
                self.state = PopupState::Hidden;
            }
            Err(message) => {
                self.result = Some(ResultDialog::new(
                    format!("submission failed: {}", message),
                    true,
                    now,
                ));
                self.state = PopupState::Visible;
            }
        }
    }

    /// Opens the exit confirmation. Returns false if one is already open or
    /// the form is not in the visible state.
    pub fn request_exit(&mut self) -> bool {
        if self.state != PopupState::Visible || self.exit_confirm {
            return false;
        }
        self.exit_confirm = true;
        true
    }

    pub fn resolve_exit(&mut self, confirmed: bool, today: NaiveDate) {
        if !self.exit_confirm {
            return;
        }
        self.exit_confirm = false;
        if confirmed {
            self.reset(today);
            self.state = PopupState::Hidden;
        }
    }

    pub fn dismiss_result(&mut self) {
        self.result = None;
    }

    /// Drops the result dialog once it has been up for [`RESULT_DIALOG_TIMEOUT`].
    pub fn tick(&mut self, now: Instant) {
        if self.result.as_ref().is_some_and(|r| r.is_expired(now)) {
            self.result = None;
        }
    }

    fn reset(&mut self, today: NaiveDate) {
        self.form = EntryForm::seeded(today);
        self.errors = FieldErrors::default();
    }
}
