use egui::{Color32, RichText, Ui};

use super::theme::{ERROR_COLOR, SUCCESS_COLOR};
use crate::entry::{EntryForm, FieldErrors, ResultDialog};

const FIELD_WIDTH: f32 = 170.0;
const COMMIT_FIELD_WIDTH: f32 = 2.0 * FIELD_WIDTH;

/// What the user did in the entry row this frame.
#[derive(Default)]
pub struct EntryRowResult {
    pub submit: bool,
}

fn field(
    ui: &mut Ui,
    value: &mut String,
    hint: &str,
    width: f32,
    error: Option<&str>,
    enabled: bool,
) -> egui::Response {
    ui.vertical(|ui| {
        let mut edit = egui::TextEdit::singleline(value)
            .hint_text(hint)
            .desired_width(width);
        if error.is_some() {
            edit = edit.text_color(ERROR_COLOR);
        }
        let response = ui.add_enabled(enabled, edit);
        match error {
            Some(message) => {
                ui.label(RichText::new(message).small().color(ERROR_COLOR));
            }
            None => {
                ui.label(RichText::new(" ").small());
            }
        }
        response
    })
    .inner
}

/// One horizontal row of the seven entry fields plus the submit button.
///
/// `form` is `None` while the form is locked (submitting or confirming exit);
/// `display` is then rendered read-only. `focus_date` moves the cursor to the
/// date field, once per popup opening.
pub fn render_entry_row(
    ui: &mut Ui,
    form: Option<&mut EntryForm>,
    display: &EntryForm,
    errors: &FieldErrors,
    submitting: bool,
    focus_date: bool,
) -> EntryRowResult {
    let mut result = EntryRowResult::default();
    let enabled = form.is_some();
    let mut scratch = display.clone();
    let form = form.unwrap_or(&mut scratch);

    ui.horizontal_top(|ui| {
        let date = field(ui, &mut form.date, "Date (MM/DD/YYYY)", FIELD_WIDTH, errors.date.as_deref(), enabled);
        field(ui, &mut form.hours, "Hours", FIELD_WIDTH, errors.hours.as_deref(), enabled);
        field(ui, &mut form.description, "Description", FIELD_WIDTH, errors.description.as_deref(), enabled);
        field(ui, &mut form.project, "Repo/Project", FIELD_WIDTH, errors.project.as_deref(), enabled);
        field(ui, &mut form.branch, "Branch", FIELD_WIDTH, None, enabled);
        field(ui, &mut form.commit_start, "Commit Hash (Start)", COMMIT_FIELD_WIDTH, None, enabled);
        let last = field(ui, &mut form.commit_end, "Commit Hash (End)", COMMIT_FIELD_WIDTH, None, enabled);

        if submitting {
            ui.add(egui::Spinner::new());
            ui.label("Submitting");
        } else {
            let button = egui::Button::new(format!("{} Submit", egui_phosphor::regular::PAPER_PLANE_RIGHT));
            if ui.add_enabled(enabled, button).clicked() {
                result.submit = true;
            }
        }

        // Enter in the last field submits, like the button.
        if enabled && last.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            result.submit = true;
        }
        if focus_date {
            date.request_focus();
        }
    });

    result
}

/// Exit confirmation. Returns `Some(confirmed)` once the user picks an answer.
pub fn render_exit_confirm(ctx: &egui::Context) -> Option<bool> {
    let mut answer = None;
    egui::Window::new("Exit")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .frame(super::theme::dialog_frame())
        .show(ctx, |ui| {
            ui.label("Are you sure you want to exit?");
            ui.add_space(10.0);
            ui.horizontal(|ui| {
                if ui.button("Yes").clicked() {
                    answer = Some(true);
                }
                if ui.button("No").clicked() {
                    answer = Some(false);
                }
            });
        });
    answer
}

pub fn render_result(ui: &mut Ui, result: &ResultDialog) {
    let (icon, color) = if result.is_error {
        (egui_phosphor::regular::WARNING_CIRCLE, ERROR_COLOR)
    } else {
        (egui_phosphor::regular::CHECK_CIRCLE, SUCCESS_COLOR)
    };
    let title = if result.is_error { "Error" } else { "Success" };

    ui.vertical_centered(|ui| {
        ui.add_space(8.0);
        ui.label(RichText::new(format!("{} {}", icon, title)).heading().color(color));
        ui.add_space(6.0);
        ui.label(RichText::new(&result.message).color(Color32::WHITE));
    });
}

/// Text inputs of the configuration dialog.
#[derive(Debug, Clone, Default)]
pub struct ConfigForm {
    pub spreadsheet_id: String,
    pub sheet_name: String,
    pub error: Option<String>,
}

/// Returns true when the user pressed Submit.
pub fn render_config_form(ui: &mut Ui, form: &mut ConfigForm) -> bool {
    let mut submitted = false;

    egui::Grid::new("config_grid")
        .num_columns(2)
        .spacing([12.0, 10.0])
        .show(ui, |ui| {
            ui.label("Google Sheet ID");
            ui.add(egui::TextEdit::singleline(&mut form.spreadsheet_id).desired_width(260.0));
            ui.end_row();

            ui.label("Sheet Name");
            ui.add(egui::TextEdit::singleline(&mut form.sheet_name).desired_width(260.0));
            ui.end_row();
        });

    if let Some(error) = &form.error {
        ui.add_space(6.0);
        ui.label(RichText::new(error).color(ERROR_COLOR));
    }

    ui.add_space(10.0);
    if ui.button("Submit").clicked() {
        submitted = true;
    }
    submitted
}
