use chrono::Local;
use eframe::egui;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tray_icon::TrayIcon;

use super::views::{self, ConfigForm};
use crate::config::Config;
use crate::entry::{PopupController, ResultDialog, SubmitRejected};
use crate::sheets::SheetsClient;
use crate::shell::{self, HotkeyBindings, ShellEvent};

const TIMER_REPAINT: Duration = Duration::from_millis(100);

pub struct TimeTrackerApp {
    config: Config,
    controller: PopupController,
    sheets: Option<Arc<SheetsClient>>,

    window: WindowSync,

    // Configuration dialog
    show_config: bool,
    config_form: ConfigForm,
    config_notice: Option<ResultDialog>,

    // OS shell
    hotkeys: Option<HotkeyBindings>,
    _tray: Option<TrayIcon>,
    shell_rx: Receiver<ShellEvent>,

    // Async communication
    runtime: tokio::runtime::Runtime,
    result_rx: Receiver<AsyncResult>,
    result_tx: Sender<AsyncResult>,
}

enum AsyncResult {
    EntrySubmitted(Result<(), String>),
}

/// Visibility last sent to the native window.
///
/// eframe makes the root window visible once its first frame is painted,
/// whatever the builder asked for. The first frame is therefore skipped and
/// the window is assumed shown afterwards, so the next sync hides it.
#[derive(Debug)]
struct WindowSync {
    shown: bool,
    first_frame: bool,
}

impl Default for WindowSync {
    fn default() -> Self {
        Self { shown: true, first_frame: true }
    }
}

impl WindowSync {
    fn is_first_frame(&self) -> bool {
        self.first_frame
    }

    /// Returns the visibility to apply, or `None` when nothing must be sent.
    fn update(&mut self, wanted: bool) -> Option<bool> {
        if std::mem::take(&mut self.first_frame) || wanted == self.shown {
            return None;
        }
        self.shown = wanted;
        Some(wanted)
    }
}

impl TimeTrackerApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: Config,
        runtime: tokio::runtime::Runtime,
        sheets: Option<Arc<SheetsClient>>,
    ) -> Self {
        super::setup_fonts(&cc.egui_ctx);
        super::setup_theme(&cc.egui_ctx);

        let (result_tx, result_rx) = channel();
        let (shell_tx, shell_rx) = channel();

        // Tray and hotkeys are created inside the event loop so they stay alive
        let can_add = sheets.is_some();
        let tray = shell::start_tray(can_add);
        shell::spawn_menu_listener(shell_tx.clone(), cc.egui_ctx.clone(), can_add);

        let hotkeys = match HotkeyBindings::register(&config.hotkey, shell_tx, cc.egui_ctx.clone()) {
            Ok(bindings) => Some(bindings),
            Err(e) => {
                tracing::error!("{e}");
                None
            }
        };

        Self {
            config,
            controller: PopupController::new(),
            sheets,
            window: WindowSync::default(),
            show_config: false,
            config_form: ConfigForm::default(),
            config_notice: None,
            hotkeys,
            _tray: tray,
            shell_rx,
            runtime,
            result_rx,
            result_tx,
        }
    }

    fn check_shell_events(&mut self) {
        while let Ok(event) = self.shell_rx.try_recv() {
            match event {
                ShellEvent::ShowPopup => self.show_popup(),
                ShellEvent::Escape => {
                    self.controller.request_exit();
                }
                ShellEvent::Configure => self.open_config(),
            }
        }
    }

    fn check_async_results(&mut self) {
        while let Ok(result) = self.result_rx.try_recv() {
            match result {
                AsyncResult::EntrySubmitted(outcome) => {
                    self.controller
                        .finish_submit(outcome, Local::now().date_naive(), Instant::now());
                }
            }
        }
    }

    fn show_popup(&mut self) {
        if self.sheets.is_none() {
            tracing::warn!("Sheet service not available");
            return;
        }
        if self.controller.show(Local::now().date_naive()) {
            tracing::debug!("Showing entry popup");
        }
    }

    fn submit_entry(&mut self, ctx: &egui::Context) {
        let Some(sheets) = self.sheets.clone() else {
            return;
        };

        let entry = match self.controller.begin_submit() {
            Ok(entry) => entry,
            Err(SubmitRejected::Invalid) => return,
            Err(reason) => {
                tracing::debug!("Submission rejected: {:?}", reason);
                return;
            }
        };

        let spreadsheet_id = self.config.spreadsheet_id.clone();
        let sheet_name = self.config.sheet_name.clone();
        let tx = self.result_tx.clone();
        let ctx = ctx.clone();

        self.runtime.spawn(async move {
            let outcome = sheets
                .append_row(&spreadsheet_id, &sheet_name, entry.to_row())
                .await
                .map(|_| ())
                .map_err(|e| e.to_string());

            match &outcome {
                Ok(()) => tracing::info!("Time entry added for {}", entry.project),
                Err(e) => tracing::error!("Submission failed: {}", e),
            }
            let _ = tx.send(AsyncResult::EntrySubmitted(outcome));
            ctx.request_repaint();
        });
    }

    fn open_config(&mut self) {
        self.config_form = ConfigForm {
            spreadsheet_id: self.config.spreadsheet_id.clone(),
            sheet_name: self.config.sheet_name.clone(),
            error: None,
        };
        self.show_config = true;
    }

    fn save_config(&mut self) {
        let mut updated = self.config.clone();
        updated.spreadsheet_id = self.config_form.spreadsheet_id.trim().to_string();
        updated.sheet_name = match self.config_form.sheet_name.trim() {
            "" => Config::default().sheet_name,
            name => name.to_string(),
        };

        match updated.save() {
            Ok(()) => {
                self.config = updated;
                self.show_config = false;
                self.config_notice = Some(ResultDialog::new("Configuration updated!", false, Instant::now()));
            }
            Err(e) => {
                tracing::error!("{e}");
                self.config_form.error = Some(e.to_string());
            }
        }
    }

    /// Mirror the controller's visibility onto the native window.
    fn sync_window(&mut self, ctx: &egui::Context) {
        if self.window.is_first_frame() {
            // A second frame is needed to hide what eframe is about to show
            ctx.request_repaint();
        }
        let Some(shown) = self.window.update(self.controller.is_shown()) else {
            return;
        };

        ctx.send_viewport_cmd(egui::ViewportCommand::Visible(shown));
        if shown {
            ctx.send_viewport_cmd(egui::ViewportCommand::Focus);
        }
        if let Some(hotkeys) = &mut self.hotkeys {
            hotkeys.set_escape_armed(shown);
        }
    }

    fn render_config_window(&mut self, ctx: &egui::Context) {
        let builder = egui::ViewportBuilder::default()
            .with_title("Configuration")
            .with_inner_size([440.0, 180.0])
            .with_resizable(false)
            .with_window_level(egui::WindowLevel::AlwaysOnTop);

        ctx.show_viewport_immediate(
            egui::ViewportId::from_hash_of("configuration"),
            builder,
            |ctx, class| {
                let mut submitted = false;
                viewport_body(ctx, class, "Configuration", |ui| {
                    submitted = views::render_config_form(ui, &mut self.config_form);
                });
                if submitted {
                    self.save_config();
                }
                if ctx.input(|i| i.viewport().close_requested()) {
                    self.show_config = false;
                }
            },
        );
    }
}

/// Closes the result window on request; returns false once the user dismissed it.
fn render_result_window(ctx: &egui::Context, id: &str, result: &ResultDialog) -> bool {
    let builder = egui::ViewportBuilder::default()
        .with_title("Time Tracker")
        .with_inner_size([300.0, 110.0])
        .with_decorations(false)
        .with_resizable(false)
        .with_taskbar(false)
        .with_window_level(egui::WindowLevel::AlwaysOnTop);

    ctx.show_viewport_immediate(egui::ViewportId::from_hash_of(id), builder, |ctx, class| {
        viewport_body(ctx, class, "Time Tracker", |ui| views::render_result(ui, result));
        !ctx.input(|i| i.viewport().close_requested() || i.key_pressed(egui::Key::Escape))
    })
}

/// Child viewports fall back to an in-window dialog on backends without
/// multi-viewport support.
fn viewport_body(
    ctx: &egui::Context,
    class: egui::ViewportClass,
    title: &str,
    add_contents: impl FnOnce(&mut egui::Ui),
) {
    if class == egui::ViewportClass::Embedded {
        egui::Window::new(title)
            .collapsible(false)
            .resizable(false)
            .frame(super::theme::dialog_frame())
            .show(ctx, add_contents);
    } else {
        egui::CentralPanel::default().show(ctx, add_contents);
    }
}

impl eframe::App for TimeTrackerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_shell_events();
        self.check_async_results();

        let now = Instant::now();
        self.controller.tick(now);
        if self.config_notice.as_ref().is_some_and(|n| n.is_expired(now)) {
            self.config_notice = None;
        }

        // The window's own close button and Escape are the cancel gesture;
        // the application only exits from the tray menu.
        if ctx.input(|i| i.viewport().close_requested()) {
            ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
            self.controller.request_exit();
        }
        if self.controller.is_shown() && ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.controller.request_exit();
        }

        let mut submit = false;
        egui::CentralPanel::default().show(ctx, |ui| {
            if !self.controller.is_shown() {
                return;
            }
            let display = self.controller.form().clone();
            let errors = self.controller.errors().clone();
            let submitting = self.controller.is_submitting();
            let focus_date = self.controller.take_focus_request();
            let row = views::render_entry_row(
                ui,
                self.controller.form_mut(),
                &display,
                &errors,
                submitting,
                focus_date,
            );
            submit = row.submit;
        });
        if submit {
            self.submit_entry(ctx);
        }

        if self.controller.is_confirming_exit() {
            if let Some(confirmed) = views::render_exit_confirm(ctx) {
                self.controller.resolve_exit(confirmed, Local::now().date_naive());
            }
        }

        self.sync_window(ctx);

        if let Some(result) = self.controller.result().cloned() {
            if !render_result_window(ctx, "submission_result", &result) {
                self.controller.dismiss_result();
            }
        }
        if let Some(notice) = self.config_notice.clone() {
            if !render_result_window(ctx, "config_notice", &notice) {
                self.config_notice = None;
            }
        }
        if self.show_config {
            self.render_config_window(ctx);
        }

        // Keep frames coming while a timer or a submission is pending
        if self.controller.result().is_some()
            || self.config_notice.is_some()
            || self.controller.is_submitting()
        {
            ctx.request_repaint_after(TIMER_REPAINT);
        }
    }
}
