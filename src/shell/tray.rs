use std::sync::mpsc::Sender;
use tray_icon::menu::{Menu, MenuEvent, MenuItem};
use tray_icon::{Icon, TrayIcon, TrayIconBuilder};

use super::ShellEvent;

const MENU_ADD: &str = "add";
const MENU_CONFIGURE: &str = "configure";
const MENU_EXIT: &str = "exit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayAction {
    AddEntry,
    Configure,
    Exit,
}

pub fn action_for(menu_id: &str) -> Option<TrayAction> {
    match menu_id {
        MENU_ADD => Some(TrayAction::AddEntry),
        MENU_CONFIGURE => Some(TrayAction::Configure),
        MENU_EXIT => Some(TrayAction::Exit),
        _ => None,
    }
}

/// Build the tray icon and its three-item menu. "Add Time Entry" is greyed
/// out when there is no authenticated spreadsheet client.
pub fn build_tray(can_add: bool) -> Result<TrayIcon, String> {
    let menu = Menu::new();
    let add = MenuItem::with_id(MENU_ADD, "Add Time Entry", can_add, None);
    let configure = MenuItem::with_id(MENU_CONFIGURE, "Configure", true, None);
    let exit = MenuItem::with_id(MENU_EXIT, "Exit", true, None);
    menu.append_items(&[&add, &configure, &exit])
        .map_err(|e| e.to_string())?;

    let (rgba, width, height) = crate::ui::icon_rgba();
    let icon = Icon::from_rgba(rgba, width, height).map_err(|e| e.to_string())?;

    TrayIconBuilder::new()
        .with_menu(Box::new(menu))
        .with_tooltip("Google Sheets Time Tracker")
        .with_title("Time Tracker")
        .with_icon(icon)
        .build()
        .map_err(|e| e.to_string())
}

/// Create the tray where the platform needs it. On Linux the icon lives on a
/// dedicated GTK thread; elsewhere it must be created on the UI thread and
/// kept alive by the caller.
pub fn start_tray(can_add: bool) -> Option<TrayIcon> {
    #[cfg(target_os = "linux")]
    {
        std::thread::spawn(move || {
            if let Err(e) = gtk::init() {
                tracing::error!("Failed to initialize GTK for the tray: {e}");
                return;
            }
            match build_tray(can_add) {
                Ok(_tray) => gtk::main(),
                Err(e) => tracing::error!("Failed to create tray icon: {e}"),
            }
        });
        return None;
    }

    #[cfg(not(target_os = "linux"))]
    return match build_tray(can_add) {
        Ok(tray) => Some(tray),
        Err(e) => {
            tracing::error!("Failed to create tray icon: {e}");
            None
        }
    };
}

/// Forward menu clicks to the UI thread. "Exit" ends the process here so it
/// works even while the popup window is hidden.
pub fn spawn_menu_listener(tx: Sender<ShellEvent>, ctx: egui::Context, can_add: bool) {
    std::thread::spawn(move || {
        while let Ok(event) = MenuEvent::receiver().recv() {
            let shell_event = match action_for(event.id.0.as_str()) {
                Some(TrayAction::AddEntry) if can_add => ShellEvent::ShowPopup,
                Some(TrayAction::AddEntry) => {
                    tracing::warn!("Sheet service not available");
                    continue;
                }
                Some(TrayAction::Configure) => ShellEvent::Configure,
                Some(TrayAction::Exit) => {
                    tracing::info!("Exit selected from tray, shutting down");
                    std::process::exit(0);
                }
                None => continue,
            };
            if tx.send(shell_event).is_err() {
                break;
            }
            ctx.request_repaint();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_ids_map_to_actions() {
        assert_eq!(action_for("add"), Some(TrayAction::AddEntry));
        assert_eq!(action_for("configure"), Some(TrayAction::Configure));
        assert_eq!(action_for("exit"), Some(TrayAction::Exit));
        assert_eq!(action_for("other"), None);
    }
}
