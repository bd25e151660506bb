//! OS integration: tray icon and global hotkeys. Listener threads never touch
//! form state; they only send [`ShellEvent`]s to the UI thread.

mod hotkey;
mod tray;

pub use hotkey::HotkeyBindings;
pub use tray::{spawn_menu_listener, start_tray};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellEvent {
    ShowPopup,
    /// Cancel gesture while the popup is shown.
    Escape,
    Configure,
}
