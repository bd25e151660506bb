use global_hotkey::hotkey::{Code, HotKey};
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};
use std::str::FromStr;
use std::sync::mpsc::Sender;
use thiserror::Error;

use super::ShellEvent;

#[derive(Debug, Error)]
pub enum HotkeyError {
    #[error("no hotkey configured")]
    Empty,
    #[error("invalid hotkey {0:?}: {1}")]
    Invalid(String, String),
    #[error("hotkey registration failed: {0}")]
    Register(String),
}

/// Parse a "ctrl+alt+q" style combination.
pub fn parse_hotkey(text: &str) -> Result<HotKey, HotkeyError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(HotkeyError::Empty);
    }
    let normalized: String = text.split('+').map(str::trim).collect::<Vec<_>>().join("+");
    HotKey::from_str(&normalized).map_err(|e| HotkeyError::Invalid(text.to_string(), e.to_string()))
}

/// The cancel gesture, only bound while the popup is on screen.
pub fn escape_hotkey() -> HotKey {
    HotKey::new(None, Code::Escape)
}

/// Global key bindings owned by the UI thread.
pub struct HotkeyBindings {
    manager: GlobalHotKeyManager,
    escape: HotKey,
    escape_armed: bool,
}

impl HotkeyBindings {
    /// Registers the popup hotkey and starts forwarding presses to `tx`.
    pub fn register(
        popup_hotkey: &str,
        tx: Sender<ShellEvent>,
        ctx: egui::Context,
    ) -> Result<Self, HotkeyError> {
        let manager = GlobalHotKeyManager::new().map_err(|e| HotkeyError::Register(e.to_string()))?;

        let popup = match parse_hotkey(popup_hotkey) {
            Ok(hotkey) => match manager.register(hotkey) {
                Ok(()) => {
                    tracing::info!("Registered hotkey {}", popup_hotkey);
                    Some(hotkey)
                }
                Err(e) => {
                    tracing::error!("Failed to register hotkey {}: {}", popup_hotkey, e);
                    None
                }
            },
            Err(HotkeyError::Empty) => {
                tracing::info!("No hotkey configured");
                None
            }
            Err(e) => {
                tracing::error!("{e}");
                None
            }
        };

        let escape = escape_hotkey();
        spawn_listener(popup.map(|h| h.id()), escape.id(), tx, ctx);

        Ok(Self { manager, escape, escape_armed: false })
    }

    /// Bind or release the global escape key to follow popup visibility.
    pub fn set_escape_armed(&mut self, armed: bool) {
        if armed == self.escape_armed {
            return;
        }
        let result = if armed {
            self.manager.register(self.escape)
        } else {
            self.manager.unregister(self.escape)
        };
        match result {
            Ok(()) => self.escape_armed = armed,
            Err(e) => tracing::warn!("Failed to update escape binding: {e}"),
        }
    }
}

fn spawn_listener(popup_id: Option<u32>, escape_id: u32, tx: Sender<ShellEvent>, ctx: egui::Context) {
    std::thread::spawn(move || {
        let receiver = GlobalHotKeyEvent::receiver();
        while let Ok(event) = receiver.recv() {
            if event.state != HotKeyState::Pressed {
                continue;
            }
            let shell_event = if Some(event.id) == popup_id {
                tracing::debug!("Hotkey pressed, showing entry popup");
                ShellEvent::ShowPopup
            } else if event.id == escape_id {
                ShellEvent::Escape
            } else {
                continue;
            };
            if tx.send(shell_event).is_err() {
                break;
            }
            ctx.request_repaint();
        }
    });
}
