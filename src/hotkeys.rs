//! Global hotkey management
//!
//! Registers the overlay's global shortcuts and runs a dedicated listener
//! thread. Hotkeys work even while the overlay is click-through, which is
//! the whole point: they are the only way to reach the window when it
//! ignores the pointer.
//!
//! Registered hotkeys:
//! - Control + Shift + C: toggle click-through
//! - Control + \: hide/show the overlay window

use global_hotkey::{
    hotkey::{Code, HotKey, Modifiers},
    GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// Minimum interval between handled hotkey presses
///
/// Some platforms deliver key repeats as fresh events; a shared guard keeps
/// one physical press from toggling twice.
const RETRIGGER_GUARD: Duration = Duration::from_millis(200);

/// Poll interval for the listener thread
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Callbacks invoked from the listener thread
pub(crate) struct HotkeyCallbacks {
    pub(crate) on_toggle_click_through: Arc<dyn Fn() + Send + Sync>,
    pub(crate) on_toggle_visibility: Arc<dyn Fn() + Send + Sync>,
}

fn click_through_hotkey() -> HotKey {
    HotKey::new(Some(Modifiers::CONTROL | Modifiers::SHIFT), Code::KeyC)
}

fn visibility_hotkey() -> HotKey {
    HotKey::new(Some(Modifiers::CONTROL), Code::Backslash)
}

/// Register the global hotkeys
///
/// The returned manager must stay alive for the registrations to hold.
pub(crate) fn init_hotkeys() -> Result<GlobalHotKeyManager, String> {
    let manager = GlobalHotKeyManager::new()
        .map_err(|e| format!("Failed to create hotkey manager: {}", e))?;

    manager
        .register(click_through_hotkey())
        .map_err(|e| format!("Failed to register click-through hotkey: {}", e))?;
    info!("Registered global hotkey: Control + Shift + C (click-through)");

    manager
        .register(visibility_hotkey())
        .map_err(|e| format!("Failed to register visibility hotkey: {}", e))?;
    info!("Registered global hotkey: Control + \\ (hide/show)");

    Ok(manager)
}

/// Start listening for hotkey events
///
/// Spawns a background thread that polls for events and invokes the
/// matching callback, with a shared re-trigger guard across all shortcuts.
pub(crate) fn start_hotkey_listener(callbacks: HotkeyCallbacks) {
    let click_through_id = click_through_hotkey().id();
    let visibility_id = visibility_hotkey().id();

    std::thread::spawn(move || {
        let receiver = GlobalHotKeyEvent::receiver();
        let mut last_trigger: Option<Instant> = None;

        info!("Hotkey listener started on dedicated thread");

        loop {
            match receiver.try_recv() {
                Ok(event) => {
                    if event.state != HotKeyState::Pressed {
                        continue;
                    }

                    let now = Instant::now();
                    let guarded = last_trigger
                        .is_some_and(|t| now.duration_since(t) < RETRIGGER_GUARD);
                    if guarded {
                        continue;
                    }

                    if event.id == click_through_id {
                        (callbacks.on_toggle_click_through)();
                        last_trigger = Some(now);
                    } else if event.id == visibility_id {
                        (callbacks.on_toggle_visibility)();
                        last_trigger = Some(now);
                    }
                }
                Err(_) => {
                    // No event, sleep briefly to avoid busy-waiting
                    std::thread::sleep(POLL_INTERVAL);
                }
            }
        }
    });
}
