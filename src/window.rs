//! Window interactivity control
//!
//! Single source of truth for the overlay's click-through state, coordinated
//! across three writers: explicit toggle requests, the drag-gesture
//! lifecycle, and hotkey pushes from the native side. The window must be
//! interactive to receive a drag, so starting a gesture saves the current
//! state, forces interactivity, and the gesture's end restores what was
//! saved — unconditionally clearing the saved state even when the restore
//! request fails.
//!
//! Pushes that arrive mid-gesture are not applied immediately: the latest
//! one is parked and adopted after the restore step, so the controller keeps
//! converging toward the state the native side actually applied.

use crate::bridge::OverlayBridge;
use crate::error::BridgeError;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

struct WindowState {
    /// Whether the window currently ignores pointer input
    click_through: bool,
    /// State saved at drag start; Some only while a gesture is active
    prior_click_through: Option<bool>,
    /// Latest native push received while a gesture was active
    deferred_push: Option<bool>,
}

pub(crate) struct WindowController<B> {
    bridge: Arc<B>,
    state: Mutex<WindowState>,
}

impl<B: OverlayBridge> WindowController<B> {
    /// Create a controller; the overlay starts click-through
    pub(crate) fn new(bridge: Arc<B>) -> Self {
        Self {
            bridge,
            state: Mutex::new(WindowState {
                click_through: true,
                prior_click_through: None,
                deferred_push: None,
            }),
        }
    }

    pub(crate) fn is_click_through(&self) -> bool {
        self.state.lock().map(|s| s.click_through).unwrap_or(true)
    }

    #[allow(dead_code)]
    fn is_dragging(&self) -> bool {
        self.state
            .lock()
            .map(|s| s.prior_click_through.is_some())
            .unwrap_or(false)
    }

    /// Flip the click-through state via the native side
    ///
    /// Issues an idempotent "set to X" request; on failure the local state
    /// is left unchanged. Ignored while a drag gesture is active.
    pub(crate) async fn toggle(&self) -> Result<bool, BridgeError> {
        let next = {
            let Ok(state) = self.state.lock() else {
                return Ok(true);
            };
            if state.prior_click_through.is_some() {
                debug!("Toggle ignored during drag gesture");
                return Ok(state.click_through);
            }
            !state.click_through
        };

        self.bridge.set_click_through(next).await?;

        if let Ok(mut state) = self.state.lock() {
            state.click_through = next;
        }
        info!("Click-through toggled to {}", next);
        Ok(next)
    }

    /// Adopt a click-through state pushed by the native side
    ///
    /// The push reflects an already-applied change (global hotkey), so no
    /// request is issued back. During a drag the push is parked and applied
    /// when the gesture ends.
    pub(crate) fn on_backend_toggle(&self, enabled: bool) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        if state.prior_click_through.is_some() {
            debug!("Deferring hotkey toggle received during drag: {}", enabled);
            state.deferred_push = Some(enabled);
        } else {
            state.click_through = enabled;
            info!("Adopted click-through state from hotkey: {}", enabled);
        }
    }

    /// Start a drag gesture
    ///
    /// Saves the current click-through state and makes the window
    /// interactive so it can receive the gesture, then starts the native
    /// window move. Any failure aborts the gesture and restores the saved
    /// state.
    pub(crate) async fn begin_drag(&self) -> Result<(), BridgeError> {
        let was_click_through = {
            let Ok(mut state) = self.state.lock() else {
                return Ok(());
            };
            if state.prior_click_through.is_some() {
                warn!("Drag gesture already active");
                return Ok(());
            }
            state.prior_click_through = Some(state.click_through);
            state.click_through
        };

        if was_click_through {
            if let Err(e) = self.bridge.set_click_through(false).await {
                if let Ok(mut state) = self.state.lock() {
                    state.prior_click_through = None;
                }
                return Err(e);
            }
            if let Ok(mut state) = self.state.lock() {
                state.click_through = false;
            }
        }

        if let Err(e) = self.bridge.begin_window_drag().await {
            warn!("Failed to start native drag: {}", e);
            self.end_drag().await;
            return Err(e);
        }

        debug!("Drag gesture started (was click-through: {})", was_click_through);
        Ok(())
    }

    /// End a drag gesture
    ///
    /// Restores the saved click-through state, then applies any push that
    /// arrived mid-gesture. The saved state is cleared before the restore
    /// request so a failure cannot leave the gesture half-open; restore
    /// failures are logged, never retried.
    pub(crate) async fn end_drag(&self) {
        let (prior, deferred) = {
            let Ok(mut state) = self.state.lock() else {
                return;
            };
            (
                state.prior_click_through.take(),
                state.deferred_push.take(),
            )
        };

        if prior == Some(true) {
            match self.bridge.set_click_through(true).await {
                Ok(()) => {
                    if let Ok(mut state) = self.state.lock() {
                        state.click_through = true;
                    }
                }
                Err(e) => {
                    warn!("Failed to restore click-through after drag: {}", e);
                }
            }
        }

        if let Some(enabled) = deferred {
            if let Ok(mut state) = self.state.lock() {
                state.click_through = enabled;
            }
            info!("Applied deferred hotkey toggle after drag: {}", enabled);
        }

        debug!("Drag gesture ended");
    }
}
