//! Native bridge surface
//!
//! The overlay core talks to the native side through a small command
//! surface (request/response) and a push-event subscription. Controllers
//! are generic over [`OverlayBridge`] so tests can substitute a mock.

pub(crate) mod native;
pub(crate) mod stream;

use crate::error::BridgeError;
use std::path::Path;
use tokio::sync::broadcast;

/// Push notifications from the native side
#[derive(Clone, Debug)]
pub(crate) enum BridgeEvent {
    /// Tentative speech-to-text for an utterance still being spoken
    InterimTranscript { text: String },
    /// Confirmed speech-to-text for a completed utterance
    FinalTranscript { text: String },
    /// Click-through state changed by a global hotkey, already applied
    ClickThroughToggled { enabled: bool },
}

/// Command surface of the native bridge
pub(crate) trait OverlayBridge: Send + Sync + 'static {
    /// Start the streaming recognizer for a live transcription session
    async fn start_live_transcription(
        &self,
        recognizer: &Path,
        model: &Path,
    ) -> Result<(), BridgeError>;

    /// Stop the live transcription session
    async fn stop_live_transcription(&self) -> Result<(), BridgeError>;

    /// Send a prompt to the AI assistant and return its answer
    async fn query_assistant(&self, prompt: &str) -> Result<String, BridgeError>;

    /// Apply a click-through state to the overlay window
    async fn set_click_through(&self, enabled: bool) -> Result<(), BridgeError>;

    /// Hide the overlay window
    async fn hide_window(&self) -> Result<(), BridgeError>;

    /// Start a native window move for an in-progress drag gesture
    async fn begin_window_drag(&self) -> Result<(), BridgeError>;

    /// Subscribe to push events; dropping the receiver ends the subscription
    fn subscribe(&self) -> broadcast::Receiver<BridgeEvent>;
}
