//! Native bridge implementation
//!
//! Owns the recognizer child process, the assistant client, and the
//! window-side flags (click-through, visibility). Actually applying those
//! flags to a surface is the platform shell's job; the bridge is the source
//! of truth the shell reads, and it pushes state changes to subscribers.

use super::stream::spawn_reader_task;
use super::{BridgeEvent, OverlayBridge};
use crate::assistant::GeminiClient;
use crate::error::BridgeError;
use std::path::Path;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::process::{Child, Command};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info};

/// Worker threads passed to the recognizer
const RECOGNIZER_THREADS: &str = "8";

pub(crate) struct NativeBridge {
    assistant: GeminiClient,
    event_tx: broadcast::Sender<BridgeEvent>,
    recognizer: Mutex<Option<Child>>,
    click_through: AtomicBool,
    visible: AtomicBool,
}

impl NativeBridge {
    pub(crate) fn new(assistant: GeminiClient) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            assistant,
            event_tx,
            recognizer: Mutex::new(None),
            // The overlay starts click-through and visible
            click_through: AtomicBool::new(true),
            visible: AtomicBool::new(true),
        }
    }

    /// Handle the global click-through hotkey
    ///
    /// The toggle is applied here, bridge-side, and pushed to subscribers;
    /// the controller adopts the pushed state without a round trip.
    pub(crate) fn toggle_click_through_hotkey(&self) -> bool {
        let enabled = !self.click_through.load(Ordering::SeqCst);
        self.click_through.store(enabled, Ordering::SeqCst);
        info!("Hotkey toggled click-through to {}", enabled);
        let _ = self
            .event_tx
            .send(BridgeEvent::ClickThroughToggled { enabled });
        enabled
    }

    /// Handle the global hide/show hotkey
    pub(crate) fn toggle_visibility_hotkey(&self) -> bool {
        let visible = !self.visible.load(Ordering::SeqCst);
        self.visible.store(visible, Ordering::SeqCst);
        info!(
            "Hotkey toggled window visibility: {}",
            if visible { "shown" } else { "hidden" }
        );
        visible
    }
}

impl OverlayBridge for NativeBridge {
    async fn start_live_transcription(
        &self,
        recognizer: &Path,
        model: &Path,
    ) -> Result<(), BridgeError> {
        let mut guard = self.recognizer.lock().await;
        if guard.is_some() {
            return Err(BridgeError::AlreadyRunning);
        }

        let mut child = Command::new(recognizer)
            .arg("-m")
            .arg(model)
            .args(["-t", RECOGNIZER_THREADS])
            .stdout(Stdio::piped())
            .stdin(Stdio::null())
            .spawn()
            .map_err(|e| BridgeError::SpawnRecognizer {
                path: recognizer.to_path_buf(),
                source: e,
            })?;

        let stdout = child.stdout.take().ok_or(BridgeError::NoRecognizerOutput)?;
        spawn_reader_task(stdout, self.event_tx.clone());

        info!(
            recognizer = %recognizer.display(),
            model = %model.display(),
            "Live transcription started"
        );
        *guard = Some(child);
        Ok(())
    }

    async fn stop_live_transcription(&self) -> Result<(), BridgeError> {
        let mut guard = self.recognizer.lock().await;
        if let Some(mut child) = guard.take() {
            child.kill().await.map_err(BridgeError::StopRecognizer)?;
            info!("Live transcription stopped");
        }
        Ok(())
    }

    async fn query_assistant(&self, prompt: &str) -> Result<String, BridgeError> {
        Ok(self.assistant.generate(prompt).await?)
    }

    async fn set_click_through(&self, enabled: bool) -> Result<(), BridgeError> {
        self.click_through.store(enabled, Ordering::SeqCst);
        // No push event here: the caller issued this command and already
        // tracks the state. Echoing it back would feed the controller's
        // deferral logic its own request mid-drag.
        debug!("Click-through set to {}", enabled);
        Ok(())
    }

    async fn hide_window(&self) -> Result<(), BridgeError> {
        self.visible.store(false, Ordering::SeqCst);
        info!("Overlay window hidden");
        Ok(())
    }

    async fn begin_window_drag(&self) -> Result<(), BridgeError> {
        debug!("Native window drag started");
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<BridgeEvent> {
        self.event_tx.subscribe()
    }
}
