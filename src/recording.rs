//! Recording session management
//!
//! Glue between the user-facing operations (start, stop, ask) and the
//! native bridge. A session owns nothing native: starting resets the
//! transcript assembler and asks the bridge to launch the recognizer;
//! stopping kills the recognizer, flushes the trailing utterance, and saves
//! the transcript. A separate pump task dispatches bridge push events to
//! the assembler and the window controller.

use crate::bridge::{BridgeEvent, OverlayBridge};
use crate::error::BridgeError;
use crate::status::StatusLine;
use crate::storage;
use crate::transcript::TranscriptAssembler;
use crate::window::WindowController;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

pub(crate) struct RecordingController<B> {
    bridge: Arc<B>,
    assembler: Arc<TranscriptAssembler>,
    status: StatusLine,
    recognizer_path: PathBuf,
    model_path: PathBuf,
    transcript_dir: Option<PathBuf>,
    recording: AtomicBool,
}

impl<B: OverlayBridge> RecordingController<B> {
    pub(crate) fn new(
        bridge: Arc<B>,
        assembler: Arc<TranscriptAssembler>,
        status: StatusLine,
        recognizer_path: PathBuf,
        model_path: PathBuf,
        transcript_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            bridge,
            assembler,
            status,
            recognizer_path,
            model_path,
            transcript_dir,
            recording: AtomicBool::new(false),
        }
    }

    pub(crate) fn is_recording(&self) -> bool {
        self.recording.load(Ordering::SeqCst)
    }

    /// Start a recording session
    ///
    /// Clears the previous transcript first so the display never mixes two
    /// sessions. A bridge failure aborts the start and is reported on the
    /// status line.
    pub(crate) async fn start(&self) {
        if self.recording.swap(true, Ordering::SeqCst) {
            info!("Recording already in progress");
            return;
        }

        self.assembler.reset();

        if let Err(e) = self
            .bridge
            .start_live_transcription(&self.recognizer_path, &self.model_path)
            .await
        {
            error!("Failed to start transcription: {}", e);
            self.status.set(format!("Failed to start: {}", e));
            self.recording.store(false, Ordering::SeqCst);
            return;
        }

        self.status.set("Listening...");
        info!("Recording started");
    }

    /// Stop the recording session
    ///
    /// Flushes the unterminated utterance after cancelling the pause
    /// timeout, then persists the transcript. A failure to stop the
    /// recognizer is reported but the local flush still happens, so spoken
    /// text is never lost.
    pub(crate) async fn stop(&self) {
        if !self.recording.swap(false, Ordering::SeqCst) {
            return;
        }

        if let Err(e) = self.bridge.stop_live_transcription().await {
            error!("Failed to stop transcription: {}", e);
            self.status.set(format!("Failed to stop: {}", e));
        } else {
            self.status.set("Stopped");
        }

        self.assembler.stop_and_flush();
        self.save_transcript();
        info!("Recording stopped");
    }

    /// Ask the assistant a question, with the transcript as context
    pub(crate) async fn ask(&self, question: &str) -> Result<String, BridgeError> {
        let question = question.trim();
        if question.is_empty() {
            return Ok(String::new());
        }

        self.status.set("Thinking...");

        let transcript = self.assembler.render();
        let prompt = if transcript.is_empty() {
            question.to_string()
        } else {
            format!(
                "Transcript so far:\n{}\n\nQuestion: {}",
                transcript, question
            )
        };

        match self.bridge.query_assistant(&prompt).await {
            Ok(answer) => {
                self.status.clear();
                Ok(answer)
            }
            Err(e) => {
                error!("Assistant query failed: {}", e);
                self.status.set(e.to_string());
                Err(e)
            }
        }
    }

    fn save_transcript(&self) {
        if !self.assembler.has_content() {
            return;
        }
        let Some(dir) = self
            .transcript_dir
            .clone()
            .or_else(storage::default_transcripts_dir)
        else {
            warn!("No transcripts directory available, skipping save");
            return;
        };
        match storage::save_transcript(&dir, &self.assembler.render()) {
            Ok(path) => self.status.set(format!("Saved {}", path.display())),
            Err(e) => {
                error!("Failed to save transcript: {}", e);
                self.status.set(format!("Failed to save transcript: {}", e));
            }
        }
    }
}

/// Spawn the task that dispatches bridge push events
///
/// Interim and final transcriptions feed the assembler; hotkey toggles feed
/// the window controller. The task exits when the bridge drops its sender,
/// which releases the subscription.
pub(crate) fn spawn_event_pump<B: OverlayBridge>(
    bridge: &B,
    assembler: Arc<TranscriptAssembler>,
    window: Arc<WindowController<B>>,
) -> tokio::task::JoinHandle<()> {
    let mut event_rx = bridge.subscribe();
    tokio::spawn(async move {
        loop {
            match event_rx.recv().await {
                Ok(BridgeEvent::InterimTranscript { text }) => assembler.on_interim(&text),
                Ok(BridgeEvent::FinalTranscript { text }) => assembler.on_final(&text),
                Ok(BridgeEvent::ClickThroughToggled { enabled }) => {
                    window.on_backend_toggle(enabled)
                }
                Err(RecvError::Lagged(missed)) => {
                    warn!("Event pump lagged, dropped {} events", missed);
                }
                Err(RecvError::Closed) => break,
            }
        }
        info!("Event pump stopped");
    })
}
