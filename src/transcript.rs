//! Live transcript assembly
//!
//! Merges the recognizer's interim and final transcription events into a
//! stable transcript: an append-only list of committed lines plus a single
//! volatile trailing line. The recognizer does not guarantee a timely final
//! event for every utterance, so a pause timeout promotes stale interim text
//! after a quiet period.
//!
//! Each interim update bumps an epoch counter. The scheduled promotion task
//! captures the epoch it was created for and commits only if it is still
//! current, so a superseded timer can never touch newer text. A promotion
//! also remembers what it committed: if the recognizer's own final for the
//! same utterance arrives late, it is dropped instead of duplicating a line.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

#[derive(Default)]
struct AssemblerState {
    /// Committed transcript lines, earliest first
    finalized: Vec<String>,
    /// Current uncommitted interim line
    in_progress: String,
    /// Bumped on every event that supersedes a scheduled promotion
    epoch: u64,
    /// At most one outstanding promotion task
    pending: Option<JoinHandle<()>>,
    /// Text committed by the most recent pause timeout or stop flush,
    /// cleared by the next interim or non-empty final event
    promoted: Option<String>,
}

impl AssemblerState {
    fn cancel_pending(&mut self) {
        if let Some(task) = self.pending.take() {
            task.abort();
        }
    }
}

/// Assembles interim and final transcription events into a display transcript
pub(crate) struct TranscriptAssembler {
    state: Arc<Mutex<AssemblerState>>,
    pause_window: Duration,
}

impl TranscriptAssembler {
    pub(crate) fn new(pause_window: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(AssemblerState::default())),
            pause_window,
        }
    }

    /// Handle an interim transcription event
    ///
    /// Overwrites the volatile line and re-arms the pause timeout. Empty
    /// payloads are ignored.
    pub(crate) fn on_interim(&self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        let Ok(mut state) = self.state.lock() else {
            return;
        };

        state.in_progress = text.to_string();
        state.epoch += 1;
        state.promoted = None;
        state.cancel_pending();

        let epoch = state.epoch;
        let shared = Arc::clone(&self.state);
        let pause_window = self.pause_window;
        state.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(pause_window).await;
            promote_stale_interim(&shared, epoch);
        }));
    }

    /// Handle a final transcription event
    ///
    /// Commits the text and clears the volatile line. A pending pause
    /// timeout is cancelled so the same utterance cannot be committed twice;
    /// symmetrically, a final that matches what the timeout already promoted
    /// is dropped.
    pub(crate) fn on_final(&self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        let Ok(mut state) = self.state.lock() else {
            return;
        };

        state.epoch += 1;
        state.cancel_pending();
        state.in_progress.clear();

        if state.promoted.as_deref() == Some(text) {
            debug!("Dropping final already committed by pause timeout: {}", text);
            state.promoted = None;
            return;
        }

        state.promoted = None;
        state.finalized.push(text.to_string());
    }

    /// Clear all state for a new recording session
    pub(crate) fn reset(&self) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        state.epoch += 1;
        state.cancel_pending();
        state.finalized.clear();
        state.in_progress.clear();
        state.promoted = None;
    }

    /// Commit any unterminated utterance when the session stops
    ///
    /// Cancels the pause timeout first so it cannot race a second commit of
    /// the same text. The flushed text is remembered like a promotion: the
    /// recognizer flushes its last line as a final when it exits, and that
    /// straggler must not be committed a second time.
    pub(crate) fn stop_and_flush(&self) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        state.epoch += 1;
        state.cancel_pending();
        if !state.in_progress.is_empty() {
            let text = std::mem::take(&mut state.in_progress);
            info!("Flushing unterminated utterance: {}", text);
            state.promoted = Some(text.clone());
            state.finalized.push(text);
        }
    }

    /// Get the full display transcript
    ///
    /// Committed lines joined by newlines, with the volatile line appended
    /// last when non-empty.
    pub(crate) fn render(&self) -> String {
        let Ok(state) = self.state.lock() else {
            return String::new();
        };
        let mut transcript = state.finalized.join("\n");
        if !state.in_progress.is_empty() {
            if !transcript.is_empty() {
                transcript.push('\n');
            }
            transcript.push_str(&state.in_progress);
        }
        transcript
    }

    /// Whether any text has been captured this session
    pub(crate) fn has_content(&self) -> bool {
        match self.state.lock() {
            Ok(state) => !state.finalized.is_empty() || !state.in_progress.is_empty(),
            Err(_) => false,
        }
    }
}

impl Drop for TranscriptAssembler {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.cancel_pending();
        }
    }
}

/// Pause timeout fired: commit the interim text if it is still current
fn promote_stale_interim(shared: &Arc<Mutex<AssemblerState>>, epoch: u64) {
    let Ok(mut state) = shared.lock() else {
        return;
    };

    if state.epoch != epoch {
        debug!("Ignoring stale pause timeout (epoch {})", epoch);
        return;
    }
    if state.in_progress.is_empty() {
        return;
    }

    let text = std::mem::take(&mut state.in_progress);
    info!("Pause timeout promoted interim text: {}", text);
    state.promoted = Some(text.clone());
    state.finalized.push(text);
    state.pending = None;
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAUSE: Duration = Duration::from_millis(1500);

    fn lines(assembler: &TranscriptAssembler) -> Vec<String> {
        assembler.state.lock().unwrap().finalized.clone()
    }

    fn in_progress(assembler: &TranscriptAssembler) -> String {
        assembler.state.lock().unwrap().in_progress.clone()
    }

    #[tokio::test(start_paused = true)]
    async fn test_interim_overwrites_volatile_line() {
        let assembler = TranscriptAssembler::new(PAUSE);
        assembler.on_interim("the");
        assembler.on_interim("the quick");
        assembler.on_interim("the quick brown");

        assert_eq!(assembler.render(), "the quick brown");
        assert!(lines(&assembler).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_timeout_promotes_once() {
        let assembler = TranscriptAssembler::new(PAUSE);
        assembler.on_interim("testing one two");

        tokio::time::sleep(Duration::from_millis(1600)).await;
        assert_eq!(lines(&assembler), vec!["testing one two"]);
        assert!(in_progress(&assembler).is_empty());

        // Further idle time must not duplicate the line
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(lines(&assembler), vec!["testing one two"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_interim_rearms_timeout() {
        let assembler = TranscriptAssembler::new(PAUSE);
        assembler.on_interim("first draft");
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assembler.on_interim("second draft");

        // 1400ms after the second interim: the first timer (which would have
        // fired by now) must not have committed anything
        tokio::time::sleep(Duration::from_millis(1400)).await;
        assert!(lines(&assembler).is_empty());
        assert_eq!(in_progress(&assembler), "second draft");

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(lines(&assembler), vec!["second draft"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_final_cancels_pending_timeout() {
        let assembler = TranscriptAssembler::new(PAUSE);
        assembler.on_interim("the quick");
        tokio::time::sleep(Duration::from_millis(200)).await;
        assembler.on_interim("the quick brown fox");
        tokio::time::sleep(Duration::from_millis(10)).await;
        assembler.on_final("the quick brown fox");

        // Run well past the pause window; no timer may fire
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(lines(&assembler), vec!["the quick brown fox"]);
        assert!(in_progress(&assembler).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_final_after_promotion_is_dropped() {
        let assembler = TranscriptAssembler::new(PAUSE);
        assembler.on_interim("hello there");
        tokio::time::sleep(Duration::from_millis(1600)).await;
        assert_eq!(lines(&assembler), vec!["hello there"]);

        // The recognizer's own final for the same utterance arrives late
        assembler.on_final("hello there");
        assert_eq!(lines(&assembler), vec!["hello there"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_utterance_is_kept() {
        let assembler = TranscriptAssembler::new(PAUSE);
        assembler.on_interim("hello there");
        tokio::time::sleep(Duration::from_millis(1600)).await;
        assembler.on_final("hello there"); // dropped: duplicate of promotion

        // Saying the same thing again later is new speech
        assembler.on_interim("hello there");
        assembler.on_final("hello there");
        assert_eq!(lines(&assembler), vec!["hello there", "hello there"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_final_appends_and_clears() {
        let assembler = TranscriptAssembler::new(PAUSE);
        assembler.on_interim("draft text");
        assembler.on_final("clean text");

        assert_eq!(lines(&assembler), vec!["clean text"]);
        assert!(in_progress(&assembler).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_payloads_ignored() {
        let assembler = TranscriptAssembler::new(PAUSE);
        assembler.on_interim("   ");
        assert!(!assembler.has_content());

        // An empty final must not advance state: the pending interim
        // survives and its pause timeout still fires
        assembler.on_interim("kept");
        assembler.on_final("");
        assert_eq!(in_progress(&assembler), "kept");

        tokio::time::sleep(Duration::from_millis(1600)).await;
        assert_eq!(lines(&assembler), vec!["kept"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_and_flush_commits_trailing_utterance() {
        let assembler = TranscriptAssembler::new(PAUSE);
        assembler.on_interim("hello");
        assembler.stop_and_flush();

        assert_eq!(lines(&assembler), vec!["hello"]);
        assert!(in_progress(&assembler).is_empty());

        // The cancelled timer must not fire afterwards
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(lines(&assembler), vec!["hello"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_final_after_flush_is_dropped() {
        let assembler = TranscriptAssembler::new(PAUSE);
        assembler.on_interim("hello");
        assembler.stop_and_flush();

        // Killing the recognizer flushes its last line as a final
        assembler.on_final("hello");
        assert_eq!(lines(&assembler), vec!["hello"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_clears_everything() {
        let assembler = TranscriptAssembler::new(PAUSE);
        assembler.on_final("committed");
        assembler.on_interim("pending");
        assembler.reset();

        assert!(lines(&assembler).is_empty());
        assert!(in_progress(&assembler).is_empty());
        assert!(!assembler.has_content());

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(lines(&assembler).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_render_joins_lines() {
        let assembler = TranscriptAssembler::new(PAUSE);
        assembler.on_final("first line");
        assembler.on_final("second line");
        assembler.on_interim("and a third");

        assert_eq!(assembler.render(), "first line\nsecond line\nand a third");

        assembler.on_final("and a third one");
        assert_eq!(
            assembler.render(),
            "first line\nsecond line\nand a third one"
        );
    }
}
