//! Recognizer output stream parsing
//!
//! The streaming recognizer writes its live hypothesis to stdout, redrawing
//! the current line with carriage returns and terminating confirmed
//! utterances with newlines, with ANSI escape sequences mixed in for the
//! terminal. The parser turns that raw byte stream into interim and final
//! transcript segments.

use super::BridgeEvent;
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::io::AsyncReadExt;
use tokio::process::ChildStdout;
use tokio::sync::broadcast;
use tracing::{error, info};

/// ANSI escape sequences (e.g. `\x1b[2K`, `\x1b[0m`)
static ANSI_ESCAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x1B\[[0-?]*[ -/]*[@-~]").expect("ANSI pattern is valid"));

/// One parsed piece of recognizer output
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Segment {
    /// Line redraw: a revised hypothesis for the current utterance
    Interim(String),
    /// Newline-terminated: a confirmed utterance
    Final(String),
}

/// Incremental parser over the recognizer's stdout bytes
///
/// Feed it reads of arbitrary size; it accumulates until a `\r` (interim)
/// or `\n` (final) boundary. Segments that are empty after ANSI stripping
/// and trimming are dropped.
#[derive(Default)]
pub(crate) struct StreamParser {
    acc: Vec<u8>,
}

impl StreamParser {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Consume a chunk of stdout bytes, returning completed segments
    pub(crate) fn push_bytes(&mut self, bytes: &[u8]) -> Vec<Segment> {
        let mut segments = Vec::new();
        for &b in bytes {
            match b {
                b'\r' => {
                    if let Some(text) = self.take_clean() {
                        segments.push(Segment::Interim(text));
                    }
                }
                b'\n' => {
                    if let Some(text) = self.take_clean() {
                        segments.push(Segment::Final(text));
                    }
                }
                _ => self.acc.push(b),
            }
        }
        segments
    }

    /// Flush the accumulator at end of stream
    ///
    /// Trailing speech without a newline is treated as final so it is not
    /// lost when the recognizer exits.
    pub(crate) fn finish(&mut self) -> Option<Segment> {
        self.take_clean().map(Segment::Final)
    }

    fn take_clean(&mut self) -> Option<String> {
        let raw = std::mem::take(&mut self.acc);
        let text = String::from_utf8(raw).ok()?;
        let cleaned = ANSI_ESCAPE.replace_all(&text, "").trim().to_string();
        if cleaned.is_empty() {
            None
        } else {
            Some(cleaned)
        }
    }
}

/// Spawn the task that reads recognizer stdout and publishes bridge events
pub(crate) fn spawn_reader_task(
    mut stdout: ChildStdout,
    event_tx: broadcast::Sender<BridgeEvent>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut parser = StreamParser::new();
        let mut buffer = [0u8; 1024];

        loop {
            match stdout.read(&mut buffer).await {
                Ok(0) => {
                    if let Some(Segment::Final(text)) = parser.finish() {
                        let _ = event_tx.send(BridgeEvent::FinalTranscript { text });
                    }
                    info!("Recognizer stream ended");
                    break;
                }
                Ok(n) => {
                    for segment in parser.push_bytes(&buffer[..n]) {
                        let event = match segment {
                            Segment::Interim(text) => BridgeEvent::InterimTranscript { text },
                            Segment::Final(text) => BridgeEvent::FinalTranscript { text },
                        };
                        let _ = event_tx.send(event);
                    }
                }
                Err(e) => {
                    error!("Error reading recognizer stdout: {}", e);
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_carriage_return_yields_interim() {
        let mut parser = StreamParser::new();
        let segments = parser.push_bytes(b"the quick\r");
        assert_eq!(segments, vec![Segment::Interim("the quick".to_string())]);
    }

    #[test]
    fn test_newline_yields_final() {
        let mut parser = StreamParser::new();
        let segments = parser.push_bytes(b"the quick brown fox\n");
        assert_eq!(
            segments,
            vec![Segment::Final("the quick brown fox".to_string())]
        );
    }

    #[test]
    fn test_ansi_escapes_stripped() {
        let mut parser = StreamParser::new();
        let segments = parser.push_bytes(b"\x1b[2K\x1b[0mhello \x1b[32mworld\x1b[0m\n");
        assert_eq!(segments, vec![Segment::Final("hello world".to_string())]);
    }

    #[test]
    fn test_empty_segments_dropped() {
        let mut parser = StreamParser::new();
        let segments = parser.push_bytes(b"\r\n  \r\x1b[2K\n");
        assert!(segments.is_empty());
    }

    #[test]
    fn test_segment_split_across_reads() {
        let mut parser = StreamParser::new();
        assert!(parser.push_bytes(b"hello ").is_empty());
        let segments = parser.push_bytes(b"world\r");
        assert_eq!(segments, vec![Segment::Interim("hello world".to_string())]);
    }

    #[test]
    fn test_finish_flushes_trailing_text_as_final() {
        let mut parser = StreamParser::new();
        parser.push_bytes(b"unterminated utterance");
        assert_eq!(
            parser.finish(),
            Some(Segment::Final("unterminated utterance".to_string()))
        );
        assert_eq!(parser.finish(), None);
    }

    #[test]
    fn test_interleaved_interim_and_final() {
        let mut parser = StreamParser::new();
        let segments = parser.push_bytes(b"the\rthe quick\rthe quick fox\nnext\r");
        assert_eq!(
            segments,
            vec![
                Segment::Interim("the".to_string()),
                Segment::Interim("the quick".to_string()),
                Segment::Final("the quick fox".to_string()),
                Segment::Interim("next".to_string()),
            ]
        );
    }

    #[test]
    fn test_invalid_utf8_dropped() {
        let mut parser = StreamParser::new();
        let segments = parser.push_bytes(&[0xff, 0xfe, b'\n', b'o', b'k', b'\n']);
        assert_eq!(segments, vec![Segment::Final("ok".to_string())]);
    }
}
