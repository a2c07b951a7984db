use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by the native bridge command surface
#[derive(Debug, Error)]
pub(crate) enum BridgeError {
    #[error("Failed to spawn recognizer {path}: {source}")]
    SpawnRecognizer {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Recognizer stdout was not captured")]
    NoRecognizerOutput,

    #[error("A transcription session is already running")]
    AlreadyRunning,

    #[error("Failed to stop recognizer: {0}")]
    StopRecognizer(#[source] std::io::Error),

    #[error("Assistant error: {0}")]
    Assistant(#[from] AssistantError),
}

/// Errors from the AI assistant client
#[derive(Debug, Error)]
pub(crate) enum AssistantError {
    #[error("GEMINI_API_KEY is not set")]
    MissingApiKey,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Assistant API error ({status}): {message}")]
    ServerError { status: u16, message: String },

    #[error("Invalid response from assistant: {0}")]
    InvalidResponse(String),
}
