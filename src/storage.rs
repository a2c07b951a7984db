//! Local storage for finished transcripts
//!
//! When a recording session stops, the assembled transcript is written to
//! the user's Documents folder, or to a custom location from the config.

use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Default transcripts directory under the user's Documents folder
pub(crate) fn default_transcripts_dir() -> Option<PathBuf> {
    dirs::document_dir().map(|d| d.join("Scrim").join("transcripts"))
}

/// Save a transcript into `dir`, creating it if needed
///
/// Returns the path to the saved file.
pub(crate) fn save_transcript(dir: &Path, transcript: &str) -> Result<PathBuf, StorageError> {
    if transcript.trim().is_empty() {
        return Err(StorageError::EmptyTranscript);
    }

    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|e| StorageError::CreateDirectory {
            path: dir.to_path_buf(),
            source: e,
        })?;
        info!("Created transcripts directory: {:?}", dir);
    }

    let timestamp = Local::now().format("%Y-%m-%d-%H-%M-%S");
    let filepath = dir.join(format!("transcript-{}.md", timestamp));

    fs::write(&filepath, transcript).map_err(|e| StorageError::WriteFile {
        path: filepath.clone(),
        source: e,
    })?;

    info!("Saved transcript to: {:?}", filepath);
    Ok(filepath)
}

/// Storage errors with contextual information
#[derive(Debug, thiserror::Error)]
pub(crate) enum StorageError {
    #[error("Transcript is empty")]
    EmptyTranscript,

    #[error("Failed to create directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write to file {path}: {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
