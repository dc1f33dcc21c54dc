use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Unparseable sheet header or body, unsupported MIDI timing, or an unknown file extension.
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    #[error("no playable notes found")]
    EmptyTrack,

    #[error("key actuation failed: {0}")]
    ActuationFailure(String),

    #[error("unexpected state: {0}")]
    UnexpectedState(String),

    #[error("no song loaded")]
    NoSongLoaded,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
