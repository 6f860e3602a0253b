use std::{io, path::PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unrecognized log level '{0}' (expected one of error, warn, info, debug)")]
    InvalidLevel(String),

    #[error("Failed to parse the logging configuration")]
    ConfigParse(#[from] serde_yaml::Error),

    #[error("Failed to encode or decode a JSON log line")]
    Json(#[from] serde_json::Error),

    #[error("Log directory '{}' is not writable ({})", .0.display(), .1.kind())]
    LogDirUnavailable(PathBuf, #[source] io::Error),

    #[error("The background log writer has shut down")]
    WriterClosed,

    #[error(
        "Encountered an IO error while writing a log line ({})",
        .0.kind()
    )]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn log_dir<P: Into<PathBuf>>(dir: P, e: io::Error) -> Self {
        Error::LogDirUnavailable(dir.into(), e)
    }
}
