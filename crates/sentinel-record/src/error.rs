use {
    sentinel_image::ImageError,
    std::{fmt, path::PathBuf},
};

#[derive(Debug)]
pub enum RecordError {
    /// The video sink could not be created. No session was started.
    WriterInit(String),
    /// One recording could not be removed during eviction.
    Eviction { path: PathBuf, reason: String },
    /// A frame could not be written to the open sink.
    Write(String),
    Io(std::io::Error),
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordError::WriterInit(msg) => write!(f, "cannot open video writer: {msg}"),
            RecordError::Eviction { path, reason } => {
                write!(f, "cannot remove {}: {reason}", path.display())
            }
            RecordError::Write(msg) => write!(f, "write error: {msg}"),
            RecordError::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for RecordError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RecordError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for RecordError {
    fn from(err: std::io::Error) -> Self {
        RecordError::Io(err)
    }
}

impl From<ImageError> for RecordError {
    fn from(err: ImageError) -> Self {
        RecordError::Write(err.to_string())
    }
}
