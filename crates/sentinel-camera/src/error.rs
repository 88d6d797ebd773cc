use {sentinel_image::ImageError, std::fmt};

#[derive(Debug)]
pub enum CameraError {
    /// The device could not be opened or configured.
    DeviceUnavailable(String),
    /// A single frame read failed. Transient; the acquisition loop retries.
    ReadFailure(String),
    Decode(ImageError),
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::DeviceUnavailable(msg) => write!(f, "device unavailable: {msg}"),
            CameraError::ReadFailure(msg) => write!(f, "read failure: {msg}"),
            CameraError::Decode(err) => write!(f, "decode error: {err}"),
        }
    }
}

impl std::error::Error for CameraError {}

impl From<std::io::Error> for CameraError {
    fn from(err: std::io::Error) -> Self {
        CameraError::DeviceUnavailable(err.to_string())
    }
}

impl From<ImageError> for CameraError {
    fn from(err: ImageError) -> Self {
        CameraError::Decode(err)
    }
}
