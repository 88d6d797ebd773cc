use {
    crate::{CameraConfig, CameraError},
    sentinel_image::Frame,
};

/// A frame producer driven by `FrameSource` on its acquisition thread.
///
/// `open` and `blocking_capture` are always called from the same thread,
/// so backends with thread affinity work unchanged.
pub trait CaptureDevice: Send {
    /// Open the device and apply `config`. Returns the configuration the
    /// device actually accepted.
    fn open(&mut self, config: &CameraConfig) -> Result<CameraConfig, CameraError>;

    /// Release the device, if open.
    fn close(&mut self);

    /// Block until the next frame is available.
    fn blocking_capture(&mut self) -> Result<Frame, CameraError>;
}
