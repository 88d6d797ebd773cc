use {sentinel_base::Vec2, std::path::PathBuf};

/// Configuration for camera capture.
#[derive(Clone, Debug, PartialEq)]
pub struct CameraConfig {
    device_index: usize,
    device_path: Option<PathBuf>,
    width: usize,
    height: usize,
    fps: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device_index: 0,
            device_path: None,
            width: 640,
            height: 480,
            fps: 20,
        }
    }
}

impl CameraConfig {
    /// Select the capture device by index (e.g. 0 for `/dev/video0`).
    pub fn with_device_index(mut self, index: usize) -> Self {
        self.device_index = index;
        self
    }

    /// Select the capture device by path. Takes precedence over the index.
    pub fn with_device_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.device_path = Some(path.into());
        self
    }

    /// Set the capture width in pixels.
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    /// Set the capture height in pixels.
    pub fn with_height(mut self, height: usize) -> Self {
        self.height = height;
        self
    }

    /// Set the capture size in pixels.
    pub fn with_size(self, size: Vec2<usize>) -> Self {
        self.with_width(size.x).with_height(size.y)
    }

    /// Set the frames per second.
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    // Getters
    pub fn device_index(&self) -> usize {
        self.device_index
    }

    pub fn device_path(&self) -> Option<&PathBuf> {
        self.device_path.as_ref()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn size(&self) -> Vec2<usize> {
        Vec2::new(self.width, self.height)
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }
}
