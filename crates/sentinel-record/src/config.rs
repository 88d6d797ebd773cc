use {
    crate::FourCc,
    sentinel_base::Vec2,
    std::{path::PathBuf, time::Duration},
};

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Configuration for `Recorder`.
#[derive(Clone, Debug, PartialEq)]
pub struct RecorderConfig {
    recordings_dir: PathBuf,
    logs_dir: PathBuf,
    duration: Duration,
    max_storage_bytes: u64,
    codec: FourCc,
    fps: u32,
    size: Vec2<usize>,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            recordings_dir: PathBuf::from("recordings"),
            logs_dir: PathBuf::from("logs"),
            duration: Duration::from_secs(30),
            max_storage_bytes: BYTES_PER_GB as u64,
            codec: FourCc::MP4V,
            fps: 20,
            size: Vec2::new(640, 480),
        }
    }
}

impl RecorderConfig {
    /// Set the directory recordings are written to.
    pub fn with_recordings_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.recordings_dir = dir.into();
        self
    }

    /// Set the directory for log files.
    pub fn with_logs_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.logs_dir = dir.into();
        self
    }

    /// Set how long each recording runs before it stops on its own.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Set the storage cap in bytes.
    pub fn with_max_storage_bytes(mut self, bytes: u64) -> Self {
        self.max_storage_bytes = bytes;
        self
    }

    /// Set the storage cap in gigabytes (GiB).
    pub fn with_max_storage_gb(mut self, gb: f64) -> Self {
        self.max_storage_bytes = (gb.max(0.0) * BYTES_PER_GB) as u64;
        self
    }

    /// Set the codec tag.
    pub fn with_codec(mut self, codec: FourCc) -> Self {
        self.codec = codec;
        self
    }

    /// Set the output frame rate.
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    /// Set the output frame size. Frames of other sizes are resized.
    pub fn with_size(mut self, size: Vec2<usize>) -> Self {
        self.size = size;
        self
    }

    // Getters
    pub fn recordings_dir(&self) -> &PathBuf {
        &self.recordings_dir
    }

    pub fn logs_dir(&self) -> &PathBuf {
        &self.logs_dir
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn max_storage_bytes(&self) -> u64 {
        self.max_storage_bytes
    }

    pub fn max_storage_gb(&self) -> f64 {
        self.max_storage_bytes as f64 / BYTES_PER_GB
    }

    pub fn codec(&self) -> FourCc {
        self.codec
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn size(&self) -> Vec2<usize> {
        self.size
    }
}
