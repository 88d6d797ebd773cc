use {
    crate::{AviWriter, FourCc, RecordError},
    sentinel_base::Vec2,
    sentinel_image::Frame,
    std::path::Path,
};

#[cfg(feature = "ffmpeg")]
use std::{path::PathBuf, sync::OnceLock};

/// An open video file accepting frames of one fixed size.
pub trait VideoSink: Send {
    fn write(&mut self, frame: &Frame) -> Result<(), RecordError>;

    /// Flush and finalize the file. The sink accepts no frames afterwards.
    fn close(&mut self) -> Result<(), RecordError>;
}

/// Creates the sink for each recording session.
pub trait SinkFactory: Send + Sync {
    fn open(
        &self,
        path: &Path,
        codec: FourCc,
        fps: u32,
        size: Vec2<usize>,
    ) -> Result<Box<dyn VideoSink>, RecordError>;
}

/// Writes `MJPG` in-process as AVI, and every other codec through an
/// ffmpeg child process (feature `ffmpeg`). The ffmpeg binary is looked up
/// on first use and reused for every later session.
pub struct DefaultSinkFactory {
    jpeg_quality: u8,
    #[cfg(feature = "ffmpeg")]
    ffmpeg: OnceLock<Option<PathBuf>>,
}

impl DefaultSinkFactory {
    pub fn new() -> Self {
        Self {
            jpeg_quality: 85,
            #[cfg(feature = "ffmpeg")]
            ffmpeg: OnceLock::new(),
        }
    }

    /// Use `path` as the ffmpeg binary instead of searching for one.
    #[cfg(feature = "ffmpeg")]
    pub fn with_ffmpeg(mut self, path: impl Into<PathBuf>) -> Self {
        self.ffmpeg = OnceLock::from(Some(path.into()));
        self
    }

    #[cfg(feature = "ffmpeg")]
    fn ffmpeg(&self) -> Option<&Path> {
        self.ffmpeg
            .get_or_init(crate::ffmpeg::find_ffmpeg)
            .as_deref()
    }

    /// JPEG quality (1-100) of MJPEG frames.
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }
}

impl Default for DefaultSinkFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl SinkFactory for DefaultSinkFactory {
    fn open(
        &self,
        path: &Path,
        codec: FourCc,
        fps: u32,
        size: Vec2<usize>,
    ) -> Result<Box<dyn VideoSink>, RecordError> {
        if size.is_empty() || fps == 0 {
            return Err(RecordError::WriterInit(format!(
                "invalid output format {} @ {} fps",
                size, fps
            )));
        }
        if codec.is_mjpeg() {
            return Ok(Box::new(AviWriter::create(path, fps, size, self.jpeg_quality)?));
        }
        #[cfg(feature = "ffmpeg")]
        {
            let ffmpeg = self
                .ffmpeg()
                .ok_or_else(|| RecordError::WriterInit("ffmpeg not found".to_string()))?;
            Ok(Box::new(crate::FfmpegSink::spawn(ffmpeg, path, codec, fps, size)?))
        }
        #[cfg(not(feature = "ffmpeg"))]
        {
            Err(RecordError::WriterInit(format!(
                "codec {} needs the ffmpeg feature",
                codec
            )))
        }
    }
}
