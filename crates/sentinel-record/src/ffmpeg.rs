//! Video sink backed by an `ffmpeg` child process fed raw RGB frames.

use {
    crate::{FourCc, RecordError, VideoSink},
    sentinel_base::Vec2,
    sentinel_image::Frame,
    std::{
        io::Write,
        path::{Path, PathBuf},
        process::{Child, ChildStdin, Command, Stdio},
    },
};

/// Locate a working ffmpeg binary: the ffmpeg-sidecar location first, then
/// the system PATH.
pub fn find_ffmpeg() -> Option<PathBuf> {
    let sidecar_path = ffmpeg_sidecar::paths::ffmpeg_path();
    if test_ffmpeg_binary(&sidecar_path) {
        log::debug!("ffmpeg: using {}", sidecar_path.display());
        return Some(sidecar_path);
    }
    let system = PathBuf::from(if cfg!(windows) { "ffmpeg.exe" } else { "ffmpeg" });
    if test_ffmpeg_binary(&system) {
        log::debug!("ffmpeg: using {} from PATH", system.display());
        return Some(system);
    }
    log::warn!("ffmpeg: no working binary found");
    None
}

fn test_ffmpeg_binary(path: &Path) -> bool {
    Command::new(path)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub struct FfmpegSink {
    child: Child,
    stdin: Option<ChildStdin>,
    path: PathBuf,
    size: Vec2<usize>,
    finished: bool,
}

impl FfmpegSink {
    /// Start `ffmpeg` encoding raw `rgb24` frames from stdin into `path`.
    pub fn spawn(
        ffmpeg: &Path,
        path: &Path,
        codec: FourCc,
        fps: u32,
        size: Vec2<usize>,
    ) -> Result<Self, RecordError> {
        let encoder = codec.ffmpeg_encoder().ok_or_else(|| {
            RecordError::WriterInit(format!("no ffmpeg encoder for codec {}", codec))
        })?;

        let mut command = Command::new(ffmpeg);
        command
            .args(["-hide_banner", "-loglevel", "error", "-y"])
            .args(["-f", "rawvideo", "-pix_fmt", "rgb24"])
            .arg("-s")
            .arg(format!("{}x{}", size.x, size.y))
            .arg("-framerate")
            .arg(fps.to_string())
            .args(["-i", "pipe:0", "-c:v", encoder]);
        if encoder == "mpeg4" {
            command.args(["-vtag", "mp4v", "-q:v", "5"]);
        }
        let mut child = command
            .args(["-pix_fmt", "yuv420p"])
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| RecordError::WriterInit(format!("cannot start ffmpeg: {}", e)))?;

        let Some(stdin) = child.stdin.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(RecordError::WriterInit("ffmpeg stdin unavailable".to_string()));
        };

        log::debug!(
            "ffmpeg: encoding {} @ {} fps with {} into {}",
            size,
            fps,
            encoder,
            path.display()
        );

        Ok(Self {
            child,
            stdin: Some(stdin),
            path: path.to_path_buf(),
            size,
            finished: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl VideoSink for FfmpegSink {
    fn write(&mut self, frame: &Frame) -> Result<(), RecordError> {
        if frame.size != self.size {
            return Err(RecordError::Write(format!(
                "frame is {}, stream is {}",
                frame.size, self.size
            )));
        }
        let Some(stdin) = self.stdin.as_mut() else {
            return Err(RecordError::Write("ffmpeg input is closed".to_string()));
        };
        let rgb = frame.rgb_at(self.size)?;
        stdin
            .write_all(&rgb.data)
            .map_err(|e| RecordError::Write(format!("ffmpeg pipe: {}", e)))
    }

    fn close(&mut self) -> Result<(), RecordError> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;

        // EOF on stdin lets ffmpeg finalize the container
        drop(self.stdin.take());
        let status = self.child.wait()?;
        if !status.success() {
            return Err(RecordError::Write(format!(
                "ffmpeg exited with {} for {}",
                status,
                self.path.display()
            )));
        }
        Ok(())
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::error!("ffmpeg: {}", e);
        }
    }
}
