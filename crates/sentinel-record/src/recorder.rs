use {
    crate::{
        DefaultSinkFactory, FourCc, RecordError, RecorderConfig, SinkFactory, StorageAccountant,
        VideoSink,
    },
    chrono::{DateTime, Local},
    sentinel_base::Vec2,
    sentinel_image::Frame,
    std::{
        path::{Path, PathBuf},
        sync::{
            Arc, Mutex,
            mpsc::{self, RecvTimeoutError},
        },
        thread,
        time::{Duration, Instant},
    },
};

// share of the recordings removed when the cap is reached
const EVICTION_FRACTION: f64 = 0.2;

struct RecordingSession {
    id: u64,
    sink: Box<dyn VideoSink>,
    path: PathBuf,
    started: Instant,
    started_at: DateTime<Local>,
    duration: Duration,
    size: Vec2<usize>,
    codec: FourCc,
    frames_written: u64,
    // dropping the sender cancels the auto-stop timer
    timer: Option<mpsc::Sender<()>>,
}

#[derive(Default)]
struct State {
    session: Option<RecordingSession>,
    next_id: u64,
}

/// Writes motion events into time-boxed video files.
///
/// At most one session is active. Each session stops on its own after the
/// configured duration, or earlier through `stop_recording`; whichever
/// comes first tears the session down and the other does nothing.
pub struct Recorder {
    config: RecorderConfig,
    storage: StorageAccountant,
    factory: Box<dyn SinkFactory>,
    state: Arc<Mutex<State>>,
}

impl Recorder {
    pub fn new(config: RecorderConfig) -> Self {
        Self::with_sink_factory(config, DefaultSinkFactory::new())
    }

    pub fn with_sink_factory(config: RecorderConfig, factory: impl SinkFactory + 'static) -> Self {
        let storage =
            StorageAccountant::new(config.recordings_dir().clone(), config.max_storage_bytes());
        Self {
            config,
            storage,
            factory: Box::new(factory),
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    pub fn storage(&self) -> &StorageAccountant {
        &self.storage
    }

    /// Start a new recording into `filename` (relative to the recordings
    /// directory) or into a timestamped default name.
    ///
    /// Returns `Ok(false)` if a recording is already running. When the
    /// directory is at or over the storage cap, the oldest recordings are
    /// evicted before the new file is opened.
    pub fn start_recording(&self, filename: Option<&str>) -> Result<bool, RecordError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.session.is_some() {
            return Ok(false);
        }

        self.storage.ensure_dir()?;
        let snapshot = self.storage.snapshot()?;
        log::info!("recorder: storage used {}", snapshot);
        if snapshot.is_over_cap() {
            log::warn!("recorder: storage cap reached, removing old recordings");
            let report = self.storage.evict_oldest(EVICTION_FRACTION)?;
            log::info!(
                "recorder: evicted {} file(s), freed {} bytes, {} failure(s)",
                report.removed.len(),
                report.freed_bytes,
                report.failures.len()
            );
        }

        let codec = self.config.codec();
        let path = match filename {
            Some(name) => self.storage.dir().join(name),
            None => unique_path(
                self.storage.dir(),
                &recording_file_name(Local::now(), codec),
            ),
        };

        let size = self.config.size();
        let fps = self.config.fps();
        let sink = self
            .factory
            .open(&path, codec, fps, size)
            .map_err(|e| match e {
                RecordError::WriterInit(_) => e,
                other => RecordError::WriterInit(other.to_string()),
            })
            .inspect_err(|e| log::error!("recorder: failed to start {}: {}", path.display(), e))?;

        let id = state.next_id;
        state.next_id += 1;
        let duration = self.config.duration();
        let (cancel_tx, cancel_rx) = mpsc::channel::<()>();
        let timer_state = Arc::clone(&self.state);
        thread::spawn(move || {
            if let Err(RecvTimeoutError::Timeout) = cancel_rx.recv_timeout(duration) {
                log::debug!("recorder: session {} reached its duration", id);
                stop_session(&timer_state, Some(id));
            }
        });

        log::info!(
            "recorder: started {} ({} {} @ {} fps, {:.0}s)",
            path.display(),
            codec,
            size,
            fps,
            duration.as_secs_f64()
        );
        state.session = Some(RecordingSession {
            id,
            sink,
            path,
            started: Instant::now(),
            started_at: Local::now(),
            duration,
            size,
            codec,
            frames_written: 0,
            timer: Some(cancel_tx),
        });
        Ok(true)
    }

    /// Append `frame` to the running recording, converted to RGB at the
    /// session's output size. Returns `Ok(false)` without touching any file
    /// when no recording is running. A failed write leaves the session open.
    pub fn write_frame(&self, frame: &Frame) -> Result<bool, RecordError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let Some(session) = state.session.as_mut() else {
            return Ok(false);
        };
        if frame.is_empty() {
            return Ok(false);
        }
        let frame = frame.rgb_at(session.size)?;
        session.sink.write(&frame)?;
        session.frames_written += 1;
        Ok(true)
    }

    /// Stop the running recording and finalize its file. Returns how long
    /// it ran, or `None` if nothing was recording.
    pub fn stop_recording(&self) -> Option<Duration> {
        stop_session(&self.state, None)
    }

    pub fn is_recording(&self) -> bool {
        self.with_session(|_| ()).is_some()
    }

    /// Output file of the running recording.
    pub fn current_path(&self) -> Option<PathBuf> {
        self.with_session(|session| session.path.clone())
    }

    /// Frames written into the running recording.
    pub fn frames_written(&self) -> Option<u64> {
        self.with_session(|session| session.frames_written)
    }

    /// Local start time of the running recording.
    pub fn started_at(&self) -> Option<DateTime<Local>> {
        self.with_session(|session| session.started_at)
    }

    fn with_session<T>(&self, f: impl FnOnce(&RecordingSession) -> T) -> Option<T> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.session.as_ref().map(f)
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        self.stop_recording();
    }
}

// Take the session out under the lock and finalize it outside. With
// `only` set, only that session id is stopped, so a late timer never ends
// a newer recording.
fn stop_session(state: &Mutex<State>, only: Option<u64>) -> Option<Duration> {
    let mut session = {
        let mut state = state.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(id) = only {
            if state.session.as_ref().map(|s| s.id) != Some(id) {
                return None;
            }
        }
        state.session.take()?
    };

    drop(session.timer.take());
    let elapsed = session.started.elapsed();
    if let Err(e) = session.sink.close() {
        log::error!(
            "recorder: failed to finalize {}: {}",
            session.path.display(),
            e
        );
    }
    log::info!(
        "recorder: stopped {} after {:.1}s ({} frames, {} planned {:.0}s)",
        session.path.display(),
        elapsed.as_secs_f64(),
        session.frames_written,
        session.codec,
        session.duration.as_secs_f64()
    );
    Some(elapsed)
}

/// Default recording name: `motion_<YYYYMMDD>_<HHMMSS>.<ext>`.
pub fn recording_file_name(now: DateTime<Local>, codec: FourCc) -> String {
    format!(
        "motion_{}.{}",
        now.format("%Y%m%d_%H%M%S"),
        codec.extension()
    )
}

/// `dir/name`, or `dir/<stem>_<n>.<ext>` with the smallest free `n` when
/// that file already exists.
pub fn unique_path(dir: &Path, name: &str) -> PathBuf {
    let candidate = dir.join(name);
    if !candidate.exists() {
        return candidate;
    }
    let stem = Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string());
    let ext = Path::new(name)
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    (1..)
        .map(|n| dir.join(format!("{}_{}{}", stem, n, ext)))
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_recording_file_name() {
        let now = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(
            recording_file_name(now, FourCc::MP4V),
            "motion_20240309_070501.mp4"
        );
        assert_eq!(
            recording_file_name(now, FourCc::MJPG),
            "motion_20240309_070501.avi"
        );
    }

    #[test]
    fn test_unique_path_appends_suffix() {
        let dir = std::env::temp_dir().join(format!("sentinel-unique-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();

        assert_eq!(unique_path(&dir, "clip.mp4"), dir.join("clip.mp4"));
        std::fs::write(dir.join("clip.mp4"), b"x").unwrap();
        assert_eq!(unique_path(&dir, "clip.mp4"), dir.join("clip_1.mp4"));
        std::fs::write(dir.join("clip_1.mp4"), b"x").unwrap();
        assert_eq!(unique_path(&dir, "clip.mp4"), dir.join("clip_2.mp4"));

        std::fs::remove_dir_all(&dir).ok();
    }
}
