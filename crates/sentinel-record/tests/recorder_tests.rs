use sentinel_base::Vec2;
use sentinel_image::{Frame, PixelFormat};
use sentinel_record::{
    FourCc, RecordError, Recorder, RecorderConfig, SinkFactory, VideoSink,
};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant, SystemTime};

fn test_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "sentinel-recorder-test-{}-{}",
        std::process::id(),
        name
    ));
    let _ = fs::remove_dir_all(&dir);
    dir
}

fn mjpeg_config(dir: &Path) -> RecorderConfig {
    RecorderConfig::default()
        .with_recordings_dir(dir)
        .with_codec(FourCc::MJPG)
        .with_size(Vec2::new(64, 48))
        .with_fps(10)
        .with_duration(Duration::from_secs(60))
}

fn make_file(dir: &Path, name: &str, len: usize, age_secs: u64) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, vec![0u8; len]).unwrap();
    let file = File::options().write(true).open(&path).unwrap();
    file.set_modified(SystemTime::now() - Duration::from_secs(age_secs))
        .unwrap();
    path
}

#[derive(Default)]
struct SinkLog {
    opened: Vec<PathBuf>,
    frames: Vec<(Vec2<usize>, PixelFormat)>,
    closed: usize,
}

/// Records what the recorder does without touching the filesystem.
struct MemorySink {
    log: Arc<Mutex<SinkLog>>,
    fail_writes: bool,
}

impl VideoSink for MemorySink {
    fn write(&mut self, frame: &Frame) -> Result<(), RecordError> {
        if self.fail_writes {
            return Err(RecordError::Write("disk full".to_string()));
        }
        self.log.lock().unwrap().frames.push((frame.size, frame.format));
        Ok(())
    }

    fn close(&mut self) -> Result<(), RecordError> {
        self.log.lock().unwrap().closed += 1;
        Ok(())
    }
}

struct MemoryFactory {
    log: Arc<Mutex<SinkLog>>,
    fail_open: bool,
    fail_writes: bool,
}

impl MemoryFactory {
    fn new() -> (Self, Arc<Mutex<SinkLog>>) {
        let log = Arc::new(Mutex::new(SinkLog::default()));
        (
            Self {
                log: Arc::clone(&log),
                fail_open: false,
                fail_writes: false,
            },
            log,
        )
    }
}

impl SinkFactory for MemoryFactory {
    fn open(
        &self,
        path: &Path,
        _codec: FourCc,
        _fps: u32,
        _size: Vec2<usize>,
    ) -> Result<Box<dyn VideoSink>, RecordError> {
        if self.fail_open {
            return Err(RecordError::WriterInit("codec unavailable".to_string()));
        }
        self.log.lock().unwrap().opened.push(path.to_path_buf());
        Ok(Box::new(MemorySink {
            log: Arc::clone(&self.log),
            fail_writes: self.fail_writes,
        }))
    }
}

fn wait_until<F: Fn() -> bool>(timeout: Duration, condition: F) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    condition()
}

#[test]
fn test_second_start_is_rejected() {
    let dir = test_dir("double");
    let (factory, log) = MemoryFactory::new();
    let recorder = Recorder::with_sink_factory(mjpeg_config(&dir), factory);

    assert!(recorder.start_recording(None).unwrap());
    let first = recorder.current_path().unwrap();
    let started = recorder.started_at().unwrap();
    assert!(!recorder.start_recording(None).unwrap());
    assert_eq!(recorder.started_at(), Some(started));
    assert!(!recorder.start_recording(Some("other.avi")).unwrap());
    assert_eq!(recorder.current_path().unwrap(), first);
    assert_eq!(log.lock().unwrap().opened.len(), 1);

    recorder.stop_recording();
    assert!(recorder.started_at().is_none());
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_default_name_and_directory() {
    let dir = test_dir("naming");
    let (factory, _log) = MemoryFactory::new();
    let recorder = Recorder::with_sink_factory(mjpeg_config(&dir), factory);

    recorder.start_recording(None).unwrap();
    assert!(dir.is_dir());
    let path = recorder.current_path().unwrap();
    assert_eq!(path.parent().unwrap(), dir.as_path());
    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("motion_"));
    assert!(name.ends_with(".avi"));
    // motion_YYYYMMDD_HHMMSS.avi
    assert_eq!(name.len(), "motion_20240101_000000.avi".len());
    recorder.stop_recording();

    recorder.start_recording(Some("manual.avi")).unwrap();
    assert_eq!(recorder.current_path().unwrap(), dir.join("manual.avi"));
    recorder.stop_recording();
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_stop_finalizes_a_readable_file() {
    let dir = test_dir("finalize");
    let recorder = Recorder::new(mjpeg_config(&dir));

    assert!(recorder.start_recording(Some("clip.avi")).unwrap());
    assert!(recorder.is_recording());
    for shade in 0..5u8 {
        let frame = Frame::solid(Vec2::new(64, 48), [shade * 40, 10, 10]);
        assert!(recorder.write_frame(&frame).unwrap());
    }
    assert_eq!(recorder.frames_written(), Some(5));

    let duration = recorder.stop_recording().expect("a session was running");
    assert!(duration < Duration::from_secs(60));
    assert!(!recorder.is_recording());
    assert_eq!(recorder.frames_written(), None);

    let buf = fs::read(dir.join("clip.avi")).unwrap();
    assert_eq!(&buf[0..4], b"RIFF");
    assert_eq!(&buf[8..12], b"AVI ");
    assert_eq!(u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]) as usize, buf.len() - 8);
    assert_eq!(u32::from_le_bytes([buf[48], buf[49], buf[50], buf[51]]), 5);

    // second stop is a no-op
    assert_eq!(recorder.stop_recording(), None);
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_write_while_idle_does_nothing() {
    let dir = test_dir("idle");
    let (factory, log) = MemoryFactory::new();
    let recorder = Recorder::with_sink_factory(mjpeg_config(&dir), factory);

    let frame = Frame::solid(Vec2::new(64, 48), [1, 2, 3]);
    assert!(!recorder.write_frame(&frame).unwrap());
    assert!(log.lock().unwrap().frames.is_empty());
    assert!(!dir.exists());

    recorder.start_recording(None).unwrap();
    recorder.stop_recording();
    assert!(!recorder.write_frame(&frame).unwrap());
    assert!(log.lock().unwrap().frames.is_empty());
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_frames_converted_to_output_format() {
    let dir = test_dir("convert");
    let (factory, log) = MemoryFactory::new();
    let recorder = Recorder::with_sink_factory(mjpeg_config(&dir), factory);
    recorder.start_recording(None).unwrap();

    recorder
        .write_frame(&Frame::solid(Vec2::new(128, 96), [5, 5, 5]))
        .unwrap();
    recorder
        .write_frame(&Frame::blank(Vec2::new(64, 48), PixelFormat::Gray8))
        .unwrap();
    // empty frames are skipped
    assert!(!recorder
        .write_frame(&Frame::blank(Vec2::new(0, 0), PixelFormat::Rgb8))
        .unwrap());
    recorder.stop_recording();

    let log = log.lock().unwrap();
    assert_eq!(
        log.frames,
        vec![
            (Vec2::new(64, 48), PixelFormat::Rgb8),
            (Vec2::new(64, 48), PixelFormat::Rgb8)
        ]
    );
    assert_eq!(log.closed, 1);
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_writer_init_failure_stays_idle() {
    let dir = test_dir("init-fail");
    let (mut factory, _log) = MemoryFactory::new();
    factory.fail_open = true;
    let recorder = Recorder::with_sink_factory(mjpeg_config(&dir), factory);

    match recorder.start_recording(None) {
        Err(RecordError::WriterInit(msg)) => assert!(msg.contains("codec unavailable")),
        other => panic!("Expected WriterInit, got {:?}", other),
    }
    assert!(!recorder.is_recording());
    assert_eq!(recorder.stop_recording(), None);
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_unwritable_output_is_writer_init() {
    let dir = test_dir("init-fail-avi");
    let recorder = Recorder::new(mjpeg_config(&dir));
    match recorder.start_recording(Some("missing/sub/dir.avi")) {
        Err(RecordError::WriterInit(_)) => {}
        other => panic!("Expected WriterInit, got {:?}", other),
    }
    assert!(!recorder.is_recording());
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_write_failure_keeps_session_open() {
    let dir = test_dir("write-fail");
    let (mut factory, log) = MemoryFactory::new();
    factory.fail_writes = true;
    let recorder = Recorder::with_sink_factory(mjpeg_config(&dir), factory);
    recorder.start_recording(None).unwrap();

    let frame = Frame::solid(Vec2::new(64, 48), [1, 2, 3]);
    assert!(matches!(
        recorder.write_frame(&frame),
        Err(RecordError::Write(_))
    ));
    assert!(recorder.is_recording());
    assert_eq!(recorder.frames_written(), Some(0));

    recorder.stop_recording();
    assert_eq!(log.lock().unwrap().closed, 1);
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_full_storage_evicts_oldest_before_opening() {
    let dir = test_dir("evict");
    fs::create_dir_all(&dir).unwrap();
    let files: Vec<PathBuf> = (1..=5)
        .map(|i| make_file(&dir, &format!("f{}.avi", i), 100, 600 - i * 100))
        .collect();

    let (factory, log) = MemoryFactory::new();
    let config = mjpeg_config(&dir).with_max_storage_bytes(0);
    let recorder = Recorder::with_sink_factory(config, factory);

    assert!(recorder.start_recording(Some("new.avi")).unwrap());
    assert!(!files[0].exists());
    for file in &files[1..] {
        assert!(file.exists());
    }
    assert_eq!(log.lock().unwrap().opened, vec![dir.join("new.avi")]);
    recorder.stop_recording();
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_under_cap_keeps_everything() {
    let dir = test_dir("under-cap");
    fs::create_dir_all(&dir).unwrap();
    let old = make_file(&dir, "old.mp4", 100, 1000);

    let (factory, _log) = MemoryFactory::new();
    let config = mjpeg_config(&dir).with_max_storage_bytes(1000);
    let recorder = Recorder::with_sink_factory(config, factory);
    recorder.start_recording(None).unwrap();
    recorder.stop_recording();
    assert!(old.exists());
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_timer_stops_recording() {
    let dir = test_dir("timer");
    let (factory, log) = MemoryFactory::new();
    let config = mjpeg_config(&dir).with_duration(Duration::from_millis(200));
    let recorder = Recorder::with_sink_factory(config, factory);

    recorder.start_recording(None).unwrap();
    assert!(recorder.is_recording());
    assert!(wait_until(Duration::from_secs(3), || !recorder.is_recording()));
    assert!(wait_until(Duration::from_secs(1), || log.lock().unwrap().closed == 1));

    // explicit stop after the timer fired is a no-op
    assert_eq!(recorder.stop_recording(), None);
    assert_eq!(log.lock().unwrap().closed, 1);
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_cancelled_timer_does_not_stop_next_session() {
    let dir = test_dir("timer-race");
    let (factory, log) = MemoryFactory::new();
    let config = mjpeg_config(&dir).with_duration(Duration::from_millis(600));
    let recorder = Recorder::with_sink_factory(config, factory);

    recorder.start_recording(Some("first.avi")).unwrap();
    thread::sleep(Duration::from_millis(300));
    assert!(recorder.stop_recording().is_some());
    recorder.start_recording(Some("second.avi")).unwrap();

    // past the first session's deadline, before the second's
    thread::sleep(Duration::from_millis(400));
    assert_eq!(recorder.current_path(), Some(dir.join("second.avi")));

    assert!(wait_until(Duration::from_secs(3), || !recorder.is_recording()));
    assert!(wait_until(Duration::from_secs(1), || log.lock().unwrap().closed == 2));
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_concurrent_stops_tear_down_once() {
    let dir = test_dir("concurrent");
    let (factory, log) = MemoryFactory::new();
    let recorder = Arc::new(Recorder::with_sink_factory(mjpeg_config(&dir), factory));
    recorder.start_recording(None).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let recorder = Arc::clone(&recorder);
            thread::spawn(move || recorder.stop_recording())
        })
        .collect();
    let stopped = handles
        .into_iter()
        .filter_map(|h| h.join().unwrap())
        .count();
    assert_eq!(stopped, 1);
    assert_eq!(log.lock().unwrap().closed, 1);
    fs::remove_dir_all(&dir).ok();
}
