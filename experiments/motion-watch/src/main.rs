use motion_watch::{Stats, Trigger, format_duration};
use sentinel_base::log;
use sentinel_camera::{CameraConfig, FrameSource};
use sentinel_motion::{MotionConfig, MotionDetector};
use sentinel_record::{FourCc, Recorder, RecorderConfig};
use std::time::{Duration, Instant};

// motion is ignored for this long after a trigger
const COOLDOWN: Duration = Duration::from_secs(5);

const STATUS_INTERVAL: Duration = Duration::from_secs(30);

#[cfg(feature = "v4l2")]
fn open_source(config: CameraConfig) -> FrameSource {
    log::info!("Using V4L2 camera {}", config.device_index());
    FrameSource::new(sentinel_camera::V4l2::new(), config)
}

#[cfg(not(feature = "v4l2"))]
fn open_source(config: CameraConfig) -> FrameSource {
    log::info!("Using the built-in test pattern (build with --features v4l2 for a camera)");
    FrameSource::new(sentinel_camera::TestPattern::new(), config)
}

fn log_status(stats: &Stats, recorder: &Recorder) {
    for line in stats.report(Instant::now()).lines() {
        log::info!("{}", line);
    }
    match recorder.storage().snapshot() {
        Ok(snapshot) => log::info!("storage: {}", snapshot),
        Err(e) => log::warn!("storage: {}", e),
    }
    if let (Some(path), Some(started)) = (recorder.current_path(), recorder.started_at()) {
        log::info!(
            "recording {} since {}",
            path.display(),
            started.format("%H:%M:%S")
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse CLI arguments
    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        eprintln!("Usage: {} [recordings-dir] [logs-dir] [codec]", args[0]);
        std::process::exit(1);
    }
    let mut recorder_config = RecorderConfig::default();
    if let Some(dir) = args.get(1) {
        recorder_config = recorder_config.with_recordings_dir(dir);
    }
    if let Some(dir) = args.get(2) {
        recorder_config = recorder_config.with_logs_dir(dir);
    }
    if let Some(codec) = args.get(3) {
        recorder_config = recorder_config.with_codec(codec.parse::<FourCc>()?);
    }

    sentinel_base::init_tee_logger(recorder_config.logs_dir())?;

    log::info!("Starting motion watch");
    log::info!("Max storage: {:.1}GB", recorder_config.max_storage_gb());
    log::info!(
        "Recording duration: {}s per clip",
        recorder_config.duration().as_secs()
    );

    // Start camera
    let mut source = open_source(CameraConfig::default());
    if let Err(e) = source.start() {
        sentinel_base::log_fatal!("Failed to start camera: {}", e);
    }
    let camera = source.config().clone();

    // Record at whatever the camera negotiated
    let recorder = Recorder::new(
        recorder_config
            .with_size(camera.size())
            .with_fps(camera.fps()),
    );
    recorder.storage().ensure_dir()?;

    let mut detector = MotionDetector::new(MotionConfig::default());
    let mut trigger = Trigger::new(COOLDOWN);
    let mut stats = Stats::new(Instant::now());

    let mut ticker = tokio::time::interval(Duration::from_secs(1) / camera.fps().max(1));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut status = tokio::time::interval_at(
        tokio::time::Instant::now() + STATUS_INTERVAL,
        STATUS_INTERVAL,
    );
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    log::info!("System started, press Ctrl+C to stop");
    let mut last_seen = 0;
    loop {
        tokio::select! {
            result = &mut ctrl_c => {
                if let Err(e) = result {
                    log::error!("Failed to listen for Ctrl+C: {}", e);
                }
                log::info!("Shutting down");
                break;
            }
            _ = status.tick() => log_status(&stats, &recorder),
            _ = ticker.tick() => {
                // only process frames we have not seen yet
                let count = source.frame_count();
                if count == last_seen {
                    continue;
                }
                last_seen = count;
                let Some(frame) = source.get_latest_frame() else {
                    continue;
                };

                let detection = tokio::task::block_in_place(|| detector.detect(&frame));
                let now = Instant::now();
                if trigger.update(detection.motion, now) {
                    stats.record_motion(now);
                    log::warn!("Motion detected, event #{}", stats.motion_events);
                    match tokio::task::block_in_place(|| recorder.start_recording(None)) {
                        Ok(true) => stats.recordings += 1,
                        Ok(false) => log::debug!("Already recording"),
                        Err(e) => log::error!("Failed to start recording: {}", e),
                    }
                }

                if recorder.is_recording() {
                    let output = detection.annotated.as_ref().unwrap_or(&frame);
                    if let Err(e) = tokio::task::block_in_place(|| recorder.write_frame(output)) {
                        log::error!("Failed to write frame: {}", e);
                    }
                }
            }
        }
    }

    recorder.stop_recording();
    source.stop();

    log::info!("Final statistics");
    log::info!(
        "Total uptime: {}",
        format_duration(stats.started.elapsed())
    );
    log::info!("Total motion events: {}", stats.motion_events);
    log::info!("Total recordings: {}", stats.recordings);
    match recorder.storage().snapshot() {
        Ok(snapshot) => log::info!("storage: {}", snapshot),
        Err(e) => log::warn!("storage: {}", e),
    }
    log::info!("System stopped");
    Ok(())
}
