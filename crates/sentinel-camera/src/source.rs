use {
    crate::{CameraConfig, CameraError, CaptureDevice},
    sentinel_image::Frame,
    std::{
        sync::{
            Arc, Mutex,
            atomic::{AtomicBool, AtomicU64, Ordering},
            mpsc,
        },
        thread::{self, JoinHandle},
        time::Duration,
    },
};

// delay after a failed read, and between reconnect attempts
const READ_BACKOFF_MS: u64 = 100;

// consecutive read failures before the device is closed and reopened
const MAX_CONSECUTIVE_FAILURES: u32 = 30;

type LatestFrame = Arc<Mutex<Option<Frame>>>;

/// Runs a `CaptureDevice` on a background thread and keeps the most recent
/// frame in a shared slot.
///
/// The slot lock is held only to move a new frame in or to clone one out,
/// so readers never wait on the device.
pub struct FrameSource {
    config: CameraConfig,
    device: Option<Box<dyn CaptureDevice>>,
    latest: LatestFrame,
    frame_count: Arc<AtomicU64>,
    cancel: Arc<AtomicBool>,
    join_handle: Option<JoinHandle<Box<dyn CaptureDevice>>>,
}

impl FrameSource {
    pub fn new(device: impl CaptureDevice + 'static, config: CameraConfig) -> Self {
        Self {
            config,
            device: Some(Box::new(device)),
            latest: Arc::new(Mutex::new(None)),
            frame_count: Arc::new(AtomicU64::new(0)),
            cancel: Arc::new(AtomicBool::new(false)),
            join_handle: None,
        }
    }

    /// Open the device on a new acquisition thread and start capturing.
    ///
    /// Returns once the device has been opened. Calling this while already
    /// running does nothing.
    pub fn start(&mut self) -> Result<(), CameraError> {
        if self.join_handle.is_some() {
            return Ok(());
        }
        let mut device = self.device.take().ok_or_else(|| {
            CameraError::DeviceUnavailable("capture device was lost by a previous run".to_string())
        })?;

        self.cancel.store(false, Ordering::Relaxed);
        *self.latest.lock().unwrap_or_else(|e| e.into_inner()) = None;
        self.frame_count.store(0, Ordering::Relaxed);

        // the device is opened on the worker thread, the result comes back here
        let (init_tx, init_rx) = mpsc::channel::<Result<CameraConfig, CameraError>>();
        let config = self.config.clone();
        let latest = Arc::clone(&self.latest);
        let frame_count = Arc::clone(&self.frame_count);
        let cancel = Arc::clone(&self.cancel);

        let join_handle = thread::spawn(move || {
            let config = match device.open(&config) {
                Ok(config) => {
                    let _ = init_tx.send(Ok(config.clone()));
                    config
                }
                Err(e) => {
                    let _ = init_tx.send(Err(e));
                    return device;
                }
            };
            acquisition_loop(device.as_mut(), config, &latest, &frame_count, &cancel);
            device.close();
            device
        });

        match init_rx.recv() {
            Ok(Ok(config)) => {
                log::info!(
                    "frame source: started at {} @ {} fps",
                    config.size(),
                    config.fps()
                );
                self.config = config;
                self.join_handle = Some(join_handle);
                Ok(())
            }
            Ok(Err(e)) => {
                if let Ok(device) = join_handle.join() {
                    self.device = Some(device);
                }
                log::error!("frame source: cannot open device: {}", e);
                Err(match e {
                    CameraError::DeviceUnavailable(_) => e,
                    other => CameraError::DeviceUnavailable(other.to_string()),
                })
            }
            Err(_) => {
                let _ = join_handle.join();
                Err(CameraError::DeviceUnavailable(
                    "acquisition thread died during open".to_string(),
                ))
            }
        }
    }

    /// Copy of the most recent frame, or `None` before the first capture.
    pub fn get_latest_frame(&self) -> Option<Frame> {
        self.latest
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of frames captured since the last `start`.
    pub fn frame_count(&self) -> u64 {
        self.frame_count.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        self.join_handle.is_some()
    }

    /// The configuration the device accepted (the requested one before the
    /// first successful `start`).
    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    /// Stop the acquisition thread and release the device. Safe to call
    /// repeatedly.
    pub fn stop(&mut self) {
        let Some(join_handle) = self.join_handle.take() else {
            return;
        };
        self.cancel.store(true, Ordering::Relaxed);
        match join_handle.join() {
            Ok(device) => {
                self.device = Some(device);
                log::info!("frame source: stopped after {} frames", self.frame_count());
            }
            Err(_) => log::error!("frame source: acquisition thread panicked"),
        }
    }
}

impl Drop for FrameSource {
    fn drop(&mut self) {
        self.stop();
    }
}

fn acquisition_loop(
    device: &mut dyn CaptureDevice,
    mut config: CameraConfig,
    latest: &Mutex<Option<Frame>>,
    frame_count: &AtomicU64,
    cancel: &AtomicBool,
) {
    let backoff = Duration::from_millis(READ_BACKOFF_MS);
    let mut failures = 0u32;

    while !cancel.load(Ordering::Relaxed) {
        match device.blocking_capture() {
            Ok(frame) => {
                failures = 0;
                *latest.lock().unwrap_or_else(|e| e.into_inner()) = Some(frame);
                frame_count.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                failures += 1;
                log::warn!(
                    "frame source: read failed ({}/{}): {}",
                    failures,
                    MAX_CONSECUTIVE_FAILURES,
                    e
                );
                thread::sleep(backoff);
                if failures < MAX_CONSECUTIVE_FAILURES {
                    continue;
                }

                // close, wait, and reopen the device
                failures = 0;
                while !cancel.load(Ordering::Relaxed) {
                    log::info!("frame source: reconnecting...");
                    device.close();
                    thread::sleep(backoff);
                    match device.open(&config) {
                        Ok(new_config) => {
                            config = new_config;
                            break;
                        }
                        Err(e) => log::warn!("frame source: reopen failed: {}", e),
                    }
                }
            }
        }
    }
}
