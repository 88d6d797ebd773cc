use {
    crate::{CameraConfig, CameraError, CaptureDevice},
    sentinel_base::Vec2,
    sentinel_image::Frame,
    std::{
        thread,
        time::{Duration, Instant},
    },
};

// length of one sweep cycle in seconds; the block is visible for the first half
const CYCLE_SECONDS: u32 = 10;

/// Synthetic camera: a static gradient with a bright block that sweeps
/// across the picture during the first half of every cycle. Paces itself
/// to the configured frame rate.
pub struct TestPattern {
    size: Vec2<usize>,
    fps: u32,
    frame_index: u64,
    background: Option<Frame>,
    next_deadline: Option<Instant>,
}

impl TestPattern {
    pub fn new() -> Self {
        Self {
            size: Vec2::zero(),
            fps: 0,
            frame_index: 0,
            background: None,
            next_deadline: None,
        }
    }

    fn render(&self, background: &Frame) -> Frame {
        let mut frame = background.clone();
        let cycle = (self.fps.max(1) * CYCLE_SECONDS) as u64;
        let half = cycle / 2;
        let phase = self.frame_index % cycle;
        if phase < half {
            let block = Vec2::new(self.size.x / 6, self.size.y / 4);
            let travel = self.size.x.saturating_sub(block.x);
            let x = (travel as u64 * phase / half.max(1)) as usize;
            let y = (self.size.y - block.y) / 2;
            frame.fill_rect(x, y, x + block.x, y + block.y, [230, 230, 230]);
        }
        frame
    }
}

impl Default for TestPattern {
    fn default() -> Self {
        Self::new()
    }
}

fn gradient(size: Vec2<usize>) -> Frame {
    let mut frame = Frame::solid(size, [0, 0, 0]);
    for y in 0..size.y {
        for x in 0..size.x {
            let v = (40 + x * 60 / size.x.max(1)) as u8;
            let i = (y * size.x + x) * 3;
            frame.data[i..i + 3].copy_from_slice(&[v, v, v / 2 + 30]);
        }
    }
    frame
}

impl CaptureDevice for TestPattern {
    fn open(&mut self, config: &CameraConfig) -> Result<CameraConfig, CameraError> {
        if config.size().is_empty() {
            return Err(CameraError::DeviceUnavailable(format!(
                "invalid test pattern size {}",
                config.size()
            )));
        }
        self.size = config.size();
        self.fps = config.fps().max(1);
        self.frame_index = 0;
        self.background = Some(gradient(self.size));
        self.next_deadline = None;
        Ok(config.clone().with_fps(self.fps))
    }

    fn close(&mut self) {
        self.background = None;
    }

    fn blocking_capture(&mut self) -> Result<Frame, CameraError> {
        let Some(background) = &self.background else {
            return Err(CameraError::ReadFailure("test pattern is not open".to_string()));
        };

        // pace to the frame rate
        let interval = Duration::from_secs(1) / self.fps;
        let now = Instant::now();
        let deadline = self.next_deadline.unwrap_or(now);
        if deadline > now {
            thread::sleep(deadline - now);
        }
        self.next_deadline = Some(deadline.max(now) + interval);

        let frame = self.render(background);
        self.frame_index += 1;
        Ok(frame)
    }
}
