use {
    crate::MotionConfig,
    chrono::{DateTime, Local},
    sentinel_base::{Rect, Vec2},
    sentinel_image::{
        Frame, GrayImage, abs_diff_threshold, dilate, draw_rect, find_external_contours,
        gaussian_blur, rgb_to_gray,
    },
};

// color and thickness of the boxes drawn around moving regions
const BOX_COLOR: [u8; 3] = [0, 255, 0];
const BOX_THICKNESS: usize = 2;

/// A frame in which at least one region moved.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionEvent {
    pub timestamp: DateTime<Local>,
    /// Bounding boxes of the regions at or above the area threshold.
    pub regions: Vec<Rect<usize>>,
    /// Contour area of the largest moving region.
    pub largest_area: f64,
}

/// Result of `MotionDetector::detect`.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub motion: bool,
    /// The input frame, with boxes drawn around moving regions. `None` only
    /// for empty input.
    pub annotated: Option<Frame>,
    pub event: Option<MotionEvent>,
}

impl Detection {
    fn still(frame: Option<Frame>) -> Self {
        Self {
            motion: false,
            annotated: frame,
            event: None,
        }
    }
}

// exponential moving average of past blurred intensity frames
struct BackgroundModel {
    size: Vec2<usize>,
    data: Vec<f32>,
}

impl BackgroundModel {
    fn seed(image: &GrayImage) -> Self {
        Self {
            size: image.size,
            data: image.data.iter().map(|&v| v as f32).collect(),
        }
    }

    fn update(&mut self, image: &GrayImage, rate: f32) {
        let keep = 1.0 - rate;
        for (b, &c) in self.data.iter_mut().zip(&image.data) {
            *b = *b * keep + c as f32 * rate;
        }
    }
}

/// Adaptive background-subtraction detector.
///
/// Each call blurs the frame's intensity, compares it against the running
/// background, and reports the external regions whose contour area reaches
/// the configured threshold. The first frame (and any frame whose size
/// differs from the model) only seeds the background.
pub struct MotionDetector {
    config: MotionConfig,
    background: Option<BackgroundModel>,
    last_motion: Option<DateTime<Local>>,
}

impl MotionDetector {
    pub fn new(config: MotionConfig) -> Self {
        Self {
            config,
            background: None,
            last_motion: None,
        }
    }

    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    /// Run one detection step on `frame` and fold it into the background.
    ///
    /// Gray frames are promoted to RGB when boxes are drawn on them.
    pub fn detect(&mut self, frame: &Frame) -> Detection {
        if frame.is_empty() {
            return Detection::still(None);
        }

        let gray = gaussian_blur(&rgb_to_gray(frame), self.config.blur_size());

        if let Some(previous) = &self.background {
            if previous.size != gray.size {
                log::info!(
                    "motion: frame size changed from {} to {}, reseeding background",
                    previous.size,
                    gray.size
                );
                self.background = None;
            }
        }
        let Some(background) = self.background.as_mut() else {
            self.background = Some(BackgroundModel::seed(&gray));
            return Detection::still(Some(frame.clone()));
        };

        let mask = abs_diff_threshold(&background.data, &gray, self.config.diff_threshold());
        let mask = dilate(&mask, self.config.dilate_iterations());

        let mut regions = Vec::new();
        let mut largest_area = 0.0f64;
        for contour in find_external_contours(&mask) {
            if contour.area >= self.config.motion_threshold() {
                largest_area = largest_area.max(contour.area);
                regions.push(contour.bounding);
            }
        }

        background.update(&gray, self.config.learning_rate());

        if regions.is_empty() {
            return Detection::still(Some(frame.clone()));
        }

        let mut annotated = frame.to_rgb();
        for region in &regions {
            draw_rect(&mut annotated, *region, BOX_COLOR, BOX_THICKNESS);
        }
        let timestamp = Local::now();
        self.last_motion = Some(timestamp);
        log::debug!(
            "motion: {} region(s), largest area {:.0}",
            regions.len(),
            largest_area
        );

        Detection {
            motion: true,
            annotated: Some(annotated),
            event: Some(MotionEvent {
                timestamp,
                regions,
                largest_area,
            }),
        }
    }

    /// Drop the background model; the next frame seeds a new one.
    pub fn reset_background(&mut self) {
        self.background = None;
    }

    pub fn has_background(&self) -> bool {
        self.background.is_some()
    }

    /// Time of the most recent detection that reported motion.
    pub fn last_motion(&self) -> Option<DateTime<Local>> {
        self.last_motion
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_update_is_ema() {
        let mut model = BackgroundModel::seed(&GrayImage::blank(Vec2::new(2, 1)));
        let bright = GrayImage::new(Vec2::new(2, 1), vec![100, 200]).unwrap();
        model.update(&bright, 0.05);
        assert!((model.data[0] - 5.0).abs() < 1e-4);
        assert!((model.data[1] - 10.0).abs() < 1e-4);
        model.update(&bright, 0.05);
        assert!((model.data[0] - 9.75).abs() < 1e-4);
    }
}
