/// Tuning for `MotionDetector`.
#[derive(Clone, Debug, PartialEq)]
pub struct MotionConfig {
    blur_size: usize,
    dilate_iterations: usize,
    motion_threshold: f64,
    diff_threshold: f32,
    learning_rate: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            blur_size: 21,
            dilate_iterations: 2,
            motion_threshold: 500.0,
            diff_threshold: 25.0,
            learning_rate: 0.05,
        }
    }
}

impl MotionConfig {
    /// Set the gaussian blur kernel size. Even sizes are rounded up to the
    /// next odd size.
    pub fn with_blur_size(mut self, blur_size: usize) -> Self {
        self.blur_size = blur_size;
        self
    }

    /// Set how many times the difference mask is dilated.
    pub fn with_dilate_iterations(mut self, iterations: usize) -> Self {
        self.dilate_iterations = iterations;
        self
    }

    /// Set the minimum contour area (in pixels) that counts as motion.
    pub fn with_motion_threshold(mut self, threshold: f64) -> Self {
        self.motion_threshold = threshold;
        self
    }

    /// Set the per-pixel intensity difference above which a pixel is
    /// considered changed.
    pub fn with_diff_threshold(mut self, threshold: f32) -> Self {
        self.diff_threshold = threshold;
        self
    }

    /// Set the weight of the current frame in the background update.
    pub fn with_learning_rate(mut self, rate: f32) -> Self {
        self.learning_rate = rate.clamp(0.0, 1.0);
        self
    }

    // Getters
    pub fn blur_size(&self) -> usize {
        if self.blur_size % 2 == 0 {
            self.blur_size + 1
        } else {
            self.blur_size
        }
    }

    pub fn dilate_iterations(&self) -> usize {
        self.dilate_iterations
    }

    pub fn motion_threshold(&self) -> f64 {
        self.motion_threshold
    }

    pub fn diff_threshold(&self) -> f32 {
        self.diff_threshold
    }

    pub fn learning_rate(&self) -> f32 {
        self.learning_rate
    }
}
