//! Background-subtraction motion detection.

pub mod config;
pub mod detector;

pub use config::MotionConfig;
pub use detector::{Detection, MotionDetector, MotionEvent};
