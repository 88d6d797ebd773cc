//! Frame acquisition for the sentinel pipeline.
//!
//! A `CaptureDevice` produces frames on demand; `FrameSource` drives one on
//! a dedicated thread and keeps only the most recent frame for readers.

pub mod config;
pub mod device;
pub mod error;
pub mod pattern;
pub mod source;

#[cfg(feature = "v4l2")]
pub mod v4l2;

pub use config::CameraConfig;
pub use device::CaptureDevice;
pub use error::CameraError;
pub use pattern::TestPattern;
pub use source::FrameSource;

#[cfg(feature = "v4l2")]
pub use v4l2::V4l2;
