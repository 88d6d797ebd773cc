//! Time-boxed recording of motion events into a storage-capped directory.
//!
//! `Recorder` owns at most one `RecordingSession` at a time and writes it
//! through a `VideoSink`. Before each session `StorageAccountant` checks the
//! recordings directory against the cap and evicts the oldest files.

pub mod avi;
pub mod codec;
pub mod config;
pub mod error;
#[cfg(feature = "ffmpeg")]
pub mod ffmpeg;
pub mod recorder;
pub mod sink;
pub mod storage;

pub use avi::{AviOutput, AviWriter};
pub use codec::FourCc;
pub use config::RecorderConfig;
pub use error::RecordError;
#[cfg(feature = "ffmpeg")]
pub use ffmpeg::FfmpegSink;
pub use recorder::{Recorder, recording_file_name, unique_path};
pub use sink::{DefaultSinkFactory, SinkFactory, VideoSink};
pub use storage::{EvictionReport, RecordingFile, StorageAccountant, StorageSnapshot};
