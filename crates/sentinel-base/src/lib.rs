pub mod logging;
pub mod rect;
pub mod vec2;

pub use logging::{
    FileLogger, StdoutLogger, TeeLogger, init_file_logger, init_stdout_logger, init_tee_logger,
};
pub use rect::Rect;
pub use vec2::Vec2;

// Re-export log crate so downstream crates can use sentinel_base::log::*
pub use log;
