//! Frame buffers and the pixel operations the motion pipeline runs on them.
//!
//! Frames are packed row-major, top row first, with interleaved channels.

pub mod contour;
pub mod convert;
pub mod draw;
pub mod error;
pub mod filter;
pub mod frame;
pub mod jpeg;

pub use contour::{Contour, find_external_contours};
pub use convert::{decode_jpeg, rgb_to_gray, yuyv_to_rgb};
pub use draw::draw_rect;
pub use error::ImageError;
pub use filter::{abs_diff_threshold, dilate, gaussian_blur};
pub use frame::{Frame, GrayImage, PixelFormat};
pub use jpeg::encode_jpeg;
