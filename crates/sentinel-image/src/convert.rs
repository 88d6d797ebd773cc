use {
    crate::{Frame, GrayImage, ImageError, PixelFormat},
    sentinel_base::Vec2,
};

// BT.601 YUV-to-RGB conversion for a single pixel (fixed-point, shift 8)
fn yuv_to_rgb(y: u8, u: u8, v: u8) -> [u8; 3] {
    let y = y as i32;
    let u = u as i32 - 128;
    let v = v as i32 - 128;
    let r = (y + ((359 * v) >> 8)).clamp(0, 255) as u8;
    let g = (y - ((88 * u + 183 * v) >> 8)).clamp(0, 255) as u8;
    let b = (y + ((454 * u) >> 8)).clamp(0, 255) as u8;
    [r, g, b]
}

/// Converts packed YUYV 4:2:2 (`[Y0, U, Y1, V, ...]`) into an RGB frame.
pub fn yuyv_to_rgb(size: Vec2<usize>, data: &[u8]) -> Result<Frame, ImageError> {
    let expected = size.product() * 2;
    if data.len() < expected {
        return Err(ImageError::Size {
            expected,
            got: data.len(),
        });
    }
    let mut rgb = Vec::with_capacity(size.product() * 3);
    for chunk in data[..expected].chunks_exact(4) {
        rgb.extend_from_slice(&yuv_to_rgb(chunk[0], chunk[1], chunk[3]));
        rgb.extend_from_slice(&yuv_to_rgb(chunk[2], chunk[1], chunk[3]));
    }
    Frame::new(size, PixelFormat::Rgb8, rgb)
}

/// Decodes a JPEG (e.g. one MJPEG camera frame) into an RGB frame.
pub fn decode_jpeg(data: &[u8]) -> Result<Frame, ImageError> {
    let decoded = crates_image::load_from_memory_with_format(data, crates_image::ImageFormat::Jpeg)?;
    let rgb = decoded.to_rgb8();
    let (width, height) = rgb.dimensions();
    Frame::new(
        Vec2::new(width as usize, height as usize),
        PixelFormat::Rgb8,
        rgb.into_raw(),
    )
}

/// BT.601 luma: Y = 0.299 R + 0.587 G + 0.114 B, rounded.
pub fn rgb_to_gray(frame: &Frame) -> GrayImage {
    let data = match frame.format {
        PixelFormat::Gray8 => frame.data.clone(),
        PixelFormat::Rgb8 => frame
            .data
            .chunks_exact(3)
            .map(|p| {
                let y = 299 * p[0] as u32 + 587 * p[1] as u32 + 114 * p[2] as u32;
                ((y + 500) / 1000) as u8
            })
            .collect(),
    };
    GrayImage {
        size: frame.size,
        data,
    }
}
