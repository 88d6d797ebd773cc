use {
    crate::{Frame, ImageError, PixelFormat},
    crates_image::ImageEncoder,
};

/// Encodes a frame as a baseline JPEG. `quality` is 1-100.
pub fn encode_jpeg(frame: &Frame, quality: u8) -> Result<Vec<u8>, ImageError> {
    let color_type = match frame.format {
        PixelFormat::Rgb8 => crates_image::ExtendedColorType::Rgb8,
        PixelFormat::Gray8 => crates_image::ExtendedColorType::L8,
    };
    let mut buffer = Vec::new();
    let encoder = crates_image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality);
    encoder
        .write_image(
            &frame.data,
            frame.size.x as u32,
            frame.size.y as u32,
            color_type,
        )
        .map_err(|e| ImageError::Encode(e.to_string()))?;
    Ok(buffer)
}
