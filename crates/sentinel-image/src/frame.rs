use {
    crate::ImageError,
    crates_image::imageops::{self, FilterType},
    sentinel_base::Vec2,
    std::borrow::Cow,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Gray8,
    Rgb8,
}

impl PixelFormat {
    pub fn channels(&self) -> usize {
        match self {
            PixelFormat::Gray8 => 1,
            PixelFormat::Rgb8 => 3,
        }
    }
}

/// A captured picture. Cloning copies the pixel buffer, so a clone never
/// aliases the storage of the frame it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub size: Vec2<usize>,
    pub format: PixelFormat,
    pub data: Vec<u8>,
}

impl Frame {
    /// Wrap a packed buffer, checking that its length matches `size` and `format`.
    pub fn new(size: Vec2<usize>, format: PixelFormat, data: Vec<u8>) -> Result<Self, ImageError> {
        let expected = size.product() * format.channels();
        if data.len() != expected {
            return Err(ImageError::Size {
                expected,
                got: data.len(),
            });
        }
        Ok(Self { size, format, data })
    }

    /// All-zero (black) frame.
    pub fn blank(size: Vec2<usize>, format: PixelFormat) -> Self {
        Self {
            size,
            format,
            data: vec![0; size.product() * format.channels()],
        }
    }

    /// RGB frame filled with one color.
    pub fn solid(size: Vec2<usize>, color: [u8; 3]) -> Self {
        let data = color
            .iter()
            .copied()
            .cycle()
            .take(size.product() * 3)
            .collect();
        Self {
            size,
            format: PixelFormat::Rgb8,
            data,
        }
    }

    pub fn width(&self) -> usize {
        self.size.x
    }

    pub fn height(&self) -> usize {
        self.size.y
    }

    pub fn channels(&self) -> usize {
        self.format.channels()
    }

    /// True for zero-sized frames or frames without pixel data.
    pub fn is_empty(&self) -> bool {
        self.size.is_empty() || self.data.is_empty()
    }

    /// Channel values of the pixel at (x, y).
    pub fn pixel(&self, x: usize, y: usize) -> &[u8] {
        let channels = self.channels();
        let i = (y * self.size.x + x) * channels;
        &self.data[i..i + channels]
    }

    /// Fill the axis-aligned block `[x0, x1) x [y0, y1)` with `color`,
    /// clipped to the frame. Gray frames take the first channel of `color`.
    pub fn fill_rect(&mut self, x0: usize, y0: usize, x1: usize, y1: usize, color: [u8; 3]) {
        let channels = self.channels();
        let x1 = x1.min(self.size.x);
        let y1 = y1.min(self.size.y);
        for y in y0..y1 {
            for x in x0..x1 {
                let i = (y * self.size.x + x) * channels;
                self.data[i..i + channels].copy_from_slice(&color[..channels]);
            }
        }
    }

    /// Same picture as packed RGB.
    pub fn to_rgb(&self) -> Frame {
        match self.format {
            PixelFormat::Rgb8 => self.clone(),
            PixelFormat::Gray8 => Frame {
                size: self.size,
                format: PixelFormat::Rgb8,
                data: self.data.iter().flat_map(|&v| [v, v, v]).collect(),
            },
        }
    }

    /// Packed RGB at `size`, borrowing `self` when it already is one.
    pub fn rgb_at(&self, size: Vec2<usize>) -> Result<Cow<'_, Frame>, ImageError> {
        let rgb = match self.format {
            PixelFormat::Rgb8 => Cow::Borrowed(self),
            PixelFormat::Gray8 => Cow::Owned(self.to_rgb()),
        };
        if rgb.size == size {
            return Ok(rgb);
        }
        Ok(Cow::Owned(rgb.resized(size)?))
    }

    /// Bilinear resize to `size`. Returns a plain copy when the size already matches.
    pub fn resized(&self, size: Vec2<usize>) -> Result<Frame, ImageError> {
        if size == self.size {
            return Ok(self.clone());
        }
        let (w, h) = (self.size.x as u32, self.size.y as u32);
        let (nw, nh) = (size.x as u32, size.y as u32);
        let size_error = || ImageError::Size {
            expected: self.size.product() * self.channels(),
            got: self.data.len(),
        };
        let data = match self.format {
            PixelFormat::Rgb8 => {
                let buffer: crates_image::ImageBuffer<crates_image::Rgb<u8>, &[u8]> =
                    crates_image::ImageBuffer::from_raw(w, h, self.data.as_slice())
                        .ok_or_else(size_error)?;
                imageops::resize(&buffer, nw, nh, FilterType::Triangle).into_raw()
            }
            PixelFormat::Gray8 => {
                let buffer: crates_image::ImageBuffer<crates_image::Luma<u8>, &[u8]> =
                    crates_image::ImageBuffer::from_raw(w, h, self.data.as_slice())
                        .ok_or_else(size_error)?;
                imageops::resize(&buffer, nw, nh, FilterType::Triangle).into_raw()
            }
        };
        Ok(Frame {
            size,
            format: self.format,
            data,
        })
    }
}

/// Single-channel 8-bit plane: intensity images and binary masks (0 / 255).
#[derive(Debug, Clone, PartialEq)]
pub struct GrayImage {
    pub size: Vec2<usize>,
    pub data: Vec<u8>,
}

impl GrayImage {
    pub fn new(size: Vec2<usize>, data: Vec<u8>) -> Result<Self, ImageError> {
        if data.len() != size.product() {
            return Err(ImageError::Size {
                expected: size.product(),
                got: data.len(),
            });
        }
        Ok(Self { size, data })
    }

    pub fn blank(size: Vec2<usize>) -> Self {
        Self {
            size,
            data: vec![0; size.product()],
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.size.x + x]
    }

    /// Number of non-zero samples.
    pub fn count_nonzero(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }
}
