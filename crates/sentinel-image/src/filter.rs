use crate::GrayImage;

// mirror an out-of-range index back into [0, n) without repeating the edge sample
fn reflect101(mut i: isize, n: usize) -> usize {
    let n = n as isize;
    if n == 1 {
        return 0;
    }
    loop {
        if i < 0 {
            i = -i;
        } else if i >= n {
            i = 2 * n - 2 - i;
        } else {
            return i as usize;
        }
    }
}

/// Normalized 1-D gaussian weights for an odd kernel size.
/// Sigma follows the usual derivation from the kernel size:
/// `0.3 * ((ksize - 1) * 0.5 - 1) + 0.8`.
pub fn gaussian_kernel(ksize: usize) -> Vec<f32> {
    let sigma = 0.3 * ((ksize as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let radius = (ksize / 2) as isize;
    let weights: Vec<f32> = (-radius..=radius)
        .map(|i| (-((i * i) as f32) / (2.0 * sigma * sigma)).exp())
        .collect();
    let sum: f32 = weights.iter().sum();
    weights.into_iter().map(|w| w / sum).collect()
}

/// Separable gaussian blur. Even kernel sizes are bumped to the next odd
/// size; sizes of 0 or 1 return an unmodified copy.
pub fn gaussian_blur(image: &GrayImage, ksize: usize) -> GrayImage {
    let ksize = if ksize % 2 == 0 { ksize + 1 } else { ksize };
    if ksize <= 1 || image.size.is_empty() {
        return image.clone();
    }
    let kernel = gaussian_kernel(ksize);
    let radius = (ksize / 2) as isize;
    let (width, height) = (image.size.x, image.size.y);

    // horizontal pass
    let mut horizontal = vec![0f32; width * height];
    for y in 0..height {
        let row = &image.data[y * width..(y + 1) * width];
        for x in 0..width {
            let mut acc = 0.0;
            for (k, w) in kernel.iter().enumerate() {
                let sx = reflect101(x as isize + k as isize - radius, width);
                acc += w * row[sx] as f32;
            }
            horizontal[y * width + x] = acc;
        }
    }

    // vertical pass
    let mut data = vec![0u8; width * height];
    for y in 0..height {
        for x in 0..width {
            let mut acc = 0.0;
            for (k, w) in kernel.iter().enumerate() {
                let sy = reflect101(y as isize + k as isize - radius, height);
                acc += w * horizontal[sy * width + x];
            }
            data[y * width + x] = acc.round().clamp(0.0, 255.0) as u8;
        }
    }

    GrayImage {
        size: image.size,
        data,
    }
}

/// Binary mask of pixels where `|background - current| > threshold` (255),
/// all others 0. `background` must hold one sample per pixel of `current`.
pub fn abs_diff_threshold(background: &[f32], current: &GrayImage, threshold: f32) -> GrayImage {
    debug_assert_eq!(background.len(), current.data.len());
    let data = background
        .iter()
        .zip(&current.data)
        .map(|(&b, &c)| if (b - c as f32).abs() > threshold { 255 } else { 0 })
        .collect();
    GrayImage {
        size: current.size,
        data,
    }
}

/// Dilation with a 3x3 square structuring element, applied `iterations`
/// times. Samples outside the image do not contribute.
pub fn dilate(mask: &GrayImage, iterations: usize) -> GrayImage {
    let (width, height) = (mask.size.x, mask.size.y);
    let mut current = mask.data.clone();
    let mut scratch = vec![0u8; current.len()];
    for _ in 0..iterations {
        for y in 0..height {
            for x in 0..width {
                let lo = x.saturating_sub(1);
                let hi = (x + 1).min(width - 1);
                scratch[y * width + x] = current[y * width + lo..=y * width + hi]
                    .iter()
                    .copied()
                    .max()
                    .unwrap_or(0);
            }
        }
        for y in 0..height {
            let lo = y.saturating_sub(1);
            let hi = (y + 1).min(height - 1);
            for x in 0..width {
                current[y * width + x] = (lo..=hi)
                    .map(|sy| scratch[sy * width + x])
                    .max()
                    .unwrap_or(0);
            }
        }
    }
    GrayImage {
        size: mask.size,
        data: current,
    }
}
