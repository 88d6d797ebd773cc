//! External contour extraction for binary masks.
//!
//! Foreground is 8-connected and background 4-connected. A region is
//! external when it touches the background that surrounds the image (or the
//! image edge); regions sitting inside holes of other regions are skipped.
//! Each external region's outer boundary is traced clockwise through pixel
//! centers, so a filled `w x h` block encloses `(w - 1) * (h - 1)`.

use {
    crate::GrayImage,
    sentinel_base::{Rect, Vec2},
};

// clockwise with y pointing down, starting east
const DIRS: [(isize, isize); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

const WEST: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    /// Boundary pixels in tracing order, without repeating the first point.
    pub points: Vec<Vec2<usize>>,
    /// Polygon area enclosed by `points`.
    pub area: f64,
    /// Bounding box of the region, right/bottom exclusive.
    pub bounding: Rect<usize>,
}

struct Mask<'a> {
    data: &'a [u8],
    width: isize,
    height: isize,
}

impl Mask<'_> {
    #[inline]
    fn is_set(&self, x: isize, y: isize) -> bool {
        x >= 0
            && y >= 0
            && x < self.width
            && y < self.height
            && self.data[(y * self.width + x) as usize] != 0
    }
}

/// Finds the outer contours of all external regions of `mask`, in raster
/// order of their top-left-most pixel.
pub fn find_external_contours(mask: &GrayImage) -> Vec<Contour> {
    let (width, height) = (mask.size.x, mask.size.y);
    if width == 0 || height == 0 {
        return Vec::new();
    }
    let outside = outside_background(mask);
    let view = Mask {
        data: &mask.data,
        width: width as isize,
        height: height as isize,
    };

    let mut labeled = vec![false; width * height];
    let mut contours = Vec::new();
    let mut stack = Vec::new();

    for y in 0..height {
        for x in 0..width {
            let index = y * width + x;
            if mask.data[index] == 0 || labeled[index] {
                continue;
            }

            // flood the 8-connected region, tracking its extent
            let mut min = Vec2::new(x, y);
            let mut max = Vec2::new(x, y);
            let mut pixels = 0usize;
            let mut external = false;
            labeled[index] = true;
            stack.push((x, y));
            while let Some((px, py)) = stack.pop() {
                pixels += 1;
                min.x = min.x.min(px);
                min.y = min.y.min(py);
                max.x = max.x.max(px);
                max.y = max.y.max(py);
                if !external {
                    external = px == 0
                        || py == 0
                        || px == width - 1
                        || py == height - 1
                        || touches(&outside, width, px, py);
                }
                for (dx, dy) in DIRS {
                    let (nx, ny) = (px as isize + dx, py as isize + dy);
                    if view.is_set(nx, ny) {
                        let n = ny as usize * width + nx as usize;
                        if !labeled[n] {
                            labeled[n] = true;
                            stack.push((nx as usize, ny as usize));
                        }
                    }
                }
            }

            if !external {
                continue;
            }
            let points = trace_boundary(&view, Vec2::new(x, y), pixels);
            contours.push(Contour {
                area: polygon_area(&points),
                points,
                bounding: Rect::from_min_max(min, max + Vec2::new(1, 1)),
            });
        }
    }
    contours
}

// 4-neighbour of (x, y) that belongs to the surrounding background
fn touches(outside: &[bool], width: usize, x: usize, y: usize) -> bool {
    let height = outside.len() / width;
    (x > 0 && outside[y * width + x - 1])
        || (x + 1 < width && outside[y * width + x + 1])
        || (y > 0 && outside[(y - 1) * width + x])
        || (y + 1 < height && outside[(y + 1) * width + x])
}

// background pixels 4-connected to the image edge
fn outside_background(mask: &GrayImage) -> Vec<bool> {
    let (width, height) = (mask.size.x, mask.size.y);
    let mut outside = vec![false; width * height];
    let mut stack = Vec::new();
    let seed = |x: usize, y: usize, outside: &mut Vec<bool>, stack: &mut Vec<(usize, usize)>| {
        let i = y * width + x;
        if mask.data[i] == 0 && !outside[i] {
            outside[i] = true;
            stack.push((x, y));
        }
    };
    for x in 0..width {
        seed(x, 0, &mut outside, &mut stack);
        seed(x, height - 1, &mut outside, &mut stack);
    }
    for y in 0..height {
        seed(0, y, &mut outside, &mut stack);
        seed(width - 1, y, &mut outside, &mut stack);
    }
    while let Some((x, y)) = stack.pop() {
        if x > 0 {
            seed(x - 1, y, &mut outside, &mut stack);
        }
        if x + 1 < width {
            seed(x + 1, y, &mut outside, &mut stack);
        }
        if y > 0 {
            seed(x, y - 1, &mut outside, &mut stack);
        }
        if y + 1 < height {
            seed(x, y + 1, &mut outside, &mut stack);
        }
    }
    outside
}

// Moore-neighbour tracing; stops when the first move out of `start` repeats.
// `start` must be the region's first pixel in raster order, so its west
// neighbour is background.
fn trace_boundary(mask: &Mask, start: Vec2<usize>, pixels: usize) -> Vec<Vec2<usize>> {
    let start = (start.x as isize, start.y as isize);
    let mut points = vec![Vec2::new(start.0 as usize, start.1 as usize)];
    let mut p = start;
    let mut back = WEST;
    let mut first_move = None;

    for _ in 0..pixels * 8 + 16 {
        let mut next = None;
        for i in 1..=8 {
            let d = (back + i) % 8;
            let c = (p.0 + DIRS[d].0, p.1 + DIRS[d].1);
            if mask.is_set(c.0, c.1) {
                next = Some((c, (back + i - 1) % 8));
                break;
            }
        }
        // isolated pixel
        let Some((c, prev)) = next else {
            break;
        };

        if p == start {
            match first_move {
                None => first_move = Some(c),
                Some(first) if first == c => break,
                Some(_) => {}
            }
        }

        // the last background cell examined becomes the backtrack for `c`
        let b = (p.0 + DIRS[prev].0 - c.0, p.1 + DIRS[prev].1 - c.1);
        back = DIRS.iter().position(|&d| d == b).unwrap_or(WEST);
        p = c;
        points.push(Vec2::new(c.0 as usize, c.1 as usize));
    }

    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    points
}

fn polygon_area(points: &[Vec2<usize>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: f64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x as f64 * b.y as f64 - b.x as f64 * a.y as f64)
        .sum();
    twice.abs() / 2.0
}
