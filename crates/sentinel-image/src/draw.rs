use {crate::Frame, sentinel_base::Rect};

/// Outlines `rect` on `frame` with a band `thickness` pixels wide, drawn
/// inward from the rectangle edges and clipped to the frame.
pub fn draw_rect(frame: &mut Frame, rect: Rect<usize>, color: [u8; 3], thickness: usize) {
    if rect.size.is_empty() || thickness == 0 {
        return;
    }
    let min = rect.min();
    let max = rect.max();
    let band_x = thickness.min(rect.size.x);
    let band_y = thickness.min(rect.size.y);

    // top, bottom
    frame.fill_rect(min.x, min.y, max.x, min.y + band_y, color);
    frame.fill_rect(min.x, max.y - band_y, max.x, max.y, color);
    // left, right
    frame.fill_rect(min.x, min.y, min.x + band_x, max.y, color);
    frame.fill_rect(max.x - band_x, min.y, max.x, max.y, color);
}
