//! RGBA8 frame-buffer primitives. All writes are clipped to the frame.

use crate::projection::ScreenRect;

/// Frame buffer being drawn this frame.
pub(crate) struct Canvas<'a> {
    pub(crate) frame: &'a mut [u8],
    pub(crate) width: u32,
    pub(crate) height: u32,
}

impl<'a> Canvas<'a> {
    pub(crate) fn new(frame: &'a mut [u8], width: u32, height: u32) -> Self {
        Self {
            frame,
            width,
            height,
        }
    }

    pub(crate) fn clear(&mut self, color: [u8; 4]) {
        for pixel in self.frame.chunks_exact_mut(4) {
            pixel.copy_from_slice(&color);
        }
    }

    pub(crate) fn put(&mut self, x: i32, y: i32, color: [u8; 4]) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let Some(pixel) = self.frame.get_mut(offset..offset + 4) else {
            return;
        };
        if color[3] == u8::MAX {
            pixel.copy_from_slice(&color);
        } else {
            blend_into(pixel, color);
        }
    }

    pub(crate) fn fill_rect(&mut self, x: i32, y: i32, rect_width: i32, rect_height: i32, color: [u8; 4]) {
        let start_x = x.max(0);
        let start_y = y.max(0);
        let end_x = x.saturating_add(rect_width).min(self.width as i32);
        let end_y = y.saturating_add(rect_height).min(self.height as i32);
        for py in start_y..end_y {
            for px in start_x..end_x {
                self.put(px, py, color);
            }
        }
    }

    pub(crate) fn outline_rect(&mut self, x: i32, y: i32, rect_width: i32, rect_height: i32, color: [u8; 4]) {
        if rect_width <= 1 || rect_height <= 1 {
            return;
        }
        self.fill_rect(x, y, rect_width, 1, color);
        self.fill_rect(x, y + rect_height - 1, rect_width, 1, color);
        self.fill_rect(x, y, 1, rect_height, color);
        self.fill_rect(x + rect_width - 1, y, 1, rect_height, color);
    }

    pub(crate) fn fill_screen_rect(&mut self, rect: ScreenRect, color: [u8; 4]) {
        self.fill_rect(
            rect.x.round() as i32,
            rect.y.round() as i32,
            rect.width.round() as i32,
            rect.height.round() as i32,
            color,
        );
    }

    pub(crate) fn outline_screen_rect(&mut self, rect: ScreenRect, color: [u8; 4]) {
        self.outline_rect(
            rect.x.round() as i32,
            rect.y.round() as i32,
            rect.width.round() as i32,
            rect.height.round() as i32,
            color,
        );
    }

    pub(crate) fn fill_circle(&mut self, cx: i32, cy: i32, radius: i32, color: [u8; 4]) {
        let radius_sq = radius * radius;
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx * dx + dy * dy <= radius_sq {
                    self.put(cx + dx, cy + dy, color);
                }
            }
        }
    }

    pub(crate) fn ring(&mut self, cx: i32, cy: i32, radius: i32, thickness: i32, color: [u8; 4]) {
        let outer_sq = radius * radius;
        let inner = (radius - thickness).max(0);
        let inner_sq = inner * inner;
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let dist_sq = dx * dx + dy * dy;
                if dist_sq <= outer_sq && dist_sq > inner_sq {
                    self.put(cx + dx, cy + dy, color);
                }
            }
        }
    }

    /// Map pin: a disc with a point below it, tip at `(tip_x, tip_y)`.
    pub(crate) fn pin(&mut self, tip_x: i32, tip_y: i32, size: i32, fill: [u8; 4], border: [u8; 4]) {
        let radius = (size / 2 - 1).max(2);
        let cy = tip_y - size + radius + 1;
        self.fill_circle(tip_x, cy, radius + 1, border);
        self.fill_circle(tip_x, cy, radius, fill);
        let stem_top = cy + radius / 2;
        for y in stem_top..=tip_y {
            let half = ((tip_y - y) * radius / (tip_y - stem_top).max(1)).max(0);
            for x in (tip_x - half)..=(tip_x + half) {
                self.put(x, y, fill);
            }
            self.put(tip_x - half - 1, y, border);
            self.put(tip_x + half + 1, y, border);
        }
        self.fill_circle(tip_x, cy, (radius / 3).max(1), [255, 255, 255, 255]);
    }

    /// Copies an RGBA image at `scale`, nearest-neighbor, with its top-left at
    /// `(left, top)`.
    pub(crate) fn blit_scaled(
        &mut self,
        left: i32,
        top: i32,
        image: ImageView<'_>,
        scale: f32,
    ) {
        if image.width == 0 || image.height == 0 || !(scale.is_finite() && scale > 0.0) {
            return;
        }
        if image.rgba.len() < image.width as usize * image.height as usize * 4 {
            return;
        }
        let scaled_w = (image.width as f32 * scale).round().max(1.0) as i32;
        let scaled_h = (image.height as f32 * scale).round().max(1.0) as i32;
        let draw_left = left.max(0);
        let draw_top = top.max(0);
        let draw_right = (left + scaled_w).min(self.width as i32);
        let draw_bottom = (top + scaled_h).min(self.height as i32);
        let inv_scale = scale.recip();

        for out_y in draw_top..draw_bottom {
            let src_y = (((out_y - top) as f32 * inv_scale) as u32).min(image.height - 1) as usize;
            for out_x in draw_left..draw_right {
                let src_x = (((out_x - left) as f32 * inv_scale) as u32).min(image.width - 1) as usize;
                let src = (src_y * image.width as usize + src_x) * 4;
                let color = [
                    image.rgba[src],
                    image.rgba[src + 1],
                    image.rgba[src + 2],
                    image.rgba[src + 3],
                ];
                if color[3] == 0 {
                    continue;
                }
                self.put(out_x, out_y, color);
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ImageView<'a> {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) rgba: &'a [u8],
}

fn blend_into(pixel: &mut [u8], color: [u8; 4]) {
    let alpha = color[3] as u32;
    let inverse = 255 - alpha;
    for channel in 0..3 {
        pixel[channel] = ((color[channel] as u32 * alpha + pixel[channel] as u32 * inverse) / 255) as u8;
    }
    pixel[3] = 255;
}
