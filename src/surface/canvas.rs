//! Software raster surface
//!
//! Owns the device framebuffer and keeps drawing in logical pixels: every
//! coordinate passed in is multiplied by the device scale factor after the
//! current translation is applied.

use image::{Rgba, RgbaImage};

use super::blend::{composite, BlendMode};
use super::color::{clamp_unit, Color};
use super::font;
use super::gradient::RadialGradient;
use crate::error::ConfigError;

/// Largest device buffer dimension accepted on either axis
pub const MAX_DEVICE_DIMENSION: u32 = 16384;

/// Pick the device scale factor from a raw display pixel ratio
pub fn device_scale(raw_ratio: f32) -> u32 {
    if raw_ratio >= 1.5 {
        2
    } else {
        1
    }
}

/// Per-call drawing state saved and restored as a unit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawState {
    pub translate: (f32, f32),
    pub blend: BlendMode,
    pub alpha: f32,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            translate: (0.0, 0.0),
            blend: BlendMode::SourceOver,
            alpha: 1.0,
        }
    }
}

/// RGBA raster surface addressed in logical pixels
pub struct Surface {
    pixels: RgbaImage,
    width: u32,
    height: u32,
    scale: u32,
    state: DrawState,
    stack: Vec<DrawState>,
    draw_calls: u64,
}

impl Surface {
    /// Create a surface of `width`x`height` logical pixels
    pub fn new(width: u32, height: u32, scale: u32) -> Result<Self, ConfigError> {
        let scale = scale.max(1);
        let width = width.max(1);
        let height = height.max(1);
        let (dw, dh) = (width.saturating_mul(scale), height.saturating_mul(scale));
        if dw > MAX_DEVICE_DIMENSION || dh > MAX_DEVICE_DIMENSION {
            return Err(ConfigError::Surface { width: dw, height: dh });
        }

        log::debug!("Surface {}x{} (device {}x{}, scale {})", width, height, dw, dh, scale);

        Ok(Self {
            pixels: RgbaImage::new(dw, dh),
            width,
            height,
            scale,
            state: DrawState::default(),
            stack: Vec::new(),
            draw_calls: 0,
        })
    }

    /// Resize to new logical dimensions; zero is clamped to 1, oversize is clamped down
    pub fn resize(&mut self, width: u32, height: u32) {
        let max_logical = MAX_DEVICE_DIMENSION / self.scale;
        let width = width.clamp(1, max_logical);
        let height = height.clamp(1, max_logical);
        if width == self.width && height == self.height {
            return;
        }
        self.width = width;
        self.height = height;
        self.pixels = RgbaImage::new(width * self.scale, height * self.scale);
        log::debug!("Surface resized to {}x{}", width, height);
    }

    /// Logical width
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Logical height
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn device_size(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// Number of pixel-touching draw calls issued so far
    pub fn draw_calls(&self) -> u64 {
        self.draw_calls
    }

    pub fn image(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Copy of the device buffer for export
    pub fn to_image(&self) -> RgbaImage {
        self.pixels.clone()
    }

    pub fn into_image(self) -> RgbaImage {
        self.pixels
    }

    // ------------------------------------------------------------------
    // State
    // ------------------------------------------------------------------

    pub fn save(&mut self) {
        self.stack.push(self.state);
    }

    pub fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    pub fn state(&self) -> DrawState {
        self.state
    }

    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.state.translate.0 += dx;
        self.state.translate.1 += dy;
    }

    pub fn set_blend(&mut self, mode: BlendMode) {
        self.state.blend = mode;
    }

    pub fn set_alpha(&mut self, alpha: f32) {
        self.state.alpha = clamp_unit(alpha);
    }

    /// Snap a logical length to the device pixel grid
    pub fn snap(&self, v: f32) -> f32 {
        let s = self.scale as f32;
        (v * s).round() / s
    }

    // ------------------------------------------------------------------
    // Primitives
    // ------------------------------------------------------------------

    /// Overwrite every device pixel, ignoring blend state and translation
    pub fn clear(&mut self, color: Color) {
        self.draw_calls += 1;
        let [r, g, b, a] = color.to_unit();
        let px = Rgba([to_byte(r), to_byte(g), to_byte(b), to_byte(a)]);
        for p in self.pixels.pixels_mut() {
            *p = px;
        }
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color) {
        if w <= 0.0 || h <= 0.0 {
            return;
        }
        self.draw_calls += 1;
        let src = color.to_unit();
        self.shade(x, y, x + w, y + h, |_, _| Some(src));
    }

    /// Outline drawn inside the rectangle with the given line width
    pub fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32, line: f32, color: Color) {
        if w <= 0.0 || h <= 0.0 || line <= 0.0 {
            return;
        }
        let line = line.min(w / 2.0).min(h / 2.0);
        self.fill_rect(x, y, w, line, color);
        self.fill_rect(x, y + h - line, w, line, color);
        self.fill_rect(x, y + line, line, h - line * 2.0, color);
        self.fill_rect(x + w - line, y + line, line, h - line * 2.0, color);
    }

    pub fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Color) {
        if radius <= 0.0 {
            return;
        }
        self.draw_calls += 1;
        let src = color.to_unit();
        let r2 = radius * radius;
        self.shade(cx - radius, cy - radius, cx + radius, cy + radius, |x, y| {
            let (dx, dy) = (x - cx, y - cy);
            (dx * dx + dy * dy <= r2).then_some(src)
        });
    }

    /// Fill a rectangle with a radial gradient (gradient coordinates share the rect's space)
    pub fn fill_radial_gradient(&mut self, x: f32, y: f32, w: f32, h: f32, gradient: &RadialGradient) {
        if w <= 0.0 || h <= 0.0 {
            return;
        }
        self.draw_calls += 1;
        self.shade(x, y, x + w, y + h, |px, py| Some(gradient.sample(px, py)));
    }

    /// Copy a source region into a destination rect using nearest-neighbour sampling
    #[allow(clippy::too_many_arguments)]
    pub fn draw_image_region(
        &mut self,
        image: &RgbaImage,
        sx: u32,
        sy: u32,
        sw: u32,
        sh: u32,
        dx: f32,
        dy: f32,
        dw: f32,
        dh: f32,
    ) {
        let (iw, ih) = image.dimensions();
        if sw == 0 || sh == 0 || dw <= 0.0 || dh <= 0.0 || sx >= iw || sy >= ih {
            return;
        }
        self.draw_calls += 1;
        let max_x = (sx + sw).min(iw) - 1;
        let max_y = (sy + sh).min(ih) - 1;
        self.shade(dx, dy, dx + dw, dy + dh, |x, y| {
            let u = ((x - dx) / dw * sw as f32).floor().max(0.0) as u32;
            let v = ((y - dy) / dh * sh as f32).floor().max(0.0) as u32;
            let p = image.get_pixel((sx + u).min(max_x), (sy + v).min(max_y));
            Some([
                p[0] as f32 / 255.0,
                p[1] as f32 / 255.0,
                p[2] as f32 / 255.0,
                p[3] as f32 / 255.0,
            ])
        });
    }

    /// Composite another surface over this one in device space
    pub fn draw_surface(&mut self, other: &Surface) {
        self.draw_calls += 1;
        let (ow, oh) = other.pixels.dimensions();
        let (w, h) = self.pixels.dimensions();
        let blend = self.state.blend;
        let alpha = self.state.alpha;
        for y in 0..h.min(oh) {
            for x in 0..w.min(ow) {
                let p = other.pixels.get_pixel(x, y);
                if p[3] == 0 {
                    continue;
                }
                let src = [
                    p[0] as f32 / 255.0,
                    p[1] as f32 / 255.0,
                    p[2] as f32 / 255.0,
                    p[3] as f32 / 255.0 * alpha,
                ];
                composite(self.pixels.get_pixel_mut(x, y), src, blend);
            }
        }
    }

    /// Draw text with its top-left corner at (`x`, `y`); `scale` is the logical size of one font dot
    pub fn fill_text(&mut self, text: &str, x: f32, y: f32, scale: f32, color: Color) {
        if scale <= 0.0 || text.is_empty() {
            return;
        }
        self.draw_calls += 1;
        let src = color.to_unit();
        let advance = font::ADVANCE as f32 * scale;
        for (i, ch) in text.chars().enumerate() {
            let g = font::glyph(ch);
            let gx = x + i as f32 * advance;
            self.shade(gx, y, gx + font::GLYPH_WIDTH as f32 * scale, y + font::line_height(scale), |px, py| {
                let col = ((px - gx) / scale).floor() as u32;
                let row = ((py - y) / scale).floor() as u32;
                font::dot(&g, col, row).then_some(src)
            });
        }
    }

    pub fn measure_text(&self, text: &str, scale: f32) -> f32 {
        font::measure(text, scale)
    }

    /// Read a pixel at logical coordinates (untranslated)
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        let dx = x.checked_mul(self.scale)?;
        let dy = y.checked_mul(self.scale)?;
        (dx < self.pixels.width() && dy < self.pixels.height()).then(|| *self.pixels.get_pixel(dx, dy))
    }

    /// Run `shader` for every device pixel whose centre lies inside the
    /// logical rect (`x0`,`y0`)-(`x1`,`y1`), compositing its output.
    ///
    /// The shader receives the pixel centre in the caller's (translated) space.
    fn shade<F>(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, mut shader: F)
    where
        F: FnMut(f32, f32) -> Option<[f32; 4]>,
    {
        let s = self.scale as f32;
        let (tx, ty) = self.state.translate;
        let blend = self.state.blend;
        let alpha = self.state.alpha;
        let (w, h) = self.pixels.dimensions();

        let dev = |v: f32, t: f32| (v + t) * s;
        let first = |v: f32| (v - 0.5).ceil().max(0.0);
        let px0 = first(dev(x0, tx));
        let py0 = first(dev(y0, ty));
        let px1 = (dev(x1, tx) - 0.5).ceil().min(w as f32);
        let py1 = (dev(y1, ty) - 0.5).ceil().min(h as f32);
        if px1 <= px0 || py1 <= py0 {
            return;
        }

        for py in py0 as u32..py1 as u32 {
            let ly = (py as f32 + 0.5) / s - ty;
            for px in px0 as u32..px1 as u32 {
                let lx = (px as f32 + 0.5) / s - tx;
                if let Some(mut src) = shader(lx, ly) {
                    src[3] *= alpha;
                    composite(self.pixels.get_pixel_mut(px, py), src, blend);
                }
            }
        }
    }
}

#[inline]
fn to_byte(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_scale_threshold() {
        assert_eq!(device_scale(1.0), 1);
        assert_eq!(device_scale(1.49), 1);
        assert_eq!(device_scale(1.5), 2);
        assert_eq!(device_scale(3.0), 2);
    }

    #[test]
    fn test_logical_coordinates_scale_to_device() {
        let mut s = Surface::new(10, 10, 2).unwrap();
        assert_eq!(s.device_size(), (20, 20));
        s.clear(Color::BLACK);
        s.fill_rect(1.0, 1.0, 2.0, 2.0, Color::WHITE);

        let img = s.image();
        assert_eq!(img.get_pixel(2, 2)[0], 255);
        assert_eq!(img.get_pixel(5, 5)[0], 255);
        assert_eq!(img.get_pixel(6, 6)[0], 0);
        assert_eq!(img.get_pixel(1, 1)[0], 0);

        let exported = s.to_image();
        assert_eq!(exported.dimensions(), (20, 20));
        assert_eq!(exported.get_pixel(2, 2)[0], 255);
    }

    #[test]
    fn test_pixel_out_of_range_is_none() {
        let s = Surface::new(4, 4, 2).unwrap();
        assert!(s.pixel(3, 3).is_some());
        assert_eq!(s.pixel(4, 0), None);
        assert_eq!(s.pixel(u32::MAX, 0), None);
        assert_eq!(s.pixel(0, u32::MAX / 2 + 1), None);
    }

    #[test]
    fn test_translate_and_restore() {
        let mut s = Surface::new(8, 8, 1).unwrap();
        s.clear(Color::BLACK);
        s.save();
        s.translate(4.0, 4.0);
        s.fill_rect(0.0, 0.0, 1.0, 1.0, Color::WHITE);
        s.restore();
        s.fill_rect(0.0, 0.0, 1.0, 1.0, Color::rgb(255, 0, 0));

        assert_eq!(s.pixel(4, 4).unwrap()[0], 255);
        assert_eq!(s.pixel(4, 4).unwrap()[1], 255);
        assert_eq!(s.pixel(0, 0).unwrap()[1], 0);
        assert_eq!(s.state().translate, (0.0, 0.0));
    }

    #[test]
    fn test_restore_on_empty_stack_is_noop() {
        let mut s = Surface::new(2, 2, 1).unwrap();
        s.set_alpha(0.5);
        s.restore();
        assert_eq!(s.state().alpha, 0.5);
    }

    #[test]
    fn test_zero_size_clamps_to_one() {
        let mut s = Surface::new(0, 0, 1).unwrap();
        assert_eq!((s.width(), s.height()), (1, 1));
        s.resize(0, 5);
        assert_eq!((s.width(), s.height()), (1, 5));
    }

    #[test]
    fn test_oversized_surface_is_config_error() {
        assert!(matches!(
            Surface::new(10_000, 10, 2),
            Err(ConfigError::Surface { .. })
        ));
    }

    #[test]
    fn test_nearest_neighbour_upscale() {
        let mut src = RgbaImage::new(2, 1);
        src.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        src.put_pixel(1, 0, Rgba([0, 0, 255, 255]));

        let mut s = Surface::new(8, 2, 1).unwrap();
        s.draw_image_region(&src, 0, 0, 2, 1, 0.0, 0.0, 8.0, 2.0);

        for x in 0..4 {
            assert_eq!(s.pixel(x, 1).unwrap(), Rgba([255, 0, 0, 255]));
        }
        for x in 4..8 {
            assert_eq!(s.pixel(x, 0).unwrap(), Rgba([0, 0, 255, 255]));
        }
    }

    #[test]
    fn test_fill_text_draws_dots() {
        let mut s = Surface::new(12, 8, 1).unwrap();
        s.fill_text("I", 0.0, 0.0, 1.0, Color::WHITE);
        // 'I' top row is 0b01110
        assert_eq!(s.pixel(0, 0).unwrap()[3], 0);
        assert_eq!(s.pixel(1, 0).unwrap()[3], 255);
        assert_eq!(s.pixel(2, 3).unwrap()[3], 255);
    }
}
