//! Screen-blended hit flashes

use crate::surface::{BlendMode, Color, Surface};

pub const DEFAULT_FLASH_ALPHA: f32 = 0.5;
pub const DEFAULT_FLASH_MS: f32 = 80.0;
const MIN_FLASH_MS: f32 = 16.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Flash {
    x: f32,
    y: f32,
    w: f32,
    h: f32,
    alpha: f32,
    duration: f32,
    remaining: f32,
}

impl Flash {
    /// Quadratic ease-out of the starting alpha
    fn intensity(&self) -> f32 {
        let progress = (self.remaining / self.duration).max(0.0);
        self.alpha * progress * progress
    }
}

#[derive(Debug, Default)]
pub struct FlashLayer {
    flashes: Vec<Flash>,
}

impl FlashLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a white flash over a rect; empty rects are ignored
    pub fn flash_rect(&mut self, x: f32, y: f32, w: f32, h: f32, alpha: f32, ms: f32) {
        let w = if w.is_finite() { w.max(0.0) } else { 0.0 };
        let h = if h.is_finite() { h.max(0.0) } else { 0.0 };
        if w <= 0.0 || h <= 0.0 {
            return;
        }
        let alpha = if alpha.is_finite() { alpha.max(0.0) } else { DEFAULT_FLASH_ALPHA };
        let ms = if ms.is_finite() { ms.max(MIN_FLASH_MS) } else { DEFAULT_FLASH_MS };
        let duration = ms / 1000.0;
        self.flashes.push(Flash {
            x: if x.is_finite() { x } else { 0.0 },
            y: if y.is_finite() { y } else { 0.0 },
            w,
            h,
            alpha,
            duration,
            remaining: duration,
        });
    }

    pub fn update(&mut self, dt: f32) {
        let delta = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        for flash in &mut self.flashes {
            flash.remaining -= delta;
        }
        self.flashes.retain(|f| f.remaining > 0.0);
    }

    pub fn draw(&self, surface: &mut Surface) {
        if self.flashes.is_empty() {
            return;
        }
        surface.save();
        surface.set_blend(BlendMode::Screen);
        surface.set_alpha(1.0);
        for flash in &self.flashes {
            let intensity = flash.intensity();
            if intensity <= 0.0 {
                continue;
            }
            surface.fill_rect(
                surface.snap(flash.x),
                surface.snap(flash.y),
                surface.snap(flash.w),
                surface.snap(flash.h),
                Color::WHITE.with_alpha(intensity.min(1.0)),
            );
        }
        surface.restore();
    }

    pub fn clear(&mut self) {
        self.flashes.clear();
    }

    pub fn has_active(&self) -> bool {
        !self.flashes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.flashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flashes.is_empty()
    }
}
