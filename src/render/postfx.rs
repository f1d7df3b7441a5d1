//! Post-processing
//!
//! Full-viewport passes applied after the world is drawn: a multiplicative
//! vignette, a soft-light colour grade, and the point-light darkness mask.

use serde::{Deserialize, Serialize};

use crate::surface::{BlendMode, Color, RadialGradient, Surface};

/// Default colour-grade tint
pub const DEFAULT_GRADE: Color = Color::rgba(255, 230, 200, 0.06);

/// Upper limit for vignette strength
pub const MAX_VIGNETTE: f32 = 0.8;

/// Erase rings per light: (radius fraction, alpha)
const LIGHT_RINGS: [(f32, f32); 3] = [(1.0 / 3.0, 0.85), (2.0 / 3.0, 0.55), (1.0, 0.35)];

/// Glow radius as a fraction of the light radius
const GLOW_SCALE: f32 = 0.5;
const GLOW_ALPHA: f32 = 0.35;

/// A point light in world pixels; replaced wholesale every frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightSource {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub color: Color,
    #[serde(default = "default_intensity")]
    pub intensity: f32,
}

fn default_intensity() -> f32 {
    1.0
}

impl LightSource {
    pub fn new(x: f32, y: f32, radius: f32, color: Color) -> Self {
        Self { x, y, radius, color, intensity: 1.0 }
    }

    pub fn with_intensity(mut self, intensity: f32) -> Self {
        self.intensity = intensity;
        self
    }

    fn is_drawable(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.radius.is_finite()
            && self.radius > 0.0
            && self.intensity.is_finite()
            && self.intensity > 0.0
    }
}

/// Darken the edges with a centred radial gradient
pub fn vignette(surface: &mut Surface, strength: f32) {
    let strength = if strength.is_finite() { strength.clamp(0.0, MAX_VIGNETTE) } else { 0.0 };
    if strength <= 0.0 {
        return;
    }
    let (w, h) = (surface.width() as f32, surface.height() as f32);
    let max_dim = w.max(h);
    let gradient = RadialGradient::new(w / 2.0, h / 2.0, max_dim * 0.35, max_dim * 0.75)
        .with_stop(0.0, Color::rgba(0, 0, 0, 0.0))
        .with_stop(1.0, Color::rgba(0, 0, 0, strength));

    surface.save();
    surface.set_blend(BlendMode::Multiply);
    surface.fill_radial_gradient(0.0, 0.0, w, h, &gradient);
    surface.restore();
}

/// Soft-light tint over the whole viewport
pub fn color_grade(surface: &mut Surface, tint: Color) {
    if tint.a <= 0.0 {
        return;
    }
    let (w, h) = (surface.width() as f32, surface.height() as f32);
    surface.save();
    surface.set_blend(BlendMode::SoftLight);
    surface.fill_rect(0.0, 0.0, w, h, tint);
    surface.restore();
}

/// Point-light compositor.
///
/// Owns the darkness mask so it is allocated once and resized on demand.
#[derive(Default)]
pub struct Lighting {
    mask: Option<Surface>,
}

impl Lighting {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compose ambient darkness and lights onto `surface`.
    ///
    /// `lights` are in world pixels; `offset` is the world-to-screen
    /// translation currently used by the camera.
    pub fn compose(&mut self, surface: &mut Surface, ambient: Color, lights: &[LightSource], offset: (f32, f32)) {
        let (w, h, scale) = (surface.width(), surface.height(), surface.scale());
        let Some(mask) = self.mask_for(w, h, scale) else {
            return;
        };

        mask.clear(ambient);
        mask.save();
        mask.translate(offset.0, offset.1);
        mask.set_blend(BlendMode::DestinationOut);
        for light in lights.iter().filter(|l| l.is_drawable()) {
            for (fraction, alpha) in LIGHT_RINGS {
                let a = (alpha * light.intensity).min(1.0);
                mask.fill_circle(light.x, light.y, light.radius * fraction, Color::BLACK.with_alpha(a));
            }
        }
        mask.restore();

        surface.save();
        surface.set_blend(BlendMode::SourceOver);
        surface.draw_surface(mask);
        surface.restore();

        // Glows go on after the mask so darkness never dims them
        surface.save();
        surface.translate(offset.0, offset.1);
        surface.set_blend(BlendMode::Lighter);
        for light in lights.iter().filter(|l| l.is_drawable()) {
            let r = light.radius * GLOW_SCALE;
            let glow = RadialGradient::new(light.x, light.y, 0.0, r)
                .with_stop(0.0, light.color.with_alpha(GLOW_ALPHA * light.intensity.min(1.0)))
                .with_stop(1.0, light.color.with_alpha(0.0));
            surface.fill_radial_gradient(light.x - r, light.y - r, r * 2.0, r * 2.0, &glow);
        }
        surface.restore();
    }

    fn mask_for(&mut self, width: u32, height: u32, scale: u32) -> Option<&mut Surface> {
        let stale = match &self.mask {
            Some(m) => m.scale() != scale,
            None => true,
        };
        if stale {
            match Surface::new(width, height, scale) {
                Ok(mask) => self.mask = Some(mask),
                Err(e) => {
                    log::warn!("Skipping lighting: {}", e);
                    self.mask = None;
                    return None;
                }
            }
        }
        let mask = self.mask.as_mut()?;
        mask.resize(width, height);
        Some(mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vignette_darkens_corners_only() {
        let mut s = Surface::new(100, 100, 1).unwrap();
        s.clear(Color::WHITE);
        vignette(&mut s, 0.8);

        assert_eq!(s.pixel(50, 50).unwrap()[0], 255);
        assert!(s.pixel(0, 0).unwrap()[0] < 255);
    }

    #[test]
    fn test_zero_vignette_is_noop() {
        let mut s = Surface::new(10, 10, 1).unwrap();
        vignette(&mut s, 0.0);
        assert_eq!(s.draw_calls(), 0);
    }

    #[test]
    fn test_lights_cut_through_darkness() {
        let mut s = Surface::new(64, 64, 1).unwrap();
        s.clear(Color::WHITE);
        let mut lighting = Lighting::new();
        let light = LightSource::new(16.0, 16.0, 12.0, Color::rgb(255, 200, 120));
        lighting.compose(&mut s, Color::rgba(0, 0, 20, 0.9), &[light], (0.0, 0.0));

        let lit = s.pixel(16, 16).unwrap();
        let dark = s.pixel(60, 60).unwrap();
        assert!(lit[0] > 200, "lit {:?}", lit);
        assert!(dark[0] < 40, "dark {:?}", dark);
        assert_eq!(s.state().blend, BlendMode::SourceOver);
    }

    #[test]
    fn test_glow_sits_above_darkness() {
        // Half intensity leaves a third of the darkness at the centre, which
        // would cut the glow if the mask went on last
        let mut s = Surface::new(33, 33, 1).unwrap();
        s.clear(Color::BLACK);
        let mut lighting = Lighting::new();
        let light = LightSource::new(16.5, 16.5, 24.0, Color::rgb(255, 200, 120)).with_intensity(0.5);
        lighting.compose(&mut s, Color::rgba(0, 0, 0, 1.0), &[light], (0.0, 0.0));

        let glow = (255.0 * GLOW_ALPHA * 0.5).floor() as u8;
        let centre = s.pixel(16, 16).unwrap();
        assert!(centre[0] >= glow, "centre {:?}, glow {}", centre, glow);
        assert_eq!(centre[3], 255);
    }

    #[test]
    fn test_vignette_strength_caps_at_max() {
        let mut capped = Surface::new(40, 30, 1).unwrap();
        let mut over = Surface::new(40, 30, 1).unwrap();
        capped.clear(Color::WHITE);
        over.clear(Color::WHITE);
        vignette(&mut capped, MAX_VIGNETTE);
        vignette(&mut over, 1.0);
        assert_eq!(capped.image(), over.image());
        assert!(over.pixel(0, 0).unwrap()[0] < 255);
    }

    #[test]
    fn test_light_offset_follows_camera() {
        let mut s = Surface::new(64, 64, 1).unwrap();
        s.clear(Color::WHITE);
        let mut lighting = Lighting::new();
        let light = LightSource::new(100.0, 100.0, 12.0, Color::WHITE);
        lighting.compose(&mut s, Color::rgba(0, 0, 0, 0.9), &[light], (-68.0, -68.0));
        assert!(s.pixel(32, 32).unwrap()[0] > 200);
    }

    #[test]
    fn test_mask_follows_resize() {
        let mut lighting = Lighting::new();
        let mut small = Surface::new(8, 8, 1).unwrap();
        lighting.compose(&mut small, Color::rgba(0, 0, 0, 0.5), &[], (0.0, 0.0));
        let mut big = Surface::new(32, 16, 1).unwrap();
        lighting.compose(&mut big, Color::rgba(0, 0, 0, 0.5), &[], (0.0, 0.0));
        assert!(big.pixel(31, 15).unwrap()[3] > 0);
    }

    #[test]
    fn test_color_grade_touches_every_pixel() {
        let mut s = Surface::new(4, 4, 1).unwrap();
        s.clear(Color::rgb(128, 128, 128));
        color_grade(&mut s, Color::rgba(255, 0, 0, 1.0));
        let p = s.pixel(3, 3).unwrap();
        assert!(p[0] > 128);
        assert!(p[2] < 128);
    }
}
