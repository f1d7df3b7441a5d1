//! Day/night cycle
//!
//! A wrapping clock whose sine phase drives the colour grade and vignette.

use std::f32::consts::TAU;

use crate::surface::Color;

const DAY_TINT: Color = Color::rgba(255, 230, 200, 0.05);
const NIGHT_TINT: Color = Color::rgba(180, 210, 255, 0.08);
const NIGHT_VIGNETTE: f32 = 0.45;
const DAY_VIGNETTE: f32 = 0.25;
const NIGHT_THRESHOLD: f32 = 0.45;

/// Post-processing parameters for the current time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grade {
    pub tint: Color,
    pub vignette: f32,
}

#[derive(Debug, Clone)]
pub struct TimeOfDay {
    t: f32,
    speed: f32,
    min: f32,
    max: f32,
}

impl Default for TimeOfDay {
    fn default() -> Self {
        Self::new(0.05, 0.0, 1.0)
    }
}

impl TimeOfDay {
    pub fn new(speed: f32, min: f32, max: f32) -> Self {
        let (min, max) = if max > min { (min, max) } else { (min, min + 1.0) };
        Self {
            t: min,
            speed: if speed.is_finite() { speed } else { 0.0 },
            min,
            max,
        }
    }

    fn range(&self) -> f32 {
        (self.max - self.min).max(0.001)
    }

    /// Advance by `dt` seconds, wrapping into [min, max]
    pub fn update(&mut self, dt: f32) {
        if !dt.is_finite() || dt == 0.0 {
            return;
        }
        self.t += dt * self.speed;
        let range = self.range();
        if self.t > self.max {
            self.t = self.min + (self.t - self.min) % range;
        } else if self.t < self.min {
            self.t = self.max - (self.min - self.t) % range;
        }
    }

    pub fn t(&self) -> f32 {
        self.t
    }

    pub fn set_t(&mut self, t: f32) {
        if t.is_finite() {
            self.t = t.clamp(self.min, self.max);
        }
    }

    pub fn set_speed(&mut self, speed: f32) {
        if speed.is_finite() {
            self.speed = speed;
        }
    }

    /// 0 at night, 1 at midday
    pub fn phase(&self) -> f32 {
        let wave = ((self.t - self.min) / self.range() * TAU).sin();
        ((wave + 1.0) / 2.0).clamp(0.0, 1.0)
    }

    pub fn grade(&self) -> Grade {
        let day = self.phase();
        Grade {
            tint: NIGHT_TINT.mix(DAY_TINT, day),
            vignette: NIGHT_VIGNETTE * (1.0 - day) + DAY_VIGNETTE * day,
        }
    }

    pub fn is_night(&self) -> bool {
        self.phase() < NIGHT_THRESHOLD
    }
}
