//! Smooth-follow camera with screen shake
//!
//! Positions are in world pixels. The camera chases a clamped target with
//! frame-rate independent exponential smoothing; shake only moves the
//! rendered view, never the logical position.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::surface::Surface;

/// Default intensity for `shake` in world pixels
pub const DEFAULT_SHAKE_INTENSITY: f32 = 6.0;
/// Default duration for `shake` in seconds
pub const DEFAULT_SHAKE_DURATION: f32 = 0.2;

/// Axis-aligned world limits; infinite on an axis disables clamping there
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraBounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Default for CameraBounds {
    fn default() -> Self {
        Self {
            min_x: f32::NEG_INFINITY,
            min_y: f32::NEG_INFINITY,
            max_x: f32::INFINITY,
            max_y: f32::INFINITY,
        }
    }
}

/// Snapshot of camera state for readouts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub position: (f32, f32),
    pub target: (f32, f32),
    pub offset: (f32, f32),
}

pub struct Camera {
    position: (f32, f32),
    target: (f32, f32),
    viewport: (f32, f32),
    bounds: CameraBounds,
    lerp: f32,
    shake_intensity: f32,
    shake_duration: f32,
    shake_remaining: f32,
    offset: (f32, f32),
    rng: StdRng,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(0.0, 0.0, 800.0, 450.0, 0.15)
    }
}

impl Camera {
    pub fn new(x: f32, y: f32, width: f32, height: f32, lerp: f32) -> Self {
        Self {
            position: (x, y),
            target: (x, y),
            viewport: (width.max(1.0), height.max(1.0)),
            bounds: CameraBounds::default(),
            lerp: if lerp.is_finite() { lerp } else { 0.15 },
            shake_intensity: 0.0,
            shake_duration: 0.0,
            shake_remaining: 0.0,
            offset: (0.0, 0.0),
            rng: StdRng::from_entropy(),
        }
    }

    /// Use a fixed seed for shake directions
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Set a new target; non-finite coordinates leave that axis unchanged
    pub fn follow(&mut self, x: f32, y: f32) {
        if x.is_finite() {
            self.target.0 = x;
        }
        if y.is_finite() {
            self.target.1 = y;
        }
        self.clamp_target();
    }

    /// Jump straight to the (clamped) target without smoothing
    pub fn snap_to_target(&mut self) {
        self.position = self.target;
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        let pick = |v: f32, current: f32| if v.is_finite() && v > 0.0 { v.max(1.0) } else { current };
        self.viewport = (pick(width, self.viewport.0), pick(height, self.viewport.1));
        self.clamp_target();
    }

    pub fn set_bounds(&mut self, min_x: f32, min_y: f32, max_x: f32, max_y: f32) {
        let or = |v: f32, inf: f32| if v.is_finite() { v } else { inf };
        self.bounds = CameraBounds {
            min_x: or(min_x, f32::NEG_INFINITY),
            min_y: or(min_y, f32::NEG_INFINITY),
            max_x: or(max_x, f32::INFINITY),
            max_y: or(max_y, f32::INFINITY),
        };
        self.clamp_target();
    }

    pub fn bounds(&self) -> CameraBounds {
        self.bounds
    }

    /// Start a shake; a new shake replaces any running one
    pub fn shake(&mut self, intensity: f32, duration: f32) {
        let sane = |v: f32| if v.is_finite() { v.max(0.0) } else { 0.0 };
        self.shake_intensity = sane(intensity);
        self.shake_duration = sane(duration);
        self.shake_remaining = self.shake_duration;
    }

    /// Advance smoothing and shake decay by `dt` seconds
    pub fn update(&mut self, dt: f32) {
        let delta = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        if delta > 0.0 {
            let base = self.lerp.clamp(0.01, 0.99);
            let speed = 1.0 - (1.0 - base).powf(delta * 60.0);
            self.position.0 += (self.target.0 - self.position.0) * speed;
            self.position.1 += (self.target.1 - self.position.1) * speed;
            self.shake_remaining = (self.shake_remaining - delta).max(0.0);
        }

        if self.shake_remaining > 0.0 && self.shake_duration > 0.0 {
            let decay = self.shake_remaining / self.shake_duration;
            let magnitude = self.shake_intensity * decay * decay;
            self.offset = (
                self.rng.gen_range(-1.0..=1.0) * magnitude,
                self.rng.gen_range(-1.0..=1.0) * magnitude,
            );
        } else {
            self.offset = (0.0, 0.0);
        }
    }

    /// Push a world-to-screen translation; pair with `reset`
    pub fn apply(&self, surface: &mut Surface) {
        surface.save();
        let (dx, dy) = self.translation();
        surface.translate(surface.snap(dx), surface.snap(dy));
    }

    pub fn reset(&self, surface: &mut Surface) {
        surface.restore();
    }

    /// Unsnapped world-to-screen offset, shake included
    pub fn translation(&self) -> (f32, f32) {
        (
            self.viewport.0 / 2.0 - self.position.0 + self.offset.0,
            self.viewport.1 / 2.0 - self.position.1 + self.offset.1,
        )
    }

    pub fn position(&self) -> (f32, f32) {
        self.position
    }

    pub fn target(&self) -> (f32, f32) {
        self.target
    }

    pub fn offset(&self) -> (f32, f32) {
        self.offset
    }

    pub fn viewport(&self) -> (f32, f32) {
        self.viewport
    }

    pub fn is_shaking(&self) -> bool {
        self.shake_remaining > 0.0
    }

    pub fn state(&self) -> CameraState {
        CameraState {
            position: self.position,
            target: self.target,
            offset: self.offset,
        }
    }

    fn clamp_target(&mut self) {
        self.target.0 = clamp_axis(self.target.0, self.bounds.min_x, self.bounds.max_x, self.viewport.0);
        self.target.1 = clamp_axis(self.target.1, self.bounds.min_y, self.bounds.max_y, self.viewport.1);
    }
}

/// Keep the view inside [min, max]; a world narrower than the view centres on it
fn clamp_axis(value: f32, min: f32, max: f32, view: f32) -> f32 {
    if !min.is_finite() || !max.is_finite() {
        return value;
    }
    if max - min <= view {
        return (min + max) / 2.0;
    }
    let half = view / 2.0;
    value.clamp(min + half, max - half)
}
