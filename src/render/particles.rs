//! Fixed-capacity particle pool
//!
//! Slots are allocated once and recycled round-robin. Spawning into a full
//! pool overwrites the slot under the cursor instead of allocating.

use rand::Rng;

use crate::surface::{BlendMode, Color, Surface};

/// Default pool size
pub const DEFAULT_CAPACITY: usize = 256;

/// Default particle colour: warm spark
pub const DEFAULT_PARTICLE_COLOR: Color = Color::rgba(255, 232, 180, 0.9);

const DEFAULT_LIFE: f32 = 0.8;
const MIN_LIFE: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub active: bool,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub age: f32,
    pub life: f32,
    pub size: f32,
    pub gravity: f32,
    pub blend: BlendMode,
    pub color: Color,
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            active: false,
            x: 0.0,
            y: 0.0,
            vx: 0.0,
            vy: 0.0,
            age: 0.0,
            life: 0.5,
            size: 1.0,
            gravity: 0.0,
            blend: BlendMode::Lighter,
            color: DEFAULT_PARTICLE_COLOR,
        }
    }
}

/// Optional spawn parameters; unset fields take defaults
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpawnOptions {
    pub vx: Option<f32>,
    pub vy: Option<f32>,
    pub life: Option<f32>,
    pub size: Option<f32>,
    pub gravity: Option<f32>,
    pub blend: Option<BlendMode>,
    pub color: Option<Color>,
}

impl SpawnOptions {
    pub fn velocity(mut self, vx: f32, vy: f32) -> Self {
        self.vx = Some(vx);
        self.vy = Some(vy);
        self
    }

    pub fn life(mut self, life: f32) -> Self {
        self.life = Some(life);
        self
    }

    pub fn size(mut self, size: f32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn gravity(mut self, gravity: f32) -> Self {
        self.gravity = Some(gravity);
        self
    }

    pub fn blend(mut self, blend: BlendMode) -> Self {
        self.blend = Some(blend);
        self
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }
}

pub struct ParticleEmitter {
    pool: Vec<Particle>,
    cursor: usize,
}

impl Default for ParticleEmitter {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ParticleEmitter {
    pub fn new(capacity: usize) -> Self {
        Self {
            pool: vec![Particle::default(); capacity.max(1)],
            cursor: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.pool.len()
    }

    pub fn active_count(&self) -> usize {
        self.pool.iter().filter(|p| p.active).count()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.pool
    }

    /// Activate a particle and return the slot it landed in
    pub fn spawn(&mut self, x: f32, y: f32, opts: SpawnOptions) -> usize {
        let finite = |v: Option<f32>, default: f32| v.filter(|v| v.is_finite()).unwrap_or(default);
        let idx = self.find_available();
        self.pool[idx] = Particle {
            active: true,
            x: finite(Some(x), 0.0),
            y: finite(Some(y), 0.0),
            vx: finite(opts.vx, 0.0),
            vy: finite(opts.vy, 0.0),
            age: 0.0,
            life: finite(opts.life, DEFAULT_LIFE).max(MIN_LIFE),
            size: finite(opts.size, 1.0).max(1.0),
            gravity: finite(opts.gravity, 0.0),
            blend: match opts.blend {
                Some(BlendMode::Lighter) | None => BlendMode::Lighter,
                Some(_) => BlendMode::SourceOver,
            },
            color: opts.color.unwrap_or(DEFAULT_PARTICLE_COLOR),
        };
        idx
    }

    /// Next free slot scanning from the cursor, or the cursor slot itself when full
    fn find_available(&mut self) -> usize {
        let len = self.pool.len();
        for i in 0..len {
            let idx = (self.cursor + i) % len;
            if !self.pool[idx].active {
                self.cursor = (idx + 1) % len;
                return idx;
            }
        }
        let idx = self.cursor;
        self.cursor = (self.cursor + 1) % len;
        idx
    }

    /// Integrate motion, then age; a particle whose age reaches its life goes inactive
    pub fn update(&mut self, dt: f32) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        for p in self.pool.iter_mut().filter(|p| p.active) {
            p.vy += p.gravity * dt;
            p.x += p.vx * dt;
            p.y += p.vy * dt;
            p.age += dt;
            if p.age >= p.life {
                p.active = false;
            }
        }
    }

    /// Draw active particles as squares centred on their position
    pub fn draw(&self, surface: &mut Surface) {
        surface.save();
        let mut current: Option<BlendMode> = None;
        for p in self.pool.iter().filter(|p| p.active) {
            if current != Some(p.blend) {
                current = Some(p.blend);
                surface.set_blend(p.blend);
            }
            surface.set_alpha((1.0 - p.age / p.life).max(0.0));
            let size = p.size.round().max(1.0);
            let half = size / 2.0;
            surface.fill_rect((p.x - half).round(), (p.y - half).round(), size, size, p.color);
        }
        surface.restore();
    }

    /// Spawn a rising fountain of `count` sparks around (`x`, `y`)
    pub fn burst<R: Rng>(&mut self, x: f32, y: f32, count: usize, color: Color, rng: &mut R) {
        for _ in 0..count {
            let opts = SpawnOptions::default()
                .velocity((rng.gen::<f32>() - 0.5) * 20.0, -25.0 - rng.gen::<f32>() * 15.0)
                .life(0.5 + rng.gen::<f32>() * 0.5)
                .size(1.0 + rng.gen::<f32>() * 2.0)
                .color(color);
            self.spawn(x, y, opts);
        }
    }

    /// Deactivate every particle
    pub fn clear(&mut self) {
        for p in &mut self.pool {
            p.active = false;
        }
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saturation_reuses_first_slot() {
        let mut emitter = ParticleEmitter::new(4);
        let slots: Vec<usize> = (0..5).map(|i| emitter.spawn(i as f32, 0.0, SpawnOptions::default())).collect();
        assert_eq!(emitter.active_count(), 4);
        assert_eq!(slots[4], slots[0]);
        assert_eq!(emitter.particles()[slots[0]].x, 4.0);
    }

    #[test]
    fn test_expiry_at_life() {
        let mut emitter = ParticleEmitter::new(2);
        emitter.spawn(0.0, 0.0, SpawnOptions::default().life(0.5));

        emitter.update(0.25);
        emitter.update(0.125);
        assert_eq!(emitter.active_count(), 1);

        emitter.update(0.125);
        assert_eq!(emitter.active_count(), 0);
    }

    #[test]
    fn test_single_step_expiry() {
        let mut emitter = ParticleEmitter::new(1);
        emitter.spawn(0.0, 0.0, SpawnOptions::default().life(0.5));
        emitter.update(0.5);
        assert_eq!(emitter.active_count(), 0);
    }

    #[test]
    fn test_integration_order() {
        let mut emitter = ParticleEmitter::new(1);
        let idx = emitter.spawn(0.0, 0.0, SpawnOptions::default().velocity(10.0, 0.0).gravity(100.0).life(5.0));
        emitter.update(0.5);
        let p = emitter.particles()[idx];
        assert_eq!(p.vy, 50.0);
        assert_eq!(p.x, 5.0);
        assert_eq!(p.y, 25.0);
    }

    #[test]
    fn test_spawn_clamps_and_freed_slots_are_reused() {
        let mut emitter = ParticleEmitter::new(3);
        let a = emitter.spawn(0.0, 0.0, SpawnOptions::default().life(0.01).size(0.2));
        let p = emitter.particles()[a];
        assert_eq!(p.life, 0.1);
        assert_eq!(p.size, 1.0);
        assert_eq!(p.blend, BlendMode::Lighter);

        emitter.spawn(0.0, 0.0, SpawnOptions::default().blend(BlendMode::Multiply));
        assert_eq!(emitter.particles()[1].blend, BlendMode::SourceOver);

        emitter.update(0.2);
        assert_eq!(emitter.active_count(), 1);
        let next = emitter.spawn(0.0, 0.0, SpawnOptions::default());
        assert_eq!(next, 2);
        let wrapped = emitter.spawn(0.0, 0.0, SpawnOptions::default());
        assert_eq!(wrapped, 0);
    }

    #[test]
    fn test_burst_rises() {
        use rand::SeedableRng;

        let mut rng = rand::rngs::StdRng::seed_from_u64(3);
        let mut emitter = ParticleEmitter::new(32);
        emitter.burst(10.0, 10.0, 20, Color::rgb(0xff, 0xd7, 0x00), &mut rng);
        assert_eq!(emitter.active_count(), 20);
        assert!(emitter.particles().iter().filter(|p| p.active).all(|p| p.vy <= -25.0 && p.life >= 0.5));
    }

    #[test]
    fn test_draw_fades_with_age() {
        let mut surface = Surface::new(8, 8, 1).unwrap();
        let mut emitter = ParticleEmitter::new(1);
        emitter.spawn(
            4.0,
            4.0,
            SpawnOptions::default()
                .size(2.0)
                .life(1.0)
                .blend(BlendMode::SourceOver)
                .color(Color::WHITE),
        );
        emitter.update(0.5);
        emitter.draw(&mut surface);

        let px = surface.pixel(4, 4).unwrap();
        assert!(px[3] > 100 && px[3] < 160, "alpha {}", px[3]);
        assert_eq!(surface.state().blend, BlendMode::SourceOver);
        assert_eq!(surface.state().alpha, 1.0);
    }
}
