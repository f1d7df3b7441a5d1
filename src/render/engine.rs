//! Render engine
//!
//! Owns the frame loop and every piece of renderer state. The game publishes
//! map, player and entity views through `render`; the host drives frames
//! through `on_frame`. Nothing here blocks.

use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use super::animation::AnimFsm;
use super::atlas::Atlas;
use super::camera::Camera;
use super::entity::{self, EntityKind, SceneEntity, NPC_COLOR, NPC_SPRITE};
use super::flash::FlashLayer;
use super::hud::{DebugReadout, Hud, HudData};
use super::loader::{AtlasOutcome, PendingAtlas};
use super::particles::ParticleEmitter;
use super::postfx::{self, LightSource, Lighting};
use super::time_of_day::TimeOfDay;
use crate::data::RenderConfig;
use crate::error::ConfigError;
use crate::host::FrameHost;
use crate::surface::{device_scale, Color, Surface};
use crate::world::{Direction, MapView, PlayerView, TileType};

/// Wash over maps flagged safe
const SAFE_TINT: Color = Color::rgba(255, 255, 255, 0.06);
/// Player fill when the atlas has no walk frames
const PLAYER_COLOR: Color = Color::rgb(0xf7, 0xd7, 0x94);
/// Weight of the newest sample in the smoothed FPS readout
const FPS_SMOOTHING: f32 = 0.1;

/// Outlined tile, optionally expiring at a frame-clock time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Highlight {
    pub x: i32,
    pub y: i32,
    pub color: Option<Color>,
    /// Frame-clock milliseconds after which the highlight is dropped
    pub expires_at: Option<f64>,
}

impl Highlight {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y, color: None, expires_at: None }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn expiring_at(mut self, ms: f64) -> Self {
        self.expires_at = Some(ms);
        self
    }
}

/// Extra HUD lines supplied by the game
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HudExtras {
    pub resources: Vec<(String, String)>,
    pub title: Option<String>,
}

/// Per-call inputs to `render`
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub highlight: Option<Highlight>,
    /// Replaces the default highlight colour from now on
    pub highlight_color: Option<Color>,
    pub objects: Vec<SceneEntity>,
    pub npcs: Vec<SceneEntity>,
    /// `None` keeps the current light list
    pub lights: Option<Vec<LightSource>>,
    /// `None` keeps the current HUD extras
    pub hud: Option<HudExtras>,
    /// Replace the prop snapshot even when its signature is unchanged
    pub force_redraw: bool,
}

/// Map placement in logical screen pixels for the last drawn frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

pub struct RenderEngine {
    config: RenderConfig,
    surface: Surface,
    host: Box<dyn FrameHost>,

    // Lifecycle
    running: bool,
    frame_pending: bool,
    last_timestamp: f64,
    clock_ms: f64,
    frames_drawn: u64,
    fps: f32,

    // Assets
    atlas: Option<Atlas>,
    pending_atlas: Option<PendingAtlas>,
    assets_loaded: bool,

    // Published game state
    map: Option<Rc<MapView>>,
    player: Option<PlayerView>,
    highlight: Option<Highlight>,
    highlight_color: Color,
    objects: Vec<SceneEntity>,
    object_signature: Option<u64>,
    npcs: Vec<SceneEntity>,
    lights: Vec<LightSource>,
    hud_extras: HudExtras,
    map_rect: Option<MapRect>,

    // Player movement
    animation: AnimFsm<String>,
    active_directions: Vec<Direction>,
    current_direction: Direction,

    // Effects
    camera: Camera,
    camera_settled: bool,
    particles: ParticleEmitter,
    flashes: FlashLayer,
    lighting: Lighting,
    time_of_day: TimeOfDay,
    hud: Hud,
    debug: bool,
}

impl RenderEngine {
    /// Build an engine; fails without side effects on bad configuration
    pub fn new(config: RenderConfig, host: Box<dyn FrameHost>) -> Result<Self, ConfigError> {
        let config = config.sanitized();
        let scale = device_scale(config.display_ratio);
        let surface = Surface::new(config.viewport_width, config.viewport_height, scale)?;
        let animation = AnimFsm::new(config.animations.clone(), "idle_south")?;
        let camera = Camera::new(
            0.0,
            0.0,
            surface.width() as f32,
            surface.height() as f32,
            config.camera_lerp,
        );

        log::info!(
            "Render engine {}x{} at {}x scale, tile {}px",
            surface.width(),
            surface.height(),
            scale,
            config.tile_size
        );

        Ok(Self {
            surface,
            host,
            running: false,
            frame_pending: false,
            last_timestamp: 0.0,
            clock_ms: 0.0,
            frames_drawn: 0,
            fps: 0.0,
            atlas: None,
            pending_atlas: None,
            assets_loaded: false,
            map: None,
            player: None,
            highlight: None,
            highlight_color: config.highlight,
            objects: Vec::new(),
            object_signature: None,
            npcs: Vec::new(),
            lights: Vec::new(),
            hud_extras: HudExtras::default(),
            map_rect: None,
            animation,
            active_directions: Vec::new(),
            current_direction: Direction::South,
            camera,
            camera_settled: false,
            particles: ParticleEmitter::new(config.particle_capacity),
            flashes: FlashLayer::new(),
            lighting: Lighting::new(),
            time_of_day: TimeOfDay::new(config.time_of_day_speed, 0.0, 1.0),
            hud: Hud::new(),
            debug: config.debug,
            config,
        })
    }

    /// Fix the camera shake sequence for reproducible frames
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.camera = std::mem::take(&mut self.camera).with_seed(seed);
        self
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Begin the frame loop; calling it while running does nothing
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        self.last_timestamp = self.host.now_ms();
        self.clock_ms = self.last_timestamp;
        log::info!("Render loop started");
        if !self.frame_pending {
            self.frame_pending = true;
            self.host.request_frame();
        }
    }

    /// Halt the loop; an already scheduled callback becomes a no-op
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        log::info!("Render loop stopped after {} frames", self.frames_drawn);
    }

    /// Host frame callback
    pub fn on_frame(&mut self, timestamp_ms: f64) {
        self.frame_pending = false;
        if !self.running {
            return;
        }

        let raw = timestamp_ms - self.last_timestamp;
        self.last_timestamp = timestamp_ms;
        self.clock_ms = timestamp_ms;
        if raw.is_finite() && raw > 0.0 {
            let sample = (1000.0 / raw) as f32;
            self.fps = if self.fps > 0.0 {
                self.fps * (1.0 - FPS_SMOOTHING) + sample * FPS_SMOOTHING
            } else {
                sample
            };
        }
        if raw > self.config.max_frame_delta_ms {
            log::debug!("Clamping {:.1}ms frame delta", raw);
        }
        let delta = if raw.is_finite() { raw.clamp(0.0, self.config.max_frame_delta_ms) } else { 0.0 };

        self.poll_assets();
        self.update(delta);
        self.draw();

        if self.running {
            self.frame_pending = true;
            self.host.request_frame();
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    // ------------------------------------------------------------------
    // Assets
    // ------------------------------------------------------------------

    /// Install a loaded atlas; supersedes any load still in flight
    pub fn set_atlas(&mut self, atlas: Atlas) {
        if self.pending_atlas.take().is_some() {
            log::debug!("Discarding superseded atlas load");
        }
        log::info!("Atlas installed ({} frames)", atlas.len());
        self.atlas = Some(atlas);
        self.assets_loaded = true;
    }

    /// Start a background atlas load; the result is picked up on a later frame
    pub fn load_atlas(&mut self, image: Option<PathBuf>, metadata: PathBuf) {
        if self.pending_atlas.is_some() {
            log::debug!("Superseding pending atlas load");
        }
        let timeout = Duration::from_millis(self.config.atlas_timeout_ms);
        self.pending_atlas = Some(PendingAtlas::spawn(image, metadata, timeout));
    }

    /// Check the pending atlas load; called once per frame
    pub fn poll_assets(&mut self) {
        let Some(pending) = self.pending_atlas.as_mut() else {
            return;
        };
        let Some(outcome) = pending.poll() else {
            return;
        };
        self.pending_atlas = None;

        let reason = match outcome {
            AtlasOutcome::Loaded(atlas) => {
                self.set_atlas(atlas);
                return;
            }
            AtlasOutcome::Failed(e) => e.to_string(),
            AtlasOutcome::TimedOut => "timed out".to_string(),
        };

        if self.config.placeholder_assets {
            log::warn!("Atlas load failed ({}), substituting placeholder art", reason);
            self.set_atlas(placeholder_atlas(self.config.tile_size));
        } else if self.assets_loaded {
            log::warn!("Atlas load failed ({}), keeping current atlas", reason);
        } else {
            log::warn!("Atlas load failed ({}), renderer stays idle", reason);
        }
    }

    pub fn assets_loaded(&self) -> bool {
        self.assets_loaded
    }

    pub fn atlas(&self) -> Option<&Atlas> {
        self.atlas.as_ref()
    }

    pub fn set_particles(&mut self, emitter: ParticleEmitter) {
        self.particles = emitter;
    }

    pub fn particles(&self) -> &ParticleEmitter {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut ParticleEmitter {
        &mut self.particles
    }

    pub fn flashes_mut(&mut self) -> &mut FlashLayer {
        &mut self.flashes
    }

    // ------------------------------------------------------------------
    // Game-facing state
    // ------------------------------------------------------------------

    /// Publish the world to draw from the next frame on
    pub fn render(&mut self, map: Option<Rc<MapView>>, player: Option<PlayerView>, options: RenderOptions) {
        let swapped = match (&self.map, &map) {
            (Some(old), Some(new)) => !Rc::ptr_eq(old, new),
            (None, None) => false,
            _ => true,
        };
        if swapped {
            match &map {
                Some(m) => log::info!("Map changed to {:?} ({}x{})", m.name, m.width, m.height),
                None => log::info!("Map cleared"),
            }
            self.map = map;
            self.map_rect = None;
            self.camera_settled = false;
            self.stop_all_movement();
            self.update_camera_bounds();
        }

        match player {
            Some(p) => {
                if self.active_directions.is_empty() {
                    self.current_direction = p.facing;
                    self.sync_animation();
                }
                self.player = Some(p);
            }
            None => {
                self.player = None;
                self.stop_all_movement();
            }
        }

        self.highlight = options.highlight;
        if let Some(color) = options.highlight_color {
            self.highlight_color = color;
        }

        let signature = entity::signature(&options.objects);
        if options.force_redraw || self.object_signature != Some(signature) {
            log::debug!("Prop snapshot replaced ({} entities)", options.objects.len());
            let mut objects = options.objects;
            entity::sort_for_drawing(&mut objects);
            self.objects = objects;
            self.object_signature = Some(signature);
        }

        let mut npcs = options.npcs;
        entity::sort_for_drawing(&mut npcs);
        self.npcs = npcs;

        if let Some(lights) = options.lights {
            self.lights = lights;
        }
        if let Some(hud) = options.hud {
            self.hud_extras = hud;
        }
    }

    /// Toggle one movement intent; the most recent active direction wins
    pub fn set_player_movement(&mut self, direction: Direction, active: bool) {
        if active {
            if !self.active_directions.contains(&direction) {
                self.active_directions.push(direction);
            }
            self.current_direction = direction;
        } else {
            self.active_directions.retain(|d| *d != direction);
            if let Some(last) = self.active_directions.last() {
                self.current_direction = *last;
            }
        }
        self.sync_animation();
    }

    /// Clear every movement intent and return to the idle frame
    pub fn stop_all_movement(&mut self) {
        self.active_directions.clear();
        self.sync_animation();
    }

    pub fn is_moving(&self) -> bool {
        !self.active_directions.is_empty()
    }

    pub fn current_direction(&self) -> Direction {
        self.current_direction
    }

    pub fn set_lights(&mut self, lights: Vec<LightSource>) {
        self.lights = lights;
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    pub fn shake_camera(&mut self, intensity: f32, seconds: f32) {
        self.camera.shake(intensity, seconds);
    }

    /// Change the logical viewport; picked up by the next draw
    pub fn resize(&mut self, width: u32, height: u32) {
        self.surface.resize(width, height);
        self.camera.set_viewport(self.surface.width() as f32, self.surface.height() as f32);
    }

    /// Map tile under a logical screen point, using the last drawn frame
    pub fn tile_at_screen(&self, x: f32, y: f32) -> Option<(i32, i32)> {
        let map = self.map.as_ref()?;
        let rect = self.map_rect?;
        let ts = self.config.tile_size as f32;
        let tx = ((x - rect.x) / ts).floor();
        let ty = ((y - rect.y) / ts).floor();
        if !tx.is_finite() || !ty.is_finite() {
            return None;
        }
        let (tx, ty) = (tx as i32, ty as i32);
        map.in_bounds(tx, ty).then_some((tx, ty))
    }

    pub fn map_screen_rect(&self) -> Option<MapRect> {
        self.map_rect
    }

    pub fn tile_size(&self) -> u32 {
        self.config.tile_size
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn animation(&self) -> &AnimFsm<String> {
        &self.animation
    }

    pub fn time_of_day(&self) -> &TimeOfDay {
        &self.time_of_day
    }

    pub fn highlight(&self) -> Option<&Highlight> {
        self.highlight.as_ref()
    }

    pub fn objects(&self) -> &[SceneEntity] {
        &self.objects
    }

    pub fn npcs(&self) -> &[SceneEntity] {
        &self.npcs
    }

    /// Smoothed frames per second
    pub fn fps(&self) -> f32 {
        self.fps
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    /// Frame-clock time in milliseconds (the last host timestamp)
    pub fn clock_ms(&self) -> f64 {
        self.clock_ms
    }

    // ------------------------------------------------------------------
    // Frame
    // ------------------------------------------------------------------

    /// Advance animation, highlight expiry and effects by `delta_ms`
    pub fn update(&mut self, delta_ms: f64) {
        if !self.assets_loaded {
            return;
        }
        let dt = delta_ms.max(0.0) / 1000.0;
        let dt32 = dt as f32;

        self.animation.update(dt);

        if let Some(expires) = self.highlight.and_then(|h| h.expires_at) {
            if expires <= self.clock_ms {
                self.highlight = None;
            }
        }

        self.particles.update(dt32);
        self.flashes.update(dt32);
        self.time_of_day.update(dt32);

        if let Some((cx, cy)) = self.player_center() {
            self.camera.follow(cx, cy);
            if !self.camera_settled {
                self.camera.snap_to_target();
                self.camera_settled = true;
            }
        }
        self.camera.update(dt32);
    }

    /// Compose one frame onto the surface
    pub fn draw(&mut self) {
        if !self.assets_loaded {
            return;
        }

        let (w, h) = (self.surface.width() as f32, self.surface.height() as f32);
        self.camera.set_viewport(w, h);

        self.surface.save();
        self.surface.clear(self.config.background);

        let Some(map) = self.map.clone() else {
            self.map_rect = None;
            self.surface.restore();
            self.frames_drawn += 1;
            return;
        };

        let ts = self.config.tile_size as f32;
        let (tx, ty) = self.camera.translation();
        let (tx, ty) = (self.surface.snap(tx), self.surface.snap(ty));
        let (map_w, map_h) = (map.width as f32 * ts, map.height as f32 * ts);
        self.map_rect = Some(MapRect { x: tx, y: ty, width: map_w, height: map_h });

        self.camera.apply(&mut self.surface);
        self.draw_tiles(&map, (tx, ty));
        if map.safe {
            self.surface.fill_rect(0.0, 0.0, map_w, map_h, SAFE_TINT);
        }

        let atlas = self.atlas.as_ref();
        for object in &self.objects {
            object.draw(&mut self.surface, atlas, ts, EntityKind::Prop);
        }
        for npc in &self.npcs {
            npc.draw(&mut self.surface, atlas, ts, EntityKind::Npc);
        }

        if let Some(highlight) = self.highlight {
            self.draw_highlight(highlight);
        }
        self.draw_player();
        self.particles.draw(&mut self.surface);
        self.flashes.draw(&mut self.surface);
        self.camera.reset(&mut self.surface);

        let grade = self.time_of_day.grade();
        if self.config.lighting {
            self.lighting
                .compose(&mut self.surface, self.config.ambient, &self.lights, (tx, ty));
        }
        if self.config.vignette {
            postfx::vignette(&mut self.surface, grade.vignette);
        }
        if self.config.color_grade {
            postfx::color_grade(&mut self.surface, grade.tint);
        }

        let hud_data = self.hud_data();
        self.hud.draw(&mut self.surface, &hud_data);

        self.surface.restore();
        self.frames_drawn += 1;
    }

    /// Only tiles overlapping the viewport are drawn
    fn draw_tiles(&mut self, map: &MapView, translation: (f32, f32)) {
        let ts = self.config.tile_size as f32;
        let (w, h) = (self.surface.width() as f32, self.surface.height() as f32);
        let x0 = ((-translation.0) / ts).floor().max(0.0) as i32;
        let y0 = ((-translation.1) / ts).floor().max(0.0) as i32;
        let x1 = (((w - translation.0) / ts).ceil() as i32).min(map.width);
        let y1 = (((h - translation.1) / ts).ceil() as i32).min(map.height);

        let atlas = self.atlas.as_ref();
        for y in y0..y1 {
            for x in x0..x1 {
                let Some(tile) = map.tile(x, y) else {
                    continue;
                };
                let (px, py) = (x as f32 * ts, y as f32 * ts);
                let drawn = atlas.is_some_and(|a| a.draw_sprite(&mut self.surface, tile.name(), px, py, ts, ts));
                if !drawn {
                    let color = map.tile_definition(tile).color;
                    self.surface.fill_rect(px, py, ts, ts, color);
                }
            }
        }
    }

    fn draw_highlight(&mut self, highlight: Highlight) {
        let ts = self.config.tile_size as f32;
        let line = (ts * 0.06).round().max(2.0);
        let color = highlight.color.unwrap_or(self.highlight_color);
        self.surface.stroke_rect(
            highlight.x as f32 * ts + 2.0,
            highlight.y as f32 * ts + 2.0,
            ts - 4.0,
            ts - 4.0,
            line,
            color,
        );
    }

    fn draw_player(&mut self) {
        let Some(player) = &self.player else {
            return;
        };
        let ts = self.config.tile_size as f32;
        let (px, py) = (player.x as f32 * ts, player.y as f32 * ts);

        let frame = self.animation.frame();
        let drawn = match (self.atlas.as_ref(), frame) {
            (Some(atlas), Some(name)) if atlas.has_frame(name) => {
                atlas.draw_sprite(&mut self.surface, name, px, py, ts, ts)
            }
            _ => false,
        };
        if !drawn {
            let inset = (ts * 0.15).round();
            self.surface
                .fill_rect(px + inset, py + inset, ts - inset * 2.0, ts - inset * 2.0, PLAYER_COLOR);
        }
    }

    fn hud_data(&self) -> HudData {
        let debug = self.debug.then(|| DebugReadout {
            fps: Some(self.fps),
            camera: Some(self.camera.position()),
            time_of_day: Some(self.time_of_day.t()),
            shake: Some(self.camera.offset()),
        });
        HudData {
            fps: self.fps,
            health: self.player.as_ref().map(|p| (p.current_hp, p.max_hp)),
            position: self.player.as_ref().map(|p| (p.x, p.y)),
            resources: self.hud_extras.resources.clone(),
            title: self.hud_extras.title.clone(),
            debug,
        }
    }

    fn player_center(&self) -> Option<(f32, f32)> {
        let player = self.player.as_ref()?;
        let ts = self.config.tile_size as f32;
        Some(((player.x as f32 + 0.5) * ts, (player.y as f32 + 0.5) * ts))
    }

    fn update_camera_bounds(&mut self) {
        match &self.map {
            Some(map) => {
                let ts = self.config.tile_size as f32;
                self.camera
                    .set_bounds(0.0, 0.0, map.width as f32 * ts, map.height as f32 * ts);
            }
            None => self.camera.set_bounds(
                f32::NEG_INFINITY,
                f32::NEG_INFINITY,
                f32::INFINITY,
                f32::INFINITY,
            ),
        }
    }

    fn sync_animation(&mut self) {
        let mode = if self.active_directions.is_empty() { "idle" } else { "walk" };
        let state = format!("{}_{}", mode, self.current_direction.name());
        self.animation.set_state(&state);
    }
}

/// Flat-colour stand-in art for every tile type and NPCs
pub fn placeholder_atlas(tile_size: u32) -> Atlas {
    let mut names: Vec<(&str, Color)> = TileType::ALL.iter().map(|t| (t.name(), t.color())).collect();
    names.push((NPC_SPRITE, NPC_COLOR));
    Atlas::placeholder(&names, tile_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::SteppedHost;
    use crate::render::entity::SpriteEntity;

    fn small_config() -> RenderConfig {
        RenderConfig {
            viewport_width: 160,
            viewport_height: 120,
            tile_size: 16,
            ..Default::default()
        }
    }

    fn engine_with(host: &SteppedHost) -> RenderEngine {
        let mut engine = RenderEngine::new(small_config(), Box::new(host.clone()))
            .unwrap()
            .with_seed(1);
        engine.set_atlas(placeholder_atlas(16));
        engine
    }

    fn demo_map() -> Rc<MapView> {
        Rc::new(MapView::filled("Field", 20, 15, TileType::Grass))
    }

    /// Deliver pending frames every 16ms
    fn pump(host: &SteppedHost, engine: &mut RenderEngine, frames: usize) {
        for _ in 0..frames {
            host.advance(16.0);
            if let Some(ts) = host.take_frame() {
                engine.on_frame(ts);
            }
        }
    }

    #[test]
    fn test_start_twice_registers_once() {
        let host = SteppedHost::new(0.0);
        let mut engine = engine_with(&host);
        engine.start();
        engine.start();
        assert_eq!(host.requests(), 1);
        assert!(engine.is_running());
    }

    #[test]
    fn test_stop_then_start_resumes_with_fresh_origin() {
        let host = SteppedHost::new(0.0);
        let mut engine = engine_with(&host);
        engine.render(Some(demo_map()), Some(PlayerView::new(3, 3)), RenderOptions::default());
        engine.start();
        pump(&host, &mut engine, 3);
        assert_eq!(engine.frames_drawn(), 3);

        engine.stop();
        host.advance(5000.0);
        engine.start();
        // The callback queued before stop is still pending: no second loop
        assert_eq!(host.requests(), 4);
        pump(&host, &mut engine, 2);
        assert_eq!(engine.frames_drawn(), 5);
        assert_eq!(host.requests(), 6);
        assert!(engine.fps() > 0.0);
    }

    #[test]
    fn test_callback_after_stop_is_noop() {
        let host = SteppedHost::new(0.0);
        let mut engine = engine_with(&host);
        engine.start();
        engine.stop();
        pump(&host, &mut engine, 1);
        assert_eq!(engine.frames_drawn(), 0);
        assert!(!host.has_pending());
    }

    #[test]
    fn test_inert_until_assets_load() {
        let host = SteppedHost::new(0.0);
        let mut engine = RenderEngine::new(small_config(), Box::new(host.clone())).unwrap();
        engine.render(Some(demo_map()), Some(PlayerView::new(1, 1)), RenderOptions::default());
        engine.start();
        pump(&host, &mut engine, 2);
        assert!(!engine.assets_loaded());
        assert_eq!(engine.surface().draw_calls(), 0);
        assert!(engine.is_running());
    }

    #[test]
    fn test_failed_load_with_placeholders() {
        let host = SteppedHost::new(0.0);
        let config = RenderConfig { placeholder_assets: true, ..small_config() };
        let mut engine = RenderEngine::new(config, Box::new(host.clone())).unwrap();
        engine.pending_atlas = Some(PendingAtlas::ready(Err(crate::error::LoadError::MissingImage)));
        engine.poll_assets();
        assert!(engine.assets_loaded());
        assert!(engine.atlas().is_some_and(|a| a.has_frame("grass")));
    }

    #[test]
    fn test_failed_load_without_placeholders_stays_inert() {
        let host = SteppedHost::new(0.0);
        let mut engine = RenderEngine::new(small_config(), Box::new(host.clone())).unwrap();
        engine.pending_atlas = Some(PendingAtlas::ready(Err(crate::error::LoadError::MissingImage)));
        engine.poll_assets();
        assert!(!engine.assets_loaded());
    }

    #[test]
    fn test_movement_intents() {
        let host = SteppedHost::new(0.0);
        let mut engine = engine_with(&host);
        engine.set_player_movement(Direction::East, true);
        engine.set_player_movement(Direction::North, true);
        assert_eq!(engine.current_direction(), Direction::North);
        assert_eq!(engine.animation().state(), "walk_north");

        engine.set_player_movement(Direction::North, false);
        assert_eq!(engine.current_direction(), Direction::East);
        assert_eq!(engine.animation().state(), "walk_east");

        engine.set_player_movement(Direction::East, false);
        assert!(!engine.is_moving());
        assert_eq!(engine.animation().state(), "idle_east");
        assert_eq!(engine.animation().frame().map(String::as_str), Some("player_east_1"));
    }

    #[test]
    fn test_walk_cycle_advances_on_frame_clock() {
        let host = SteppedHost::new(0.0);
        let mut engine = engine_with(&host);
        engine.render(Some(demo_map()), Some(PlayerView::new(3, 3)), RenderOptions::default());
        engine.set_player_movement(Direction::South, true);
        engine.update(140.0);
        assert_eq!(engine.animation().frame().map(String::as_str), Some("player_south_2"));

        engine.stop_all_movement();
        assert_eq!(engine.animation().frame().map(String::as_str), Some("player_south_1"));
    }

    #[test]
    fn test_map_swap_halts_movement() {
        let host = SteppedHost::new(0.0);
        let mut engine = engine_with(&host);
        let player = PlayerView::new(2, 2);
        engine.render(Some(demo_map()), Some(player.clone()), RenderOptions::default());
        engine.set_player_movement(Direction::West, true);

        engine.render(Some(demo_map()), Some(player), RenderOptions::default());
        assert!(!engine.is_moving());
    }

    #[test]
    fn test_same_map_keeps_movement() {
        let host = SteppedHost::new(0.0);
        let mut engine = engine_with(&host);
        let map = demo_map();
        let player = PlayerView::new(2, 2);
        engine.render(Some(Rc::clone(&map)), Some(player.clone()), RenderOptions::default());
        engine.set_player_movement(Direction::West, true);
        engine.render(Some(map), Some(player), RenderOptions::default());
        assert!(engine.is_moving());
    }

    #[test]
    fn test_highlight_expires_on_frame_clock() {
        let host = SteppedHost::new(0.0);
        let mut engine = engine_with(&host);
        let options = RenderOptions {
            highlight: Some(Highlight::new(1, 1).expiring_at(40.0)),
            ..Default::default()
        };
        engine.render(Some(demo_map()), Some(PlayerView::new(1, 1)), options);
        engine.start();
        pump(&host, &mut engine, 2);
        assert!(engine.highlight().is_some());
        pump(&host, &mut engine, 1);
        assert!(engine.highlight().is_none());
    }

    #[test]
    fn test_props_sorted_and_snapshot_kept_when_unchanged() {
        let host = SteppedHost::new(0.0);
        let mut engine = engine_with(&host);
        let objects: Vec<SceneEntity> = vec![
            SpriteEntity::new(4.0, 5.0).with_sprite("chest").into(),
            SpriteEntity::new(1.0, 2.0).with_sprite("barrel").into(),
        ];
        let options = RenderOptions { objects: objects.clone(), ..Default::default() };
        engine.render(Some(demo_map()), None, options);
        assert_eq!(engine.objects()[0].position(), Some((1.0, 2.0)));

        let first = engine.objects().as_ptr();
        engine.render(engine.map.clone(), None, RenderOptions { objects, ..Default::default() });
        assert_eq!(engine.objects().as_ptr(), first);
    }

    #[test]
    fn test_tile_at_screen_uses_map_rect() {
        let host = SteppedHost::new(0.0);
        let mut engine = engine_with(&host);
        // 5x4 map of 16px tiles is smaller than the 160x120 view and gets centred
        let map = Rc::new(MapView::filled("Hut", 5, 4, TileType::CastleFloor));
        engine.render(Some(map), Some(PlayerView::new(2, 2)), RenderOptions::default());
        engine.update(16.0);
        engine.draw();

        let rect = engine.map_screen_rect().unwrap();
        assert_eq!(rect, MapRect { x: 40.0, y: 28.0, width: 80.0, height: 64.0 });
        assert_eq!(engine.tile_at_screen(41.0, 29.0), Some((0, 0)));
        assert_eq!(engine.tile_at_screen(119.0, 91.0), Some((4, 3)));
        assert_eq!(engine.tile_at_screen(10.0, 10.0), None);
    }

    #[test]
    fn test_draw_without_atlas_frames_uses_flat_colours() {
        let host = SteppedHost::new(0.0);
        let config = RenderConfig {
            lighting: false,
            vignette: false,
            color_grade: false,
            ..small_config()
        };
        let mut engine = RenderEngine::new(config, Box::new(host.clone())).unwrap();
        engine.set_atlas(Atlas::new(image::RgbaImage::new(1, 1), Vec::new()));
        let map = Rc::new(MapView::filled("Lake", 10, 8, TileType::Water));
        engine.render(Some(map), None, RenderOptions::default());
        engine.update(16.0);
        engine.draw();

        // Centre of the screen is water, clear of the HUD panel
        let p = engine.surface().pixel(80, 100).unwrap();
        assert_eq!((p[0], p[1], p[2]), (0x26, 0x4c, 0x7d));
    }

    #[test]
    fn test_resize_and_debug_never_fail() {
        let host = SteppedHost::new(0.0);
        let mut engine = engine_with(&host);
        engine.resize(0, 0);
        assert_eq!((engine.surface().width(), engine.surface().height()), (1, 1));
        engine.set_debug(true);
        engine.render(Some(demo_map()), Some(PlayerView::new(0, 0)), RenderOptions::default());
        engine.update(16.0);
        engine.draw();
        engine.resize(200, 100);
        engine.draw();
        assert_eq!(engine.surface().width(), 200);
    }

    #[test]
    fn test_reseeding_keeps_camera_bounds() {
        let host = SteppedHost::new(0.0);
        let mut engine = engine_with(&host);
        engine.render(Some(demo_map()), Some(PlayerView::new(3, 3)), RenderOptions::default());
        let bounds = engine.camera().bounds();
        assert_eq!(bounds.max_x, 320.0);

        let engine = engine.with_seed(9);
        assert_eq!(engine.camera().bounds(), bounds);
    }

    #[test]
    fn test_empty_animation_table_is_config_error() {
        let host = SteppedHost::new(0.0);
        let config = RenderConfig { animations: Default::default(), ..small_config() };
        assert!(matches!(
            RenderEngine::new(config, Box::new(host)),
            Err(ConfigError::EmptyAnimationTable)
        ));
    }
}
