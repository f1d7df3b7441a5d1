//! Tilelight - headless demo
//!
//! Renders a small castle courtyard for a number of frames on a stepped
//! clock and writes the last frame to a PNG.
//!
//! Usage: tilelight [frames] [out.png] [atlas.json]

use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;

use tilelight::render::engine::placeholder_atlas;
use tilelight::render::{
    CustomDraw, DrawHelpers, HudExtras, LightSource, RenderEngine, RenderOptions, SceneEntity, SpriteEntity,
};
use tilelight::surface::{Color, Surface};
use tilelight::world::{Direction, MapView, PlayerView, TileType};
use tilelight::{RenderConfig, SteppedHost};

/// Frame interval of the stepped clock
const FRAME_MS: f64 = 1000.0 / 60.0;

/// A brazier drawn without an atlas frame
struct Brazier {
    x: f32,
    y: f32,
}

impl CustomDraw for Brazier {
    fn position(&self) -> Option<(f32, f32)> {
        Some((self.x, self.y))
    }

    fn draw(&self, surface: &mut Surface, helpers: &DrawHelpers) {
        let ts = helpers.tile_size;
        let (cx, cy) = ((self.x + 0.5) * ts, (self.y + 0.5) * ts);
        surface.fill_rect(cx - ts * 0.2, cy, ts * 0.4, ts * 0.35, Color::rgb(0x3a, 0x2e, 0x26));
        surface.fill_circle(cx, cy - ts * 0.05, ts * 0.18, Color::rgb(0xff, 0x9a, 0x3c));
    }

    fn signature(&self) -> u64 {
        ((self.x as u64) << 32) | self.y as u64
    }
}

fn demo_map() -> MapView {
    let (w, h) = (24, 18);
    let mut map = MapView::filled("Castle Courtyard", w, h, TileType::Grass);
    for y in 0..h {
        for x in 0..w {
            let tile = if x == 0 || y == 0 || x == w - 1 || y == h - 1 {
                TileType::Trees
            } else if (4..=19).contains(&x) && (3..=12).contains(&y) {
                if x == 4 || x == 19 || y == 3 {
                    TileType::CastleWall
                } else if x == 11 && y == 12 {
                    TileType::CastleDoor
                } else if y == 12 {
                    TileType::CastleWall
                } else if x == 11 || x == 12 {
                    TileType::RedCarpet
                } else {
                    TileType::CastleFloor
                }
            } else if (11..=12).contains(&x) && y > 12 {
                TileType::Path
            } else if (17..=21).contains(&x) && (14..=16).contains(&y) {
                TileType::Water
            } else {
                continue;
            };
            map.set_tile(x, y, tile);
        }
    }
    map.set_tile(8, 3, TileType::CastleWindow);
    map.set_tile(15, 3, TileType::CastleWindow);
    map
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Starting Tilelight v{}", env!("CARGO_PKG_VERSION"));

    let mut args = std::env::args().skip(1);
    let frames: u32 = match args.next() {
        Some(n) => n.parse().with_context(|| format!("invalid frame count {:?}", n))?,
        None => 240,
    };
    let out = PathBuf::from(args.next().unwrap_or_else(|| "tilelight.png".to_string()));
    let atlas_meta = args.next().map(PathBuf::from);

    let config = RenderConfig::load_or_default();
    let tile_size = config.tile_size;
    let host = SteppedHost::new(0.0);
    let mut engine = RenderEngine::new(config, Box::new(host.clone()))
        .context("failed to build render engine")?
        .with_seed(7);

    match atlas_meta {
        Some(meta) => engine.load_atlas(None, meta),
        None => engine.set_atlas(placeholder_atlas(tile_size)),
    }

    let map = Rc::new(demo_map());
    let ts = tile_size as f32;
    let light_at = |x: f32, y: f32, color: Color| LightSource::new((x + 0.5) * ts, (y + 0.5) * ts, ts * 3.0, color);
    let lights = vec![
        light_at(6.0, 5.0, Color::rgb(0xff, 0xb8, 0x6c)),
        light_at(17.0, 5.0, Color::rgb(0xff, 0xb8, 0x6c)),
        light_at(11.5, 14.0, Color::rgb(0x9c, 0xc8, 0xff)).with_intensity(0.7),
    ];
    let objects: Vec<SceneEntity> = vec![
        SceneEntity::custom(Brazier { x: 6.0, y: 5.0 }),
        SceneEntity::custom(Brazier { x: 17.0, y: 5.0 }),
        SpriteEntity::new(14.0, 7.0).with_sprite("chest").with_color(Color::rgb(0xa0, 0x70, 0x30)).into(),
    ];
    let npcs: Vec<SceneEntity> = vec![SpriteEntity::new(12.0, 5.0).into(), SpriteEntity::new(9.0, 15.0).into()];

    let mut rng = StdRng::seed_from_u64(11);
    let mut player = PlayerView::new(11, 16).with_hp(34, 40).with_facing(Direction::North);
    let mut gold = 120;

    engine.start();
    for frame in 0..frames {
        // Walk north up the path into the hall, one tile every 12 frames
        let walking = frame < 120;
        engine.set_player_movement(Direction::North, walking);
        if walking && frame % 12 == 11 && player.y > 5 {
            player.y -= 1;
        }
        if frame == 90 {
            engine.shake_camera(6.0, 0.3);
            let (cx, cy) = ((player.x as f32 + 0.5) * ts, (player.y as f32 + 0.5) * ts);
            engine.particles_mut().burst(cx, cy, 24, Color::rgb(0xff, 0xd7, 0x00), &mut rng);
            engine.flashes_mut().flash_rect(player.x as f32 * ts, player.y as f32 * ts, ts, ts, 0.5, 80.0);
            gold += 25;
        }

        let options = RenderOptions {
            objects: objects.clone(),
            npcs: npcs.clone(),
            lights: Some(lights.clone()),
            hud: Some(HudExtras {
                resources: vec![("Gold".to_string(), gold.to_string())],
                title: Some(map.name.clone()),
            }),
            ..Default::default()
        };
        engine.render(Some(Rc::clone(&map)), Some(player.clone()), options);

        host.advance(FRAME_MS);
        if let Some(ts) = host.take_frame() {
            engine.on_frame(ts);
        }
    }
    engine.stop();

    if !engine.assets_loaded() {
        log::warn!("No atlas loaded after {} frames; output is blank", frames);
    }
    engine
        .surface()
        .to_image()
        .save(&out)
        .with_context(|| format!("failed to write {}", out.display()))?;
    log::info!("Wrote {} after {} frames ({:.0} fps)", out.display(), engine.frames_drawn(), engine.fps());
    Ok(())
}
