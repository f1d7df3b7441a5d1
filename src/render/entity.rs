//! World entities drawn between the map and the player
//!
//! Props and NPCs are either plain sprites or custom drawers. Both are
//! read-only views supplied by the game each frame.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use super::atlas::Atlas;
use crate::surface::{Color, Surface};

/// Fallback colour for props with no sprite frame
pub const PROP_COLOR: Color = Color::rgb(0x8c, 0x78, 0x53);
/// Fallback colour for NPCs with no sprite frame
pub const NPC_COLOR: Color = Color::rgb(0xcf, 0xa6, 0x58);
/// Frame NPCs use when they name none
pub const NPC_SPRITE: &str = "npc";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Prop,
    Npc,
}

impl EntityKind {
    pub fn default_sprite(&self) -> &'static str {
        match self {
            EntityKind::Prop => super::atlas::DEFAULT_FRAME,
            EntityKind::Npc => NPC_SPRITE,
        }
    }

    pub fn default_color(&self) -> Color {
        match self {
            EntityKind::Prop => PROP_COLOR,
            EntityKind::Npc => NPC_COLOR,
        }
    }
}

/// Atlas and tile metrics handed to custom drawers
pub struct DrawHelpers<'a> {
    pub atlas: Option<&'a Atlas>,
    pub tile_size: f32,
    pub fallback: Color,
}

impl DrawHelpers<'_> {
    /// Draw an atlas frame; `false` when neither it nor `default` exists
    pub fn draw_sprite(&self, surface: &mut Surface, name: &str, dx: f32, dy: f32, dw: f32, dh: f32) -> bool {
        self.atlas.is_some_and(|a| a.draw_sprite(surface, name, dx, dy, dw, dh))
    }

    /// Draw one tile-sized frame at tile coordinates, filling flat on a miss
    pub fn draw_tile(&self, surface: &mut Surface, x: f32, y: f32, name: &str) -> bool {
        let (px, py, s) = (x * self.tile_size, y * self.tile_size, self.tile_size);
        if self.draw_sprite(surface, name, px, py, s, s) {
            return true;
        }
        surface.fill_rect(px, py, s, s, self.fallback);
        false
    }
}

/// Composite entity that renders itself
pub trait CustomDraw {
    /// Tile position used for draw ordering; `None` draws before positioned entities
    fn position(&self) -> Option<(f32, f32)> {
        None
    }

    /// Height in tiles, used with `position` for draw ordering
    fn height(&self) -> f32 {
        1.0
    }

    /// Drawn in world pixels with the camera applied
    fn draw(&self, surface: &mut Surface, helpers: &DrawHelpers<'_>);

    /// Change marker folded into the snapshot signature
    fn signature(&self) -> u64 {
        0
    }
}

/// A prop or NPC drawn from the atlas
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteEntity {
    /// Tile coordinates
    pub x: f32,
    pub y: f32,
    /// Size in tiles
    pub width: f32,
    pub height: f32,
    pub sprite: Option<String>,
    pub color: Option<Color>,
    pub frame: u32,
}

impl SpriteEntity {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            width: 1.0,
            height: 1.0,
            sprite: None,
            color: None,
            frame: 0,
        }
    }

    pub fn with_sprite(mut self, sprite: impl Into<String>) -> Self {
        self.sprite = Some(sprite.into());
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_frame(mut self, frame: u32) -> Self {
        self.frame = frame;
        self
    }
}

#[derive(Clone)]
pub enum SceneEntity {
    Sprite(SpriteEntity),
    Custom(Rc<dyn CustomDraw>),
}

impl fmt::Debug for SceneEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneEntity::Sprite(s) => f.debug_tuple("Sprite").field(s).finish(),
            SceneEntity::Custom(c) => f.debug_tuple("Custom").field(&c.position()).finish(),
        }
    }
}

impl From<SpriteEntity> for SceneEntity {
    fn from(sprite: SpriteEntity) -> Self {
        SceneEntity::Sprite(sprite)
    }
}

impl SceneEntity {
    pub fn custom(drawer: impl CustomDraw + 'static) -> Self {
        SceneEntity::Custom(Rc::new(drawer))
    }

    pub fn position(&self) -> Option<(f32, f32)> {
        match self {
            SceneEntity::Sprite(s) => Some((s.x, s.y)),
            SceneEntity::Custom(c) => c.position(),
        }
    }

    /// Bottom edge then x; unpositioned or non-finite entities sort first
    fn sort_key(&self) -> (f32, f32) {
        let key = match self {
            SceneEntity::Sprite(s) => Some((s.y + s.height, s.x)),
            SceneEntity::Custom(c) => c.position().map(|(x, y)| (y + c.height(), x)),
        };
        match key {
            Some((bottom, x)) if bottom.is_finite() && x.is_finite() => (bottom, x),
            _ => (f32::NEG_INFINITY, f32::NEG_INFINITY),
        }
    }

    /// Draw with the camera already applied
    pub fn draw(&self, surface: &mut Surface, atlas: Option<&Atlas>, tile_size: f32, kind: EntityKind) {
        match self {
            SceneEntity::Sprite(s) => {
                if !s.x.is_finite() || !s.y.is_finite() {
                    return;
                }
                let name = s.sprite.as_deref().unwrap_or(kind.default_sprite());
                let (px, py) = (s.x * tile_size, s.y * tile_size);
                let (w, h) = (s.width.max(0.0) * tile_size, s.height.max(0.0) * tile_size);
                let drawn = atlas.is_some_and(|a| a.draw_sprite(surface, name, px, py, w, h));
                if !drawn {
                    surface.fill_rect(px, py, w, h, s.color.unwrap_or(kind.default_color()));
                }
            }
            SceneEntity::Custom(c) => {
                let helpers = DrawHelpers {
                    atlas,
                    tile_size,
                    fallback: kind.default_color(),
                };
                c.draw(surface, &helpers);
            }
        }
    }
}

/// Stable sort into draw order
pub fn sort_for_drawing(entities: &mut [SceneEntity]) {
    entities.sort_by(|a, b| {
        let (ay, ax) = a.sort_key();
        let (by, bx) = b.sort_key();
        ay.total_cmp(&by).then(ax.total_cmp(&bx))
    });
}

/// Cheap content hash over position, sprite and frame.
///
/// Only used to skip rebuilding the snapshot; correctness never depends on it.
pub fn signature(entities: &[SceneEntity]) -> u64 {
    let mut hasher = DefaultHasher::new();
    entities.len().hash(&mut hasher);
    for entity in entities {
        match entity {
            SceneEntity::Sprite(s) => {
                0u8.hash(&mut hasher);
                s.x.to_bits().hash(&mut hasher);
                s.y.to_bits().hash(&mut hasher);
                s.width.to_bits().hash(&mut hasher);
                s.height.to_bits().hash(&mut hasher);
                s.sprite.hash(&mut hasher);
                s.color.map(|c| c.to_string()).hash(&mut hasher);
                s.frame.hash(&mut hasher);
            }
            SceneEntity::Custom(c) => {
                1u8.hash(&mut hasher);
                c.position().map(|(x, y)| (x.to_bits(), y.to_bits())).hash(&mut hasher);
                c.signature().hash(&mut hasher);
            }
        }
    }
    hasher.finish()
}
