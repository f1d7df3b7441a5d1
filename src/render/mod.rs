//! Rendering layer
//!
//! Everything between the game's published state and the finished frame:
//! - Atlas loading and sprite lookup
//! - Camera follow and shake
//! - Player animation state machine
//! - Particles, flashes and post-processing
//! - HUD overlay
//! - The engine that drives them from the host's frame callback

pub mod animation;
pub mod atlas;
pub mod camera;
pub mod engine;
pub mod entity;
pub mod flash;
pub mod hud;
pub mod loader;
pub mod particles;
pub mod postfx;
pub mod time_of_day;

pub use animation::{AnimFsm, AnimationDefinition, AnimationTable};
pub use atlas::{Atlas, AtlasFrame};
pub use camera::{Camera, CameraBounds, CameraState};
pub use engine::{Highlight, HudExtras, MapRect, RenderEngine, RenderOptions};
pub use entity::{CustomDraw, DrawHelpers, EntityKind, SceneEntity, SpriteEntity};
pub use flash::FlashLayer;
pub use hud::{DebugReadout, Hud, HudData, HudLayout};
pub use loader::{AtlasOutcome, PendingAtlas};
pub use particles::{Particle, ParticleEmitter, SpawnOptions};
pub use postfx::{LightSource, Lighting};
pub use time_of_day::{Grade, TimeOfDay};
