//! Tilelight - real-time presentation layer for a 2D tile RPG
//!
//! The game owns the world; tilelight draws it. Each frame the engine
//! composes tiles, props, NPCs and the player under a following camera,
//! then lays lighting, vignette, colour grading and the HUD on top.

pub mod data;
pub mod error;
pub mod host;
pub mod render;
pub mod surface;
pub mod world;

// Re-export commonly used types
pub use data::RenderConfig;
pub use error::{ConfigError, LoadError};
pub use host::{FrameHost, SteppedHost};
pub use render::{RenderEngine, RenderOptions};
pub use surface::{Color, Surface};
pub use world::{Direction, MapView, PlayerView, TileType};
