//! World module
//!
//! Read-only views of the game state that the renderer draws each frame.

pub mod map;
pub mod player;
pub mod tile;

pub use map::MapView;
pub use player::{Direction, PlayerView};
pub use tile::{TileDefinition, TileType};
