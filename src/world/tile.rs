//! Tile definitions
//!
//! Tile-type identifiers as the game-state collaborator supplies them, and
//! the flat fallback colour used when no sprite frame exists.

use serde::{Deserialize, Serialize};

use crate::surface::Color;

/// Types of tiles in the overworld and castle maps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileType {
    // Terrain
    Grass,
    Trees,
    Water,
    Path,
    Courtyard,

    // Castle architecture
    CastleFloor,
    CastleWall,
    CastleDoor,
    CastleWindow,
    RedCarpet,

    // Transitions
    CaveEntrance,
    CaveExit,
}

/// Rendering-relevant facts about a tile type
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileDefinition {
    pub color: Color,
}

impl TileType {
    pub const ALL: [TileType; 12] = [
        TileType::Grass,
        TileType::Trees,
        TileType::Water,
        TileType::Path,
        TileType::Courtyard,
        TileType::CastleFloor,
        TileType::CastleWall,
        TileType::CastleDoor,
        TileType::CastleWindow,
        TileType::RedCarpet,
        TileType::CaveEntrance,
        TileType::CaveExit,
    ];

    /// Atlas frame name for this tile
    pub fn name(&self) -> &'static str {
        match self {
            TileType::Grass => "grass",
            TileType::Trees => "trees",
            TileType::Water => "water",
            TileType::Path => "path",
            TileType::Courtyard => "courtyard",
            TileType::CastleFloor => "castle_floor",
            TileType::CastleWall => "castle_wall",
            TileType::CastleDoor => "castle_door",
            TileType::CastleWindow => "castle_window",
            TileType::RedCarpet => "red_carpet",
            TileType::CaveEntrance => "cave_entrance",
            TileType::CaveExit => "cave_exit",
        }
    }

    /// Flat colour drawn when the atlas has no frame for this tile
    pub fn color(&self) -> Color {
        match self {
            TileType::Grass => Color::rgb(0x3b, 0x7f, 0x3a),
            TileType::Trees => Color::rgb(0x1f, 0x3d, 0x1b),
            TileType::Water => Color::rgb(0x26, 0x4c, 0x7d),
            TileType::Path => Color::rgb(0x9f, 0x88, 0x4f),
            TileType::Courtyard | TileType::CastleFloor => Color::rgb(0x55, 0x55, 0x55),
            TileType::CastleWall => Color::rgb(0x33, 0x33, 0x33),
            TileType::CastleDoor => Color::rgb(0x6b, 0x4a, 0x2b),
            TileType::CastleWindow => Color::rgb(0x4a, 0x5a, 0x6a),
            TileType::RedCarpet => Color::rgb(0x8b, 0x00, 0x00),
            TileType::CaveEntrance | TileType::CaveExit => Color::rgb(0x4b, 0x3b, 0x32),
        }
    }

    pub fn definition(&self) -> TileDefinition {
        TileDefinition { color: self.color() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<_> = TileType::ALL.iter().map(|t| t.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), TileType::ALL.len());
    }

    #[test]
    fn test_serde_uses_frame_names() {
        let text = ron::to_string(&TileType::CastleFloor).unwrap();
        assert_eq!(text, "castle_floor");
    }
}
