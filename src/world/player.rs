//! Player view
//!
//! Position is in tile units; hit points are display-only.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Cardinal facing and movement direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    North,
    #[default]
    South,
    East,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::South, Direction::West, Direction::East, Direction::North];

    /// Row of this direction in the player walk sheet
    pub fn row(&self) -> u32 {
        match self {
            Direction::South => 0,
            Direction::West => 1,
            Direction::East => 2,
            Direction::North => 3,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::South => "south",
            Direction::East => "east",
            Direction::West => "west",
        }
    }

    /// Unit step in tile coordinates (y grows southwards)
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::South => (0, 1),
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "north" | "up" | "n" => Ok(Direction::North),
            "south" | "down" | "s" => Ok(Direction::South),
            "east" | "right" | "e" => Ok(Direction::East),
            "west" | "left" | "w" => Ok(Direction::West),
            other => Err(format!("unknown direction: {}", other)),
        }
    }
}

/// What the renderer needs to know about the player this frame
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerView {
    pub x: i32,
    pub y: i32,
    pub facing: Direction,
    pub current_hp: i32,
    pub max_hp: i32,
}

impl PlayerView {
    pub fn new(x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            facing: Direction::South,
            current_hp: 100,
            max_hp: 100,
        }
    }

    pub fn with_facing(mut self, facing: Direction) -> Self {
        self.facing = facing;
        self
    }

    pub fn with_hp(mut self, current: i32, max: i32) -> Self {
        self.current_hp = current;
        self.max_hp = max;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheet_rows() {
        let rows: Vec<u32> = Direction::ALL.iter().map(Direction::row).collect();
        assert_eq!(rows, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_parse_direction() {
        assert_eq!("Up".parse::<Direction>(), Ok(Direction::North));
        assert_eq!("west".parse::<Direction>(), Ok(Direction::West));
        assert!("diagonal".parse::<Direction>().is_err());
    }
}
