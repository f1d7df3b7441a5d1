//! Map view
//!
//! Read-only projection of the active map handed to the renderer each
//! frame. Layout authoring lives with the game-state collaborator.

use std::collections::HashMap;

use super::tile::{TileDefinition, TileType};
use crate::surface::Color;

/// Tile grid plus the flags the renderer cares about
#[derive(Debug, Clone)]
pub struct MapView {
    pub name: String,
    pub width: i32,
    pub height: i32,
    pub tiles: Vec<TileType>,
    /// Safe zones get a faint light wash over the tiles
    pub safe: bool,
    overrides: HashMap<TileType, TileDefinition>,
}

impl MapView {
    /// Create a map filled with one tile type
    pub fn filled(name: impl Into<String>, width: i32, height: i32, fill: TileType) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            name: name.into(),
            width,
            height,
            tiles: vec![fill; (width * height) as usize],
            safe: false,
            overrides: HashMap::new(),
        }
    }

    /// Build from rows of tiles; short rows are padded with the first tile type seen
    pub fn from_rows(name: impl Into<String>, rows: Vec<Vec<TileType>>) -> Self {
        let height = rows.len() as i32;
        let width = rows.iter().map(Vec::len).max().unwrap_or(0) as i32;
        let pad = rows.iter().flatten().next().copied().unwrap_or(TileType::Grass);
        let mut tiles = Vec::with_capacity((width * height) as usize);
        for row in rows {
            let len = row.len();
            tiles.extend(row);
            tiles.extend(std::iter::repeat(pad).take(width as usize - len));
        }
        Self {
            name: name.into(),
            width,
            height,
            tiles,
            safe: false,
            overrides: HashMap::new(),
        }
    }

    pub fn with_safe(mut self, safe: bool) -> Self {
        self.safe = safe;
        self
    }

    /// Override the fallback colour for one tile type on this map
    pub fn with_tile_color(mut self, tile: TileType, color: Color) -> Self {
        self.overrides.insert(tile, TileDefinition { color });
        self
    }

    /// Convert 2D coordinates to 1D index
    #[inline]
    pub fn xy_to_idx(&self, x: i32, y: i32) -> usize {
        (y * self.width + x) as usize
    }

    /// Check if coordinates are within bounds
    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width && y >= 0 && y < self.height
    }

    pub fn tile(&self, x: i32, y: i32) -> Option<TileType> {
        if self.in_bounds(x, y) {
            self.tiles.get(self.xy_to_idx(x, y)).copied()
        } else {
            None
        }
    }

    pub fn set_tile(&mut self, x: i32, y: i32, tile: TileType) {
        if !self.in_bounds(x, y) {
            return;
        }
        let idx = self.xy_to_idx(x, y);
        if let Some(slot) = self.tiles.get_mut(idx) {
            *slot = tile;
        }
    }

    /// Fallback colour lookup used when the atlas has no frame for a tile
    pub fn tile_definition(&self, tile: TileType) -> TileDefinition {
        self.overrides.get(&tile).copied().unwrap_or_else(|| tile.definition())
    }
}
