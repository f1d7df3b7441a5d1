//! Renderer configuration
//!
//! Loaded from RON with every field defaulted, so a config file only needs
//! the values it changes.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::render::animation::{AnimationDefinition, AnimationTable};
use crate::render::atlas::player_frame_name;
use crate::surface::Color;
use crate::world::Direction;

/// Project-relative config location, checked first
pub const LOCAL_CONFIG_PATH: &str = "assets/config/render.ron";

const DEFAULT_WALK_FRAME_MS: f64 = 130.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Logical viewport size
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Tile edge in logical pixels
    pub tile_size: u32,
    /// Raw display pixel ratio; 1.5 and above renders at 2x
    pub display_ratio: f32,
    /// Frame deltas above this are clamped
    pub max_frame_delta_ms: f64,
    pub camera_lerp: f32,
    pub particle_capacity: usize,
    /// Duration of one walk-cycle frame
    pub walk_frame_ms: f64,
    pub background: Color,
    pub highlight: Color,
    /// Darkness laid over the world before lights cut through it
    pub ambient: Color,
    pub lighting: bool,
    pub vignette: bool,
    pub color_grade: bool,
    pub time_of_day_speed: f32,
    pub debug: bool,
    pub atlas_timeout_ms: u64,
    /// Substitute generated art when an atlas fails to load
    pub placeholder_assets: bool,
    /// Player animation states, keyed `idle_<dir>` and `walk_<dir>`
    pub animations: AnimationTable<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        let walk_frame_ms = DEFAULT_WALK_FRAME_MS;
        Self {
            viewport_width: 800,
            viewport_height: 450,
            tile_size: 48,
            display_ratio: 1.0,
            max_frame_delta_ms: 100.0,
            camera_lerp: 0.15,
            particle_capacity: 256,
            walk_frame_ms,
            background: Color::rgb(0x05, 0x07, 0x0d),
            highlight: Color::rgb(0xff, 0xe0, 0x66),
            ambient: Color::rgba(6, 8, 20, 0.45),
            lighting: true,
            vignette: true,
            color_grade: true,
            time_of_day_speed: 0.05,
            debug: false,
            atlas_timeout_ms: 5000,
            placeholder_assets: false,
            animations: default_animation_table(walk_frame_ms),
        }
    }
}

/// Idle and walk states for each direction of the player sheet.
///
/// The walk cycle starts on the idle column so the first step reads as motion.
pub fn default_animation_table(walk_frame_ms: f64) -> AnimationTable<String> {
    let fps = if walk_frame_ms > 0.0 { 1000.0 / walk_frame_ms } else { 0.0 };
    let mut table = AnimationTable::new();
    for dir in Direction::ALL {
        table.insert(
            format!("idle_{}", dir.name()),
            AnimationDefinition::still(player_frame_name(dir, 1)),
        );
        table.insert(
            format!("walk_{}", dir.name()),
            AnimationDefinition::new(
                vec![
                    player_frame_name(dir, 1),
                    player_frame_name(dir, 2),
                    player_frame_name(dir, 0),
                ],
                fps,
            ),
        );
    }
    table
}

impl RenderConfig {
    /// Read a RON config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = ron::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Loaded render config from {:?}", path);
        Ok(config.sanitized())
    }

    /// Search the project directory, then the user config directory
    pub fn load_or_default() -> Self {
        let candidates = std::iter::once(PathBuf::from(LOCAL_CONFIG_PATH)).chain(user_config_path());
        for path in candidates {
            if !path.exists() {
                continue;
            }
            match Self::load(&path) {
                Ok(config) => return config,
                Err(e) => log::warn!("{}; using defaults", e),
            }
        }
        log::debug!("No render config found, using defaults");
        Self::default()
    }

    /// Write the defaults as pretty RON
    pub fn export_default(path: &Path) -> Result<(), ConfigError> {
        let text = ron::ser::to_string_pretty(&Self::default(), ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Write(e.to_string()))?;
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| ConfigError::Write(format!("{}: {}", dir.display(), e)))?;
        }
        fs::write(path, text).map_err(|e| ConfigError::Write(format!("{}: {}", path.display(), e)))?;
        log::info!("Exported default render config to {:?}", path);
        Ok(())
    }

    /// Replace out-of-range values with defaults
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if self.tile_size == 0 {
            log::warn!("tile_size must be positive, using {}", defaults.tile_size);
            self.tile_size = defaults.tile_size;
        }
        if !self.display_ratio.is_finite() || self.display_ratio <= 0.0 {
            self.display_ratio = defaults.display_ratio;
        }
        if !self.max_frame_delta_ms.is_finite() || self.max_frame_delta_ms <= 0.0 {
            self.max_frame_delta_ms = defaults.max_frame_delta_ms;
        }
        if !self.camera_lerp.is_finite() {
            self.camera_lerp = defaults.camera_lerp;
        }
        if !self.walk_frame_ms.is_finite() || self.walk_frame_ms < 0.0 {
            self.walk_frame_ms = defaults.walk_frame_ms;
        }
        // An untouched table follows the configured walk rate
        if self.walk_frame_ms != DEFAULT_WALK_FRAME_MS && self.animations == defaults.animations {
            self.animations = default_animation_table(self.walk_frame_ms);
        }
        if !self.time_of_day_speed.is_finite() {
            self.time_of_day_speed = defaults.time_of_day_speed;
        }
        self.viewport_width = self.viewport_width.max(1);
        self.viewport_height = self.viewport_height.max(1);
        self.particle_capacity = self.particle_capacity.max(1);
        self
    }
}

/// Per-user config file location
pub fn user_config_path() -> Option<PathBuf> {
    use directories::ProjectDirs;

    ProjectDirs::from("com", "tilelight", "Tilelight").map(|dirs| dirs.config_dir().join("render.ron"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_covers_every_direction() {
        let config = RenderConfig::default();
        for dir in Direction::ALL {
            let walk = &config.animations[&format!("walk_{}", dir.name())];
            assert_eq!(walk.frames.len(), 3);
            assert!((walk.fps - 1000.0 / 130.0).abs() < 1e-9);
            assert_eq!(config.animations[&format!("idle_{}", dir.name())].fps, 0.0);
        }
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: RenderConfig = ron::from_str("(tile_size: 32, debug: true)").unwrap();
        assert_eq!(config.tile_size, 32);
        assert!(config.debug);
        assert_eq!(config.background, Color::rgb(5, 7, 13));
        assert_eq!(config.particle_capacity, 256);
    }

    #[test]
    fn test_walk_frame_ms_drives_default_table() {
        let config: RenderConfig = ron::from_str("(walk_frame_ms: 500.0)").unwrap();
        let config = config.sanitized();
        assert_eq!(config.animations["walk_south"].fps, 2.0);
        assert_eq!(config.animations["idle_south"].fps, 0.0);
    }

    #[test]
    fn test_explicit_table_wins_over_walk_frame_ms() {
        let mut animations = AnimationTable::new();
        animations.insert("idle_south".to_string(), AnimationDefinition::new(vec!["a".to_string()], 4.0));
        let config = RenderConfig { walk_frame_ms: 500.0, animations, ..Default::default() }.sanitized();
        assert_eq!(config.animations.len(), 1);
        assert_eq!(config.animations["idle_south"].fps, 4.0);
    }

    #[test]
    fn test_load_applies_walk_frame_ms() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("render.ron");
        fs::write(&path, "(walk_frame_ms: 250.0)").unwrap();
        let config = RenderConfig::load(&path).unwrap();
        assert_eq!(config.animations["walk_north"].fps, 4.0);
    }

    #[test]
    fn test_export_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("render.ron");
        RenderConfig::export_default(&path).unwrap();

        let loaded = RenderConfig::load(&path).unwrap();
        assert_eq!(loaded, RenderConfig::default());
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = RenderConfig::load(&dir.path().join("none.ron"));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));

        let bad = dir.path().join("bad.ron");
        fs::write(&bad, "(tile_size: \"big\")").unwrap();
        assert!(matches!(RenderConfig::load(&bad), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_sanitized_replaces_invalid_values() {
        let config = RenderConfig {
            tile_size: 0,
            max_frame_delta_ms: -5.0,
            viewport_width: 0,
            particle_capacity: 0,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(config.tile_size, 48);
        assert_eq!(config.max_frame_delta_ms, 100.0);
        assert_eq!(config.viewport_width, 1);
        assert_eq!(config.particle_capacity, 1);
    }
}
