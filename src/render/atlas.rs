//! Sprite atlas
//!
//! One packed image plus a frame-name to rectangle map. Lookups that miss
//! return `false` so callers can fall back to a flat colour.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::{Rgba, RgbaImage};
use serde::Deserialize;
use serde_json::Value;

use crate::error::LoadError;
use crate::surface::{Color, Surface};
use crate::world::Direction;

/// Reserved frame used when a lookup misses
pub const DEFAULT_FRAME: &str = "default";

/// Columns per direction row in the player walk sheet
pub const PLAYER_SHEET_COLUMNS: u32 = 3;

/// Atlas frame name for one cell of the player walk sheet
pub fn player_frame_name(direction: Direction, column: u32) -> String {
    format!("player_{}_{}", direction.name(), column)
}

/// A named sub-rectangle of the packed image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtlasFrame {
    pub name: String,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl AtlasFrame {
    pub fn new(name: impl Into<String>, x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { name: name.into(), x, y, w, h }
    }

    fn fits(&self, width: u32, height: u32) -> bool {
        self.w > 0
            && self.h > 0
            && self.x.checked_add(self.w).is_some_and(|r| r <= width)
            && self.y.checked_add(self.h).is_some_and(|b| b <= height)
    }
}

#[derive(Debug, Deserialize)]
struct RawRect {
    x: i64,
    y: i64,
    w: i64,
    h: i64,
}

/// Loaded atlas: immutable once built
#[derive(Debug, Clone)]
pub struct Atlas {
    image: RgbaImage,
    frames: HashMap<String, AtlasFrame>,
}

impl Atlas {
    /// Build from an image and frame list, dropping frames outside the image
    pub fn new(image: RgbaImage, frames: impl IntoIterator<Item = AtlasFrame>) -> Self {
        let (width, height) = image.dimensions();
        let mut map = HashMap::new();
        for frame in frames {
            if frame.fits(width, height) {
                map.insert(frame.name.clone(), frame);
            } else {
                log::warn!(
                    "Dropping atlas frame {:?}: {}x{}+{}+{} is outside the {}x{} image",
                    frame.name, frame.w, frame.h, frame.x, frame.y, width, height
                );
            }
        }
        Self { image, frames: map }
    }

    /// Load an atlas from a JSON metadata file.
    ///
    /// The image comes from the metadata's `image` field when present,
    /// otherwise from `image_path`.
    pub fn load(image_path: Option<&Path>, meta_path: &Path) -> Result<Self, LoadError> {
        let text = fs::read_to_string(meta_path).map_err(|source| LoadError::Io {
            path: meta_path.to_path_buf(),
            source,
        })?;
        let base_dir = meta_path.parent().unwrap_or_else(|| Path::new(""));
        let fallback = image_path.map(|p| p.to_string_lossy().into_owned());
        Self::from_metadata(&text, meta_path, base_dir, fallback.as_deref())
    }

    /// Parse metadata text and fetch the image it points at
    pub fn from_metadata(
        text: &str,
        meta_path: &Path,
        base_dir: &Path,
        fallback_image: Option<&str>,
    ) -> Result<Self, LoadError> {
        let value: Value = serde_json::from_str(text).map_err(|source| LoadError::Metadata {
            path: meta_path.to_path_buf(),
            source,
        })?;

        let image_field = match value.get("image") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Array(parts)) => Some(parts.iter().filter_map(Value::as_str).collect::<String>()),
            _ => None,
        };
        let frames_value = match value {
            Value::Object(mut obj) if obj.contains_key("frames") => obj.remove("frames").unwrap_or(Value::Null),
            other => other,
        };
        let raw: HashMap<String, RawRect> =
            serde_json::from_value(frames_value).map_err(|source| LoadError::Metadata {
                path: meta_path.to_path_buf(),
                source,
            })?;

        let source = image_field
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .or_else(|| fallback_image.map(str::trim).filter(|s| !s.is_empty()))
            .ok_or(LoadError::MissingImage)?;
        let image = load_image_source(source, base_dir)?;

        let frames = raw.into_iter().filter_map(|(name, r)| {
            if r.x < 0 || r.y < 0 || r.w <= 0 || r.h <= 0 {
                log::warn!("Dropping atlas frame {:?} with invalid rect", name);
                return None;
            }
            let to_u32 = |v: i64| u32::try_from(v).ok();
            Some(AtlasFrame::new(name, to_u32(r.x)?, to_u32(r.y)?, to_u32(r.w)?, to_u32(r.h)?))
        });

        let atlas = Self::new(image, frames);
        log::info!(
            "Loaded atlas {:?} ({} frames, {}x{})",
            meta_path,
            atlas.len(),
            atlas.image.width(),
            atlas.image.height()
        );
        Ok(atlas)
    }

    /// Generate a flat-colour atlas plus a player walk sheet.
    ///
    /// Each named colour becomes one `tile_size` square frame; the walk sheet
    /// adds `player_<direction>_<column>` frames.
    pub fn placeholder(names: &[(&str, Color)], tile_size: u32) -> Self {
        let size = tile_size.max(1);
        let cols = PLAYER_SHEET_COLUMNS.max(names.len() as u32);
        let tile_rows = (names.len() as u32).div_ceil(cols);
        let width = cols * size;
        let height = (tile_rows + 4) * size;
        let mut image = RgbaImage::new(width, height);
        let mut frames = Vec::with_capacity(names.len() + 12);

        for (i, (name, color)) in names.iter().enumerate() {
            let x = (i as u32 % cols) * size;
            let y = (i as u32 / cols) * size;
            paint_tile(&mut image, x, y, size, *color);
            frames.push(AtlasFrame::new(*name, x, y, size, size));
        }

        let palette = [
            Color::rgb(0xf7, 0xd7, 0x94),
            Color::rgb(0xff, 0xd1, 0x66),
            Color::rgb(0xf6, 0xc2, 0x70),
            Color::rgb(0xf5, 0xa9, 0x62),
        ];
        let sheet_top = tile_rows * size;
        for dir in Direction::ALL {
            let row = dir.row();
            for col in 0..PLAYER_SHEET_COLUMNS {
                let x = col * size;
                let y = sheet_top + row * size;
                let radius = size as f32 * if col == 1 { 0.36 } else { 0.34 };
                paint_figure(&mut image, x, y, size, radius, palette[row as usize]);
                frames.push(AtlasFrame::new(player_frame_name(dir, col), x, y, size, size));
            }
        }

        log::debug!("Generated placeholder atlas with {} frames", frames.len());
        Self::new(image, frames)
    }

    pub fn frame(&self, name: &str) -> Option<&AtlasFrame> {
        self.frames.get(name)
    }

    pub fn has_frame(&self, name: &str) -> bool {
        self.frames.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn frame_names(&self) -> impl Iterator<Item = &str> {
        self.frames.keys().map(String::as_str)
    }

    /// Draw `name` (or the `default` frame) into the destination rect.
    ///
    /// Returns `false` without drawing when neither frame exists.
    pub fn draw_sprite(&self, surface: &mut Surface, name: &str, dx: f32, dy: f32, dw: f32, dh: f32) -> bool {
        let Some(frame) = self.frames.get(name).or_else(|| self.frames.get(DEFAULT_FRAME)) else {
            return false;
        };
        surface.draw_image_region(
            &self.image,
            frame.x,
            frame.y,
            frame.w,
            frame.h,
            dx.round(),
            dy.round(),
            dw,
            dh,
        );
        true
    }
}

fn paint_tile(image: &mut RgbaImage, x0: u32, y0: u32, size: u32, color: Color) {
    let fill = Rgba([color.r, color.g, color.b, 255]);
    let edge = darken(color, 0.65);
    let line = (size as f32 * 0.05).round().max(1.0) as u32;
    for y in y0..y0 + size {
        for x in x0..x0 + size {
            let border = x - x0 < line || y - y0 < line || x0 + size - x <= line || y0 + size - y <= line;
            image.put_pixel(x, y, if border { edge } else { fill });
        }
    }
}

fn paint_figure(image: &mut RgbaImage, x0: u32, y0: u32, size: u32, radius: f32, color: Color) {
    let backdrop = Rgba([0x1f, 0x1b, 0x24, 255]);
    let body = Rgba([color.r, color.g, color.b, 255]);
    let c = size as f32 / 2.0;
    for y in 0..size {
        for x in 0..size {
            let (dx, dy) = (x as f32 + 0.5 - c, y as f32 + 0.5 - c);
            let px = if dx * dx + dy * dy <= radius * radius { body } else { backdrop };
            image.put_pixel(x0 + x, y0 + y, px);
        }
    }
}

fn darken(color: Color, factor: f32) -> Rgba<u8> {
    let f = |v: u8| (v as f32 * factor).round() as u8;
    Rgba([f(color.r), f(color.g), f(color.b), 255])
}

/// Resolve an image source string and decode it
fn load_image_source(source: &str, base_dir: &Path) -> Result<RgbaImage, LoadError> {
    if let Some(rest) = source.strip_prefix("data:") {
        let bytes = decode_data_uri(rest)?;
        return image::load_from_memory(&bytes)
            .map(|img| img.to_rgba8())
            .map_err(|source| LoadError::Image {
                source_name: "data URI".to_string(),
                source,
            });
    }

    let path = resolve_path(source, base_dir)?;
    image::open(&path)
        .map(|img| img.to_rgba8())
        .map_err(|err| match err {
            image::ImageError::IoError(source) => LoadError::Io { path, source },
            source => LoadError::Image {
                source_name: path.display().to_string(),
                source,
            },
        })
}

fn resolve_path(source: &str, base_dir: &Path) -> Result<PathBuf, LoadError> {
    if let Some(local) = source.strip_prefix("file://") {
        return Ok(PathBuf::from(local));
    }
    if has_scheme(source) || source.starts_with("//") {
        return Err(LoadError::UnsupportedSource(source.to_string()));
    }
    let path = Path::new(source);
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(base_dir.join(path))
    }
}

/// `scheme:` prefix per RFC 3986, excluding single-letter drive prefixes
fn has_scheme(source: &str) -> bool {
    let Some((scheme, _)) = source.split_once(':') else {
        return false;
    };
    scheme.len() > 1
        && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-'))
}

/// Decode the part of a data URI after `data:`
fn decode_data_uri(rest: &str) -> Result<Vec<u8>, LoadError> {
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| LoadError::DataUri("missing ',' separator".to_string()))?;
    if !header.ends_with(";base64") {
        return Err(LoadError::DataUri(format!("unsupported encoding in {:?}", header)));
    }
    BASE64
        .decode(payload.trim())
        .map_err(|e| LoadError::DataUri(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn checker() -> RgbaImage {
        let mut img = RgbaImage::new(4, 2);
        for x in 0..2 {
            for y in 0..2 {
                img.put_pixel(x, y, Rgba([255, 0, 0, 255]));
                img.put_pixel(x + 2, y, Rgba([0, 0, 255, 255]));
            }
        }
        img
    }

    fn png_bytes(img: &RgbaImage) -> Vec<u8> {
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png).unwrap();
        buf
    }

    #[test]
    fn test_unknown_name_without_default_draws_nothing() {
        let atlas = Atlas::new(checker(), [AtlasFrame::new("red", 0, 0, 2, 2)]);
        let mut surface = Surface::new(8, 8, 1).unwrap();

        assert!(!atlas.draw_sprite(&mut surface, "missing", 0.0, 0.0, 8.0, 8.0));
        assert_eq!(surface.draw_calls(), 0);

        assert!(atlas.draw_sprite(&mut surface, "red", 0.0, 0.0, 8.0, 8.0));
        assert_eq!(surface.draw_calls(), 1);
        assert_eq!(surface.pixel(7, 7).unwrap(), Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_default_frame_fallback() {
        let atlas = Atlas::new(checker(), [AtlasFrame::new(DEFAULT_FRAME, 2, 0, 2, 2)]);
        let mut surface = Surface::new(4, 4, 1).unwrap();
        assert!(atlas.draw_sprite(&mut surface, "anything", 0.0, 0.0, 4.0, 4.0));
        assert_eq!(surface.pixel(0, 0).unwrap(), Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn test_out_of_bounds_frames_dropped() {
        let atlas = Atlas::new(
            checker(),
            [AtlasFrame::new("ok", 0, 0, 4, 2), AtlasFrame::new("bad", 3, 0, 2, 2)],
        );
        assert!(atlas.has_frame("ok"));
        assert!(!atlas.has_frame("bad"));
    }

    #[test]
    fn test_metadata_with_data_uri() {
        let uri = format!("data:image/png;base64,{}", BASE64.encode(png_bytes(&checker())));
        let meta = serde_json::json!({
            "image": uri,
            "frames": { "blue": { "x": 2, "y": 0, "w": 2, "h": 2 } }
        })
        .to_string();

        let atlas = Atlas::from_metadata(&meta, Path::new("atlas.json"), Path::new("."), None).unwrap();
        assert_eq!(atlas.frame("blue"), Some(&AtlasFrame::new("blue", 2, 0, 2, 2)));
    }

    #[test]
    fn test_load_bare_frame_map_relative_to_metadata() {
        let dir = tempfile::tempdir().unwrap();
        checker().save(dir.path().join("sheet.png")).unwrap();
        let meta_path = dir.path().join("atlas.json");
        fs::write(&meta_path, r#"{"grass": {"x": 0, "y": 0, "w": 2, "h": 2}}"#).unwrap();

        let atlas = Atlas::load(Some(Path::new("sheet.png")), &meta_path).unwrap();
        assert!(atlas.has_frame("grass"));
        assert_eq!(atlas.image().dimensions(), (4, 2));
    }

    #[test]
    fn test_missing_image_source() {
        let err = Atlas::from_metadata(r#"{"frames": {}}"#, Path::new("a.json"), Path::new("."), None).unwrap_err();
        assert!(matches!(err, LoadError::MissingImage));
    }

    #[test]
    fn test_bad_metadata_is_load_error() {
        let err = Atlas::from_metadata("not json", Path::new("a.json"), Path::new("."), Some("x.png")).unwrap_err();
        assert!(matches!(err, LoadError::Metadata { .. }));
    }

    #[test]
    fn test_remote_source_unsupported() {
        let err = Atlas::from_metadata(
            r#"{"image": "https://example.invalid/a.png", "frames": {}}"#,
            Path::new("a.json"),
            Path::new("."),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedSource(_)));
    }

    #[test]
    fn test_placeholder_has_player_sheet() {
        let atlas = Atlas::placeholder(&[("grass", Color::rgb(0x3b, 0x7f, 0x3a))], 8);
        assert!(atlas.has_frame("grass"));
        for dir in Direction::ALL {
            for col in 0..PLAYER_SHEET_COLUMNS {
                assert!(atlas.has_frame(&player_frame_name(dir, col)));
            }
        }
        assert!(!atlas.has_frame(DEFAULT_FRAME));
    }
}
