//! Pixel compositing
//!
//! Straight-alpha RGBA8 destination, unit-float source. Separable modes use
//! the W3C compositing formula:
//! `co = as·(1−ad)·cs + as·ad·B(cd, cs) + (1−as)·ad·cd`.

use image::Rgba;
use serde::{Deserialize, Serialize};

/// Compositing operation for subsequent draw calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    /// Normal alpha blending
    #[default]
    SourceOver,
    /// Additive: premultiplied channels are summed
    Lighter,
    Multiply,
    Screen,
    SoftLight,
    /// Erase: destination alpha is reduced by source alpha
    DestinationOut,
}

impl BlendMode {
    pub fn name(&self) -> &'static str {
        match self {
            BlendMode::SourceOver => "source-over",
            BlendMode::Lighter => "lighter",
            BlendMode::Multiply => "multiply",
            BlendMode::Screen => "screen",
            BlendMode::SoftLight => "soft-light",
            BlendMode::DestinationOut => "destination-out",
        }
    }
}

/// Composite one source sample (`[r, g, b, a]` in 0..=1) onto `dst`
#[inline]
pub fn composite(dst: &mut Rgba<u8>, src: [f32; 4], mode: BlendMode) {
    let sa = src[3];
    if sa <= 0.0 {
        return;
    }

    let da = dst[3] as f32 / 255.0;
    let dc = [
        dst[0] as f32 / 255.0,
        dst[1] as f32 / 255.0,
        dst[2] as f32 / 255.0,
    ];

    match mode {
        BlendMode::DestinationOut => {
            let out_a = da * (1.0 - sa);
            dst[3] = to_byte(out_a);
        }
        BlendMode::Lighter => {
            let out_a = (sa + da).min(1.0);
            let mut out = [0.0f32; 3];
            for i in 0..3 {
                let premul = (src[i] * sa + dc[i] * da).min(1.0);
                out[i] = if out_a > 0.0 { premul / out_a } else { 0.0 };
            }
            write(dst, out, out_a);
        }
        _ => {
            let out_a = sa + da * (1.0 - sa);
            if out_a <= 0.0 {
                return;
            }
            let mut out = [0.0f32; 3];
            for i in 0..3 {
                let mixed = separable(mode, dc[i], src[i]);
                let premul = sa * (1.0 - da) * src[i] + sa * da * mixed + (1.0 - sa) * da * dc[i];
                out[i] = premul / out_a;
            }
            write(dst, out, out_a);
        }
    }
}

/// Separable blend function `B(cb, cs)`
#[inline]
fn separable(mode: BlendMode, cb: f32, cs: f32) -> f32 {
    match mode {
        BlendMode::Multiply => cb * cs,
        BlendMode::Screen => cb + cs - cb * cs,
        BlendMode::SoftLight => {
            if cs <= 0.5 {
                cb - (1.0 - 2.0 * cs) * cb * (1.0 - cb)
            } else {
                let d = if cb <= 0.25 {
                    ((16.0 * cb - 12.0) * cb + 4.0) * cb
                } else {
                    cb.sqrt()
                };
                cb + (2.0 * cs - 1.0) * (d - cb)
            }
        }
        _ => cs,
    }
}

#[inline]
fn write(dst: &mut Rgba<u8>, rgb: [f32; 3], a: f32) {
    dst[0] = to_byte(rgb[0]);
    dst[1] = to_byte(rgb[1]);
    dst[2] = to_byte(rgb[2]);
    dst[3] = to_byte(a);
}

#[inline]
fn to_byte(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn px(r: u8, g: u8, b: u8, a: u8) -> Rgba<u8> {
        Rgba([r, g, b, a])
    }

    #[test]
    fn test_source_over_opaque_replaces() {
        let mut d = px(10, 20, 30, 255);
        composite(&mut d, [1.0, 0.0, 0.0, 1.0], BlendMode::SourceOver);
        assert_eq!(d, px(255, 0, 0, 255));
    }

    #[test]
    fn test_source_over_half_alpha() {
        let mut d = px(0, 0, 0, 255);
        composite(&mut d, [1.0, 1.0, 1.0, 0.5], BlendMode::SourceOver);
        assert_eq!(d, px(128, 128, 128, 255));
    }

    #[test]
    fn test_lighter_adds_and_saturates() {
        let mut d = px(100, 200, 0, 255);
        composite(&mut d, [100.0 / 255.0, 100.0 / 255.0, 0.0, 1.0], BlendMode::Lighter);
        assert_eq!(d, px(200, 255, 0, 255));
    }

    #[test]
    fn test_multiply_with_black_darkens() {
        let mut d = px(200, 200, 200, 255);
        composite(&mut d, [0.0, 0.0, 0.0, 0.5], BlendMode::Multiply);
        assert_eq!(d, px(100, 100, 100, 255));
    }

    #[test]
    fn test_destination_out_erases_alpha_only() {
        let mut d = px(12, 34, 56, 255);
        composite(&mut d, [0.0, 0.0, 0.0, 0.5], BlendMode::DestinationOut);
        assert_eq!(d[3], 128);
        assert_eq!((d[0], d[1], d[2]), (12, 34, 56));
    }

    #[test]
    fn test_transparent_source_is_noop() {
        let mut d = px(1, 2, 3, 4);
        composite(&mut d, [1.0, 1.0, 1.0, 0.0], BlendMode::Lighter);
        assert_eq!(d, px(1, 2, 3, 4));
    }

    #[test]
    fn test_soft_light_neutral_grey_keeps_backdrop() {
        let mut d = px(90, 160, 30, 255);
        composite(&mut d, [0.5, 0.5, 0.5, 1.0], BlendMode::SoftLight);
        assert_eq!(d, px(90, 160, 30, 255));
    }
}
