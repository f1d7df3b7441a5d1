//! Display surface
//!
//! A software RGBA framebuffer sized to the viewport at a fixed device scale
//! factor. Callers draw in logical pixels; smoothing is never applied.

pub mod blend;
pub mod canvas;
pub mod color;
pub mod font;
pub mod gradient;

pub use blend::BlendMode;
pub use canvas::{device_scale, DrawState, Surface, MAX_DEVICE_DIMENSION};
pub use color::Color;
pub use gradient::RadialGradient;
