//! External configuration
//!
//! Renderer settings live in RON files so they can be tuned without a rebuild.

pub mod config;

pub use config::RenderConfig;
