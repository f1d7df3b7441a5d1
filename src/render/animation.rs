//! Animation state machine for sprite-based entities
//!
//! Each named state owns an ordered frame list and a playback rate. Frames are
//! opaque to the machine; the engine uses atlas frame names.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Frames for a single animation state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationDefinition<F> {
    pub frames: Vec<F>,
    /// Frames per second; zero means a static frame
    #[serde(default)]
    pub fps: f64,
}

impl<F> AnimationDefinition<F> {
    pub fn new(frames: Vec<F>, fps: f64) -> Self {
        Self { frames, fps }
    }

    /// Single-frame definition that never advances
    pub fn still(frame: F) -> Self {
        Self { frames: vec![frame], fps: 0.0 }
    }
}

/// Table of named animation states, as read from configuration
pub type AnimationTable<F> = BTreeMap<String, AnimationDefinition<F>>;

/// Animation controller - tracks current state and frame timing
#[derive(Debug, Clone)]
pub struct AnimFsm<F> {
    states: Vec<(String, AnimationDefinition<F>)>,
    current: usize,
    time: f64,
    frame_index: usize,
}

impl<F> AnimFsm<F> {
    /// Build from `(name, definition)` pairs.
    ///
    /// States with no frames are dropped and negative or non-finite rates
    /// become zero. Starts in `initial` when present, otherwise in the first
    /// remaining state.
    pub fn new<I>(table: I, initial: &str) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, AnimationDefinition<F>)>,
    {
        let mut states: Vec<(String, AnimationDefinition<F>)> = Vec::new();
        for (name, mut def) in table {
            if def.frames.is_empty() {
                log::debug!("Dropping animation state {:?} with no frames", name);
                continue;
            }
            def.fps = if def.fps.is_finite() { def.fps.max(0.0) } else { 0.0 };
            if let Some(slot) = states.iter_mut().find(|(n, _)| *n == name) {
                slot.1 = def;
            } else {
                states.push((name, def));
            }
        }

        if states.is_empty() {
            return Err(ConfigError::EmptyAnimationTable);
        }

        let current = states.iter().position(|(n, _)| n == initial).unwrap_or(0);
        Ok(Self {
            states,
            current,
            time: 0.0,
            frame_index: 0,
        })
    }

    /// Switch to a new animation state; unknown or current names are ignored
    pub fn set_state(&mut self, name: &str) {
        let Some(idx) = self.states.iter().position(|(n, _)| n == name) else {
            return;
        };
        if idx == self.current {
            return;
        }
        self.current = idx;
        self.time = 0.0;
        self.frame_index = 0;
    }

    /// Advance by `dt` seconds on a fixed-timestep accumulator
    pub fn update(&mut self, dt: f64) {
        let (_, def) = &self.states[self.current];
        if def.fps <= 0.0 {
            self.frame_index = 0;
            return;
        }
        let delta = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        if delta == 0.0 {
            return;
        }

        self.time += delta;
        let period = 1.0 / def.fps;
        let len = def.frames.len();
        while self.time >= period {
            self.time -= period;
            self.frame_index = (self.frame_index + 1) % len;
        }
    }

    /// Current frame identifier, or `None` when the state has no frames
    pub fn frame(&self) -> Option<&F> {
        let (_, def) = &self.states[self.current];
        def.frames.get(self.frame_index.min(def.frames.len().saturating_sub(1)))
    }

    pub fn state(&self) -> &str {
        &self.states[self.current].0
    }

    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    /// Seconds accumulated toward the next frame
    pub fn elapsed(&self) -> f64 {
        self.time
    }

    pub fn has_state(&self, name: &str) -> bool {
        self.states.iter().any(|(n, _)| n == name)
    }

    pub fn state_names(&self) -> impl Iterator<Item = &str> {
        self.states.iter().map(|(n, _)| n.as_str())
    }
}
