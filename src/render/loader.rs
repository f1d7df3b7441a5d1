//! Non-blocking atlas loading
//!
//! Decoding runs on a background thread; the frame loop polls the handle
//! once per frame and never waits on it.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::atlas::Atlas;
use crate::error::LoadError;

/// How a pending load finished
#[derive(Debug)]
pub enum AtlasOutcome {
    Loaded(Atlas),
    Failed(LoadError),
    TimedOut,
}

type Slot = Arc<Mutex<Option<Result<Atlas, LoadError>>>>;

/// A handle to an in-flight atlas load that can be polled each frame
pub struct PendingAtlas {
    slot: Slot,
    started: Instant,
    timeout: Duration,
    meta_path: PathBuf,
    finished: bool,
}

impl PendingAtlas {
    /// Start loading `meta_path` (and `image_path` when the metadata names no image)
    pub fn spawn(image_path: Option<PathBuf>, meta_path: PathBuf, timeout: Duration) -> Self {
        let slot: Slot = Arc::new(Mutex::new(None));
        let writer = Arc::clone(&slot);
        let meta = meta_path.clone();

        log::debug!("Loading atlas {:?} on a background thread", meta_path);
        thread::spawn(move || {
            let result = Atlas::load(image_path.as_deref(), &meta);
            *writer.lock() = Some(result);
        });

        Self {
            slot,
            started: Instant::now(),
            timeout,
            meta_path,
            finished: false,
        }
    }

    /// Wrap an already-finished result (used for synchronous sources and tests)
    pub fn ready(result: Result<Atlas, LoadError>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(result))),
            started: Instant::now(),
            timeout: Duration::MAX,
            meta_path: PathBuf::new(),
            finished: false,
        }
    }

    /// Check for completion without blocking.
    ///
    /// Yields the outcome exactly once; later calls return `None`.
    pub fn poll(&mut self) -> Option<AtlasOutcome> {
        if self.finished {
            return None;
        }

        // Read before taking: once the writer is gone its result is visible
        let abandoned = Arc::strong_count(&self.slot) == 1;

        if let Some(result) = self.slot.lock().take() {
            self.finished = true;
            return Some(match result {
                Ok(atlas) => AtlasOutcome::Loaded(atlas),
                Err(err) => AtlasOutcome::Failed(err),
            });
        }

        if abandoned {
            self.finished = true;
            return Some(AtlasOutcome::Failed(LoadError::Disconnected));
        }

        if self.started.elapsed() >= self.timeout {
            self.finished = true;
            log::warn!("Atlas load {:?} timed out after {:?}", self.meta_path, self.timeout);
            return Some(AtlasOutcome::TimedOut);
        }

        None
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn meta_path(&self) -> &PathBuf {
        &self.meta_path
    }
}
