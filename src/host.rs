//! Host frame-callback abstraction
//!
//! The engine never sleeps or spawns a loop of its own: it asks the host for
//! the next display refresh and the host calls `RenderEngine::on_frame`.

use std::cell::RefCell;
use std::rc::Rc;

/// Per-refresh callback source
pub trait FrameHost {
    /// Monotonic timestamp in milliseconds
    fn now_ms(&self) -> f64;

    /// Ask for one `on_frame` call at the next refresh
    fn request_frame(&mut self);
}

#[derive(Debug, Default)]
struct SteppedState {
    now_ms: f64,
    requests: u64,
    pending: bool,
}

/// Manually clocked host for headless runs and tests.
///
/// Clones share one clock, so the driver keeps a handle while the engine
/// owns another.
#[derive(Debug, Clone, Default)]
pub struct SteppedHost {
    state: Rc<RefCell<SteppedState>>,
}

impl SteppedHost {
    pub fn new(start_ms: f64) -> Self {
        let host = Self::default();
        host.state.borrow_mut().now_ms = start_ms;
        host
    }

    pub fn advance(&self, ms: f64) {
        self.state.borrow_mut().now_ms += ms.max(0.0);
    }

    pub fn set_time(&self, ms: f64) {
        self.state.borrow_mut().now_ms = ms;
    }

    pub fn time(&self) -> f64 {
        self.state.borrow().now_ms
    }

    /// Whether a frame has been requested and not yet delivered
    pub fn has_pending(&self) -> bool {
        self.state.borrow().pending
    }

    /// Total `request_frame` calls seen
    pub fn requests(&self) -> u64 {
        self.state.borrow().requests
    }

    /// Consume the pending request, returning the timestamp to deliver
    pub fn take_frame(&self) -> Option<f64> {
        let mut state = self.state.borrow_mut();
        if state.pending {
            state.pending = false;
            Some(state.now_ms)
        } else {
            None
        }
    }
}

impl FrameHost for SteppedHost {
    fn now_ms(&self) -> f64 {
        self.state.borrow().now_ms
    }

    fn request_frame(&mut self) {
        let mut state = self.state.borrow_mut();
        state.requests += 1;
        state.pending = true;
    }
}
