//! Debounced resize dispatch
//!
//! Driven by the host's frame loop like the animation scheduler: the host
//! reports resizes as they happen and calls [`ResizeDispatcher::take_due`]
//! every tick. Each resize re-arms the debounce window.

use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

/// Quiet period after the last resize before listeners run
pub const RESIZE_DEBOUNCE: Duration = Duration::from_millis(500);

pub type ResizeCallback = Box<dyn FnMut()>;

pub struct ResizeDispatcher {
    callbacks: Vec<ResizeCallback>,
    debounce: Duration,
    deadline: Option<Instant>,
}

impl ResizeDispatcher {
    pub fn new(debounce: Duration) -> Self {
        Self {
            callbacks: Vec::new(),
            debounce,
            deadline: None,
        }
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    pub fn set_debounce(&mut self, debounce: Duration) {
        self.debounce = debounce;
    }

    pub fn on_resize<F: FnMut() + 'static>(&mut self, callback: F) {
        self.callbacks.push(Box::new(callback));
    }

    /// Record a resize at `now`, restarting the window
    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.debounce);
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// `true` once the window has elapsed; clears the pending resize
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Run every listener. A panicking listener is logged and skipped; the
    /// rest still run. Returns how many listeners failed.
    pub fn dispatch(&mut self) -> usize {
        let mut failed = 0;
        for (index, callback) in self.callbacks.iter_mut().enumerate() {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| callback())) {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "non-string panic payload".to_string());
                tracing::error!("Resize listener #{} failed: {}", index, message);
                failed += 1;
            }
        }
        failed
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

impl Default for ResizeDispatcher {
    fn default() -> Self {
        Self::new(RESIZE_DEBOUNCE)
    }
}

impl std::fmt::Debug for ResizeDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResizeDispatcher")
            .field("callbacks", &self.callbacks.len())
            .field("debounce", &self.debounce)
            .field("deadline", &self.deadline)
            .finish()
    }
}
