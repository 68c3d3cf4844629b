//! "Native environment is ready" signal
//!
//! A broadcast, settle-once future. Every waiter, whether it subscribed
//! before or after the signal settled, observes the same value.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;

use crate::error::{PlatformError, Result};

/// Callback handed to whoever announces readiness
pub type ReadyCallback = Box<dyn FnOnce() + Send>;

/// Host hook that calls back once the environment (DOM, webview) is ready.
///
/// Used only when the active engine does not provide its own ready hook.
pub trait DomReady {
    fn when_ready(&self, callback: ReadyCallback);
}

impl<F> DomReady for F
where
    F: Fn(ReadyCallback),
{
    fn when_ready(&self, callback: ReadyCallback) {
        self(callback)
    }
}

/// Calls back immediately, for headless hosts
#[derive(Clone, Copy, Debug, Default)]
pub struct ImmediateReady;

impl DomReady for ImmediateReady {
    fn when_ready(&self, callback: ReadyCallback) {
        callback();
    }
}

/// Single-resolution broadcast signal
#[derive(Debug)]
pub struct ReadySignal<T> {
    tx: Arc<watch::Sender<Option<T>>>,
}

impl<T> Clone for ReadySignal<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> Default for ReadySignal<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ReadySignal<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Settle the signal. Returns `false` (and drops `value`) if it had
    /// already settled.
    pub fn resolve(&self, value: T) -> bool {
        let mut settled = false;
        self.tx.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = Some(value);
            settled = true;
            true
        });
        settled
    }

    pub fn is_resolved(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// Future for the settled value. Does not borrow the signal, so it can
    /// be created before resolution and awaited on any executor.
    pub fn wait(&self) -> impl Future<Output = Result<T>> + Send + 'static {
        let mut rx = self.tx.subscribe();
        async move {
            let value = rx
                .wait_for(Option::is_some)
                .await
                .map_err(|_| PlatformError::ReadyAbandoned)?
                .clone();
            value.ok_or(PlatformError::ReadyAbandoned)
        }
    }
}
