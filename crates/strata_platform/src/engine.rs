//! Native hooks provided by a hosting engine (Cordova, a webview shell, ...)
//!
//! Hooks are merged onto the [`Platform`](crate::Platform) only when their
//! descriptor is the active engine. The `ready` hook is kept apart from the
//! public hook table: it replaces the default DOM-ready path instead of being
//! callable by name.

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::ready::ReadyCallback;

/// Well-known hook names. Engines may register any other name too.
pub mod hooks {
    pub const ON: &str = "on";
    pub const ON_HARDWARE_BACK_BUTTON: &str = "on_hardware_back_button";
    pub const REGISTER_BACK_BUTTON_ACTION: &str = "register_back_button_action";
    pub const EXIT_APP: &str = "exit_app";
    pub const FULL_SCREEN: &str = "full_screen";
    pub const SHOW_STATUS_BAR: &str = "show_status_bar";
}

/// A native method exposed by the engine
pub type NativeHook = Arc<dyn Fn(&[Value]) -> Value + Send + Sync>;

/// Engine-provided readiness: receives the callback that settles the
/// platform's ready signal.
pub type EngineReady = Arc<dyn Fn(ReadyCallback) + Send + Sync>;

/// Method table of an engine descriptor
#[derive(Clone, Default)]
pub struct EngineMethods {
    ready: Option<EngineReady>,
    hooks: IndexMap<String, NativeHook>,
}

impl EngineMethods {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ready<F>(mut self, ready: F) -> Self
    where
        F: Fn(ReadyCallback) + Send + Sync + 'static,
    {
        self.ready = Some(Arc::new(ready));
        self
    }

    pub fn with_hook<F>(mut self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        self.hooks.insert(name.into(), Arc::new(hook));
        self
    }

    pub fn ready(&self) -> Option<&EngineReady> {
        self.ready.as_ref()
    }

    pub fn hooks(&self) -> &IndexMap<String, NativeHook> {
        &self.hooks
    }

    pub fn is_empty(&self) -> bool {
        self.ready.is_none() && self.hooks.is_empty()
    }
}

impl std::fmt::Debug for EngineMethods {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineMethods")
            .field("ready", &self.ready.is_some())
            .field("hooks", &self.hooks.keys().collect::<Vec<_>>())
            .finish()
    }
}
