//! The resolved platform
//!
//! `Platform` owns the registry, the environment and the state produced by
//! [`Platform::load`]. UI components query it for platform identity,
//! versions and settings; engine hooks are reached through it.
//!
//! # Example
//!
//! ```rust
//! use strata_platform::{builtin, Platform, PlatformContext};
//!
//! let ctx = PlatformContext::new()
//!     .with_user_agent("Mozilla/5.0 (iPhone; CPU iPhone OS 9_1 like Mac OS X)");
//! let mut platform = Platform::new(builtin::default_registry(), ctx);
//! platform.load(None).unwrap();
//!
//! assert!(platform.is("iphone"));
//! assert_eq!(platform.platforms(), ["mobile", "ios", "iphone", "mobileweb"]);
//! assert_eq!(platform.version().map(|v| v.major), Some(9));
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::context::PlatformContext;
use crate::descriptor::{PlatformDescriptor, Settings};
use crate::engine::{hooks, EngineReady, NativeHook};
use crate::error::Result;
use crate::ready::{DomReady, ReadyCallback, ReadySignal};
use crate::registry::PlatformRegistry;
use crate::resize::ResizeDispatcher;
use crate::resolver::Resolver;
use crate::version::PlatformVersion;

/// What the ready future resolves to: the resolved platform at the time
/// readiness was prepared.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PlatformSnapshot {
    pub platforms: Vec<String>,
    pub versions: IndexMap<String, PlatformVersion>,
    pub settings: Settings,
    pub engine: Option<String>,
    pub is_rtl: bool,
}

pub struct Platform {
    registry: PlatformRegistry,
    context: PlatformContext,
    platforms: Vec<String>,
    versions: IndexMap<String, PlatformVersion>,
    settings: Settings,
    engine: Option<Arc<PlatformDescriptor>>,
    engine_ready: Option<EngineReady>,
    native_hooks: IndexMap<String, NativeHook>,
    is_rtl: bool,
    ready: ReadySignal<PlatformSnapshot>,
    resize: ResizeDispatcher,
}

impl Platform {
    pub fn new(registry: PlatformRegistry, context: PlatformContext) -> Self {
        Self {
            registry,
            context,
            platforms: Vec::new(),
            versions: IndexMap::new(),
            settings: Settings::new(),
            engine: None,
            engine_ready: None,
            native_hooks: IndexMap::new(),
            is_rtl: false,
            ready: ReadySignal::new(),
            resize: ResizeDispatcher::default(),
        }
    }

    pub fn with_resize_debounce(mut self, debounce: Duration) -> Self {
        self.resize.set_debounce(debounce);
        self
    }

    // Registry
    // ------------------------------------------------------------------

    pub fn register(&mut self, descriptor: impl Into<Arc<PlatformDescriptor>>) -> &mut Self {
        self.registry.register(descriptor);
        self
    }

    pub fn registry(&self) -> &PlatformRegistry {
        &self.registry
    }

    pub fn get(&self, name: &str) -> Arc<PlatformDescriptor> {
        self.registry.get(name)
    }

    pub fn set_default(&mut self, name: impl Into<String>) -> &mut Self {
        self.registry.set_default(name);
        self
    }

    // Environment
    // ------------------------------------------------------------------

    pub fn context(&self) -> &PlatformContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut PlatformContext {
        &mut self.context
    }

    pub fn url(&self) -> &str {
        self.context.url()
    }

    pub fn query(&self, key: &str) -> Option<&str> {
        self.context.query(key)
    }

    pub fn user_agent(&self) -> &str {
        self.context.user_agent()
    }

    pub fn navigator_platform(&self) -> &str {
        self.context.navigator_platform()
    }

    // Resolution
    // ------------------------------------------------------------------

    /// Resolve the active platforms. `platform_override` pretends to be the
    /// named platform; it never activates an engine.
    ///
    /// Replaces any previously resolved state. A misconfigured registry
    /// fails before the environment or the resolved state is touched.
    pub fn load(&mut self, platform_override: Option<&str>) -> Result<()> {
        self.registry.validate()?;
        self.context
            .set_platform_override(platform_override.map(str::to_string));

        let resolution = Resolver::new(&self.registry, &self.context)?.resolve();

        self.engine_ready = None;
        self.native_hooks.clear();
        if let Some(engine) = &resolution.engine {
            let methods = engine.methods();
            self.engine_ready = methods.ready().cloned();
            self.native_hooks
                .extend(methods.hooks().iter().map(|(k, v)| (k.clone(), v.clone())));
        }

        self.platforms = resolution.platforms;
        self.versions = resolution.versions;
        self.settings = resolution.settings;
        self.engine = resolution.engine;
        Ok(())
    }

    pub fn is(&self, name: &str) -> bool {
        self.platforms.iter().any(|p| p == name)
    }

    /// Active platforms, root first, most specific last
    pub fn platforms(&self) -> &[String] {
        &self.platforms
    }

    /// Every platform with a parsed version
    pub fn versions(&self) -> &IndexMap<String, PlatformVersion> {
        &self.versions
    }

    pub fn versions_of(&self, name: &str) -> Option<&PlatformVersion> {
        self.versions.get(name)
    }

    /// First available version, least specific platform first
    pub fn version(&self) -> Option<&PlatformVersion> {
        self.versions.values().next()
    }

    pub fn engine(&self) -> Option<&str> {
        self.engine.as_deref().map(PlatformDescriptor::name)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn setting(&self, key: &str) -> Option<&Value> {
        self.settings.get(key)
    }

    pub fn is_rtl(&self) -> bool {
        self.is_rtl
    }

    pub fn set_is_rtl(&mut self, is_rtl: bool) {
        self.is_rtl = is_rtl;
    }

    pub fn snapshot(&self) -> PlatformSnapshot {
        PlatformSnapshot {
            platforms: self.platforms.clone(),
            versions: self.versions.clone(),
            settings: self.settings.clone(),
            engine: self.engine().map(str::to_string),
            is_rtl: self.is_rtl,
        }
    }

    // Readiness
    // ------------------------------------------------------------------

    /// Resolves once the native environment is ready. Can be awaited before
    /// or after [`prepare_ready`](Self::prepare_ready); every waiter sees the
    /// same snapshot.
    pub fn ready(&self) -> impl Future<Output = Result<PlatformSnapshot>> + Send + 'static {
        self.ready.wait()
    }

    pub fn is_ready(&self) -> bool {
        self.ready.is_resolved()
    }

    /// Wire the ready signal to the active engine's ready hook, or to `dom`
    /// when the engine has none.
    pub fn prepare_ready(&self, dom: &dyn DomReady) {
        let signal = self.ready.clone();
        let snapshot = self.snapshot();
        let resolve: ReadyCallback = Box::new(move || {
            if !signal.resolve(snapshot) {
                tracing::trace!("Platform ready signal already settled");
            }
        });

        match &self.engine_ready {
            Some(engine_ready) => {
                tracing::debug!("Waiting for engine ready");
                engine_ready(resolve);
            }
            None => dom.when_ready(resolve),
        }
    }

    // Dimensions and resize
    // ------------------------------------------------------------------

    pub fn width(&self) -> f32 {
        self.context.width()
    }

    pub fn height(&self) -> f32 {
        self.context.height()
    }

    pub fn is_portrait(&self) -> bool {
        self.width() < self.height()
    }

    pub fn is_landscape(&self) -> bool {
        !self.is_portrait()
    }

    pub fn on_resize<F: FnMut() + 'static>(&mut self, callback: F) {
        self.resize.on_resize(callback);
    }

    /// Report a viewport resize. Listeners run once the debounce window
    /// passes without another resize.
    pub fn window_resize(&mut self) {
        self.window_resize_at(Instant::now());
    }

    pub fn window_resize_at(&mut self, now: Instant) {
        self.resize.schedule(now);
    }

    /// Call from the host's frame loop. Returns `true` if listeners ran.
    pub fn poll_resize(&mut self, now: Instant) -> bool {
        if !self.resize.take_due(now) {
            return false;
        }
        self.context.flush_dimensions();
        self.resize.dispatch();
        true
    }

    // Engine hooks
    // ------------------------------------------------------------------

    /// Call a native hook of the active engine. `None` when the engine does
    /// not provide it (or no engine is active).
    pub fn call_native(&self, name: &str, args: &[Value]) -> Option<Value> {
        self.native_hooks.get(name).map(|hook| hook(args))
    }

    pub fn has_native(&self, name: &str) -> bool {
        self.native_hooks.contains_key(name)
    }

    pub fn on(&self, event: &str) {
        self.call_native(hooks::ON, &[Value::from(event)]);
    }

    pub fn on_hardware_back_button(&self) {
        self.call_native(hooks::ON_HARDWARE_BACK_BUTTON, &[]);
    }

    pub fn register_back_button_action(&self, priority: i64) {
        self.call_native(hooks::REGISTER_BACK_BUTTON_ACTION, &[Value::from(priority)]);
    }

    pub fn exit_app(&self) {
        self.call_native(hooks::EXIT_APP, &[]);
    }

    pub fn full_screen(&self) {
        self.call_native(hooks::FULL_SCREEN, &[]);
    }

    pub fn show_status_bar(&self, visible: bool) {
        self.call_native(hooks::SHOW_STATUS_BAR, &[Value::from(visible)]);
    }
}

impl std::fmt::Debug for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Platform")
            .field("platforms", &self.platforms)
            .field("versions", &self.versions)
            .field("engine", &self.engine())
            .field("native_hooks", &self.native_hooks.keys().collect::<Vec<_>>())
            .field("is_rtl", &self.is_rtl)
            .field("ready", &self.ready.is_resolved())
            .field("resize", &self.resize)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin;
    use crate::dimensions::{Dimensions, StaticDimensions};
    use crate::ready::ImmediateReady;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_rtl_flag() {
        let mut platform = Platform::new(PlatformRegistry::new(), PlatformContext::new());
        assert!(!platform.is_rtl());
        platform.set_is_rtl(true);
        assert!(platform.is_rtl());
    }

    #[test]
    fn test_orientation() {
        let ctx = PlatformContext::new()
            .with_dimensions(StaticDimensions(Dimensions::new(375.0, 667.0)));
        let platform = Platform::new(PlatformRegistry::new(), ctx);
        assert!(platform.is_portrait());
        assert!(!platform.is_landscape());
    }

    #[test]
    fn test_version_without_parsed_versions() {
        let mut platform = Platform::new(builtin::default_registry(), PlatformContext::new());
        platform.load(None).unwrap();
        assert_eq!(platform.platforms(), ["core"]);
        assert!(platform.version().is_none());
        assert!(platform.versions().is_empty());
    }

    #[test]
    fn test_load_replaces_state() {
        let mut platform = Platform::new(builtin::default_registry(), PlatformContext::new());
        platform.load(Some("android")).unwrap();
        platform.load(Some("android")).unwrap();
        assert_eq!(platform.platforms(), ["mobile", "android", "mobileweb"]);
    }

    #[test]
    fn test_failed_load_keeps_state() {
        let mut platform = Platform::new(builtin::default_registry(), PlatformContext::new());
        platform.load(Some("ios")).unwrap();

        platform
            .register(PlatformDescriptor::new("left").with_superset("right"))
            .register(PlatformDescriptor::new("right").with_superset("left"));
        assert!(platform.load(Some("android")).is_err());

        assert_eq!(platform.context().platform_override(), Some("ios"));
        assert_eq!(platform.platforms(), ["mobile", "ios", "mobileweb"]);
    }

    #[test]
    fn test_empty_override_uses_predicates() {
        let ctx = PlatformContext::new()
            .with_user_agent("Mozilla/5.0 (iPhone; CPU iPhone OS 9_1 like Mac OS X)");
        let mut platform = Platform::new(builtin::default_registry(), ctx);
        platform.load(Some("")).unwrap();
        assert_eq!(platform.platforms(), ["mobile", "ios", "iphone", "mobileweb"]);
    }

    #[test]
    fn test_native_hooks_noop_without_engine() {
        let platform = Platform::new(builtin::default_registry(), PlatformContext::new());
        assert!(platform.call_native(hooks::EXIT_APP, &[]).is_none());
        platform.exit_app();
        platform.show_status_bar(false);
    }

    #[test]
    fn test_poll_resize_flushes_and_dispatches() {
        let start = Instant::now();
        let mut platform = Platform::new(PlatformRegistry::new(), PlatformContext::new());
        let hits = Rc::new(Cell::new(0));
        let hits_clone = hits.clone();
        platform.on_resize(move || hits_clone.set(hits_clone.get() + 1));

        platform.window_resize_at(start);
        assert!(!platform.poll_resize(start + Duration::from_millis(100)));
        assert!(platform.poll_resize(start + Duration::from_millis(500)));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_dom_ready_path() {
        let mut platform = Platform::new(builtin::default_registry(), PlatformContext::new());
        platform.load(None).unwrap();
        platform.prepare_ready(&ImmediateReady);

        let snapshot = pollster::block_on(platform.ready()).unwrap();
        assert_eq!(snapshot.platforms, ["core"]);
        assert_eq!(snapshot.engine, None);
    }
}
