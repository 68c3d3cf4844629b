//! Static platform descriptors

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::context::PlatformContext;
use crate::engine::EngineMethods;
use crate::matcher::{PlatformMatcher, VersionParser};
use crate::version::RawVersion;

/// Per-platform settings, merged root to leaf on resolution
pub type Settings = IndexMap<String, Value>;

/// Everything known about one platform identity.
///
/// Built once with the `with_*` methods and then shared through the
/// registry. A descriptor without a matcher never matches on its own; it can
/// still become active as a superset or as the default platform.
#[derive(Clone, Default)]
pub struct PlatformDescriptor {
    name: String,
    is_engine: bool,
    subsets: Vec<String>,
    superset: Option<String>,
    matcher: Option<Arc<dyn PlatformMatcher>>,
    version_parser: Option<Arc<dyn VersionParser>>,
    methods: EngineMethods,
    settings: Settings,
}

impl PlatformDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Mark this descriptor as a hosting engine
    pub fn engine(mut self) -> Self {
        self.is_engine = true;
        self
    }

    /// Platforms this descriptor is a valid parent of
    pub fn with_subsets<I, S>(mut self, subsets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subsets = subsets.into_iter().map(Into::into).collect();
        self
    }

    /// Broader platform implied whenever this one is active
    pub fn with_superset(mut self, superset: impl Into<String>) -> Self {
        self.superset = Some(superset.into());
        self
    }

    pub fn with_matcher(mut self, matcher: impl PlatformMatcher + 'static) -> Self {
        self.matcher = Some(Arc::new(matcher));
        self
    }

    pub fn with_version_parser(mut self, parser: impl VersionParser + 'static) -> Self {
        self.version_parser = Some(Arc::new(parser));
        self
    }

    pub fn with_methods(mut self, methods: EngineMethods) -> Self {
        self.methods = methods;
        self
    }

    pub fn with_setting(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.settings.insert(key.into(), value.into());
        self
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings.extend(settings);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_engine(&self) -> bool {
        self.is_engine
    }

    pub fn subsets(&self) -> &[String] {
        &self.subsets
    }

    pub fn superset(&self) -> Option<&str> {
        self.superset.as_deref()
    }

    pub fn methods(&self) -> &EngineMethods {
        &self.methods
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn has_matcher(&self) -> bool {
        self.matcher.is_some()
    }

    pub fn is_match(&self, ctx: &PlatformContext) -> bool {
        self.matcher.as_ref().is_some_and(|m| m.matches(ctx))
    }

    pub fn parse_version(&self, ctx: &PlatformContext) -> Option<RawVersion> {
        self.version_parser.as_ref()?.parse_version(ctx)
    }
}

impl std::fmt::Debug for PlatformDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformDescriptor")
            .field("name", &self.name)
            .field("is_engine", &self.is_engine)
            .field("subsets", &self.subsets)
            .field("superset", &self.superset)
            .field("matcher", &self.matcher.is_some())
            .field("version_parser", &self.version_parser.is_some())
            .field("methods", &self.methods)
            .field("settings", &self.settings)
            .finish()
    }
}
