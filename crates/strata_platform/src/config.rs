//! Platform configuration file handling (strata.toml)
//!
//! ```toml
//! default = "core"
//! resize_debounce_ms = 500
//!
//! [[platforms]]
//! name = "kindle"
//! superset = "tablet"
//! user_agent = "kindle|silk"
//! version_pattern = "Kindle/(\\d+)\\.(\\d+)"
//! settings = { mode = "md" }
//! ```

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::builtin;
use crate::context::PlatformContext;
use crate::descriptor::{PlatformDescriptor, Settings};
use crate::error::{PlatformError, Result};
use crate::matcher::{
    AnyMatch, GlobalMatch, NavigatorPlatformMatch, PlatformMatcher, UserAgentMatch,
    UserAgentVersion,
};
use crate::platform::Platform;
use crate::registry::PlatformRegistry;

/// Top-level platform configuration
#[derive(Debug, Deserialize, Serialize)]
pub struct PlatformConfig {
    /// Fallback platform; keeps the built-in default when unset
    #[serde(default)]
    pub default: Option<String>,
    /// Start from the built-in registry
    #[serde(default = "default_true")]
    pub extend_builtin: bool,
    #[serde(default = "default_resize_debounce_ms")]
    pub resize_debounce_ms: u64,
    #[serde(default)]
    pub platforms: Vec<DescriptorConfig>,
}

fn default_true() -> bool {
    true
}

fn default_resize_debounce_ms() -> u64 {
    500
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            default: None,
            extend_builtin: true,
            resize_debounce_ms: default_resize_debounce_ms(),
            platforms: Vec::new(),
        }
    }
}

/// One declaratively defined platform
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct DescriptorConfig {
    pub name: String,
    #[serde(default)]
    pub engine: bool,
    #[serde(default)]
    pub subsets: Vec<String>,
    #[serde(default)]
    pub superset: Option<String>,
    /// Case-insensitive user-agent expression
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Value looked up in the platform query parameter; defaults to `name`
    /// when `user_agent` is set
    #[serde(default)]
    pub query_value: Option<String>,
    #[serde(default)]
    pub navigator_platform: Option<String>,
    /// Host globals whose presence activates the platform
    #[serde(default)]
    pub globals: Vec<String>,
    /// Regex with major/minor capture groups, applied to the user agent
    #[serde(default)]
    pub version_pattern: Option<String>,
    #[serde(default)]
    pub settings: Settings,
}

impl DescriptorConfig {
    pub fn into_descriptor(self) -> Result<PlatformDescriptor> {
        let mut matchers: Vec<Arc<dyn PlatformMatcher>> = Vec::new();
        if self.user_agent.is_some() || self.query_value.is_some() {
            let query_value = self.query_value.as_deref().unwrap_or(&self.name);
            let matcher = UserAgentMatch::new(query_value, self.user_agent.as_deref());
            check_pattern(&self.name, matcher.expression())?;
            matchers.push(Arc::new(matcher));
        }
        if let Some(expression) = &self.navigator_platform {
            check_pattern(&self.name, expression)?;
            matchers.push(Arc::new(NavigatorPlatformMatch::new(expression.as_str())));
        }
        if !self.globals.is_empty() {
            matchers.push(Arc::new(GlobalMatch::new(self.globals.iter().cloned())));
        }

        let mut descriptor = PlatformDescriptor::new(self.name.as_str())
            .with_subsets(self.subsets)
            .with_settings(self.settings);
        if self.engine {
            descriptor = descriptor.engine();
        }
        if let Some(superset) = self.superset {
            descriptor = descriptor.with_superset(superset);
        }

        if !matchers.is_empty() {
            descriptor = descriptor.with_matcher(AnyMatch(matchers));
        }

        if let Some(pattern) = self.version_pattern {
            let parser = UserAgentVersion::new(pattern);
            parser
                .validate()
                .map_err(|source| PlatformError::InvalidPattern {
                    platform: self.name.clone(),
                    source,
                })?;
            descriptor = descriptor.with_version_parser(parser);
        }

        Ok(descriptor)
    }
}

fn check_pattern(platform: &str, expression: &str) -> Result<()> {
    regex::RegexBuilder::new(expression)
        .case_insensitive(true)
        .build()
        .map(|_| ())
        .map_err(|source| PlatformError::InvalidPattern {
            platform: platform.to_string(),
            source,
        })
}

impl PlatformConfig {
    pub fn from_toml_str(src: &str) -> Result<Self> {
        Ok(toml::from_str(src)?)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let src = fs::read_to_string(path).map_err(|err| {
            PlatformError::Config(format!("failed to read {}: {}", path.display(), err))
        })?;
        Self::from_toml_str(&src)
    }

    pub fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }

    /// Build the registry: built-ins (if enabled) then configured platforms,
    /// which overwrite built-ins of the same name in place.
    pub fn into_registry(self) -> Result<PlatformRegistry> {
        let mut registry = if self.extend_builtin {
            builtin::default_registry()
        } else {
            PlatformRegistry::new()
        };

        for platform in self.platforms {
            registry.register(platform.into_descriptor()?);
        }
        if let Some(default) = self.default {
            registry.set_default(default);
        }

        tracing::debug!("Platform registry built with {} platforms", registry.len());
        Ok(registry)
    }

    pub fn into_platform(self, context: PlatformContext) -> Result<Platform> {
        let debounce = self.resize_debounce();
        let registry = self.into_registry()?;
        Ok(Platform::new(registry, context).with_resize_debounce(debounce))
    }
}
