//! Environment facade read by match predicates and version parsers.

use regex::{Regex, RegexBuilder};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::dimensions::{DimensionCache, DimensionProvider, Dimensions};
use crate::version::RawVersion;

/// Query-string parameter that forces platform predicates, e.g.
/// `?strataplatform=ios;iphone`.
pub const PLATFORM_QUERY_KEY: &str = "strataplatform";

/// Parse the query string of a URL into a key/value map.
///
/// - Keys are lower-cased, values are kept verbatim.
/// - The query string stops at the first `#`.
/// - A parameter without `=` maps to an empty value.
pub fn parse_query_string(url: &str) -> FxHashMap<String, String> {
    let mut params = FxHashMap::default();
    let Some(start) = url.find('?') else {
        return params;
    };

    let query = url[start + 1..].split('#').next().unwrap_or_default();
    for param in query.split('&') {
        if param.is_empty() {
            continue;
        }
        let mut split = param.split('=');
        let key = split.next().unwrap_or_default().to_lowercase();
        let value = split.next().unwrap_or_default();
        params.insert(key, value.to_string());
    }
    params
}

/// Read-only snapshot of the runtime environment.
#[derive(Debug, Default)]
pub struct PlatformContext {
    url: String,
    query: FxHashMap<String, String>,
    user_agent: String,
    navigator_platform: String,
    platform_override: Option<String>,
    globals: FxHashSet<String>,
    dimensions: DimensionCache,
}

impl PlatformContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.set_url(url);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_navigator_platform(mut self, navigator_platform: impl Into<String>) -> Self {
        self.navigator_platform = navigator_platform.into();
        self
    }

    /// Mark a host global (e.g. `cordova`) as present
    pub fn with_global(mut self, name: impl Into<String>) -> Self {
        self.globals.insert(name.into());
        self
    }

    pub fn with_dimensions(mut self, provider: impl DimensionProvider + 'static) -> Self {
        self.dimensions = DimensionCache::new(provider);
        self
    }

    /// Set the URL and re-parse its query string
    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
        self.query = parse_query_string(&self.url);
    }

    pub fn set_user_agent(&mut self, user_agent: impl Into<String>) {
        self.user_agent = user_agent.into();
    }

    pub fn set_navigator_platform(&mut self, navigator_platform: impl Into<String>) {
        self.navigator_platform = navigator_platform.into();
    }

    pub(crate) fn set_platform_override(&mut self, platform: Option<String>) {
        self.platform_override = platform;
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn query(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn navigator_platform(&self) -> &str {
        &self.navigator_platform
    }

    /// Platform name the host asked to pretend to be, if any
    pub fn platform_override(&self) -> Option<&str> {
        self.platform_override.as_deref()
    }

    pub fn has_global(&self, name: &str) -> bool {
        self.globals.contains(name)
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions.get()
    }

    pub fn width(&self) -> f32 {
        self.dimensions().width
    }

    pub fn height(&self) -> f32 {
        self.dimensions().height
    }

    pub(crate) fn flush_dimensions(&self) {
        self.dimensions.flush();
    }

    /// `true` if the `;`-separated, lower-cased `query_value` contains `test_value`
    pub fn test_query(&self, query_value: &str, test_value: &str) -> bool {
        query_value
            .to_lowercase()
            .split(';')
            .any(|value| value == test_value)
    }

    /// Case-insensitive regex search over the user agent
    pub fn test_user_agent(&self, expression: &str) -> bool {
        test_expression(expression, &self.user_agent)
    }

    /// Case-insensitive regex search over the navigator platform
    pub fn test_navigator_platform(&self, expression: &str) -> bool {
        test_expression(expression, &self.navigator_platform)
    }

    /// Capture groups 1 and 2 of `pattern` in the user agent as major/minor
    pub fn match_user_agent_version(&self, pattern: &Regex) -> Option<RawVersion> {
        if self.user_agent.is_empty() {
            return None;
        }
        let captures = pattern.captures(&self.user_agent)?;
        let major = captures.get(1)?.as_str().to_string();
        let minor = captures.get(2).map(|m| m.as_str().to_string());
        Some(RawVersion { major, minor })
    }

    /// The query-string override wins when present, otherwise the user agent
    /// is tested. `user_agent_expression` defaults to `query_test_value`.
    pub fn is_platform(&self, query_test_value: &str, user_agent_expression: Option<&str>) -> bool {
        match self.platform_query() {
            Some(query_value) => self.test_query(query_value, query_test_value),
            None => self.test_user_agent(user_agent_expression.unwrap_or(query_test_value)),
        }
    }

    /// Non-empty value of the platform query parameter
    pub fn platform_query(&self) -> Option<&str> {
        self.query(PLATFORM_QUERY_KEY).filter(|value| !value.is_empty())
    }
}

fn test_expression(expression: &str, haystack: &str) -> bool {
    match RegexBuilder::new(expression).case_insensitive(true).build() {
        Ok(rgx) => rgx.is_match(haystack),
        Err(err) => {
            tracing::warn!("Ignoring invalid platform expression {:?}: {}", expression, err);
            false
        }
    }
}
