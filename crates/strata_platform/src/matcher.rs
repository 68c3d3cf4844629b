//! Match predicates and version parsers
//!
//! A descriptor's capabilities are strategy objects. Closures work for
//! one-off platforms; the structs below cover the rules the built-in and
//! config-defined platforms need.

use std::sync::{Arc, OnceLock};

use regex::{Regex, RegexBuilder};

use crate::context::PlatformContext;
use crate::version::RawVersion;

/// Decides whether a platform applies to the current environment
pub trait PlatformMatcher: Send + Sync {
    fn matches(&self, ctx: &PlatformContext) -> bool;
}

impl<F> PlatformMatcher for F
where
    F: Fn(&PlatformContext) -> bool + Send + Sync,
{
    fn matches(&self, ctx: &PlatformContext) -> bool {
        self(ctx)
    }
}

/// Extracts a platform's version from the environment
pub trait VersionParser: Send + Sync {
    fn parse_version(&self, ctx: &PlatformContext) -> Option<RawVersion>;
}

impl<F> VersionParser for F
where
    F: Fn(&PlatformContext) -> Option<RawVersion> + Send + Sync,
{
    fn parse_version(&self, ctx: &PlatformContext) -> Option<RawVersion> {
        self(ctx)
    }
}

/// Pattern compiled on first use. An invalid pattern logs once and never
/// matches.
#[derive(Clone, Debug)]
struct LazyRegex {
    pattern: String,
    case_insensitive: bool,
    compiled: OnceLock<Option<Regex>>,
}

impl LazyRegex {
    fn new(pattern: impl Into<String>, case_insensitive: bool) -> Self {
        Self {
            pattern: pattern.into(),
            case_insensitive,
            compiled: OnceLock::new(),
        }
    }

    fn build(&self) -> Result<Regex, regex::Error> {
        RegexBuilder::new(&self.pattern)
            .case_insensitive(self.case_insensitive)
            .build()
    }

    fn get(&self) -> Option<&Regex> {
        self.compiled
            .get_or_init(|| match self.build() {
                Ok(rgx) => Some(rgx),
                Err(err) => {
                    tracing::warn!("Ignoring invalid platform pattern {:?}: {}", self.pattern, err);
                    None
                }
            })
            .as_ref()
    }

    fn is_match(&self, haystack: &str) -> bool {
        self.get().is_some_and(|rgx| rgx.is_match(haystack))
    }

    fn is_compiled(&self) -> bool {
        self.compiled.get().is_some()
    }
}

/// [`PlatformContext::is_platform`]: the platform query parameter when
/// present, otherwise a case-insensitive user-agent search.
#[derive(Clone, Debug)]
pub struct UserAgentMatch {
    query_value: String,
    expression: LazyRegex,
}

impl UserAgentMatch {
    /// `user_agent` defaults to `query_value` when `None`
    pub fn new(query_value: impl Into<String>, user_agent: Option<&str>) -> Self {
        let query_value = query_value.into();
        let expression = LazyRegex::new(user_agent.unwrap_or(&query_value), true);
        Self {
            query_value,
            expression,
        }
    }

    pub fn expression(&self) -> &str {
        &self.expression.pattern
    }
}

impl PlatformMatcher for UserAgentMatch {
    fn matches(&self, ctx: &PlatformContext) -> bool {
        match ctx.platform_query() {
            Some(query) => ctx.test_query(query, &self.query_value),
            None => self.expression.is_match(ctx.user_agent()),
        }
    }
}

/// Case-insensitive search over `navigator.platform`
#[derive(Clone, Debug)]
pub struct NavigatorPlatformMatch {
    expression: LazyRegex,
}

impl NavigatorPlatformMatch {
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: LazyRegex::new(expression, true),
        }
    }

    pub fn expression(&self) -> &str {
        &self.expression.pattern
    }
}

impl PlatformMatcher for NavigatorPlatformMatch {
    fn matches(&self, ctx: &PlatformContext) -> bool {
        self.expression.is_match(ctx.navigator_platform())
    }
}

/// Viewport-size class: both sides must fall inside open ranges
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DimensionMatch {
    pub smallest: (f32, f32),
    pub largest: (f32, f32),
}

impl DimensionMatch {
    pub const fn new(smallest: (f32, f32), largest: (f32, f32)) -> Self {
        Self { smallest, largest }
    }
}

impl PlatformMatcher for DimensionMatch {
    fn matches(&self, ctx: &PlatformContext) -> bool {
        let dims = ctx.dimensions();
        let (smallest, largest) = (dims.smallest(), dims.largest());
        smallest > self.smallest.0
            && smallest < self.smallest.1
            && largest > self.largest.0
            && largest < self.largest.1
    }
}

/// Any of the named host globals is present
#[derive(Clone, Debug, Default)]
pub struct GlobalMatch {
    names: Vec<String>,
}

impl GlobalMatch {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl PlatformMatcher for GlobalMatch {
    fn matches(&self, ctx: &PlatformContext) -> bool {
        self.names.iter().any(|name| ctx.has_global(name))
    }
}

/// Matches when any inner matcher does
#[derive(Clone, Default)]
pub struct AnyMatch(pub Vec<Arc<dyn PlatformMatcher>>);

impl PlatformMatcher for AnyMatch {
    fn matches(&self, ctx: &PlatformContext) -> bool {
        self.0.iter().any(|m| m.matches(ctx))
    }
}

impl std::fmt::Debug for AnyMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("AnyMatch").field(&self.0.len()).finish()
    }
}

/// Version from capture groups 1 and 2 of a user-agent pattern.
///
/// The pattern compiles on first use; an invalid pattern logs once and never
/// yields a version. Use [`validate`](Self::validate) to fail early.
#[derive(Clone, Debug)]
pub struct UserAgentVersion {
    pattern: LazyRegex,
}

impl UserAgentVersion {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: LazyRegex::new(pattern, false),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern.pattern
    }

    pub fn validate(&self) -> Result<(), regex::Error> {
        self.pattern.build().map(|_| ())
    }
}

impl VersionParser for UserAgentVersion {
    fn parse_version(&self, ctx: &PlatformContext) -> Option<RawVersion> {
        ctx.match_user_agent_version(self.pattern.get()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimensions::{Dimensions, StaticDimensions};

    const IPHONE_UA: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 9_1 like Mac OS X) AppleWebKit/601.1.46";

    #[test]
    fn test_user_agent_match() {
        let ctx = PlatformContext::new().with_user_agent(IPHONE_UA);
        assert!(UserAgentMatch::new("ios", Some("iphone|ipad|ipod")).matches(&ctx));
        assert!(UserAgentMatch::new("iphone", None).matches(&ctx));
        assert!(!UserAgentMatch::new("android", Some("android|silk")).matches(&ctx));
    }

    #[test]
    fn test_expressions_compile_once() {
        let ctx = PlatformContext::new()
            .with_user_agent(IPHONE_UA)
            .with_navigator_platform("iPhone");

        let ios = UserAgentMatch::new("ios", Some("iphone|ipad|ipod"));
        assert!(!ios.expression.is_compiled());
        assert!(ios.matches(&ctx));
        assert!(ios.expression.is_compiled());

        let compiled = ios.expression.get().map(|rgx| rgx as *const Regex);
        assert!(ios.matches(&ctx));
        assert_eq!(ios.expression.get().map(|rgx| rgx as *const Regex), compiled);

        let navigator = NavigatorPlatformMatch::new("IPHONE");
        assert!(navigator.matches(&ctx));
        assert!(navigator.expression.is_compiled());
    }

    #[test]
    fn test_query_skips_user_agent_expression() {
        let ctx = PlatformContext::new()
            .with_url("/?strataplatform=android")
            .with_user_agent(IPHONE_UA);

        let ios = UserAgentMatch::new("ios", Some("iphone|ipad|ipod"));
        assert!(!ios.matches(&ctx));
        assert!(!ios.expression.is_compiled());
        assert!(UserAgentMatch::new("android", Some("android|silk")).matches(&ctx));
    }

    #[test]
    fn test_invalid_expression_never_matches() {
        let broken = UserAgentMatch::new("broken", Some("(unclosed"));
        let ctx = PlatformContext::new().with_user_agent("(unclosed");
        assert!(!broken.matches(&ctx));
        assert!(!broken.matches(&ctx));
        assert_eq!(broken.expression(), "(unclosed");
    }

    #[test]
    fn test_dimension_match_open_ranges() {
        let phablet = DimensionMatch::new((390.0, 520.0), (620.0, 800.0));

        let ctx = PlatformContext::new()
            .with_dimensions(StaticDimensions(Dimensions::new(414.0, 736.0)));
        assert!(phablet.matches(&ctx));

        let ctx = PlatformContext::new()
            .with_dimensions(StaticDimensions(Dimensions::new(390.0, 736.0)));
        assert!(!phablet.matches(&ctx));
    }

    #[test]
    fn test_global_match() {
        let cordova = GlobalMatch::new(["cordova", "PhoneGap", "phonegap"]);
        assert!(cordova.matches(&PlatformContext::new().with_global("PhoneGap")));
        assert!(!cordova.matches(&PlatformContext::new()));
    }

    #[test]
    fn test_any_match() {
        let any = AnyMatch(vec![
            Arc::new(NavigatorPlatformMatch::new("macintel")),
            Arc::new(GlobalMatch::new(["electron"])),
        ]);
        assert!(any.matches(&PlatformContext::new().with_navigator_platform("MacIntel")));
        assert!(any.matches(&PlatformContext::new().with_global("electron")));
        assert!(!any.matches(&PlatformContext::new()));
    }

    #[test]
    fn test_user_agent_version() {
        let ctx = PlatformContext::new().with_user_agent(IPHONE_UA);
        let parser = UserAgentVersion::new(r"OS (\d+)_(\d+)?");
        assert_eq!(
            parser.parse_version(&ctx),
            Some(RawVersion::new("9", Some("1")))
        );
    }

    #[test]
    fn test_invalid_version_pattern() {
        let parser = UserAgentVersion::new(r"OS (\d+");
        assert!(parser.validate().is_err());
        let ctx = PlatformContext::new().with_user_agent(IPHONE_UA);
        assert!(parser.parse_version(&ctx).is_none());
    }

    #[test]
    fn test_closure_matcher() {
        let matcher = |ctx: &PlatformContext| ctx.query("debug").is_some();
        assert!(matcher.matches(&PlatformContext::new().with_url("/?debug=1")));
    }
}
