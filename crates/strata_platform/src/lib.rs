//! Strata Platform
//!
//! Platform identification and capability-hierarchy resolution for the
//! Strata UI framework:
//!
//! - **Registry**: platform descriptors with parent (`subsets`) and implied
//!   (`superset`) relations, match predicates and version parsers
//! - **Resolver**: builds the most specific chain of matching platforms,
//!   e.g. `mobile → ios → iphone`, with an engine such as `cordova` on top
//! - **Platform**: the resolved identity, versions, settings, ready signal,
//!   resize listeners and engine hooks
//!
//! # Example
//!
//! ```rust
//! use strata_platform::{builtin, Platform, PlatformContext};
//!
//! let ctx = PlatformContext::new()
//!     .with_user_agent("Mozilla/5.0 (Linux; Android 5.1.1; Nexus 5 Build/LMY48B)")
//!     .with_global("cordova");
//!
//! let mut platform = Platform::new(builtin::default_registry(), ctx);
//! platform.load(None).unwrap();
//!
//! assert_eq!(platform.platforms(), ["cordova", "mobile", "android"]);
//! assert_eq!(platform.versions_of("android").map(|v| v.str.as_str()), Some("5.1"));
//! ```

pub mod builtin;
pub mod config;
pub mod context;
pub mod descriptor;
pub mod dimensions;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod node;
pub mod platform;
pub mod ready;
pub mod registry;
pub mod resize;
pub mod resolver;
pub mod version;

pub use config::{DescriptorConfig, PlatformConfig};
pub use context::{parse_query_string, PlatformContext, PLATFORM_QUERY_KEY};
pub use descriptor::{PlatformDescriptor, Settings};
pub use dimensions::{DimensionProvider, Dimensions, StaticDimensions};
pub use engine::{EngineMethods, EngineReady, NativeHook};
pub use error::{PlatformError, Result};
pub use matcher::{
    AnyMatch, DimensionMatch, GlobalMatch, NavigatorPlatformMatch, PlatformMatcher,
    UserAgentMatch, UserAgentVersion, VersionParser,
};
pub use node::{NodeArena, NodeId, PlatformNode};
pub use platform::{Platform, PlatformSnapshot};
pub use ready::{DomReady, ImmediateReady, ReadyCallback, ReadySignal};
pub use registry::PlatformRegistry;
pub use resize::{ResizeDispatcher, RESIZE_DEBOUNCE};
pub use resolver::{Resolution, Resolver, MOBILE_WEB};
pub use version::{PlatformVersion, RawVersion};
