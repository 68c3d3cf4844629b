//! Built-in platform registry
//!
//! Registration order matters: it is the order candidates are tried in and
//! the tie-break between candidate parents.
//!
//! ```text
//! core            default, never matches on its own
//! mobile          implied by android / ios / windowsphone
//! phablet         viewport 390-520 x 620-800
//! tablet          viewport 460-820 x 780-1400
//! android         -> phablet, tablet
//! ios             -> ipad, iphone
//! ipad            superset tablet
//! iphone          -> phablet
//! windowsphone    -> phablet, tablet
//! cordova         engine
//! ```

use crate::descriptor::PlatformDescriptor;
use crate::engine::EngineMethods;
use crate::matcher::{DimensionMatch, GlobalMatch, UserAgentMatch, UserAgentVersion};
use crate::registry::PlatformRegistry;

pub const CORE: &str = "core";
pub const MOBILE: &str = "mobile";
pub const PHABLET: &str = "phablet";
pub const TABLET: &str = "tablet";
pub const ANDROID: &str = "android";
pub const IOS: &str = "ios";
pub const IPAD: &str = "ipad";
pub const IPHONE: &str = "iphone";
pub const WINDOWS_PHONE: &str = "windowsphone";
pub const CORDOVA: &str = "cordova";

/// Registry with every built-in platform and `core` as default
pub fn default_registry() -> PlatformRegistry {
    let mut registry = PlatformRegistry::new();
    register_defaults(&mut registry);
    registry
}

/// Register the built-in platforms into an existing registry
pub fn register_defaults(registry: &mut PlatformRegistry) {
    registry
        .register(core())
        .register(PlatformDescriptor::new(MOBILE))
        .register(
            PlatformDescriptor::new(PHABLET)
                .with_matcher(DimensionMatch::new((390.0, 520.0), (620.0, 800.0))),
        )
        .register(
            PlatformDescriptor::new(TABLET)
                .with_matcher(DimensionMatch::new((460.0, 820.0), (780.0, 1400.0))),
        )
        .register(android())
        .register(ios())
        .register(
            PlatformDescriptor::new(IPAD)
                .with_superset(TABLET)
                .with_setting("keyboardHeight", 500)
                .with_matcher(UserAgentMatch::new(IPAD, None)),
        )
        .register(
            PlatformDescriptor::new(IPHONE)
                .with_subsets([PHABLET])
                .with_matcher(UserAgentMatch::new(IPHONE, None)),
        )
        .register(windows_phone())
        .register(cordova(EngineMethods::new()))
        .set_default(CORE);
}

fn core() -> PlatformDescriptor {
    PlatformDescriptor::new(CORE)
        .with_setting("mode", "ios")
        .with_setting("keyboardHeight", 290)
}

fn android() -> PlatformDescriptor {
    PlatformDescriptor::new(ANDROID)
        .with_superset(MOBILE)
        .with_subsets([PHABLET, TABLET])
        .with_setting("activator", "ripple")
        .with_setting("hoverCSS", false)
        .with_setting("keyboardHeight", 300)
        .with_setting("mode", "md")
        .with_setting("scrollAssist", true)
        .with_matcher(UserAgentMatch::new(ANDROID, Some("android|silk")))
        .with_version_parser(UserAgentVersion::new(r"Android (\d+).(\d+)?"))
}

fn ios() -> PlatformDescriptor {
    PlatformDescriptor::new(IOS)
        .with_superset(MOBILE)
        .with_subsets([IPAD, IPHONE])
        .with_setting("clickBlock", true)
        .with_setting("hoverCSS", false)
        .with_setting("keyboardHeight", 300)
        .with_setting("mode", "ios")
        .with_setting("swipeBackEnabled", true)
        .with_matcher(UserAgentMatch::new(IOS, Some("iphone|ipad|ipod")))
        .with_version_parser(UserAgentVersion::new(r"OS (\d+)_(\d+)?"))
}

fn windows_phone() -> PlatformDescriptor {
    PlatformDescriptor::new(WINDOWS_PHONE)
        .with_superset(MOBILE)
        .with_subsets([PHABLET, TABLET])
        .with_setting("mode", "md")
        .with_matcher(UserAgentMatch::new(WINDOWS_PHONE, Some("windows phone")))
        .with_version_parser(UserAgentVersion::new(r"Windows Phone (\d+).(\d+)?"))
}

/// The Cordova engine, active when a Cordova/PhoneGap global is present.
///
/// Hosts re-register it with their native hooks, usually including a
/// `ready` hook bound to `deviceready`.
pub fn cordova(methods: EngineMethods) -> PlatformDescriptor {
    PlatformDescriptor::new(CORDOVA)
        .engine()
        .with_methods(methods)
        .with_matcher(GlobalMatch::new(["cordova", "PhoneGap", "phonegap"]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_valid() {
        let registry = default_registry();
        assert!(registry.validate().is_ok());
        assert_eq!(registry.default_name(), Some(CORE));
        assert_eq!(registry.len(), 10);
    }

    #[test]
    fn test_registration_order() {
        let registry = default_registry();
        let names: Vec<_> = registry.all().map(|d| d.name()).collect();
        assert_eq!(
            names,
            [CORE, MOBILE, PHABLET, TABLET, ANDROID, IOS, IPAD, IPHONE, WINDOWS_PHONE, CORDOVA]
        );
    }

    #[test]
    fn test_version_patterns_compile() {
        for pattern in [
            r"Android (\d+).(\d+)?",
            r"OS (\d+)_(\d+)?",
            r"Windows Phone (\d+).(\d+)?",
        ] {
            assert!(UserAgentVersion::new(pattern).validate().is_ok());
        }
    }
}
