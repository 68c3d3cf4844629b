//! Platform hierarchy resolution
//!
//! Given a registry and an environment, the resolver:
//!
//! 1. Asks every registered platform whether it matches and, if so, climbs
//!    its candidate parents until it reaches a root.
//! 2. Keeps the deepest non-engine chain (ties go to the first found) and the
//!    last matching engine.
//! 3. Puts the engine on top of the chain, splices in every `superset`, and
//!    reads the chain root to leaf.
//!
//! Parent search is depth-first, first match wins, in registration order.
//! A longer chain through a later-registered parent is never preferred.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::context::PlatformContext;
use crate::descriptor::{PlatformDescriptor, Settings};
use crate::error::Result;
use crate::node::{NodeArena, NodeId};
use crate::registry::PlatformRegistry;
use crate::version::PlatformVersion;

/// Platform name appended when running on a mobile device outside Cordova
pub const MOBILE_WEB: &str = "mobileweb";

/// Outcome of one resolution pass
#[derive(Clone, Debug, Default)]
pub struct Resolution {
    /// Root first, most specific last
    pub platforms: Vec<String>,
    /// Only platforms with a parsed version have an entry
    pub versions: IndexMap<String, PlatformVersion>,
    /// Settings merged root to leaf; later platforms override earlier ones
    pub settings: Settings,
    /// Active engine, if one matched
    pub engine: Option<Arc<PlatformDescriptor>>,
}

impl Resolution {
    pub fn is(&self, name: &str) -> bool {
        self.platforms.iter().any(|p| p == name)
    }
}

pub struct Resolver<'a> {
    registry: &'a PlatformRegistry,
    ctx: &'a PlatformContext,
    arena: NodeArena,
}

impl<'a> Resolver<'a> {
    /// Fails if the registry's relations contain a cycle
    pub fn new(registry: &'a PlatformRegistry, ctx: &'a PlatformContext) -> Result<Self> {
        registry.validate()?;
        Ok(Self {
            registry,
            ctx,
            arena: NodeArena::new(),
        })
    }

    pub fn arena(&self) -> &NodeArena {
        &self.arena
    }

    /// Build the chain for one candidate. Returns its root with `depth` set,
    /// or `None` if the candidate does not match.
    pub fn match_platform(&mut self, name: &str) -> Option<NodeId> {
        let node = self.arena.create(self.registry.get(name));
        let root = self.get_root(node)?;

        let depth = self.arena.chain(root).count().saturating_sub(1);
        if let Some(root_node) = self.arena.get_mut(root) {
            root_node.depth = depth;
        }
        trace!("Platform '{}' matched with root '{}' at depth {}", name, self.arena[root].name(), depth);
        Some(root)
    }

    fn get_root(&mut self, id: NodeId) -> Option<NodeId> {
        if !self.arena[id].is_match(self.ctx) {
            return None;
        }

        let parents = self.registry.subset_parents(self.arena[id].name());
        if parents.is_empty() {
            return Some(id);
        }

        for parent in parents {
            let parent_id = self.arena.create(parent);
            self.arena.set_child(parent_id, Some(id));

            if let Some(root) = self.get_root(parent_id) {
                self.arena.set_parent(id, Some(parent_id));
                return Some(root);
            }
        }
        None
    }

    /// Insert `id`'s superset between it and its current parent
    fn insert_superset(&mut self, id: NodeId) {
        let Some(superset) = self.arena[id].superset().map(|name| self.registry.get(name)) else {
            return;
        };
        let superset_id = self.arena.create(superset);
        let previous_parent = self.arena[id].parent();

        self.arena.set_parent(superset_id, previous_parent);
        self.arena.set_child(superset_id, Some(id));
        if let Some(parent) = previous_parent {
            self.arena.set_child(parent, Some(superset_id));
        }
        self.arena.set_parent(id, Some(superset_id));
    }

    /// Run the full resolution
    pub fn resolve(mut self) -> Resolution {
        let registry = self.registry;
        let mut root: Option<NodeId> = None;
        let mut engine: Option<NodeId> = None;

        for descriptor in registry.all() {
            let Some(matched) = self.match_platform(descriptor.name()) else {
                continue;
            };

            if self.arena[matched].is_engine() {
                engine = Some(matched);
            } else if root.map_or(true, |r| self.arena[matched].depth() > self.arena[r].depth()) {
                root = Some(matched);
            }
        }

        if root.is_none() {
            if let Some(default) = registry.default_name() {
                debug!("No platform matched, falling back to '{}'", default);
                root = Some(self.arena.create(registry.get(default)));
            }
        }

        let mut active_engine = None;
        if let Some(engine_id) = engine {
            if let Some(platform_root) = root {
                self.arena.set_child(engine_id, Some(platform_root));
                self.arena.set_parent(platform_root, Some(engine_id));
            }
            debug!("Engine '{}' is active", self.arena[engine_id].name());
            active_engine = Some(self.arena[engine_id].descriptor().clone());
            root = Some(engine_id);
        }

        let mut resolution = Resolution {
            engine: active_engine,
            ..Default::default()
        };
        let Some(root) = root else {
            return resolution;
        };

        let mut cursor = Some(root);
        while let Some(id) = cursor {
            self.insert_superset(id);
            cursor = self.arena[id].child();
        }

        // a superset may have been inserted above the old root
        let root = self.arena.root_of(root);

        for (_, node) in self.arena.chain(root) {
            resolution.platforms.push(node.name().to_string());
            if let Some(version) = node.version(self.ctx) {
                resolution.versions.insert(node.name().to_string(), version);
            }
            for (key, value) in node.settings() {
                resolution.settings.insert(key.clone(), value.clone());
            }
        }

        if resolution.is("mobile") && !resolution.is("cordova") {
            resolution.platforms.push(MOBILE_WEB.to_string());
        }

        debug!("Resolved platforms: {:?}", resolution.platforms);
        resolution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::UserAgentVersion;
    use pretty_assertions::assert_eq;

    fn always(_: &PlatformContext) -> bool {
        true
    }

    fn never(_: &PlatformContext) -> bool {
        false
    }

    fn resolve(registry: &PlatformRegistry, ctx: &PlatformContext) -> Resolution {
        Resolver::new(registry, ctx).unwrap().resolve()
    }

    #[test]
    fn test_match_platform_depth() {
        let mut registry = PlatformRegistry::new();
        registry
            .register(PlatformDescriptor::new("mobile").with_subsets(["ios"]).with_matcher(always))
            .register(PlatformDescriptor::new("ios").with_subsets(["iphone"]).with_matcher(always))
            .register(PlatformDescriptor::new("iphone").with_matcher(always));

        let ctx = PlatformContext::new();
        let mut resolver = Resolver::new(&registry, &ctx).unwrap();

        let root = resolver.match_platform("iphone").unwrap();
        assert_eq!(resolver.arena()[root].name(), "mobile");
        assert_eq!(resolver.arena()[root].depth(), 2);

        let root = resolver.match_platform("mobile").unwrap();
        assert_eq!(resolver.arena()[root].depth(), 0);
    }

    #[test]
    fn test_dead_branch() {
        let mut registry = PlatformRegistry::new();
        registry
            .register(PlatformDescriptor::new("ios").with_subsets(["iphone"]).with_matcher(never))
            .register(PlatformDescriptor::new("iphone").with_matcher(always));

        let ctx = PlatformContext::new();
        let mut resolver = Resolver::new(&registry, &ctx).unwrap();
        assert!(resolver.match_platform("iphone").is_none());
    }

    #[test]
    fn test_first_matching_parent_wins() {
        // both parents match; "first" is registered first even though
        // "second" would give a longer chain
        let mut registry = PlatformRegistry::new();
        registry
            .register(PlatformDescriptor::new("first").with_subsets(["leaf"]).with_matcher(always))
            .register(PlatformDescriptor::new("top").with_subsets(["second"]).with_matcher(always))
            .register(PlatformDescriptor::new("second").with_subsets(["leaf"]).with_matcher(always))
            .register(PlatformDescriptor::new("leaf").with_matcher(always));

        let ctx = PlatformContext::new();
        let mut resolver = Resolver::new(&registry, &ctx).unwrap();
        let root = resolver.match_platform("leaf").unwrap();
        let names: Vec<_> = resolver.arena().chain(root).map(|(_, n)| n.name()).collect();
        assert_eq!(names, ["first", "leaf"]);
    }

    #[test]
    fn test_equal_depth_keeps_first() {
        let mut registry = PlatformRegistry::new();
        registry
            .register(PlatformDescriptor::new("alpha").with_matcher(always))
            .register(PlatformDescriptor::new("beta").with_matcher(always));

        let resolution = resolve(&registry, &PlatformContext::new());
        assert_eq!(resolution.platforms, ["alpha"]);
    }

    #[test]
    fn test_default_platform() {
        let mut registry = PlatformRegistry::new();
        registry
            .register(PlatformDescriptor::new("core").with_setting("mode", "ios"))
            .register(PlatformDescriptor::new("android").with_matcher(never))
            .set_default("core");

        let resolution = resolve(&registry, &PlatformContext::new());
        assert_eq!(resolution.platforms, ["core"]);
        assert_eq!(resolution.settings["mode"], "ios");
    }

    #[test]
    fn test_no_default_no_match() {
        let mut registry = PlatformRegistry::new();
        registry.register(PlatformDescriptor::new("android").with_matcher(never));

        let resolution = resolve(&registry, &PlatformContext::new());
        assert!(resolution.platforms.is_empty());
        assert!(resolution.engine.is_none());
    }

    #[test]
    fn test_superset_above_root() {
        let mut registry = PlatformRegistry::new();
        registry
            .register(PlatformDescriptor::new("tablet"))
            .register(PlatformDescriptor::new("ipad").with_superset("tablet").with_matcher(always));

        let resolution = resolve(&registry, &PlatformContext::new());
        assert_eq!(resolution.platforms, ["tablet", "ipad"]);
    }

    #[test]
    fn test_superset_spliced_mid_chain() {
        let mut registry = PlatformRegistry::new();
        registry
            .register(PlatformDescriptor::new("ios").with_subsets(["ipad"]).with_matcher(always))
            .register(PlatformDescriptor::new("ipad").with_superset("tablet").with_matcher(always));

        let resolution = resolve(&registry, &PlatformContext::new());
        assert_eq!(resolution.platforms, ["ios", "tablet", "ipad"]);
    }

    #[test]
    fn test_engine_without_platform_root() {
        let mut registry = PlatformRegistry::new();
        registry.register(PlatformDescriptor::new("electron").engine().with_matcher(always));

        let resolution = resolve(&registry, &PlatformContext::new());
        assert_eq!(resolution.platforms, ["electron"]);
        assert_eq!(resolution.engine.unwrap().name(), "electron");
    }

    #[test]
    fn test_last_matching_engine_wins() {
        let mut registry = PlatformRegistry::new();
        registry
            .register(PlatformDescriptor::new("electron").engine().with_matcher(always))
            .register(PlatformDescriptor::new("cordova").engine().with_matcher(always))
            .register(PlatformDescriptor::new("android").with_matcher(always));

        let resolution = resolve(&registry, &PlatformContext::new());
        assert_eq!(resolution.engine.unwrap().name(), "cordova");
        assert_eq!(resolution.platforms, ["cordova", "android"]);
    }

    #[test]
    fn test_versions_only_for_parsed() {
        let mut registry = PlatformRegistry::new();
        registry
            .register(
                PlatformDescriptor::new("android")
                    .with_matcher(always)
                    .with_version_parser(UserAgentVersion::new(r"Android (\d+).(\d+)?")),
            )
            .register(PlatformDescriptor::new("tablet").with_superset("android").with_matcher(never));

        let ctx = PlatformContext::new().with_user_agent("Mozilla/5.0 (Linux; Android 5.1.1; Nexus 7)");
        let resolution = resolve(&registry, &ctx);
        assert_eq!(resolution.versions.len(), 1);
        assert_eq!(resolution.versions["android"].str, "5.1");
    }

    #[test]
    fn test_settings_leaf_wins() {
        let mut registry = PlatformRegistry::new();
        registry
            .register(
                PlatformDescriptor::new("ios")
                    .with_subsets(["ipad"])
                    .with_matcher(always)
                    .with_setting("keyboardHeight", 300)
                    .with_setting("mode", "ios"),
            )
            .register(
                PlatformDescriptor::new("ipad")
                    .with_matcher(always)
                    .with_setting("keyboardHeight", 500),
            );

        let resolution = resolve(&registry, &PlatformContext::new());
        assert_eq!(resolution.settings["keyboardHeight"], 500);
        assert_eq!(resolution.settings["mode"], "ios");
    }

    #[test]
    fn test_cycle_rejected() {
        let mut registry = PlatformRegistry::new();
        registry
            .register(PlatformDescriptor::new("a").with_subsets(["b"]).with_matcher(always))
            .register(PlatformDescriptor::new("b").with_subsets(["a"]).with_matcher(always));

        let ctx = PlatformContext::new();
        assert!(Resolver::new(&registry, &ctx).is_err());
    }
}
