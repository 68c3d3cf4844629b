//! Resolution-scoped platform nodes
//!
//! Nodes live in a [`NodeArena`] for the duration of one resolution pass and
//! refer to each other by [`NodeId`]. Splicing a superset or an engine in the
//! middle of a chain only rewrites keys.

use std::ops::Index;
use std::sync::Arc;

use slotmap::{new_key_type, SlotMap};

use crate::context::PlatformContext;
use crate::descriptor::{PlatformDescriptor, Settings};
use crate::engine::EngineMethods;
use crate::version::PlatformVersion;

new_key_type! {
    /// Key of a node inside a [`NodeArena`]
    pub struct NodeId;
}

/// One descriptor placed in a candidate chain
#[derive(Debug)]
pub struct PlatformNode {
    descriptor: Arc<PlatformDescriptor>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) child: Option<NodeId>,
    /// Steps from this node down to the leaf; only set on chain roots
    pub(crate) depth: usize,
}

impl PlatformNode {
    fn new(descriptor: Arc<PlatformDescriptor>) -> Self {
        Self {
            descriptor,
            parent: None,
            child: None,
            depth: 0,
        }
    }

    pub fn descriptor(&self) -> &Arc<PlatformDescriptor> {
        &self.descriptor
    }

    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    pub fn is_engine(&self) -> bool {
        self.descriptor.is_engine()
    }

    pub fn superset(&self) -> Option<&str> {
        self.descriptor.superset()
    }

    pub fn methods(&self) -> &EngineMethods {
        self.descriptor.methods()
    }

    pub fn settings(&self) -> &Settings {
        self.descriptor.settings()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn child(&self) -> Option<NodeId> {
        self.child
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// An override names the platform to pretend to be; it replaces the
    /// predicate for every node except engines. An empty override is ignored.
    pub fn is_match(&self, ctx: &PlatformContext) -> bool {
        match ctx.platform_override() {
            Some(platform) if !platform.is_empty() && !self.is_engine() => platform == self.name(),
            _ => self.descriptor.is_match(ctx),
        }
    }

    pub fn version(&self, ctx: &PlatformContext) -> Option<PlatformVersion> {
        let raw = self.descriptor.parse_version(ctx)?;
        PlatformVersion::from_raw(&raw)
    }
}

/// Arena owning every node created during one resolution pass
#[derive(Debug, Default)]
pub struct NodeArena {
    nodes: SlotMap<NodeId, PlatformNode>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
        }
    }

    pub fn create(&mut self, descriptor: Arc<PlatformDescriptor>) -> NodeId {
        self.nodes.insert(PlatformNode::new(descriptor))
    }

    pub fn get(&self, id: NodeId) -> Option<&PlatformNode> {
        self.nodes.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut PlatformNode> {
        self.nodes.get_mut(id)
    }

    pub(crate) fn set_parent(&mut self, id: NodeId, parent: Option<NodeId>) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.parent = parent;
        }
    }

    pub(crate) fn set_child(&mut self, id: NodeId, child: Option<NodeId>) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.child = child;
        }
    }

    /// Follow parent links up to the top of the chain
    pub fn root_of(&self, mut id: NodeId) -> NodeId {
        while let Some(parent) = self.nodes.get(id).and_then(|n| n.parent) {
            id = parent;
        }
        id
    }

    /// Nodes from `root` down through child links
    pub fn chain(&self, root: NodeId) -> Chain<'_> {
        Chain {
            arena: self,
            next: Some(root),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Index<NodeId> for NodeArena {
    type Output = PlatformNode;

    fn index(&self, id: NodeId) -> &PlatformNode {
        &self.nodes[id]
    }
}

/// Iterator over a chain, root first
pub struct Chain<'a> {
    arena: &'a NodeArena,
    next: Option<NodeId>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = (NodeId, &'a PlatformNode);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let node = self.arena.get(id)?;
        self.next = node.child;
        Some((id, node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(name: &str) -> Arc<PlatformDescriptor> {
        Arc::new(PlatformDescriptor::new(name))
    }

    #[test]
    fn test_chain_and_root() {
        let mut arena = NodeArena::new();
        let mobile = arena.create(descriptor("mobile"));
        let ios = arena.create(descriptor("ios"));
        let iphone = arena.create(descriptor("iphone"));

        arena.set_child(mobile, Some(ios));
        arena.set_parent(ios, Some(mobile));
        arena.set_child(ios, Some(iphone));
        arena.set_parent(iphone, Some(ios));

        assert_eq!(arena.root_of(iphone), mobile);
        let names: Vec<_> = arena.chain(mobile).map(|(_, n)| n.name()).collect();
        assert_eq!(names, ["mobile", "ios", "iphone"]);
    }

    #[test]
    fn test_override_skips_predicate() {
        let mut ctx = PlatformContext::new();
        ctx.set_platform_override(Some("android".to_string()));

        let android = PlatformNode::new(descriptor("android"));
        let ios = PlatformNode::new(Arc::new(
            PlatformDescriptor::new("ios").with_matcher(|_: &PlatformContext| true),
        ));
        assert!(android.is_match(&ctx));
        assert!(!ios.is_match(&ctx));
    }

    #[test]
    fn test_empty_override_ignored() {
        let mut ctx = PlatformContext::new();
        ctx.set_platform_override(Some(String::new()));

        let ios = PlatformNode::new(Arc::new(
            PlatformDescriptor::new("ios").with_matcher(|_: &PlatformContext| true),
        ));
        assert!(ios.is_match(&ctx));
        assert!(!PlatformNode::new(descriptor("")).is_match(&ctx));
    }

    #[test]
    fn test_override_does_not_apply_to_engines() {
        let mut ctx = PlatformContext::new();
        ctx.set_platform_override(Some("cordova".to_string()));

        let cordova = PlatformNode::new(Arc::new(PlatformDescriptor::new("cordova").engine()));
        assert!(!cordova.is_match(&ctx));
    }

    #[test]
    fn test_no_matcher_never_matches() {
        let node = PlatformNode::new(descriptor("core"));
        assert!(!node.is_match(&PlatformContext::new()));
    }
}
