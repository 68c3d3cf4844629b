//! Platform registry
//!
//! Descriptors keyed by name, kept in registration order. That order is the
//! iteration order of resolution and therefore the tie-break between
//! candidate parents: the first registered parent whose own chain matches
//! wins, even when a later one would produce a longer chain.

use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::descriptor::PlatformDescriptor;
use crate::error::{PlatformError, Result};

/// Candidate parents of a platform, in registration order
pub type SubsetParents = SmallVec<[Arc<PlatformDescriptor>; 4]>;

#[derive(Clone, Debug, Default)]
pub struct PlatformRegistry {
    descriptors: IndexMap<String, Arc<PlatformDescriptor>>,
    default: Option<String>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

impl PlatformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a descriptor. Overwriting keeps the original
    /// registration position.
    pub fn register(&mut self, descriptor: impl Into<Arc<PlatformDescriptor>>) -> &mut Self {
        let descriptor = descriptor.into();
        tracing::trace!("Registering platform '{}'", descriptor.name());
        self.descriptors
            .insert(descriptor.name().to_string(), descriptor);
        self
    }

    /// The registered descriptor, or an empty one carrying `name`
    pub fn get(&self, name: &str) -> Arc<PlatformDescriptor> {
        self.descriptors
            .get(name)
            .cloned()
            .unwrap_or_else(|| Arc::new(PlatformDescriptor::new(name)))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.descriptors.contains_key(name)
    }

    /// Fallback platform used when nothing matches
    pub fn set_default(&mut self, name: impl Into<String>) -> &mut Self {
        self.default = Some(name.into());
        self
    }

    pub fn default_name(&self) -> Option<&str> {
        self.default.as_deref()
    }

    /// All descriptors in registration order
    pub fn all(&self) -> impl Iterator<Item = &Arc<PlatformDescriptor>> {
        self.descriptors.values()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Descriptors that list `name` among their subsets
    pub fn subset_parents(&self, name: &str) -> SubsetParents {
        self.descriptors
            .values()
            .filter(|d| d.subsets().iter().any(|s| s == name))
            .cloned()
            .collect()
    }

    /// Reject registries whose `subsets` and `superset` relations loop,
    /// alone or combined.
    pub fn validate(&self) -> Result<()> {
        let graph = self.parent_graph();
        let mut marks = FxHashMap::default();
        let mut path = Vec::new();

        for &name in graph.keys() {
            if let Some(cycle) = visit(name, &graph, &mut marks, &mut path) {
                return Err(PlatformError::CyclicConfiguration { cycle });
            }
        }
        Ok(())
    }

    /// Parent to children edges: `subsets` entries point down from the
    /// descriptor, a `superset` points down to the descriptor.
    fn parent_graph(&self) -> IndexMap<&str, SmallVec<[&str; 4]>> {
        let mut graph: IndexMap<&str, SmallVec<[&str; 4]>> = IndexMap::new();
        for descriptor in self.descriptors.values() {
            graph
                .entry(descriptor.name())
                .or_default()
                .extend(descriptor.subsets().iter().map(String::as_str));
            if let Some(superset) = descriptor.superset() {
                graph.entry(superset).or_default().push(descriptor.name());
            }
        }
        graph
    }
}

fn visit<'r>(
    name: &'r str,
    graph: &IndexMap<&'r str, SmallVec<[&'r str; 4]>>,
    marks: &mut FxHashMap<&'r str, Mark>,
    path: &mut Vec<&'r str>,
) -> Option<Vec<String>> {
    match marks.get(name) {
        Some(Mark::Done) => return None,
        Some(Mark::Visiting) => {
            let start = path.iter().position(|n| *n == name).unwrap_or(0);
            let mut cycle: Vec<String> = path[start..].iter().map(|n| n.to_string()).collect();
            cycle.push(name.to_string());
            return Some(cycle);
        }
        None => {}
    }

    marks.insert(name, Mark::Visiting);
    path.push(name);
    for &child in graph.get(name).into_iter().flatten() {
        if let Some(cycle) = visit(child, graph, marks, path) {
            return Some(cycle);
        }
    }
    path.pop();
    marks.insert(name, Mark::Done);
    None
}
