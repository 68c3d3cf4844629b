//! Viewport dimensions
//!
//! The resolver never measures the viewport itself. Hosts plug in a
//! [`DimensionProvider`]; reads go through a [`DimensionCache`] that is
//! flushed whenever a debounced resize fires.

use std::cell::Cell;

/// Viewport size in logical pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Dimensions {
    pub width: f32,
    pub height: f32,
}

impl Dimensions {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Shorter side of the viewport
    pub fn smallest(&self) -> f32 {
        self.width.min(self.height)
    }

    /// Longer side of the viewport
    pub fn largest(&self) -> f32 {
        self.width.max(self.height)
    }
}

/// Source of the current viewport size
pub trait DimensionProvider {
    fn dimensions(&self) -> Dimensions;
}

impl<F> DimensionProvider for F
where
    F: Fn() -> Dimensions,
{
    fn dimensions(&self) -> Dimensions {
        self()
    }
}

/// Fixed dimensions, for headless hosts and tests
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StaticDimensions(pub Dimensions);

impl DimensionProvider for StaticDimensions {
    fn dimensions(&self) -> Dimensions {
        self.0
    }
}

/// Caches the provider's answer until [`flush`](Self::flush) is called
pub struct DimensionCache {
    provider: Box<dyn DimensionProvider>,
    cached: Cell<Option<Dimensions>>,
}

impl DimensionCache {
    pub fn new(provider: impl DimensionProvider + 'static) -> Self {
        Self {
            provider: Box::new(provider),
            cached: Cell::new(None),
        }
    }

    pub fn get(&self) -> Dimensions {
        if let Some(dims) = self.cached.get() {
            return dims;
        }
        let dims = self.provider.dimensions();
        self.cached.set(Some(dims));
        dims
    }

    pub fn flush(&self) {
        self.cached.set(None);
    }
}

impl Default for DimensionCache {
    fn default() -> Self {
        Self::new(StaticDimensions::default())
    }
}

impl std::fmt::Debug for DimensionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DimensionCache")
            .field("cached", &self.cached.get())
            .finish_non_exhaustive()
    }
}
