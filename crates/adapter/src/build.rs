//! Swappable reference to the running application build.

use std::sync::Arc;

use arc_swap::ArcSwap;

/// Shared handle to the current application build.
///
/// Each request reads the build that is current when it arrives. Swapping in a
/// new build affects later requests only, requests in flight keep theirs.
#[derive(Debug)]
pub struct BuildRef<B> {
    current: Arc<ArcSwap<B>>,
}

impl<B> BuildRef<B> {
    pub fn new(build: B) -> Self {
        Self { current: Arc::new(ArcSwap::from_pointee(build)) }
    }

    pub fn load(&self) -> Arc<B> {
        self.current.load_full()
    }

    /// Replaces the current build, returning the previous one.
    pub fn swap(&self, build: B) -> Arc<B> {
        self.current.swap(Arc::new(build))
    }
}

impl<B> Clone for BuildRef<B> {
    fn clone(&self) -> Self {
        Self { current: Arc::clone(&self.current) }
    }
}
