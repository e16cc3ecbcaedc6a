//! Child delegation: secondary environments consulted after a primary failure
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use unitload_core::{ResolutionContext, ResolvedUnit, UnitName};

/// A resolution environment that can be asked for a unit without going
/// through its own public entry point.
pub trait SecondaryEnvironment: Send + Sync {
    /// `None` when the environment cannot (or, for this `ctx`, must not)
    /// produce the unit.
    fn raw_lookup(&self, name: &UnitName, ctx: &ResolutionContext) -> Option<ResolvedUnit>;
}

pub struct ChildDelegationFallback {
    children: RwLock<Vec<Arc<dyn SecondaryEnvironment>>>,
    enabled: AtomicBool,
}

impl Default for ChildDelegationFallback {
    fn default() -> Self {
        Self {
            children: RwLock::new(Vec::new()),
            enabled: AtomicBool::new(true),
        }
    }
}

impl ChildDelegationFallback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_child(&self, child: Arc<dyn SecondaryEnvironment>) {
        self.children.write().push(child);
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.children.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.read().is_empty()
    }

    /// First child with an answer wins. Disabled or childless: `None`.
    pub fn raw_lookup(&self, name: &UnitName, ctx: &ResolutionContext) -> Option<ResolvedUnit> {
        if !self.is_enabled() {
            return None;
        }

        let children: Vec<Arc<dyn SecondaryEnvironment>> = self.children.read().clone();
        children.iter().enumerate().find_map(|(position, child)| {
            let unit = child.raw_lookup(name, ctx)?;
            tracing::debug!(unit = %name, child = position, "resolved by child");
            Some(unit)
        })
    }
}

impl std::fmt::Debug for ChildDelegationFallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChildDelegationFallback")
            .field("children", &self.len())
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
