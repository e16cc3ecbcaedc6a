//! Resolution Context: per-call-chain state threaded through fallback lookups
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ENGINE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of one resolution engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EngineId(u64);

impl EngineId {
    pub fn next() -> Self {
        Self(NEXT_ENGINE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for EngineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "engine#{}", self.0)
    }
}

/// State of one resolution call chain.
///
/// Records which engines are currently consulting their children, so an
/// engine reached again through its own fallback answers "nothing" instead
/// of recursing. Each call chain carries its own copy; unrelated concurrent
/// resolutions never see each other's state.
#[derive(Debug, Clone)]
pub struct ResolutionContext {
    trace_id: String,
    falling_back_from: Vec<EngineId>,
}

impl ResolutionContext {
    /// Context for a fresh top-level resolution.
    pub fn root() -> Self {
        Self {
            trace_id: uuid::Uuid::new_v4().to_string(),
            falling_back_from: Vec::new(),
        }
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    /// Whether `engine` is already consulting its children in this chain.
    pub fn is_falling_back_from(&self, engine: EngineId) -> bool {
        self.falling_back_from.contains(&engine)
    }

    /// Context handed to children while `engine` runs its fallback.
    pub fn fallback_from(&self, engine: EngineId) -> Self {
        let mut next = self.clone();
        next.falling_back_from.push(engine);
        next
    }

    pub fn depth(&self) -> usize {
        self.falling_back_from.len()
    }
}

impl Default for ResolutionContext {
    fn default() -> Self {
        Self::root()
    }
}
