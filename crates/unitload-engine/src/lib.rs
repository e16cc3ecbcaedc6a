//! Unitload Engine: the resolution engine and its caches
//!
//! # Resolution flow
//!
//! ```text
//! resolve(name)
//!   ├─ invalid?            → NotFound(Invalid)
//!   ├─ delegate prefix?    → host.delegate(name)          (not cached)
//!   ├─ resolved cache?     → cached unit
//!   ├─ isolate prefix?     → raw bytes → host.define(name)
//!   └─ otherwise           → remap / unmap → raw bytes → chain → host.define(remapped)
//!
//! any failure above the cache → children (child_delegation) → invalid mark
//! ```
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use unitload_engine::{InMemoryHost, ResolutionEngine};
//! use unitload_sources::ArchiveSource;
//!
//! let engine = ResolutionEngine::new(Arc::new(InMemoryHost::new())).unwrap();
//! engine.add_artifact_source(Arc::new(
//!     ArchiveSource::new("archive:demo").with_entry("demo/Unit", vec![1, 2, 3]),
//! ));
//!
//! let unit = engine.resolve("demo.Unit").unwrap();
//! assert_eq!(unit.bytes(), &[1, 2, 3]);
//! ```

pub mod buffer;
pub mod cache;
pub mod diagnostics;
pub mod engine;
pub mod fallback;
pub mod host;
pub mod metrics;
pub mod namespace;

pub use cache::ArtifactCache;
pub use diagnostics::DumpObserver;
pub use engine::{EngineError, ResolutionEngine};
pub use fallback::{ChildDelegationFallback, SecondaryEnvironment};
pub use host::InMemoryHost;
pub use metrics::EngineMetrics;
pub use namespace::{NamespaceTable, SealingInconsistency};
