//! Unitload Core: unit names, stages, the transformer chain and the host seam
//!
//! Everything the resolution engine and its collaborators agree on lives here.
//! The engine itself (caches, fallback, orchestration) is in `unitload-engine`.
//!
//! # Chain flow
//!
//! ```text
//! raw bytes → stage 1 → stage 2 → … → stage N → host.define(remapped name)
//!                ↓          ↓               ↓
//!           observer   observer        observer   (optional, read-only)
//! ```

pub mod context;
pub mod data_model;
pub mod error;
pub mod host;
pub mod name;
pub mod remap;
pub mod runner;
pub mod stage;

pub use context::{EngineId, ResolutionContext};
pub use data_model::{CodeOrigin, RawArtifact, ResolvedUnit, SealingMetadata, Signer};
pub use error::{ChainError, FailureCause, ResolveError};
pub use host::{HostError, UnitHost};
pub use name::UnitName;
pub use remap::{IdentityRemapper, NameRemapper};
pub use runner::{ChainObserver, StageSnapshot, TransformerChain};
pub use stage::{StageError, TransformerStage};

/// Version of the unitload engine
pub const UNITLOAD_VERSION: &str = "1.0.0";

/// Digest format used across the workspace for byte content.
pub fn digest(data: &[u8]) -> String {
    format!("blake3:{}", blake3::hash(data))
}
