//! Unitload Policy: which names skip the transformer chain
//!
//! ```text
//! name → delegate prefix? ──yes──→ host default loader (not cached here)
//!            │ no
//!            ↓
//!        isolate prefix? ──yes──→ raw bytes, defined as-is
//!            │ no
//!            ↓
//!        transformer chain
//! ```
//!
//! # Example
//!
//! ```
//! use unitload_policy::{Bucket, Classification, ExclusionPolicy};
//!
//! let policy = ExclusionPolicy::new();
//! policy.add(Bucket::Delegate, "std.");
//! policy.add(Bucket::Isolate, "vendor.codec.");
//!
//! assert_eq!(policy.classify("std.io.Reader"), Classification::Delegate);
//! assert_eq!(policy.classify("vendor.codec.Lz4"), Classification::Isolate);
//! assert_eq!(policy.classify("game.World"), Classification::Transform);
//! ```

pub mod policy;
pub mod rule;

pub use policy::ExclusionPolicy;
pub use rule::{Bucket, Classification, ExclusionRule};
