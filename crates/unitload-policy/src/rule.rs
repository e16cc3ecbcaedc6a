//! Exclusion rules
//!
//! A rule routes every unit name starting with its prefix into a bucket.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where an excluded name goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    /// Handed to the host's default loader; chain bypassed, nothing cached locally
    Delegate,
    /// Loaded from the sources as-is; chain bypassed, cached locally
    Isolate,
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bucket::Delegate => write!(f, "delegate"),
            Bucket::Isolate => write!(f, "isolate"),
        }
    }
}

/// A single exclusion rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionRule {
    /// Name prefix (ex: "org.vendor.")
    pub prefix: String,

    pub bucket: Bucket,
}

impl ExclusionRule {
    pub fn new(prefix: impl Into<String>, bucket: Bucket) -> Self {
        Self {
            prefix: prefix.into(),
            bucket,
        }
    }

    pub fn delegate(prefix: impl Into<String>) -> Self {
        Self::new(prefix, Bucket::Delegate)
    }

    pub fn isolate(prefix: impl Into<String>) -> Self {
        Self::new(prefix, Bucket::Isolate)
    }

    pub fn matches(&self, name: &str) -> bool {
        name.starts_with(&self.prefix)
    }
}

/// Result of classifying a unit name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Delegate,
    Isolate,
    /// Not excluded: the name goes through the transformer chain
    Transform,
}

impl From<Bucket> for Classification {
    fn from(bucket: Bucket) -> Self {
        match bucket {
            Bucket::Delegate => Classification::Delegate,
            Bucket::Isolate => Classification::Isolate,
        }
    }
}
