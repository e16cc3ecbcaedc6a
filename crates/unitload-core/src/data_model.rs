//! Data Model: RawArtifact, SealingMetadata, CodeOrigin, ResolvedUnit
use crate::name::UnitName;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A verified signer of a packaged entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signer {
    /// Identity declared by the signature (ex: "release@example.org")
    pub identity: String,
    /// Fingerprint of the verifying key (ex: "blake3:…")
    pub fingerprint: String,
}

/// Packaging metadata of an entry that came from a packaged source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealingMetadata {
    /// Location of the archive the entry belongs to
    pub archive: String,
    /// `Sealed` attribute of the manifest main section
    pub main_sealed: Option<bool>,
    /// Per-namespace `Sealed` attributes, keyed by slash path (`a/b/`)
    pub sections: BTreeMap<String, bool>,
    /// Signers whose signature over the entry verified
    pub signers: Vec<Signer>,
}

impl SealingMetadata {
    pub fn unsealed(archive: impl Into<String>) -> Self {
        Self {
            archive: archive.into(),
            ..Self::default()
        }
    }

    /// Per-path attribute first, then the main attribute.
    pub fn is_sealed(&self, namespace_path: &str) -> bool {
        self.sections
            .get(namespace_path)
            .copied()
            .or(self.main_sealed)
            .unwrap_or(false)
    }
}

/// Raw content of a unit as found in a source.
#[derive(Debug, Clone)]
pub struct RawArtifact {
    /// Exactly-sized, immutable bytes
    pub bytes: Arc<[u8]>,
    /// Where the bytes were read from
    pub location: String,
    /// Present when the source is packaged
    pub sealing: Option<SealingMetadata>,
}

impl RawArtifact {
    pub fn new(bytes: impl Into<Arc<[u8]>>, location: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            location: location.into(),
            sealing: None,
        }
    }

    pub fn with_sealing(mut self, sealing: SealingMetadata) -> Self {
        self.sealing = Some(sealing);
        self
    }

    pub fn is_packaged(&self) -> bool {
        self.sealing.is_some()
    }
}

/// Activation record attached to a unit when the host defines it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeOrigin {
    pub location: String,
    pub signers: Vec<Signer>,
}

impl CodeOrigin {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            signers: Vec::new(),
        }
    }

    pub fn with_signers(mut self, signers: Vec<Signer>) -> Self {
        self.signers = signers;
        self
    }
}

struct UnitRecord {
    name: UnitName,
    bytes: Arc<[u8]>,
    origin: Option<CodeOrigin>,
    defined_at: DateTime<Utc>,
}

/// Handle to a unit the host has activated.
///
/// Immutable once created. Clones share the same unit; use
/// [`ResolvedUnit::same_unit`] to compare identity.
#[derive(Clone)]
pub struct ResolvedUnit {
    inner: Arc<UnitRecord>,
}

impl ResolvedUnit {
    pub fn new(name: UnitName, bytes: Arc<[u8]>, origin: Option<CodeOrigin>) -> Self {
        Self {
            inner: Arc::new(UnitRecord {
                name,
                bytes,
                origin,
                defined_at: Utc::now(),
            }),
        }
    }

    pub fn name(&self) -> &UnitName {
        &self.inner.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.inner.bytes
    }

    pub fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.inner.bytes)
    }

    pub fn origin(&self) -> Option<&CodeOrigin> {
        self.inner.origin.as_ref()
    }

    pub fn defined_at(&self) -> DateTime<Utc> {
        self.inner.defined_at
    }

    pub fn digest(&self) -> String {
        crate::digest(&self.inner.bytes)
    }

    /// Identity comparison: true only for clones of the same handle.
    pub fn same_unit(&self, other: &ResolvedUnit) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// JSON summary for reports.
    pub fn summary(&self) -> serde_json::Value {
        json!({
            "name": self.inner.name.as_str(),
            "length": self.inner.bytes.len(),
            "digest": self.digest(),
            "origin": self.inner.origin,
            "defined_at": self.inner.defined_at,
        })
    }
}

impl fmt::Debug for ResolvedUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedUnit")
            .field("name", &self.inner.name)
            .field("length", &self.inner.bytes.len())
            .field("origin", &self.inner.origin)
            .finish()
    }
}
