//! Packaged archive source: entries + manifest + signatures
use crate::manifest::Manifest;
use crate::signing::{verified_signers, EntrySignature};
use crate::source::{ArtifactConnection, ArtifactSource, SourceError};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use unitload_core::SealingMetadata;

/// On-disk form of an archive (JSON, entry data base64-encoded).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArchiveBundle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest: Option<Manifest>,
    pub entries: Vec<BundleEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleEntry {
    pub path: String,
    /// base64-encoded bytes
    pub data: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub signatures: Vec<EntrySignature>,
}

struct ArchiveEntry {
    bytes: Arc<[u8]>,
    signatures: Vec<EntrySignature>,
}

pub struct ArchiveSource {
    location: String,
    manifest: Option<Manifest>,
    entries: HashMap<String, ArchiveEntry>,
}

impl ArchiveSource {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            manifest: None,
            entries: HashMap::new(),
        }
    }

    pub fn with_manifest(mut self, manifest: Manifest) -> Self {
        self.manifest = Some(manifest);
        self
    }

    pub fn with_entry(self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.with_signed_entry(path, bytes, Vec::new())
    }

    pub fn with_signed_entry(
        mut self,
        path: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
        signatures: Vec<EntrySignature>,
    ) -> Self {
        self.entries.insert(
            path.into(),
            ArchiveEntry {
                bytes: Arc::from(bytes.into()),
                signatures,
            },
        );
        self
    }

    /// Loads a JSON bundle from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let location = format!("archive:{}", path.display());
        let json = std::fs::read_to_string(path).map_err(|e| SourceError::io(location.clone(), e))?;
        let bundle: ArchiveBundle = serde_json::from_str(&json).map_err(|e| SourceError::Bundle {
            location: location.clone(),
            message: e.to_string(),
        })?;
        Self::from_bundle(location, bundle)
    }

    pub fn from_bundle(location: impl Into<String>, bundle: ArchiveBundle) -> Result<Self, SourceError> {
        let location = location.into();
        let mut archive = Self::new(location.clone());
        archive.manifest = bundle.manifest;

        for entry in bundle.entries {
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(&entry.data)
                .map_err(|e| SourceError::Bundle {
                    location: location.clone(),
                    message: format!("entry {}: {}", entry.path, e),
                })?;
            archive = archive.with_signed_entry(entry.path, bytes, entry.signatures);
        }

        tracing::debug!(location = %archive.location, entries = archive.entries.len(), "archive loaded");
        Ok(archive)
    }

    /// Packaging helper: the bundle form of this archive, entries sorted by path.
    pub fn to_bundle(&self) -> ArchiveBundle {
        let mut entries: Vec<BundleEntry> = self
            .entries
            .iter()
            .map(|(path, entry)| BundleEntry {
                path: path.clone(),
                data: base64::engine::general_purpose::STANDARD.encode(&entry.bytes),
                signatures: entry.signatures.clone(),
            })
            .collect();
        entries.sort_by(|a, b| a.path.cmp(&b.path));

        ArchiveBundle {
            manifest: self.manifest.clone(),
            entries,
        }
    }

    pub fn manifest(&self) -> Option<&Manifest> {
        self.manifest.as_ref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ArtifactSource for ArchiveSource {
    fn location(&self) -> &str {
        &self.location
    }

    fn locate(&self, path: &str) -> Result<Option<ArtifactConnection>, SourceError> {
        let Some(entry) = self.entries.get(path) else {
            return Ok(None);
        };

        let signers = verified_signers(&entry.signatures, &entry.bytes, path);
        let sealing = match &self.manifest {
            Some(manifest) => manifest.sealing_metadata(&self.location, signers),
            None => SealingMetadata {
                signers,
                ..SealingMetadata::unsealed(self.location.clone())
            },
        };

        let location = format!("{}!/{}", self.location, path);
        Ok(Some(
            ArtifactConnection::in_memory(location, Arc::clone(&entry.bytes)).with_sealing(sealing),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::SigningKey;
    use std::io::Read;

    fn read_all(connection: &ArtifactConnection) -> Vec<u8> {
        let mut bytes = Vec::new();
        connection.open().unwrap().read_to_end(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_locate_reports_packaging() {
        let key = SigningKey::from_bytes(&[9; 32]);
        let signature = EntrySignature::sign(&key, "vendor", &[1, 2, 3]);
        let archive = ArchiveSource::new("archive:lib")
            .with_manifest(Manifest::new().sealed())
            .with_signed_entry("a/B", vec![1, 2, 3], vec![signature]);

        let connection = archive.locate("a/B").unwrap().unwrap();
        assert_eq!(connection.location(), "archive:lib!/a/B");
        assert_eq!(read_all(&connection), vec![1, 2, 3]);

        let sealing = connection.sealing().unwrap();
        assert!(sealing.is_sealed("a/"));
        assert_eq!(sealing.archive, "archive:lib");
        assert_eq!(sealing.signers.len(), 1);
        assert_eq!(sealing.signers[0].identity, "vendor");
    }

    #[test]
    fn test_archive_without_manifest_is_unsealed() {
        let archive = ArchiveSource::new("archive:plain").with_entry("a/B", vec![4]);
        let connection = archive.locate("a/B").unwrap().unwrap();
        let sealing = connection.sealing().unwrap();

        assert!(!sealing.is_sealed("a/"));
        assert!(sealing.signers.is_empty());
        assert!(archive.locate("a/C").unwrap().is_none());
    }

    #[test]
    fn test_bundle_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lib.json");
        let original = ArchiveSource::new("archive:memory")
            .with_manifest(Manifest::new().with_section_attribute("a/", "Sealed", "true"))
            .with_entry("a/B", vec![1, 2, 3])
            .with_entry("c/D", Vec::<u8>::new());
        std::fs::write(&path, serde_json::to_string(&original.to_bundle()).unwrap()).unwrap();

        let loaded = ArchiveSource::open(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert!(loaded.location().starts_with("archive:"));
        assert!(loaded.manifest().unwrap().is_sealed("a/"));

        let connection = loaded.locate("a/B").unwrap().unwrap();
        assert_eq!(read_all(&connection), vec![1, 2, 3]);
    }

    #[test]
    fn test_corrupt_bundle_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, r#"{"entries":[{"path":"a/B","data":"***"}]}"#).unwrap();

        assert!(matches!(
            ArchiveSource::open(&path),
            Err(SourceError::Bundle { .. })
        ));
    }
}
