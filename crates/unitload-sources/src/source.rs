//! ArtifactSource trait and the connections it hands out
use std::io::{Cursor, Read};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use unitload_core::SealingMetadata;

/// One search location for raw unit bytes.
pub trait ArtifactSource: Send + Sync {
    /// Printable location (ex: "dir:/opt/mods", "archive:/opt/lib.json")
    fn location(&self) -> &str;

    /// Finds `path` (slash-separated, relative). `Ok(None)` means absent.
    fn locate(&self, path: &str) -> Result<Option<ArtifactConnection>, SourceError>;
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("IO/{location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("BUNDLE/{location}: {message}")]
    Bundle { location: String, message: String },
}

impl SourceError {
    pub fn io(location: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            location: location.into(),
            source,
        }
    }

    pub fn location(&self) -> &str {
        match self {
            Self::Io { location, .. } | Self::Bundle { location, .. } => location,
        }
    }
}

enum Payload {
    File(PathBuf),
    Memory(Arc<[u8]>),
}

/// A located resource: where it is, how to read it, and its packaging.
pub struct ArtifactConnection {
    location: String,
    payload: Payload,
    sealing: Option<SealingMetadata>,
}

impl ArtifactConnection {
    pub fn file(location: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            location: location.into(),
            payload: Payload::File(path.into()),
            sealing: None,
        }
    }

    pub fn in_memory(location: impl Into<String>, bytes: Arc<[u8]>) -> Self {
        Self {
            location: location.into(),
            payload: Payload::Memory(bytes),
            sealing: None,
        }
    }

    pub fn with_sealing(mut self, sealing: SealingMetadata) -> Self {
        self.sealing = Some(sealing);
        self
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Packaging metadata; only packaged sources provide it.
    pub fn sealing(&self) -> Option<&SealingMetadata> {
        self.sealing.as_ref()
    }

    pub fn into_sealing(self) -> Option<SealingMetadata> {
        self.sealing
    }

    /// Opens a fresh stream over the resource.
    pub fn open(&self) -> Result<Box<dyn Read + Send>, SourceError> {
        match &self.payload {
            Payload::File(path) => {
                let file = std::fs::File::open(path)
                    .map_err(|e| SourceError::io(self.location.clone(), e))?;
                Ok(Box::new(file))
            }
            Payload::Memory(bytes) => Ok(Box::new(Cursor::new(Arc::clone(bytes)))),
        }
    }
}

impl std::fmt::Debug for ArtifactConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactConnection")
            .field("location", &self.location)
            .field("packaged", &self.sealing.is_some())
            .finish()
    }
}
