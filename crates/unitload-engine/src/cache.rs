//! Raw-byte cache keyed by physical unit name
use crate::buffer;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use unitload_core::{RawArtifact, UnitName};
use unitload_sources::{SourceError, SourceRegistry};

/// Positive and negative raw-byte caches.
///
/// Entries are insert-if-absent: the first writer wins. Present entries are
/// never dropped; absent entries stay until `clear_negative`.
#[derive(Debug, Default)]
pub struct ArtifactCache {
    present: RwLock<HashMap<UnitName, RawArtifact>>,
    absent: RwLock<HashSet<UnitName>>,
}

impl ArtifactCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw bytes for `physical`, searching `sources` on a miss.
    ///
    /// `Ok(None)` means no source holds the unit; that answer is cached.
    /// Errors are not cached.
    pub fn get(
        &self,
        physical: &UnitName,
        sources: &SourceRegistry,
    ) -> Result<Option<RawArtifact>, SourceError> {
        if self.absent.read().contains(physical) {
            return Ok(None);
        }
        if let Some(raw) = self.present.read().get(physical) {
            return Ok(Some(raw.clone()));
        }

        let mut found = search(&physical.resource_path(), sources)?;
        if found.is_none() && physical.is_reserved_device_name() {
            let variant = physical.reserved_variant();
            tracing::debug!(unit = %physical, retry = %variant, "reserved device name, retrying");
            found = search(&variant.resource_path(), sources)?;
        }

        match found {
            Some(raw) => {
                let mut present = self.present.write();
                Ok(Some(present.entry(physical.clone()).or_insert(raw).clone()))
            }
            None => {
                tracing::debug!(unit = %physical, "no source holds unit");
                self.absent.write().insert(physical.clone());
                Ok(None)
            }
        }
    }

    pub fn cached(&self, physical: &UnitName) -> Option<RawArtifact> {
        self.present.read().get(physical).cloned()
    }

    pub fn is_absent(&self, physical: &UnitName) -> bool {
        self.absent.read().contains(physical)
    }

    /// Forgets a cached absence. Returns whether there was one.
    pub fn clear_negative(&self, physical: &UnitName) -> bool {
        self.absent.write().remove(physical)
    }
}

fn search(path: &str, sources: &SourceRegistry) -> Result<Option<RawArtifact>, SourceError> {
    let Some(connection) = sources.locate(path)? else {
        return Ok(None);
    };

    let mut reader = connection.open()?;
    let bytes = buffer::read_fully(&mut *reader)
        .map_err(|e| SourceError::io(connection.location(), e))?;
    let location = connection.location().to_string();

    Ok(Some(RawArtifact {
        bytes,
        location,
        sealing: connection.into_sealing(),
    }))
}
