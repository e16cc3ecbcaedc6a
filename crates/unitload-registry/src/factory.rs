//! Stage factories
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use unitload_core::{StageError, TransformerStage};

/// Builds a fresh stage instance.
pub type StageFactory =
    Arc<dyn Fn() -> Result<Arc<dyn TransformerStage>, StageError> + Send + Sync>;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("REGISTRY/UNKNOWN: no factory for '{0}'")]
    Unknown(String),

    #[error("REGISTRY/DUPLICATE: factory for '{0}' already registered")]
    Duplicate(String),

    #[error("REGISTRY/NEW: factory for '{id}' failed: {source}")]
    Construction {
        id: String,
        #[source]
        source: StageError,
    },
}

#[derive(Default)]
pub struct TransformerRegistry {
    factories: RwLock<BTreeMap<String, StageFactory>>,
}

impl TransformerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&self, id: impl Into<String>, factory: F) -> Result<(), RegistryError>
    where
        F: Fn() -> Result<Arc<dyn TransformerStage>, StageError> + Send + Sync + 'static,
    {
        let id = id.into();
        let mut factories = self.factories.write();
        if factories.contains_key(&id) {
            return Err(RegistryError::Duplicate(id));
        }
        tracing::debug!(id = %id, "stage factory registered");
        factories.insert(id, Arc::new(factory));
        Ok(())
    }

    /// Calls the factory registered under `id`.
    pub fn instantiate(&self, id: &str) -> Result<Arc<dyn TransformerStage>, RegistryError> {
        // Clone the factory out so a factory may touch the registry itself.
        let factory = self
            .factories
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::Unknown(id.to_string()))?;

        factory().map_err(|source| RegistryError::Construction {
            id: id.to_string(),
            source,
        })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.factories.read().contains_key(id)
    }

    /// Registered identifiers, sorted.
    pub fn identifiers(&self) -> Vec<String> {
        self.factories.read().keys().cloned().collect()
    }
}

impl std::fmt::Debug for TransformerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformerRegistry")
            .field("identifiers", &self.identifiers())
            .finish()
    }
}
