//! In-memory host: records definitions, serves built-ins for delegated names
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use unitload_core::{CodeOrigin, HostError, ResolvedUnit, UnitHost, UnitName};

#[derive(Debug, Default)]
pub struct InMemoryHost {
    defined: RwLock<HashMap<UnitName, ResolvedUnit>>,
    builtins: RwLock<HashMap<UnitName, ResolvedUnit>>,
}

impl InMemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a unit the default loader provides.
    pub fn with_builtin(self, name: impl Into<UnitName>, bytes: impl Into<Vec<u8>>) -> Self {
        self.add_builtin(name, bytes);
        self
    }

    pub fn add_builtin(&self, name: impl Into<UnitName>, bytes: impl Into<Vec<u8>>) {
        let name = name.into();
        let unit = ResolvedUnit::new(name.clone(), Arc::from(bytes.into()), None);
        self.builtins.write().insert(name, unit);
    }

    pub fn get(&self, name: &UnitName) -> Option<ResolvedUnit> {
        self.defined.read().get(name).cloned()
    }

    /// Defined names, sorted.
    pub fn defined_names(&self) -> Vec<UnitName> {
        let mut names: Vec<UnitName> = self.defined.read().keys().cloned().collect();
        names.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        names
    }

    pub fn len(&self) -> usize {
        self.defined.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.defined.read().is_empty()
    }
}

impl UnitHost for InMemoryHost {
    fn define(
        &self,
        name: &UnitName,
        bytes: Arc<[u8]>,
        origin: Option<CodeOrigin>,
    ) -> Result<ResolvedUnit, HostError> {
        let mut defined = self.defined.write();
        if defined.contains_key(name) {
            return Err(HostError::AlreadyDefined(name.clone()));
        }

        let unit = ResolvedUnit::new(name.clone(), bytes, origin);
        defined.insert(name.clone(), unit.clone());
        tracing::debug!(unit = %name, length = unit.bytes().len(), "unit defined");
        Ok(unit)
    }

    fn delegate(&self, name: &UnitName) -> Result<ResolvedUnit, HostError> {
        self.builtins
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| HostError::NotAvailable(name.clone()))
    }
}
