//! Prefix remapping stage
//!
//! Units stored under `physical` are exposed under `visible`:
//!
//! ```text
//! remap:  physical.X → visible.X   (name the unit is defined under)
//! unmap:  visible.X  → physical.X  (name searched in the sources)
//! ```
use std::sync::Arc;
use unitload_core::{NameRemapper, StageError, TransformerStage, UnitName};

#[derive(Debug, Clone)]
pub struct PrefixRemapStage {
    id: String,
    visible: String,
    physical: String,
}

impl PrefixRemapStage {
    pub fn new(
        id: impl Into<String>,
        visible: impl Into<String>,
        physical: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            visible: visible.into(),
            physical: physical.into(),
        }
    }

    fn swap(name: &UnitName, from: &str, to: &str) -> UnitName {
        match name.as_str().strip_prefix(from) {
            Some(rest) if !from.is_empty() => UnitName::new(format!("{}{}", to, rest)),
            _ => name.clone(),
        }
    }
}

impl NameRemapper for PrefixRemapStage {
    fn remap(&self, name: &UnitName) -> UnitName {
        Self::swap(name, &self.physical, &self.visible)
    }

    fn unmap(&self, name: &UnitName) -> UnitName {
        Self::swap(name, &self.visible, &self.physical)
    }
}

impl TransformerStage for PrefixRemapStage {
    fn id(&self) -> &str {
        &self.id
    }

    fn transform(
        &self,
        _name: &UnitName,
        _remapped: &UnitName,
        input: &[u8],
    ) -> Result<Option<Vec<u8>>, StageError> {
        Ok(Some(input.to_vec()))
    }

    fn remapper(self: Arc<Self>) -> Option<Arc<dyn NameRemapper>> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_directions() {
        let stage = PrefixRemapStage::new("remap", "shaded.", "lib.");

        assert_eq!(stage.remap(&"lib.X".into()).as_str(), "shaded.X");
        assert_eq!(stage.unmap(&"shaded.X".into()).as_str(), "lib.X");
        assert_eq!(stage.remap(&"other.X".into()).as_str(), "other.X");
    }

    #[test]
    fn test_unmap_of_remap_need_not_round_trip() {
        let stage = PrefixRemapStage::new("remap", "shaded.", "lib.");
        let name: UnitName = "shaded.X".into();

        // Already visible: remap leaves it alone, unmap moves it.
        assert_eq!(stage.unmap(&stage.remap(&name)).as_str(), "lib.X");
    }

    #[test]
    fn test_exposes_remapper() {
        let stage = Arc::new(PrefixRemapStage::new("remap", "v.", "p."));
        let remapper = stage.remapper().unwrap();
        assert_eq!(remapper.unmap(&"v.A".into()).as_str(), "p.A");
    }
}
