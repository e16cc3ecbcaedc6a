//! Declarative stage definitions
//!
//! ```yaml
//! stages:
//!   - id: patch.greeting
//!     kind: byte_patch
//!     find: "68656c6c6f"
//!     replace: "686f776479"
//!   - id: deny.internal
//!     kind: deny_list
//!     prefixes: ["internal."]
//! ```
//!
//! Byte fields are hex-encoded.
use crate::{AppendTrailerStage, BytePatchStage, DenyListStage, PrefixRemapStage};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use unitload_core::{StageError, TransformerStage};
use unitload_registry::{RegistryError, TransformerRegistry};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDefinition {
    pub id: String,

    #[serde(flatten)]
    pub kind: StageKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StageKind {
    BytePatch { find: String, replace: String },
    AppendTrailer { trailer: String },
    PrefixRemap { visible: String, physical: String },
    DenyList { prefixes: Vec<String> },
}

fn decode(field: &str, value: &str) -> Result<Vec<u8>, StageError> {
    hex::decode(value).map_err(|e| StageError::Construction(format!("{}: {}", field, e)))
}

impl StageDefinition {
    pub fn build(&self) -> Result<Arc<dyn TransformerStage>, StageError> {
        let stage: Arc<dyn TransformerStage> = match &self.kind {
            StageKind::BytePatch { find, replace } => Arc::new(BytePatchStage::new(
                self.id.clone(),
                decode("find", find)?,
                decode("replace", replace)?,
            )?),
            StageKind::AppendTrailer { trailer } => Arc::new(AppendTrailerStage::new(
                self.id.clone(),
                decode("trailer", trailer)?,
            )),
            StageKind::PrefixRemap { visible, physical } => Arc::new(PrefixRemapStage::new(
                self.id.clone(),
                visible.clone(),
                physical.clone(),
            )),
            StageKind::DenyList { prefixes } => {
                Arc::new(DenyListStage::new(self.id.clone(), prefixes.clone()))
            }
        };
        Ok(stage)
    }
}

/// Registers one factory per definition, keyed by the definition's id.
pub fn register_definitions(
    registry: &TransformerRegistry,
    definitions: &[StageDefinition],
) -> Result<(), RegistryError> {
    for definition in definitions {
        let definition = definition.clone();
        registry.register(definition.id.clone(), move || definition.build())?;
    }
    Ok(())
}
