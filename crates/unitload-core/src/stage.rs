//! Stage Trait: the contract every transformer stage implements
use crate::name::UnitName;
use crate::remap::NameRemapper;
use std::sync::Arc;

/// One ordered rewrite step of the transformer chain.
pub trait TransformerStage: Send + Sync {
    /// Unique stage identifier (ex: "patch.bytes.v1")
    fn id(&self) -> &str;

    /// Rewrites the unit's bytes.
    ///
    /// `name` is the name the caller asked for, `remapped` the name the unit
    /// will be defined under. `Ok(None)` rejects the unit and ends the chain.
    fn transform(
        &self,
        name: &UnitName,
        remapped: &UnitName,
        input: &[u8],
    ) -> Result<Option<Vec<u8>>, StageError>;

    /// Stages that also translate names hand out their remapper here.
    fn remapper(self: Arc<Self>) -> Option<Arc<dyn NameRemapper>> {
        None
    }
}

#[derive(Debug, Clone)]
pub enum StageError {
    ValidationFailed(String),
    ExecutionFailed(String),
    Construction(String),
}

impl std::fmt::Display for StageError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "STAGE/VALIDATION: {}", msg),
            Self::ExecutionFailed(msg) => write!(f, "STAGE/EXEC: {}", msg),
            Self::Construction(msg) => write!(f, "STAGE/NEW: {}", msg),
        }
    }
}

impl std::error::Error for StageError {}
