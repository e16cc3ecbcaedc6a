//! Unified Error Model
use crate::name::UnitName;
use crate::stage::StageError;
use thiserror::Error;

/// The only error `resolve` surfaces.
#[derive(Error, Debug, Clone)]
pub enum ResolveError {
    #[error("NOT_FOUND/{name}: {cause}")]
    NotFound {
        name: UnitName,
        #[source]
        cause: FailureCause,
    },
}

impl ResolveError {
    pub fn not_found(name: &UnitName, cause: FailureCause) -> Self {
        Self::NotFound {
            name: name.clone(),
            cause,
        }
    }

    pub fn name(&self) -> &UnitName {
        match self {
            Self::NotFound { name, .. } => name,
        }
    }

    pub fn cause(&self) -> &FailureCause {
        match self {
            Self::NotFound { cause, .. } => cause,
        }
    }
}

/// Why a resolution failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FailureCause {
    #[error("INVALID/previously failed to resolve")]
    Invalid,

    #[error("MISSING/no artifact source holds {path}")]
    Missing { path: String },

    #[error("TRANSFORM/{0}")]
    Transformation(ChainError),

    #[error("IO/{location}: {message}")]
    Io { location: String, message: String },

    #[error("DEFINE/{0}")]
    Activation(String),

    #[error("DELEGATE/{0}")]
    Delegation(String),
}

impl FailureCause {
    /// Transient failures are neither cached as absence nor mark the name invalid.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}

/// Failure of the transformer chain, naming the stage that ended it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("stage {stage} produced no bytes for {name}")]
    Rejected { stage: String, name: UnitName },

    #[error("stage {stage} failed for {name}: {reason}")]
    Failed {
        stage: String,
        name: UnitName,
        reason: String,
    },
}

impl ChainError {
    pub fn failed(stage: &str, name: &UnitName, error: &StageError) -> Self {
        Self::Failed {
            stage: stage.to_string(),
            name: name.clone(),
            reason: error.to_string(),
        }
    }

    pub fn stage(&self) -> &str {
        match self {
            Self::Rejected { stage, .. } | Self::Failed { stage, .. } => stage,
        }
    }
}

impl From<ChainError> for FailureCause {
    fn from(error: ChainError) -> Self {
        FailureCause::Transformation(error)
    }
}
