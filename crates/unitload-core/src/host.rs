//! Host seam: where transformed bytes become live units
use crate::data_model::{CodeOrigin, ResolvedUnit};
use crate::name::UnitName;
use std::sync::Arc;
use thiserror::Error;

/// The execution environment that activates units.
pub trait UnitHost: Send + Sync {
    /// Activates `bytes` under `name`. Defining a name twice is illegal.
    fn define(
        &self,
        name: &UnitName,
        bytes: Arc<[u8]>,
        origin: Option<CodeOrigin>,
    ) -> Result<ResolvedUnit, HostError>;

    /// The environment's own default loader, used for delegated names.
    fn delegate(&self, name: &UnitName) -> Result<ResolvedUnit, HostError>;
}

#[derive(Error, Debug, Clone)]
pub enum HostError {
    #[error("HOST/REDEFINE: {0} is already defined")]
    AlreadyDefined(UnitName),

    #[error("HOST/UNAVAILABLE: {0} is not provided by the default loader")]
    NotAvailable(UnitName),

    #[error("HOST/REJECTED: {0}")]
    Rejected(String),
}
