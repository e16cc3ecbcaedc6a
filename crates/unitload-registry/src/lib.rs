//! Unitload Registry: transformer stages by identifier
//!
//! Stages are never resolved through the engine that will run them. A host
//! registers a factory per identifier up front; `register_transformer(id)`
//! on the engine then only looks the factory up and calls it.
pub mod factory;

pub use factory::{RegistryError, StageFactory, TransformerRegistry};
