//! Unitload Config: engine configuration loaded from YAML
//!
//! # Example
//!
//! ```
//! use unitload_config::LoaderConfig;
//!
//! let config = LoaderConfig::from_yaml("transformers: []\n").unwrap();
//! assert!(config.exclusions.delegate.iter().any(|p| p == "unitload."));
//! ```

pub mod config;
pub mod debug;

pub use config::{ConfigError, Exclusions, LoaderConfig, SourceSpec, ENGINE_NAMESPACE};
pub use debug::DebugOptions;
