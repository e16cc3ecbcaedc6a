//! Debug diagnostics switches
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Controls chain diagnostics.
///
/// Nothing is logged or written unless `enabled` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugOptions {
    pub enabled: bool,

    /// Per-stage logging and per-stage dump files
    pub finer: bool,

    /// Write transformed bytes under the dump directory
    pub save: bool,

    /// Skip dumps that would only repeat the input
    pub slim: bool,

    /// Parent of the `unitload_dump` directory
    pub dump_dir: PathBuf,
}

impl Default for DebugOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            finer: false,
            save: false,
            slim: false,
            dump_dir: PathBuf::from("."),
        }
    }
}

impl DebugOptions {
    pub fn finer(&self) -> bool {
        self.enabled && self.finer
    }

    pub fn saves(&self) -> bool {
        self.enabled && self.save
    }
}
