//! Loader configuration
//!
//! ```yaml
//! sources:
//!   - directory: ./units
//!   - archive: ./vendor.bundle.json
//! exclusions:
//!   delegate: ["std."]
//!   isolate: ["vendor.codec."]
//! unsealed_namespaces: ["generated."]
//! stages:
//!   - id: trailer
//!     kind: append_trailer
//!     trailer: "09"
//! transformers: ["trailer"]
//! child_delegation: true
//! debug:
//!   enabled: true
//!   save: true
//! ```

use crate::debug::DebugOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use unitload_policy::{Bucket, ExclusionRule};
use unitload_stages::StageDefinition;

/// Prefix of the engine's own units; always delegated by the default config.
pub const ENGINE_NAMESPACE: &str = "unitload.";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("CONFIG/IO: {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CONFIG/PARSE: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("CONFIG/INVALID: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceSpec {
    Directory(PathBuf),
    Archive(PathBuf),
}

impl SourceSpec {
    pub fn path(&self) -> &Path {
        match self {
            SourceSpec::Directory(path) | SourceSpec::Archive(path) => path,
        }
    }

    fn rebase(&mut self, base: &Path) {
        let path = match self {
            SourceSpec::Directory(path) | SourceSpec::Archive(path) => path,
        };
        if path.is_relative() {
            *path = base.join(&*path);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Exclusions {
    pub delegate: Vec<String>,
    pub isolate: Vec<String>,
}

impl Exclusions {
    pub fn rules(&self) -> Vec<ExclusionRule> {
        self.delegate
            .iter()
            .map(|prefix| ExclusionRule::new(prefix.clone(), Bucket::Delegate))
            .chain(
                self.isolate
                    .iter()
                    .map(|prefix| ExclusionRule::new(prefix.clone(), Bucket::Isolate)),
            )
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Artifact sources in search order
    pub sources: Vec<SourceSpec>,

    pub exclusions: Exclusions,

    /// Namespace prefixes that skip sealing bookkeeping
    pub unsealed_namespaces: Vec<String>,

    /// Stage factories made available to `transformers`
    pub stages: Vec<StageDefinition>,

    /// Stage identifiers, in chain order
    pub transformers: Vec<String>,

    pub child_delegation: bool,

    pub debug: DebugOptions,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            exclusions: Exclusions {
                delegate: vec![ENGINE_NAMESPACE.to_string()],
                isolate: Vec::new(),
            },
            unsealed_namespaces: Vec::new(),
            stages: Vec::new(),
            transformers: Vec::new(),
            child_delegation: true,
            debug: DebugOptions::default(),
        }
    }
}

impl LoaderConfig {
    /// Parses YAML; the engine namespace is delegated even when omitted.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: LoaderConfig = serde_yaml::from_str(yaml)?;
        if !config
            .exclusions
            .delegate
            .iter()
            .any(|prefix| prefix == ENGINE_NAMESPACE)
        {
            config.exclusions.delegate.insert(0, ENGINE_NAMESPACE.to_string());
        }
        config.validate()?;
        Ok(config)
    }

    /// Loads a config file. Relative source paths are taken relative to it.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config = Self::from_yaml(&yaml)?;
        if let Some(base) = path.parent() {
            for source in &mut config.sources {
                source.rebase(base);
            }
        }
        tracing::debug!(path = %path.display(), sources = config.sources.len(), "config loaded");
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for prefix in self.exclusions.delegate.iter().chain(&self.exclusions.isolate) {
            if prefix.is_empty() {
                return Err(ConfigError::Invalid("empty exclusion prefix".to_string()));
            }
        }
        for (i, stage) in self.stages.iter().enumerate() {
            if self.stages[..i].iter().any(|other| other.id == stage.id) {
                return Err(ConfigError::Invalid(format!("duplicate stage id '{}'", stage.id)));
            }
        }
        Ok(())
    }

    /// Applies `UNITLOAD_*` overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let flag = |key: &str| lookup(key).map(|value| parse_flag(&value));

        if let Some(enabled) = flag("UNITLOAD_DEBUG") {
            self.debug.enabled = enabled;
        }
        if let Some(finer) = flag("UNITLOAD_DEBUG_FINER") {
            self.debug.finer = finer;
        }
        if let Some(save) = flag("UNITLOAD_DEBUG_SAVE") {
            self.debug.save = save;
        }
        if let Some(slim) = flag("UNITLOAD_DEBUG_SLIM") {
            self.debug.slim = slim;
        }
        if let Some(dir) = lookup("UNITLOAD_DUMP_DIR") {
            self.debug.dump_dir = PathBuf::from(dir);
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
