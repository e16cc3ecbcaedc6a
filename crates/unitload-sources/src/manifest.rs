//! Archive manifest: main attributes plus per-path sections
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use unitload_core::{SealingMetadata, Signer};

/// Attribute marking a namespace as locked to its archive.
pub const SEALED: &str = "Sealed";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Attributes that apply to the whole archive
    #[serde(default)]
    pub main: BTreeMap<String, String>,
    /// Attributes per namespace path (`a/b/`)
    #[serde(default)]
    pub sections: BTreeMap<String, BTreeMap<String, String>>,
}

/// Attribute names are case-insensitive.
fn attribute<'a>(attributes: &'a BTreeMap<String, String>, key: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(key))
        .map(|(_, value)| value.as_str())
}

fn is_true(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_main_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.main.insert(key.into(), value.into());
        self
    }

    pub fn with_section_attribute(
        mut self,
        path: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.sections
            .entry(path.into())
            .or_default()
            .insert(key.into(), value.into());
        self
    }

    /// Seals every namespace that does not say otherwise.
    pub fn sealed(self) -> Self {
        self.with_main_attribute(SEALED, "true")
    }

    pub fn main_attribute(&self, key: &str) -> Option<&str> {
        attribute(&self.main, key)
    }

    pub fn section_attribute(&self, path: &str, key: &str) -> Option<&str> {
        self.sections
            .get(path)
            .and_then(|section| attribute(section, key))
    }

    /// The path's own section decides when it carries `Sealed`, otherwise the main section.
    pub fn is_sealed(&self, path: &str) -> bool {
        self.section_attribute(path, SEALED)
            .or_else(|| self.main_attribute(SEALED))
            .map(is_true)
            .unwrap_or(false)
    }

    /// Flattens the sealing attributes for the engine.
    pub fn sealing_metadata(&self, archive: &str, signers: Vec<Signer>) -> SealingMetadata {
        let sections = self
            .sections
            .iter()
            .filter_map(|(path, attributes)| {
                attribute(attributes, SEALED).map(|value| (path.clone(), is_true(value)))
            })
            .collect();

        SealingMetadata {
            archive: archive.to_string(),
            main_sealed: self.main_attribute(SEALED).map(is_true),
            sections,
            signers,
        }
    }
}
