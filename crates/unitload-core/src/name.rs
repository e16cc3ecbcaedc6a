//! Unit names: dotted identifiers and the resource paths derived from them
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Device names that some host filesystems refuse to open as plain files.
const RESERVED_DEVICE_NAMES: [&str; 22] = [
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Dotted hierarchical identifier of a code unit (ex: "net.example.Widget").
///
/// Case-sensitive. Cloning is cheap, the text is shared.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct UnitName(Arc<str>);

impl UnitName {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the name has a namespace part (contains a dot).
    pub fn is_qualified(&self) -> bool {
        self.0.contains('.')
    }

    /// Everything before the last dot, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.0.rfind('.').map(|idx| &self.0[..idx])
    }

    /// Namespace in slash form with a trailing slash (`a.b.C` → `a/b/`).
    pub fn namespace_path(&self) -> Option<String> {
        self.namespace().map(|ns| format!("{}/", ns.replace('.', "/")))
    }

    /// Everything after the last dot.
    pub fn simple_name(&self) -> &str {
        match self.0.rfind('.') {
            Some(idx) => &self.0[idx + 1..],
            None => &self.0,
        }
    }

    /// Path of the unit's raw artifact inside a source (`a.b.C` → `a/b/C`).
    pub fn resource_path(&self) -> String {
        self.0.replace('.', "/")
    }

    /// Unqualified names starting with a device name (case-insensitive)
    /// cannot be stored under their own name on every filesystem.
    pub fn is_reserved_device_name(&self) -> bool {
        if self.is_qualified() {
            return false;
        }
        let upper = self.0.to_ascii_uppercase();
        RESERVED_DEVICE_NAMES
            .iter()
            .any(|reserved| upper.starts_with(reserved))
    }

    /// The underscore-prefixed name reserved device names are stored under.
    pub fn reserved_variant(&self) -> UnitName {
        UnitName::new(format!("_{}", self.0))
    }

    pub fn starts_with(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }
}

impl fmt::Display for UnitName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for UnitName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnitName({:?})", &*self.0)
    }
}

impl From<&str> for UnitName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for UnitName {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl From<&String> for UnitName {
    fn from(name: &String) -> Self {
        Self::new(name)
    }
}

impl From<&UnitName> for UnitName {
    fn from(name: &UnitName) -> Self {
        name.clone()
    }
}

impl From<UnitName> for String {
    fn from(name: UnitName) -> Self {
        name.0.to_string()
    }
}

impl AsRef<str> for UnitName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for UnitName {
    fn borrow(&self) -> &str {
        &self.0
    }
}
