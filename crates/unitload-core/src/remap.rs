//! Name remapping between caller-visible and physical names
use crate::name::UnitName;

/// Translates between the name a caller uses and the name a unit is
/// physically stored under.
///
/// Both directions must be pure and total. `unmap(remap(x)) == x` is not
/// required, so callers keep track of which variant they hold.
pub trait NameRemapper: Send + Sync {
    /// Caller name → name the unit is defined under.
    fn remap(&self, name: &UnitName) -> UnitName;

    /// Caller name → name used to search the sources.
    fn unmap(&self, name: &UnitName) -> UnitName;
}

/// Default remapper: both directions return the input.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityRemapper;

impl NameRemapper for IdentityRemapper {
    fn remap(&self, name: &UnitName) -> UnitName {
        name.clone()
    }

    fn unmap(&self, name: &UnitName) -> UnitName {
        name.clone()
    }
}
