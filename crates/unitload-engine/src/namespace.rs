//! Namespace sealing table
//!
//! Remembers, per namespace, whether its first unit came from a sealed
//! package and from where. Inconsistencies are reported, never enforced.
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use unitload_core::SealingMetadata;

#[derive(Debug, Clone, PartialEq, Eq)]
struct NamespaceRecord {
    sealed: bool,
    location: String,
}

/// A definition that disagrees with how its namespace was first recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SealingInconsistency {
    /// Namespace is sealed to another package
    SealedElsewhere {
        namespace: String,
        sealed_to: String,
        location: String,
    },
    /// Namespace was defined unsealed; this package seals it now
    SealedAfterDefinition { namespace: String, location: String },
    /// Unpackaged unit defined into a sealed namespace
    UnpackagedIntoSealed {
        namespace: String,
        sealed_to: String,
        location: String,
    },
}

impl fmt::Display for SealingInconsistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SealedElsewhere {
                namespace,
                sealed_to,
                location,
            } => write!(
                f,
                "trying to seal already secured path {} (sealed to {}, now from {})",
                namespace, sealed_to, location
            ),
            Self::SealedAfterDefinition {
                namespace,
                location,
            } => write!(
                f,
                "{} has a seal for a path that is defined and not secure: {}",
                location, namespace
            ),
            Self::UnpackagedIntoSealed {
                namespace,
                sealed_to,
                location,
            } => write!(
                f,
                "{} defines into sealed path {} (sealed to {})",
                location, namespace, sealed_to
            ),
        }
    }
}

#[derive(Debug, Default)]
pub struct NamespaceTable {
    records: RwLock<HashMap<String, NamespaceRecord>>,
}

impl NamespaceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records or checks `namespace` (slash form, `a/b/`).
    ///
    /// `location` is where the defining unit came from; for packaged units
    /// the archive location in `sealing` is used instead.
    pub fn check(
        &self,
        namespace: &str,
        location: &str,
        sealing: Option<&SealingMetadata>,
    ) -> Option<SealingInconsistency> {
        let mut records = self.records.write();

        let Some(existing) = records.get(namespace) else {
            let record = match sealing {
                Some(sealing) => NamespaceRecord {
                    sealed: sealing.is_sealed(namespace),
                    location: sealing.archive.clone(),
                },
                None => NamespaceRecord {
                    sealed: false,
                    location: location.to_string(),
                },
            };
            records.insert(namespace.to_string(), record);
            return None;
        };

        match sealing {
            Some(sealing) => {
                if existing.sealed && existing.location != sealing.archive {
                    Some(SealingInconsistency::SealedElsewhere {
                        namespace: namespace.to_string(),
                        sealed_to: existing.location.clone(),
                        location: sealing.archive.clone(),
                    })
                } else if !existing.sealed && sealing.is_sealed(namespace) {
                    Some(SealingInconsistency::SealedAfterDefinition {
                        namespace: namespace.to_string(),
                        location: sealing.archive.clone(),
                    })
                } else {
                    None
                }
            }
            None if existing.sealed => Some(SealingInconsistency::UnpackagedIntoSealed {
                namespace: namespace.to_string(),
                sealed_to: existing.location.clone(),
                location: location.to_string(),
            }),
            None => None,
        }
    }

    pub fn is_sealed(&self, namespace: &str) -> Option<bool> {
        self.records.read().get(namespace).map(|record| record.sealed)
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sealed(archive: &str) -> SealingMetadata {
        SealingMetadata {
            main_sealed: Some(true),
            ..SealingMetadata::unsealed(archive)
        }
    }

    #[test]
    fn test_first_definition_records() {
        let table = NamespaceTable::new();
        assert_eq!(table.check("a/", "archive:x!/a/B", Some(&sealed("archive:x"))), None);
        assert_eq!(table.is_sealed("a/"), Some(true));

        // Same package again is fine.
        assert_eq!(table.check("a/", "archive:x!/a/C", Some(&sealed("archive:x"))), None);
    }

    #[test]
    fn test_sealed_elsewhere() {
        let table = NamespaceTable::new();
        table.check("a/", "archive:x!/a/B", Some(&sealed("archive:x")));

        let issue = table.check("a/", "archive:y!/a/C", Some(&sealed("archive:y")));
        assert!(matches!(issue, Some(SealingInconsistency::SealedElsewhere { .. })));
        assert!(issue.unwrap().to_string().contains("already secured"));
    }

    #[test]
    fn test_seal_after_unsealed_definition() {
        let table = NamespaceTable::new();
        table.check("a/", "file:/units/a/B", None);

        let issue = table.check("a/", "archive:x!/a/C", Some(&sealed("archive:x")));
        assert!(matches!(
            issue,
            Some(SealingInconsistency::SealedAfterDefinition { .. })
        ));
    }

    #[test]
    fn test_unpackaged_into_sealed() {
        let table = NamespaceTable::new();
        table.check("a/", "archive:x!/a/B", Some(&sealed("archive:x")));

        let issue = table.check("a/", "file:/units/a/C", None);
        assert!(matches!(
            issue,
            Some(SealingInconsistency::UnpackagedIntoSealed { .. })
        ));
        assert_eq!(table.len(), 1);
    }
}
