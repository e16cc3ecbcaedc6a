//! Source registry: ordered, append-only search list
use crate::source::{ArtifactConnection, ArtifactSource, SourceError};
use parking_lot::RwLock;
use std::sync::Arc;

#[derive(Default)]
pub struct SourceRegistry {
    sources: RwLock<Vec<Arc<dyn ArtifactSource>>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a source; it is searched after every source added before it.
    pub fn add(&self, source: Arc<dyn ArtifactSource>) {
        tracing::debug!(location = source.location(), "artifact source added");
        self.sources.write().push(source);
    }

    /// Source locations in search order.
    pub fn locations(&self) -> Vec<String> {
        self.sources
            .read()
            .iter()
            .map(|source| source.location().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sources.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.read().is_empty()
    }

    /// First source holding `path` wins.
    ///
    /// A failing source does not stop the search; its error is returned only
    /// when no later source holds the path either.
    pub fn locate(&self, path: &str) -> Result<Option<ArtifactConnection>, SourceError> {
        let sources: Vec<Arc<dyn ArtifactSource>> = self.sources.read().clone();
        let mut first_error = None;

        for source in sources {
            match source.locate(path) {
                Ok(Some(connection)) => return Ok(Some(connection)),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(location = source.location(), path, error = %e, "artifact source failed");
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::ArchiveSource;
    use std::io::Read;

    struct Broken;

    impl ArtifactSource for Broken {
        fn location(&self) -> &str {
            "broken:"
        }

        fn locate(&self, _path: &str) -> Result<Option<ArtifactConnection>, SourceError> {
            Err(SourceError::io(
                "broken:",
                std::io::Error::new(std::io::ErrorKind::Other, "disk on fire"),
            ))
        }
    }

    fn first_byte(connection: ArtifactConnection) -> u8 {
        let mut bytes = Vec::new();
        connection.open().unwrap().read_to_end(&mut bytes).unwrap();
        bytes[0]
    }

    #[test]
    fn test_insertion_order_wins() {
        let registry = SourceRegistry::new();
        registry.add(Arc::new(ArchiveSource::new("archive:first").with_entry("a/B", vec![1])));
        registry.add(Arc::new(ArchiveSource::new("archive:second").with_entry("a/B", vec![2])));

        assert_eq!(registry.locations(), vec!["archive:first", "archive:second"]);
        assert_eq!(first_byte(registry.locate("a/B").unwrap().unwrap()), 1);
    }

    #[test]
    fn test_failing_source_is_skipped() {
        let registry = SourceRegistry::new();
        registry.add(Arc::new(Broken));
        registry.add(Arc::new(ArchiveSource::new("archive:ok").with_entry("a/B", vec![5])));

        assert_eq!(first_byte(registry.locate("a/B").unwrap().unwrap()), 5);
        assert!(registry.locate("a/Missing").is_err());
    }

    #[test]
    fn test_empty_registry_finds_nothing() {
        let registry = SourceRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.locate("a/B").unwrap().is_none());
    }
}
