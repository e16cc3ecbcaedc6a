//! Directory source: plain files under a root directory
use crate::source::{ArtifactConnection, ArtifactSource, SourceError};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

pub struct DirectorySource {
    root: PathBuf,
    location: String,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let location = format!("dir:{}", root.display());
        Self { root, location }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Only plain relative paths may be looked up; `..` and absolute paths are absent.
fn is_plain_relative(path: &str) -> bool {
    !path.is_empty()
        && Path::new(path)
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
}

impl ArtifactSource for DirectorySource {
    fn location(&self) -> &str {
        &self.location
    }

    fn locate(&self, path: &str) -> Result<Option<ArtifactConnection>, SourceError> {
        if !is_plain_relative(path) {
            return Ok(None);
        }

        let full = self.root.join(path);
        let location = format!("file:{}", full.display());
        match std::fs::metadata(&full) {
            Ok(meta) if meta.is_file() => Ok(Some(ArtifactConnection::file(location, full))),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SourceError::io(location, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_locates_nested_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("a/b")).unwrap();
        std::fs::write(dir.path().join("a/b/C"), [1, 2, 3]).unwrap();

        let source = DirectorySource::new(dir.path());
        let connection = source.locate("a/b/C").unwrap().unwrap();
        assert!(connection.sealing().is_none());
        assert!(connection.location().starts_with("file:"));

        let mut bytes = Vec::new();
        connection.open().unwrap().read_to_end(&mut bytes).unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
    }

    #[test]
    fn test_missing_and_escaping_paths_are_absent() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("a")).unwrap();
        let source = DirectorySource::new(dir.path().join("a"));

        assert!(source.locate("nope").unwrap().is_none());
        assert!(source.locate("../a").unwrap().is_none());
        assert!(source.locate("").unwrap().is_none());
    }

    #[test]
    fn test_directories_are_not_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("a/b")).unwrap();
        let source = DirectorySource::new(dir.path());

        assert!(source.locate("a/b").unwrap().is_none());
    }
}
