//! Engines built from YAML configuration
use std::path::Path;
use std::sync::Arc;
use unitload_config::LoaderConfig;
use unitload_engine::{EngineError, InMemoryHost, ResolutionEngine};
use unitload_sources::ArchiveSource;

fn write_units(root: &Path) {
    std::fs::create_dir_all(root.join("units/app")).unwrap();
    std::fs::write(root.join("units/app/Main"), b"hello world").unwrap();

    let vendor = ArchiveSource::new("archive:vendor").with_entry("vendor/Codec", vec![1, 2]);
    std::fs::write(
        root.join("vendor.json"),
        serde_json::to_string(&vendor.to_bundle()).unwrap(),
    )
    .unwrap();
}

const CONFIG: &str = r#"
sources:
  - directory: units
  - archive: vendor.json
exclusions:
  isolate: ["vendor."]
stages:
  - id: patch.greeting
    kind: byte_patch
    find: "68656c6c6f"
    replace: "686f776479"
  - id: trailer
    kind: append_trailer
    trailer: "21"
transformers: ["patch.greeting", "trailer"]
"#;

#[test]
fn test_engine_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    write_units(dir.path());
    let path = dir.path().join("unitload.yaml");
    std::fs::write(&path, CONFIG).unwrap();

    let config = LoaderConfig::from_path(&path).unwrap();
    let engine = ResolutionEngine::from_config(&config, Arc::new(InMemoryHost::new())).unwrap();

    assert_eq!(engine.transformers(), vec!["patch.greeting", "trailer"]);
    assert_eq!(engine.list_artifact_sources().len(), 2);

    let main = engine.resolve("app.Main").unwrap();
    assert_eq!(main.bytes(), b"howdy world!");

    let codec = engine.resolve("vendor.Codec").unwrap();
    assert_eq!(codec.bytes(), &[1, 2]);

    // The engine's own namespace is delegated by default.
    assert!(engine.resolve("unitload.Internal").is_err());
    assert!(!engine.is_invalid(&"unitload.Internal".into()));
}

#[test]
fn test_unknown_transformer_fails_construction() {
    let config = LoaderConfig::from_yaml("transformers: [\"nope\"]\n").unwrap();
    let result = ResolutionEngine::from_config(&config, Arc::new(InMemoryHost::new()));
    assert!(matches!(result, Err(EngineError::Registry(_))));
}

#[test]
fn test_finer_dumps_per_stage() {
    let dir = tempfile::tempdir().unwrap();
    write_units(dir.path());

    let path = dir.path().join("unitload.yaml");
    std::fs::write(&path, CONFIG).unwrap();

    let mut config = LoaderConfig::from_path(&path).unwrap();
    config.debug.enabled = true;
    config.debug.save = true;
    config.debug.finer = true;
    config.debug.dump_dir = dir.path().to_path_buf();

    let engine = ResolutionEngine::from_config(&config, Arc::new(InMemoryHost::new())).unwrap();
    engine.resolve("app.Main").unwrap();

    let dump = dir.path().join("unitload_dump/app");
    assert_eq!(std::fs::read(dump.join("Main_000_pretransform")).unwrap(), b"hello world");
    assert_eq!(std::fs::read(dump.join("Main_001_patch.greeting")).unwrap(), b"howdy world");
    assert_eq!(std::fs::read(dump.join("Main_002_trailer")).unwrap(), b"howdy world!");
}
