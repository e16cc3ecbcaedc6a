//! Integration tests against the workspace fixture units.
//!
//! The fixtures live in `testing/fixtures` at the workspace root and are
//! loaded through `unitload.yaml` exactly as the CLI would load them.

use std::sync::Arc;
use unitload_config::LoaderConfig;
use unitload_core::FailureCause;
use unitload_engine::{InMemoryHost, ResolutionEngine};

/// Path to the fixture config relative to the workspace root
const CONFIG_PATH: &str = "testing/fixtures/unitload.yaml";

fn config_path() -> std::path::PathBuf {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap();
    let workspace_root = std::path::Path::new(&manifest_dir).parent().unwrap().parent().unwrap();
    workspace_root.join(CONFIG_PATH)
}

fn fixture_engine(host: Arc<InMemoryHost>) -> ResolutionEngine {
    let config = LoaderConfig::from_path(config_path()).unwrap();
    ResolutionEngine::from_config(&config, host).unwrap()
}

#[test]
fn test_fixture_greeting_is_patched() {
    let engine = fixture_engine(Arc::new(InMemoryHost::new()));

    let unit = engine.resolve("demo.Greeting").unwrap();
    assert_eq!(unit.bytes(), b"howdy unitload");
    assert!(unit.origin().unwrap().location.starts_with("file:"));
    assert_eq!(&*engine.cached_raw_bytes(&"demo.Greeting".into()).unwrap(), b"hello unitload");
}

#[test]
fn test_fixture_internal_units_are_denied() {
    let engine = fixture_engine(Arc::new(InMemoryHost::new()));

    let err = engine.resolve("demo.internal.Key").unwrap_err();
    match err.cause() {
        FailureCause::Transformation(chain) => assert_eq!(chain.stage(), "deny.internal"),
        other => panic!("unexpected cause: {:?}", other),
    }
}

#[test]
fn test_fixture_reserved_name() {
    let engine = fixture_engine(Arc::new(InMemoryHost::new()));
    assert_eq!(engine.resolve("AUX").unwrap().bytes(), b"device");
}

#[test]
fn test_fixture_delegation() {
    let host = Arc::new(InMemoryHost::new().with_builtin("host.Clock", vec![0xC1]));
    let engine = fixture_engine(host);

    assert_eq!(engine.resolve("host.Clock").unwrap().bytes(), &[0xC1]);
    assert!(engine.resolve("unitload.Engine").is_err());
    assert_eq!(
        engine.exclusion_policy().prefixes(unitload_policy::Bucket::Delegate),
        vec!["unitload.", "host."]
    );
}
