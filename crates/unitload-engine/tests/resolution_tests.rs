//! End-to-end resolution behaviour
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;
use unitload_core::{FailureCause, StageError, TransformerStage, UnitName};
use unitload_engine::{InMemoryHost, ResolutionEngine};
use unitload_policy::Bucket;
use unitload_sources::{
    ArchiveSource, ArtifactConnection, ArtifactSource, EntrySignature, Manifest, SourceError,
};
use unitload_stages::{AppendTrailerStage, DenyListStage, PrefixRemapStage};

/// Source wrapper that counts lookups.
struct Counting {
    inner: ArchiveSource,
    lookups: AtomicUsize,
}

impl Counting {
    fn new(inner: ArchiveSource) -> Arc<Self> {
        Arc::new(Self {
            inner,
            lookups: AtomicUsize::new(0),
        })
    }

    fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl ArtifactSource for Counting {
    fn location(&self) -> &str {
        self.inner.location()
    }

    fn locate(&self, path: &str) -> Result<Option<ArtifactConnection>, SourceError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.locate(path)
    }
}

/// Appends a byte and counts invocations.
struct CountingTrailer {
    id: &'static str,
    byte: u8,
    calls: AtomicUsize,
    delay: Duration,
}

impl CountingTrailer {
    fn new(id: &'static str, byte: u8) -> Arc<Self> {
        Self::slow(id, byte, Duration::ZERO)
    }

    fn slow(id: &'static str, byte: u8, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            id,
            byte,
            calls: AtomicUsize::new(0),
            delay,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TransformerStage for CountingTrailer {
    fn id(&self) -> &str {
        self.id
    }

    fn transform(
        &self,
        _name: &UnitName,
        _remapped: &UnitName,
        input: &[u8],
    ) -> Result<Option<Vec<u8>>, StageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        let mut out = input.to_vec();
        out.push(self.byte);
        Ok(Some(out))
    }
}

struct Failing;

impl TransformerStage for Failing {
    fn id(&self) -> &str {
        "failing"
    }

    fn transform(
        &self,
        _name: &UnitName,
        _remapped: &UnitName,
        _input: &[u8],
    ) -> Result<Option<Vec<u8>>, StageError> {
        Err(StageError::ExecutionFailed("boom".to_string()))
    }
}

fn engine_with(archive: ArchiveSource) -> (ResolutionEngine, Arc<Counting>) {
    let engine = ResolutionEngine::new(Arc::new(InMemoryHost::new())).unwrap();
    let source = Counting::new(archive);
    engine.add_artifact_source(source.clone());
    (engine, source)
}

#[test]
fn test_end_to_end_trailer() {
    let (engine, _) = engine_with(ArchiveSource::new("archive:lib").with_entry("a/B", vec![1, 2, 3]));
    engine.register_stage(Arc::new(AppendTrailerStage::new("trailer", vec![9])));

    let unit = engine.resolve("a.B").unwrap();
    assert_eq!(unit.bytes(), &[1, 2, 3, 9]);

    let raw = engine.cached_raw_bytes(&"a.B".into()).unwrap();
    assert_eq!(&*raw, &[1, 2, 3]);
}

#[test]
fn test_resolve_is_idempotent() {
    let (engine, source) = engine_with(ArchiveSource::new("archive:lib").with_entry("a/B", vec![1]));
    let stage = CountingTrailer::new("count", 0);
    engine.register_stage(stage.clone());

    let first = engine.resolve("a.B").unwrap();
    let second = engine.resolve("a.B").unwrap();

    assert!(first.same_unit(&second));
    assert_eq!(stage.calls(), 1);
    assert_eq!(source.lookups(), 1);
    assert_eq!(engine.metrics().cache_hits.get(), 1);
}

#[test]
fn test_chain_order() {
    let (engine, _) = engine_with(ArchiveSource::new("archive:lib").with_entry("a/B", vec![0]));
    engine.register_stage(CountingTrailer::new("A", 1));
    engine.register_stage(CountingTrailer::new("B", 2));

    assert_eq!(engine.resolve("a.B").unwrap().bytes(), &[0, 1, 2]);
    assert_eq!(engine.transformers(), vec!["A", "B"]);
}

#[test]
fn test_delegated_names_bypass_everything() {
    let host = Arc::new(InMemoryHost::new().with_builtin("std.Io", vec![5]));
    let engine = ResolutionEngine::new(host.clone()).unwrap();
    let source = Counting::new(ArchiveSource::new("archive:lib").with_entry("std/Io", vec![1]));
    engine.add_artifact_source(source.clone());
    let stage = CountingTrailer::new("count", 0);
    engine.register_stage(stage.clone());
    engine.add_exclusion(Bucket::Delegate, "std.");

    let unit = engine.resolve("std.Io").unwrap();
    assert_eq!(unit.bytes(), &[5]);
    assert!(engine.cached_unit(&"std.Io".into()).is_none());
    assert_eq!(stage.calls(), 0);
    assert_eq!(source.lookups(), 0);
    assert!(host.is_empty());

    // Delegation failures are not cached as invalid.
    let err = engine.resolve("std.Missing").unwrap_err();
    assert!(matches!(err.cause(), FailureCause::Delegation(_)));
    assert!(!engine.is_invalid(&"std.Missing".into()));
}

#[test]
fn test_isolated_names_are_not_transformed() {
    let (engine, _) = engine_with(ArchiveSource::new("archive:lib").with_entry("vendor/Codec", vec![4, 5]));
    let stage = CountingTrailer::new("count", 0);
    engine.register_stage(stage.clone());
    engine.add_exclusion(Bucket::Isolate, "vendor.");

    let unit = engine.resolve("vendor.Codec").unwrap();
    assert_eq!(unit.bytes(), &[4, 5]);
    assert_eq!(stage.calls(), 0);
    assert!(engine.cached_unit(&"vendor.Codec".into()).is_some());
}

#[test]
fn test_isolated_absence_marks_invalid() {
    let (engine, _) = engine_with(ArchiveSource::new("archive:lib"));
    engine.add_exclusion(Bucket::Isolate, "vendor.");

    assert!(engine.resolve("vendor.Gone").is_err());
    assert!(engine.is_invalid(&"vendor.Gone".into()));
}

#[test]
fn test_negative_caching_until_cleared() {
    let (engine, source) = engine_with(ArchiveSource::new("archive:lib"));
    let name = UnitName::new("a.Missing");

    let err = engine.resolve(name.clone()).unwrap_err();
    assert!(matches!(err.cause(), FailureCause::Missing { .. }));
    assert_eq!(source.lookups(), 1);

    let err = engine.resolve(name.clone()).unwrap_err();
    assert_eq!(err.cause(), &FailureCause::Invalid);
    assert_eq!(source.lookups(), 1);

    engine.clear_negative_entries(&[name.clone()]);
    assert!(!engine.is_invalid(&name));
    assert!(engine.resolve(name).is_err());
    assert_eq!(source.lookups(), 2);
}

#[test]
fn test_source_added_later_is_used_after_clearing() {
    let (engine, _) = engine_with(ArchiveSource::new("archive:first"));
    let name = UnitName::new("late.Unit");
    assert!(engine.resolve(name.clone()).is_err());

    engine.add_artifact_source(Arc::new(
        ArchiveSource::new("archive:second").with_entry("late/Unit", vec![8]),
    ));
    assert!(engine.resolve(name.clone()).is_err());

    engine.clear_negative_entries(&[name.clone()]);
    assert_eq!(engine.resolve(name).unwrap().bytes(), &[8]);
    assert_eq!(engine.list_artifact_sources(), vec!["archive:first", "archive:second"]);
}

#[test]
fn test_reserved_device_name() {
    let (engine, _) = engine_with(ArchiveSource::new("archive:lib").with_entry("_CON", vec![3, 3]));

    let unit = engine.resolve("CON").unwrap();
    assert_eq!(unit.bytes(), &[3, 3]);
    assert_eq!(unit.name().as_str(), "CON");
    assert!(engine.cached_unit(&"CON".into()).is_some());
}

#[test]
fn test_transformation_failure_names_stage() {
    let (engine, _) = engine_with(ArchiveSource::new("archive:lib").with_entry("a/B", vec![1]));
    engine.register_stage(Arc::new(Failing));

    let err = engine.resolve("a.B").unwrap_err();
    match err.cause() {
        FailureCause::Transformation(chain) => assert_eq!(chain.stage(), "failing"),
        other => panic!("unexpected cause: {:?}", other),
    }
    assert!(engine.is_invalid(&"a.B".into()));
    assert_eq!(engine.metrics().transformation_failures.get(), 1);
}

#[test]
fn test_rejecting_stage_ends_chain() {
    let (engine, _) = engine_with(
        ArchiveSource::new("archive:lib")
            .with_entry("internal/Secret", vec![1])
            .with_entry("open/Api", vec![2]),
    );
    let after = CountingTrailer::new("after", 0);
    engine.register_stage(Arc::new(DenyListStage::new("deny", ["internal."])));
    engine.register_stage(after.clone());

    let err = engine.resolve("internal.Secret").unwrap_err();
    assert!(err.to_string().contains("deny"));
    assert_eq!(after.calls(), 0);

    assert_eq!(engine.resolve("open.Api").unwrap().bytes(), &[2, 0]);
}

#[test]
fn test_racing_callers_share_one_unit() {
    let (engine, _) = engine_with(ArchiveSource::new("archive:lib").with_entry("pkg/NewUnit", vec![1]));
    engine.register_stage(CountingTrailer::slow("slow", 2, Duration::from_millis(20)));
    let engine = Arc::new(engine);
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                engine.resolve("pkg.NewUnit").unwrap()
            })
        })
        .collect();

    let units: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for unit in &units[1..] {
        assert!(unit.same_unit(&units[0]));
    }
    assert_eq!(units[0].bytes(), &[1, 2]);
}

#[test]
fn test_remapper_from_first_capable_stage() {
    let (engine, source) = engine_with(ArchiveSource::new("archive:lib").with_entry("lib/Thing", vec![6]));
    engine.register_stage(Arc::new(PrefixRemapStage::new("remap", "shaded.", "lib.")));
    engine.register_stage(Arc::new(PrefixRemapStage::new("ignored", "other.", "lib.")));

    // Searched as lib.Thing, defined as shaded.Thing.
    let unit = engine.resolve("shaded.Thing").unwrap();
    assert_eq!(unit.name().as_str(), "shaded.Thing");
    assert_eq!(unit.bytes(), &[6]);

    // Asking for the physical name lands on the same remapped unit.
    let physical = engine.resolve("lib.Thing").unwrap();
    assert!(physical.same_unit(&unit));
    assert_eq!(source.lookups(), 1);
    assert_eq!(engine.transformers(), vec!["remap", "ignored"]);
}

#[test]
fn test_signers_and_sealing_warnings() {
    let key = ed25519_dalek::SigningKey::from_bytes(&[3; 32]);
    let engine = ResolutionEngine::new(Arc::new(InMemoryHost::new())).unwrap();
    engine.add_artifact_source(Arc::new(
        ArchiveSource::new("archive:sealed")
            .with_manifest(Manifest::new().sealed())
            .with_signed_entry(
                "a/B",
                vec![1],
                vec![EntrySignature::sign(&key, "release", &[1])],
            ),
    ));
    engine.add_artifact_source(Arc::new(
        ArchiveSource::new("archive:other")
            .with_manifest(Manifest::new().sealed())
            .with_entry("a/C", vec![2])
            .with_entry("gen/D", vec![3]),
    ));
    engine.add_unsealed_namespace("gen.");

    let unit = engine.resolve("a.B").unwrap();
    let origin = unit.origin().unwrap();
    assert_eq!(origin.signers.len(), 1);
    assert_eq!(origin.signers[0].identity, "release");
    assert_eq!(engine.namespaces().is_sealed("a/"), Some(true));

    // Same namespace sealed to another archive: warned, still resolved.
    assert_eq!(engine.resolve("a.C").unwrap().bytes(), &[2]);
    assert_eq!(engine.metrics().sealing_warnings.get(), 1);

    // Unsealed namespaces skip the table.
    engine.resolve("gen.D").unwrap();
    assert_eq!(engine.namespaces().is_sealed("gen/"), None);
}

#[test]
fn test_io_failures_are_not_cached() {
    struct Flaky {
        failures_left: AtomicUsize,
        inner: ArchiveSource,
    }

    impl ArtifactSource for Flaky {
        fn location(&self) -> &str {
            "flaky:"
        }

        fn locate(&self, path: &str) -> Result<Option<ArtifactConnection>, SourceError> {
            let left = self.failures_left.load(Ordering::SeqCst);
            if left > 0 {
                self.failures_left.store(left - 1, Ordering::SeqCst);
                return Err(SourceError::io(
                    "flaky:",
                    std::io::Error::new(std::io::ErrorKind::Other, "temporarily unavailable"),
                ));
            }
            self.inner.locate(path)
        }
    }

    let engine = ResolutionEngine::new(Arc::new(InMemoryHost::new())).unwrap();
    engine.add_artifact_source(Arc::new(Flaky {
        failures_left: AtomicUsize::new(1),
        inner: ArchiveSource::new("archive:flaky").with_entry("a/B", vec![1]),
    }));

    let err = engine.resolve("a.B").unwrap_err();
    assert!(matches!(err.cause(), FailureCause::Io { .. }));
    assert!(!engine.is_invalid(&"a.B".into()));

    assert_eq!(engine.resolve("a.B").unwrap().bytes(), &[1]);
}

#[test]
fn test_metrics_exposition() {
    let (engine, _) = engine_with(ArchiveSource::new("archive:lib").with_entry("a/B", vec![1]));
    engine.resolve("a.B").unwrap();
    let _ = engine.resolve("a.Missing");

    let text = engine.metrics().encode().unwrap();
    assert!(text.contains("unitload_resolutions_total 2"));
    assert!(text.contains("unitload_invalid_marks_total 1"));
}
