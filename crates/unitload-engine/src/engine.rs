//! Resolution Engine: routes, loads, transforms and caches units
use crate::cache::ArtifactCache;
use crate::diagnostics::DumpObserver;
use crate::fallback::{ChildDelegationFallback, SecondaryEnvironment};
use crate::metrics::EngineMetrics;
use crate::namespace::NamespaceTable;
use once_cell::sync::OnceCell;
use parking_lot::{ReentrantMutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use unitload_config::{LoaderConfig, SourceSpec};
use unitload_core::{
    ChainObserver, CodeOrigin, EngineId, FailureCause, IdentityRemapper, NameRemapper,
    RawArtifact, ResolutionContext, ResolveError, ResolvedUnit, TransformerChain,
    TransformerStage, UnitHost, UnitName,
};
use unitload_policy::{Bucket, Classification, ExclusionPolicy};
use unitload_registry::{RegistryError, TransformerRegistry};
use unitload_sources::{
    ArchiveSource, ArtifactSource, DirectorySource, SourceError, SourceRegistry,
};

static IDENTITY: IdentityRemapper = IdentityRemapper;

/// Errors while building or configuring an engine. Resolution itself only
/// ever fails with [`ResolveError`].
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("ENGINE/SOURCE: {0}")]
    Source(#[from] SourceError),

    #[error("ENGINE/REGISTRY: {0}")]
    Registry(#[from] RegistryError),

    #[error("ENGINE/METRICS: {0}")]
    Metrics(#[from] prometheus::Error),
}

pub struct ResolutionEngine {
    id: EngineId,
    host: Arc<dyn UnitHost>,
    sources: SourceRegistry,
    policy: ExclusionPolicy,
    chain: TransformerChain,
    registry: Arc<TransformerRegistry>,
    remapper: OnceCell<Arc<dyn NameRemapper>>,
    resolved: RwLock<HashMap<UnitName, ResolvedUnit>>,
    invalid: RwLock<HashSet<UnitName>>,
    artifacts: ArtifactCache,
    namespaces: NamespaceTable,
    unsealed_namespaces: RwLock<Vec<String>>,
    fallback: ChildDelegationFallback,
    observer: Option<Arc<dyn ChainObserver>>,
    metrics: EngineMetrics,
    // Serializes define + cache insert so racing callers share one unit.
    define_gate: ReentrantMutex<()>,
}

impl ResolutionEngine {
    pub fn new(host: Arc<dyn UnitHost>) -> Result<Self, EngineError> {
        Ok(Self {
            id: EngineId::next(),
            host,
            sources: SourceRegistry::new(),
            policy: ExclusionPolicy::new(),
            chain: TransformerChain::new(),
            registry: Arc::new(TransformerRegistry::new()),
            remapper: OnceCell::new(),
            resolved: RwLock::new(HashMap::new()),
            invalid: RwLock::new(HashSet::new()),
            artifacts: ArtifactCache::new(),
            namespaces: NamespaceTable::new(),
            unsealed_namespaces: RwLock::new(Vec::new()),
            fallback: ChildDelegationFallback::new(),
            observer: None,
            metrics: EngineMetrics::new()?,
            define_gate: ReentrantMutex::new(()),
        })
    }

    /// Builds an engine from configuration: sources, exclusions, stage
    /// factories and the chain, in that order.
    pub fn from_config(config: &LoaderConfig, host: Arc<dyn UnitHost>) -> Result<Self, EngineError> {
        let mut engine = Self::new(host)?;

        for spec in &config.sources {
            let source: Arc<dyn ArtifactSource> = match spec {
                SourceSpec::Directory(path) => Arc::new(DirectorySource::new(path.clone())),
                SourceSpec::Archive(path) => Arc::new(ArchiveSource::open(path)?),
            };
            engine.add_artifact_source(source);
        }

        for rule in config.exclusions.rules() {
            engine.add_exclusion(rule.bucket, rule.prefix);
        }
        for prefix in &config.unsealed_namespaces {
            engine.add_unsealed_namespace(prefix.clone());
        }

        unitload_stages::register_definitions(&engine.registry, &config.stages)?;
        for id in &config.transformers {
            engine.register_transformer(id)?;
        }

        engine.set_child_delegation(config.child_delegation);
        if config.debug.enabled {
            engine.observer = Some(Arc::new(DumpObserver::new(&config.debug)));
        }

        tracing::info!(
            engine = %engine.id,
            sources = engine.sources.len(),
            transformers = engine.chain.len(),
            "engine configured"
        );
        Ok(engine)
    }

    /// Installs a chain observer. Only valid before the engine is shared.
    pub fn with_observer(mut self, observer: Arc<dyn ChainObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Shares a factory registry with other engines.
    pub fn with_transformer_registry(mut self, registry: Arc<TransformerRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn id(&self) -> EngineId {
        self.id
    }

    // ---- resolution -------------------------------------------------------

    /// Resolves `name` to a unit, loading and transforming it on first use.
    pub fn resolve(&self, name: impl Into<UnitName>) -> Result<ResolvedUnit, ResolveError> {
        let name = name.into();
        self.metrics.resolutions.inc();
        self.find_unit(&ResolutionContext::root(), &name)
    }

    /// Context-aware resolution used by fallback chains.
    ///
    /// `Ok(None)` when this engine is already falling back in `ctx`.
    pub fn lookup(
        &self,
        ctx: &ResolutionContext,
        name: &UnitName,
    ) -> Result<Option<ResolvedUnit>, ResolveError> {
        if ctx.is_falling_back_from(self.id) {
            tracing::trace!(
                engine = %self.id,
                unit = %name,
                trace = ctx.trace_id(),
                depth = ctx.depth(),
                "reentrant lookup ignored"
            );
            return Ok(None);
        }
        self.find_unit(ctx, name).map(Some)
    }

    fn find_unit(&self, ctx: &ResolutionContext, name: &UnitName) -> Result<ResolvedUnit, ResolveError> {
        tracing::trace!(engine = %self.id, unit = %name, trace = ctx.trace_id(), "finding unit");
        if self.invalid.read().contains(name) {
            return Err(ResolveError::not_found(name, FailureCause::Invalid));
        }

        let classification = self.policy.classify(name.as_str());
        if classification == Classification::Delegate {
            return self.host.delegate(name).map_err(|e| {
                ResolveError::not_found(name, FailureCause::Delegation(e.to_string()))
            });
        }

        if let Some(unit) = self.cached_unit(name) {
            self.metrics.cache_hits.inc();
            return Ok(unit);
        }

        let attempt = match classification {
            Classification::Isolate => self.load_isolated(name),
            _ => self.load_transformed(name),
        };

        match attempt {
            Ok(unit) => Ok(unit),
            Err(cause) => self.recover(ctx, name, cause),
        }
    }

    fn load_isolated(&self, name: &UnitName) -> Result<ResolvedUnit, FailureCause> {
        let raw = self.fetch(name)?;
        let origin = self.origin_for(name, &raw);
        tracing::debug!(unit = %name, location = %raw.location, "isolated unit");
        self.define_and_cache(name, Arc::clone(&raw.bytes), origin)
    }

    fn load_transformed(&self, name: &UnitName) -> Result<ResolvedUnit, FailureCause> {
        let remapper = self.remapper();
        let remapped = remapper.remap(name);
        if let Some(unit) = self.cached_unit(&remapped) {
            self.metrics.cache_hits.inc();
            return Ok(unit);
        }

        let physical = remapper.unmap(name);
        let raw = self.fetch(&physical)?;
        let origin = self.origin_for(&physical, &raw);

        let bytes = self
            .chain
            .apply(name, &remapped, &raw.bytes, self.observer.as_deref())
            .map_err(|e| {
                self.metrics.transformation_failures.inc();
                tracing::warn!(unit = %name, stage = e.stage(), error = %e, "transformation failed");
                FailureCause::from(e)
            })?;

        self.define_and_cache(&remapped, Arc::from(bytes), origin)
    }

    fn fetch(&self, physical: &UnitName) -> Result<RawArtifact, FailureCause> {
        match self.artifacts.get(physical, &self.sources) {
            Ok(Some(raw)) => Ok(raw),
            Ok(None) => Err(FailureCause::Missing {
                path: physical.resource_path(),
            }),
            Err(e) => Err(FailureCause::Io {
                location: e.location().to_string(),
                message: e.to_string(),
            }),
        }
    }

    /// Namespace bookkeeping plus the activation record for `raw`.
    fn origin_for(&self, physical: &UnitName, raw: &RawArtifact) -> Option<CodeOrigin> {
        let origin = CodeOrigin::new(raw.location.clone());
        if self.is_unsealed_namespace(physical) {
            return Some(origin);
        }

        if let Some(namespace) = physical.namespace_path() {
            if let Some(issue) = self.namespaces.check(&namespace, &raw.location, raw.sealing.as_ref()) {
                self.metrics.sealing_warnings.inc();
                tracing::warn!(unit = %physical, "{}", issue);
            }
        }

        let signers = raw
            .sealing
            .as_ref()
            .map(|sealing| sealing.signers.clone())
            .unwrap_or_default();
        Some(origin.with_signers(signers))
    }

    fn define_and_cache(
        &self,
        name: &UnitName,
        bytes: Arc<[u8]>,
        origin: Option<CodeOrigin>,
    ) -> Result<ResolvedUnit, FailureCause> {
        let _gate = self.define_gate.lock();
        if let Some(winner) = self.cached_unit(name) {
            return Ok(winner);
        }

        let unit = self
            .host
            .define(name, bytes, origin)
            .map_err(|e| FailureCause::Activation(e.to_string()))?;
        Ok(self.cache_unit(name, unit))
    }

    fn cache_unit(&self, name: &UnitName, unit: ResolvedUnit) -> ResolvedUnit {
        self.resolved
            .write()
            .entry(name.clone())
            .or_insert(unit)
            .clone()
    }

    /// Child fallback for a failed primary attempt, then invalidation.
    fn recover(
        &self,
        ctx: &ResolutionContext,
        name: &UnitName,
        cause: FailureCause,
    ) -> Result<ResolvedUnit, ResolveError> {
        let remapped = self.remapper().remap(name);
        let child_ctx = ctx.fallback_from(self.id);

        if let Some(unit) = self.fallback.raw_lookup(&remapped, &child_ctx) {
            self.metrics.fallback_hits.inc();
            tracing::debug!(unit = %name, trace = ctx.trace_id(), "resolved through child fallback");
            return Ok(self.cache_unit(name, unit));
        }

        if cause.is_transient() {
            tracing::warn!(
                unit = %name,
                trace = ctx.trace_id(),
                cause = %cause,
                "resolution failed, will retry on next request"
            );
        } else {
            tracing::debug!(unit = %name, trace = ctx.trace_id(), cause = %cause, "marking unit invalid");
            self.invalid.write().insert(name.clone());
            self.metrics.invalid_marks.inc();
        }
        Err(ResolveError::not_found(name, cause))
    }

    fn remapper(&self) -> &dyn NameRemapper {
        match self.remapper.get() {
            Some(remapper) => &**remapper,
            None => &IDENTITY,
        }
    }

    fn is_unsealed_namespace(&self, physical: &UnitName) -> bool {
        self.unsealed_namespaces
            .read()
            .iter()
            .any(|prefix| physical.starts_with(prefix))
    }

    // ---- host-facing configuration ----------------------------------------

    pub fn add_artifact_source(&self, source: Arc<dyn ArtifactSource>) {
        self.sources.add(source);
    }

    pub fn list_artifact_sources(&self) -> Vec<String> {
        self.sources.locations()
    }

    pub fn add_exclusion(&self, bucket: Bucket, prefix: impl Into<String>) -> bool {
        self.policy.add(bucket, prefix)
    }

    pub fn exclusion_policy(&self) -> &ExclusionPolicy {
        &self.policy
    }

    pub fn add_unsealed_namespace(&self, prefix: impl Into<String>) {
        let prefix = prefix.into();
        let mut prefixes = self.unsealed_namespaces.write();
        if !prefixes.contains(&prefix) {
            prefixes.push(prefix);
        }
    }

    /// Factories available to [`register_transformer`](Self::register_transformer).
    pub fn transformer_registry(&self) -> &TransformerRegistry {
        &self.registry
    }

    /// Instantiates the stage registered under `id` and appends it to the chain.
    pub fn register_transformer(&self, id: &str) -> Result<(), RegistryError> {
        let stage = self.registry.instantiate(id)?;
        self.register_stage(stage);
        Ok(())
    }

    /// Appends `stage` to the chain. The first stage exposing a remapper
    /// becomes the engine's remapper.
    pub fn register_stage(&self, stage: Arc<dyn TransformerStage>) {
        if let Some(remapper) = Arc::clone(&stage).remapper() {
            if self.remapper.set(remapper).is_err() {
                tracing::debug!(stage = stage.id(), "remapper already installed, ignoring");
            }
        }
        tracing::debug!(engine = %self.id, stage = stage.id(), "transformer registered");
        self.chain.push(stage);
    }

    pub fn add_child(&self, child: Arc<dyn SecondaryEnvironment>) {
        self.fallback.add_child(child);
    }

    pub fn set_child_delegation(&self, enabled: bool) {
        self.fallback.set_enabled(enabled);
    }

    /// Forgets cached failures for `names`: the invalid mark and any cached
    /// absence of their raw bytes.
    pub fn clear_negative_entries(&self, names: &[UnitName]) {
        let remapper = self.remapper();
        let mut invalid = self.invalid.write();
        for name in names {
            invalid.remove(name);
            self.artifacts.clear_negative(name);
            self.artifacts.clear_negative(&remapper.unmap(name));
        }
    }

    // ---- introspection ----------------------------------------------------

    /// Registered stage identifiers, in chain order.
    pub fn transformers(&self) -> Vec<String> {
        self.chain.ids()
    }

    pub fn cached_unit(&self, name: &UnitName) -> Option<ResolvedUnit> {
        self.resolved.read().get(name).cloned()
    }

    /// Raw (untransformed) bytes cached for `name`.
    pub fn cached_raw_bytes(&self, name: &UnitName) -> Option<Arc<[u8]>> {
        let physical = self.remapper().unmap(name);
        self.artifacts.cached(&physical).map(|raw| raw.bytes)
    }

    pub fn is_invalid(&self, name: &UnitName) -> bool {
        self.invalid.read().contains(name)
    }

    pub fn namespaces(&self) -> &NamespaceTable {
        &self.namespaces
    }

    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }
}

impl SecondaryEnvironment for ResolutionEngine {
    fn raw_lookup(&self, name: &UnitName, ctx: &ResolutionContext) -> Option<ResolvedUnit> {
        match self.lookup(ctx, name) {
            Ok(unit) => unit,
            Err(e) => {
                tracing::debug!(engine = %self.id, trace = ctx.trace_id(), error = %e, "child could not resolve");
                None
            }
        }
    }
}

impl std::fmt::Debug for ResolutionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionEngine")
            .field("id", &self.id)
            .field("sources", &self.sources.locations())
            .field("transformers", &self.chain.ids())
            .field("resolved", &self.resolved.read().len())
            .field("invalid", &self.invalid.read().len())
            .finish()
    }
}
