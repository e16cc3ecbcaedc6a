//! Transformer Chain: runs stages in registration order
use crate::error::ChainError;
use crate::name::UnitName;
use crate::stage::TransformerStage;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Instant;

/// What an observer sees after each stage.
#[derive(Debug)]
pub struct StageSnapshot<'a> {
    /// 1-based position of the stage in the chain
    pub index: usize,
    pub stage_id: &'a str,
    pub name: &'a UnitName,
    pub remapped: &'a UnitName,
    pub before: &'a [u8],
    pub after: &'a [u8],
    pub in_hash: String,
    pub out_hash: String,
    pub latency_us: u64,
}

impl StageSnapshot<'_> {
    pub fn changed(&self) -> bool {
        self.in_hash != self.out_hash
    }
}

/// Read-only view of chain execution, for diagnostics.
///
/// Observers never influence the result, the order, or what gets cached.
pub trait ChainObserver: Send + Sync {
    fn chain_started(
        &self,
        _name: &UnitName,
        _remapped: &UnitName,
        _input: &[u8],
        _stage_count: usize,
    ) {
    }

    fn stage_completed(&self, snapshot: &StageSnapshot<'_>);

    fn chain_finished(
        &self,
        _name: &UnitName,
        _remapped: &UnitName,
        _original: &[u8],
        _output: &[u8],
    ) {
    }
}

/// Append-only, ordered list of transformer stages.
#[derive(Default)]
pub struct TransformerChain {
    stages: RwLock<Vec<Arc<dyn TransformerStage>>>,
}

impl TransformerChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a stage; it runs after every stage registered before it.
    pub fn push(&self, stage: Arc<dyn TransformerStage>) {
        self.stages.write().push(stage);
    }

    pub fn len(&self) -> usize {
        self.stages.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.read().is_empty()
    }

    /// Stage identifiers in execution order.
    pub fn ids(&self) -> Vec<String> {
        self.stages
            .read()
            .iter()
            .map(|stage| stage.id().to_string())
            .collect()
    }

    /// Runs every stage over `input`, each one on the previous stage's output.
    pub fn apply(
        &self,
        name: &UnitName,
        remapped: &UnitName,
        input: &[u8],
        observer: Option<&dyn ChainObserver>,
    ) -> Result<Vec<u8>, ChainError> {
        // Snapshot so a concurrent registration cannot change this run.
        let stages: Vec<Arc<dyn TransformerStage>> = self.stages.read().clone();

        if let Some(observer) = observer {
            observer.chain_started(name, remapped, input, stages.len());
        }
        tracing::trace!(
            unit = %name,
            remapped = %remapped,
            length = input.len(),
            "beginning transform"
        );

        let mut current = input.to_vec();

        for (position, stage) in stages.iter().enumerate() {
            let start = Instant::now();

            let output = stage
                .transform(name, remapped, &current)
                .map_err(|e| ChainError::failed(stage.id(), name, &e))?
                .ok_or_else(|| ChainError::Rejected {
                    stage: stage.id().to_string(),
                    name: name.clone(),
                })?;

            if let Some(observer) = observer {
                observer.stage_completed(&StageSnapshot {
                    index: position + 1,
                    stage_id: stage.id(),
                    name,
                    remapped,
                    before: &current,
                    after: &output,
                    in_hash: crate::digest(&current),
                    out_hash: crate::digest(&output),
                    latency_us: start.elapsed().as_micros() as u64,
                });
            }

            current = output;
        }

        if let Some(observer) = observer {
            observer.chain_finished(name, remapped, input, &current);
        }
        tracing::trace!(unit = %name, length = current.len(), "ending transform");

        Ok(current)
    }
}
