//! Stage trait, dynamic dispatch wrapper, and stage registry.

use std::collections::HashMap;

use async_trait::async_trait;

use squeeze_types::{Result, RunRecord, StageUpdate};

use crate::graph::Stage;

// ---------------------------------------------------------------------------
// PipelineStage trait
// ---------------------------------------------------------------------------

/// One unit of work in the pipeline graph.
///
/// Two distinct failure outcomes, deliberately kept apart:
/// - `Ok` with a non-advancing status token — the stage hit an internal
///   fault (network error, malformed response, empty result), recovered,
///   and the run simply ends at this edge;
/// - `Err` — the stage violated its contract. The executor does not catch
///   this; it becomes a run-level failure the supervisor backs off on.
#[async_trait]
pub trait PipelineStage: Send + Sync {
    /// Which graph node this implementation serves.
    fn stage(&self) -> Stage;

    /// Execute against the current record and return a partial update.
    /// The record is read-only; whatever the stage wants to propagate
    /// must be in the returned update.
    async fn run(&self, record: &RunRecord) -> Result<StageUpdate>;
}

// ---------------------------------------------------------------------------
// DynStage — object-safe wrapper
// ---------------------------------------------------------------------------

pub struct DynStage(Box<dyn PipelineStage>);

impl DynStage {
    pub fn new(stage: impl PipelineStage + 'static) -> Self {
        Self(Box::new(stage))
    }

    pub fn stage(&self) -> Stage {
        self.0.stage()
    }

    pub async fn run(&self, record: &RunRecord) -> Result<StageUpdate> {
        self.0.run(record).await
    }
}

// ---------------------------------------------------------------------------
// StageRegistry
// ---------------------------------------------------------------------------

/// Maps each graph node to its implementation.
#[derive(Default)]
pub struct StageRegistry {
    stages: HashMap<Stage, DynStage>,
}

impl StageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, stage: impl PipelineStage + 'static) {
        let key = stage.stage();
        self.stages.insert(key, DynStage::new(stage));
    }

    pub fn get(&self, stage: Stage) -> Option<&DynStage> {
        self.stages.get(&stage)
    }

    pub fn has(&self, stage: Stage) -> bool {
        self.stages.contains_key(&stage)
    }

    /// True when every node of the graph has an implementation.
    pub fn is_complete(&self) -> bool {
        Stage::ORDER.iter().all(|s| self.stages.contains_key(s))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use squeeze_types::StageStatus;

    struct NoopStage(Stage);

    #[async_trait]
    impl PipelineStage for NoopStage {
        fn stage(&self) -> Stage {
            self.0
        }

        async fn run(&self, _record: &RunRecord) -> Result<StageUpdate> {
            Ok(StageUpdate::new(StageStatus::Skip, "noop"))
        }
    }

    #[test]
    fn register_and_get() {
        let mut registry = StageRegistry::new();
        registry.register(NoopStage(Stage::Discovery));

        assert!(registry.has(Stage::Discovery));
        assert!(registry.get(Stage::Discovery).is_some());
        assert!(!registry.has(Stage::Publication));
        assert!(registry.get(Stage::Publication).is_none());
    }

    #[test]
    fn registering_twice_replaces() {
        let mut registry = StageRegistry::new();
        registry.register(NoopStage(Stage::Discovery));
        registry.register(NoopStage(Stage::Discovery));
        assert!(registry.has(Stage::Discovery));
    }

    #[test]
    fn completeness_requires_all_five() {
        let mut registry = StageRegistry::new();
        for stage in [
            Stage::Discovery,
            Stage::Eligibility,
            Stage::Generation,
            Stage::Refinement,
        ] {
            registry.register(NoopStage(stage));
            assert!(!registry.is_complete());
        }
        registry.register(NoopStage(Stage::Publication));
        assert!(registry.is_complete());
    }

    #[tokio::test]
    async fn dyn_stage_delegates() {
        let dyn_stage = DynStage::new(NoopStage(Stage::Refinement));
        assert_eq!(dyn_stage.stage(), Stage::Refinement);
        let update = dyn_stage.run(&RunRecord::new()).await.unwrap();
        assert_eq!(update.status, StageStatus::Skip);
    }
}
