//! One full pipeline pass: seed an empty record, walk the graph from the
//! entry stage, merge each update, stop at the first non-advancing edge.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use squeeze_types::{Result, RunRecord, SqueezeError};

use crate::graph::Stage;
use crate::stage::StageRegistry;
use crate::supervisor::Cycle;

/// The result of one completed run, whatever its terminal status.
#[derive(Debug)]
pub struct RunOutcome {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub record: RunRecord,
    pub visited: Vec<Stage>,
}

/// Drives one pipeline pass to completion. Owns the stage registry.
pub struct RunExecutor {
    registry: StageRegistry,
}

impl RunExecutor {
    pub fn new(registry: StageRegistry) -> Self {
        Self { registry }
    }

    /// Run the graph once from the entry stage.
    ///
    /// The executor does not interpret success or failure of the content
    /// itself; it returns whatever record the routing left behind. An
    /// `Err` from a stage is a contract violation and propagates as-is.
    pub async fn run_once(&self) -> Result<RunOutcome> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let mut record = RunRecord::new();
        let mut visited = Vec::new();
        let mut current = Some(Stage::entry());

        tracing::info!(run = %run_id, "Cycle start");

        while let Some(stage) = current {
            let implementation = self
                .registry
                .get(stage)
                .ok_or_else(|| SqueezeError::MissingStage(stage.name().to_string()))?;

            let update = implementation.run(&record).await?;
            tracing::info!(run = %run_id, stage = %stage, status = %update.status, "Stage finished");

            record.apply(update);
            visited.push(stage);

            current = if stage.advances(&record) {
                stage.next()
            } else {
                None
            };
        }

        let finished_at = Utc::now();
        tracing::info!(
            run = %run_id,
            status = %record.status,
            stages = visited.len(),
            "Cycle done"
        );

        Ok(RunOutcome {
            run_id,
            started_at,
            finished_at,
            record,
            visited,
        })
    }
}

#[async_trait]
impl Cycle for RunExecutor {
    async fn run_cycle(&self) -> Result<RunOutcome> {
        self.run_once().await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
