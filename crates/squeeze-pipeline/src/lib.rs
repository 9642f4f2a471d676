//! The core of the Trend Squeeze worker: a fixed five-stage content
//! pipeline and the outer loop that keeps it running unattended.
//!
//! - [`graph`] — the stage sequence and its routing table
//! - [`stage`] — the stage trait and registry
//! - [`executor`] — one full pipeline pass
//! - [`supervisor`] — the 24/7 loop with heartbeats and backoff
//! - [`shutdown`] — cooperative termination
//! - [`stages`] — the five concrete stage implementations

pub mod backoff;
pub mod executor;
pub mod graph;
pub mod shutdown;
pub mod stage;
pub mod stages;
pub mod supervisor;

pub use backoff::BackoffState;
pub use executor::{RunExecutor, RunOutcome};
pub use graph::Stage;
pub use shutdown::ShutdownFlag;
pub use stage::{DynStage, PipelineStage, StageRegistry};
pub use supervisor::{Cycle, Supervisor, SupervisorConfig};
