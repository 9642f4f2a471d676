//! The outer 24/7 loop: run a cycle, wait with heartbeats, back off on
//! failure, stop when the shutdown flag is observed.

use std::time::Duration;

use async_trait::async_trait;

use squeeze_types::Result;

use crate::backoff::BackoffState;
use crate::executor::RunOutcome;
use crate::shutdown::ShutdownFlag;

// ---------------------------------------------------------------------------
// Cycle
// ---------------------------------------------------------------------------

/// The supervisor's opaque unit of work: one full pipeline pass.
#[async_trait]
pub trait Cycle: Send + Sync {
    async fn run_cycle(&self) -> Result<RunOutcome>;
}

// ---------------------------------------------------------------------------
// SupervisorConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Pause between cycles after a clean run.
    pub interval: Duration,
    /// How often to log that the worker is alive while waiting.
    pub heartbeat: Duration,
    /// First retry delay after a faulted run.
    pub backoff_floor: Duration,
    /// Upper bound the retry delay never exceeds.
    pub backoff_ceiling: Duration,
    /// How often waits re-check the shutdown flag. Keep at or under 1s.
    pub poll_quantum: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(7200),
            heartbeat: Duration::from_secs(60),
            backoff_floor: Duration::from_secs(5),
            backoff_ceiling: Duration::from_secs(300),
            poll_quantum: Duration::from_secs(1),
        }
    }
}

// ---------------------------------------------------------------------------
// Supervisor
// ---------------------------------------------------------------------------

/// Loop phases. `Stopped` is reached only through the shutdown flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopState {
    Executing,
    WaitingSuccess,
    WaitingBackoff,
    Stopped,
}

pub struct Supervisor {
    cycle: Box<dyn Cycle>,
    config: SupervisorConfig,
    shutdown: ShutdownFlag,
}

impl Supervisor {
    pub fn new(cycle: impl Cycle + 'static, config: SupervisorConfig, shutdown: ShutdownFlag) -> Self {
        Self {
            cycle: Box::new(cycle),
            config,
            shutdown,
        }
    }

    /// Run until the shutdown flag is observed. An in-flight cycle always
    /// completes; the flag is honored between cycles and inside waits.
    pub async fn run(&self) {
        let mut backoff = BackoffState::new(self.config.backoff_floor, self.config.backoff_ceiling);
        let mut state = LoopState::Executing;

        tracing::info!(
            interval_secs = self.config.interval.as_secs(),
            heartbeat_secs = self.config.heartbeat.as_secs(),
            max_backoff_secs = self.config.backoff_ceiling.as_secs(),
            "Supervisor started"
        );

        loop {
            if self.shutdown.is_set() {
                state = LoopState::Stopped;
            }

            match state {
                LoopState::Executing => {
                    state = match self.cycle.run_cycle().await {
                        Ok(outcome) => {
                            tracing::info!(
                                run = %outcome.run_id,
                                status = %outcome.record.status,
                                post_id = ?outcome.record.publication_id,
                                link = outcome.record.publication_link.as_deref().unwrap_or(""),
                                "Cycle done"
                            );
                            backoff.note_success();
                            LoopState::WaitingSuccess
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Cycle failed");
                            LoopState::WaitingBackoff
                        }
                    };
                }
                LoopState::WaitingSuccess => {
                    self.wait_with_heartbeat(self.config.interval).await;
                    state = LoopState::Executing;
                }
                LoopState::WaitingBackoff => {
                    let delay = backoff.note_failure();
                    tracing::warn!(delay_secs = delay.as_secs(), "Retrying after backoff");
                    self.wait(delay).await;
                    state = LoopState::Executing;
                }
                LoopState::Stopped => break,
            }
        }

        tracing::info!("Supervisor stopped");
    }

    /// Sleep in polling quanta, returning early once the flag is set.
    async fn wait(&self, total: Duration) {
        let mut elapsed = Duration::ZERO;
        while elapsed < total && !self.shutdown.is_set() {
            let step = self.config.poll_quantum.min(total - elapsed);
            tokio::time::sleep(step).await;
            elapsed += step;
        }
    }

    /// Same as [`wait`](Self::wait) but logs a heartbeat with the
    /// remaining wait time, first one immediately.
    async fn wait_with_heartbeat(&self, total: Duration) {
        let mut elapsed = Duration::ZERO;
        let mut since_heartbeat = self.config.heartbeat;
        while elapsed < total && !self.shutdown.is_set() {
            if since_heartbeat >= self.config.heartbeat {
                let remaining = total - elapsed;
                tracing::info!(remaining_secs = remaining.as_secs(), "Alive, waiting");
                since_heartbeat = Duration::ZERO;
            }
            let step = self.config.poll_quantum.min(total - elapsed);
            tokio::time::sleep(step).await;
            elapsed += step;
            since_heartbeat += step;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use squeeze_types::{RunRecord, SqueezeError, StageStatus};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use uuid::Uuid;

    fn outcome() -> RunOutcome {
        let mut record = RunRecord::new();
        record.status = StageStatus::NoPosts;
        RunOutcome {
            run_id: Uuid::new_v4(),
            started_at: chrono::Utc::now(),
            finished_at: chrono::Utc::now(),
            record,
            visited: vec![crate::graph::Stage::Discovery],
        }
    }

    /// Cycle stub that fails (or succeeds) a fixed number of times and
    /// then requests shutdown, so the loop winds down deterministically.
    struct ScriptedCycle {
        calls: Arc<AtomicUsize>,
        fail: bool,
        stop_after: usize,
        shutdown: ShutdownFlag,
    }

    #[async_trait]
    impl Cycle for ScriptedCycle {
        async fn run_cycle(&self) -> Result<RunOutcome> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n >= self.stop_after {
                self.shutdown.set();
            }
            if self.fail {
                Err(SqueezeError::Other("cycle fault".into()))
            } else {
                Ok(outcome())
            }
        }
    }

    fn config(interval_secs: u64) -> SupervisorConfig {
        SupervisorConfig {
            interval: Duration::from_secs(interval_secs),
            heartbeat: Duration::from_secs(60),
            backoff_floor: Duration::from_secs(5),
            backoff_ceiling: Duration::from_secs(300),
            poll_quantum: Duration::from_secs(1),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn no_cycle_starts_once_shutdown_is_set() {
        let calls = Arc::new(AtomicUsize::new(0));
        let shutdown = ShutdownFlag::new();
        shutdown.set();

        let supervisor = Supervisor::new(
            ScriptedCycle {
                calls: calls.clone(),
                fail: false,
                stop_after: usize::MAX,
                shutdown: shutdown.clone(),
            },
            config(3600),
            shutdown,
        );
        supervisor.run().await;

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn clean_runs_wait_the_full_interval() {
        let calls = Arc::new(AtomicUsize::new(0));
        let shutdown = ShutdownFlag::new();

        let supervisor = Supervisor::new(
            ScriptedCycle {
                calls: calls.clone(),
                fail: false,
                stop_after: 2,
                shutdown: shutdown.clone(),
            },
            config(120),
            shutdown,
        );

        let start = tokio::time::Instant::now();
        supervisor.run().await;

        // Two cycles with one full inter-run wait between them.
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(start.elapsed(), Duration::from_secs(120));
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_doubles_across_consecutive_failures() {
        let calls = Arc::new(AtomicUsize::new(0));
        let shutdown = ShutdownFlag::new();

        let supervisor = Supervisor::new(
            ScriptedCycle {
                calls: calls.clone(),
                fail: true,
                stop_after: 3,
                shutdown: shutdown.clone(),
            },
            config(3600),
            shutdown,
        );

        let start = tokio::time::Instant::now();
        supervisor.run().await;

        // Waits of 5s then 10s between the three failed cycles; the third
        // cycle requests shutdown so its backoff wait never happens.
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn success_resets_backoff_to_the_floor() {
        let calls = Arc::new(AtomicUsize::new(0));
        let shutdown = ShutdownFlag::new();

        /// Fails, succeeds, fails, then stops: the final backoff wait must
        /// be the floor again, not 2x the floor.
        struct Alternating {
            calls: Arc<AtomicUsize>,
            shutdown: ShutdownFlag,
        }

        #[async_trait]
        impl Cycle for Alternating {
            async fn run_cycle(&self) -> Result<RunOutcome> {
                let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
                match n {
                    1 => Err(SqueezeError::Other("first".into())),
                    2 => Ok(outcome()),
                    _ => {
                        self.shutdown.set();
                        Err(SqueezeError::Other("third".into()))
                    }
                }
            }
        }

        let supervisor = Supervisor::new(
            Alternating {
                calls: calls.clone(),
                shutdown: shutdown.clone(),
            },
            config(60),
            shutdown,
        );

        let start = tokio::time::Instant::now();
        supervisor.run().await;

        // 5s backoff after the first failure, 60s interval after the
        // success, then shutdown before any further wait.
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(65));
    }

    #[tokio::test(start_paused = true)]
    async fn wait_unwinds_within_one_quantum_of_shutdown() {
        let calls = Arc::new(AtomicUsize::new(0));
        let shutdown = ShutdownFlag::new();

        let supervisor = Supervisor::new(
            ScriptedCycle {
                calls: calls.clone(),
                fail: false,
                stop_after: usize::MAX,
                shutdown: shutdown.clone(),
            },
            config(3600),
            shutdown.clone(),
        );

        // Request shutdown 90s into the inter-run wait.
        let setter = tokio::spawn({
            let shutdown = shutdown.clone();
            async move {
                tokio::time::sleep(Duration::from_secs(90)).await;
                shutdown.set();
            }
        });

        let start = tokio::time::Instant::now();
        supervisor.run().await;
        setter.await.unwrap();

        // One cycle ran; the multi-hour wait collapsed right after the flag.
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(90));
        assert!(elapsed <= Duration::from_secs(91));
    }
}
