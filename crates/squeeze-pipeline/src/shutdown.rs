//! Cooperative shutdown: a single flag set by signal listeners, read by
//! every wait loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Process-wide shutdown flag. Cloning yields another handle to the same
/// underlying cell.
///
/// Set exactly once by a signal listener; all wait loops poll it and
/// unwind within one polling quantum. No cleanup work happens in the
/// listeners themselves.
#[derive(Clone, Default)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Spawn listeners for the standard termination signals. Their only
    /// side effect is setting this flag and logging the observation.
    pub fn install_signals(&self) {
        let flag = self.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Got interrupt signal, shutting down");
                flag.set();
            }
        });

        #[cfg(unix)]
        {
            let flag = self.clone();
            tokio::spawn(async move {
                use tokio::signal::unix::{signal, SignalKind};
                match signal(SignalKind::terminate()) {
                    Ok(mut term) => {
                        if term.recv().await.is_some() {
                            tracing::info!("Got terminate signal, shutting down");
                            flag.set();
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Could not install SIGTERM listener");
                    }
                }
            });
        }
    }
}
