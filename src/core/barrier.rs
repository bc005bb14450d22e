//! Blocking wait on a worker task

use std::{future::Future, time::Duration};

use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::core::error::BarrierError;

/// Runs an operation on a worker task and waits for its completion signal
#[derive(Debug, Clone, Copy, Default)]
pub struct OperationBarrier {
    timeout: Option<Duration>,
}

impl OperationBarrier {
    /// Create a barrier; `None` waits without limit
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    /// Spawn `operation` and wait until it reports its output
    ///
    /// On timeout the worker is left running; the caller is expected to
    /// terminate the process.
    pub async fn run<F, T>(&self, operation: F) -> Result<T, BarrierError>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (done_tx, done_rx) = oneshot::channel();

        tokio::spawn(async move {
            let output = operation.await;
            if done_tx.send(output).is_err() {
                debug!("Barrier released before worker completed");
            }
        });

        let signal = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, done_rx).await.map_err(|_| {
                warn!(?timeout, "Worker did not complete in time");
                BarrierError::TimedOut(timeout)
            })?,
            None => done_rx.await,
        };

        signal.map_err(|_| BarrierError::WorkerLost)
    }
}
