//! Supervised fire-and-forget work that runs after a response is sent.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, error};

/// Cloneable handle over the set of running background tasks.
#[derive(Clone, Debug, Default)]
pub struct BackgroundTasks {
    set: Arc<Mutex<JoinSet<()>>>,
}

impl BackgroundTasks {
    /// Empty task set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns `task` detached from the caller. Finished tasks are reaped on
    /// the way, panics are logged and otherwise swallowed.
    pub async fn spawn<F>(&self, name: &'static str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut set = self.set.lock().await;
        while let Some(result) = set.try_join_next() {
            log_outcome(result);
        }
        set.spawn(async move {
            task.await;
            debug!("Background task {name} finished");
        });
    }

    /// Number of tasks not yet reaped.
    pub async fn len(&self) -> usize {
        self.set.lock().await.len()
    }

    /// True when nothing is pending.
    pub async fn is_empty(&self) -> bool {
        self.set.lock().await.is_empty()
    }

    /// Waits for every task, including ones spawned while draining.
    pub async fn drain(&self) {
        loop {
            let mut pending = std::mem::take(&mut *self.set.lock().await);
            if pending.is_empty() {
                return;
            }
            while let Some(result) = pending.join_next().await {
                log_outcome(result);
            }
        }
    }
}

fn log_outcome(result: Result<(), tokio::task::JoinError>) {
    if let Err(err) = result {
        if err.is_panic() {
            error!("Background task panicked: {err}");
        } else {
            error!("Background task failed: {err}");
        }
    }
}
