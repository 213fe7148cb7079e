// Worker loop that drains the processing queue

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tracing::{debug, error, info};
use uuid::Uuid;

use super::jobs::JobReceiver;
use crate::lifecycle::LifecycleManager;

/// Runs processing jobs with bounded concurrency.
///
/// The lifecycle manager keeps a sender alive, so the loop normally stops
/// through the shutdown future passed to `spawn_until`. Either way, jobs
/// already running are finished before the worker returns.
pub struct Worker {
    lifecycle: Arc<LifecycleManager>,
    receiver: JobReceiver,
    permits: Arc<Semaphore>,
}

impl Worker {
    pub fn new(lifecycle: Arc<LifecycleManager>, receiver: JobReceiver, concurrency: usize) -> Self {
        Self {
            lifecycle,
            receiver,
            permits: Arc::new(Semaphore::new(concurrency.max(1))),
        }
    }

    /// Runs until the task is aborted or the queue closes.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run(std::future::pending()))
    }

    /// Runs until `shutdown` resolves or the queue closes.
    pub fn spawn_until<F>(self, shutdown: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tokio::spawn(self.run(shutdown))
    }

    pub async fn run<F>(mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        info!(
            concurrency = self.permits.available_permits(),
            "Processing worker started"
        );
        let mut in_flight: JoinSet<Uuid> = JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!(in_flight = in_flight.len(), "Processing worker shutting down");
                    break;
                }
                maybe_job = self.receiver.recv() => {
                    let Some(job) = maybe_job else { break };
                    let Ok(permit) = self.permits.clone().acquire_owned().await else { break };
                    let lifecycle = Arc::clone(&self.lifecycle);
                    debug!(document_id = %job.document_id, "Dispatching processing job");
                    in_flight.spawn(async move {
                        let _permit = permit;
                        lifecycle.process_document(job.document_id).await;
                        job.document_id
                    });
                }
                Some(result) = in_flight.join_next(), if !in_flight.is_empty() => {
                    log_finished(result);
                }
            }
        }

        while let Some(result) = in_flight.join_next().await {
            log_finished(result);
        }
        info!("Processing worker stopped");
    }
}

fn log_finished(result: Result<Uuid, JoinError>) {
    match result {
        Ok(document_id) => debug!(%document_id, "Processing job finished"),
        // The document stays PROCESSING until the next startup recovery pass.
        Err(e) if e.is_panic() => error!("Processing job panicked: {}", e),
        Err(e) => error!("Processing job was cancelled: {}", e),
    }
}
