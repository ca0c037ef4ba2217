//! Job executor.
//!
//! A single logical consumer: claim one job, run its handler to a
//! terminal status, repeat. The loop itself never dies on a transient
//! error; only startup failures are fatal (handled in main).

use std::sync::Arc;

use metrics::counter;
use tokio::sync::watch;
use tracing::{error, info, warn};

use qreel_models::JobStatus;
use qreel_queue::{JobQueue, QueueJob, QueuedJob};

use crate::config::WorkerConfig;
use crate::context::ProcessingContext;
use crate::error::WorkerResult;
use crate::registry::HandlerRegistry;

/// Polling executor draining the durable queue.
pub struct JobExecutor {
    config: WorkerConfig,
    queue: JobQueue,
    registry: Arc<HandlerRegistry>,
    ctx: Arc<ProcessingContext>,
    shutdown: watch::Sender<bool>,
}

impl JobExecutor {
    pub fn new(
        config: WorkerConfig,
        queue: JobQueue,
        registry: HandlerRegistry,
        ctx: Arc<ProcessingContext>,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            config,
            queue,
            registry: Arc::new(registry),
            ctx,
            shutdown,
        }
    }

    /// Signal shutdown; the loop exits after the in-flight job finishes.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Run until shutdown.
    pub async fn run(&self) -> WorkerResult<()> {
        info!(
            "Starting job executor, handlers: {:?}",
            self.registry.job_types()
        );

        let sweep_task = self.spawn_stale_sweep();
        let mut shutdown_rx = self.shutdown.subscribe();

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Shutdown signal received, stopping executor");
                        break;
                    }
                }
                _ = self.tick() => {}
            }
        }

        sweep_task.abort();
        info!("Job executor stopped");
        Ok(())
    }

    /// One poll: claim a job and drive it to a terminal status, or sleep.
    async fn tick(&self) {
        match self.queue.fetch_next_pending().await {
            Ok(Some(job)) => self.process_claimed(job).await,
            Ok(None) => tokio::time::sleep(self.config.poll_interval).await,
            Err(e) => {
                // Transient store trouble: back off and resume polling.
                error!(error = %e, "Claim failed, backing off");
                counter!("qreel_worker_claim_errors_total").increment(1);
                tokio::time::sleep(self.config.error_backoff).await;
            }
        }
    }

    async fn process_claimed(&self, job: QueuedJob) {
        info!(job_id = job.id, job_type = %job.job_type, attempts = job.attempts, "Processing job");

        let Some(handler) = self.registry.get(&job.job_type) else {
            warn!(job_id = job.id, job_type = %job.job_type, "No handler registered, failing job");
            counter!("qreel_worker_jobs_unknown_type_total").increment(1);
            self.finish(job.id, JobStatus::Failed, Some(&format!("unknown job type: {}", job.job_type)))
                .await;
            return;
        };

        match handler.handle(&job.payload).await {
            Ok(()) => {
                counter!("qreel_worker_jobs_completed_total").increment(1);
                self.finish(job.id, JobStatus::Completed, None).await;
            }
            Err(e) => {
                error!(job_id = job.id, error = %e, "Job failed");
                counter!("qreel_worker_jobs_failed_total").increment(1);
                self.finish(job.id, JobStatus::Failed, Some(&e.to_string())).await;
            }
        }
    }

    /// Record the terminal status; a store error here must not kill the
    /// loop, the stale sweep will eventually fail the stuck row.
    async fn finish(&self, job_id: i64, status: JobStatus, error_msg: Option<&str>) {
        if let Err(e) = self.queue.update_status(job_id, status, error_msg).await {
            error!(job_id, error = %e, "Failed to record terminal job status");
        }
    }

    /// Periodically fail PROCESSING jobs orphaned by a crashed worker
    /// and apply the standard failure compensation for each.
    fn spawn_stale_sweep(&self) -> tokio::task::JoinHandle<()> {
        let queue = self.queue.clone();
        let ctx = Arc::clone(&self.ctx);
        let stale_after = self.config.stale_after;
        let sweep_interval = self.config.stale_sweep_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(sweep_interval);
            // The first tick fires immediately; skip it so a restart
            // does not race jobs claimed moments ago by a peer.
            ticker.tick().await;

            loop {
                ticker.tick().await;

                let swept = match queue.sweep_stale(stale_after).await {
                    Ok(swept) => swept,
                    Err(e) => {
                        warn!(error = %e, "Stale sweep failed");
                        continue;
                    }
                };

                for job in swept {
                    counter!("qreel_worker_jobs_swept_total").increment(1);
                    match job.parse_payload() {
                        Ok(QueueJob::ComposeVideo(compose)) => {
                            if let Err(e) = ctx.videos.mark_failed(compose.video_id).await {
                                error!(job_id = job.id, error = %e, "Sweep: failed to mark video FAILED");
                            }
                            if let Err(e) = ctx.ledger.refund(compose.user_id).await {
                                error!(job_id = job.id, error = %e, "Sweep: failed to refund credit");
                            }
                        }
                        Err(e) => {
                            warn!(job_id = job.id, error = %e, "Sweep: unparseable payload, no compensation");
                        }
                    }
                }
            }
        })
    }
}
