//! Durable job queue over a Postgres table.

use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use tracing::{debug, info, warn};

use qreel_models::JobStatus;

use crate::error::QueueResult;
use crate::job::{JobRow, QueueJob, QueuedJob};

const JOB_COLUMNS: &str =
    "id, job_type, payload, status, attempts, created_at, updated_at, locked_at, last_error";

/// Durable, crash-tolerant hand-off of work between the API (producer)
/// and workers (consumers), safe under concurrent claimants.
#[derive(Clone)]
pub struct JobQueue {
    pool: PgPool,
}

impl JobQueue {
    /// Create a queue over an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new PENDING job and return its id.
    pub async fn enqueue(&self, job: &QueueJob) -> QueueResult<i64> {
        let payload = serde_json::to_value(job)?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO job_queue (job_type, payload, status) VALUES ($1, $2, 'PENDING') RETURNING id",
        )
        .bind(job.job_type())
        .bind(&payload)
        .fetch_one(&self.pool)
        .await?;

        info!(job_id = id, job_type = job.job_type(), "Enqueued job");
        Ok(id)
    }

    /// Claim the oldest PENDING job, if any.
    ///
    /// Runs in a single transaction: the selected row is locked until
    /// commit, so concurrent claimants can never return the same job.
    /// `SKIP LOCKED` lets them move past each other instead of queueing
    /// on the head row. Returns `None` when the queue is empty.
    pub async fn fetch_next_pending(&self) -> QueueResult<Option<QueuedJob>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, JobRow>(&format!(
            r"
            SELECT {JOB_COLUMNS}
            FROM job_queue
            WHERE status = 'PENDING'
            ORDER BY created_at ASC, id ASC
            FOR UPDATE SKIP LOCKED
            LIMIT 1
            ",
        ))
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(None);
        };

        let row = sqlx::query_as::<_, JobRow>(&format!(
            r"
            UPDATE job_queue
            SET status = 'PROCESSING', attempts = attempts + 1, locked_at = now(), updated_at = now()
            WHERE id = $1
            RETURNING {JOB_COLUMNS}
            ",
        ))
        .bind(row.id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let job = QueuedJob::try_from(row)?;
        debug!(job_id = job.id, attempts = job.attempts, "Claimed job");
        Ok(Some(job))
    }

    /// Apply a terminal status, optionally recording an error message.
    ///
    /// Idempotent: re-applying the same status and error leaves the row
    /// unchanged. An absent error never clears a previously recorded one.
    pub async fn update_status(
        &self,
        id: i64,
        status: JobStatus,
        error: Option<&str>,
    ) -> QueueResult<()> {
        sqlx::query(
            r"
            UPDATE job_queue
            SET status = $2, last_error = COALESCE($3, last_error), updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(status.as_str())
        .bind(error)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Fetch a job by id.
    pub async fn get(&self, id: i64) -> QueueResult<Option<QueuedJob>> {
        let row = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {JOB_COLUMNS} FROM job_queue WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(QueuedJob::try_from).transpose()
    }

    /// Number of jobs still waiting to be claimed.
    pub async fn pending_count(&self) -> QueueResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM job_queue WHERE status = 'PENDING'")
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// Fail PROCESSING jobs whose claim is older than `max_age`.
    ///
    /// A worker that dies mid-job leaves the row PROCESSING forever;
    /// status transitions stay monotonic, so recovery marks the job
    /// FAILED rather than requeueing it. Returns the swept jobs so the
    /// caller can apply failure compensation (entity status, refund).
    pub async fn sweep_stale(&self, max_age: Duration) -> QueueResult<Vec<QueuedJob>> {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(max_age)
                .unwrap_or_else(|_| chrono::Duration::seconds(3600));

        let rows = sqlx::query_as::<_, JobRow>(&format!(
            r"
            UPDATE job_queue
            SET status = 'FAILED',
                last_error = 'worker lost: claim expired without a terminal status',
                updated_at = now()
            WHERE status = 'PROCESSING' AND locked_at < $1
            RETURNING {JOB_COLUMNS}
            ",
        ))
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        if !rows.is_empty() {
            warn!(count = rows.len(), "Swept stale PROCESSING jobs to FAILED");
        }

        rows.into_iter().map(QueuedJob::try_from).collect()
    }
}
