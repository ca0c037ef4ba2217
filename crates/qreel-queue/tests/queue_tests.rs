//! Queue integration tests.
//!
//! These exercise the claim transaction against a real Postgres, so they
//! are ignored by default. Run them single-threaded against a scratch
//! database:
//!
//! ```sh
//! DATABASE_URL=postgres://localhost/qreel_test \
//!     cargo test -p qreel-queue -- --ignored --test-threads=1
//! ```

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use qreel_models::{JobStatus, TextContent, UserId, VideoId};
use qreel_queue::{ComposeVideoJob, JobQueue, QueueJob};

async fn test_pool() -> PgPool {
    dotenvy::dotenv().ok();
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL not set");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("Failed to connect to Postgres");
    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    sqlx::query("TRUNCATE job_queue RESTART IDENTITY")
        .execute(&pool)
        .await
        .expect("Failed to truncate job_queue");
    pool
}

fn sample_job(name: &str) -> QueueJob {
    QueueJob::ComposeVideo(ComposeVideoJob::new(
        VideoId::new(),
        UserId::new(),
        name,
        TextContent::plain("A quote"),
        "/srv/assets/default_base.mp4",
    ))
}

#[tokio::test]
#[ignore = "requires Postgres"]
async fn claims_follow_creation_order() {
    let queue = JobQueue::new(test_pool().await);

    let first = queue.enqueue(&sample_job("first")).await.unwrap();
    let second = queue.enqueue(&sample_job("second")).await.unwrap();
    let third = queue.enqueue(&sample_job("third")).await.unwrap();

    for expected in [first, second, third] {
        let job = queue
            .fetch_next_pending()
            .await
            .unwrap()
            .expect("expected a pending job");
        assert_eq!(job.id, expected);
        assert_eq!(job.status, JobStatus::Processing);
        assert_eq!(job.attempts, 1);
        assert!(job.locked_at.is_some());
    }

    // All claimed; nothing left to hand out.
    assert!(queue.fetch_next_pending().await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires Postgres"]
async fn empty_queue_returns_none() {
    let queue = JobQueue::new(test_pool().await);
    assert!(queue.fetch_next_pending().await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires Postgres"]
async fn concurrent_claimants_never_share_a_job() {
    let queue = JobQueue::new(test_pool().await);
    let id = queue.enqueue(&sample_job("solo")).await.unwrap();

    let a = {
        let queue = queue.clone();
        tokio::spawn(async move { queue.fetch_next_pending().await.unwrap() })
    };
    let b = {
        let queue = queue.clone();
        tokio::spawn(async move { queue.fetch_next_pending().await.unwrap() })
    };

    let (a, b) = (a.await.unwrap(), b.await.unwrap());
    let claimed: Vec<i64> = [a, b].into_iter().flatten().map(|j| j.id).collect();
    assert_eq!(claimed, vec![id], "exactly one claimant must win");
}

#[tokio::test]
#[ignore = "requires Postgres"]
async fn terminal_status_update_is_idempotent() {
    let queue = JobQueue::new(test_pool().await);
    let id = queue.enqueue(&sample_job("failing")).await.unwrap();
    queue.fetch_next_pending().await.unwrap().unwrap();

    queue
        .update_status(id, JobStatus::Failed, Some("x"))
        .await
        .unwrap();
    let after_first = queue.get(id).await.unwrap().unwrap();

    queue
        .update_status(id, JobStatus::Failed, Some("x"))
        .await
        .unwrap();
    let after_second = queue.get(id).await.unwrap().unwrap();

    assert_eq!(after_first.status, JobStatus::Failed);
    assert_eq!(after_second.status, JobStatus::Failed);
    assert_eq!(after_first.last_error.as_deref(), Some("x"));
    assert_eq!(after_second.last_error.as_deref(), Some("x"));

    // A later update without an error must not clear the recorded one.
    queue.update_status(id, JobStatus::Failed, None).await.unwrap();
    let after_third = queue.get(id).await.unwrap().unwrap();
    assert_eq!(after_third.last_error.as_deref(), Some("x"));
}

#[tokio::test]
#[ignore = "requires Postgres"]
async fn stale_sweep_fails_orphaned_jobs() {
    let pool = test_pool().await;
    let queue = JobQueue::new(pool.clone());

    let id = queue.enqueue(&sample_job("orphan")).await.unwrap();
    queue.fetch_next_pending().await.unwrap().unwrap();

    // Backdate the claim to look like a crashed worker.
    sqlx::query("UPDATE job_queue SET locked_at = now() - interval '2 hours' WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .unwrap();

    let swept = queue.sweep_stale(Duration::from_secs(3600)).await.unwrap();
    assert_eq!(swept.len(), 1);
    assert_eq!(swept[0].id, id);

    let job = queue.get(id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.last_error.as_deref().unwrap_or("").contains("worker lost"));

    // A fresh claim is untouched by the sweep.
    let fresh = queue.enqueue(&sample_job("fresh")).await.unwrap();
    queue.fetch_next_pending().await.unwrap().unwrap();
    let swept = queue.sweep_stale(Duration::from_secs(3600)).await.unwrap();
    assert!(swept.is_empty());
    let job = queue.get(fresh).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Processing);
}
