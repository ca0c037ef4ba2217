//! Credit ledger integration tests.
//!
//! Run against a scratch database:
//!
//! ```sh
//! DATABASE_URL=postgres://localhost/qreel_test \
//!     cargo test -p qreel-db -- --ignored --test-threads=1
//! ```

use sqlx::PgPool;
use uuid::Uuid;

use qreel_db::{connect_and_migrate, CreditLedger};
use qreel_models::UserId;

async fn test_pool() -> PgPool {
    dotenvy::dotenv().ok();
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL not set");
    connect_and_migrate(&url, 5)
        .await
        .expect("Failed to connect to Postgres")
}

async fn insert_user(pool: &PgPool, credits: i32, is_active: bool) -> UserId {
    let id: Uuid = sqlx::query_scalar(
        "INSERT INTO users (email, credits, is_active) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(format!("{}@example.com", Uuid::new_v4()))
    .bind(credits)
    .bind(is_active)
    .fetch_one(pool)
    .await
    .expect("Failed to insert user");
    UserId(id)
}

#[tokio::test]
#[ignore = "requires Postgres"]
async fn deduct_at_zero_is_rejected() {
    let pool = test_pool().await;
    let ledger = CreditLedger::new(pool.clone());
    let user = insert_user(&pool, 0, true).await;

    assert!(!ledger.deduct(user).await.unwrap());
    assert_eq!(ledger.balance(user).await.unwrap(), Some(0));
}

#[tokio::test]
#[ignore = "requires Postgres"]
async fn deduct_decrements_by_one() {
    let pool = test_pool().await;
    let ledger = CreditLedger::new(pool.clone());
    let user = insert_user(&pool, 3, true).await;

    assert!(ledger.deduct(user).await.unwrap());
    assert_eq!(ledger.balance(user).await.unwrap(), Some(2));
}

#[tokio::test]
#[ignore = "requires Postgres"]
async fn inactive_accounts_cannot_spend() {
    let pool = test_pool().await;
    let ledger = CreditLedger::new(pool.clone());
    let user = insert_user(&pool, 5, false).await;

    assert!(!ledger.deduct(user).await.unwrap());
    assert_eq!(ledger.balance(user).await.unwrap(), Some(5));
}

#[tokio::test]
#[ignore = "requires Postgres"]
async fn refund_restores_original_balance() {
    let pool = test_pool().await;
    let ledger = CreditLedger::new(pool.clone());
    let user = insert_user(&pool, 2, true).await;

    assert!(ledger.deduct(user).await.unwrap());
    ledger.refund(user).await.unwrap();
    assert_eq!(ledger.balance(user).await.unwrap(), Some(2));
}

#[tokio::test]
#[ignore = "requires Postgres"]
async fn concurrent_deductions_never_overspend() {
    let pool = test_pool().await;
    let ledger = CreditLedger::new(pool.clone());
    let user = insert_user(&pool, 1, true).await;

    let mut handles = Vec::new();
    for _ in 0..4 {
        let ledger = ledger.clone();
        handles.push(tokio::spawn(async move { ledger.deduct(user).await.unwrap() }));
    }

    let mut granted = 0;
    for handle in handles {
        if handle.await.unwrap() {
            granted += 1;
        }
    }

    assert_eq!(granted, 1);
    assert_eq!(ledger.balance(user).await.unwrap(), Some(0));
}
