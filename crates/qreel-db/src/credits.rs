//! Credit ledger.
//!
//! Credits gate how many pipeline executions a user may start. The
//! deduction is a single conditional UPDATE on the user row, not a
//! read-then-write, so concurrent requests from the same user cannot
//! overspend.

use sqlx::PgPool;
use tracing::{debug, info};

use qreel_models::UserId;

use crate::error::DbResult;

/// Atomic balance deduction and refund for user accounts.
#[derive(Clone)]
pub struct CreditLedger {
    pool: PgPool,
}

impl CreditLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Deduct one credit if the balance allows it.
    ///
    /// Returns whether the deduction occurred. Inactive accounts and
    /// zero balances are rejected without touching the row.
    pub async fn deduct(&self, user_id: UserId) -> DbResult<bool> {
        let result = sqlx::query(
            "UPDATE users SET credits = credits - 1 WHERE id = $1 AND credits > 0 AND is_active",
        )
        .bind(user_id.as_uuid())
        .execute(&self.pool)
        .await?;

        let deducted = result.rows_affected() == 1;
        debug!(user_id = %user_id, deducted, "Credit deduction");
        Ok(deducted)
    }

    /// Return one credit to the balance.
    ///
    /// Unconditional increment, not idempotent: callers must invoke it
    /// exactly once per failed pipeline execution.
    pub async fn refund(&self, user_id: UserId) -> DbResult<()> {
        sqlx::query("UPDATE users SET credits = credits + 1 WHERE id = $1")
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await?;

        info!(user_id = %user_id, "Refunded credit");
        Ok(())
    }

    /// Current balance, for the API response.
    pub async fn balance(&self, user_id: UserId) -> DbResult<Option<i32>> {
        let credits: Option<i32> = sqlx::query_scalar("SELECT credits FROM users WHERE id = $1")
            .bind(user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        Ok(credits)
    }
}
