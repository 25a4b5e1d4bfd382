//! Pending-transaction intent and rate-limit operations for the repository.
//!
//! The persistent store is the authoritative rate-limit counter so that
//! concurrent preparer instances observe a consistent view.

use super::Repository;
use crate::domain::{Address, PendingTransaction, TimeMs};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

fn pending_from_row(row: &SqliteRow) -> PendingTransaction {
    PendingTransaction {
        tx_hash: row.get::<String, _>("tx_hash"),
        wallet_address: Address::new(row.get::<String, _>("wallet_address")),
        position_address: Address::new(row.get::<String, _>("position_address")),
        created_at: TimeMs::new(row.get::<i64, _>("created_at")),
        expires_at: TimeMs::new(row.get::<i64, _>("expires_at")),
        executed: row.get::<i64, _>("executed") != 0,
    }
}

impl Repository {
    /// Register a prepared-transaction intent. tx_hash is the unique key.
    pub async fn insert_pending_transaction(
        &self,
        pending: &PendingTransaction,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO pending_transactions
                (tx_hash, wallet_address, position_address, created_at, expires_at, executed)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&pending.tx_hash)
        .bind(pending.wallet_address.as_str())
        .bind(pending.position_address.as_str())
        .bind(pending.created_at.as_i64())
        .bind(pending.expires_at.as_i64())
        .bind(pending.executed as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Count intents created for a wallet at or after `since`. Expired and
    /// executed rows still count toward the fixed window.
    pub async fn count_pending_transactions(
        &self,
        wallet: &Address,
        since: TimeMs,
    ) -> Result<u32, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS n FROM pending_transactions
            WHERE wallet_address = ? AND created_at >= ?
            "#,
        )
        .bind(wallet.as_str())
        .bind(since.as_i64())
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get::<i64, _>("n") as u32)
    }

    /// Look up an intent by transaction hash.
    pub async fn find_pending_transaction(
        &self,
        tx_hash: &str,
    ) -> Result<Option<PendingTransaction>, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM pending_transactions WHERE tx_hash = ?")
            .bind(tx_hash)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(pending_from_row))
    }

    /// Mark an intent consumed. Returns false if the hash is unknown or the
    /// intent was already consumed; single-use by construction.
    pub async fn mark_pending_executed(&self, tx_hash: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE pending_transactions SET executed = 1 WHERE tx_hash = ? AND executed = 0",
        )
        .bind(tx_hash)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete intents past their expiry that have also aged out of the
    /// rate-limit window, so housekeeping never loosens the limiter.
    pub async fn expire_stale_pending(
        &self,
        now: TimeMs,
        rate_window_secs: i64,
    ) -> Result<u64, sqlx::Error> {
        let window_start = now.minus_secs(rate_window_secs);
        let result = sqlx::query(
            "DELETE FROM pending_transactions WHERE expires_at < ? AND created_at < ?",
        )
        .bind(now.as_i64())
        .bind(window_start.as_i64())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
