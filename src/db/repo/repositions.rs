//! Reposition chain-entry operations for the repository.

use super::{parse_decimal, parse_uuid, Repository};
use crate::domain::{
    Address, BinRange, RepositionHistoryEntry, RepositionReason, TimeMs, UsdValue,
};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

fn entry_from_row(row: &SqliteRow) -> Result<RepositionHistoryEntry, sqlx::Error> {
    let reason_str = row.get::<String, _>("reason");
    let reason = RepositionReason::parse(&reason_str).ok_or_else(|| sqlx::Error::ColumnDecode {
        index: "reason".to_string(),
        source: format!("unknown reposition reason: {}", reason_str).into(),
    })?;

    Ok(RepositionHistoryEntry {
        id: parse_uuid(&row.get::<String, _>("id"), "id")?,
        wallet_address: Address::new(row.get::<String, _>("wallet_address")),
        old_position_address: Address::new(row.get::<String, _>("old_position_address")),
        new_position_address: Address::new(row.get::<String, _>("new_position_address")),
        reason,
        range_before: BinRange::new(
            row.get::<i64, _>("min_bin_before") as i32,
            row.get::<i64, _>("max_bin_before") as i32,
        ),
        range_after: BinRange::new(
            row.get::<i64, _>("min_bin_after") as i32,
            row.get::<i64, _>("max_bin_after") as i32,
        ),
        distance_from_range: row.get::<i64, _>("distance_from_range") as i32,
        liquidity_recovered_usd: UsdValue::new(parse_decimal(
            &row.get::<String, _>("liquidity_recovered_usd"),
            "liquidity_recovered_usd",
        )?),
        fees_recovered_usd: UsdValue::new(parse_decimal(
            &row.get::<String, _>("fees_recovered_usd"),
            "fees_recovered_usd",
        )?),
        gas_cost_lamports: row.get::<i64, _>("gas_cost_lamports") as u64,
        transaction_signature: row.get::<Option<String>, _>("transaction_signature"),
        timestamp: TimeMs::new(row.get::<i64, _>("timestamp")),
    })
}

impl Repository {
    /// Insert a reposition chain edge. Entries are created exactly once per
    /// reposition and never mutated.
    pub async fn insert_reposition_entry(
        &self,
        entry: &RepositionHistoryEntry,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO reposition_entries (
                id, wallet_address, old_position_address, new_position_address,
                reason, min_bin_before, max_bin_before, min_bin_after, max_bin_after,
                distance_from_range, liquidity_recovered_usd, fees_recovered_usd,
                gas_cost_lamports, transaction_signature, timestamp
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.id.to_string())
        .bind(entry.wallet_address.as_str())
        .bind(entry.old_position_address.as_str())
        .bind(entry.new_position_address.as_str())
        .bind(entry.reason.as_str())
        .bind(entry.range_before.min_bin_id as i64)
        .bind(entry.range_before.max_bin_id as i64)
        .bind(entry.range_after.min_bin_id as i64)
        .bind(entry.range_after.max_bin_id as i64)
        .bind(entry.distance_from_range as i64)
        .bind(entry.liquidity_recovered_usd.inner().to_canonical_string())
        .bind(entry.fees_recovered_usd.inner().to_canonical_string())
        .bind(entry.gas_cost_lamports as i64)
        .bind(entry.transaction_signature.as_deref())
        .bind(entry.timestamp.as_i64())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// One bulk query for every entry whose old or new address is in the
    /// given set. The chain tracker grows its frontier against this instead
    /// of re-querying per visited node.
    pub async fn reposition_entries_touching(
        &self,
        addresses: &[Address],
    ) -> Result<Vec<RepositionHistoryEntry>, sqlx::Error> {
        if addresses.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; addresses.len()].join(", ");
        let sql = format!(
            r#"
            SELECT * FROM reposition_entries
            WHERE old_position_address IN ({placeholders})
               OR new_position_address IN ({placeholders})
            ORDER BY timestamp ASC
            "#,
        );

        let mut query = sqlx::query(&sql);
        for address in addresses {
            query = query.bind(address.as_str());
        }
        for address in addresses {
            query = query.bind(address.as_str());
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(entry_from_row).collect()
    }

    /// All entries for a wallet, newest first.
    pub async fn reposition_entries_for_wallet(
        &self,
        wallet: &Address,
    ) -> Result<Vec<RepositionHistoryEntry>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM reposition_entries
            WHERE wallet_address = ?
            ORDER BY timestamp DESC
            "#,
        )
        .bind(wallet.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(entry_from_row).collect()
    }
}
