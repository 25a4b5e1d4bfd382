//! Position and transaction-record operations for the repository.

use super::{parse_decimal, parse_decimal_opt, parse_uuid, Repository};
use crate::domain::{
    Address, Position, TimeMs, TokenAmount, TokenSymbol, TransactionRecord, TransactionType,
    UsdPrice, UsdValue,
};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

fn position_from_row(row: &SqliteRow) -> Result<Position, sqlx::Error> {
    let deposit_price_y = parse_decimal_opt(
        row.get::<Option<String>, _>("deposit_price_y").as_deref(),
        "deposit_price_y",
    )?
    .map(UsdPrice::new);

    let opt_amount = |column: &str| -> Result<Option<TokenAmount>, sqlx::Error> {
        Ok(
            parse_decimal_opt(row.get::<Option<String>, _>(column).as_deref(), column)?
                .map(TokenAmount::new),
        )
    };
    let opt_price = |column: &str| -> Result<Option<UsdPrice>, sqlx::Error> {
        Ok(
            parse_decimal_opt(row.get::<Option<String>, _>(column).as_deref(), column)?
                .map(UsdPrice::new),
        )
    };

    Ok(Position {
        id: parse_uuid(&row.get::<String, _>("id"), "id")?,
        address: Address::new(row.get::<String, _>("address")),
        pool_address: Address::new(row.get::<String, _>("pool_address")),
        wallet_address: Address::new(row.get::<String, _>("wallet_address")),
        token_x_symbol: TokenSymbol::new(row.get::<String, _>("token_x_symbol")),
        token_y_symbol: TokenSymbol::new(row.get::<String, _>("token_y_symbol")),
        deposit_amount_x: TokenAmount::new(parse_decimal(
            &row.get::<String, _>("deposit_amount_x"),
            "deposit_amount_x",
        )?),
        deposit_amount_y: TokenAmount::new(parse_decimal(
            &row.get::<String, _>("deposit_amount_y"),
            "deposit_amount_y",
        )?),
        deposit_price_x: UsdPrice::new(parse_decimal(
            &row.get::<String, _>("deposit_price_x"),
            "deposit_price_x",
        )?),
        deposit_price_y,
        created_at: TimeMs::new(row.get::<i64, _>("created_at")),
        is_active: row.get::<i64, _>("is_active") != 0,
        closed_at: row.get::<Option<i64>, _>("closed_at").map(TimeMs::new),
        withdraw_amount_x: opt_amount("withdraw_amount_x")?,
        withdraw_amount_y: opt_amount("withdraw_amount_y")?,
        withdraw_price_x: opt_price("withdraw_price_x")?,
        withdraw_price_y: opt_price("withdraw_price_y")?,
        withdraw_fee_x: opt_amount("withdraw_fee_x")?,
        withdraw_fee_y: opt_amount("withdraw_fee_y")?,
        claimed_fee_usd: UsdValue::new(parse_decimal(
            &row.get::<String, _>("claimed_fee_usd"),
            "claimed_fee_usd",
        )?),
    })
}

fn record_from_row(row: &SqliteRow) -> Result<TransactionRecord, sqlx::Error> {
    let tx_type_str = row.get::<String, _>("tx_type");
    let tx_type =
        TransactionType::parse(&tx_type_str).ok_or_else(|| sqlx::Error::ColumnDecode {
            index: "tx_type".to_string(),
            source: format!("unknown transaction type: {}", tx_type_str).into(),
        })?;

    Ok(TransactionRecord {
        position_id: parse_uuid(&row.get::<String, _>("position_id"), "position_id")?,
        tx_type,
        timestamp: TimeMs::new(row.get::<i64, _>("timestamp")),
        signature: row.get::<Option<String>, _>("signature"),
        token_x_amount: TokenAmount::new(parse_decimal(
            &row.get::<String, _>("token_x_amount"),
            "token_x_amount",
        )?),
        token_y_amount: TokenAmount::new(parse_decimal(
            &row.get::<String, _>("token_y_amount"),
            "token_y_amount",
        )?),
        token_x_price: UsdPrice::new(parse_decimal(
            &row.get::<String, _>("token_x_price"),
            "token_x_price",
        )?),
        token_y_price: UsdPrice::new(parse_decimal(
            &row.get::<String, _>("token_y_price"),
            "token_y_price",
        )?),
        usd_value: UsdValue::new(parse_decimal(
            &row.get::<String, _>("usd_value"),
            "usd_value",
        )?),
        notes: row.get::<Option<String>, _>("notes"),
    })
}

impl Repository {
    /// Insert a newly opened position. Entry fields are never updated after
    /// this write.
    ///
    /// # Errors
    /// Returns an error if the insert fails (including duplicate address).
    pub async fn insert_position(&self, position: &Position) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO positions (
                id, address, pool_address, wallet_address,
                token_x_symbol, token_y_symbol,
                deposit_amount_x, deposit_amount_y,
                deposit_price_x, deposit_price_y,
                created_at, is_active, claimed_fee_usd
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(position.id.to_string())
        .bind(position.address.as_str())
        .bind(position.pool_address.as_str())
        .bind(position.wallet_address.as_str())
        .bind(position.token_x_symbol.as_str())
        .bind(position.token_y_symbol.as_str())
        .bind(position.deposit_amount_x.inner().to_canonical_string())
        .bind(position.deposit_amount_y.inner().to_canonical_string())
        .bind(position.deposit_price_x.inner().to_canonical_string())
        .bind(
            position
                .deposit_price_y
                .map(|p| p.inner().to_canonical_string()),
        )
        .bind(position.created_at.as_i64())
        .bind(position.is_active as i64)
        .bind(position.claimed_fee_usd.inner().to_canonical_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Find a position by its on-chain address.
    pub async fn find_position(&self, address: &Address) -> Result<Option<Position>, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM positions WHERE address = ?")
            .bind(address.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(position_from_row).transpose()
    }

    /// All positions owned by a wallet, newest first.
    pub async fn find_positions_by_wallet(
        &self,
        wallet: &Address,
    ) -> Result<Vec<Position>, sqlx::Error> {
        let rows =
            sqlx::query("SELECT * FROM positions WHERE wallet_address = ? ORDER BY created_at DESC")
                .bind(wallet.as_str())
                .fetch_all(&self.pool)
                .await?;
        rows.iter().map(position_from_row).collect()
    }

    /// Close a position, writing the withdrawal snapshot fields exactly once.
    ///
    /// Returns false when the position was already closed (or absent); the
    /// withdrawal fields of a closed position are immutable.
    #[allow(clippy::too_many_arguments)]
    pub async fn close_position(
        &self,
        address: &Address,
        closed_at: TimeMs,
        withdraw_amount_x: TokenAmount,
        withdraw_amount_y: TokenAmount,
        withdraw_price_x: UsdPrice,
        withdraw_price_y: UsdPrice,
        withdraw_fee_x: TokenAmount,
        withdraw_fee_y: TokenAmount,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE positions SET
                is_active = 0,
                closed_at = ?,
                withdraw_amount_x = ?,
                withdraw_amount_y = ?,
                withdraw_price_x = ?,
                withdraw_price_y = ?,
                withdraw_fee_x = ?,
                withdraw_fee_y = ?
            WHERE address = ? AND is_active = 1
            "#,
        )
        .bind(closed_at.as_i64())
        .bind(withdraw_amount_x.inner().to_canonical_string())
        .bind(withdraw_amount_y.inner().to_canonical_string())
        .bind(withdraw_price_x.inner().to_canonical_string())
        .bind(withdraw_price_y.inner().to_canonical_string())
        .bind(withdraw_fee_x.inner().to_canonical_string())
        .bind(withdraw_fee_y.inner().to_canonical_string())
        .bind(address.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Append an immutable transaction-record log entry. Fee claims also
    /// bump the position's cumulative claimed-fee aggregate.
    pub async fn append_transaction_record(
        &self,
        record: &TransactionRecord,
    ) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO transaction_records (
                position_id, tx_type, timestamp, signature,
                token_x_amount, token_y_amount,
                token_x_price, token_y_price, usd_value, notes
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.position_id.to_string())
        .bind(record.tx_type.as_str())
        .bind(record.timestamp.as_i64())
        .bind(record.signature.as_deref())
        .bind(record.token_x_amount.inner().to_canonical_string())
        .bind(record.token_y_amount.inner().to_canonical_string())
        .bind(record.token_x_price.inner().to_canonical_string())
        .bind(record.token_y_price.inner().to_canonical_string())
        .bind(record.usd_value.inner().to_canonical_string())
        .bind(record.notes.as_deref())
        .execute(&mut *tx)
        .await?;

        if record.tx_type == TransactionType::FeeClaim {
            // Stored as a canonical string, so read-modify-write inside the
            // same transaction.
            let row = sqlx::query("SELECT claimed_fee_usd FROM positions WHERE id = ?")
                .bind(record.position_id.to_string())
                .fetch_optional(&mut *tx)
                .await?;
            if let Some(row) = row {
                let current = parse_decimal(
                    &row.get::<String, _>("claimed_fee_usd"),
                    "claimed_fee_usd",
                )?;
                let updated = current + record.usd_value.inner();
                sqlx::query("UPDATE positions SET claimed_fee_usd = ? WHERE id = ?")
                    .bind(updated.to_canonical_string())
                    .bind(record.position_id.to_string())
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }

    /// Insert a new position and log its deposit in one flow.
    pub async fn record_deposit(
        &self,
        position: &Position,
        signature: Option<String>,
    ) -> Result<(), sqlx::Error> {
        self.insert_position(position).await?;
        self.append_transaction_record(&TransactionRecord::new(
            position.id,
            TransactionType::Deposit,
            position.created_at,
            signature,
            position.deposit_amount_x,
            position.deposit_amount_y,
            position.deposit_price_x,
            position.deposit_price_y.unwrap_or_else(UsdPrice::zero),
            None,
        ))
        .await
    }

    /// Log a fee claim against a position, bumping its claimed aggregate.
    #[allow(clippy::too_many_arguments)]
    pub async fn record_fee_claim(
        &self,
        position_id: Uuid,
        timestamp: TimeMs,
        signature: Option<String>,
        amount_x: TokenAmount,
        amount_y: TokenAmount,
        price_x: UsdPrice,
        price_y: UsdPrice,
    ) -> Result<(), sqlx::Error> {
        self.append_transaction_record(&TransactionRecord::new(
            position_id,
            TransactionType::FeeClaim,
            timestamp,
            signature,
            amount_x,
            amount_y,
            price_x,
            price_y,
            None,
        ))
        .await
    }

    /// Close a position and log the withdrawal. Returns false (and logs
    /// nothing) when the position was already closed.
    #[allow(clippy::too_many_arguments)]
    pub async fn record_withdrawal(
        &self,
        position: &Position,
        closed_at: TimeMs,
        amount_x: TokenAmount,
        amount_y: TokenAmount,
        price_x: UsdPrice,
        price_y: UsdPrice,
        fee_x: TokenAmount,
        fee_y: TokenAmount,
        signature: Option<String>,
    ) -> Result<bool, sqlx::Error> {
        let closed = self
            .close_position(
                &position.address,
                closed_at,
                amount_x,
                amount_y,
                price_x,
                price_y,
                fee_x,
                fee_y,
            )
            .await?;
        if closed {
            self.append_transaction_record(&TransactionRecord::new(
                position.id,
                TransactionType::Withdraw,
                closed_at,
                signature,
                amount_x,
                amount_y,
                price_x,
                price_y,
                None,
            ))
            .await?;
        }
        Ok(closed)
    }

    /// All fee-claim records for a position, oldest first. The claimed-fee
    /// fold runs over these.
    pub async fn fee_claim_records(
        &self,
        position_id: Uuid,
    ) -> Result<Vec<TransactionRecord>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM transaction_records
            WHERE position_id = ? AND tx_type = 'fee_claim'
            ORDER BY timestamp ASC
            "#,
        )
        .bind(position_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(record_from_row).collect()
    }
}
