use anyhow::Result;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};

use crate::auth::TokenRecord;
use crate::constants::tokens::MAX_REMEMBER_DEVICES;
use crate::entities::{prelude::*, remember_tokens};

/// Remember-me secrets, one row per remembered device.
pub struct RememberRepository {
    conn: DatabaseConnection,
}

impl RememberRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Stores a new device secret and drops the user's oldest ones beyond
    /// [`MAX_REMEMBER_DEVICES`].
    pub async fn add(&self, user_id: i32, record: &TokenRecord) -> Result<()> {
        let Some(hash) = record.hash.clone() else {
            anyhow::bail!("Refusing to store a remember token without a hash");
        };

        let txn = self.conn.begin().await?;

        RememberTokens::insert(remember_tokens::ActiveModel {
            user_id: Set(user_id),
            remember_hash: Set(hash),
            created_at: Set(record
                .issued_at_rfc3339()
                .unwrap_or_else(|| chrono::Utc::now().to_rfc3339())),
            ..Default::default()
        })
        .exec(&txn)
        .await?;

        let ids: Vec<i32> = RememberTokens::find()
            .select_only()
            .column(remember_tokens::Column::Id)
            .filter(remember_tokens::Column::UserId.eq(user_id))
            .order_by_desc(remember_tokens::Column::Id)
            .into_tuple()
            .all(&txn)
            .await?;
        let stale: Vec<i32> = ids.into_iter().skip(MAX_REMEMBER_DEVICES).collect();

        if !stale.is_empty() {
            tracing::debug!(user_id, pruned = stale.len(), "Pruning old remember tokens");
            RememberTokens::delete_many()
                .filter(remember_tokens::Column::Id.is_in(stale))
                .exec(&txn)
                .await?;
        }

        txn.commit().await?;
        Ok(())
    }

    pub async fn records_for_user(&self, user_id: i32) -> Result<Vec<TokenRecord>> {
        let rows = RememberTokens::find()
            .filter(remember_tokens::Column::UserId.eq(user_id))
            .order_by_desc(remember_tokens::Column::Id)
            .all(&self.conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| TokenRecord::from_columns(Some(r.remember_hash), Some(&r.created_at)))
            .collect())
    }

    /// Removes every remember secret of the user. Returns how many were deleted.
    pub async fn delete_for_user(&self, user_id: i32) -> Result<u64> {
        let result = RememberTokens::delete_many()
            .filter(remember_tokens::Column::UserId.eq(user_id))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected)
    }
}
