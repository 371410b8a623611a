use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiz_core::model::UserId;
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, ser};
use crate::repository::{StorageError, SubscriptionRecord, SubscriptionRepository};

#[async_trait]
impl SubscriptionRepository for SqliteRepository {
    async fn subscribe(
        &self,
        user: UserId,
        email: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO subscriptions (chat_id, email, subscribed, updated_at)
            VALUES (?1, ?2, 1, ?3)
            ON CONFLICT(chat_id) DO UPDATE SET
                email = excluded.email,
                subscribed = 1,
                updated_at = excluded.updated_at
            ",
        )
        .bind(user.value())
        .bind(email)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn subscription(&self, user: UserId) -> Result<Option<SubscriptionRecord>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT email, subscribed, updated_at
            FROM subscriptions
            WHERE chat_id = ?1
            ",
        )
        .bind(user.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(SubscriptionRecord {
            user,
            email: row.try_get("email").map_err(ser)?,
            subscribed: row.try_get("subscribed").map_err(ser)?,
            updated_at: row.try_get("updated_at").map_err(ser)?,
        }))
    }
}
