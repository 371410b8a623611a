use async_trait::async_trait;
use quiz_core::model::{PendingInterrupt, UserId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, map_snapshot, parse_interrupt_kind, ser};
use crate::repository::{InterruptRepository, StorageError};

#[async_trait]
impl InterruptRepository for SqliteRepository {
    async fn put_pending(
        &self,
        user: UserId,
        pending: &PendingInterrupt,
    ) -> Result<(), StorageError> {
        let (section, index) = match pending.snapshot {
            Some(snapshot) => (Some(snapshot.section.code()), Some(i64::from(snapshot.index))),
            None => (None, None),
        };

        sqlx::query(
            r"
            INSERT INTO pending_interrupts (chat_id, kind, section, current_index, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(chat_id) DO UPDATE SET
                kind = excluded.kind,
                section = excluded.section,
                current_index = excluded.current_index,
                created_at = excluded.created_at
            ",
        )
        .bind(user.value())
        .bind(pending.kind.code())
        .bind(section)
        .bind(index)
        .bind(pending.created_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn pending(&self, user: UserId) -> Result<Option<PendingInterrupt>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT kind, section, current_index, created_at
            FROM pending_interrupts
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
        let kind = parse_interrupt_kind(&row.try_get::<String, _>("kind").map_err(ser)?)?;
        let snapshot = map_snapshot(
            row.try_get("section").map_err(ser)?,
            row.try_get("current_index").map_err(ser)?,
        )?;
        Ok(Some(PendingInterrupt::new(
            kind,
            snapshot,
            row.try_get("created_at").map_err(ser)?,
        )))
    }

    async fn clear_pending(&self, user: UserId) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM pending_interrupts WHERE chat_id = ?1")
            .bind(user.value())
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        Ok(())
    }
}
