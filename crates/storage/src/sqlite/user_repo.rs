use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiz_core::model::{Language, UserId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, parse_language, ser};
use crate::repository::{StorageError, UserRepository};

#[async_trait]
impl UserRepository for SqliteRepository {
    async fn ensure_user(&self, user: UserId, at: DateTime<Utc>) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO users (chat_id, language, created_at, last_active_at)
            VALUES (?1, NULL, ?2, ?2)
            ON CONFLICT(chat_id) DO NOTHING
            ",
        )
        .bind(user.value())
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        if res.rows_affected() > 0 {
            tracing::info!(user = %user, "registered new user");
        }
        Ok(())
    }

    async fn language(&self, user: UserId) -> Result<Option<Language>, StorageError> {
        let row = sqlx::query("SELECT language FROM users WHERE chat_id = ?1")
            .bind(user.value())
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };
        row.try_get::<Option<String>, _>("language")
            .map_err(ser)?
            .as_deref()
            .map(parse_language)
            .transpose()
    }

    async fn set_language(
        &self,
        user: UserId,
        language: Language,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        // Users normally exist already; the insert covers a language picked
        // before the first registered message.
        sqlx::query(
            r"
            INSERT INTO users (chat_id, language, created_at, last_active_at)
            VALUES (?1, ?2, ?3, ?3)
            ON CONFLICT(chat_id) DO UPDATE SET
                language = excluded.language
            ",
        )
        .bind(user.value())
        .bind(language.code())
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn touch(&self, user: UserId, at: DateTime<Utc>) -> Result<(), StorageError> {
        sqlx::query("UPDATE users SET last_active_at = ?2 WHERE chat_id = ?1")
            .bind(user.value())
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        Ok(())
    }
}
