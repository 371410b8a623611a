use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiz_core::model::{ActiveSession, ProgressCursor, Section, UserId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, index_from_i64, map_cursor_row, parse_section, ser};
use crate::repository::{ProgressRepository, StorageError};

#[async_trait]
impl ProgressRepository for SqliteRepository {
    async fn read_cursor(
        &self,
        user: UserId,
        section: Section,
    ) -> Result<ProgressCursor, StorageError> {
        let row = sqlx::query(
            r"
            SELECT current_index, correct_answers, incorrect_answers, skipped_questions
            FROM user_progress
            WHERE chat_id = ?1 AND section = ?2
            ",
        )
        .bind(user.value())
        .bind(section.code())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        match row {
            Some(row) => map_cursor_row(&row),
            None => Ok(ProgressCursor::idle()),
        }
    }

    async fn write_cursor(
        &self,
        user: UserId,
        section: Section,
        cursor: &ProgressCursor,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let tally = cursor.tally();
        // Index and counters go out in one statement.
        sqlx::query(
            r"
            INSERT INTO user_progress (
                chat_id,
                section,
                current_index,
                correct_answers,
                incorrect_answers,
                skipped_questions,
                updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(chat_id, section) DO UPDATE SET
                current_index = excluded.current_index,
                correct_answers = excluded.correct_answers,
                incorrect_answers = excluded.incorrect_answers,
                skipped_questions = excluded.skipped_questions,
                updated_at = excluded.updated_at
            ",
        )
        .bind(user.value())
        .bind(section.code())
        .bind(cursor.current_index().map(i64::from))
        .bind(i64::from(tally.correct))
        .bind(i64::from(tally.incorrect))
        .bind(i64::from(tally.skipped))
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn active_cursors(&self, user: UserId) -> Result<Vec<ActiveSession>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT section, current_index
            FROM user_progress
            WHERE chat_id = ?1 AND current_index IS NOT NULL
            ORDER BY section
            ",
        )
        .bind(user.value())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut active = Vec::with_capacity(rows.len());
        for row in rows {
            let section = parse_section(&row.try_get::<String, _>("section").map_err(ser)?)?;
            if let Some(index) = index_from_i64(row.try_get("current_index").map_err(ser)?)? {
                active.push(ActiveSession::new(section, index));
            }
        }
        active.sort_by_key(|session| session.section);
        Ok(active)
    }

    async fn reset_all(&self, user: UserId, at: DateTime<Utc>) -> Result<(), StorageError> {
        sqlx::query(
            r"
            UPDATE user_progress
            SET current_index = NULL,
                correct_answers = 0,
                incorrect_answers = 0,
                skipped_questions = 0,
                updated_at = ?2
            WHERE chat_id = ?1
            ",
        )
        .bind(user.value())
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }
}
