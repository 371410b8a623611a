use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Runs the versioned schema migrations.
///
/// Version 1 creates users, per-section progress, questions with answers,
/// subscriptions and pending interrupts.
#[allow(clippy::too_many_lines)]
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS users (
                    chat_id INTEGER PRIMARY KEY,
                    language TEXT CHECK (language IN ('en', 'ru')),
                    created_at TEXT NOT NULL,
                    last_active_at TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS user_progress (
                    chat_id INTEGER NOT NULL,
                    section TEXT NOT NULL,
                    current_index INTEGER CHECK (current_index >= 0),
                    correct_answers INTEGER NOT NULL DEFAULT 0 CHECK (correct_answers >= 0),
                    incorrect_answers INTEGER NOT NULL DEFAULT 0 CHECK (incorrect_answers >= 0),
                    skipped_questions INTEGER NOT NULL DEFAULT 0 CHECK (skipped_questions >= 0),
                    updated_at TEXT NOT NULL,
                    PRIMARY KEY (chat_id, section)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS questions (
                    section TEXT NOT NULL,
                    id INTEGER NOT NULL,
                    text TEXT NOT NULL,
                    text_ru TEXT,
                    PRIMARY KEY (section, id)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS answers (
                    section TEXT NOT NULL,
                    question_id INTEGER NOT NULL,
                    id INTEGER NOT NULL,
                    text TEXT NOT NULL,
                    text_ru TEXT,
                    is_correct INTEGER NOT NULL CHECK (is_correct IN (0, 1)),
                    explanation TEXT NOT NULL,
                    explanation_ru TEXT,
                    PRIMARY KEY (section, question_id, id),
                    FOREIGN KEY (section, question_id)
                        REFERENCES questions(section, id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS subscriptions (
                    chat_id INTEGER PRIMARY KEY,
                    email TEXT NOT NULL,
                    subscribed INTEGER NOT NULL CHECK (subscribed IN (0, 1)),
                    updated_at TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS pending_interrupts (
                    chat_id INTEGER PRIMARY KEY,
                    kind TEXT NOT NULL,
                    section TEXT,
                    current_index INTEGER CHECK (current_index >= 0),
                    created_at TEXT NOT NULL,
                    CHECK ((section IS NULL) = (current_index IS NULL))
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_user_progress_active
                    ON user_progress (chat_id) WHERE current_index IS NOT NULL;
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(version = 1, "applied schema migration");
    }

    Ok(())
}
