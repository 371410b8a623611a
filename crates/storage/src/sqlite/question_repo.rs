use async_trait::async_trait;
use quiz_core::model::{Language, Question, Section};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{answer_id_from_i64, conn, id_to_i64, question_id_from_i64, ser};
use crate::repository::{
    AnswerRecord, LocalizedText, QuestionRecord, QuestionRepository, StorageError,
};

#[async_trait]
impl QuestionRepository for SqliteRepository {
    async fn fetch(
        &self,
        section: Section,
        language: Language,
    ) -> Result<Vec<Question>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT
                q.id AS question_id,
                q.text AS question_text,
                q.text_ru AS question_text_ru,
                a.id AS answer_id,
                a.text AS answer_text,
                a.text_ru AS answer_text_ru,
                a.is_correct,
                a.explanation,
                a.explanation_ru
            FROM questions q
            LEFT JOIN answers a
                ON a.section = q.section AND a.question_id = q.id
            WHERE q.section = ?1
            ORDER BY q.id, a.id
            ",
        )
        .bind(section.code())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut records: Vec<QuestionRecord> = Vec::new();
        for row in &rows {
            let id = question_id_from_i64(row.try_get("question_id").map_err(ser)?)?;
            if records.last().is_none_or(|last| last.id != id) {
                records.push(QuestionRecord {
                    id,
                    section,
                    text: LocalizedText::new(
                        row.try_get::<String, _>("question_text").map_err(ser)?,
                        row.try_get("question_text_ru").map_err(ser)?,
                    ),
                    answers: Vec::new(),
                });
            }

            let Some(answer_id) = row.try_get::<Option<i64>, _>("answer_id").map_err(ser)? else {
                continue;
            };
            let answer = AnswerRecord {
                id: answer_id_from_i64(answer_id)?,
                text: LocalizedText::new(
                    row.try_get::<String, _>("answer_text").map_err(ser)?,
                    row.try_get("answer_text_ru").map_err(ser)?,
                ),
                is_correct: row.try_get("is_correct").map_err(ser)?,
                explanation: LocalizedText::new(
                    row.try_get::<String, _>("explanation").map_err(ser)?,
                    row.try_get("explanation_ru").map_err(ser)?,
                ),
            };
            if let Some(record) = records.last_mut() {
                record.answers.push(answer);
            }
        }

        records
            .iter()
            .map(|record| record.localize(language).map_err(ser))
            .collect()
    }

    async fn upsert_question(&self, record: &QuestionRecord) -> Result<(), StorageError> {
        let question_id = id_to_i64("question_id", record.id.value())?;
        let mut tx = self.pool.begin().await.map_err(conn)?;

        sqlx::query(
            r"
            INSERT INTO questions (section, id, text, text_ru)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(section, id) DO UPDATE SET
                text = excluded.text,
                text_ru = excluded.text_ru
            ",
        )
        .bind(record.section.code())
        .bind(question_id)
        .bind(&record.text.en)
        .bind(record.text.ru.as_deref())
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        sqlx::query("DELETE FROM answers WHERE section = ?1 AND question_id = ?2")
            .bind(record.section.code())
            .bind(question_id)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        for answer in &record.answers {
            sqlx::query(
                r"
                INSERT INTO answers (
                    section,
                    question_id,
                    id,
                    text,
                    text_ru,
                    is_correct,
                    explanation,
                    explanation_ru
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ",
            )
            .bind(record.section.code())
            .bind(question_id)
            .bind(id_to_i64("answer_id", answer.id.value())?)
            .bind(&answer.text.en)
            .bind(answer.text.ru.as_deref())
            .bind(answer.is_correct)
            .bind(&answer.explanation.en)
            .bind(answer.explanation.ru.as_deref())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        Ok(())
    }
}
