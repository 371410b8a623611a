use quiz_core::model::{
    ActiveSession, AnswerId, InterruptKind, Language, ProgressCursor, QuestionId, Section, Tally,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

fn i64_to_u32(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} out of range")))
}

pub(crate) fn question_id_from_i64(v: i64) -> Result<QuestionId, StorageError> {
    Ok(QuestionId::new(i64_to_u64("question_id", v)?))
}

pub(crate) fn answer_id_from_i64(v: i64) -> Result<AnswerId, StorageError> {
    Ok(AnswerId::new(i64_to_u64("answer_id", v)?))
}

pub(crate) fn id_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn parse_section(s: &str) -> Result<Section, StorageError> {
    Section::from_code(s).ok_or_else(|| StorageError::Serialization(format!("invalid section: {s}")))
}

pub(crate) fn parse_language(s: &str) -> Result<Language, StorageError> {
    Language::from_code(s)
        .ok_or_else(|| StorageError::Serialization(format!("invalid language: {s}")))
}

pub(crate) fn parse_interrupt_kind(s: &str) -> Result<InterruptKind, StorageError> {
    InterruptKind::from_code(s)
        .ok_or_else(|| StorageError::Serialization(format!("invalid interrupt kind: {s}")))
}

/// Index column to cursor index. `NULL` stays `None`.
pub(crate) fn index_from_i64(v: Option<i64>) -> Result<Option<u32>, StorageError> {
    v.map(|raw| i64_to_u32("current_index", raw)).transpose()
}

pub(crate) fn map_cursor_row(row: &SqliteRow) -> Result<ProgressCursor, StorageError> {
    let index = index_from_i64(row.try_get("current_index").map_err(ser)?)?;
    let tally = Tally::new(
        i64_to_u32("correct_answers", row.try_get("correct_answers").map_err(ser)?)?,
        i64_to_u32("incorrect_answers", row.try_get("incorrect_answers").map_err(ser)?)?,
        i64_to_u32("skipped_questions", row.try_get("skipped_questions").map_err(ser)?)?,
    );
    Ok(ProgressCursor::from_persisted(index, tally))
}

/// `(section, current_index)` columns to a snapshot; both must be set.
pub(crate) fn map_snapshot(
    section: Option<String>,
    index: Option<i64>,
) -> Result<Option<ActiveSession>, StorageError> {
    match (section, index_from_i64(index)?) {
        (Some(section), Some(index)) => Ok(Some(ActiveSession::new(
            parse_section(&section)?,
            index,
        ))),
        (None, None) => Ok(None),
        _ => Err(StorageError::Serialization(
            "snapshot section and index must be set together".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_ids_are_rejected() {
        assert!(question_id_from_i64(-1).is_err());
        assert_eq!(answer_id_from_i64(3).unwrap(), AnswerId::new(3));
    }

    #[test]
    fn half_set_snapshot_is_an_error() {
        assert!(map_snapshot(Some("QAJ".into()), None).is_err());
        assert_eq!(map_snapshot(None, None).unwrap(), None);
        assert_eq!(
            map_snapshot(Some("QAJ".into()), Some(2)).unwrap(),
            Some(ActiveSession::new(Section::Qaj, 2))
        );
    }
}
