//! Question bank files.
//!
//! Quiz content is authored as TOML and upserted through the
//! [`QuestionRepository`](crate::repository::QuestionRepository):
//!
//! ```toml
//! [[questions]]
//! section = "QAJ"
//! id = 1
//! text = { en = "What is a test case?", ru = "Что такое тест-кейс?" }
//!
//! [[questions.answers]]
//! text = { en = "A set of steps with an expected result" }
//! correct = true
//! explanation = { en = "Right: inputs, steps and the expected outcome." }
//! ```
//!
//! Answer ids default to their position (1-based) within the question.

use std::collections::HashSet;
use std::path::Path;

use quiz_core::model::{ANSWERS_PER_QUESTION, AnswerId, QuestionId, Section};
use serde::Deserialize;
use thiserror::Error;

use crate::repository::{AnswerRecord, LocalizedText, QuestionRecord, Storage, StorageError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BankError {
    #[error("cannot read question bank {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid question bank: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("question {section}/{id}: {reason}")]
    Invalid {
        section: Section,
        id: u64,
        reason: String,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuestionBank {
    #[serde(default)]
    pub questions: Vec<BankQuestion>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BankQuestion {
    pub section: Section,
    pub id: u64,
    pub text: LocalizedText,
    pub answers: Vec<BankAnswer>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BankAnswer {
    #[serde(default)]
    pub id: Option<u64>,
    pub text: LocalizedText,
    #[serde(default)]
    pub correct: bool,
    pub explanation: LocalizedText,
}

impl QuestionBank {
    /// Parse a bank from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `BankError::Parse` for malformed TOML or unknown fields.
    pub fn from_toml_str(source: &str) -> Result<Self, BankError> {
        Ok(toml::from_str(source)?)
    }

    /// # Errors
    ///
    /// Returns `BankError::Io` if the file cannot be read and
    /// `BankError::Parse` if it is not a valid bank.
    pub fn from_path(path: &Path) -> Result<Self, BankError> {
        let source = std::fs::read_to_string(path).map_err(|source| BankError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Validate the bank and convert it into storable records.
    ///
    /// # Errors
    ///
    /// Returns `BankError::Invalid` for duplicate question or answer ids, or a
    /// question without exactly four answers.
    pub fn into_records(self) -> Result<Vec<QuestionRecord>, BankError> {
        let mut seen = HashSet::new();
        let mut records = Vec::with_capacity(self.questions.len());

        for question in self.questions {
            let invalid = |reason: String| BankError::Invalid {
                section: question.section,
                id: question.id,
                reason,
            };
            if !seen.insert((question.section, question.id)) {
                return Err(invalid("duplicate question id".into()));
            }
            if question.answers.len() != ANSWERS_PER_QUESTION {
                return Err(invalid(format!(
                    "{} answers, expected {ANSWERS_PER_QUESTION}",
                    question.answers.len()
                )));
            }
            if !question.answers.iter().any(|a| a.correct) {
                tracing::warn!(
                    section = %question.section,
                    id = question.id,
                    "question has no correct answer"
                );
            }

            let mut answer_ids = HashSet::new();
            let mut answers = Vec::with_capacity(ANSWERS_PER_QUESTION);
            for (slot, answer) in (1_u64..).zip(&question.answers) {
                let id = answer.id.unwrap_or(slot);
                if !answer_ids.insert(id) {
                    return Err(invalid(format!("duplicate answer id {id}")));
                }
                answers.push(AnswerRecord {
                    id: AnswerId::new(id),
                    text: answer.text.clone(),
                    is_correct: answer.correct,
                    explanation: answer.explanation.clone(),
                });
            }

            records.push(QuestionRecord {
                id: QuestionId::new(question.id),
                section: question.section,
                text: question.text,
                answers,
            });
        }

        Ok(records)
    }
}

/// Upsert every question of the bank. Returns the number of questions written.
///
/// # Errors
///
/// Returns `BankError` if the bank is invalid or a write fails. Questions
/// written before the failure stay stored.
pub async fn seed(storage: &Storage, bank: QuestionBank) -> Result<usize, BankError> {
    let records = bank.into_records()?;
    for record in &records {
        storage.questions.upsert_question(record).await?;
    }
    tracing::info!(questions = records.len(), "seeded question bank");
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::Language;

    fn answers_toml(count: usize) -> String {
        (0..count)
            .map(|i| {
                format!(
                    "[[questions.answers]]\ntext = {{ en = \"A{i}\" }}\ncorrect = {}\nexplanation = {{ en = \"E{i}\", ru = \"О{i}\" }}\n",
                    i == 0
                )
            })
            .collect()
    }

    fn bank_toml(id: u64, answers: usize) -> String {
        format!(
            "[[questions]]\nsection = \"QAJ\"\nid = {id}\ntext = {{ en = \"Q{id}\", ru = \"В{id}\" }}\n{}",
            answers_toml(answers)
        )
    }

    #[test]
    fn parses_and_assigns_slot_ids() {
        let bank = QuestionBank::from_toml_str(&bank_toml(5, 4)).unwrap();
        let records = bank.into_records().unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.section, Section::Qaj);
        let ids: Vec<u64> = record.answers.iter().map(|a| a.id.value()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert_eq!(record.answers[0].text.get(Language::Ru), "A0");
        assert_eq!(record.answers[0].explanation.get(Language::Ru), "О0");
    }

    #[test]
    fn rejects_wrong_answer_count() {
        let bank = QuestionBank::from_toml_str(&bank_toml(1, 3)).unwrap();
        assert!(matches!(
            bank.into_records(),
            Err(BankError::Invalid { id: 1, .. })
        ));
    }

    #[test]
    fn rejects_duplicate_question_ids() {
        let source = format!("{}{}", bank_toml(2, 4), bank_toml(2, 4));
        let bank = QuestionBank::from_toml_str(&source).unwrap();
        assert!(matches!(bank.into_records(), Err(BankError::Invalid { .. })));
    }

    #[test]
    fn unknown_section_is_a_parse_error() {
        let source = bank_toml(1, 4).replace("QAJ", "DEV");
        assert!(matches!(
            QuestionBank::from_toml_str(&source),
            Err(BankError::Parse(_))
        ));
    }

    #[test]
    fn shipped_bank_is_valid() {
        let bank = QuestionBank::from_toml_str(include_str!("../../../data/questions.toml")).unwrap();
        let records = bank.into_records().unwrap();
        for section in Section::ALL {
            assert!(records.iter().any(|r| r.section == section), "{section} is empty");
        }
        let qaj = records.iter().filter(|r| r.section == Section::Qaj).count();
        assert_eq!(qaj, 3);
    }

    #[tokio::test]
    async fn seed_makes_questions_fetchable() {
        let storage = Storage::in_memory();
        let source = format!("{}{}", bank_toml(2, 4), bank_toml(1, 4));
        let bank = QuestionBank::from_toml_str(&source).unwrap();
        assert_eq!(seed(&storage, bank).await.unwrap(), 2);

        let questions = storage
            .questions
            .fetch(Section::Qaj, Language::Ru)
            .await
            .unwrap();
        let texts: Vec<&str> = questions.iter().map(|q| q.text()).collect();
        assert_eq!(texts, vec!["В1", "В2"]);
    }
}
