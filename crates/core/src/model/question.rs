use thiserror::Error;

use crate::model::{AnswerId, Language, QuestionId, Section};

/// Number of answer options every question carries.
pub const ANSWERS_PER_QUESTION: usize = 4;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question {id} has {found} answers, expected {ANSWERS_PER_QUESTION}")]
    AnswerCount { id: QuestionId, found: usize },

    #[error("no questions for section {section} in language {language}")]
    QuestionSetEmpty { section: Section, language: Language },
}

//
// ─── ANSWER ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub id: AnswerId,
    pub text: String,
    pub is_correct: bool,
    pub explanation: String,
}

impl Answer {
    #[must_use]
    pub fn new(
        id: AnswerId,
        text: impl Into<String>,
        is_correct: bool,
        explanation: impl Into<String>,
    ) -> Self {
        Self {
            id,
            text: text.into(),
            is_correct,
            explanation: explanation.into(),
        }
    }
}

//
// ─── QUESTION ─────────────────────────────────────────────────────────────────
//

/// A read-only multiple choice question in one language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    text: String,
    answers: Vec<Answer>,
}

impl Question {
    /// Build a question, ordering its answers by id.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::AnswerCount` unless exactly four answers are given.
    pub fn new(
        id: QuestionId,
        text: impl Into<String>,
        mut answers: Vec<Answer>,
    ) -> Result<Self, QuestionError> {
        if answers.len() != ANSWERS_PER_QUESTION {
            return Err(QuestionError::AnswerCount {
                id,
                found: answers.len(),
            });
        }
        answers.sort_by_key(|answer| answer.id);
        Ok(Self {
            id,
            text: text.into(),
            answers,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    /// Resolve a user's reply by exact text.
    ///
    /// Content is expected to keep answer texts distinct; if it does not, the
    /// first answer in id order wins.
    #[must_use]
    pub fn find_answer(&self, text: &str) -> Option<&Answer> {
        self.answers.iter().find(|answer| answer.text == text)
    }
}

//
// ─── ORDERED SEQUENCE ─────────────────────────────────────────────────────────
//

/// The questions of one section in one language, ordered by question id.
///
/// Cursor indices point into this ordering, so it must be identical across
/// fetches; sorting here keeps that true regardless of the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionSequence {
    section: Section,
    language: Language,
    questions: Vec<Question>,
}

impl QuestionSequence {
    /// # Errors
    ///
    /// Returns `QuestionError::QuestionSetEmpty` when `questions` is empty.
    pub fn new(
        section: Section,
        language: Language,
        mut questions: Vec<Question>,
    ) -> Result<Self, QuestionError> {
        if questions.is_empty() {
            return Err(QuestionError::QuestionSetEmpty { section, language });
        }
        questions.sort_by_key(Question::id);
        Ok(Self {
            section,
            language,
            questions,
        })
    }

    #[must_use]
    pub fn section(&self) -> Section {
        self.section
    }

    #[must_use]
    pub fn language(&self) -> Language {
        self.language
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Always false; empty sequences cannot be constructed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: u32) -> Option<&Question> {
        usize::try_from(index)
            .ok()
            .and_then(|index| self.questions.get(index))
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answers(base: u64) -> Vec<Answer> {
        (0..4)
            .map(|i| {
                Answer::new(
                    AnswerId::new(base + i),
                    format!("option {i}"),
                    i == 0,
                    format!("why {i}"),
                )
            })
            .collect()
    }

    #[test]
    fn rejects_wrong_answer_count() {
        let mut three = answers(1);
        three.pop();
        let err = Question::new(QuestionId::new(1), "Q", three).unwrap_err();
        assert_eq!(
            err,
            QuestionError::AnswerCount {
                id: QuestionId::new(1),
                found: 3
            }
        );
    }

    #[test]
    fn orders_answers_by_id() {
        let mut shuffled = answers(10);
        shuffled.reverse();
        let question = Question::new(QuestionId::new(1), "Q", shuffled).unwrap();
        let ids: Vec<u64> = question.answers().iter().map(|a| a.id.value()).collect();
        assert_eq!(ids, vec![10, 11, 12, 13]);
    }

    #[test]
    fn duplicate_answer_text_resolves_to_first_by_id() {
        let mut list = answers(1);
        list[2].text = "option 0".into();
        let question = Question::new(QuestionId::new(1), "Q", list).unwrap();
        let found = question.find_answer("option 0").unwrap();
        assert_eq!(found.id, AnswerId::new(1));
        assert!(question.find_answer("Option 0").is_none());
    }

    #[test]
    fn sequence_sorts_by_question_id_and_rejects_empty() {
        let questions = vec![
            Question::new(QuestionId::new(3), "third", answers(30)).unwrap(),
            Question::new(QuestionId::new(1), "first", answers(10)).unwrap(),
        ];
        let seq = QuestionSequence::new(Section::Qaj, Language::En, questions).unwrap();
        assert_eq!(seq.get(0).unwrap().text(), "first");
        assert_eq!(seq.get(1).unwrap().text(), "third");
        assert!(seq.get(2).is_none());

        let err = QuestionSequence::new(Section::Itj, Language::Ru, Vec::new()).unwrap_err();
        assert!(matches!(err, QuestionError::QuestionSetEmpty { .. }));
    }
}
