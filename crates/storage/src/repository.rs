use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiz_core::model::{
    ActiveSession, Answer, AnswerId, Language, PendingInterrupt, ProgressCursor, Question,
    QuestionError, QuestionId, Section, UserId,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── PERSISTED SHAPES ──────────────────────────────────────────────────────────
//

/// Text stored in every supported language.
///
/// English is mandatory; a missing translation falls back to it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LocalizedText {
    pub en: String,
    #[serde(default)]
    pub ru: Option<String>,
}

impl LocalizedText {
    #[must_use]
    pub fn new(en: impl Into<String>, ru: Option<String>) -> Self {
        Self { en: en.into(), ru }
    }

    #[must_use]
    pub fn get(&self, language: Language) -> &str {
        match language {
            Language::En => &self.en,
            Language::Ru => self.ru.as_deref().unwrap_or(&self.en),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRecord {
    pub id: AnswerId,
    pub text: LocalizedText,
    pub is_correct: bool,
    pub explanation: LocalizedText,
}

/// A question with all of its translations, as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRecord {
    pub id: QuestionId,
    pub section: Section,
    pub text: LocalizedText,
    pub answers: Vec<AnswerRecord>,
}

impl QuestionRecord {
    /// Project the record onto one language.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::AnswerCount` if the record does not carry four answers.
    pub fn localize(&self, language: Language) -> Result<Question, QuestionError> {
        let answers = self
            .answers
            .iter()
            .map(|a| {
                Answer::new(
                    a.id,
                    a.text.get(language),
                    a.is_correct,
                    a.explanation.get(language),
                )
            })
            .collect();
        Question::new(self.id, self.text.get(language), answers)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionRecord {
    pub user: UserId,
    pub email: String,
    pub subscribed: bool,
    pub updated_at: DateTime<Utc>,
}

//
// ─── CONTRACTS ─────────────────────────────────────────────────────────────────
//

/// Source of quiz content.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// All questions of a section in one language, ordered by question id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read or a row is malformed.
    async fn fetch(&self, section: Section, language: Language)
    -> Result<Vec<Question>, StorageError>;

    /// Insert or replace a question and its answers.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the question cannot be stored.
    async fn upsert_question(&self, record: &QuestionRecord) -> Result<(), StorageError>;
}

/// Durable `(user, section) -> cursor` mapping.
///
/// Every write replaces index and counters together.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Cursor for one section; idle if the user never touched it.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn read_cursor(
        &self,
        user: UserId,
        section: Section,
    ) -> Result<ProgressCursor, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the cursor cannot be stored; the previous value is kept.
    async fn write_cursor(
        &self,
        user: UserId,
        section: Section,
        cursor: &ProgressCursor,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// Every section of the user with a non-null index.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn active_cursors(&self, user: UserId) -> Result<Vec<ActiveSession>, StorageError>;

    /// Set every section of the user to idle with zeroed counters.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the reset cannot be stored.
    async fn reset_all(&self, user: UserId, at: DateTime<Utc>) -> Result<(), StorageError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Register the user on first contact. No-op for known users.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on write failures.
    async fn ensure_user(&self, user: UserId, at: DateTime<Utc>) -> Result<(), StorageError>;

    /// Stored language preference, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn language(&self, user: UserId) -> Result<Option<Language>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on write failures.
    async fn set_language(
        &self,
        user: UserId,
        language: Language,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// Record activity for the user.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on write failures.
    async fn touch(&self, user: UserId, at: DateTime<Utc>) -> Result<(), StorageError>;
}

#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Store (or replace) the user's email and mark them subscribed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on write failures.
    async fn subscribe(
        &self,
        user: UserId,
        email: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn subscription(&self, user: UserId) -> Result<Option<SubscriptionRecord>, StorageError>;
}

/// Keyed table of interrupts waiting for input.
#[async_trait]
pub trait InterruptRepository: Send + Sync {
    /// Store the user's pending interrupt, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on write failures.
    async fn put_pending(
        &self,
        user: UserId,
        pending: &PendingInterrupt,
    ) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn pending(&self, user: UserId) -> Result<Option<PendingInterrupt>, StorageError>;

    /// Remove the pending interrupt.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on write failures.
    async fn clear_pending(&self, user: UserId) -> Result<(), StorageError>;
}

//
// ─── IN-MEMORY ADAPTER ─────────────────────────────────────────────────────────
//

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    questions: Arc<Mutex<HashMap<(Section, QuestionId), QuestionRecord>>>,
    cursors: Arc<Mutex<HashMap<(UserId, Section), ProgressCursor>>>,
    languages: Arc<Mutex<HashMap<UserId, Option<Language>>>>,
    subscriptions: Arc<Mutex<HashMap<UserId, SubscriptionRecord>>>,
    pending: Arc<Mutex<HashMap<UserId, PendingInterrupt>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn fetch(
        &self,
        section: Section,
        language: Language,
    ) -> Result<Vec<Question>, StorageError> {
        let guard = self.questions.lock().map_err(poisoned)?;
        let mut records: Vec<&QuestionRecord> = guard
            .values()
            .filter(|record| record.section == section)
            .collect();
        records.sort_by_key(|record| record.id);
        records
            .into_iter()
            .map(|record| {
                record
                    .localize(language)
                    .map_err(|e| StorageError::Serialization(e.to_string()))
            })
            .collect()
    }

    async fn upsert_question(&self, record: &QuestionRecord) -> Result<(), StorageError> {
        let mut guard = self.questions.lock().map_err(poisoned)?;
        guard.insert((record.section, record.id), record.clone());
        Ok(())
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn read_cursor(
        &self,
        user: UserId,
        section: Section,
    ) -> Result<ProgressCursor, StorageError> {
        let guard = self.cursors.lock().map_err(poisoned)?;
        Ok(guard.get(&(user, section)).copied().unwrap_or_default())
    }

    async fn write_cursor(
        &self,
        user: UserId,
        section: Section,
        cursor: &ProgressCursor,
        _at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut guard = self.cursors.lock().map_err(poisoned)?;
        guard.insert((user, section), *cursor);
        Ok(())
    }

    async fn active_cursors(&self, user: UserId) -> Result<Vec<ActiveSession>, StorageError> {
        let guard = self.cursors.lock().map_err(poisoned)?;
        let mut active: Vec<ActiveSession> = guard
            .iter()
            .filter(|((owner, _), _)| *owner == user)
            .filter_map(|((_, section), cursor)| ActiveSession::from_cursor(*section, cursor))
            .collect();
        active.sort_by_key(|session| session.section);
        Ok(active)
    }

    async fn reset_all(&self, user: UserId, _at: DateTime<Utc>) -> Result<(), StorageError> {
        let mut guard = self.cursors.lock().map_err(poisoned)?;
        for ((owner, _), cursor) in guard.iter_mut() {
            if *owner == user {
                *cursor = ProgressCursor::idle();
            }
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn ensure_user(&self, user: UserId, _at: DateTime<Utc>) -> Result<(), StorageError> {
        let mut guard = self.languages.lock().map_err(poisoned)?;
        guard.entry(user).or_insert(None);
        Ok(())
    }

    async fn language(&self, user: UserId) -> Result<Option<Language>, StorageError> {
        let guard = self.languages.lock().map_err(poisoned)?;
        Ok(guard.get(&user).copied().flatten())
    }

    async fn set_language(
        &self,
        user: UserId,
        language: Language,
        _at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut guard = self.languages.lock().map_err(poisoned)?;
        guard.insert(user, Some(language));
        Ok(())
    }

    async fn touch(&self, _user: UserId, _at: DateTime<Utc>) -> Result<(), StorageError> {
        Ok(())
    }
}

#[async_trait]
impl SubscriptionRepository for InMemoryRepository {
    async fn subscribe(
        &self,
        user: UserId,
        email: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut guard = self.subscriptions.lock().map_err(poisoned)?;
        guard.insert(
            user,
            SubscriptionRecord {
                user,
                email: email.to_string(),
                subscribed: true,
                updated_at: at,
            },
        );
        Ok(())
    }

    async fn subscription(&self, user: UserId) -> Result<Option<SubscriptionRecord>, StorageError> {
        let guard = self.subscriptions.lock().map_err(poisoned)?;
        Ok(guard.get(&user).cloned())
    }
}

#[async_trait]
impl InterruptRepository for InMemoryRepository {
    async fn put_pending(
        &self,
        user: UserId,
        pending: &PendingInterrupt,
    ) -> Result<(), StorageError> {
        let mut guard = self.pending.lock().map_err(poisoned)?;
        guard.insert(user, *pending);
        Ok(())
    }

    async fn pending(&self, user: UserId) -> Result<Option<PendingInterrupt>, StorageError> {
        let guard = self.pending.lock().map_err(poisoned)?;
        Ok(guard.get(&user).copied())
    }

    async fn clear_pending(&self, user: UserId) -> Result<(), StorageError> {
        let mut guard = self.pending.lock().map_err(poisoned)?;
        guard.remove(&user);
        Ok(())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub questions: Arc<dyn QuestionRepository>,
    pub progress: Arc<dyn ProgressRepository>,
    pub users: Arc<dyn UserRepository>,
    pub subscriptions: Arc<dyn SubscriptionRepository>,
    pub interrupts: Arc<dyn InterruptRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_repository(InMemoryRepository::new())
    }

    /// Use one repository value for every contract.
    #[must_use]
    pub fn from_repository<R>(repo: R) -> Self
    where
        R: QuestionRepository
            + ProgressRepository
            + UserRepository
            + SubscriptionRepository
            + InterruptRepository
            + Clone
            + 'static,
    {
        Self {
            questions: Arc::new(repo.clone()),
            progress: Arc::new(repo.clone()),
            users: Arc::new(repo.clone()),
            subscriptions: Arc::new(repo.clone()),
            interrupts: Arc::new(repo),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{InterruptKind, Tally};
    use quiz_core::time::fixed_now;

    fn record(section: Section, id: u64) -> QuestionRecord {
        QuestionRecord {
            id: QuestionId::new(id),
            section,
            text: LocalizedText::new(format!("Q{id}"), Some(format!("В{id}"))),
            answers: (1..=4)
                .map(|slot| AnswerRecord {
                    id: AnswerId::new(slot),
                    text: LocalizedText::new(format!("A{slot}"), None),
                    is_correct: slot == 1,
                    explanation: LocalizedText::new("why", Some("почему".into())),
                })
                .collect(),
        }
    }

    #[test]
    fn localized_text_falls_back_to_english() {
        let text = LocalizedText::new("Hello", None);
        assert_eq!(text.get(Language::Ru), "Hello");
        let text = LocalizedText::new("Hello", Some("Привет".into()));
        assert_eq!(text.get(Language::Ru), "Привет");
    }

    #[tokio::test]
    async fn fetch_orders_by_id_and_filters_section() {
        let repo = InMemoryRepository::new();
        for id in [3, 1, 2] {
            repo.upsert_question(&record(Section::Qaj, id)).await.unwrap();
        }
        repo.upsert_question(&record(Section::Itj, 9)).await.unwrap();

        let questions = repo.fetch(Section::Qaj, Language::Ru).await.unwrap();
        let texts: Vec<&str> = questions.iter().map(Question::text).collect();
        assert_eq!(texts, vec!["В1", "В2", "В3"]);
        assert_eq!(questions[0].answers()[0].explanation, "почему");
    }

    #[tokio::test]
    async fn reset_all_only_touches_one_user() {
        let repo = InMemoryRepository::new();
        let alice = UserId::new(1);
        let bob = UserId::new(2);
        let cursor = ProgressCursor::from_persisted(Some(2), Tally::new(1, 1, 0));
        repo.write_cursor(alice, Section::Qaj, &cursor, fixed_now())
            .await
            .unwrap();
        repo.write_cursor(bob, Section::Itm, &cursor, fixed_now())
            .await
            .unwrap();

        repo.reset_all(alice, fixed_now()).await.unwrap();

        assert_eq!(
            repo.read_cursor(alice, Section::Qaj).await.unwrap(),
            ProgressCursor::idle()
        );
        assert_eq!(
            repo.active_cursors(bob).await.unwrap(),
            vec![ActiveSession::new(Section::Itm, 2)]
        );
    }

    #[tokio::test]
    async fn pending_interrupt_lifecycle() {
        let repo = InMemoryRepository::new();
        let user = UserId::new(7);
        let pending = PendingInterrupt::new(
            InterruptKind::Subscription,
            Some(ActiveSession::new(Section::Qam, 4)),
            fixed_now(),
        );
        repo.put_pending(user, &pending).await.unwrap();
        assert_eq!(repo.pending(user).await.unwrap(), Some(pending));
        repo.clear_pending(user).await.unwrap();
        assert_eq!(repo.pending(user).await.unwrap(), None);
    }
}
