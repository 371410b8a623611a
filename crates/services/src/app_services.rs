use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::quiz::QuizService;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    storage: Storage,
    quiz: Arc<QuizService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(storage, clock))
    }

    /// Build services over volatile storage.
    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::from_storage(Storage::in_memory(), clock)
    }

    #[must_use]
    pub fn from_storage(storage: Storage, clock: Clock) -> Self {
        let quiz = Arc::new(QuizService::new(clock, &storage));
        Self { storage, quiz }
    }

    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    #[must_use]
    pub fn quiz(&self) -> Arc<QuizService> {
        Arc::clone(&self.quiz)
    }
}
