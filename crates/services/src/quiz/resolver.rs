use std::sync::Arc;

use quiz_core::model::{ActiveSession, Section, UserId};
use storage::repository::ProgressRepository;

use crate::error::QuizError;

/// What `begin_or_prompt` decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Begin {
    /// Nothing in progress: start this section.
    Start(Section),
    /// Nothing in progress and nothing requested: run the idle entry flow.
    Idle,
    /// A section is in progress; the user must choose reset or continue.
    Prompt(ActiveSession),
}

/// Finds the one section a user is working through.
#[derive(Clone)]
pub struct SessionResolver {
    progress: Arc<dyn ProgressRepository>,
}

impl SessionResolver {
    #[must_use]
    pub fn new(progress: Arc<dyn ProgressRepository>) -> Self {
        Self { progress }
    }

    /// The user's active section and index, if exactly one exists.
    ///
    /// Several active sections break the one-session rule; they are logged and
    /// treated as none so the user lands on the idle flow instead of a guess.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` if progress cannot be read.
    pub async fn find_active(&self, user: UserId) -> Result<Option<ActiveSession>, QuizError> {
        let mut active = self.progress.active_cursors(user).await?;
        match active.len() {
            0 => Ok(None),
            1 => Ok(active.pop()),
            count => {
                tracing::warn!(
                    user = %user,
                    count,
                    sections = ?active.iter().map(|s| s.section).collect::<Vec<_>>(),
                    "more than one active section"
                );
                Ok(None)
            }
        }
    }

    /// Decide how a start request proceeds without overwriting progress.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` if progress cannot be read.
    pub async fn begin_or_prompt(
        &self,
        user: UserId,
        requested: Option<Section>,
    ) -> Result<Begin, QuizError> {
        if let Some(active) = self.find_active(user).await? {
            return Ok(Begin::Prompt(active));
        }
        Ok(requested.map_or(Begin::Idle, Begin::Start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{ProgressCursor, Tally};
    use quiz_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    async fn resolver_with(cursors: &[(Section, Option<u32>)]) -> SessionResolver {
        let repo = InMemoryRepository::new();
        for (section, index) in cursors {
            let cursor = ProgressCursor::from_persisted(*index, Tally::default());
            repo.write_cursor(UserId::new(1), *section, &cursor, fixed_now())
                .await
                .unwrap();
        }
        SessionResolver::new(Arc::new(repo))
    }

    #[tokio::test]
    async fn idle_user_starts_requested_section() {
        let resolver = resolver_with(&[(Section::Itj, None)]).await;
        let user = UserId::new(1);
        assert_eq!(resolver.find_active(user).await.unwrap(), None);
        assert_eq!(
            resolver.begin_or_prompt(user, Some(Section::Qaj)).await.unwrap(),
            Begin::Start(Section::Qaj)
        );
        assert_eq!(resolver.begin_or_prompt(user, None).await.unwrap(), Begin::Idle);
    }

    #[tokio::test]
    async fn active_user_is_prompted() {
        let resolver = resolver_with(&[(Section::Itm, Some(3))]).await;
        assert_eq!(
            resolver
                .begin_or_prompt(UserId::new(1), Some(Section::Qaj))
                .await
                .unwrap(),
            Begin::Prompt(ActiveSession::new(Section::Itm, 3))
        );
    }

    #[tokio::test]
    async fn two_active_sections_count_as_none() {
        let resolver = resolver_with(&[(Section::Itm, Some(3)), (Section::Qam, Some(0))]).await;
        assert_eq!(resolver.find_active(UserId::new(1)).await.unwrap(), None);
    }
}
