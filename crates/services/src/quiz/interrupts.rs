//! Side trips (language, subscription, info) that must not disturb a quiz.
//!
//! Entering an interrupt snapshots the active section and index into the
//! pending-interrupt store. Resolving it removes the row and hands the
//! snapshot back so the caller can show the same question again.

use std::sync::Arc;

use quiz_core::Clock;
use quiz_core::model::{ActiveSession, InterruptKind, PendingInterrupt, UserId};
use storage::repository::InterruptRepository;

use super::resolver::SessionResolver;
use crate::error::QuizError;

#[derive(Clone)]
pub struct InterruptCoordinator {
    clock: Clock,
    interrupts: Arc<dyn InterruptRepository>,
    resolver: SessionResolver,
}

impl InterruptCoordinator {
    #[must_use]
    pub fn new(
        clock: Clock,
        interrupts: Arc<dyn InterruptRepository>,
        resolver: SessionResolver,
    ) -> Self {
        Self {
            clock,
            interrupts,
            resolver,
        }
    }

    /// Snapshot the active session and, for interrupts that wait for input,
    /// store it as pending. Returns the snapshot.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` if the snapshot cannot be read or stored.
    pub async fn enter(
        &self,
        user: UserId,
        kind: InterruptKind,
    ) -> Result<Option<ActiveSession>, QuizError> {
        let snapshot = self.resolver.find_active(user).await?;
        if kind != InterruptKind::Info {
            let pending = PendingInterrupt::new(kind, snapshot, self.clock.now());
            self.interrupts.put_pending(user, &pending).await?;
        }
        tracing::debug!(user = %user, %kind, ?snapshot, "entered interrupt");
        Ok(snapshot)
    }

    /// # Errors
    ///
    /// Returns `QuizError::Storage` on read failures.
    pub async fn pending(&self, user: UserId) -> Result<Option<PendingInterrupt>, QuizError> {
        Ok(self.interrupts.pending(user).await?)
    }

    /// Finish the pending interrupt and return the position to resume.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` if the pending row cannot be removed.
    pub async fn resolve(
        &self,
        user: UserId,
        pending: &PendingInterrupt,
    ) -> Result<Option<ActiveSession>, QuizError> {
        self.interrupts.clear_pending(user).await?;
        tracing::debug!(user = %user, kind = %pending.kind, snapshot = ?pending.snapshot, "resolved interrupt");
        Ok(pending.snapshot)
    }

    /// Drop a pending interrupt because the user moved on to a command.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` if the pending row cannot be removed.
    pub async fn abandon(&self, user: UserId, pending: &PendingInterrupt) -> Result<(), QuizError> {
        self.interrupts.clear_pending(user).await?;
        tracing::info!(user = %user, kind = %pending.kind, "abandoned pending interrupt");
        Ok(())
    }
}

/// Loose address check: one `@` with something before it, a `.` after it,
/// and no whitespace.
#[must_use]
pub fn is_valid_email(text: &str) -> bool {
    let text = text.trim();
    if text.is_empty() || text.chars().any(char::is_whitespace) {
        return false;
    }
    match text.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.contains('@'),
        None => false,
    }
}

/// The word that cancels the subscription prompt.
#[must_use]
pub fn is_cancel_word(text: &str) -> bool {
    text.trim().eq_ignore_ascii_case("skip")
}
