use serde::{Deserialize, Serialize};

use crate::model::Section;

/// Running answer counters for one run through a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Tally {
    pub correct: u32,
    pub incorrect: u32,
    pub skipped: u32,
}

impl Tally {
    #[must_use]
    pub fn new(correct: u32, incorrect: u32, skipped: u32) -> Self {
        Self {
            correct,
            incorrect,
            skipped,
        }
    }

    /// Number of questions the run has moved past.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.correct
            .saturating_add(self.incorrect)
            .saturating_add(self.skipped)
    }
}

/// A user's position and tally within one section.
///
/// `current_index == None` means no run is active in the section. Index and
/// counters are always replaced together so a persisted cursor is never half
/// updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProgressCursor {
    current_index: Option<u32>,
    tally: Tally,
}

impl ProgressCursor {
    /// Cursor with no active run and zeroed counters.
    #[must_use]
    pub fn idle() -> Self {
        Self::default()
    }

    /// Cursor for a freshly selected section.
    #[must_use]
    pub fn started() -> Self {
        Self {
            current_index: Some(0),
            tally: Tally::default(),
        }
    }

    /// Rehydrate a cursor from storage.
    #[must_use]
    pub fn from_persisted(current_index: Option<u32>, tally: Tally) -> Self {
        Self {
            current_index,
            tally,
        }
    }

    #[must_use]
    pub fn current_index(&self) -> Option<u32> {
        self.current_index
    }

    #[must_use]
    pub fn tally(&self) -> Tally {
        self.tally
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.current_index.is_some()
    }

    pub(crate) fn at(index: u32, tally: Tally) -> Self {
        Self {
            current_index: Some(index),
            tally,
        }
    }
}

/// The one section a user is currently working through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActiveSession {
    pub section: Section,
    pub index: u32,
}

impl ActiveSession {
    #[must_use]
    pub fn new(section: Section, index: u32) -> Self {
        Self { section, index }
    }

    /// Build from a section's cursor, if that cursor is active.
    #[must_use]
    pub fn from_cursor(section: Section, cursor: &ProgressCursor) -> Option<Self> {
        cursor
            .current_index()
            .map(|index| Self::new(section, index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_and_started_cursors() {
        let idle = ProgressCursor::idle();
        assert!(!idle.is_active());
        assert_eq!(idle.tally(), Tally::default());

        let started = ProgressCursor::started();
        assert_eq!(started.current_index(), Some(0));
        assert_eq!(started.tally().total(), 0);
    }

    #[test]
    fn active_session_only_from_active_cursor() {
        let cursor = ProgressCursor::from_persisted(Some(2), Tally::new(1, 1, 0));
        assert_eq!(
            ActiveSession::from_cursor(Section::Qaj, &cursor),
            Some(ActiveSession::new(Section::Qaj, 2))
        );
        assert_eq!(
            ActiveSession::from_cursor(Section::Qaj, &ProgressCursor::idle()),
            None
        );
    }

    #[test]
    fn tally_total_saturates() {
        let tally = Tally::new(u32::MAX, 1, 1);
        assert_eq!(tally.total(), u32::MAX);
    }
}
