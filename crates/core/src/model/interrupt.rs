use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::ActiveSession;

/// Side interaction that can run in the middle of a quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterruptKind {
    Language,
    Subscription,
    /// Resolved within one request; never stored as pending.
    Info,
}

impl InterruptKind {
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            InterruptKind::Language => "language",
            InterruptKind::Subscription => "subscription",
            InterruptKind::Info => "info",
        }
    }

    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "language" => Some(InterruptKind::Language),
            "subscription" => Some(InterruptKind::Subscription),
            "info" => Some(InterruptKind::Info),
            _ => None,
        }
    }
}

impl fmt::Display for InterruptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// An interrupt waiting for user input, with the quiz position to resume.
///
/// One per user at most. Created when the interrupt is entered and removed
/// when it resolves or is abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingInterrupt {
    pub kind: InterruptKind,
    pub snapshot: Option<ActiveSession>,
    pub created_at: DateTime<Utc>,
}

impl PendingInterrupt {
    #[must_use]
    pub fn new(
        kind: InterruptKind,
        snapshot: Option<ActiveSession>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            kind,
            snapshot,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_codes_round_trip() {
        for kind in [
            InterruptKind::Language,
            InterruptKind::Subscription,
            InterruptKind::Info,
        ] {
            assert_eq!(InterruptKind::from_code(kind.code()), Some(kind));
        }
        assert_eq!(InterruptKind::from_code("email"), None);
    }
}
