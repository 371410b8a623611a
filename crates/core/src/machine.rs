//! The quiz progress state machine.
//!
//! Pure functions over a [`ProgressCursor`] and the section's
//! [`QuestionSequence`]. Callers load the cursor, call [`step`], and write the
//! returned cursor back in one go.

use thiserror::Error;

use crate::model::{Answer, ProgressCursor, Question, QuestionSequence, Tally};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MachineError {
    #[error("cursor has no active run")]
    NotActive,

    #[error("cursor index {index} is outside a sequence of {len} questions")]
    IndexOutOfRange { index: u32, len: usize },
}

//
// ─── INPUTS AND RESULTS ────────────────────────────────────────────────────────
//

/// A cursor-advancing input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step<'a> {
    /// The text of the option the user picked.
    Answer(&'a str),
    Skip,
}

/// Explanation shown after an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub correct: bool,
    pub explanation: String,
}

impl Feedback {
    fn from_answer(answer: &Answer) -> Self {
        Self {
            correct: answer.is_correct,
            explanation: answer.explanation.clone(),
        }
    }
}

/// What a [`step`] did to the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The input matched no option. Nothing changes.
    Unchanged,

    /// Moved to the next question.
    Advanced {
        cursor: ProgressCursor,
        feedback: Option<Feedback>,
    },

    /// The index wrapped to zero: the run is over. `cursor` is already idle
    /// with zeroed counters; `tally` holds the final counts.
    Completed {
        cursor: ProgressCursor,
        feedback: Option<Feedback>,
        tally: Tally,
    },
}

impl Transition {
    /// The cursor to persist, if the transition changed anything.
    #[must_use]
    pub fn cursor(&self) -> Option<&ProgressCursor> {
        match self {
            Transition::Unchanged => None,
            Transition::Advanced { cursor, .. } | Transition::Completed { cursor, .. } => {
                Some(cursor)
            }
        }
    }

    #[must_use]
    pub fn feedback(&self) -> Option<&Feedback> {
        match self {
            Transition::Unchanged => None,
            Transition::Advanced { feedback, .. } | Transition::Completed { feedback, .. } => {
                feedback.as_ref()
            }
        }
    }
}

//
// ─── MACHINE ───────────────────────────────────────────────────────────────────
//

/// Question the cursor currently points at.
///
/// # Errors
///
/// Returns `MachineError::NotActive` for an idle cursor and
/// `MachineError::IndexOutOfRange` when the index is past the sequence.
pub fn current_question<'s>(
    cursor: &ProgressCursor,
    sequence: &'s QuestionSequence,
) -> Result<&'s Question, MachineError> {
    let index = cursor.current_index().ok_or(MachineError::NotActive)?;
    sequence
        .get(index)
        .ok_or(MachineError::IndexOutOfRange {
            index,
            len: sequence.len(),
        })
}

/// Apply an answer or skip to an active cursor.
///
/// The next index is `(index + 1) mod len`. Landing on zero means the run
/// finished: the transition is `Completed` and the returned cursor is idle.
/// Index zero after a step therefore never means "just started"; a
/// one-question section completes on every single step.
///
/// # Errors
///
/// Returns `MachineError` if the cursor is idle or points outside `sequence`.
///
/// # Examples
///
/// ```
/// # use quiz_core::machine::{step, Step, Transition};
/// # use quiz_core::model::{Answer, AnswerId, Language, ProgressCursor, Question, QuestionId, QuestionSequence, Section};
/// let answers = (0..4)
///     .map(|i| Answer::new(AnswerId::new(i), format!("a{i}"), i == 0, "because"))
///     .collect();
/// let question = Question::new(QuestionId::new(1), "Only question", answers)?;
/// let sequence = QuestionSequence::new(Section::Qaj, Language::En, vec![question])?;
///
/// let transition = step(&ProgressCursor::started(), &sequence, Step::Answer("a0"))?;
/// assert!(matches!(transition, Transition::Completed { .. }));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn step(
    cursor: &ProgressCursor,
    sequence: &QuestionSequence,
    input: Step<'_>,
) -> Result<Transition, MachineError> {
    let question = current_question(cursor, sequence)?;
    let mut tally = cursor.tally();

    let feedback = match input {
        Step::Answer(text) => {
            let Some(answer) = question.find_answer(text) else {
                return Ok(Transition::Unchanged);
            };
            if answer.is_correct {
                tally.correct = tally.correct.saturating_add(1);
            } else {
                tally.incorrect = tally.incorrect.saturating_add(1);
            }
            Some(Feedback::from_answer(answer))
        }
        Step::Skip => {
            tally.skipped = tally.skipped.saturating_add(1);
            None
        }
    };

    match next_index(cursor, sequence.len())? {
        0 => Ok(Transition::Completed {
            cursor: ProgressCursor::idle(),
            feedback,
            tally,
        }),
        next => Ok(Transition::Advanced {
            cursor: ProgressCursor::at(next, tally),
            feedback,
        }),
    }
}

fn next_index(cursor: &ProgressCursor, len: usize) -> Result<u32, MachineError> {
    let index = cursor.current_index().ok_or(MachineError::NotActive)?;
    let position = usize::try_from(index).map_err(|_| MachineError::IndexOutOfRange { index, len })?;
    let next = (position + 1) % len;
    u32::try_from(next).map_err(|_| MachineError::IndexOutOfRange { index, len })
}
