use serde::Serialize;

use quiz_core::model::{
    ActiveSession, InterruptKind, Language, Question, QuestionSequence, Section, Tally,
};

use crate::error::ErrorKind;

/// A question ready to be rendered with its answer buttons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionView {
    pub section: Section,
    pub index: u32,
    pub total: usize,
    pub text: String,
    /// Answer texts in display order. Sending one back as
    /// [`Action::Answer`](crate::Action::Answer) selects it.
    pub options: Vec<String>,
}

impl QuestionView {
    #[must_use]
    pub fn new(sequence: &QuestionSequence, index: u32, question: &Question) -> Self {
        Self {
            section: sequence.section(),
            index,
            total: sequence.len(),
            text: question.text().to_string(),
            options: question
                .answers()
                .iter()
                .map(|answer| answer.text.clone())
                .collect(),
        }
    }
}

/// Final counts of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompletionStats {
    pub section: Section,
    pub correct: u32,
    pub incorrect: u32,
    pub skipped: u32,
}

impl CompletionStats {
    #[must_use]
    pub fn new(section: Section, tally: Tally) -> Self {
        Self {
            section,
            correct: tally.correct,
            incorrect: tally.incorrect,
            skipped: tally.skipped,
        }
    }
}

/// Canned replies to free text outside a quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Hint {
    Greeting,
    Help,
    Unrecognized,
}

impl Hint {
    #[must_use]
    pub fn for_text(text: &str) -> Self {
        let lower = text.to_lowercase();
        if lower.contains("hello") {
            Hint::Greeting
        } else if lower.contains("help") {
            Hint::Help
        } else {
            Hint::Unrecognized
        }
    }
}

/// One thing the transport should present, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Outcome {
    QuestionToShow(QuestionView),
    Feedback { correct: bool, explanation: String },
    Completion(CompletionStats),
    /// A section is already in progress; ask whether to reset or continue.
    PromptResetOrContinue(ActiveSession),
    SectionMenu,
    /// The section has no questions in the user's language.
    SectionUnavailable(Section),
    NoActiveSession,
    /// An interrupt began while a quiz was running; its position is kept.
    ProgressSaved(InterruptKind),
    LanguageMenu,
    LanguageUpdated(Language),
    SubscribePrompt,
    InvalidEmail,
    Subscribed,
    SubscriptionCancelled,
    Info,
    Hint(Hint),
    NoOp,
    Error(ErrorKind),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hints_follow_keywords() {
        assert_eq!(Hint::for_text("Hello there"), Hint::Greeting);
        assert_eq!(Hint::for_text("I need HELP"), Hint::Help);
        assert_eq!(Hint::for_text("hello, help"), Hint::Greeting);
        assert_eq!(Hint::for_text("what?"), Hint::Unrecognized);
    }
}
