//! Maps what the user typed or tapped to a language-independent [`Action`].

use quiz_core::model::{Language, Section};
use services::{Action, Outcome};

/// Fixed buttons in every supported language.
const SKIP_LABELS: [&str; 2] = ["Skip question", "Пропустить вопрос"];
const RESET_LABELS: [&str; 2] = ["Yes, reset progress", "Да, сбросить прогресс"];
const CONTINUE_LABELS: [&str; 2] = ["No, continue my current session", "Нет, продолжить текущую сессию"];

#[must_use]
pub fn skip_label(language: Language) -> &'static str {
    SKIP_LABELS[language as usize]
}

#[must_use]
pub fn reset_label(language: Language) -> &'static str {
    RESET_LABELS[language as usize]
}

#[must_use]
pub fn continue_label(language: Language) -> &'static str {
    CONTINUE_LABELS[language as usize]
}

/// Keyboard state of one chat: its language and the answer buttons on screen.
#[derive(Debug, Default)]
pub struct Keyboard {
    language: Language,
    options: Vec<String>,
}

impl Keyboard {
    #[must_use]
    pub fn new(language: Language) -> Self {
        Self {
            language,
            options: Vec::new(),
        }
    }

    #[must_use]
    pub fn language(&self) -> Language {
        self.language
    }

    /// Remember what the last batch of outcomes put on screen.
    pub fn observe(&mut self, outcomes: &[Outcome]) {
        for outcome in outcomes {
            match outcome {
                Outcome::QuestionToShow(view) => self.options.clone_from(&view.options),
                Outcome::Completion(_) | Outcome::SectionMenu => self.options.clear(),
                Outcome::LanguageUpdated(language) => self.language = *language,
                _ => {}
            }
        }
    }

    /// Translate one input line into an action and the section it refers to.
    #[must_use]
    pub fn action_for(&self, input: &str) -> (Option<Section>, Action) {
        let text = input.trim();

        if let Some(section) = Section::from_label(text) {
            return (Some(section), Action::SelectSection(section));
        }
        if let Some(language) = Language::from_native_name(text) {
            return (None, Action::SetLanguage(language));
        }
        if SKIP_LABELS.contains(&text) {
            return (None, Action::Skip);
        }
        if RESET_LABELS.contains(&text) {
            return (None, Action::Reset);
        }
        if CONTINUE_LABELS.contains(&text) {
            return (None, Action::Continue);
        }
        if self.options.iter().any(|option| option == text) {
            return (None, Action::Answer(text.to_string()));
        }
        // Deep link: `/start QAJ` opens a section directly.
        if let Some(code) = text.strip_prefix("/start ") {
            if let Some(section) = Section::from_code(code.trim()) {
                return (Some(section), Action::Start);
            }
        }

        (None, Action::parse(input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use services::QuestionView;

    #[test]
    fn labels_map_to_actions() {
        let keyboard = Keyboard::new(Language::En);
        assert_eq!(
            keyboard.action_for("QA/QC. Junior +"),
            (Some(Section::Qaj), Action::SelectSection(Section::Qaj))
        );
        assert_eq!(
            keyboard.action_for("Русский"),
            (None, Action::SetLanguage(Language::Ru))
        );
        assert_eq!(keyboard.action_for("Пропустить вопрос"), (None, Action::Skip));
        assert_eq!(keyboard.action_for("Yes, reset progress"), (None, Action::Reset));
        assert_eq!(
            keyboard.action_for("No, continue my current session"),
            (None, Action::Continue)
        );
        assert_eq!(
            keyboard.action_for("/start itm"),
            (Some(Section::Itm), Action::Start)
        );
        assert_eq!(keyboard.action_for("/info"), (None, Action::Info));
        assert_eq!(keyboard.action_for("/help"), (None, Action::Help));
    }

    #[test]
    fn shown_options_become_answers() {
        let mut keyboard = Keyboard::new(Language::En);
        assert_eq!(
            keyboard.action_for("Smoke testing"),
            (None, Action::Text("Smoke testing".into()))
        );

        keyboard.observe(&[Outcome::QuestionToShow(QuestionView {
            section: Section::Qaj,
            index: 0,
            total: 3,
            text: "Which testing is shallow and wide?".into(),
            options: vec!["Smoke testing".into(), "Unit testing".into()],
        })]);
        assert_eq!(
            keyboard.action_for("Smoke testing"),
            (None, Action::Answer("Smoke testing".into()))
        );

        keyboard.observe(&[Outcome::LanguageUpdated(Language::Ru), Outcome::SectionMenu]);
        assert!(matches!(keyboard.action_for("Smoke testing").1, Action::Text(_)));
        assert_eq!(keyboard.language(), Language::Ru);
    }
}
