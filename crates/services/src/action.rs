use quiz_core::model::{Language, Section};

/// Language-independent user intent.
///
/// Transports translate buttons and commands into an `Action`; the quiz never
/// looks at localized labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Begin a session, or ask what to do with the one in progress.
    Start,
    SelectSection(Section),
    /// An answer button was pressed; carries the option text as shown.
    Answer(String),
    Skip,
    /// Drop progress in every section and show the section menu.
    Reset,
    /// Keep the current session and show its question again.
    Continue,
    ChangeLanguage,
    SetLanguage(Language),
    Subscribe,
    Info,
    /// List the available commands.
    Help,
    /// Anything typed that is not a known command.
    Text(String),
}

impl Action {
    /// Parse a stable command code, e.g. `/section QAJ` or `/lang ru`.
    ///
    /// Input that is not a command becomes [`Action::Text`].
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        let mut parts = trimmed.split_whitespace();
        let command = parts.next().unwrap_or_default();
        let argument = parts.next();
        let extra = parts.next().is_some();

        let parsed = match (command, argument) {
            _ if extra => None,
            ("/start", None) => Some(Action::Start),
            ("/reset", None) => Some(Action::Reset),
            ("/continue", None) => Some(Action::Continue),
            ("/skip", None) => Some(Action::Skip),
            ("/language", None) => Some(Action::ChangeLanguage),
            ("/subscribe", None) => Some(Action::Subscribe),
            ("/info", None) => Some(Action::Info),
            ("/help", None) => Some(Action::Help),
            ("/section", Some(code)) => Section::from_code(code).map(Action::SelectSection),
            ("/lang", Some(code)) => Language::from_code(code).map(Action::SetLanguage),
            _ => None,
        };
        parsed.unwrap_or_else(|| Action::Text(input.to_string()))
    }

    /// Whether the action is a command that abandons a pending interrupt.
    #[must_use]
    pub fn is_command(&self) -> bool {
        !matches!(
            self,
            Action::Answer(_) | Action::Skip | Action::Text(_) | Action::SetLanguage(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_command_codes() {
        assert_eq!(Action::parse("/start"), Action::Start);
        assert_eq!(Action::parse("  /reset "), Action::Reset);
        assert_eq!(
            Action::parse("/section qaj"),
            Action::SelectSection(Section::Qaj)
        );
        assert_eq!(Action::parse("/lang ru"), Action::SetLanguage(Language::Ru));
        assert_eq!(Action::parse("/help"), Action::Help);
    }

    #[test]
    fn everything_else_is_text() {
        assert_eq!(Action::parse("/section DEV"), Action::Text("/section DEV".into()));
        assert_eq!(Action::parse("/start now please"), Action::Text("/start now please".into()));
        assert_eq!(Action::parse("hello"), Action::Text("hello".into()));
        assert_eq!(Action::parse(""), Action::Text(String::new()));
    }

    #[test]
    fn answers_and_skips_are_not_commands() {
        assert!(Action::Start.is_command());
        assert!(Action::Info.is_command());
        assert!(Action::Help.is_command());
        assert!(!Action::Skip.is_command());
        assert!(!Action::Text("x".into()).is_command());
    }
}
