//! Plain-text rendering of outcomes for the console transport.

use quiz_core::model::{InterruptKind, Language, Section};
use services::{ErrorKind, Hint, Outcome};

use crate::keyboard::{continue_label, reset_label, skip_label};

fn tr(language: Language, en: &'static str, ru: &'static str) -> &'static str {
    match language {
        Language::En => en,
        Language::Ru => ru,
    }
}

fn buttons<'a>(labels: impl IntoIterator<Item = &'a str>) -> String {
    labels
        .into_iter()
        .map(|label| format!("[{label}]"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn section_menu(language: Language) -> String {
    let mut text = String::from(tr(
        language,
        "Select a section to start practicing:",
        "Выберите раздел, чтобы начать практику:",
    ));
    for section in Section::ALL {
        text.push_str(&format!("\n- {}: {}", section.label(), section.summary()));
    }
    text.push('\n');
    text.push_str(&buttons(Section::ALL.iter().map(|s| s.label())));
    text
}

/// Text for one outcome in the chat's language.
#[must_use]
pub fn render(outcome: &Outcome, language: Language) -> String {
    match outcome {
        Outcome::QuestionToShow(view) => {
            let mut labels: Vec<&str> = view.options.iter().map(String::as_str).collect();
            labels.push(skip_label(language));
            format!(
                "• • • {}/{} • • •\n{}\n{}",
                view.index + 1,
                view.total,
                view.text,
                buttons(labels)
            )
        }
        Outcome::Feedback {
            correct: true,
            explanation,
        } => format!("{}\n\n{explanation}", tr(language, "Correct!", "Верно!")),
        Outcome::Feedback {
            correct: false,
            explanation,
        } => format!(
            "{}\n\n{explanation}",
            tr(language, "That's not the right answer.", "Это неверный ответ.")
        ),
        Outcome::Completion(stats) => format!(
            "{} {}\n{}: {}\n{}: {}\n{}: {}",
            tr(
                language,
                "Good job! You've completed all the questions in",
                "Отлично! Вы ответили на все вопросы раздела",
            ),
            stats.section.label(),
            tr(language, "Correct", "Верно"),
            stats.correct,
            tr(language, "Incorrect", "Неверно"),
            stats.incorrect,
            tr(language, "Skipped", "Пропущено"),
            stats.skipped,
        ),
        Outcome::PromptResetOrContinue(active) => format!(
            "{} ({}, {})\n{}",
            tr(
                language,
                "Heads up! Starting a new session will reset your progress. Would you like to proceed?",
                "Внимание! Новая сессия сбросит ваш прогресс. Продолжить?",
            ),
            active.section.label(),
            active.index + 1,
            buttons([reset_label(language), continue_label(language)])
        ),
        Outcome::SectionMenu => section_menu(language),
        Outcome::SectionUnavailable(section) => format!(
            "{} ({})",
            tr(
                language,
                "This section isn't available right now. Please select a different one.",
                "Этот раздел сейчас недоступен. Пожалуйста, выберите другой.",
            ),
            section.label()
        ),
        Outcome::NoActiveSession => tr(
            language,
            "No active session found. Please start a new one with /start.",
            "Активная сессия не найдена. Начните новую командой /start.",
        )
        .to_string(),
        Outcome::ProgressSaved(kind) => match kind {
            InterruptKind::Language => tr(
                language,
                "I will save your progress, and you can continue after setting your language preference.",
                "Я сохраню ваш прогресс, и вы сможете продолжить после выбора языка.",
            ),
            InterruptKind::Subscription => tr(
                language,
                "I will save your progress, and you can continue after subscribing.",
                "Я сохраню ваш прогресс, и вы сможете продолжить после подписки.",
            ),
            InterruptKind::Info => tr(
                language,
                "I will save your progress, and you can continue after viewing the info.",
                "Я сохраню ваш прогресс, и вы сможете продолжить после просмотра информации.",
            ),
        }
        .to_string(),
        Outcome::LanguageMenu => format!(
            "Select your language / Выберите язык:\n{}",
            buttons(Language::ALL.iter().map(|l| l.native_name()))
        ),
        Outcome::LanguageUpdated(language) => tr(*language, "Language updated.", "Язык обновлён.").to_string(),
        Outcome::SubscribePrompt => tr(
            language,
            "You are going to subscribe to exclusive content via email. Please enter your email, or type 'Skip' to cancel.",
            "Вы подписываетесь на эксклюзивные материалы по email. Введите адрес или напишите 'Skip' для отмены.",
        )
        .to_string(),
        Outcome::InvalidEmail => tr(
            language,
            "That doesn't seem like a valid email. Please enter a valid email address or type 'Skip' to cancel.",
            "Похоже, это не email. Введите корректный адрес или напишите 'Skip' для отмены.",
        )
        .to_string(),
        Outcome::Subscribed => tr(language, "Thank you for subscribing!", "Спасибо за подписку!").to_string(),
        Outcome::SubscriptionCancelled => tr(
            language,
            "No problem! You can subscribe anytime with /subscribe.",
            "Без проблем! Подписаться можно в любой момент командой /subscribe.",
        )
        .to_string(),
        Outcome::Info => tr(
            language,
            "I am a bot that helps you prepare for IT and QA job interviews with multiple choice questions.",
            "Я бот, который помогает готовиться к собеседованиям в IT и QA с помощью тестов.",
        )
        .to_string(),
        Outcome::Hint(Hint::Greeting) => tr(language, "Hello! Send /start to begin.", "Привет! Отправьте /start, чтобы начать.").to_string(),
        Outcome::Hint(Hint::Help) => tr(
            language,
            "Send /start to pick a section, /language to switch language, /subscribe for updates, /info to learn more.",
            "Отправьте /start, чтобы выбрать раздел, /language для смены языка, /subscribe для подписки, /info для справки.",
        )
        .to_string(),
        Outcome::Hint(Hint::Unrecognized) => tr(
            language,
            "I'm not sure how to respond to that. Please type /start or /help.",
            "Не знаю, как на это ответить. Напишите /start или /help.",
        )
        .to_string(),
        Outcome::NoOp => String::new(),
        Outcome::Error(ErrorKind::StoreUnavailable) => tr(
            language,
            "A database error occurred. Please try again later.",
            "Произошла ошибка базы данных. Попробуйте позже.",
        )
        .to_string(),
        Outcome::Error(ErrorKind::InvariantViolation) => tr(
            language,
            "We had trouble fetching the questions. Please start over with /reset.",
            "Не удалось загрузить вопросы. Начните заново командой /reset.",
        )
        .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::Tally;
    use services::{CompletionStats, QuestionView};

    #[test]
    fn question_shows_options_and_skip() {
        let view = QuestionView {
            section: Section::Qaj,
            index: 1,
            total: 3,
            text: "What is regression testing?".into(),
            options: vec!["Re-checking old features".into(), "Load testing".into()],
        };
        let text = render(&Outcome::QuestionToShow(view), Language::En);
        assert!(text.starts_with("• • • 2/3 • • •"));
        assert!(text.contains("[Re-checking old features] [Load testing] [Skip question]"));
    }

    #[test]
    fn completion_lists_counts_in_language() {
        let stats = CompletionStats::new(Section::Itj, Tally::new(2, 1, 0));
        let text = render(&Outcome::Completion(stats), Language::Ru);
        assert!(text.contains("IT. Junior +"));
        assert!(text.contains("Верно: 2"));
        assert!(text.contains("Пропущено: 0"));
    }

    #[test]
    fn no_op_renders_nothing() {
        assert!(render(&Outcome::NoOp, Language::En).is_empty());
    }
}
