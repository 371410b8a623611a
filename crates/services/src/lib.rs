#![forbid(unsafe_code)]

pub mod action;
pub mod app_services;
pub mod error;
pub mod outcome;
pub mod quiz;

pub use quiz_core::Clock;

pub use action::Action;
pub use app_services::AppServices;
pub use error::{AppServicesError, ErrorKind, QuizError};
pub use outcome::{CompletionStats, Hint, Outcome, QuestionView};
pub use quiz::{QuizService, SessionResolver};
