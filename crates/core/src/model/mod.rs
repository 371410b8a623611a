mod cursor;
mod ids;
mod interrupt;
mod language;
mod question;
mod section;

pub use cursor::{ActiveSession, ProgressCursor, Tally};
pub use ids::{AnswerId, QuestionId, UserId};
pub use interrupt::{InterruptKind, PendingInterrupt};
pub use language::{Language, UnknownLanguage};
pub use question::{ANSWERS_PER_QUESTION, Answer, Question, QuestionError, QuestionSequence};
pub use section::{Section, UnknownSection};
