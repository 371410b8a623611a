mod interrupts;
mod locks;
mod resolver;
mod service;

pub use interrupts::{InterruptCoordinator, is_cancel_word, is_valid_email};
pub use locks::{UserGuard, UserLocks};
pub use resolver::{Begin, SessionResolver};
pub use service::QuizService;
