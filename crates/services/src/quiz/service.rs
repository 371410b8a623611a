use std::sync::Arc;

use quiz_core::Clock;
use quiz_core::machine::{self, MachineError, Step, Transition};
use quiz_core::model::{
    ActiveSession, InterruptKind, Language, PendingInterrupt, ProgressCursor, QuestionError,
    QuestionSequence, Section, UserId,
};
use storage::repository::{
    ProgressRepository, QuestionRepository, Storage, SubscriptionRepository, UserRepository,
};

use super::interrupts::{InterruptCoordinator, is_cancel_word, is_valid_email};
use super::locks::UserLocks;
use super::resolver::{Begin, SessionResolver};
use crate::action::Action;
use crate::error::QuizError;
use crate::outcome::{CompletionStats, Hint, Outcome, QuestionView};

/// Entry point for every inbound chat action.
///
/// Actions of one user run one at a time; each returns the outcomes to render
/// in order. Failures never escape: they are logged and reported as
/// [`Outcome::Error`] or [`Outcome::SectionUnavailable`].
pub struct QuizService {
    clock: Clock,
    questions: Arc<dyn QuestionRepository>,
    progress: Arc<dyn ProgressRepository>,
    users: Arc<dyn UserRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    resolver: SessionResolver,
    interrupts: InterruptCoordinator,
    locks: UserLocks,
}

impl QuizService {
    #[must_use]
    pub fn new(clock: Clock, storage: &Storage) -> Self {
        let resolver = SessionResolver::new(Arc::clone(&storage.progress));
        let interrupts =
            InterruptCoordinator::new(clock, Arc::clone(&storage.interrupts), resolver.clone());
        Self {
            clock,
            questions: Arc::clone(&storage.questions),
            progress: Arc::clone(&storage.progress),
            users: Arc::clone(&storage.users),
            subscriptions: Arc::clone(&storage.subscriptions),
            resolver,
            interrupts,
            locks: UserLocks::new(),
        }
    }

    #[must_use]
    pub fn resolver(&self) -> &SessionResolver {
        &self.resolver
    }

    /// Handle one action for `user`.
    ///
    /// `section_hint` is the section the transport attached to the message:
    /// the requested section for [`Action::Start`], informational otherwise.
    pub async fn handle_action(
        &self,
        user: UserId,
        section_hint: Option<Section>,
        action: Action,
    ) -> Vec<Outcome> {
        let _guard = self.locks.acquire(user).await;
        tracing::debug!(user = %user, ?section_hint, ?action, "handling action");

        match self.dispatch(user, section_hint, action).await {
            Ok(outcomes) => outcomes,
            Err(QuizError::InvalidContent(QuestionError::QuestionSetEmpty { section, language })) => {
                tracing::warn!(user = %user, %section, %language, "section has no questions");
                vec![Outcome::SectionUnavailable(section)]
            }
            Err(err) => {
                let kind = err.kind();
                tracing::error!(user = %user, error = %err, ?kind, "action failed");
                vec![Outcome::Error(kind)]
            }
        }
    }

    async fn dispatch(
        &self,
        user: UserId,
        section_hint: Option<Section>,
        action: Action,
    ) -> Result<Vec<Outcome>, QuizError> {
        let now = self.clock.now();
        self.users.ensure_user(user, now).await?;

        if let Some(pending) = self.interrupts.pending(user).await? {
            if let Some(outcomes) = self.continue_interrupt(user, &pending, &action).await? {
                return Ok(outcomes);
            }
        }
        self.users.touch(user, now).await?;

        match action {
            Action::Start => self.begin(user, section_hint).await,
            Action::SelectSection(section) => match self.resolver.find_active(user).await? {
                Some(active) => Ok(vec![Outcome::PromptResetOrContinue(active)]),
                None => self.start_section(user, section).await,
            },
            Action::Answer(text) => self.answer(user, section_hint, Step::Answer(&text)).await,
            Action::Text(text) => match self.resolver.find_active(user).await? {
                Some(active) => {
                    self.advance(user, active, section_hint, Step::Answer(&text))
                        .await
                }
                None => Ok(vec![Outcome::Hint(Hint::for_text(&text))]),
            },
            Action::Skip => self.answer(user, section_hint, Step::Skip).await,
            Action::Reset => self.idle_entry(user).await,
            Action::Continue => match self.resolver.find_active(user).await? {
                Some(active) => Ok(vec![self.show(user, active).await?]),
                None => Ok(vec![Outcome::NoActiveSession]),
            },
            Action::ChangeLanguage => {
                let snapshot = self.interrupts.enter(user, InterruptKind::Language).await?;
                let mut outcomes = saved_notice(InterruptKind::Language, snapshot);
                outcomes.push(Outcome::LanguageMenu);
                Ok(outcomes)
            }
            Action::SetLanguage(language) => {
                let snapshot = self.resolver.find_active(user).await?;
                self.apply_language(user, language, snapshot).await
            }
            Action::Help => Ok(vec![Outcome::Hint(Hint::Help)]),
            Action::Subscribe => {
                let snapshot = self
                    .interrupts
                    .enter(user, InterruptKind::Subscription)
                    .await?;
                let mut outcomes = saved_notice(InterruptKind::Subscription, snapshot);
                outcomes.push(Outcome::SubscribePrompt);
                Ok(outcomes)
            }
            Action::Info => {
                let snapshot = self.interrupts.enter(user, InterruptKind::Info).await?;
                let mut outcomes = saved_notice(InterruptKind::Info, snapshot);
                outcomes.push(Outcome::Info);
                outcomes.extend(self.resume(user, snapshot).await?);
                Ok(outcomes)
            }
        }
    }

    //
    // ─── INTERRUPTS ────────────────────────────────────────────────────────────
    //

    /// Feed an action to the pending interrupt.
    ///
    /// Returns `None` when the action is a command: the interrupt is dropped
    /// and the command runs as usual.
    async fn continue_interrupt(
        &self,
        user: UserId,
        pending: &PendingInterrupt,
        action: &Action,
    ) -> Result<Option<Vec<Outcome>>, QuizError> {
        if action.is_command() || pending.kind == InterruptKind::Info {
            self.interrupts.abandon(user, pending).await?;
            return Ok(None);
        }

        let outcomes = match (pending.kind, action) {
            (InterruptKind::Language, Action::SetLanguage(language)) => {
                let snapshot = self.interrupts.resolve(user, pending).await?;
                self.apply_language(user, *language, snapshot).await?
            }
            (InterruptKind::Language, _) => vec![Outcome::LanguageMenu],
            (InterruptKind::Subscription, Action::Skip) => self.cancel_subscription(user, pending).await?,
            (InterruptKind::Subscription, Action::Answer(text) | Action::Text(text)) => {
                if is_cancel_word(text) {
                    self.cancel_subscription(user, pending).await?
                } else if is_valid_email(text) {
                    self.subscriptions
                        .subscribe(user, text.trim(), self.clock.now())
                        .await?;
                    tracing::info!(user = %user, "subscribed");
                    let snapshot = self.interrupts.resolve(user, pending).await?;
                    let mut outcomes = vec![Outcome::Subscribed];
                    outcomes.extend(self.resume(user, snapshot).await?);
                    outcomes
                } else {
                    vec![Outcome::InvalidEmail]
                }
            }
            (InterruptKind::Subscription, _) => {
                // A language button while waiting for an email.
                self.interrupts.abandon(user, pending).await?;
                return Ok(None);
            }
            (InterruptKind::Info, _) => return Ok(None),
        };
        Ok(Some(outcomes))
    }

    async fn cancel_subscription(
        &self,
        user: UserId,
        pending: &PendingInterrupt,
    ) -> Result<Vec<Outcome>, QuizError> {
        let snapshot = self.interrupts.resolve(user, pending).await?;
        let mut outcomes = vec![Outcome::SubscriptionCancelled];
        outcomes.extend(self.resume(user, snapshot).await?);
        Ok(outcomes)
    }

    async fn apply_language(
        &self,
        user: UserId,
        language: Language,
        snapshot: Option<ActiveSession>,
    ) -> Result<Vec<Outcome>, QuizError> {
        self.users
            .set_language(user, language, self.clock.now())
            .await?;
        tracing::info!(user = %user, %language, "language updated");
        let mut outcomes = vec![Outcome::LanguageUpdated(language)];
        outcomes.extend(self.resume(user, snapshot).await?);
        Ok(outcomes)
    }

    /// Show the snapshotted question again, or fall back to the idle entry
    /// flow when no quiz was running.
    async fn resume(
        &self,
        user: UserId,
        snapshot: Option<ActiveSession>,
    ) -> Result<Vec<Outcome>, QuizError> {
        match snapshot {
            Some(active) => Ok(vec![self.show(user, active).await?]),
            None => self.begin(user, None).await,
        }
    }

    //
    // ─── QUIZ FLOW ─────────────────────────────────────────────────────────────
    //

    async fn begin(
        &self,
        user: UserId,
        requested: Option<Section>,
    ) -> Result<Vec<Outcome>, QuizError> {
        match self.resolver.begin_or_prompt(user, requested).await? {
            Begin::Start(section) => self.start_section(user, section).await,
            Begin::Idle => self.idle_entry(user).await,
            Begin::Prompt(active) => Ok(vec![Outcome::PromptResetOrContinue(active)]),
        }
    }

    /// Reset every section and offer the section menu.
    async fn idle_entry(&self, user: UserId) -> Result<Vec<Outcome>, QuizError> {
        self.progress.reset_all(user, self.clock.now()).await?;
        tracing::info!(user = %user, "progress reset");
        Ok(vec![Outcome::SectionMenu])
    }

    async fn start_section(&self, user: UserId, section: Section) -> Result<Vec<Outcome>, QuizError> {
        // Content first: an empty section must not leave an active cursor.
        let sequence = self.sequence(user, section).await?;
        let cursor = ProgressCursor::started();
        self.progress
            .write_cursor(user, section, &cursor, self.clock.now())
            .await?;
        tracing::info!(user = %user, %section, questions = sequence.len(), "section started");
        Ok(vec![question_at(&sequence, 0)?])
    }

    async fn answer(
        &self,
        user: UserId,
        section_hint: Option<Section>,
        input: Step<'_>,
    ) -> Result<Vec<Outcome>, QuizError> {
        match self.resolver.find_active(user).await? {
            Some(active) => self.advance(user, active, section_hint, input).await,
            None => Ok(vec![Outcome::NoActiveSession]),
        }
    }

    async fn advance(
        &self,
        user: UserId,
        active: ActiveSession,
        section_hint: Option<Section>,
        input: Step<'_>,
    ) -> Result<Vec<Outcome>, QuizError> {
        let section = active.section;
        if let Some(hint) = section_hint.filter(|hint| *hint != section) {
            tracing::warn!(user = %user, %hint, active = %section, "section hint ignored");
        }

        let cursor = self.progress.read_cursor(user, section).await?;
        let sequence = self.sequence(user, section).await?;
        let transition = machine::step(&cursor, &sequence, input)?;

        if transition == Transition::Unchanged {
            tracing::debug!(user = %user, %section, "input matched no option");
            return Ok(vec![Outcome::NoOp]);
        }

        let mut outcomes = Vec::with_capacity(3);
        if let Some(feedback) = transition.feedback() {
            outcomes.push(Outcome::Feedback {
                correct: feedback.correct,
                explanation: feedback.explanation.clone(),
            });
        }

        match &transition {
            Transition::Unchanged => {}
            Transition::Advanced { cursor, .. } => {
                self.progress
                    .write_cursor(user, section, cursor, self.clock.now())
                    .await?;
                let index = cursor.current_index().ok_or(MachineError::NotActive)?;
                outcomes.push(question_at(&sequence, index)?);
            }
            Transition::Completed { cursor, tally, .. } => {
                self.progress
                    .write_cursor(user, section, cursor, self.clock.now())
                    .await?;
                tracing::info!(
                    user = %user,
                    %section,
                    correct = tally.correct,
                    incorrect = tally.incorrect,
                    skipped = tally.skipped,
                    "section completed"
                );
                outcomes.push(Outcome::Completion(CompletionStats::new(section, *tally)));
                outcomes.push(Outcome::SectionMenu);
            }
        }
        Ok(outcomes)
    }

    /// Re-emit the question at a known position. Never changes progress.
    async fn show(&self, user: UserId, active: ActiveSession) -> Result<Outcome, QuizError> {
        let sequence = self.sequence(user, active.section).await?;
        question_at(&sequence, active.index)
    }

    async fn sequence(&self, user: UserId, section: Section) -> Result<QuestionSequence, QuizError> {
        let language = self.users.language(user).await?.unwrap_or_default();
        let questions = self.questions.fetch(section, language).await?;
        Ok(QuestionSequence::new(section, language, questions)?)
    }
}

fn question_at(sequence: &QuestionSequence, index: u32) -> Result<Outcome, QuizError> {
    let question = sequence.get(index).ok_or(MachineError::IndexOutOfRange {
        index,
        len: sequence.len(),
    })?;
    Ok(Outcome::QuestionToShow(QuestionView::new(
        sequence, index, question,
    )))
}

fn saved_notice(kind: InterruptKind, snapshot: Option<ActiveSession>) -> Vec<Outcome> {
    snapshot
        .map(|_| Outcome::ProgressSaved(kind))
        .into_iter()
        .collect()
}
