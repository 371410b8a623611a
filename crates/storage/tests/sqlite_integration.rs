use chrono::{DateTime, Utc};
use quiz_core::model::{
    ActiveSession, AnswerId, InterruptKind, Language, PendingInterrupt, ProgressCursor, QuestionId,
    Section, Tally, UserId,
};
use quiz_core::time::fixed_now;
use storage::repository::{
    AnswerRecord, InterruptRepository, LocalizedText, ProgressRepository, QuestionRecord,
    QuestionRepository, StorageError, SubscriptionRepository, UserRepository,
};
use storage::sqlite::SqliteRepository;

async fn repo(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn record(section: Section, id: u64, answers: u64) -> QuestionRecord {
    QuestionRecord {
        id: QuestionId::new(id),
        section,
        text: LocalizedText::new(format!("Question {id}"), Some(format!("Вопрос {id}"))),
        // Stored out of order on purpose; reads sort by id.
        answers: (1..=answers)
            .rev()
            .map(|slot| AnswerRecord {
                id: AnswerId::new(slot),
                text: LocalizedText::new(format!("Option {slot}"), None),
                is_correct: slot == 2,
                explanation: LocalizedText::new(
                    format!("Because {slot}"),
                    Some(format!("Потому что {slot}")),
                ),
            })
            .collect(),
    }
}

#[tokio::test]
async fn questions_come_back_ordered_and_localized() {
    let repo = repo("memdb_questions").await;
    for id in [3, 1, 2] {
        repo.upsert_question(&record(Section::Qaj, id, 4)).await.unwrap();
    }
    repo.upsert_question(&record(Section::Itm, 1, 4)).await.unwrap();

    let en = repo.fetch(Section::Qaj, Language::En).await.unwrap();
    let ids: Vec<u64> = en.iter().map(|q| q.id().value()).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    let options: Vec<&str> = en[0].answers().iter().map(|a| a.text.as_str()).collect();
    assert_eq!(options, vec!["Option 1", "Option 2", "Option 3", "Option 4"]);
    assert!(en[0].answers()[1].is_correct);

    let ru = repo.fetch(Section::Qaj, Language::Ru).await.unwrap();
    assert_eq!(ru[0].text(), "Вопрос 1");
    // Missing translation falls back to English.
    assert_eq!(ru[0].answers()[0].text, "Option 1");
    assert_eq!(ru[0].answers()[0].explanation, "Потому что 1");

    assert!(repo.fetch(Section::Qam, Language::En).await.unwrap().is_empty());
}

#[tokio::test]
async fn upsert_replaces_answers() {
    let repo = repo("memdb_upsert").await;
    repo.upsert_question(&record(Section::Itj, 1, 4)).await.unwrap();
    let mut changed = record(Section::Itj, 1, 4);
    changed.text = LocalizedText::new("Reworded", None);
    changed.answers[0].text = LocalizedText::new("Option 4 reworded", None);
    repo.upsert_question(&changed).await.unwrap();

    let questions = repo.fetch(Section::Itj, Language::Ru).await.unwrap();
    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0].text(), "Reworded");
    assert_eq!(questions[0].answers()[3].text, "Option 4 reworded");
}

#[tokio::test]
async fn malformed_question_is_a_serialization_error() {
    let repo = repo("memdb_malformed").await;
    repo.upsert_question(&record(Section::Qam, 1, 3)).await.unwrap();
    let err = repo.fetch(Section::Qam, Language::En).await.unwrap_err();
    assert!(matches!(err, StorageError::Serialization(_)));
}

#[tokio::test]
async fn cursor_writes_are_whole_and_reset_is_per_user() {
    let repo = repo("memdb_cursor").await;
    let user = UserId::new(-100_200);
    let other = UserId::new(42);

    assert_eq!(
        repo.read_cursor(user, Section::Qaj).await.unwrap(),
        ProgressCursor::idle()
    );

    let cursor = ProgressCursor::from_persisted(Some(2), Tally::new(1, 1, 0));
    repo.write_cursor(user, Section::Qaj, &cursor, fixed_now())
        .await
        .unwrap();
    repo.write_cursor(other, Section::Itj, &cursor, fixed_now())
        .await
        .unwrap();
    assert_eq!(repo.read_cursor(user, Section::Qaj).await.unwrap(), cursor);
    assert_eq!(
        repo.active_cursors(user).await.unwrap(),
        vec![ActiveSession::new(Section::Qaj, 2)]
    );

    repo.write_cursor(user, Section::Qaj, &ProgressCursor::idle(), fixed_now())
        .await
        .unwrap();
    assert!(repo.active_cursors(user).await.unwrap().is_empty());

    repo.write_cursor(user, Section::Itm, &cursor, fixed_now())
        .await
        .unwrap();
    repo.reset_all(user, fixed_now()).await.unwrap();
    assert_eq!(
        repo.read_cursor(user, Section::Itm).await.unwrap(),
        ProgressCursor::idle()
    );
    assert_eq!(
        repo.active_cursors(other).await.unwrap(),
        vec![ActiveSession::new(Section::Itj, 2)]
    );
}

#[tokio::test]
async fn language_before_registration_uses_the_given_timestamp() {
    let repo = repo("memdb_language_stamp").await;
    let user = UserId::new(8);

    repo.set_language(user, Language::En, fixed_now())
        .await
        .unwrap();

    let (created, active): (DateTime<Utc>, DateTime<Utc>) = sqlx::query_as(
        "SELECT created_at, last_active_at FROM users WHERE chat_id = ?1",
    )
    .bind(user.value())
    .fetch_one(repo.pool())
    .await
    .unwrap();
    assert_eq!(created, fixed_now());
    assert_eq!(active, fixed_now());
    assert_eq!(repo.language(user).await.unwrap(), Some(Language::En));
}

#[tokio::test]
async fn users_languages_and_subscriptions() {
    let repo = repo("memdb_users").await;
    let user = UserId::new(7);

    repo.ensure_user(user, fixed_now()).await.unwrap();
    repo.ensure_user(user, fixed_now()).await.unwrap();
    assert_eq!(repo.language(user).await.unwrap(), None);

    repo.set_language(user, Language::Ru, fixed_now())
        .await
        .unwrap();
    repo.touch(user, fixed_now()).await.unwrap();
    assert_eq!(repo.language(user).await.unwrap(), Some(Language::Ru));

    assert!(repo.subscription(user).await.unwrap().is_none());
    repo.subscribe(user, "first@example.com", fixed_now())
        .await
        .unwrap();
    repo.subscribe(user, "second@example.com", fixed_now())
        .await
        .unwrap();
    let sub = repo.subscription(user).await.unwrap().unwrap();
    assert_eq!(sub.email, "second@example.com");
    assert!(sub.subscribed);
    assert_eq!(sub.updated_at, fixed_now());
}

#[tokio::test]
async fn pending_interrupt_survives_reconnect() {
    let user = UserId::new(9);
    let pending = PendingInterrupt::new(
        InterruptKind::Language,
        Some(ActiveSession::new(Section::Qaj, 1)),
        fixed_now(),
    );

    let first = repo("memdb_pending").await;
    first.put_pending(user, &pending).await.unwrap();

    // Same shared-cache database through a second pool.
    let second = repo("memdb_pending").await;
    assert_eq!(second.pending(user).await.unwrap(), Some(pending));

    let replaced = PendingInterrupt::new(InterruptKind::Subscription, None, fixed_now());
    second.put_pending(user, &replaced).await.unwrap();
    assert_eq!(first.pending(user).await.unwrap(), Some(replaced));

    first.clear_pending(user).await.unwrap();
    assert_eq!(second.pending(user).await.unwrap(), None);
}
