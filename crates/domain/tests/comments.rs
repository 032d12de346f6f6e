mod common;

use std::sync::atomic::Ordering;

use patronage_domain::error::DomainError;
use patronage_domain::memory::InMemoryStore;
use patronage_domain::ports::notify::CommentEvent;

use common::{Harness, actor, comment};

fn store_with_comment() -> InMemoryStore {
    let store = InMemoryStore::new();
    store.seed(|tables| {
        tables
            .comments
            .insert("comment-1".into(), comment("comment-1", "user-1"));
    });
    store
}

#[tokio::test]
async fn owner_unpublishes_and_subscribers_are_told() {
    let harness = Harness::new(store_with_comment());

    let outcome = harness
        .comments
        .unpublish(Some(&actor("user-1", "one@example.org")), "comment-1")
        .await
        .unwrap();

    assert!(outcome.unpublished);
    assert!(outcome.effects.all_succeeded());
    assert!(!harness.store.snapshot().comments["comment-1"].published);

    let events = harness.effects.events.lock().unwrap().clone();
    let [CommentEvent::CommentRemoved { comment }] = events.as_slice() else {
        panic!("expected one removal event, got {events:?}");
    };
    assert_eq!(comment.id, "comment-1");
    assert!(!comment.published);

    let notices = harness.effects.notices.lock().unwrap().clone();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].actor_id, "user-1");
}

#[tokio::test]
async fn foreign_comment_is_forbidden_and_untouched() {
    let harness = Harness::new(store_with_comment());

    let err = harness
        .comments
        .unpublish(Some(&actor("user-2", "two@example.org")), "comment-1")
        .await
        .unwrap_err();

    assert!(matches!(err, DomainError::Forbidden(_)));
    assert!(harness.store.snapshot().comments["comment-1"].published);
    assert!(harness.effects.events.lock().unwrap().is_empty());
    assert!(harness.effects.notices.lock().unwrap().is_empty());
}

#[tokio::test]
async fn missing_comment_is_not_found() {
    let harness = Harness::new(store_with_comment());

    let err = harness
        .comments
        .unpublish(Some(&actor("user-1", "one@example.org")), "comment-404")
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound(_)));
}

#[tokio::test]
async fn anonymous_caller_is_unauthenticated() {
    let harness = Harness::new(store_with_comment());
    let err = harness
        .comments
        .unpublish(None, "comment-1")
        .await
        .unwrap_err();
    assert_eq!(err, DomainError::Unauthenticated);
}

#[tokio::test]
async fn failed_event_publish_keeps_committed_unpublish() {
    let harness = Harness::new(store_with_comment());
    harness.effects.fail_events.store(true, Ordering::SeqCst);

    let outcome = harness
        .comments
        .unpublish(Some(&actor("user-1", "one@example.org")), "comment-1")
        .await
        .unwrap();

    assert!(outcome.unpublished);
    assert_eq!(outcome.effects.failed_tasks(), vec!["comment_removed_event"]);
    assert!(!harness.store.snapshot().comments["comment-1"].published);
    // the ops notice still goes out
    assert_eq!(harness.effects.notices.lock().unwrap().len(), 1);
}
