use blog_core::db::open_db_in_memory;
use blog_core::{
    ArticleService, BlogStore, ManualActor, ManualClock, StoreError, ValidationError,
};
use std::sync::Arc;

const T1: i64 = 1_700_000_000_000;
const T2: i64 = 1_700_000_360_000;

fn service_with(actor: Arc<ManualActor>, clock: Arc<ManualClock>) -> ArticleService {
    let store = BlogStore::new(open_db_in_memory().unwrap(), actor, clock).unwrap();
    ArticleService::new(store)
}

#[test]
fn publish_then_edit_tracks_both_authors() {
    let actor = Arc::new(ManualActor::new(Some("alice")));
    let clock = Arc::new(ManualClock::new(T1));
    let mut service = service_with(actor.clone(), clock.clone());

    let published = service.publish_article("Hello", "First post").unwrap();
    assert_eq!(published.audit.created_by.as_deref(), Some("alice"));
    assert_eq!(published.audit.created_on, T1);
    assert!(!published.audit.is_modified());

    actor.set(Some("bob"));
    clock.set(T2);
    let edited = service
        .edit_article(published.id, "Hello again", "Edited post")
        .unwrap();

    assert_eq!(edited.title, "Hello again");
    assert_eq!(edited.audit.created_by.as_deref(), Some("alice"));
    assert_eq!(edited.audit.created_on, T1);
    assert_eq!(edited.audit.modified_by.as_deref(), Some("bob"));
    assert_eq!(edited.audit.modified_on, Some(T2));
}

#[test]
fn comments_are_stamped_and_listed_oldest_first() {
    let actor = Arc::new(ManualActor::new(Some("alice")));
    let clock = Arc::new(ManualClock::new(T1));
    let mut service = service_with(actor.clone(), clock.clone());
    let article = service.publish_article("Post", "Body").unwrap();

    actor.set(Some("carol"));
    clock.advance(1_000);
    let first = service.add_comment(article.id, "Nice post").unwrap();
    actor.set(Some("dave"));
    clock.advance(1_000);
    let second = service.add_comment(article.id, "Agreed").unwrap();

    let comments = service.list_comments(article.id).unwrap();
    assert_eq!(comments, vec![first.clone(), second]);
    assert_eq!(first.audit.created_by.as_deref(), Some("carol"));
    assert_eq!(first.audit.created_on, T1 + 1_000);
}

#[test]
fn deleting_a_comment_removes_it() {
    let actor = Arc::new(ManualActor::new(Some("alice")));
    let mut service = service_with(actor, Arc::new(ManualClock::new(T1)));
    let article = service.publish_article("Post", "Body").unwrap();
    let comment = service.add_comment(article.id, "Spam").unwrap();

    service.delete_comment(comment.id).unwrap();

    assert!(service.list_comments(article.id).unwrap().is_empty());
    let err = service.delete_comment(comment.id).unwrap_err();
    assert!(matches!(err, StoreError::NotFound { table: "comments", .. }));
}

#[test]
fn missing_article_is_reported_as_not_found() {
    let actor = Arc::new(ManualActor::new(Some("alice")));
    let mut service = service_with(actor, Arc::new(ManualClock::new(T1)));
    let missing = uuid::Uuid::new_v4();

    assert!(service.get_article(missing).unwrap().is_none());
    assert!(matches!(
        service.add_comment(missing, "Hello?").unwrap_err(),
        StoreError::NotFound { table: "articles", .. }
    ));
    assert!(matches!(
        service.edit_article(missing, "t", "c").unwrap_err(),
        StoreError::NotFound { table: "articles", .. }
    ));
}

#[test]
fn article_serializes_with_provenance() {
    let actor = Arc::new(ManualActor::new(Some("alice")));
    let mut service = service_with(actor, Arc::new(ManualClock::new(T1)));
    let article = service.publish_article("Post", "Body").unwrap();

    let json = serde_json::to_value(&article).unwrap();
    assert_eq!(json["audit"]["created_by"], "alice");
    assert_eq!(json["audit"]["created_on"], T1);
    assert!(json["audit"]["modified_on"].is_null());
}

#[test]
fn rejected_publish_does_not_block_later_publishes() {
    let actor = Arc::new(ManualActor::new(Some("alice")));
    let mut service = service_with(actor, Arc::new(ManualClock::new(T1)));

    let err = service.publish_article("", "Body").unwrap_err();
    assert!(matches!(
        err,
        StoreError::Validation(ValidationError::EmptyField {
            entity: "article",
            field: "title"
        })
    ));
    assert!(!service.store().tracker().has_changes());

    let published = service.publish_article("Valid", "Body").unwrap();
    assert_eq!(published.title, "Valid");
    assert_eq!(published.audit.created_by.as_deref(), Some("alice"));
}

#[test]
fn rejected_edit_keeps_the_committed_article() {
    let actor = Arc::new(ManualActor::new(Some("alice")));
    let clock = Arc::new(ManualClock::new(T1));
    let mut service = service_with(actor.clone(), clock.clone());
    let published = service.publish_article("Hello", "First post").unwrap();

    actor.set(Some("bob"));
    clock.set(T2);
    let err = service
        .edit_article(published.id, "Hello", "   ")
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
    assert!(!service.store().tracker().has_changes());

    let current = service.get_article(published.id).unwrap().unwrap();
    assert_eq!(current, published);

    let comment = service.add_comment(published.id, "Still works").unwrap();
    assert_eq!(comment.audit.created_by.as_deref(), Some("bob"));
    let edited = service
        .edit_article(published.id, "Hello", "Second try")
        .unwrap();
    assert_eq!(edited.content, "Second try");
    assert_eq!(edited.audit.modified_by.as_deref(), Some("bob"));
    assert_eq!(edited.audit.modified_on, Some(T2));
}
