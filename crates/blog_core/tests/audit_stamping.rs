use blog_core::db::open_db_in_memory;
use blog_core::{
    AnonymousActor, Article, AuditFields, AuditInterceptor, BlogStore, CancellationToken, Clock,
    Comment, CurrentActor, EntityState, ManualActor, ManualClock, ProviderError, StoreError, User,
};
use rusqlite::params;
use std::sync::Arc;

const T1: i64 = 1_700_000_000_000;
const T2: i64 = 1_700_000_360_000;

struct FailingActor;

impl CurrentActor for FailingActor {
    fn actor_id(&self) -> Result<Option<String>, ProviderError> {
        Err(ProviderError::new("current_actor", "session expired"))
    }
}

fn store_with(actor: Arc<dyn CurrentActor>, clock: Arc<dyn Clock>) -> BlogStore {
    BlogStore::new(open_db_in_memory().unwrap(), actor, clock).unwrap()
}

fn persisted_audit(store: &BlogStore, table: &str, id: &str) -> AuditFields {
    store
        .connection()
        .query_row(
            &format!(
                "SELECT created_by, created_on, modified_by, modified_on FROM {table} WHERE id = ?1;"
            ),
            params![id],
            |row| {
                Ok(AuditFields {
                    created_by: row.get(0)?,
                    created_on: row.get(1)?,
                    modified_by: row.get(2)?,
                    modified_on: row.get(3)?,
                })
            },
        )
        .unwrap()
}

#[test]
fn alice_creates_then_bob_modifies() {
    let actor = Arc::new(ManualActor::new(Some("alice")));
    let clock = Arc::new(ManualClock::new(T1));
    let mut store = store_with(actor.clone(), clock.clone());
    let cancel = CancellationToken::new();

    let key = store.add(Article::new("Hello", "First post"));
    assert_eq!(store.commit_blocking(&cancel).unwrap(), 1);

    let created = store.get::<Article>(key).unwrap().clone();
    assert_eq!(created.audit.created_by.as_deref(), Some("alice"));
    assert_eq!(created.audit.created_on, T1);
    assert_eq!(created.audit.modified_by, None);
    assert_eq!(created.audit.modified_on, None);

    actor.set(Some("bob"));
    clock.set(T2);
    store.get_mut::<Article>(key).unwrap().content = "First post, edited".to_string();
    assert_eq!(store.state(key), Some(EntityState::Modified));
    assert_eq!(store.commit_blocking(&cancel).unwrap(), 1);

    let edited = store.get::<Article>(key).unwrap();
    assert_eq!(edited.audit.created_by.as_deref(), Some("alice"));
    assert_eq!(edited.audit.created_on, T1);
    assert_eq!(edited.audit.modified_by.as_deref(), Some("bob"));
    assert_eq!(edited.audit.modified_on, Some(T2));

    let stored = persisted_audit(&store, "articles", &created.id.to_string());
    assert_eq!(&stored, &edited.audit);
}

#[test]
fn anonymous_create_stamps_time_but_not_actor() {
    let clock = Arc::new(ManualClock::new(T1));
    let mut store = store_with(Arc::new(AnonymousActor), clock);

    let key = store.add(Article::new("System notice", "Maintenance tonight"));
    store.commit_blocking(&CancellationToken::new()).unwrap();

    let article = store.get::<Article>(key).unwrap();
    assert_eq!(article.audit.created_by, None);
    assert_eq!(article.audit.created_on, T1);

    let stored = persisted_audit(&store, "articles", &article.id.to_string());
    assert_eq!(stored.created_by, None);
    assert_eq!(stored.created_on, T1);
}

#[test]
fn preset_created_by_is_kept() {
    let actor = Arc::new(ManualActor::new(Some("importer")));
    let mut store = store_with(actor, Arc::new(ManualClock::new(T1)));

    let mut article = Article::new("Imported", "From the old blog");
    article.audit.created_by = Some("original-author".to_string());
    let key = store.add(article);
    store.commit_blocking(&CancellationToken::new()).unwrap();

    let article = store.get::<Article>(key).unwrap();
    assert_eq!(article.audit.created_by.as_deref(), Some("original-author"));
    assert_eq!(article.audit.created_on, T1);
}

#[test]
fn every_entity_in_one_commit_shares_the_clock_reading() {
    let mut store = store_with(
        Arc::new(ManualActor::new(Some("alice"))),
        Arc::new(ManualClock::new(T1)),
    );

    let article = Article::new("Post", "Body");
    let article_id = article.id;
    let article_key = store.add(article);
    let comment_key = store.add(Comment::new(article_id, "First!"));
    assert_eq!(store.commit_blocking(&CancellationToken::new()).unwrap(), 2);

    assert_eq!(store.get::<Article>(article_key).unwrap().audit.created_on, T1);
    let comment = store.get::<Comment>(comment_key).unwrap();
    assert_eq!(comment.audit.created_on, T1);
    assert_eq!(comment.audit.created_by.as_deref(), Some("alice"));
}

#[test]
fn unchanged_and_deleted_entities_keep_their_provenance() {
    let actor = Arc::new(ManualActor::new(Some("alice")));
    let clock = Arc::new(ManualClock::new(T1));
    let mut store = store_with(actor.clone(), clock.clone());
    let cancel = CancellationToken::new();

    let kept_key = store.add(Article::new("Kept", "Body"));
    let deleted_key = store.add(Article::new("Deleted", "Body"));
    store.commit_blocking(&cancel).unwrap();
    let kept_before = store.get::<Article>(kept_key).unwrap().audit.clone();
    let deleted_before = store.get::<Article>(deleted_key).unwrap().clone();

    actor.set(Some("bob"));
    clock.set(T2);
    store.remove(deleted_key);
    let trigger = store.add(Article::new("Trigger", "Forces a stamping pass"));

    let summary = AuditInterceptor::new(actor.as_ref(), clock.as_ref())
        .apply(&mut store.identity_mut().tracker_mut().auditable_changes())
        .unwrap();
    assert_eq!(summary.created, 1);
    assert_eq!(summary.modified, 0);
    assert_eq!(store.get::<Article>(deleted_key).unwrap(), &deleted_before);

    assert_eq!(store.commit_blocking(&cancel).unwrap(), 2);

    assert_eq!(store.get::<Article>(kept_key).unwrap().audit, kept_before);
    assert_eq!(
        store.get::<Article>(trigger).unwrap().audit.created_by.as_deref(),
        Some("bob")
    );
    assert_eq!(store.state(deleted_key), None);

    let remaining: i64 = store
        .connection()
        .query_row(
            "SELECT COUNT(*) FROM articles WHERE id = ?1;",
            params![deleted_before.id.to_string()],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(remaining, 0);
}

#[test]
fn non_auditable_users_are_never_stamped() {
    let actor = Arc::new(ManualActor::new(Some("alice")));
    let mut store = store_with(actor, Arc::new(ManualClock::new(T1)));
    let cancel = CancellationToken::new();

    let user_key = store.add(User::new("u-1", "Alice"));
    store.add(Article::new("Post", "Body"));
    assert_eq!(store.commit_blocking(&cancel).unwrap(), 2);

    store.get_mut::<User>(user_key).unwrap().email = Some("alice@example.com".to_string());
    assert_eq!(store.commit_blocking(&cancel).unwrap(), 1);

    assert_eq!(store.identity_mut().find_user("u-1").unwrap(), Some(user_key));
    let user = store.get::<User>(user_key).unwrap();
    assert_eq!(user, &{
        let mut expected = User::new("u-1", "Alice");
        expected.email = Some("alice@example.com".to_string());
        expected
    });
}

#[test]
fn provider_failure_aborts_commit_before_any_write() {
    let mut store = store_with(Arc::new(FailingActor), Arc::new(ManualClock::new(T1)));

    let key = store.add(Article::new("Never saved", "Body"));
    let err = store.commit_blocking(&CancellationToken::new()).unwrap_err();

    assert!(matches!(err, StoreError::Provider(ref provider) if provider.provider == "current_actor"));
    assert_eq!(store.state(key), Some(EntityState::Added));
    assert_eq!(store.get::<Article>(key).unwrap().audit, AuditFields::default());

    let count: i64 = store
        .connection()
        .query_row("SELECT COUNT(*) FROM articles;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn provider_is_not_consulted_when_nothing_is_pending() {
    let mut store = store_with(Arc::new(FailingActor), Arc::new(ManualClock::new(T1)));

    assert_eq!(store.commit_blocking(&CancellationToken::new()).unwrap(), 0);
}
