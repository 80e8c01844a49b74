//! Contract-parity suite: both backends must expose identical observable
//! semantics for every operation, so each scenario runs against the JSON
//! document store and the SQLite store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use memoir_cache::{BoxError, CacheError, CacheStore, JsonStore, SqliteStore};
use serde::{Deserialize, Serialize};

fn json_store(dir: &tempfile::TempDir) -> Arc<JsonStore> {
    Arc::new(JsonStore::new(dir.path().join("cache.json")))
}

fn sqlite_store() -> Arc<SqliteStore> {
    Arc::new(SqliteStore::in_memory().unwrap())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct User {
    id: i64,
    name: String,
}

async fn direct_interface_lifecycle<S: CacheStore>(store: &S) {
    let user = User {
        id: 1,
        name: "User 1".to_string(),
    };
    store.set("user:1", &user).await.unwrap();
    assert_eq!(store.get::<User>("user:1").await.unwrap(), Some(user));

    store.delete("user:1").await.unwrap();
    assert_eq!(store.get::<User>("user:1").await.unwrap(), None);
    assert!(!store.has("user:1").await.unwrap());
}

async fn clear_empties_the_store<S: CacheStore>(store: &S) {
    store.set("key1:1", &"value1").await.unwrap();
    store.set("key2:1", &"value2").await.unwrap();

    store.clear().await.unwrap();
    assert!(!store.has("key1:1").await.unwrap());
    assert!(!store.has("key2:1").await.unwrap());
}

async fn fallback_runs_exactly_once<S: CacheStore>(store: &S) {
    let calls = Arc::new(AtomicUsize::new(0));

    for _ in 0..3 {
        let calls = Arc::clone(&calls);
        let value: String = store
            .get_with_fallback(
                "fallback:1",
                move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, BoxError>("fallback value".to_string())
                },
                None,
            )
            .await
            .unwrap();
        assert_eq!(value, "fallback value");
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

async fn fallback_joins_separate_version<S: CacheStore>(store: &S) {
    let value: String = store
        .get_with_fallback(
            "joined",
            || async { Ok::<_, BoxError>("v2".to_string()) },
            Some("2"),
        )
        .await
        .unwrap();
    assert_eq!(value, "v2");
    assert_eq!(
        store.get::<String>("joined:2").await.unwrap().as_deref(),
        Some("v2")
    );
}

async fn fallback_cleans_up_old_versions<S: CacheStore>(store: &S) {
    store.set("test:1", &"old version").await.unwrap();

    let value: String = store
        .get_with_fallback(
            "test:2",
            || async { Ok::<_, BoxError>("new version".to_string()) },
            None,
        )
        .await
        .unwrap();

    assert_eq!(value, "new version");
    assert!(!store.has("test:1").await.unwrap());
    assert_eq!(
        store.get::<String>("test:2").await.unwrap().as_deref(),
        Some("new version")
    );
}

async fn invalid_key_fails_before_fallback<S: CacheStore>(store: &S) {
    let calls = Arc::new(AtomicUsize::new(0));
    let err = {
        let calls = Arc::clone(&calls);
        store
            .get_with_fallback::<String, _, _>(
                "invalid-key",
                move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, BoxError>("value".to_string())
                },
                None,
            )
            .await
            .unwrap_err()
    };
    assert!(matches!(err, CacheError::InvalidKey { .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

async fn fallback_failure_persists_nothing<S: CacheStore>(store: &S) {
    let err = store
        .get_with_fallback::<String, _, _>(
            "failing:1",
            || async { Err::<String, BoxError>("downstream failure".into()) },
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CacheError::Fallback(_)));
    assert!(!store.has("failing:1").await.unwrap());
}

async fn wrap_memoizes_per_arguments<S: CacheStore>(store: Arc<S>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let greet = {
        let calls = Arc::clone(&calls);
        store
            .wrap(
                "greet",
                move |(name, age): (String, u32)| {
                    let calls = Arc::clone(&calls);
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok::<_, BoxError>(format!("Hello {name}, you are {age} years old"))
                    }
                },
                Some("1"),
            )
            .unwrap()
    };

    let first: String = greet.call(("Alice".to_string(), 30)).await.unwrap();
    assert_eq!(first, "Hello Alice, you are 30 years old");
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // Identical arguments hit the cache.
    let second: String = greet.call(("Alice".to_string(), 30)).await.unwrap();
    assert_eq!(second, first);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // Different arguments compute and store an independent entry.
    let third: String = greet.call(("Bob".to_string(), 25)).await.unwrap();
    assert_eq!(third, "Hello Bob, you are 25 years old");
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let again: String = greet.call(("Alice".to_string(), 30)).await.unwrap();
    assert_eq!(again, first);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

async fn wrap_handles_complex_return_types<S: CacheStore>(store: Arc<S>) {
    let get_user = store
        .wrap(
            "user",
            |(id,): (i64,)| async move {
                Ok::<_, BoxError>(User {
                    id,
                    name: format!("User {id}"),
                })
            },
            Some("1"),
        )
        .unwrap();

    let expected = User {
        id: 1,
        name: "User 1".to_string(),
    };
    assert_eq!(get_user.call((1,)).await.unwrap(), expected);
    assert_eq!(get_user.call((1,)).await.unwrap(), expected);
}

async fn wrap_rejects_unversioned_name<S: CacheStore>(store: Arc<S>) {
    let err = store
        .wrap(
            "plain",
            |_: ()| async move { Ok::<_, BoxError>(0u32) },
            None,
        )
        .unwrap_err();
    assert!(matches!(err, CacheError::InvalidKey { key } if key == "plain"));
}

async fn wrap_cleans_up_old_versions<S: CacheStore>(store: Arc<S>) {
    store.set("fam:1", &"old").await.unwrap();

    let bumped = Arc::clone(&store)
        .wrap(
            "fam",
            |_: ()| async move { Ok::<_, BoxError>("fresh".to_string()) },
            Some("2"),
        )
        .unwrap();
    let value: String = bumped.call(()).await.unwrap();

    assert_eq!(value, "fresh");
    assert!(!store.has("fam:1").await.unwrap());

    // The new entry survives cleanup and keeps serving hits.
    let value: String = bumped.call(()).await.unwrap();
    assert_eq!(value, "fresh");
}

#[tokio::test]
async fn json_direct_interface_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    direct_interface_lifecycle(json_store(&dir).as_ref()).await;
}

#[tokio::test]
async fn sqlite_direct_interface_lifecycle() {
    direct_interface_lifecycle(sqlite_store().as_ref()).await;
}

#[tokio::test]
async fn json_clear_empties_the_store() {
    let dir = tempfile::tempdir().unwrap();
    clear_empties_the_store(json_store(&dir).as_ref()).await;
}

#[tokio::test]
async fn sqlite_clear_empties_the_store() {
    clear_empties_the_store(sqlite_store().as_ref()).await;
}

#[tokio::test]
async fn json_fallback_runs_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    fallback_runs_exactly_once(json_store(&dir).as_ref()).await;
}

#[tokio::test]
async fn sqlite_fallback_runs_exactly_once() {
    fallback_runs_exactly_once(sqlite_store().as_ref()).await;
}

#[tokio::test]
async fn json_fallback_joins_separate_version() {
    let dir = tempfile::tempdir().unwrap();
    fallback_joins_separate_version(json_store(&dir).as_ref()).await;
}

#[tokio::test]
async fn sqlite_fallback_joins_separate_version() {
    fallback_joins_separate_version(sqlite_store().as_ref()).await;
}

#[tokio::test]
async fn json_fallback_cleans_up_old_versions() {
    let dir = tempfile::tempdir().unwrap();
    fallback_cleans_up_old_versions(json_store(&dir).as_ref()).await;
}

#[tokio::test]
async fn sqlite_fallback_cleans_up_old_versions() {
    fallback_cleans_up_old_versions(sqlite_store().as_ref()).await;
}

#[tokio::test]
async fn json_invalid_key_fails_before_fallback() {
    let dir = tempfile::tempdir().unwrap();
    invalid_key_fails_before_fallback(json_store(&dir).as_ref()).await;
}

#[tokio::test]
async fn sqlite_invalid_key_fails_before_fallback() {
    invalid_key_fails_before_fallback(sqlite_store().as_ref()).await;
}

#[tokio::test]
async fn json_fallback_failure_persists_nothing() {
    let dir = tempfile::tempdir().unwrap();
    fallback_failure_persists_nothing(json_store(&dir).as_ref()).await;
}

#[tokio::test]
async fn sqlite_fallback_failure_persists_nothing() {
    fallback_failure_persists_nothing(sqlite_store().as_ref()).await;
}

#[tokio::test]
async fn json_wrap_memoizes_per_arguments() {
    let dir = tempfile::tempdir().unwrap();
    wrap_memoizes_per_arguments(json_store(&dir)).await;
}

#[tokio::test]
async fn sqlite_wrap_memoizes_per_arguments() {
    wrap_memoizes_per_arguments(sqlite_store()).await;
}

#[tokio::test]
async fn json_wrap_handles_complex_return_types() {
    let dir = tempfile::tempdir().unwrap();
    wrap_handles_complex_return_types(json_store(&dir)).await;
}

#[tokio::test]
async fn sqlite_wrap_handles_complex_return_types() {
    wrap_handles_complex_return_types(sqlite_store()).await;
}

#[tokio::test]
async fn json_wrap_rejects_unversioned_name() {
    let dir = tempfile::tempdir().unwrap();
    wrap_rejects_unversioned_name(json_store(&dir)).await;
}

#[tokio::test]
async fn sqlite_wrap_rejects_unversioned_name() {
    wrap_rejects_unversioned_name(sqlite_store()).await;
}

#[tokio::test]
async fn json_wrap_cleans_up_old_versions() {
    let dir = tempfile::tempdir().unwrap();
    wrap_cleans_up_old_versions(json_store(&dir)).await;
}

#[tokio::test]
async fn sqlite_wrap_cleans_up_old_versions() {
    wrap_cleans_up_old_versions(sqlite_store()).await;
}

#[tokio::test]
async fn json_wrap_persists_across_store_instances() {
    let dir = tempfile::tempdir().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));

    let make_fn = |calls: Arc<AtomicUsize>| {
        move |(n,): (u32,)| {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, BoxError>(n * 2)
            }
        }
    };

    let double = json_store(&dir)
        .wrap("double", make_fn(Arc::clone(&calls)), Some("0"))
        .unwrap();
    assert_eq!(double.call((21,)).await.unwrap(), 42);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // A fresh store over the same file serves the persisted entry.
    let double = json_store(&dir)
        .wrap("double", make_fn(Arc::clone(&calls)), Some("0"))
        .unwrap();
    assert_eq!(double.call((21,)).await.unwrap(), 42);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn sqlite_wrap_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.db");
    let calls = Arc::new(AtomicUsize::new(0));

    let make_fn = |calls: Arc<AtomicUsize>| {
        move |(n,): (u32,)| {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, BoxError>(n * 2)
            }
        }
    };

    {
        let store = Arc::new(SqliteStore::open(&path).unwrap());
        let double = store.wrap("double", make_fn(Arc::clone(&calls)), Some("0")).unwrap();
        assert_eq!(double.call((21,)).await.unwrap(), 42);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let store = Arc::new(SqliteStore::open(&path).unwrap());
    let double = store.wrap("double", make_fn(Arc::clone(&calls)), Some("0")).unwrap();
    assert_eq!(double.call((21,)).await.unwrap(), 42);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
