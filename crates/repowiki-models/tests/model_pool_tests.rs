mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use chrono::{Duration, Utc};
use common::{credential, MockFactory, MockStore, StaticBackend};
use pretty_assertions::assert_eq;
use repowiki_models::ModelPool;
use repowiki_types::{CredentialStatus, ModelError};

fn pool_with(store: MockStore, factory: MockFactory) -> (Arc<ModelPool>, Arc<MockStore>, Arc<MockFactory>) {
    let store = Arc::new(store);
    let factory = Arc::new(factory);
    let pool = Arc::new(ModelPool::new(
        Arc::clone(&store) as _,
        Arc::clone(&factory) as _,
        Arc::new(StaticBackend::new("default")),
    ));
    (pool, store, factory)
}

#[tokio::test]
async fn test_empty_name_returns_default_without_store_lookup() {
    let (pool, store, _) = pool_with(MockStore::new(vec![]), MockFactory::new());

    let backend = pool.get_model("").await.unwrap();
    assert_eq!(backend.name(), "default");
    assert_eq!(store.lookups.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unknown_name_is_api_key_not_found() {
    let (pool, _, _) = pool_with(MockStore::new(vec![]), MockFactory::new());

    let err = pool.get_model("missing").await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ModelError>(),
        Some(ModelError::ApiKeyNotFound(name)) if name == "missing"
    ));
}

#[tokio::test]
async fn test_cooling_down_credential_is_unavailable() {
    let mut cred = credential(1, "kimi");
    cred.status = CredentialStatus::Unavailable;
    cred.cooldown_until = Some(Utc::now() + Duration::minutes(5));
    let (pool, _, factory) = pool_with(MockStore::new(vec![cred]), MockFactory::new());

    let err = pool.get_model("kimi").await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ModelError>(),
        Some(ModelError::ModelUnavailable(name)) if name == "kimi"
    ));
    assert_eq!(factory.created_count(), 0);
}

#[tokio::test]
async fn test_expired_cooldown_resolves_again() {
    let mut cred = credential(1, "kimi");
    cred.status = CredentialStatus::Unavailable;
    cred.cooldown_until = Some(Utc::now() - Duration::minutes(5));
    let (pool, _, _) = pool_with(MockStore::new(vec![cred]), MockFactory::new());

    let backend = pool.get_model("kimi").await.unwrap();
    assert_eq!(backend.name(), "kimi");
}

#[tokio::test]
async fn test_get_model_caches_the_instance() {
    let (pool, _, factory) =
        pool_with(MockStore::new(vec![credential(1, "kimi")]), MockFactory::new());

    pool.get_model("kimi").await.unwrap();
    pool.get_model("kimi").await.unwrap();
    assert_eq!(factory.created_count(), 1);
}

#[tokio::test]
async fn test_pool_preserves_order_and_skips_unavailable() {
    let mut second = credential(2, "glm");
    second.status = CredentialStatus::Disabled;
    let store =
        MockStore::new(vec![credential(1, "kimi"), second, credential(3, "qwen")]);
    let (pool, _, _) = pool_with(store, MockFactory::new());

    let names =
        vec!["kimi".to_string(), "glm".to_string(), "qwen".to_string()];
    let models = pool.get_model_pool(&names).await.unwrap();
    let resolved: Vec<&str> = models.iter().map(|m| m.credential_name.as_str()).collect();
    assert_eq!(resolved, vec!["kimi", "qwen"]);
}

#[tokio::test]
async fn test_empty_name_list_resolves_every_credential() {
    let store = MockStore::new(vec![credential(1, "kimi"), credential(2, "glm")]);
    let (pool, _, _) = pool_with(store, MockFactory::new());

    let models = pool.get_model_pool(&[]).await.unwrap();
    assert_eq!(models.len(), 2);
}

#[tokio::test]
async fn test_mark_unavailable_persists_and_evicts() {
    let (pool, store, factory) = pool_with(
        MockStore::new(vec![credential(7, "kimi")]).without_applied_marks(),
        MockFactory::new(),
    );

    pool.get_model("kimi").await.unwrap();
    assert_eq!(factory.created_count(), 1);

    let reset_at = Utc::now() + Duration::minutes(2);
    pool.mark_model_unavailable("kimi", reset_at).await.unwrap();
    assert_eq!(store.marks.lock().as_slice(), &[(7, reset_at)]);

    // evicted, so the next resolve re-instantiates
    pool.get_model("kimi").await.unwrap();
    assert_eq!(factory.created_count(), 2);
}

#[tokio::test]
async fn test_get_next_model_walks_the_pool() {
    let store =
        MockStore::new(vec![credential(1, "kimi"), credential(2, "glm"), credential(3, "qwen")]);
    let (pool, _, _) = pool_with(store, MockFactory::new());

    let next = pool.get_next_model("kimi", &[]).await.unwrap();
    assert_eq!(next.credential_name, "glm");

    // unknown current starts over from the front
    let next = pool.get_next_model("deepseek", &[]).await.unwrap();
    assert_eq!(next.credential_name, "kimi");

    let err = pool.get_next_model("qwen", &[]).await.unwrap_err();
    assert!(matches!(err.downcast_ref::<ModelError>(), Some(ModelError::NoAvailableModel)));
}

#[tokio::test]
async fn test_record_request_skips_zero_id() {
    let (pool, store, _) = pool_with(MockStore::new(vec![]), MockFactory::new());

    pool.record_request(0, true).await;
    assert!(store.requests.lock().is_empty());

    pool.record_request(5, false).await;
    assert_eq!(store.requests.lock().as_slice(), &[(5, false)]);
}
