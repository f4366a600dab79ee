//! Concurrent callers racing on one session row

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::entities::TokenInfo;
use crate::domain::value_objects::RefreshOutcome;
use crate::errors::DomainResult;
use crate::repositories::MemoryStorage;
use crate::services::session::{SessionEngine, SessionEngineConfig};
use crate::services::token::sha256_hex;

use super::{engine, engine_with};

fn spawn_refresh(
    engine: &Arc<SessionEngine<MemoryStorage>>,
    id_refresh_token: &str,
    refresh_token: &str,
) -> tokio::task::JoinHandle<DomainResult<RefreshOutcome>> {
    let engine = Arc::clone(engine);
    let id_refresh_token = id_refresh_token.to_string();
    let refresh_token = refresh_token.to_string();
    tokio::spawn(async move {
        engine
            .refresh_session(Some(&id_refresh_token), Some(&refresh_token))
            .await
    })
}

fn new_refresh_token(outcome: RefreshOutcome) -> TokenInfo {
    match outcome {
        RefreshOutcome::Rotated { new_refresh_token, .. } => new_refresh_token,
        RefreshOutcome::TheftDetected { .. } => panic!("unexpected theft detection"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_refresh_with_pending_child_promotes_once() {
    let (engine, storage) = engine().await;
    let created = engine.create_new_session("u1", None, None).await.unwrap();
    let id = created.id_refresh_token.token.clone();
    let child = new_refresh_token(
        engine
            .refresh_session(Some(&id), Some(&created.refresh_token.token))
            .await
            .unwrap(),
    );

    storage.set_latency(Duration::from_millis(5));
    let first = spawn_refresh(&engine, &id, &child.token);
    let second = spawn_refresh(&engine, &id, &child.token);
    let first = new_refresh_token(first.await.unwrap().unwrap());
    let second = new_refresh_token(second.await.unwrap().unwrap());
    storage.set_latency(Duration::ZERO);

    let row = storage
        .session(&sha256_hex(&created.session.handle))
        .await
        .unwrap();
    assert_eq!(row.refresh_token_hash2, sha256_hex(&sha256_hex(&child.token)));

    // Only one grandchild can ever become current.
    assert!(!engine
        .refresh_session(Some(&id), Some(&first.token))
        .await
        .unwrap()
        .session_theft_detected());
    assert!(engine
        .refresh_session(Some(&id), Some(&second.token))
        .await
        .unwrap()
        .session_theft_detected());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_siblings_one_wins_one_is_theft() {
    let (engine, _) = engine().await;
    let created = engine.create_new_session("u1", None, None).await.unwrap();
    let id = created.id_refresh_token.token.clone();

    let siblings = [
        spawn_refresh(&engine, &id, &created.refresh_token.token),
        spawn_refresh(&engine, &id, &created.refresh_token.token),
    ];
    let mut children = Vec::new();
    for handle in siblings {
        children.push(new_refresh_token(handle.await.unwrap().unwrap()));
    }
    assert_ne!(children[0].token, children[1].token);

    let racers = [
        spawn_refresh(&engine, &id, &children[0].token),
        spawn_refresh(&engine, &id, &children[1].token),
    ];
    let mut thefts = 0;
    for handle in racers {
        if handle.await.unwrap().unwrap().session_theft_detected() {
            thefts += 1;
        }
    }
    assert_eq!(thefts, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_get_session_with_same_child_access_token() {
    let (engine, storage) = engine().await;
    let created = engine.create_new_session("u1", None, None).await.unwrap();
    let id = created.id_refresh_token.token.clone();
    let (child_access, child_refresh) = match engine
        .refresh_session(Some(&id), Some(&created.refresh_token.token))
        .await
        .unwrap()
    {
        RefreshOutcome::Rotated {
            new_access_token,
            new_refresh_token,
            ..
        } => (new_access_token, new_refresh_token),
        RefreshOutcome::TheftDetected { .. } => panic!("unexpected theft detection"),
    };

    storage.set_latency(Duration::from_millis(5));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let id = id.clone();
            let access = child_access.token.clone();
            tokio::spawn(async move { engine.get_session(Some(&id), Some(&access)).await })
        })
        .collect();
    for handle in handles {
        let verified = handle.await.unwrap().unwrap();
        assert!(verified.new_access_token.is_some());
    }
    storage.set_latency(Duration::ZERO);

    let row = storage
        .session(&sha256_hex(&created.session.handle))
        .await
        .unwrap();
    assert_eq!(row.refresh_token_hash2, sha256_hex(&sha256_hex(&child_refresh.token)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_use_creates_each_key_once() {
    let (engine, storage) = engine().await;

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move {
                engine
                    .create_new_session(&format!("user-{}", i % 3), None, None)
                    .await
            })
        })
        .collect();

    let mut session_handles = HashSet::new();
    for handle in handles {
        let created = handle.await.unwrap().unwrap();
        session_handles.insert(created.session.handle);
    }

    assert_eq!(session_handles.len(), 10);
    assert_eq!(storage.session_count().await, 10);
    assert_eq!(storage.key_inserts(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_deadline_destroys_connection() {
    let (engine, storage) = engine_with(
        SessionEngineConfig::default().with_operation_timeout(Duration::from_millis(200)),
    )
    .await;
    let created = engine.create_new_session("u1", None, None).await.unwrap();
    let id = created.id_refresh_token.token.clone();
    assert_eq!(storage.destroyed_connections(), 0);

    // Two round trips of 150ms cannot fit the 200ms deadline.
    storage.set_latency(Duration::from_millis(150));
    let err = engine
        .refresh_session(Some(&id), Some(&created.refresh_token.token))
        .await
        .unwrap_err();
    assert!(err.is_general());
    assert_eq!(storage.destroyed_connections(), 1);

    storage.set_latency(Duration::ZERO);
    let outcome = engine
        .refresh_session(Some(&id), Some(&created.refresh_token.token))
        .await
        .unwrap();
    assert!(!outcome.session_theft_detected());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancelled_key_commit_is_not_served_from_cache() {
    let (first, storage) = engine_with(
        SessionEngineConfig::default().with_operation_timeout(Duration::from_millis(350)),
    )
    .await;

    // The deadline fires while the new access key is being committed.
    storage.set_latency(Duration::from_millis(100));
    let err = first.create_new_session("u1", None, None).await.unwrap_err();
    assert!(err.is_general());
    assert!(storage.signing_key("access_token_signing_key").await.is_none());

    storage.set_latency(Duration::ZERO);
    let created = first.create_new_session("u1", None, None).await.unwrap();
    let id = created.id_refresh_token.token.clone();

    let second = SessionEngine::new(Arc::new(storage.clone()), SessionEngineConfig::default());
    second.init().await.unwrap();
    let verified = second
        .get_session(Some(&id), Some(&created.access_token.token))
        .await
        .unwrap();
    assert_eq!(verified.session.handle, created.session.handle);

    let outcome = second
        .refresh_session(Some(&id), Some(&created.refresh_token.token))
        .await
        .unwrap();
    assert!(!outcome.session_theft_detected());
}
