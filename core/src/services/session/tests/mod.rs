mod concurrency_tests;

use std::sync::Arc;

use crate::repositories::MemoryStorage;
use crate::services::session::{SessionEngine, SessionEngineConfig};

/// Engine over a fresh in-memory store, already initialised
async fn engine_with(config: SessionEngineConfig) -> (Arc<SessionEngine<MemoryStorage>>, MemoryStorage) {
    let storage = MemoryStorage::new();
    let engine = SessionEngine::new(Arc::new(storage.clone()), config);
    engine.init().await.unwrap();
    (Arc::new(engine), storage)
}

async fn engine() -> (Arc<SessionEngine<MemoryStorage>>, MemoryStorage) {
    engine_with(SessionEngineConfig::default()).await
}
