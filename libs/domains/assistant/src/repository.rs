use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::AssistantResult;
use crate::models::Thread;

/// Persistence for conversation threads
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ThreadStore: Send + Sync {
    async fn get(&self, id: &str) -> AssistantResult<Option<Thread>>;

    /// Insert or replace by id
    async fn save(&self, thread: Thread) -> AssistantResult<()>;
}

/// In-memory implementation of ThreadStore (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryThreadStore {
    threads: Arc<RwLock<HashMap<String, Thread>>>,
}

impl InMemoryThreadStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ThreadStore for InMemoryThreadStore {
    async fn get(&self, id: &str) -> AssistantResult<Option<Thread>> {
        Ok(self.threads.read().await.get(id).cloned())
    }

    async fn save(&self, thread: Thread) -> AssistantResult<()> {
        self.threads.write().await.insert(thread.id.clone(), thread);
        Ok(())
    }
}
