use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::embedding::cosine_similarity;
use crate::error::{EventError, EventResult};
use crate::models::{ChatMessage, Event, EventFilter, ScoredEvent};

/// Repository trait for Event persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn create(&self, event: Event) -> EventResult<Event>;

    async fn get_by_id(&self, id: Uuid) -> EventResult<Option<Event>>;

    /// Whether another event (not `except`) already uses this exact name
    async fn name_exists(&self, name: &str, except: Option<Uuid>) -> EventResult<bool>;

    /// One page of events, newest first
    async fn list(&self, filter: EventFilter) -> EventResult<Vec<Event>>;

    async fn count(&self, filter: EventFilter) -> EventResult<u64>;

    /// Replace a stored event; `NotFound` if it is gone
    async fn update(&self, event: Event) -> EventResult<Event>;

    async fn delete(&self, id: Uuid) -> EventResult<bool>;

    /// Append to the chat log; `false` when the event does not exist
    async fn push_message(&self, id: Uuid, message: ChatMessage) -> EventResult<bool>;

    /// Events whose summary embedding is closest to `embedding`, best first
    async fn search_similar(
        &self,
        embedding: Vec<f32>,
        limit: usize,
    ) -> EventResult<Vec<ScoredEvent>>;
}

/// In-memory implementation of EventRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryEventRepository {
    events: Arc<RwLock<HashMap<Uuid, Event>>>,
}

impl InMemoryEventRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn sorted(mut events: Vec<Event>) -> Vec<Event> {
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        events
    }
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn create(&self, event: Event) -> EventResult<Event> {
        let mut events = self.events.write().await;
        if events.values().any(|e| e.name == event.name) {
            return Err(EventError::DuplicateName);
        }
        events.insert(event.id, event.clone());
        tracing::info!(event_id = %event.id, "Created event");
        Ok(event)
    }

    async fn get_by_id(&self, id: Uuid) -> EventResult<Option<Event>> {
        Ok(self.events.read().await.get(&id).cloned())
    }

    async fn name_exists(&self, name: &str, except: Option<Uuid>) -> EventResult<bool> {
        Ok(self
            .events
            .read()
            .await
            .values()
            .any(|e| e.name == name && Some(e.id) != except))
    }

    async fn list(&self, filter: EventFilter) -> EventResult<Vec<Event>> {
        let events = self.events.read().await;
        let matching = events
            .values()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();

        Ok(Self::sorted(matching)
            .into_iter()
            .skip(filter.skip() as usize)
            .take(filter.limit as usize)
            .collect())
    }

    async fn count(&self, filter: EventFilter) -> EventResult<u64> {
        let events = self.events.read().await;
        Ok(events.values().filter(|e| filter.matches(e)).count() as u64)
    }

    async fn update(&self, event: Event) -> EventResult<Event> {
        let mut events = self.events.write().await;
        if !events.contains_key(&event.id) {
            return Err(EventError::NotFound(event.id));
        }
        if events
            .values()
            .any(|e| e.name == event.name && e.id != event.id)
        {
            return Err(EventError::DuplicateName);
        }
        events.insert(event.id, event.clone());
        Ok(event)
    }

    async fn delete(&self, id: Uuid) -> EventResult<bool> {
        Ok(self.events.write().await.remove(&id).is_some())
    }

    async fn push_message(&self, id: Uuid, message: ChatMessage) -> EventResult<bool> {
        let mut events = self.events.write().await;
        match events.get_mut(&id) {
            Some(event) => {
                event.messages.push(message);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn search_similar(
        &self,
        embedding: Vec<f32>,
        limit: usize,
    ) -> EventResult<Vec<ScoredEvent>> {
        let events = self.events.read().await;
        let mut scored: Vec<ScoredEvent> = events
            .values()
            .filter(|e| !e.summary_embedding.is_empty())
            .map(|e| ScoredEvent {
                score: cosine_similarity(&embedding, &e.summary_embedding),
                event: e.clone(),
            })
            .collect();
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(limit);
        Ok(scored)
    }
}
