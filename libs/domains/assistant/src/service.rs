//! Assistant Service - thread bookkeeping around the agent

use chrono::Utc;
use std::sync::Arc;
use tracing::instrument;

use crate::agent::Agent;
use crate::error::{AssistantError, AssistantResult};
use crate::models::{StartThreadResponse, Thread, ThreadMessage, ThreadReply};
use crate::repository::ThreadStore;

pub struct AssistantService<S: ThreadStore> {
    store: Arc<S>,
    agent: Arc<Agent>,
}

impl<S: ThreadStore> AssistantService<S> {
    pub fn new(store: S, agent: Agent) -> Self {
        Self {
            store: Arc::new(store),
            agent: Arc::new(agent),
        }
    }

    /// Opens a new thread with the first user message
    #[instrument(skip(self, message))]
    pub async fn start_thread(&self, message: Option<String>) -> AssistantResult<StartThreadResponse> {
        let message = required(message)?;
        let mut thread = Thread::new();
        tracing::info!(thread_id = %thread.id, "Starting thread");

        let response = self.turn(&mut thread, message).await?;
        Ok(StartThreadResponse {
            thread_id: thread.id,
            response,
        })
    }

    #[instrument(skip(self, message))]
    pub async fn continue_thread(
        &self,
        thread_id: &str,
        message: Option<String>,
    ) -> AssistantResult<ThreadReply> {
        let message = required(message)?;
        let mut thread = self
            .store
            .get(thread_id)
            .await?
            .ok_or_else(|| AssistantError::ThreadNotFound(thread_id.to_string()))?;

        let response = self.turn(&mut thread, message).await?;
        Ok(ThreadReply { response })
    }

    async fn turn(&self, thread: &mut Thread, message: String) -> AssistantResult<String> {
        thread.messages.push(ThreadMessage::user(message));
        let response = self.agent.respond(&mut thread.messages).await?;

        thread.updated_at = Utc::now();
        self.store.save(thread.clone()).await?;
        Ok(response)
    }
}

impl<S: ThreadStore> Clone for AssistantService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            agent: Arc::clone(&self.agent),
        }
    }
}

fn required(message: Option<String>) -> AssistantResult<String> {
    match message {
        Some(m) if !m.trim().is_empty() => Ok(m),
        _ => Err(AssistantError::EmptyMessage),
    }
}
