//! Tool-calling loop as an explicit state machine
//!
//! ```text
//! Thinking ──tool calls──► AwaitingToolResult ──results──► Thinking
//!    │
//!    └──text reply──► Done
//! ```
//!
//! Every model call and every tool round costs one step. When the budget
//! runs out the agent answers with [`FALLBACK_REPLY`].

use chrono::Utc;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::instrument;

use crate::error::AssistantResult;
use crate::model::ChatModel;
use crate::models::{ThreadMessage, ToolCall};
use crate::prompts::{FALLBACK_REPLY, final_response, system_prompt};
use crate::tools::ToolRegistry;

pub const MAX_STEPS: usize = 15;

const BUDGET_EXHAUSTED: &str = "Step budget exhausted before this tool could run";

#[derive(Debug, Clone, PartialEq)]
pub enum AgentState {
    Thinking,
    AwaitingToolResult(Vec<ToolCall>),
    Done(String),
}

pub struct Agent {
    model: Arc<dyn ChatModel>,
    tools: Arc<ToolRegistry>,
    max_steps: usize,
}

impl Agent {
    pub fn new(model: Arc<dyn ChatModel>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            model,
            tools,
            max_steps: MAX_STEPS,
        }
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Drives the conversation until the model answers.
    ///
    /// `history` must end with the user's latest message; every message the
    /// turn produces is appended to it. The system prompt is never stored.
    #[instrument(skip_all, fields(history = history.len()))]
    pub async fn respond(&self, history: &mut Vec<ThreadMessage>) -> AssistantResult<String> {
        let mut state = AgentState::Thinking;
        let mut steps = 0;

        loop {
            state = match state {
                AgentState::Done(reply) => {
                    tracing::info!(steps, "Agent finished");
                    return Ok(reply);
                }
                pending if steps >= self.max_steps => {
                    tracing::warn!(steps, "Agent step budget exhausted");
                    // A stored tool request must be followed by one result per call
                    if let AgentState::AwaitingToolResult(calls) = pending {
                        for call in calls {
                            history.push(ThreadMessage::tool_result(
                                call.id,
                                json!({ "status": "error", "message": BUDGET_EXHAUSTED })
                                    .to_string(),
                            ));
                        }
                    }
                    history.push(ThreadMessage::assistant(FALLBACK_REPLY));
                    return Ok(FALLBACK_REPLY.to_string());
                }
                AgentState::Thinking => {
                    steps += 1;
                    self.think(history).await?
                }
                AgentState::AwaitingToolResult(calls) => {
                    steps += 1;
                    for call in calls {
                        let output = self.invoke(&call).await;
                        history.push(ThreadMessage::tool_result(call.id, output));
                    }
                    AgentState::Thinking
                }
            };
        }
    }

    async fn think(&self, history: &mut Vec<ThreadMessage>) -> AssistantResult<AgentState> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(ThreadMessage::system(system_prompt(
            &self.tools.names(),
            Utc::now(),
        )));
        messages.extend(history.iter().cloned());

        let reply = self
            .model
            .complete(messages, self.tools.definitions())
            .await?;

        if reply.tool_calls.is_empty() {
            history.push(ThreadMessage::assistant(reply.content.clone()));
            let answer = final_response(&reply.content).unwrap_or_else(|| FALLBACK_REPLY.to_string());
            return Ok(AgentState::Done(answer));
        }

        tracing::debug!(
            tools = ?reply.tool_calls.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
            "Model requested tools"
        );
        history.push(ThreadMessage::tool_request(
            reply.content,
            reply.tool_calls.clone(),
        ));
        Ok(AgentState::AwaitingToolResult(reply.tool_calls))
    }

    /// Runs one tool call; failures become a JSON error the model can read.
    async fn invoke(&self, call: &ToolCall) -> String {
        let arguments = if call.arguments.trim().is_empty() {
            Value::Object(Default::default())
        } else {
            match serde_json::from_str(&call.arguments) {
                Ok(arguments) => arguments,
                Err(e) => {
                    return json!({
                        "status": "error",
                        "message": format!("Arguments for {} are not valid JSON: {e}", call.name),
                    })
                    .to_string();
                }
            }
        };

        match self.tools.execute(&call.name, arguments).await {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(tool = %call.name, error = %e, "Tool call failed");
                json!({ "status": "error", "message": e.to_string() }).to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AssistantError;
    use crate::model::{MockChatModel, ModelReply};
    use crate::models::MessageRole;
    use crate::tools::{EventLookupTool, MockEventSearch};
    use mockall::Sequence;

    fn call(id: &str, name: &str, arguments: &str) -> ToolCall {
        ToolCall {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    fn registry(search: MockEventSearch) -> Arc<ToolRegistry> {
        let mut tools = ToolRegistry::new();
        tools.register(EventLookupTool::new(Arc::new(search)));
        Arc::new(tools)
    }

    #[tokio::test]
    async fn test_direct_answer() {
        let mut model = MockChatModel::new();
        model
            .expect_complete()
            .withf(|messages, tools| {
                messages[0].role == MessageRole::System
                    && messages[1].content == "hi"
                    && tools.len() == 1
            })
            .times(1)
            .returning(|_, _| Ok(ModelReply::text("THOUGHT: greeting\n===\nHi, I'm Ebot 👋")));

        let agent = Agent::new(Arc::new(model), registry(MockEventSearch::new()));
        let mut history = vec![ThreadMessage::user("hi")];
        let reply = agent.respond(&mut history).await.unwrap();

        assert_eq!(reply, "Hi, I'm Ebot 👋");
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].role, MessageRole::Assistant);
    }

    #[tokio::test]
    async fn test_tool_round_trip() {
        let mut search = MockEventSearch::new();
        search
            .expect_search_events()
            .times(1)
            .returning(|_, _| Ok(vec![]));

        let mut seq = Sequence::new();
        let mut model = MockChatModel::new();
        model
            .expect_complete()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| {
                Ok(ModelReply {
                    content: String::new(),
                    tool_calls: vec![call("c1", "event_lookup", r#"{"query":"jazz"}"#)],
                })
            });
        model
            .expect_complete()
            .withf(|messages, _| {
                let last = messages.last().unwrap();
                last.role == MessageRole::Tool
                    && last.tool_call_id.as_deref() == Some("c1")
                    && last.content.contains("no_results")
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(ModelReply::text("===\nNothing in the database yet.")));

        let agent = Agent::new(Arc::new(model), registry(search));
        let mut history = vec![ThreadMessage::user("jazz?")];
        let reply = agent.respond(&mut history).await.unwrap();

        assert_eq!(reply, "Nothing in the database yet.");
        let roles: Vec<MessageRole> = history.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                MessageRole::User,
                MessageRole::Assistant,
                MessageRole::Tool,
                MessageRole::Assistant
            ]
        );
        assert_eq!(history[1].tool_calls.len(), 1);
    }

    #[tokio::test]
    async fn test_step_budget_falls_back() {
        let mut search = MockEventSearch::new();
        search.expect_search_events().returning(|_, _| Ok(vec![]));

        let mut model = MockChatModel::new();
        // Model and tool rounds alternate, so a budget of 5 allows 3 model calls
        model.expect_complete().times(3).returning(|_, _| {
            Ok(ModelReply {
                content: String::new(),
                tool_calls: vec![call("c", "event_lookup", r#"{"query":"x"}"#)],
            })
        });

        let agent = Agent::new(Arc::new(model), registry(search)).with_max_steps(5);
        let mut history = vec![ThreadMessage::user("loop forever")];
        let reply = agent.respond(&mut history).await.unwrap();

        assert_eq!(reply, FALLBACK_REPLY);
        assert_eq!(history.last().unwrap().content, FALLBACK_REPLY);

        // Every tool request in the stored history has its results
        for (i, message) in history.iter().enumerate() {
            for call in &message.tool_calls {
                let answered = history[i + 1..].iter().any(|m| {
                    m.role == MessageRole::Tool && m.tool_call_id.as_deref() == Some(call.id.as_str())
                });
                assert!(answered, "tool call {} at {i} has no result", call.id);
            }
        }
        let last_tool = history.iter().rev().find(|m| m.role == MessageRole::Tool).unwrap();
        assert!(last_tool.content.contains("Step budget exhausted"));
    }

    #[tokio::test]
    async fn test_bad_tool_calls_are_reported_to_model() {
        let mut seq = Sequence::new();
        let mut model = MockChatModel::new();
        model
            .expect_complete()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| {
                Ok(ModelReply {
                    content: String::new(),
                    tool_calls: vec![
                        call("a", "calendar", "{}"),
                        call("b", "event_lookup", "{not json"),
                    ],
                })
            });
        model
            .expect_complete()
            .withf(|messages, _| {
                let n = messages.len();
                messages[n - 2].content.contains("Tool not found: calendar")
                    && messages[n - 1].content.contains("not valid JSON")
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(ModelReply::text("Sorry about that.")));

        let agent = Agent::new(Arc::new(model), registry(MockEventSearch::new()));
        let mut history = vec![ThreadMessage::user("?")];
        assert_eq!(agent.respond(&mut history).await.unwrap(), "Sorry about that.");
    }

    #[tokio::test]
    async fn test_empty_answer_uses_fallback() {
        let mut model = MockChatModel::new();
        model
            .expect_complete()
            .returning(|_, _| Ok(ModelReply::text("THOUGHT: ...\n===\n")));

        let agent = Agent::new(Arc::new(model), registry(MockEventSearch::new()));
        let mut history = vec![ThreadMessage::user("?")];
        assert_eq!(agent.respond(&mut history).await.unwrap(), FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn test_model_error_propagates() {
        let mut model = MockChatModel::new();
        model
            .expect_complete()
            .returning(|_, _| Err(AssistantError::Model("503".into())));

        let agent = Agent::new(Arc::new(model), registry(MockEventSearch::new()));
        let mut history = vec![ThreadMessage::user("?")];
        let err = agent.respond(&mut history).await.unwrap_err();
        assert!(matches!(err, AssistantError::Model(_)));
    }
}
