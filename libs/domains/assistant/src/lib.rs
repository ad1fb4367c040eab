//! Event recommendation assistant
//!
//! A chat agent that answers questions about events. Each turn runs a
//! bounded tool-calling loop against an OpenAI-compatible model with two
//! tools: vector search over stored event summaries (`event_lookup`) and
//! a DuckDuckGo web search (`internet_search`). Conversations are kept as
//! threads so a follow-up question continues where the last one ended.
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_assistant::{
//!     Agent, AssistantService, EventLookupTool, InternetSearchTool, MongoThreadStore,
//!     OpenAiChatModel, ToolRegistry, handlers,
//! };
//!
//! let mut tools = ToolRegistry::new();
//! tools.register(EventLookupTool::new(Arc::new(event_service.clone())));
//! tools.register(InternetSearchTool::new()?);
//!
//! let agent = Agent::new(Arc::new(OpenAiChatModel::from_env()?), Arc::new(tools));
//! let service = AssistantService::new(MongoThreadStore::new(db), agent);
//! let router = handlers::router(service); // mounted at /events/ai
//! ```

pub mod agent;
pub mod error;
pub mod handlers;
pub mod model;
pub mod models;
pub mod mongodb;
pub mod prompts;
pub mod repository;
pub mod service;
pub mod tools;

pub use agent::{Agent, AgentState, MAX_STEPS};
pub use error::{AssistantError, AssistantResult};
pub use model::{ChatModel, ChatModelConfig, ModelReply, OpenAiChatModel, ToolDefinition};
pub use models::{
    ChatRequest, MessageRole, StartThreadResponse, Thread, ThreadMessage, ThreadReply, ToolCall,
};
pub use mongodb::MongoThreadStore;
pub use prompts::FALLBACK_REPLY;
pub use repository::{InMemoryThreadStore, ThreadStore};
pub use service::AssistantService;
pub use tools::{AssistantTool, EventLookupTool, EventSearch, InternetSearchTool, ToolRegistry};
