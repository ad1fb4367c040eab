//! Recommendation assistant routes, mounted at `/events/ai`

use axum::Router;
use domain_assistant::{
    Agent, AssistantService, EventLookupTool, InternetSearchTool, MongoThreadStore,
    OpenAiChatModel, ToolRegistry, handlers,
};
use std::sync::Arc;

use super::events::Events;
use crate::state::AppState;

pub fn router(state: &AppState, events: Events) -> eyre::Result<Router> {
    let mut tools = ToolRegistry::new();
    tools.register(EventLookupTool::new(Arc::new(events)));
    tools.register(InternetSearchTool::new()?);

    let agent = Agent::new(Arc::new(OpenAiChatModel::from_env()?), Arc::new(tools));
    let service = AssistantService::new(MongoThreadStore::new(state.db.clone()), agent);

    Ok(handlers::router(service))
}
