//! Events routes
//!
//! Organizers and venues are resolved through the user and location
//! services; summaries are embedded with the OpenAI embeddings API.

use domain_events::{EventService, LocalImageStore, MongoEventRepository, OpenAiEmbedder};
use std::sync::Arc;
use tracing::info;

use super::{locations::Locations, users::Users};
use crate::state::AppState;

pub type Events = EventService<MongoEventRepository>;

pub fn service(state: &AppState, users: Users, locations: Locations) -> eyre::Result<Events> {
    let embedder = OpenAiEmbedder::from_env()?;
    let images = LocalImageStore::new(state.config.upload_dir.clone());
    info!(upload_dir = %state.config.upload_dir.display(), "Event images stored locally");

    Ok(EventService::new(
        MongoEventRepository::new(state.db.clone()),
        Arc::new(users),
        Arc::new(locations),
        Arc::new(embedder),
        Arc::new(images),
    ))
}
