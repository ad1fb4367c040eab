//! API routes
//!
//! Everything returned by [`routes`] is nested under the configured API
//! prefix by `axum_helpers::create_router`. The chat socket and uploaded
//! images live outside the prefix, see [`public_routes`].

pub mod assistant;
pub mod events;
pub mod health;
pub mod locations;
pub mod users;

use axum::Router;
use axum_helpers::JwtAuth;
use database::ensure_indexes;
use domain_assistant::MongoThreadStore;
use domain_events::{ChatRooms, MongoEventRepository, UPLOADS_PATH, chat};
use domain_locations::MongoLocationRepository;
use domain_users::MongoUserRepository;
use tower_http::services::ServeDir;
use tracing::info;

use crate::state::AppState;

/// Domain services shared between the HTTP routers and the chat socket
pub struct Services {
    pub users: users::Users,
    pub locations: locations::Locations,
    pub events: events::Events,
}

impl Services {
    pub fn from_state(state: &AppState) -> eyre::Result<Self> {
        let users = users::service(state);
        let locations = locations::service(state)?;
        let events = events::service(state, users.clone(), locations.clone())?;
        Ok(Self {
            users,
            locations,
            events,
        })
    }
}

pub fn routes(state: &AppState, services: &Services) -> eyre::Result<Router> {
    let jwt = JwtAuth::new(&state.config.jwt);

    Ok(Router::new()
        .nest("/auth", users::auth_router(state, jwt.clone())?)
        .nest(
            "/users",
            domain_users::handlers::router(services.users.clone(), jwt.clone()),
        )
        .nest(
            "/locations",
            domain_locations::handlers::router(services.locations.clone(), jwt.clone()),
        )
        .nest(
            "/events/ai",
            assistant::router(state, services.events.clone())?,
        )
        .nest(
            "/events",
            domain_events::handlers::router(services.events.clone(), jwt),
        )
        .merge(health::router(state.clone())))
}

/// `/ws` chat relay and the `/uploads` image directory
pub fn public_routes(state: &AppState, services: &Services) -> Router {
    chat::router(services.events.clone(), ChatRooms::default())
        .nest_service(UPLOADS_PATH, ServeDir::new(&state.config.upload_dir))
}

pub async fn init_indexes(db: &mongodb::Database) -> eyre::Result<()> {
    let specs = [
        MongoUserRepository::indexes(),
        MongoLocationRepository::indexes(),
        MongoEventRepository::indexes(),
        MongoThreadStore::indexes(),
    ]
    .into_iter()
    .flatten()
    .collect();
    ensure_indexes(db, specs)
        .await
        .map_err(|e| eyre::eyre!("Failed to create indexes: {}", e))?;
    info!("Collection indexes ensured");
    Ok(())
}
