//! OpenAPI documentation configuration

use utoipa::OpenApi;

/// Combined OpenAPI documentation for all APIs
#[derive(OpenApi)]
#[openapi(
    info(
        title = "EventHub API",
        version = "0.1.0",
        description = "Event discovery: accounts, venues, events with chat rooms, and an event recommendation assistant"
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    nest(
        (path = "/api/v1/auth", api = domain_users::auth_handlers::ApiDoc),
        (path = "/api/v1/users", api = domain_users::handlers::ApiDoc),
        (path = "/api/v1/locations", api = domain_locations::handlers::ApiDoc),
        (path = "/api/v1/events", api = domain_events::handlers::ApiDoc),
        (path = "/api/v1/events/ai", api = domain_assistant::handlers::ApiDoc)
    )
)]
pub struct ApiDoc;
