use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, FromRequest, Multipart, Query, Request, State, rejection::QueryRejection,
    },
    http::{StatusCode, header},
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{get, post, put},
};
use axum_helpers::{
    AppError, AuthUser, IdPath, JwtAuth, ValidatedJson,
    errors::responses::{
        BadRequestResponse, ForbiddenResponse, InternalServerErrorResponse, InvalidIdResponse,
        NotFoundResponse, UnauthorizedResponse,
    },
    jwt_auth_middleware,
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::form::EventForm;
use crate::images::{MAX_IMAGE_BYTES, MAX_IMAGES};
use crate::directory::Person;
use crate::models::{
    ChatMessage, CreateEvent, EventDetails, EventFilter, EventList, EventResponse, EventType,
    MessageResponse, UpdateEvent,
};
use crate::repository::EventRepository;
use crate::service::EventService;

const ADMIN: &str = "admin";
const ORGANIZER: &str = "organizer";

/// Room for five full-size images plus the text fields
const CREATE_BODY_LIMIT: usize = MAX_IMAGES * MAX_IMAGE_BYTES + 1024 * 1024;

/// OpenAPI documentation for the Events API
#[derive(OpenApi)]
#[openapi(
    paths(list_events, create_event, get_event, update_event, delete_event),
    components(
        schemas(
            EventResponse,
            EventDetails,
            Person,
            EventList,
            CreateEvent,
            UpdateEvent,
            EventType,
            ChatMessage,
            MessageResponse
        ),
        responses(
            BadRequestResponse,
            InvalidIdResponse,
            NotFoundResponse,
            UnauthorizedResponse,
            ForbiddenResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Events", description = "Events, their summaries and chat logs")
    )
)]
pub struct ApiDoc;

/// Events router; reads are public, writes need a bearer token.
pub fn router<R: EventRepository + 'static>(service: EventService<R>, jwt: JwtAuth) -> Router {
    let shared_service = Arc::new(service);

    let public = Router::new()
        .route("/", get(list_events))
        .route("/{id}", get(get_event));

    let protected = Router::new()
        .route(
            "/",
            post(create_event).layer(DefaultBodyLimit::max(CREATE_BODY_LIMIT)),
        )
        .route("/{id}", put(update_event).delete(delete_event))
        .route_layer(from_fn_with_state(jwt, jwt_auth_middleware));

    public.merge(protected).with_state(shared_service)
}

/// List events
#[utoipa::path(
    get,
    path = "",
    tag = "Events",
    params(EventFilter),
    responses(
        (status = 200, description = "Page of events, newest first", body = EventList),
        (status = 400, response = BadRequestResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_events<R: EventRepository>(
    State(service): State<Arc<EventService<R>>>,
    filter: Result<Query<EventFilter>, QueryRejection>,
) -> Result<Json<EventList>, AppError> {
    let Query(filter) = filter?;
    Ok(Json(service.list_events(filter).await?))
}

/// Create an event.
///
/// Accepts `multipart/form-data` (a `data` JSON part or individual fields,
/// plus up to five image files) or a plain JSON body. The organizer defaults
/// to the caller; only admins may create events for someone else.
#[utoipa::path(
    post,
    path = "",
    tag = "Events",
    request_body(content = CreateEvent, content_type = "application/json"),
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Event created", body = EventResponse),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_event<R: EventRepository>(
    State(service): State<Arc<EventService<R>>>,
    caller: AuthUser,
    request: Request,
) -> Result<impl IntoResponse, AppError> {
    caller.require_role(&[ORGANIZER, ADMIN])?;

    let EventForm { mut event, uploads } = read_create_body(request).await?;

    let caller_id = caller.id.to_string();
    match event.organizer.as_deref().map(str::trim) {
        None | Some("") => event.organizer = Some(caller_id),
        Some(organizer) if organizer != caller_id => caller.require_role(&[ADMIN])?,
        Some(_) => {}
    }

    let created = service.create_event(event, uploads).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn read_create_body(request: Request) -> Result<EventForm, AppError> {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"));

    if is_multipart {
        let multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        return Ok(EventForm::read(multipart).await?);
    }

    let Json(event) = Json::<CreateEvent>::from_request(request, &()).await?;
    Ok(EventForm {
        event,
        uploads: Vec::new(),
    })
}

/// Get an event by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Events",
    params(
        ("id" = Uuid, Path, description = "Event ID")
    ),
    responses(
        (status = 200, description = "Event with organizer, attendees and location embedded", body = EventDetails),
        (status = 400, response = InvalidIdResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_event<R: EventRepository>(
    State(service): State<Arc<EventService<R>>>,
    IdPath(id): IdPath,
) -> Result<Json<EventDetails>, AppError> {
    Ok(Json(service.get_event(id).await?))
}

/// Update an event; only its organizer or an admin may do so
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Events",
    params(
        ("id" = Uuid, Path, description = "Event ID")
    ),
    request_body = UpdateEvent,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Event updated", body = EventResponse),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_event<R: EventRepository>(
    State(service): State<Arc<EventService<R>>>,
    caller: AuthUser,
    IdPath(id): IdPath,
    ValidatedJson(input): ValidatedJson<UpdateEvent>,
) -> Result<Json<EventResponse>, AppError> {
    let owner = service.event_organizer(id).await?;
    caller.require_self_or_role(owner, &[ADMIN])?;

    if let Some(organizer) = input.organizer.as_deref() {
        if organizer.trim() != owner.to_string() {
            caller.require_role(&[ADMIN])?;
        }
    }

    Ok(Json(service.update_event(id, input).await?))
}

/// Delete an event; its location and organizer are kept
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Events",
    params(
        ("id" = Uuid, Path, description = "Event ID")
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Event deleted", body = MessageResponse),
        (status = 400, response = InvalidIdResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_event<R: EventRepository>(
    State(service): State<Arc<EventService<R>>>,
    caller: AuthUser,
    IdPath(id): IdPath,
) -> Result<Json<MessageResponse>, AppError> {
    let owner = service.event_organizer(id).await?;
    caller.require_self_or_role(owner, &[ADMIN])?;

    service.delete_event(id).await?;
    Ok(Json(MessageResponse::new("Event successfully deleted.")))
}
