use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{get, post, put},
};
use axum_helpers::{
    IdPath, JwtAuth, ValidatedJson,
    errors::responses::{
        BadRequestResponse, InternalServerErrorResponse, InvalidIdResponse, NotFoundResponse,
        UnauthorizedResponse,
    },
    jwt_auth_middleware,
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::LocationResult;
use crate::models::{
    AddressQuery, Coordinates, CoordinatesQuery, CreateLocation, LocationFilter, LocationList,
    LocationResponse, MessageResponse, UpdateLocation,
};
use crate::repository::LocationRepository;
use crate::service::LocationService;
use crate::validation::parse_coordinate;

/// OpenAPI documentation for the Locations API
#[derive(OpenApi)]
#[openapi(
    paths(
        list_locations,
        create_location,
        find_by_address,
        find_by_coordinates,
        get_location,
        update_location,
        delete_location,
    ),
    components(
        schemas(
            LocationResponse,
            LocationList,
            CreateLocation,
            UpdateLocation,
            Coordinates,
            MessageResponse
        ),
        responses(
            BadRequestResponse,
            InvalidIdResponse,
            NotFoundResponse,
            UnauthorizedResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Locations", description = "Venues and their coordinates")
    )
)]
pub struct ApiDoc;

/// Locations router; writes require a bearer token.
pub fn router<R: LocationRepository + 'static>(service: LocationService<R>, jwt: JwtAuth) -> Router {
    let shared_service = Arc::new(service);

    let public = Router::new()
        .route("/", get(list_locations))
        .route("/by-address", get(find_by_address))
        .route("/by-coordinates", get(find_by_coordinates))
        .route("/{id}", get(get_location));

    let protected = Router::new()
        .route("/", post(create_location))
        .route("/{id}", put(update_location).delete(delete_location))
        .route_layer(from_fn_with_state(jwt, jwt_auth_middleware));

    public.merge(protected).with_state(shared_service)
}

/// List locations
#[utoipa::path(
    get,
    path = "",
    tag = "Locations",
    params(LocationFilter),
    responses(
        (status = 200, description = "Page of locations", body = LocationList),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_locations<R: LocationRepository>(
    State(service): State<Arc<LocationService<R>>>,
    Query(filter): Query<LocationFilter>,
) -> LocationResult<Json<LocationList>> {
    Ok(Json(service.list_locations(filter).await?))
}

/// Create a location; coordinates are geocoded from the address
#[utoipa::path(
    post,
    path = "",
    tag = "Locations",
    request_body = CreateLocation,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Location created", body = LocationResponse),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_location<R: LocationRepository>(
    State(service): State<Arc<LocationService<R>>>,
    ValidatedJson(input): ValidatedJson<CreateLocation>,
) -> LocationResult<impl IntoResponse> {
    let location = service.create_location(input).await?;
    Ok((StatusCode::CREATED, Json(location)))
}

/// Find locations by free-text address
#[utoipa::path(
    get,
    path = "/by-address",
    tag = "Locations",
    params(AddressQuery),
    responses(
        (status = 200, description = "Matching locations", body = Vec<LocationResponse>),
        (status = 400, response = BadRequestResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn find_by_address<R: LocationRepository>(
    State(service): State<Arc<LocationService<R>>>,
    Query(query): Query<AddressQuery>,
) -> LocationResult<Json<Vec<LocationResponse>>> {
    let address = query.address.unwrap_or_default();
    Ok(Json(service.find_by_address(&address).await?))
}

/// Find locations within ±0.5° of a latitude and/or longitude
#[utoipa::path(
    get,
    path = "/by-coordinates",
    tag = "Locations",
    params(CoordinatesQuery),
    responses(
        (status = 200, description = "Nearby locations", body = Vec<LocationResponse>),
        (status = 400, response = BadRequestResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn find_by_coordinates<R: LocationRepository>(
    State(service): State<Arc<LocationService<R>>>,
    Query(query): Query<CoordinatesQuery>,
) -> LocationResult<Json<Vec<LocationResponse>>> {
    let latitude = parse_coordinate("Latitude", query.latitude.as_deref())?;
    let longitude = parse_coordinate("Longitude", query.longitude.as_deref())?;
    Ok(Json(service.find_by_coordinates(latitude, longitude).await?))
}

/// Get a location by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Locations",
    params(
        ("id" = Uuid, Path, description = "Location ID")
    ),
    responses(
        (status = 200, description = "Location found", body = LocationResponse),
        (status = 400, response = InvalidIdResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_location<R: LocationRepository>(
    State(service): State<Arc<LocationService<R>>>,
    IdPath(id): IdPath,
) -> LocationResult<Json<LocationResponse>> {
    Ok(Json(service.get_location(id).await?))
}

/// Update a location
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Locations",
    params(
        ("id" = Uuid, Path, description = "Location ID")
    ),
    request_body = UpdateLocation,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Location updated", body = LocationResponse),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_location<R: LocationRepository>(
    State(service): State<Arc<LocationService<R>>>,
    IdPath(id): IdPath,
    ValidatedJson(input): ValidatedJson<UpdateLocation>,
) -> LocationResult<Json<LocationResponse>> {
    Ok(Json(service.update_location(id, input).await?))
}

/// Delete a location
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Locations",
    params(
        ("id" = Uuid, Path, description = "Location ID")
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Location deleted", body = MessageResponse),
        (status = 400, response = InvalidIdResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_location<R: LocationRepository>(
    State(service): State<Arc<LocationService<R>>>,
    IdPath(id): IdPath,
) -> LocationResult<Json<MessageResponse>> {
    service.delete_location(id).await?;
    Ok(Json(MessageResponse::new("Location successfully deleted.")))
}
