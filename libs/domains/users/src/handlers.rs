use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
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
    jwt_auth_middleware, optional_jwt_auth_middleware,
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::models::{
    CreateUser, MessageResponse, Role, UpdatePasswordRequest, UpdateUser, UserFilter, UserList,
    UserResponse,
};
use crate::repository::UserRepository;
use crate::service::UserService;

const ADMIN: &str = "admin";

/// OpenAPI documentation for the Users API
#[derive(OpenApi)]
#[openapi(
    paths(list_users, create_user, get_user, update_user, update_password, delete_user),
    components(
        schemas(
            UserResponse,
            UserList,
            CreateUser,
            UpdateUser,
            UpdatePasswordRequest,
            MessageResponse,
            Role
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
        (name = "Users", description = "User accounts")
    )
)]
pub struct ApiDoc;

/// Users router. Sign-up is public; everything else needs a bearer token.
pub fn router<R: UserRepository + 'static>(service: UserService<R>, jwt: JwtAuth) -> Router {
    let shared_service = Arc::new(service);

    let public = Router::new()
        .route("/", post(create_user))
        .route_layer(from_fn_with_state(jwt.clone(), optional_jwt_auth_middleware));

    let protected = Router::new()
        .route("/", get(list_users))
        .route("/{id}", get(get_user).put(update_user).delete(delete_user))
        .route("/{id}/update-password", put(update_password))
        .route_layer(from_fn_with_state(jwt, jwt_auth_middleware));

    public.merge(protected).with_state(shared_service)
}

/// List users (admins only)
#[utoipa::path(
    get,
    path = "",
    tag = "Users",
    params(UserFilter),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Page of users", body = UserList),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_users<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    caller: AuthUser,
    Query(filter): Query<UserFilter>,
) -> Result<Json<UserList>, AppError> {
    caller.require_role(&[ADMIN])?;
    Ok(Json(service.list_users(filter).await?))
}

/// Register a user. Assigning the admin role requires an admin caller.
#[utoipa::path(
    post,
    path = "",
    tag = "Users",
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, response = BadRequestResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    caller: Option<AuthUser>,
    ValidatedJson(input): ValidatedJson<CreateUser>,
) -> Result<impl IntoResponse, AppError> {
    if input.role == Role::Admin {
        match caller {
            Some(caller) => caller.require_role(&[ADMIN])?,
            None => {
                return Err(AppError::Forbidden(
                    "Only admins may create admin accounts".to_string(),
                ));
            }
        }
    }

    let user = service.create_user(input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Get a user by ID; callers may read themselves, admins anyone
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Users",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 400, response = InvalidIdResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    caller: AuthUser,
    IdPath(id): IdPath,
) -> Result<Json<UserResponse>, AppError> {
    caller.require_self_or_role(id, &[ADMIN])?;
    Ok(Json(service.get_user(id).await?))
}

/// Update profile fields
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Users",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    request_body = UpdateUser,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    caller: AuthUser,
    IdPath(id): IdPath,
    ValidatedJson(input): ValidatedJson<UpdateUser>,
) -> Result<Json<UserResponse>, AppError> {
    caller.require_self_or_role(id, &[ADMIN])?;
    if input.role.is_some() {
        caller.require_role(&[ADMIN])?;
    }

    Ok(Json(service.update_user(id, input).await?))
}

/// Change password
#[utoipa::path(
    put,
    path = "/{id}/update-password",
    tag = "Users",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    request_body = UpdatePasswordRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Password updated", body = MessageResponse),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_password<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    caller: AuthUser,
    IdPath(id): IdPath,
    ValidatedJson(input): ValidatedJson<UpdatePasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    caller.require_self_or_role(id, &[ADMIN])?;

    service
        .update_password(id, &input.current_password, &input.new_password)
        .await?;
    Ok(Json(MessageResponse::new("Password updated successfully")))
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Users",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 400, response = InvalidIdResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    caller: AuthUser,
    IdPath(id): IdPath,
) -> Result<Json<MessageResponse>, AppError> {
    caller.require_self_or_role(id, &[ADMIN])?;

    service.delete_user(id).await?;
    Ok(Json(MessageResponse::new("User successfully deleted.")))
}
