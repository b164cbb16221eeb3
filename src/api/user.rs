use crate::external_connections::{ExternalConnectivity, Transactable};
use crate::routing_utils::{DomainErrorResponse, Json, ValidationErrorResponse};
use crate::{AppState, SharedData, domain, dto, persistence};
use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::ErrorResponse;
use axum::routing::{delete, get, post, put};
use log::{error, info};
use std::sync::Arc;
use utoipa::OpenApi;
use validator::Validate;

/// Defines the OpenAPI documentation for the user API
#[derive(OpenApi)]
#[openapi(paths(get_all_users, get_user, create_user, update_user, delete_user))]
pub struct UsersApi;
/// Constant used to group user endpoints in OpenAPI documentation
pub const USER_API_GROUP: &str = "Users";

/// Builds a router for all the user routes
pub fn user_routes() -> Router<Arc<SharedData>> {
    Router::new()
        .route(
            "/",
            get(|State(app_state): AppState| async move {
                let mut ext_cxn = app_state.ext_cxn.clone();
                let user_service = domain::user::UserService {};

                get_all_users(&mut ext_cxn, &user_service).await
            }),
        )
        .route(
            "/",
            post(
                |State(app_state): AppState, Json(user_data): Json<dto::UserData>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let user_service = domain::user::UserService {};

                    create_user(user_data, &mut ext_cxn, &user_service).await
                },
            ),
        )
        .route(
            "/:user_id",
            get(
                |State(app_state): AppState, Path(user_id): Path<i32>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let user_service = domain::user::UserService {};

                    get_user(user_id, &mut ext_cxn, &user_service).await
                },
            ),
        )
        .route(
            "/:user_id",
            put(
                |State(app_state): AppState,
                 Path(user_id): Path<i32>,
                 Json(user_data): Json<dto::UserData>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let user_service = domain::user::UserService {};

                    update_user(user_id, user_data, &mut ext_cxn, &user_service).await
                },
            ),
        )
        .route(
            "/:user_id",
            delete(
                |State(app_state): AppState, Path(user_id): Path<i32>| async move {
                    let ext_cxn = app_state.ext_cxn.clone();
                    let user_service = domain::user::UserService {};

                    delete_user(user_id, &ext_cxn, &user_service).await
                },
            ),
        )
}

/// Retrieves a list of all the users in the system
#[utoipa::path(
    get,
    path = "/users",
    tag = USER_API_GROUP,
    responses(
        (status = 200, description = "User list successfully retrieved", body = Vec<dto::User>),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
async fn get_all_users(
    ext_cxn: &mut impl ExternalConnectivity,
    user_service: &impl domain::user::driving_ports::UserPort,
) -> Result<Json<Vec<dto::User>>, ErrorResponse> {
    let user_reader = persistence::db_user_driven_ports::DbReadUsers {};

    let users_result = user_service.all_users(&mut *ext_cxn, &user_reader).await;
    let users = match users_result {
        Ok(users) => users,
        Err(domain_err) => {
            error!("Could not retrieve users: {domain_err}");
            return Err(DomainErrorResponse(domain_err).into());
        }
    };

    Ok(Json(users.into_iter().map(dto::User::from).collect()))
}

/// Retrieves a single user by their ID
#[utoipa::path(
    get,
    path = "/users/{user_id}",
    tag = USER_API_GROUP,
    params(
        ("user_id" = i32, Path, description = "The ID of the user to fetch"),
    ),
    responses(
        (status = 200, description = "User successfully retrieved", body = dto::User),
        (status = 404, response = dto::err_resps::BasicError404),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
async fn get_user(
    user_id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    user_service: &impl domain::user::driving_ports::UserPort,
) -> Result<Json<dto::User>, ErrorResponse> {
    let user_reader = persistence::db_user_driven_ports::DbReadUsers {};

    let user_result = user_service
        .user_by_id(user_id, &mut *ext_cxn, &user_reader)
        .await;
    match user_result {
        Ok(user) => Ok(Json(dto::User::from(user))),
        Err(domain_err) => {
            error!("Could not retrieve user {user_id}: {domain_err}");
            Err(DomainErrorResponse(domain_err).into())
        }
    }
}

/// Registers a user. Usernames and email addresses must be unique across the system.
#[utoipa::path(
    post,
    path = "/users",
    tag = USER_API_GROUP,
    request_body = dto::UserData,
    responses(
        (status = 201, description = "User successfully created", body = dto::User),
        (status = 400, response = dto::err_resps::BasicError400),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
async fn create_user(
    user_data: dto::UserData,
    ext_cxn: &mut impl ExternalConnectivity,
    user_service: &impl domain::user::driving_ports::UserPort,
) -> Result<(StatusCode, Json<dto::User>), ErrorResponse> {
    info!("Attempt to create user: {user_data}");
    user_data
        .validate()
        .map_err(ValidationErrorResponse::from)?;

    let user_content = domain::user::UserContent::from(user_data);
    let user_detect = persistence::db_user_driven_ports::DbDetectUser {};
    let user_writer = persistence::db_user_driven_ports::DbWriteUsers {};

    let creation_result = user_service
        .create_user(&user_content, &mut *ext_cxn, &user_detect, &user_writer)
        .await;
    match creation_result {
        Ok(user) => Ok((StatusCode::CREATED, Json(dto::User::from(user)))),
        Err(domain_err) => {
            error!("User create failure: {domain_err}");
            Err(DomainErrorResponse(domain_err).into())
        }
    }
}

/// Overwrites a user's profile with the supplied data
#[utoipa::path(
    put,
    path = "/users/{user_id}",
    tag = USER_API_GROUP,
    params(
        ("user_id" = i32, Path, description = "The ID of the user to update"),
    ),
    request_body = dto::UserData,
    responses(
        (status = 200, description = "User successfully updated", body = dto::User),
        (status = 400, response = dto::err_resps::BasicError400),
        (status = 404, response = dto::err_resps::BasicError404),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
async fn update_user(
    user_id: i32,
    user_data: dto::UserData,
    ext_cxn: &mut impl ExternalConnectivity,
    user_service: &impl domain::user::driving_ports::UserPort,
) -> Result<Json<dto::User>, ErrorResponse> {
    info!("Updating user {user_id}");
    user_data
        .validate()
        .map_err(ValidationErrorResponse::from)?;

    let user_content = domain::user::UserContent::from(user_data);
    let user_reader = persistence::db_user_driven_ports::DbReadUsers {};
    let user_writer = persistence::db_user_driven_ports::DbWriteUsers {};

    let update_result = user_service
        .update_user(
            user_id,
            &user_content,
            &mut *ext_cxn,
            &user_reader,
            &user_writer,
        )
        .await;
    match update_result {
        Ok(user) => Ok(Json(dto::User::from(user))),
        Err(domain_err) => {
            error!("Update user failure: {domain_err}");
            Err(DomainErrorResponse(domain_err).into())
        }
    }
}

/// Deletes a user, detaching them from any task referencing them as author or executor
#[utoipa::path(
    delete,
    path = "/users/{user_id}",
    tag = USER_API_GROUP,
    params(
        ("user_id" = i32, Path, description = "The ID of the user to delete"),
    ),
    responses(
        (status = 204, description = "User successfully deleted"),
        (status = 404, response = dto::err_resps::BasicError404),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
async fn delete_user(
    user_id: i32,
    ext_cxn: &impl Transactable,
    user_service: &impl domain::user::driving_ports::UserPort,
) -> Result<StatusCode, ErrorResponse> {
    info!("Deleting user {user_id}");
    let user_detect = persistence::db_user_driven_ports::DbDetectUser {};
    let task_writer = persistence::db_task_driven_ports::DbTaskWriter {};
    let user_writer = persistence::db_user_driven_ports::DbWriteUsers {};

    let delete_result = user_service
        .delete_user(user_id, ext_cxn, &user_detect, &task_writer, &user_writer)
        .await;
    match delete_result {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(domain_err) => {
            error!("Failed to delete user {user_id}: {domain_err}");
            Err(DomainErrorResponse(domain_err).into())
        }
    }
}
