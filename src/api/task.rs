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

/// Defines the OpenAPI documentation for the task API
#[derive(OpenApi)]
#[openapi(paths(get_all_tasks, get_task, create_task, update_task, delete_task))]
pub struct TasksApi;
/// Constant used to group task endpoints in OpenAPI documentation
pub const TASK_API_GROUP: &str = "Tasks";

/// Builds a router for all the task routes
pub fn task_routes() -> Router<Arc<SharedData>> {
    Router::new()
        .route(
            "/",
            get(|State(app_state): AppState| async move {
                let mut ext_cxn = app_state.ext_cxn.clone();
                let task_service = domain::task::TaskService {};

                get_all_tasks(&mut ext_cxn, &task_service).await
            }),
        )
        .route(
            "/",
            post(
                |State(app_state): AppState, Json(task_data): Json<dto::TaskData>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let task_service = domain::task::TaskService {};

                    create_task(task_data, &mut ext_cxn, &task_service).await
                },
            ),
        )
        .route(
            "/:task_id",
            get(
                |State(app_state): AppState, Path(task_id): Path<i32>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let task_service = domain::task::TaskService {};

                    get_task(task_id, &mut ext_cxn, &task_service).await
                },
            ),
        )
        .route(
            "/:task_id",
            put(
                |State(app_state): AppState,
                 Path(task_id): Path<i32>,
                 Json(task_data): Json<dto::TaskData>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let task_service = domain::task::TaskService {};

                    update_task(task_id, task_data, &mut ext_cxn, &task_service).await
                },
            ),
        )
        .route(
            "/:task_id",
            delete(
                |State(app_state): AppState, Path(task_id): Path<i32>| async move {
                    let ext_cxn = app_state.ext_cxn.clone();
                    let task_service = domain::task::TaskService {};

                    delete_task(task_id, &ext_cxn, &task_service).await
                },
            ),
        )
}

/// Retrieves every task in the system, comments included
#[utoipa::path(
    get,
    path = "/tasks",
    tag = TASK_API_GROUP,
    responses(
        (status = 200, description = "Task list successfully retrieved", body = Vec<dto::Task>),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
async fn get_all_tasks(
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl domain::task::driving_ports::TaskPort,
) -> Result<Json<Vec<dto::Task>>, ErrorResponse> {
    let task_reader = persistence::db_task_driven_ports::DbTaskReader {};

    let tasks_result = task_service.all_tasks(&mut *ext_cxn, &task_reader).await;
    let tasks = match tasks_result {
        Ok(tasks) => tasks,
        Err(domain_err) => {
            error!("Could not retrieve tasks: {domain_err}");
            return Err(DomainErrorResponse(domain_err).into());
        }
    };

    Ok(Json(tasks.into_iter().map(dto::Task::from).collect()))
}

/// Retrieves a single task by its ID
#[utoipa::path(
    get,
    path = "/tasks/{task_id}",
    tag = TASK_API_GROUP,
    params(
        ("task_id" = i32, Path, description = "The ID of the task to fetch"),
    ),
    responses(
        (status = 200, description = "Task successfully retrieved", body = dto::Task),
        (status = 404, response = dto::err_resps::BasicError404),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
async fn get_task(
    task_id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl domain::task::driving_ports::TaskPort,
) -> Result<Json<dto::Task>, ErrorResponse> {
    let task_reader = persistence::db_task_driven_ports::DbTaskReader {};

    let task_result = task_service
        .task_by_id(task_id, &mut *ext_cxn, &task_reader)
        .await;
    match task_result {
        Ok(task) => Ok(Json(dto::Task::from(task))),
        Err(domain_err) => {
            error!("Could not retrieve task {task_id}: {domain_err}");
            Err(DomainErrorResponse(domain_err).into())
        }
    }
}

/// Creates a task. Status and priority accept any casing of their symbolic names,
/// author and executor are referenced by username.
#[utoipa::path(
    post,
    path = "/tasks",
    tag = TASK_API_GROUP,
    request_body = dto::TaskData,
    responses(
        (status = 201, description = "Task successfully created", body = dto::Task),
        (status = 400, response = dto::err_resps::BasicError400),
        (status = 404, response = dto::err_resps::BasicError404),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
async fn create_task(
    task_data: dto::TaskData,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl domain::task::driving_ports::TaskPort,
) -> Result<(StatusCode, Json<dto::Task>), ErrorResponse> {
    info!("Creating task \"{}\"", task_data.title);
    task_data
        .validate()
        .map_err(ValidationErrorResponse::from)?;

    let task_changes =
        domain::task::TaskChanges::try_from(task_data).map_err(DomainErrorResponse::from)?;
    let user_reader = persistence::db_user_driven_ports::DbReadUsers {};
    let task_writer = persistence::db_task_driven_ports::DbTaskWriter {};

    let creation_result = task_service
        .create_task(&task_changes, &mut *ext_cxn, &user_reader, &task_writer)
        .await;
    match creation_result {
        Ok(task) => Ok((StatusCode::CREATED, Json(dto::Task::from(task)))),
        Err(domain_err) => {
            error!("Task create failure: {domain_err}");
            Err(DomainErrorResponse(domain_err).into())
        }
    }
}

/// Updates a task. Omitted status/priority/author/executor fields keep their
/// stored values.
#[utoipa::path(
    put,
    path = "/tasks/{task_id}",
    tag = TASK_API_GROUP,
    params(
        ("task_id" = i32, Path, description = "The ID of the task to update"),
    ),
    request_body = dto::TaskData,
    responses(
        (status = 200, description = "Task successfully updated", body = dto::Task),
        (status = 400, response = dto::err_resps::BasicError400),
        (status = 404, response = dto::err_resps::BasicError404),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
async fn update_task(
    task_id: i32,
    task_data: dto::TaskData,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl domain::task::driving_ports::TaskPort,
) -> Result<Json<dto::Task>, ErrorResponse> {
    info!("Updating task {task_id}");
    task_data
        .validate()
        .map_err(ValidationErrorResponse::from)?;

    let task_changes =
        domain::task::TaskChanges::try_from(task_data).map_err(DomainErrorResponse::from)?;
    let user_reader = persistence::db_user_driven_ports::DbReadUsers {};
    let task_reader = persistence::db_task_driven_ports::DbTaskReader {};
    let task_writer = persistence::db_task_driven_ports::DbTaskWriter {};

    let update_result = task_service
        .update_task(
            task_id,
            &task_changes,
            &mut *ext_cxn,
            &user_reader,
            &task_reader,
            &task_writer,
        )
        .await;
    match update_result {
        Ok(task) => Ok(Json(dto::Task::from(task))),
        Err(domain_err) => {
            error!("Update task failure: {domain_err}");
            Err(DomainErrorResponse(domain_err).into())
        }
    }
}

/// Deletes a task along with every comment attached to it
#[utoipa::path(
    delete,
    path = "/tasks/{task_id}",
    tag = TASK_API_GROUP,
    params(
        ("task_id" = i32, Path, description = "The ID of the task to delete"),
    ),
    responses(
        (status = 204, description = "Task successfully deleted"),
        (status = 404, response = dto::err_resps::BasicError404),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
async fn delete_task(
    task_id: i32,
    ext_cxn: &impl Transactable,
    task_service: &impl domain::task::driving_ports::TaskPort,
) -> Result<StatusCode, ErrorResponse> {
    info!("Deleting task {task_id}");
    let task_detect = persistence::db_task_driven_ports::DbDetectTask {};
    let comment_writer = persistence::db_comment_driven_ports::DbWriteComments {};
    let task_writer = persistence::db_task_driven_ports::DbTaskWriter {};

    let delete_result = task_service
        .delete_task(task_id, ext_cxn, &task_detect, &comment_writer, &task_writer)
        .await;
    match delete_result {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(domain_err) => {
            error!("Failed to delete task {task_id}: {domain_err}");
            Err(DomainErrorResponse(domain_err).into())
        }
    }
}
