use crate::external_connections::ExternalConnectivity;
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

/// Defines the OpenAPI documentation for the comment API
#[derive(OpenApi)]
#[openapi(paths(
    get_comment,
    get_comments_for_task,
    create_comment,
    update_comment,
    delete_comment
))]
pub struct CommentsApi;
/// Constant used to group comment endpoints in OpenAPI documentation
pub const COMMENT_API_GROUP: &str = "Comments";

/// Builds a router for all the comment routes
pub fn comment_routes() -> Router<Arc<SharedData>> {
    Router::new()
        .route(
            "/",
            post(
                |State(app_state): AppState, Json(comment_data): Json<dto::NewComment>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let comment_service = domain::comment::CommentService {};

                    create_comment(comment_data, &mut ext_cxn, &comment_service).await
                },
            ),
        )
        .route(
            "/:comment_id",
            get(
                |State(app_state): AppState, Path(comment_id): Path<i32>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let comment_service = domain::comment::CommentService {};

                    get_comment(comment_id, &mut ext_cxn, &comment_service).await
                },
            ),
        )
        .route(
            "/tasks/:task_id",
            get(
                |State(app_state): AppState, Path(task_id): Path<i32>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let comment_service = domain::comment::CommentService {};

                    get_comments_for_task(task_id, &mut ext_cxn, &comment_service).await
                },
            ),
        )
        .route(
            "/:comment_id",
            put(
                |State(app_state): AppState,
                 Path(comment_id): Path<i32>,
                 Json(comment_data): Json<dto::UpdateComment>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let comment_service = domain::comment::CommentService {};

                    update_comment(comment_id, comment_data, &mut ext_cxn, &comment_service).await
                },
            ),
        )
        .route(
            "/:comment_id",
            delete(
                |State(app_state): AppState, Path(comment_id): Path<i32>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let comment_service = domain::comment::CommentService {};

                    delete_comment(comment_id, &mut ext_cxn, &comment_service).await
                },
            ),
        )
}

/// Retrieves a single comment by its ID
#[utoipa::path(
    get,
    path = "/comments/{comment_id}",
    tag = COMMENT_API_GROUP,
    params(
        ("comment_id" = i32, Path, description = "The ID of the comment to fetch"),
    ),
    responses(
        (status = 200, description = "Comment successfully retrieved", body = dto::Comment),
        (status = 404, response = dto::err_resps::BasicError404),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
async fn get_comment(
    comment_id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    comment_service: &impl domain::comment::driving_ports::CommentPort,
) -> Result<Json<dto::Comment>, ErrorResponse> {
    let comment_reader = persistence::db_comment_driven_ports::DbReadComments {};

    let comment_result = comment_service
        .comment_by_id(comment_id, &mut *ext_cxn, &comment_reader)
        .await;
    match comment_result {
        Ok(comment) => Ok(Json(dto::Comment::from(comment))),
        Err(domain_err) => {
            error!("Could not retrieve comment {comment_id}: {domain_err}");
            Err(DomainErrorResponse(domain_err).into())
        }
    }
}

/// Retrieves every comment attached to the given task. An unknown or deleted task
/// produces an empty list rather than a failure.
#[utoipa::path(
    get,
    path = "/comments/tasks/{task_id}",
    tag = COMMENT_API_GROUP,
    params(
        ("task_id" = i32, Path, description = "The ID of the task whose comments should be listed"),
    ),
    responses(
        (status = 200, description = "Comments successfully retrieved", body = Vec<dto::Comment>),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
async fn get_comments_for_task(
    task_id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    comment_service: &impl domain::comment::driving_ports::CommentPort,
) -> Result<Json<Vec<dto::Comment>>, ErrorResponse> {
    let comment_reader = persistence::db_comment_driven_ports::DbReadComments {};

    let comments_result = comment_service
        .comments_for_task(task_id, &mut *ext_cxn, &comment_reader)
        .await;
    match comments_result {
        Ok(comments) => Ok(Json(
            comments.into_iter().map(dto::Comment::from).collect(),
        )),
        Err(domain_err) => {
            error!("Could not list comments on task {task_id}: {domain_err}");
            Err(DomainErrorResponse(domain_err).into())
        }
    }
}

/// Attaches a new comment to a task
#[utoipa::path(
    post,
    path = "/comments",
    tag = COMMENT_API_GROUP,
    request_body = dto::NewComment,
    responses(
        (status = 201, description = "Comment successfully created", body = dto::Comment),
        (status = 400, response = dto::err_resps::BasicError400),
        (status = 404, response = dto::err_resps::BasicError404),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
async fn create_comment(
    comment_data: dto::NewComment,
    ext_cxn: &mut impl ExternalConnectivity,
    comment_service: &impl domain::comment::driving_ports::CommentPort,
) -> Result<(StatusCode, Json<dto::Comment>), ErrorResponse> {
    info!("Creating comment on task {}", comment_data.task_id);
    comment_data
        .validate()
        .map_err(ValidationErrorResponse::from)?;

    let new_comment = domain::comment::NewComment::from(comment_data);
    let task_detect = persistence::db_task_driven_ports::DbDetectTask {};
    let comment_writer = persistence::db_comment_driven_ports::DbWriteComments {};

    let creation_result = comment_service
        .create_comment(&new_comment, &mut *ext_cxn, &task_detect, &comment_writer)
        .await;
    match creation_result {
        Ok(comment) => Ok((StatusCode::CREATED, Json(dto::Comment::from(comment)))),
        Err(domain_err) => {
            error!("Comment create failure: {domain_err}");
            Err(DomainErrorResponse(domain_err).into())
        }
    }
}

/// Replaces a comment's text. The owning task cannot be changed.
#[utoipa::path(
    put,
    path = "/comments/{comment_id}",
    tag = COMMENT_API_GROUP,
    params(
        ("comment_id" = i32, Path, description = "The ID of the comment to update"),
    ),
    request_body = dto::UpdateComment,
    responses(
        (status = 200, description = "Comment successfully updated", body = dto::Comment),
        (status = 400, response = dto::err_resps::BasicError400),
        (status = 404, response = dto::err_resps::BasicError404),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
async fn update_comment(
    comment_id: i32,
    comment_data: dto::UpdateComment,
    ext_cxn: &mut impl ExternalConnectivity,
    comment_service: &impl domain::comment::driving_ports::CommentPort,
) -> Result<Json<dto::Comment>, ErrorResponse> {
    info!("Updating comment {comment_id}");
    comment_data
        .validate()
        .map_err(ValidationErrorResponse::from)?;

    let comment_reader = persistence::db_comment_driven_ports::DbReadComments {};
    let comment_writer = persistence::db_comment_driven_ports::DbWriteComments {};

    let update_result = comment_service
        .update_comment(
            comment_id,
            &comment_data.text,
            &mut *ext_cxn,
            &comment_reader,
            &comment_writer,
        )
        .await;
    match update_result {
        Ok(comment) => Ok(Json(dto::Comment::from(comment))),
        Err(domain_err) => {
            error!("Update comment failure: {domain_err}");
            Err(DomainErrorResponse(domain_err).into())
        }
    }
}

/// Deletes a comment
#[utoipa::path(
    delete,
    path = "/comments/{comment_id}",
    tag = COMMENT_API_GROUP,
    params(
        ("comment_id" = i32, Path, description = "The ID of the comment to delete"),
    ),
    responses(
        (status = 204, description = "Comment successfully deleted"),
        (status = 404, response = dto::err_resps::BasicError404),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
async fn delete_comment(
    comment_id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    comment_service: &impl domain::comment::driving_ports::CommentPort,
) -> Result<StatusCode, ErrorResponse> {
    info!("Deleting comment {comment_id}");
    let comment_reader = persistence::db_comment_driven_ports::DbReadComments {};
    let comment_writer = persistence::db_comment_driven_ports::DbWriteComments {};

    let delete_result = comment_service
        .delete_comment(comment_id, &mut *ext_cxn, &comment_reader, &comment_writer)
        .await;
    match delete_result {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(domain_err) => {
            error!("Failed to delete comment {comment_id}: {domain_err}");
            Err(DomainErrorResponse(domain_err).into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_util::deserialize_body;
    use crate::domain::comment::test_util::MockCommentService;
    use crate::external_connections;
    use crate::routing_utils::BasicErrorResponse;
    use axum::response::IntoResponse;
    use chrono::Utc;
    use speculoos::prelude::*;
    use std::sync::Mutex;

    fn sample_comment() -> domain::comment::Comment {
        let now = Utc::now();
        domain::comment::Comment {
            id: 4,
            text: "Looks good".to_owned(),
            task_id: 2,
            created_at: now,
            updated_at: now,
        }
    }

    mod get_comments_for_task {
        use super::*;

        #[tokio::test]
        async fn happy_path() {
            let mut comment_service_raw = MockCommentService::new();
            let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();

            comment_service_raw
                .comments_for_task_result
                .set_returned_result(Ok(vec![sample_comment()]));
            let comment_service = Mutex::new(comment_service_raw);

            let list_response = get_comments_for_task(2, &mut ext_cxn, &comment_service).await;
            assert_that!(list_response).is_ok().matches(|Json(comments)| {
                matches!(comments.as_slice(), [dto::Comment { id: 4, task_id: 2, .. }])
            });
        }

        #[tokio::test]
        async fn returns_empty_list_for_unknown_task() {
            let mut comment_service_raw = MockCommentService::new();
            let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();

            comment_service_raw
                .comments_for_task_result
                .set_returned_result(Ok(Vec::new()));
            let comment_service = Mutex::new(comment_service_raw);

            let list_response = get_comments_for_task(9, &mut ext_cxn, &comment_service).await;
            assert_that!(list_response)
                .is_ok()
                .matches(|Json(comments)| comments.is_empty());
        }
    }

    mod create_comment {
        use super::*;

        #[tokio::test]
        async fn happy_path() {
            let mut comment_service_raw = MockCommentService::new();
            let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();

            comment_service_raw
                .create_comment_result
                .set_returned_result(Ok(sample_comment()));
            let comment_service = Mutex::new(comment_service_raw);

            let create_response = create_comment(
                dto::NewComment {
                    text: "Looks good".to_owned(),
                    task_id: 2,
                },
                &mut ext_cxn,
                &comment_service,
            )
            .await;
            assert_that!(create_response)
                .is_ok()
                .matches(|(status, Json(comment))| {
                    *status == StatusCode::CREATED && comment.task_id == 2
                });

            let locked_comment_service = comment_service
                .lock()
                .expect("comment service mutex poisoned");
            assert!(matches!(
                locked_comment_service.create_comment_result.calls(),
                [domain::comment::NewComment { task_id: 2, text }] if text == "Looks good"
            ));
        }

        #[tokio::test]
        async fn returns_404_for_missing_task() {
            let mut comment_service_raw = MockCommentService::new();
            let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();

            comment_service_raw
                .create_comment_result
                .set_returned_result(Err(domain::Error::TaskNotFound(44)));
            let comment_service = Mutex::new(comment_service_raw);

            let create_response = create_comment(
                dto::NewComment {
                    text: "Anyone home?".to_owned(),
                    task_id: 44,
                },
                &mut ext_cxn,
                &comment_service,
            )
            .await;
            let real_response = create_response.into_response();

            assert_eq!(StatusCode::NOT_FOUND, real_response.status());

            let body: BasicErrorResponse = deserialize_body(real_response.into_body()).await;
            assert_that!(body.error_code).is_equal_to("not_found".to_owned());
        }

        #[tokio::test]
        async fn returns_400_on_empty_text() {
            let comment_service = MockCommentService::new_locked();
            let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();

            let create_response = create_comment(
                dto::NewComment {
                    text: String::new(),
                    task_id: 2,
                },
                &mut ext_cxn,
                &comment_service,
            )
            .await;
            let real_response = create_response.into_response();

            assert_eq!(StatusCode::BAD_REQUEST, real_response.status());

            let locked_comment_service = comment_service
                .lock()
                .expect("comment service mutex poisoned");
            assert!(locked_comment_service.create_comment_result.calls().is_empty());
        }
    }

    mod update_comment {
        use super::*;

        #[tokio::test]
        async fn happy_path() {
            let mut comment_service_raw = MockCommentService::new();
            let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();

            comment_service_raw
                .update_comment_result
                .set_returned_result(Ok(sample_comment()));
            let comment_service = Mutex::new(comment_service_raw);

            let update_response = update_comment(
                4,
                dto::UpdateComment {
                    text: "Looks good".to_owned(),
                },
                &mut ext_cxn,
                &comment_service,
            )
            .await;
            assert_that!(update_response)
                .is_ok()
                .matches(|Json(comment)| comment.id == 4);

            let locked_comment_service = comment_service
                .lock()
                .expect("comment service mutex poisoned");
            assert!(matches!(
                locked_comment_service.update_comment_result.calls(),
                [(4, text)] if text == "Looks good"
            ));
        }

        #[tokio::test]
        async fn returns_404_for_missing_comment() {
            let mut comment_service_raw = MockCommentService::new();
            let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();

            comment_service_raw
                .update_comment_result
                .set_returned_result(Err(domain::Error::CommentNotFound(7)));
            let comment_service = Mutex::new(comment_service_raw);

            let update_response = update_comment(
                7,
                dto::UpdateComment {
                    text: "Hello?".to_owned(),
                },
                &mut ext_cxn,
                &comment_service,
            )
            .await;
            let real_response = update_response.into_response();

            assert_eq!(StatusCode::NOT_FOUND, real_response.status());
        }
    }

    mod delete_comment {
        use super::*;

        #[tokio::test]
        async fn happy_path() {
            let mut comment_service_raw = MockCommentService::new();
            let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();

            comment_service_raw
                .delete_comment_result
                .set_returned_result(Ok(()));
            let comment_service = Mutex::new(comment_service_raw);

            let delete_response = delete_comment(4, &mut ext_cxn, &comment_service).await;
            assert_that!(delete_response).is_ok_containing(StatusCode::NO_CONTENT);
        }

        #[tokio::test]
        async fn returns_404_for_missing_comment() {
            let mut comment_service_raw = MockCommentService::new();
            let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();

            comment_service_raw
                .delete_comment_result
                .set_returned_result(Err(domain::Error::CommentNotFound(4)));
            let comment_service = Mutex::new(comment_service_raw);

            let delete_response = delete_comment(4, &mut ext_cxn, &comment_service).await;
            let real_response = delete_response.into_response();

            assert_eq!(StatusCode::NOT_FOUND, real_response.status());
        }
    }
}
