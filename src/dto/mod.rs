use utoipa::OpenApi;

pub mod comment;
pub mod task;
pub mod user;

pub use comment::{Comment, NewComment, UpdateComment};
pub use task::{Task, TaskData};
pub use user::{User, UserData};

/// Reusable OpenAPI error responses pointing at [crate::routing_utils::BasicErrorResponse]
pub mod err_resps {
    use crate::routing_utils::BasicErrorResponse;
    use utoipa::ToResponse;

    #[derive(ToResponse)]
    #[response(
        description = "Invalid request body was passed",
        example = json!({
            "error_code": "invalid_input",
            "error_description": "Submitted data was invalid.",
            "extra_info": null
        })
    )]
    pub struct BasicError400(#[allow(dead_code)] BasicErrorResponse);

    #[derive(ToResponse)]
    #[response(
        description = "Entity could not be found",
        example = json!({
            "error_code": "not_found",
            "error_description": "task with ID 5 could not be found",
            "extra_info": null
        })
    )]
    pub struct BasicError404(#[allow(dead_code)] BasicErrorResponse);

    #[derive(ToResponse)]
    #[response(
        description = "Something unexpected went wrong inside the server",
        example = json!({
            "error_code": "internal_error",
            "error_description": "Could not access data to complete your request",
            "extra_info": null
        })
    )]
    pub struct BasicError500(#[allow(dead_code)] BasicErrorResponse);
}

/// Collects the OpenAPI schemas for every DTO so they can be merged into the
/// top-level API documentation
#[derive(OpenApi)]
#[openapi(components(
    schemas(
        task::Task,
        task::TaskData,
        comment::Comment,
        comment::NewComment,
        comment::UpdateComment,
        user::User,
        user::UserData,
        crate::routing_utils::BasicErrorResponse,
        crate::routing_utils::ExtraInfo,
        crate::routing_utils::ValidationErrorSchema,
    ),
    responses(
        err_resps::BasicError400,
        err_resps::BasicError404,
        err_resps::BasicError500,
    )
))]
pub struct OpenApiSchemas;
