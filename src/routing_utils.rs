use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum_macros::FromRequest;

use serde::Serialize;
use utoipa::openapi::{RefOr, Schema};
use utoipa::{ToResponse, ToSchema, openapi};

use crate::domain;
use validator::ValidationErrors;

/// Contains diagnostic information about an API failure
#[derive(Serialize, Debug, ToResponse, ToSchema)]
#[cfg_attr(test, derive(serde::Deserialize))]
#[response(examples(
    ("Not Found" = (
        summary = "Entity could not be found (404)",
        value = json!({
            "error_code": "not_found",
            "error_description": "task with ID 5 could not be found",
            "extra_info": null
        })
    )),

    ("Internal Failure" = (
        summary = "Something unexpected went wrong inside the server (500)",
        value = json!({
            "error_code": "internal_error",
            "error_description": "Could not access data to complete your request",
            "extra_info": null
        })
    )),

    ("Invalid Input" = (
        summary = "Invalid request body was passed (400)",
        value = json!({
            "error_code": "invalid_input",
            "error_description": "Submitted data was invalid.",
            "extra_info": {
                "title": [
                    {
                        "code": "length",
                        "message": null,
                        "params": {
                            "value": "",
                            "min": 1
                        }
                    }
                ]
            }
        })
    )),

    ("Malformed JSON" = (
        summary = "Invalid JSON passed to server (400)",
        value = json!({
            "error_code": "invalid_json",
            "error_description": "The passed request body contained malformed or unreadable JSON.",
            "extra_info": "Failed to parse the request body as JSON: EOF while parsing an object at line 4 column 0"
        })
    ))
))]
pub struct BasicErrorResponse {
    pub error_code: String,
    pub error_description: String,
    pub extra_info: Option<ExtraInfo>,
}

#[derive(Serialize, Debug, ToSchema)]
#[cfg_attr(test, derive(serde::Deserialize))]
#[serde(untagged)]
pub enum ExtraInfo {
    ValidationIssues(ValidationErrorSchema),
    Message(String),
}

/// Stand-in OpenAPI schema for [ValidationErrors] which just provides an empty object
#[derive(Serialize, Debug)]
#[serde(transparent)]
pub struct ValidationErrorSchema(pub ValidationErrors);

// [ValidationErrors] can't be rebuilt from JSON, and round-tripping tests only care
// that validation details were attached
#[cfg(test)]
impl<'de> serde::Deserialize<'de> for ValidationErrorSchema {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let _ = serde_json::Value::deserialize(deserializer)?;
        Ok(ValidationErrorSchema(ValidationErrors::new()))
    }
}

impl<'schem> ToSchema<'schem> for ValidationErrorSchema {
    fn schema() -> (&'schem str, RefOr<Schema>) {
        (
            "ValidationErrorSchema",
            openapi::ObjectBuilder::new().into(),
        )
    }
}

/// Response type that translates domain failures into [BasicErrorResponse]s with the
/// matching HTTP status code
pub struct DomainErrorResponse(pub domain::Error);

impl From<domain::Error> for DomainErrorResponse {
    fn from(value: domain::Error) -> Self {
        Self(value)
    }
}

impl IntoResponse for DomainErrorResponse {
    fn into_response(self) -> Response {
        match self.0 {
            err @ (domain::Error::TaskNotFound(_)
            | domain::Error::CommentNotFound(_)
            | domain::Error::UserNotFound(_)
            | domain::Error::UnknownUsername(_)) => (
                StatusCode::NOT_FOUND,
                Json(BasicErrorResponse {
                    error_code: "not_found".into(),
                    error_description: err.to_string(),
                    extra_info: None,
                }),
            )
                .into_response(),

            err @ (domain::Error::InvalidStatus(_) | domain::Error::InvalidPriority(_)) => (
                StatusCode::BAD_REQUEST,
                Json(BasicErrorResponse {
                    error_code: "invalid_input".into(),
                    error_description: err.to_string(),
                    extra_info: None,
                }),
            )
                .into_response(),

            err @ (domain::Error::DuplicateUsername(_) | domain::Error::DuplicateEmail(_)) => (
                StatusCode::BAD_REQUEST,
                Json(BasicErrorResponse {
                    error_code: "conflict".into(),
                    error_description: err.to_string(),
                    extra_info: None,
                }),
            )
                .into_response(),

            domain::Error::PortError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(BasicErrorResponse {
                    error_code: "internal_error".into(),
                    error_description: "Could not access data to complete your request".into(),
                    extra_info: None,
                }),
            )
                .into_response(),
        }
    }
}

/// Response type that wraps validation errors and turns them into [BasicErrorResponse]s
pub struct ValidationErrorResponse(pub ValidationErrors);

impl IntoResponse for ValidationErrorResponse {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(BasicErrorResponse {
                error_code: "invalid_input".into(),
                error_description: "Submitted data was invalid.".to_owned(),
                extra_info: Some(ExtraInfo::ValidationIssues(ValidationErrorSchema(self.0))),
            }),
        )
            .into_response()
    }
}

impl From<ValidationErrors> for ValidationErrorResponse {
    fn from(value: ValidationErrors) -> Self {
        Self(value)
    }
}

/// Wrapper for [axum::Json] which customizes the error response to use our
/// data structure for API errors
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(JsonErrorResponse))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Json<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Json").field(&self.0).finish()
    }
}

/// Response type representing JSON parse errors
pub struct JsonErrorResponse {
    parse_problem: String,
}

impl From<JsonRejection> for JsonErrorResponse {
    fn from(value: JsonRejection) -> Self {
        JsonErrorResponse {
            parse_problem: value.body_text(),
        }
    }
}

impl IntoResponse for JsonErrorResponse {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            axum::Json(BasicErrorResponse {
                error_code: "invalid_json".into(),
                error_description:
                    "The passed request body contained malformed or unreadable JSON.".into(),
                extra_info: Some(ExtraInfo::Message(self.parse_problem)),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod domain_error_response_tests {
    use super::*;
    use crate::api::test_util::deserialize_body;
    use speculoos::prelude::*;

    async fn status_and_code(err: domain::Error) -> (StatusCode, String) {
        let response = DomainErrorResponse(err).into_response();
        let status = response.status();
        let body: BasicErrorResponse = deserialize_body(response.into_body()).await;
        (status, body.error_code)
    }

    #[tokio::test]
    async fn missing_entities_map_to_404() {
        for err in [
            domain::Error::TaskNotFound(1),
            domain::Error::CommentNotFound(2),
            domain::Error::UserNotFound(3),
            domain::Error::UnknownUsername("ghost".to_owned()),
        ] {
            let (status, error_code) = status_and_code(err).await;
            assert_eq!(StatusCode::NOT_FOUND, status);
            assert_that!(error_code).is_equal_to("not_found".to_owned());
        }
    }

    #[tokio::test]
    async fn bad_enum_values_map_to_400() {
        let (status, error_code) =
            status_and_code(domain::Error::InvalidStatus("URGENT".to_owned())).await;
        assert_eq!(StatusCode::BAD_REQUEST, status);
        assert_that!(error_code).is_equal_to("invalid_input".to_owned());
    }

    #[tokio::test]
    async fn uniqueness_conflicts_map_to_400() {
        let (status, error_code) =
            status_and_code(domain::Error::DuplicateUsername("alice".to_owned())).await;
        assert_eq!(StatusCode::BAD_REQUEST, status);
        assert_that!(error_code).is_equal_to("conflict".to_owned());
    }

    #[tokio::test]
    async fn port_failures_map_to_500() {
        let (status, error_code) =
            status_and_code(domain::Error::PortError(anyhow::anyhow!("db exploded"))).await;
        assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, status);
        assert_that!(error_code).is_equal_to("internal_error".to_owned());
    }
}
