use crate::domain;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// DTO for attaching a new comment to a task via the API
#[derive(Deserialize, Validate, ToSchema)]
#[cfg_attr(test, derive(Serialize))]
pub struct NewComment {
    #[validate(length(min = 1))]
    #[schema(example = "Looks good to me")]
    pub text: String,
    #[schema(example = 10)]
    pub task_id: i32,
}

impl From<NewComment> for domain::comment::NewComment {
    fn from(value: NewComment) -> Self {
        domain::comment::NewComment {
            text: value.text,
            task_id: value.task_id,
        }
    }
}

/// DTO for editing a comment's text via the API
#[derive(Deserialize, Validate, ToSchema)]
#[cfg_attr(test, derive(Serialize))]
pub struct UpdateComment {
    #[validate(length(min = 1))]
    #[schema(example = "Looks good to me")]
    pub text: String,
}

/// DTO for a returned comment on the API
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, PartialEq, Debug))]
pub struct Comment {
    #[schema(example = 4)]
    pub id: i32,
    #[schema(example = "Looks good to me")]
    pub text: String,
    #[schema(example = 10)]
    pub task_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<domain::comment::Comment> for Comment {
    fn from(value: domain::comment::Comment) -> Self {
        Comment {
            id: value.id,
            text: value.text,
            task_id: value.task_id,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}
