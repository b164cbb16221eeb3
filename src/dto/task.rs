use crate::domain;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// DTO for creating or updating a task via the API. Status and priority arrive as
/// free text and only convert to a known value case-insensitively.
#[derive(Deserialize, Validate, ToSchema)]
#[cfg_attr(test, derive(Serialize, Default))]
pub struct TaskData {
    #[validate(length(min = 1))]
    #[schema(example = "Write the quarterly report")]
    pub title: String,
    #[serde(default)]
    #[schema(example = "Numbers for Q3 are in the shared drive")]
    pub description: String,
    pub completed: Option<bool>,
    #[schema(example = "IN_PROGRESS")]
    pub status: Option<String>,
    #[schema(example = "HIGH")]
    pub priority: Option<String>,
    #[schema(example = "alice")]
    pub author: Option<String>,
    #[schema(example = "bob")]
    pub executor: Option<String>,
}

impl TryFrom<TaskData> for domain::task::TaskChanges {
    type Error = domain::Error;

    fn try_from(value: TaskData) -> Result<Self, Self::Error> {
        let status = value
            .status
            .map(|raw_status| raw_status.parse::<domain::task::TaskStatus>())
            .transpose()?;
        let priority = value
            .priority
            .map(|raw_priority| raw_priority.parse::<domain::task::TaskPriority>())
            .transpose()?;

        Ok(domain::task::TaskChanges {
            title: value.title,
            description: value.description,
            completed: value.completed,
            status,
            priority,
            author: value.author,
            executor: value.executor,
        })
    }
}

/// DTO for a returned task on the API. Author and executor are flattened to their
/// usernames, comments ride along nested.
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, PartialEq, Debug))]
pub struct Task {
    #[schema(example = 10)]
    pub id: i32,
    #[schema(example = "Write the quarterly report")]
    pub title: String,
    pub description: String,
    pub completed: bool,
    #[schema(example = "WAITING")]
    pub status: Option<String>,
    #[schema(example = "MEDIUM")]
    pub priority: Option<String>,
    #[schema(example = "alice")]
    pub author: Option<String>,
    #[schema(example = "bob")]
    pub executor: Option<String>,
    pub comments: Vec<super::comment::Comment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<domain::task::Task> for Task {
    fn from(value: domain::task::Task) -> Self {
        Task {
            id: value.id,
            title: value.title,
            description: value.description,
            completed: value.completed,
            status: value.status.map(|status| status.as_str().to_owned()),
            priority: value.priority.map(|priority| priority.as_str().to_owned()),
            author: value.author.map(|author| author.username),
            executor: value.executor.map(|executor| executor.username),
            comments: value
                .comments
                .into_iter()
                .map(super::comment::Comment::from)
                .collect(),
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}
