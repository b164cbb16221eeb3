use crate::domain;
use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// DTO for creating or fully overwriting a user via the API
#[derive(Deserialize, Display, Validate, ToSchema)]
#[display("{username} <{email}>")]
#[cfg_attr(test, derive(Serialize))]
pub struct UserData {
    #[validate(length(min = 1, max = 50))]
    #[schema(example = "alice")]
    pub username: String,
    #[validate(email)]
    #[schema(example = "alice@example.com")]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

impl From<UserData> for domain::user::UserContent {
    fn from(value: UserData) -> Self {
        domain::user::UserContent {
            username: value.username,
            email: value.email,
            password: value.password,
        }
    }
}

/// DTO for a returned user on the API. The stored password never leaves the server.
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, PartialEq, Debug))]
pub struct User {
    #[schema(example = 4)]
    pub id: i32,
    #[schema(example = "alice")]
    pub username: String,
    #[schema(example = "alice@example.com")]
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<domain::user::User> for User {
    fn from(value: domain::user::User) -> Self {
        User {
            id: value.id,
            username: value.username,
            email: value.email,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}
