use super::{Count, NewId};
use crate::domain;
use crate::domain::user::{User, UserContent, UserRecord};
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use anyhow::{Context, Error};
use chrono::{DateTime, Utc};
use sqlx::{query, query_as};

pub struct DbDetectUser {}

impl domain::user::driven_ports::DetectUser for DbDetectUser {
    async fn user_exists(
        &self,
        user_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<bool, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let user_with_id_count =
            query_as::<_, Count>("SELECT count(*) FROM users u WHERE u.id = $1")
                .bind(user_id)
                .fetch_one(cxn.borrow_connection())
                .await
                .context("Detecting user with ID")?;

        Ok(user_with_id_count.count() > 0)
    }

    async fn username_exists(
        &self,
        username: &str,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<bool, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let username_count =
            query_as::<_, Count>("SELECT count(*) FROM users u WHERE u.username = $1")
                .bind(username)
                .fetch_one(cxn.borrow_connection())
                .await
                .context("Detecting user via username")?;

        Ok(username_count.count() > 0)
    }

    async fn email_exists(
        &self,
        email: &str,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<bool, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let email_count = query_as::<_, Count>("SELECT count(*) FROM users u WHERE u.email = $1")
            .bind(email)
            .fetch_one(cxn.borrow_connection())
            .await
            .context("Detecting user via email")?;

        Ok(email_count.count() > 0)
    }
}

pub struct DbReadUsers {}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i32,
    username: String,
    email: String,
    password: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(value: UserRow) -> Self {
        User {
            id: value.id,
            username: value.username,
            email: value.email,
            password: value.password,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl domain::user::driven_ports::UserReader for DbReadUsers {
    async fn get_all(&self, ext_cxn: &mut impl ExternalConnectivity) -> Result<Vec<User>, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let users = query_as::<_, UserRow>("SELECT * FROM users u ORDER BY u.id")
            .fetch_all(cxn.borrow_connection())
            .await
            .context("Fetching all users")?
            .into_iter()
            .map(User::from)
            .collect();

        Ok(users)
    }

    async fn get_by_id(
        &self,
        id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<User>, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let user = query_as::<_, UserRow>("SELECT * FROM users u WHERE u.id = $1")
            .bind(id)
            .fetch_optional(cxn.borrow_connection())
            .await
            .context("Fetching a user by id")?;

        Ok(user.map(User::from))
    }

    async fn get_by_username(
        &self,
        username: &str,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<User>, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let user = query_as::<_, UserRow>("SELECT * FROM users u WHERE u.username = $1")
            .bind(username)
            .fetch_optional(cxn.borrow_connection())
            .await
            .context("Fetching a user by username")?;

        Ok(user.map(User::from))
    }
}

pub struct DbWriteUsers {}

impl domain::user::driven_ports::UserWriter for DbWriteUsers {
    async fn create_user(
        &self,
        user: &UserRecord,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<i32, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let inserted = query_as::<_, NewId>(
            "INSERT INTO users(username, email, password, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5) RETURNING users.id",
        )
        .bind(&user.content.username)
        .bind(&user.content.email)
        .bind(&user.content.password)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(cxn.borrow_connection())
        .await
        .context("Inserting new user")?;

        Ok(inserted.id)
    }

    async fn update_user(
        &self,
        user_id: i32,
        content: &UserContent,
        updated_at: DateTime<Utc>,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<(), Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        query(
            "UPDATE users SET username = $1, email = $2, password = $3, updated_at = $4 \
             WHERE id = $5",
        )
        .bind(&content.username)
        .bind(&content.email)
        .bind(&content.password)
        .bind(updated_at)
        .bind(user_id)
        .execute(cxn.borrow_connection())
        .await
        .context("Updating a user")?;

        Ok(())
    }

    async fn delete_user(
        &self,
        user_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<(), Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(cxn.borrow_connection())
            .await
            .context("Removing a user")?;

        Ok(())
    }
}
