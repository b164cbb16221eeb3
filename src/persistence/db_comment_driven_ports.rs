use super::NewId;
use crate::domain;
use crate::domain::comment::{Comment, NewComment};
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use anyhow::{Context, Error};
use chrono::{DateTime, Utc};
use sqlx::{query, query_as};

pub struct DbReadComments {}

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: i32,
    text: String,
    task_id: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(value: CommentRow) -> Self {
        Comment {
            id: value.id,
            text: value.text,
            task_id: value.task_id,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl domain::comment::driven_ports::CommentReader for DbReadComments {
    async fn get_by_id(
        &self,
        comment_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<Comment>, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let comment = query_as::<_, CommentRow>("SELECT c.* FROM comments c WHERE c.id = $1")
            .bind(comment_id)
            .fetch_optional(cxn.borrow_connection())
            .await
            .context("Fetching a comment by ID")?;

        Ok(comment.map(Comment::from))
    }

    async fn get_for_task(
        &self,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Vec<Comment>, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let comments = query_as::<_, CommentRow>(
            "SELECT c.* FROM comments c WHERE c.task_id = $1 ORDER BY c.id",
        )
        .bind(task_id)
        .fetch_all(cxn.borrow_connection())
        .await
        .context("Fetching comments on a task")?
        .into_iter()
        .map(Comment::from)
        .collect();

        Ok(comments)
    }
}

pub struct DbWriteComments {}

impl domain::comment::driven_ports::CommentWriter for DbWriteComments {
    async fn create_comment(
        &self,
        new_comment: &NewComment,
        created_at: DateTime<Utc>,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<i32, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let inserted = query_as::<_, NewId>(
            "INSERT INTO comments(text, task_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $3) RETURNING comments.id",
        )
        .bind(&new_comment.text)
        .bind(new_comment.task_id)
        .bind(created_at)
        .fetch_one(cxn.borrow_connection())
        .await
        .context("Inserting new comment")?;

        Ok(inserted.id)
    }

    async fn update_comment_text(
        &self,
        comment_id: i32,
        new_text: &str,
        updated_at: DateTime<Utc>,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<(), Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        query("UPDATE comments SET text = $1, updated_at = $2 WHERE id = $3")
            .bind(new_text)
            .bind(updated_at)
            .bind(comment_id)
            .execute(cxn.borrow_connection())
            .await
            .context("Updating a comment")?;

        Ok(())
    }

    async fn delete_comment(
        &self,
        comment_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<(), Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        query("DELETE FROM comments WHERE id = $1")
            .bind(comment_id)
            .execute(cxn.borrow_connection())
            .await
            .context("Removing a comment")?;

        Ok(())
    }

    async fn delete_comments_for_task(
        &self,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<(), Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        query("DELETE FROM comments WHERE task_id = $1")
            .bind(task_id)
            .execute(cxn.borrow_connection())
            .await
            .context("Removing every comment on a task")?;

        Ok(())
    }
}
