use super::{Count, NewId};
use crate::domain;
use crate::domain::comment::Comment;
use crate::domain::task::{Task, TaskRecord};
use crate::domain::user::UserRef;
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use anyhow::{Context, Error};
use chrono::{DateTime, Utc};
use sqlx::{query, query_as};
use std::collections::HashMap;

pub struct DbTaskReader {}

#[derive(sqlx::FromRow)]
struct TaskRow {
    id: i32,
    title: String,
    description: String,
    completed: bool,
    status: Option<String>,
    priority: Option<String>,
    author_id: Option<i32>,
    author_username: Option<String>,
    executor_id: Option<i32>,
    executor_username: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

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

fn user_ref_from_columns(id: Option<i32>, username: Option<String>) -> Option<UserRef> {
    match (id, username) {
        (Some(id), Some(username)) => Some(UserRef { id, username }),
        _ => None,
    }
}

impl TaskRow {
    fn into_task(self, comments: Vec<Comment>) -> Result<Task, Error> {
        // Status and priority are persisted as their symbolic names
        let status = self
            .status
            .map(|raw_status| raw_status.parse::<domain::task::TaskStatus>())
            .transpose()
            .context("reading a task status from the database")?;
        let priority = self
            .priority
            .map(|raw_priority| raw_priority.parse::<domain::task::TaskPriority>())
            .transpose()
            .context("reading a task priority from the database")?;

        Ok(Task {
            id: self.id,
            title: self.title,
            description: self.description,
            completed: self.completed,
            status,
            priority,
            author: user_ref_from_columns(self.author_id, self.author_username),
            executor: user_ref_from_columns(self.executor_id, self.executor_username),
            comments,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const TASK_SELECT: &str = "SELECT t.id, t.title, t.description, t.completed, t.status, t.priority, \
     t.author_id, au.username AS author_username, \
     t.executor_id, eu.username AS executor_username, \
     t.created_at, t.updated_at \
     FROM task t \
     LEFT JOIN users au ON au.id = t.author_id \
     LEFT JOIN users eu ON eu.id = t.executor_id";

impl domain::task::driven_ports::TaskReader for DbTaskReader {
    async fn get_all(&self, ext_cxn: &mut impl ExternalConnectivity) -> Result<Vec<Task>, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let task_rows =
            query_as::<_, TaskRow>(&format!("{TASK_SELECT} ORDER BY t.id"))
                .fetch_all(cxn.borrow_connection())
                .await
                .context("Fetching all tasks")?;

        let task_ids: Vec<i32> = task_rows.iter().map(|row| row.id).collect();
        let comment_rows = query_as::<_, CommentRow>(
            "SELECT c.* FROM comments c WHERE c.task_id = ANY($1) ORDER BY c.id",
        )
        .bind(&task_ids)
        .fetch_all(cxn.borrow_connection())
        .await
        .context("Fetching comments attached to tasks")?;

        let mut comments_by_task: HashMap<i32, Vec<Comment>> = HashMap::new();
        for comment_row in comment_rows {
            comments_by_task
                .entry(comment_row.task_id)
                .or_default()
                .push(Comment::from(comment_row));
        }

        task_rows
            .into_iter()
            .map(|row| {
                let comments = comments_by_task.remove(&row.id).unwrap_or_default();
                row.into_task(comments)
            })
            .collect()
    }

    async fn get_by_id(
        &self,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<Task>, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let task_row = query_as::<_, TaskRow>(&format!("{TASK_SELECT} WHERE t.id = $1"))
            .bind(task_id)
            .fetch_optional(cxn.borrow_connection())
            .await
            .context("Fetching a task by ID")?;

        let Some(task_row) = task_row else {
            return Ok(None);
        };

        let comments = query_as::<_, CommentRow>(
            "SELECT c.* FROM comments c WHERE c.task_id = $1 ORDER BY c.id",
        )
        .bind(task_id)
        .fetch_all(cxn.borrow_connection())
        .await
        .context("Fetching comments attached to a task")?
        .into_iter()
        .map(Comment::from)
        .collect();

        Ok(Some(task_row.into_task(comments)?))
    }
}

pub struct DbDetectTask {}

impl domain::task::driven_ports::DetectTask for DbDetectTask {
    async fn task_exists(
        &self,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<bool, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let task_with_id_count =
            query_as::<_, Count>("SELECT count(*) FROM task t WHERE t.id = $1")
                .bind(task_id)
                .fetch_one(cxn.borrow_connection())
                .await
                .context("Detecting task with ID")?;

        Ok(task_with_id_count.count() > 0)
    }
}

pub struct DbTaskWriter {}

impl domain::task::driven_ports::TaskWriter for DbTaskWriter {
    async fn create_task(
        &self,
        record: &TaskRecord,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<i32, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let inserted = query_as::<_, NewId>(
            "INSERT INTO task(title, description, completed, status, priority, author_id, executor_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING task.id",
        )
        .bind(&record.title)
        .bind(&record.description)
        .bind(record.completed)
        .bind(record.status.map(|status| status.as_str()))
        .bind(record.priority.map(|priority| priority.as_str()))
        .bind(record.author.as_ref().map(|author| author.id))
        .bind(record.executor.as_ref().map(|executor| executor.id))
        .bind(record.created_at)
        .bind(record.updated_at)
        .fetch_one(cxn.borrow_connection())
        .await
        .context("Inserting new task")?;

        Ok(inserted.id)
    }

    async fn update_task(
        &self,
        task_id: i32,
        record: &TaskRecord,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<(), Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        query(
            "UPDATE task SET title = $1, description = $2, completed = $3, status = $4, \
             priority = $5, author_id = $6, executor_id = $7, updated_at = $8 WHERE id = $9",
        )
        .bind(&record.title)
        .bind(&record.description)
        .bind(record.completed)
        .bind(record.status.map(|status| status.as_str()))
        .bind(record.priority.map(|priority| priority.as_str()))
        .bind(record.author.as_ref().map(|author| author.id))
        .bind(record.executor.as_ref().map(|executor| executor.id))
        .bind(record.updated_at)
        .bind(task_id)
        .execute(cxn.borrow_connection())
        .await
        .context("Updating a task")?;

        Ok(())
    }

    async fn delete_task(
        &self,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<(), Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        query("DELETE FROM task WHERE id = $1")
            .bind(task_id)
            .execute(cxn.borrow_connection())
            .await
            .context("Removing a task")?;

        Ok(())
    }

    async fn detach_user(
        &self,
        user_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<(), Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        query("UPDATE task SET author_id = NULL WHERE author_id = $1")
            .bind(user_id)
            .execute(cxn.borrow_connection())
            .await
            .context("Detaching a user from authored tasks")?;
        query("UPDATE task SET executor_id = NULL WHERE executor_id = $1")
            .bind(user_id)
            .execute(cxn.borrow_connection())
            .await
            .context("Detaching a user from assigned tasks")?;

        Ok(())
    }
}
