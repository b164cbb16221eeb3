use crate::domain;
use crate::domain::Error;
use crate::external_connections::ExternalConnectivity;
use anyhow::Context;
use chrono::{DateTime, Utc};
use log::info;

/// A comment attached to a task. The owning task never changes after creation.
#[derive(PartialEq, Debug)]
#[cfg_attr(test, derive(Clone))]
pub struct Comment {
    pub id: i32,
    pub text: String,
    pub task_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data required to attach a new comment to a task
#[cfg_attr(test, derive(Clone, PartialEq, Debug))]
pub struct NewComment {
    pub text: String,
    pub task_id: i32,
}

pub mod driven_ports {
    use super::*;

    #[allow(async_fn_in_trait)]
    pub trait CommentReader: Sync {
        async fn get_by_id(
            &self,
            comment_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<Comment>, anyhow::Error>;
        async fn get_for_task(
            &self,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Vec<Comment>, anyhow::Error>;
    }

    #[allow(async_fn_in_trait)]
    pub trait CommentWriter: Sync {
        async fn create_comment(
            &self,
            new_comment: &NewComment,
            created_at: DateTime<Utc>,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<i32, anyhow::Error>;
        async fn update_comment_text(
            &self,
            comment_id: i32,
            new_text: &str,
            updated_at: DateTime<Utc>,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<(), anyhow::Error>;
        async fn delete_comment(
            &self,
            comment_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<(), anyhow::Error>;
        /// Drops every comment owned by the given task, used when the task itself goes away
        async fn delete_comments_for_task(
            &self,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<(), anyhow::Error>;
    }
}

pub mod driving_ports {
    use super::*;

    #[allow(async_fn_in_trait)]
    pub trait CommentPort {
        async fn comment_by_id(
            &self,
            comment_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
            comment_read: &impl driven_ports::CommentReader,
        ) -> Result<Comment, Error>;
        /// Listing never checks whether the task exists - a deleted or unknown task
        /// simply has no comments
        async fn comments_for_task(
            &self,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
            comment_read: &impl driven_ports::CommentReader,
        ) -> Result<Vec<Comment>, Error>;
        async fn create_comment(
            &self,
            new_comment: &NewComment,
            ext_cxn: &mut impl ExternalConnectivity,
            task_detect: &impl domain::task::driven_ports::DetectTask,
            comment_write: &impl driven_ports::CommentWriter,
        ) -> Result<Comment, Error>;
        async fn update_comment(
            &self,
            comment_id: i32,
            new_text: &str,
            ext_cxn: &mut impl ExternalConnectivity,
            comment_read: &impl driven_ports::CommentReader,
            comment_write: &impl driven_ports::CommentWriter,
        ) -> Result<Comment, Error>;
        async fn delete_comment(
            &self,
            comment_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
            comment_read: &impl driven_ports::CommentReader,
            comment_write: &impl driven_ports::CommentWriter,
        ) -> Result<(), Error>;
    }
}

pub struct CommentService {}

impl driving_ports::CommentPort for CommentService {
    async fn comment_by_id(
        &self,
        comment_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
        comment_read: &impl driven_ports::CommentReader,
    ) -> Result<Comment, Error> {
        info!("Fetching comment {comment_id}");
        let comment = comment_read
            .get_by_id(comment_id, ext_cxn)
            .await
            .context("fetching a comment by ID")?;

        comment.ok_or(Error::CommentNotFound(comment_id))
    }

    async fn comments_for_task(
        &self,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
        comment_read: &impl driven_ports::CommentReader,
    ) -> Result<Vec<Comment>, Error> {
        info!("Fetching comments on task {task_id}");
        let comments = comment_read
            .get_for_task(task_id, &mut *ext_cxn)
            .await
            .context("listing comments on a task")?;

        Ok(comments)
    }

    async fn create_comment(
        &self,
        new_comment: &NewComment,
        ext_cxn: &mut impl ExternalConnectivity,
        task_detect: &impl domain::task::driven_ports::DetectTask,
        comment_write: &impl driven_ports::CommentWriter,
    ) -> Result<Comment, Error> {
        info!("Creating comment on task {}", new_comment.task_id);
        domain::task::verify_task_exists(new_comment.task_id, &mut *ext_cxn, task_detect).await?;

        let now = Utc::now();
        let new_id = comment_write
            .create_comment(new_comment, now, &mut *ext_cxn)
            .await
            .context("persisting a new comment")?;

        Ok(Comment {
            id: new_id,
            text: new_comment.text.clone(),
            task_id: new_comment.task_id,
            created_at: now,
            updated_at: now,
        })
    }

    async fn update_comment(
        &self,
        comment_id: i32,
        new_text: &str,
        ext_cxn: &mut impl ExternalConnectivity,
        comment_read: &impl driven_ports::CommentReader,
        comment_write: &impl driven_ports::CommentWriter,
    ) -> Result<Comment, Error> {
        info!("Updating comment {comment_id}");
        let existing = comment_read
            .get_by_id(comment_id, &mut *ext_cxn)
            .await
            .context("fetching a comment before update")?
            .ok_or(Error::CommentNotFound(comment_id))?;

        // Only the text is mutable, the owning task sticks for the comment's lifetime
        let now = Utc::now();
        comment_write
            .update_comment_text(comment_id, new_text, now, &mut *ext_cxn)
            .await
            .context("persisting a comment update")?;

        Ok(Comment {
            id: comment_id,
            text: new_text.to_owned(),
            task_id: existing.task_id,
            created_at: existing.created_at,
            updated_at: now,
        })
    }

    async fn delete_comment(
        &self,
        comment_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
        comment_read: &impl driven_ports::CommentReader,
        comment_write: &impl driven_ports::CommentWriter,
    ) -> Result<(), Error> {
        info!("Deleting comment {comment_id}");
        let existing = comment_read
            .get_by_id(comment_id, &mut *ext_cxn)
            .await
            .context("fetching a comment before deletion")?;
        if existing.is_none() {
            return Err(Error::CommentNotFound(comment_id));
        }

        comment_write
            .delete_comment(comment_id, &mut *ext_cxn)
            .await
            .context("removing a comment from the store")?;

        Ok(())
    }
}
