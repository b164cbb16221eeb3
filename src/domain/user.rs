use crate::domain;
use crate::domain::Error;
use crate::external_connections::{ExternalConnectivity, Transactable, TransactionHandle};
use anyhow::Context;
use chrono::{DateTime, Utc};
use log::info;

/// A registered user of the task manager
#[derive(PartialEq, Debug)]
#[cfg_attr(test, derive(Clone))]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub password: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A resolved, non-owning reference to a user, carried by tasks for their
/// author and executor fields
#[derive(Clone, PartialEq, Debug)]
pub struct UserRef {
    pub id: i32,
    pub username: String,
}

/// The mutable fields of a user. Used both when registering a user and when
/// overwriting one, since updates replace every field.
#[cfg_attr(test, derive(Clone, Debug))]
pub struct UserContent {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// A full user record as handed to the store on creation
pub struct UserRecord {
    pub content: UserContent,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub mod driven_ports {
    use super::*;
    use crate::external_connections::ExternalConnectivity;

    #[allow(async_fn_in_trait)]
    pub trait UserReader: Sync {
        async fn get_all(
            &self,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Vec<User>, anyhow::Error>;
        async fn get_by_id(
            &self,
            id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<User>, anyhow::Error>;
        async fn get_by_username(
            &self,
            username: &str,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<User>, anyhow::Error>;
    }

    #[allow(async_fn_in_trait)]
    pub trait UserWriter: Sync {
        async fn create_user(
            &self,
            user: &UserRecord,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<i32, anyhow::Error>;
        async fn update_user(
            &self,
            user_id: i32,
            content: &UserContent,
            updated_at: DateTime<Utc>,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<(), anyhow::Error>;
        async fn delete_user(
            &self,
            user_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<(), anyhow::Error>;
    }

    #[allow(async_fn_in_trait)]
    pub trait DetectUser: Sync {
        async fn user_exists(
            &self,
            user_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<bool, anyhow::Error>;
        async fn username_exists(
            &self,
            username: &str,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<bool, anyhow::Error>;
        async fn email_exists(
            &self,
            email: &str,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<bool, anyhow::Error>;
    }
}

pub mod driving_ports {
    use super::*;

    #[allow(async_fn_in_trait)]
    pub trait UserPort {
        async fn user_by_id(
            &self,
            user_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
            u_reader: &impl driven_ports::UserReader,
        ) -> Result<User, Error>;
        async fn all_users(
            &self,
            ext_cxn: &mut impl ExternalConnectivity,
            u_reader: &impl driven_ports::UserReader,
        ) -> Result<Vec<User>, Error>;
        async fn create_user(
            &self,
            content: &UserContent,
            ext_cxn: &mut impl ExternalConnectivity,
            u_detect: &impl driven_ports::DetectUser,
            u_writer: &impl driven_ports::UserWriter,
        ) -> Result<User, Error>;
        async fn update_user(
            &self,
            user_id: i32,
            content: &UserContent,
            ext_cxn: &mut impl ExternalConnectivity,
            u_reader: &impl driven_ports::UserReader,
            u_writer: &impl driven_ports::UserWriter,
        ) -> Result<User, Error>;
        async fn delete_user(
            &self,
            user_id: i32,
            ext_cxn: &impl Transactable,
            u_detect: &impl driven_ports::DetectUser,
            task_write: &impl domain::task::driven_ports::TaskWriter,
            u_writer: &impl driven_ports::UserWriter,
        ) -> Result<(), Error>;
    }
}

/// Resolves a username mentioned in a transfer object to a [UserRef] against the user store.
/// The task mapping layer uses this for author/executor fields.
pub(super) async fn resolve_username(
    username: &str,
    ext_cxn: &mut impl ExternalConnectivity,
    u_reader: &impl driven_ports::UserReader,
) -> Result<UserRef, Error> {
    let user = u_reader
        .get_by_username(username, ext_cxn)
        .await
        .context("resolving a username reference")?;

    match user {
        Some(user) => Ok(UserRef {
            id: user.id,
            username: user.username,
        }),
        None => Err(Error::UnknownUsername(username.to_owned())),
    }
}

pub struct UserService {}

impl driving_ports::UserPort for UserService {
    async fn user_by_id(
        &self,
        user_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
        u_reader: &impl driven_ports::UserReader,
    ) -> Result<User, Error> {
        info!("Fetching user {user_id}");
        let user = u_reader
            .get_by_id(user_id, ext_cxn)
            .await
            .context("fetching a user by ID")?;

        user.ok_or(Error::UserNotFound(user_id))
    }

    async fn all_users(
        &self,
        ext_cxn: &mut impl ExternalConnectivity,
        u_reader: &impl driven_ports::UserReader,
    ) -> Result<Vec<User>, Error> {
        info!("Fetching all users");
        let users = u_reader
            .get_all(ext_cxn)
            .await
            .context("fetching all users")?;

        Ok(users)
    }

    async fn create_user(
        &self,
        content: &UserContent,
        ext_cxn: &mut impl ExternalConnectivity,
        u_detect: &impl driven_ports::DetectUser,
        u_writer: &impl driven_ports::UserWriter,
    ) -> Result<User, Error> {
        info!("Creating user \"{}\"", content.username);

        // Check-then-act: two concurrent registrations with the same username can both
        // pass this check. The database's unique constraints are the backstop.
        let username_taken = u_detect
            .username_exists(&content.username, ext_cxn)
            .await
            .context("checking username uniqueness")?;
        if username_taken {
            return Err(Error::DuplicateUsername(content.username.clone()));
        }

        let email_taken = u_detect
            .email_exists(&content.email, ext_cxn)
            .await
            .context("checking email uniqueness")?;
        if email_taken {
            return Err(Error::DuplicateEmail(content.email.clone()));
        }

        let now = Utc::now();
        let record = UserRecord {
            content: UserContent {
                username: content.username.clone(),
                email: content.email.clone(),
                password: content.password.clone(),
            },
            created_at: now,
            updated_at: now,
        };
        let new_id = u_writer
            .create_user(&record, ext_cxn)
            .await
            .context("persisting a new user")?;

        Ok(User {
            id: new_id,
            username: record.content.username,
            email: record.content.email,
            password: record.content.password,
            created_at: now,
            updated_at: now,
        })
    }

    async fn update_user(
        &self,
        user_id: i32,
        content: &UserContent,
        ext_cxn: &mut impl ExternalConnectivity,
        u_reader: &impl driven_ports::UserReader,
        u_writer: &impl driven_ports::UserWriter,
    ) -> Result<User, Error> {
        info!("Updating user {user_id}");
        let existing = u_reader
            .get_by_id(user_id, ext_cxn)
            .await
            .context("fetching a user before update")?
            .ok_or(Error::UserNotFound(user_id))?;

        // Full overwrite. Uniqueness is deliberately not re-checked here, matching the
        // behavior this service replaces (see DESIGN.md).
        let now = Utc::now();
        u_writer
            .update_user(user_id, content, now, ext_cxn)
            .await
            .context("persisting a user update")?;

        Ok(User {
            id: user_id,
            username: content.username.clone(),
            email: content.email.clone(),
            password: content.password.clone(),
            created_at: existing.created_at,
            updated_at: now,
        })
    }

    async fn delete_user(
        &self,
        user_id: i32,
        ext_cxn: &impl Transactable,
        u_detect: &impl driven_ports::DetectUser,
        task_write: &impl domain::task::driven_ports::TaskWriter,
        u_writer: &impl driven_ports::UserWriter,
    ) -> Result<(), Error> {
        info!("Deleting user {user_id}");
        let mut tx_cxn = ext_cxn
            .start_transaction()
            .await
            .context("opening a transaction for user deletion")?;

        let user_present = u_detect
            .user_exists(user_id, &mut tx_cxn)
            .await
            .context("checking a user exists before deletion")?;
        if !user_present {
            return Err(Error::UserNotFound(user_id));
        }

        // Tasks referencing the user keep existing with their author/executor cleared
        task_write
            .detach_user(user_id, &mut tx_cxn)
            .await
            .context("detaching task references before user deletion")?;
        u_writer
            .delete_user(user_id, &mut tx_cxn)
            .await
            .context("removing a user from the store")?;
        tx_cxn
            .commit()
            .await
            .context("committing a user deletion")?;

        Ok(())
    }
}
