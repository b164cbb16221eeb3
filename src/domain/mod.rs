use thiserror::Error;

pub mod comment;
pub mod task;
pub mod user;

#[cfg(test)]
pub mod test_util;

/// Failures domain services can surface. Every variant carries enough information to
/// produce a human-readable message naming the offending id or value; translating a
/// variant into an HTTP status code is the serving layer's job alone.
#[derive(Debug, Error)]
pub enum Error {
    #[error("task with ID {0} could not be found")]
    TaskNotFound(i32),
    #[error("comment with ID {0} could not be found")]
    CommentNotFound(i32),
    #[error("user with ID {0} could not be found")]
    UserNotFound(i32),
    #[error("no user with username \"{0}\" exists")]
    UnknownUsername(String),
    #[error("\"{0}\" is not a valid task status")]
    InvalidStatus(String),
    #[error("\"{0}\" is not a valid task priority")]
    InvalidPriority(String),
    #[error("a user with username \"{0}\" already exists")]
    DuplicateUsername(String),
    #[error("a user with email \"{0}\" already exists")]
    DuplicateEmail(String),
    #[error(transparent)]
    PortError(#[from] anyhow::Error),
}

#[cfg(test)]
#[allow(clippy::items_after_test_module)]
mod error_clone {
    use super::Error;
    use anyhow::anyhow;

    // anyhow::Error isn't Clone, so an equivalent error is rebuilt from its message.
    impl Clone for Error {
        fn clone(&self) -> Self {
            match self {
                Self::TaskNotFound(id) => Self::TaskNotFound(*id),
                Self::CommentNotFound(id) => Self::CommentNotFound(*id),
                Self::UserNotFound(id) => Self::UserNotFound(*id),
                Self::UnknownUsername(name) => Self::UnknownUsername(name.clone()),
                Self::InvalidStatus(value) => Self::InvalidStatus(value.clone()),
                Self::InvalidPriority(value) => Self::InvalidPriority(value.clone()),
                Self::DuplicateUsername(name) => Self::DuplicateUsername(name.clone()),
                Self::DuplicateEmail(email) => Self::DuplicateEmail(email.clone()),
                Self::PortError(err) => Self::PortError(anyhow!(format!("{}", err))),
            }
        }
    }
}
