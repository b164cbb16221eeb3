use crate::domain;
use crate::domain::Error;
use crate::domain::comment::Comment;
use crate::domain::user::UserRef;
use crate::external_connections::{ExternalConnectivity, Transactable, TransactionHandle};
use anyhow::Context;
use chrono::{DateTime, Utc};
use log::info;
use std::str::FromStr;

/// Workflow state of a task. Any status may move to any other status, there is no
/// transition ordering.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TaskStatus {
    Waiting,
    InProgress,
    Completed,
}

impl TaskStatus {
    /// The symbolic name rendered on the API, e.g. `IN_PROGRESS`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "WAITING",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    // Free-text statuses parse case-insensitively or the whole operation fails
    fn from_str(value: &str) -> Result<Self, Error> {
        if value.eq_ignore_ascii_case("WAITING") {
            Ok(Self::Waiting)
        } else if value.eq_ignore_ascii_case("IN_PROGRESS") {
            Ok(Self::InProgress)
        } else if value.eq_ignore_ascii_case("COMPLETED") {
            Ok(Self::Completed)
        } else {
            Err(Error::InvalidStatus(value.to_owned()))
        }
    }
}

/// Importance of a task
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TaskPriority {
    High,
    Medium,
    Low,
}

impl TaskPriority {
    /// The symbolic name rendered on the API, e.g. `MEDIUM`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }
}

impl FromStr for TaskPriority {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Error> {
        if value.eq_ignore_ascii_case("HIGH") {
            Ok(Self::High)
        } else if value.eq_ignore_ascii_case("MEDIUM") {
            Ok(Self::Medium)
        } else if value.eq_ignore_ascii_case("LOW") {
            Ok(Self::Low)
        } else {
            Err(Error::InvalidPriority(value.to_owned()))
        }
    }
}

/// A task, including its owned comments and resolved author/executor references
#[derive(PartialEq, Debug)]
#[cfg_attr(test, derive(Clone))]
pub struct Task {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub author: Option<UserRef>,
    pub executor: Option<UserRef>,
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Incoming task fields after enum parsing but before username resolution. Used for
/// both creation and update - fields left as `None` stay unset on create and untouched
/// on update.
#[cfg_attr(test, derive(Clone, Debug))]
pub struct TaskChanges {
    pub title: String,
    pub description: String,
    pub completed: Option<bool>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub author: Option<String>,
    pub executor: Option<String>,
}

/// A fully resolved task as handed to the store for writes. Comments are owned rows of
/// their own and never travel through this struct.
pub struct TaskRecord {
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub author: Option<UserRef>,
    pub executor: Option<UserRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub mod driven_ports {
    use super::*;
    use crate::external_connections::ExternalConnectivity;

    #[allow(async_fn_in_trait)]
    pub trait TaskReader: Sync {
        async fn get_all(
            &self,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Vec<Task>, anyhow::Error>;
        async fn get_by_id(
            &self,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<Task>, anyhow::Error>;
    }

    #[allow(async_fn_in_trait)]
    pub trait DetectTask: Sync {
        async fn task_exists(
            &self,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<bool, anyhow::Error>;
    }

    #[allow(async_fn_in_trait)]
    pub trait TaskWriter: Sync {
        async fn create_task(
            &self,
            record: &TaskRecord,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<i32, anyhow::Error>;
        async fn update_task(
            &self,
            task_id: i32,
            record: &TaskRecord,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<(), anyhow::Error>;
        async fn delete_task(
            &self,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<(), anyhow::Error>;
        /// Clears author/executor references to a user on every task mentioning them.
        /// Used when the referenced user is deleted.
        async fn detach_user(
            &self,
            user_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<(), anyhow::Error>;
    }
}

pub mod driving_ports {
    use super::*;

    #[allow(async_fn_in_trait)]
    pub trait TaskPort {
        async fn task_by_id(
            &self,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
            task_read: &impl driven_ports::TaskReader,
        ) -> Result<Task, Error>;
        async fn all_tasks(
            &self,
            ext_cxn: &mut impl ExternalConnectivity,
            task_read: &impl driven_ports::TaskReader,
        ) -> Result<Vec<Task>, Error>;
        async fn create_task(
            &self,
            changes: &TaskChanges,
            ext_cxn: &mut impl ExternalConnectivity,
            u_reader: &impl domain::user::driven_ports::UserReader,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<Task, Error>;
        async fn update_task(
            &self,
            task_id: i32,
            changes: &TaskChanges,
            ext_cxn: &mut impl ExternalConnectivity,
            u_reader: &impl domain::user::driven_ports::UserReader,
            task_read: &impl driven_ports::TaskReader,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<Task, Error>;
        async fn delete_task(
            &self,
            task_id: i32,
            ext_cxn: &impl Transactable,
            task_detect: &impl driven_ports::DetectTask,
            comment_write: &impl domain::comment::driven_ports::CommentWriter,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<(), Error>;
    }
}

/// Fails with [Error::TaskNotFound] unless a task with the given ID is present in the store.
/// The comment service leans on this before attaching comments.
pub(super) async fn verify_task_exists(
    task_id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    task_detect: &impl driven_ports::DetectTask,
) -> Result<(), Error> {
    let task_present = task_detect
        .task_exists(task_id, ext_cxn)
        .await
        .context("detecting a task by ID")?;

    if task_present {
        Ok(())
    } else {
        Err(Error::TaskNotFound(task_id))
    }
}

pub struct TaskService {}

impl driving_ports::TaskPort for TaskService {
    async fn task_by_id(
        &self,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
        task_read: &impl driven_ports::TaskReader,
    ) -> Result<Task, Error> {
        info!("Fetching task {task_id}");
        let task = task_read
            .get_by_id(task_id, ext_cxn)
            .await
            .context("fetching a task by ID")?;

        task.ok_or(Error::TaskNotFound(task_id))
    }

    async fn all_tasks(
        &self,
        ext_cxn: &mut impl ExternalConnectivity,
        task_read: &impl driven_ports::TaskReader,
    ) -> Result<Vec<Task>, Error> {
        info!("Fetching all tasks");
        let tasks = task_read
            .get_all(ext_cxn)
            .await
            .context("fetching all tasks")?;

        Ok(tasks)
    }

    async fn create_task(
        &self,
        changes: &TaskChanges,
        ext_cxn: &mut impl ExternalConnectivity,
        u_reader: &impl domain::user::driven_ports::UserReader,
        task_write: &impl driven_ports::TaskWriter,
    ) -> Result<Task, Error> {
        info!("Creating task \"{}\"", changes.title);

        let author = match &changes.author {
            Some(username) => {
                Some(domain::user::resolve_username(username, &mut *ext_cxn, u_reader).await?)
            }
            None => None,
        };
        let executor = match &changes.executor {
            Some(username) => {
                Some(domain::user::resolve_username(username, &mut *ext_cxn, u_reader).await?)
            }
            None => None,
        };

        let now = Utc::now();
        let record = TaskRecord {
            title: changes.title.clone(),
            description: changes.description.clone(),
            completed: changes.completed.unwrap_or(false),
            status: changes.status,
            priority: changes.priority,
            author,
            executor,
            created_at: now,
            updated_at: now,
        };
        let new_id = task_write
            .create_task(&record, &mut *ext_cxn)
            .await
            .context("persisting a new task")?;

        Ok(Task {
            id: new_id,
            title: record.title,
            description: record.description,
            completed: record.completed,
            status: record.status,
            priority: record.priority,
            author: record.author,
            executor: record.executor,
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    async fn update_task(
        &self,
        task_id: i32,
        changes: &TaskChanges,
        ext_cxn: &mut impl ExternalConnectivity,
        u_reader: &impl domain::user::driven_ports::UserReader,
        task_read: &impl driven_ports::TaskReader,
        task_write: &impl driven_ports::TaskWriter,
    ) -> Result<Task, Error> {
        info!("Updating task {task_id}");
        let existing = task_read
            .get_by_id(task_id, &mut *ext_cxn)
            .await
            .context("fetching a task before update")?
            .ok_or(Error::TaskNotFound(task_id))?;

        // Title and description always overwrite; reference and enum fields only
        // change when the input supplies them
        let author = match &changes.author {
            Some(username) => {
                Some(domain::user::resolve_username(username, &mut *ext_cxn, u_reader).await?)
            }
            None => existing.author,
        };
        let executor = match &changes.executor {
            Some(username) => {
                Some(domain::user::resolve_username(username, &mut *ext_cxn, u_reader).await?)
            }
            None => existing.executor,
        };

        let now = Utc::now();
        let record = TaskRecord {
            title: changes.title.clone(),
            description: changes.description.clone(),
            completed: changes.completed.unwrap_or(existing.completed),
            status: changes.status.or(existing.status),
            priority: changes.priority.or(existing.priority),
            author,
            executor,
            created_at: existing.created_at,
            updated_at: now,
        };
        task_write
            .update_task(task_id, &record, &mut *ext_cxn)
            .await
            .context("persisting a task update")?;

        Ok(Task {
            id: task_id,
            title: record.title,
            description: record.description,
            completed: record.completed,
            status: record.status,
            priority: record.priority,
            author: record.author,
            executor: record.executor,
            comments: existing.comments,
            created_at: existing.created_at,
            updated_at: now,
        })
    }

    async fn delete_task(
        &self,
        task_id: i32,
        ext_cxn: &impl Transactable,
        task_detect: &impl driven_ports::DetectTask,
        comment_write: &impl domain::comment::driven_ports::CommentWriter,
        task_write: &impl driven_ports::TaskWriter,
    ) -> Result<(), Error> {
        info!("Deleting task {task_id}");
        let mut tx_cxn = ext_cxn
            .start_transaction()
            .await
            .context("opening a transaction for task deletion")?;

        verify_task_exists(task_id, &mut tx_cxn, task_detect).await?;

        // The task owns its comments, so they go first
        comment_write
            .delete_comments_for_task(task_id, &mut tx_cxn)
            .await
            .context("removing owned comments before task deletion")?;
        task_write
            .delete_task(task_id, &mut tx_cxn)
            .await
            .context("removing a task from the store")?;
        tx_cxn
            .commit()
            .await
            .context("committing a task deletion")?;

        Ok(())
    }
}



#[cfg(test)]
pub mod test_util {
    use super::*;
    use crate::domain::test_util::{Connectivity, FakeImplementation};
    use std::sync::{Mutex, RwLock};

    pub struct InMemoryTaskPersistence {
        pub tasks: Vec<Task>,
        pub connectivity: Connectivity,
        highest_task_id: i32,
    }

    /// Seed data for an in-memory task store
    pub struct NewTaskFixture {
        pub title: String,
        pub description: String,
        pub completed: bool,
        pub status: Option<TaskStatus>,
        pub priority: Option<TaskPriority>,
        pub author: Option<UserRef>,
        pub executor: Option<UserRef>,
    }

    impl Default for NewTaskFixture {
        fn default() -> Self {
            NewTaskFixture {
                title: "Something to do".to_owned(),
                description: "A thing that needs doing".to_owned(),
                completed: false,
                status: None,
                priority: None,
                author: None,
                executor: None,
            }
        }
    }

    impl InMemoryTaskPersistence {
        pub fn new() -> InMemoryTaskPersistence {
            InMemoryTaskPersistence {
                tasks: Vec::new(),
                connectivity: Connectivity::Connected,
                highest_task_id: 0,
            }
        }

        pub fn new_with_tasks(fixtures: &[NewTaskFixture]) -> InMemoryTaskPersistence {
            let now = Utc::now();
            InMemoryTaskPersistence {
                tasks: fixtures
                    .iter()
                    .enumerate()
                    .map(|(index, fixture)| Task {
                        id: index as i32 + 1,
                        title: fixture.title.clone(),
                        description: fixture.description.clone(),
                        completed: fixture.completed,
                        status: fixture.status,
                        priority: fixture.priority,
                        author: fixture.author.clone(),
                        executor: fixture.executor.clone(),
                        comments: Vec::new(),
                        created_at: now,
                        updated_at: now,
                    })
                    .collect(),
                connectivity: Connectivity::Connected,
                highest_task_id: fixtures.len() as i32,
            }
        }

        pub fn new_locked() -> RwLock<InMemoryTaskPersistence> {
            RwLock::new(Self::new())
        }
    }

    impl driven_ports::TaskReader for RwLock<InMemoryTaskPersistence> {
        async fn get_all(
            &self,
            _: &mut impl ExternalConnectivity,
        ) -> Result<Vec<Task>, anyhow::Error> {
            let persistence = self.read().expect("task persist rwlock poisoned");
            persistence.connectivity.blow_up_if_disconnected()?;

            Ok(persistence.tasks.clone())
        }

        async fn get_by_id(
            &self,
            task_id: i32,
            _: &mut impl ExternalConnectivity,
        ) -> Result<Option<Task>, anyhow::Error> {
            let persistence = self.read().expect("task persist rwlock poisoned");
            persistence.connectivity.blow_up_if_disconnected()?;

            Ok(persistence
                .tasks
                .iter()
                .find(|task| task.id == task_id)
                .cloned())
        }
    }

    impl driven_ports::DetectTask for RwLock<InMemoryTaskPersistence> {
        async fn task_exists(
            &self,
            task_id: i32,
            _: &mut impl ExternalConnectivity,
        ) -> Result<bool, anyhow::Error> {
            let persistence = self.read().expect("task persist rwlock poisoned");
            persistence.connectivity.blow_up_if_disconnected()?;

            Ok(persistence.tasks.iter().any(|task| task.id == task_id))
        }
    }

    impl driven_ports::TaskWriter for RwLock<InMemoryTaskPersistence> {
        async fn create_task(
            &self,
            record: &TaskRecord,
            _: &mut impl ExternalConnectivity,
        ) -> Result<i32, anyhow::Error> {
            let mut persistence = self.write().expect("task persist rwlock poisoned");
            persistence.connectivity.blow_up_if_disconnected()?;

            persistence.highest_task_id += 1;
            let task_id = persistence.highest_task_id;
            persistence.tasks.push(Task {
                id: task_id,
                title: record.title.clone(),
                description: record.description.clone(),
                completed: record.completed,
                status: record.status,
                priority: record.priority,
                author: record.author.clone(),
                executor: record.executor.clone(),
                comments: Vec::new(),
                created_at: record.created_at,
                updated_at: record.updated_at,
            });
            Ok(task_id)
        }

        async fn update_task(
            &self,
            task_id: i32,
            record: &TaskRecord,
            _: &mut impl ExternalConnectivity,
        ) -> Result<(), anyhow::Error> {
            let mut persistence = self.write().expect("task persist rwlock poisoned");
            persistence.connectivity.blow_up_if_disconnected()?;

            if let Some(task) = persistence
                .tasks
                .iter_mut()
                .find(|task| task.id == task_id)
            {
                task.title = record.title.clone();
                task.description = record.description.clone();
                task.completed = record.completed;
                task.status = record.status;
                task.priority = record.priority;
                task.author = record.author.clone();
                task.executor = record.executor.clone();
                task.updated_at = record.updated_at;
            }

            Ok(())
        }

        async fn delete_task(
            &self,
            task_id: i32,
            _: &mut impl ExternalConnectivity,
        ) -> Result<(), anyhow::Error> {
            let mut persistence = self.write().expect("task persist rwlock poisoned");
            persistence.connectivity.blow_up_if_disconnected()?;

            persistence.tasks.retain(|task| task.id != task_id);
            Ok(())
        }

        async fn detach_user(
            &self,
            user_id: i32,
            _: &mut impl ExternalConnectivity,
        ) -> Result<(), anyhow::Error> {
            let mut persistence = self.write().expect("task persist rwlock poisoned");
            persistence.connectivity.blow_up_if_disconnected()?;

            for task in persistence.tasks.iter_mut() {
                if task.author.as_ref().is_some_and(|author| author.id == user_id) {
                    task.author = None;
                }
                if task
                    .executor
                    .as_ref()
                    .is_some_and(|executor| executor.id == user_id)
                {
                    task.executor = None;
                }
            }

            Ok(())
        }
    }

    pub struct MockTaskService {
        pub task_by_id_result: FakeImplementation<i32, Result<Task, Error>>,
        pub all_tasks_result: FakeImplementation<(), Result<Vec<Task>, Error>>,
        pub create_task_result: FakeImplementation<TaskChanges, Result<Task, Error>>,
        pub update_task_result: FakeImplementation<(i32, TaskChanges), Result<Task, Error>>,
        pub delete_task_result: FakeImplementation<i32, Result<(), Error>>,
    }

    impl MockTaskService {
        pub fn new() -> MockTaskService {
            MockTaskService {
                task_by_id_result: FakeImplementation::new(),
                all_tasks_result: FakeImplementation::new(),
                create_task_result: FakeImplementation::new(),
                update_task_result: FakeImplementation::new(),
                delete_task_result: FakeImplementation::new(),
            }
        }

        pub fn new_locked() -> Mutex<MockTaskService> {
            Mutex::new(Self::new())
        }
    }

    impl driving_ports::TaskPort for Mutex<MockTaskService> {
        async fn task_by_id(
            &self,
            task_id: i32,
            _: &mut impl ExternalConnectivity,
            _: &impl driven_ports::TaskReader,
        ) -> Result<Task, Error> {
            let mut locked_self = self.lock().expect("mock task service mutex poisoned");
            locked_self.task_by_id_result.save_arguments(task_id);

            locked_self.task_by_id_result.return_value_result()
        }

        async fn all_tasks(
            &self,
            _: &mut impl ExternalConnectivity,
            _: &impl driven_ports::TaskReader,
        ) -> Result<Vec<Task>, Error> {
            let mut locked_self = self.lock().expect("mock task service mutex poisoned");
            locked_self.all_tasks_result.save_arguments(());

            locked_self.all_tasks_result.return_value_result()
        }

        async fn create_task(
            &self,
            changes: &TaskChanges,
            _: &mut impl ExternalConnectivity,
            _: &impl domain::user::driven_ports::UserReader,
            _: &impl driven_ports::TaskWriter,
        ) -> Result<Task, Error> {
            let mut locked_self = self.lock().expect("mock task service mutex poisoned");
            locked_self.create_task_result.save_arguments(changes.clone());

            locked_self.create_task_result.return_value_result()
        }

        async fn update_task(
            &self,
            task_id: i32,
            changes: &TaskChanges,
            _: &mut impl ExternalConnectivity,
            _: &impl domain::user::driven_ports::UserReader,
            _: &impl driven_ports::TaskReader,
            _: &impl driven_ports::TaskWriter,
        ) -> Result<Task, Error> {
            let mut locked_self = self.lock().expect("mock task service mutex poisoned");
            locked_self
                .update_task_result
                .save_arguments((task_id, changes.clone()));

            locked_self.update_task_result.return_value_result()
        }

        async fn delete_task(
            &self,
            task_id: i32,
            _: &impl Transactable,
            _: &impl driven_ports::DetectTask,
            _: &impl domain::comment::driven_ports::CommentWriter,
            _: &impl driven_ports::TaskWriter,
        ) -> Result<(), Error> {
            let mut locked_self = self.lock().expect("mock task service mutex poisoned");
            locked_self.delete_task_result.save_arguments(task_id);

            locked_self.delete_task_result.return_value_result()
        }
    }
}
