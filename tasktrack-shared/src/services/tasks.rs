//! Task mutation engine.
//!
//! Every mutation follows the same sequence: load the task, authorize the
//! acting user, validate the new value, then hand a [`TaskEdit`] to the
//! repository. The repository re-checks the edit against the stored task and
//! applies it in one atomic step, so concurrent edits of different fields
//! never overwrite each other. A failed authorization or validation returns
//! before anything is written.
//!
//! | Operation            | Who may call it        |
//! |----------------------|------------------------|
//! | `delete_task`        | author                 |
//! | `update_title`       | author                 |
//! | `update_description` | author                 |
//! | `update_status`      | author or any assignee |
//! | `update_priority`    | author                 |
//! | `append_assignee`    | author                 |
//! | `remove_assignee`    | author                 |

use std::sync::Arc;
use tracing::{info, warn};

use super::error::{ServiceError, ServiceResult};
use super::users::{AssigneeRef, UserDirectory};
use crate::models::{
    EditRejected, NewTask, Task, TaskChange, TaskEdit, TaskPriority, TaskStatus, User,
};
use crate::repository::{RepositoryError, TaskRepository};

/// Task creation input as received from the caller
///
/// Missing description, status and priority are defaulted during validation.
#[derive(Debug, Clone, Default)]
pub struct CreateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status_code: Option<i32>,
    pub priority_code: Option<i32>,
    pub assignee_ids: Vec<i64>,
    pub assignee_emails: Vec<String>,
}

/// Task reads and mutations
#[derive(Clone)]
pub struct TaskService {
    tasks: Arc<dyn TaskRepository>,
    directory: UserDirectory,
}

fn require_author(task: &Task, actor: &User) -> ServiceResult<()> {
    if !task.is_author(actor) {
        warn!(task_id = task.id, user_id = actor.id, "Rejected non-author mutation");
        return Err(ServiceError::from(EditRejected::NotAuthor));
    }
    Ok(())
}

fn require_author_or_assignee(task: &Task, actor: &User) -> ServiceResult<()> {
    if !task.is_author_or_assignee(actor) {
        warn!(task_id = task.id, user_id = actor.id, "Rejected status change by outsider");
        return Err(ServiceError::from(EditRejected::NotAuthorOrAssignee));
    }
    Ok(())
}

fn require_title(title: &str) -> ServiceResult<()> {
    if title.trim().is_empty() {
        return Err(ServiceError::invalid("Title must not be blank"));
    }
    Ok(())
}

impl TaskService {
    pub fn new(tasks: Arc<dyn TaskRepository>, directory: UserDirectory) -> Self {
        Self { tasks, directory }
    }

    /// Hands one edit to the repository
    async fn apply(&self, id: i64, actor: &User, change: TaskChange) -> ServiceResult<Task> {
        match self.tasks.update(id, TaskEdit::new(actor.id, change)).await {
            Ok(task) => Ok(task),
            Err(RepositoryError::Rejected(rejected)) => {
                warn!(task_id = id, user_id = actor.id, reason = %rejected, "Rejected task edit");
                Err(rejected.into())
            }
            Err(RepositoryError::NotFound(_)) => Err(ServiceError::not_found("Task", "id", id)),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn find_all(&self) -> ServiceResult<Vec<Task>> {
        Ok(self.tasks.find_all().await?)
    }

    /// Loads a task aggregate
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when no task has that id.
    pub async fn find_by_id(&self, id: i64) -> ServiceResult<Task> {
        self.tasks
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Task", "id", id))
    }

    pub async fn find_all_by_author(&self, author: &User) -> ServiceResult<Vec<Task>> {
        Ok(self.tasks.find_all_by_author(author.id).await?)
    }

    pub async fn find_all_by_assignee(&self, assignee: &User) -> ServiceResult<Vec<Task>> {
        Ok(self.tasks.find_all_by_assignee(assignee.id).await?)
    }

    /// Creates a task authored by `author`
    ///
    /// Description defaults to `""`, status to `PENDING` and priority to
    /// `LOW`. Assignees referenced by id and by email are merged, so the same
    /// user given both ways is assigned once.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a blank title, an unknown status or
    /// priority code, or a malformed assignee email, and `NotFound` when an
    /// assignee does not exist.
    pub async fn create_task(&self, input: CreateTask, author: &User) -> ServiceResult<Task> {
        let title = input.title.unwrap_or_default();
        require_title(&title)?;

        let status = match input.status_code {
            Some(code) => TaskStatus::from_code(code)?,
            None => TaskStatus::default(),
        };
        let priority = match input.priority_code {
            Some(code) => TaskPriority::from_code(code)?,
            None => TaskPriority::default(),
        };

        let mut references: Vec<AssigneeRef> =
            input.assignee_ids.into_iter().map(AssigneeRef::Id).collect();
        for email in input.assignee_emails {
            references.push(AssigneeRef::from_parts(None, Some(email))?);
        }

        let mut assignee_ids: Vec<i64> = Vec::with_capacity(references.len());
        for reference in &references {
            let user = self.directory.resolve_reference(reference).await?;
            if !assignee_ids.contains(&user.id) {
                assignee_ids.push(user.id);
            }
        }

        let task = self
            .tasks
            .create(NewTask {
                title,
                description: input.description.unwrap_or_default(),
                status,
                priority,
                author_id: author.id,
                assignee_ids,
            })
            .await?;

        info!(
            task_id = task.id,
            user_id = author.id,
            assignees = task.assignees.len(),
            "Task created"
        );
        Ok(task)
    }

    /// Deletes a task and all of its comments
    ///
    /// The repository removes the comments, the assignee links and the task
    /// row in one atomic step.
    pub async fn delete_task(&self, id: i64, actor: &User) -> ServiceResult<()> {
        let task = self.find_by_id(id).await?;
        require_author(&task, actor)?;

        if !self.tasks.delete(task.id).await? {
            return Err(ServiceError::not_found("Task", "id", id));
        }

        info!(
            task_id = id,
            user_id = actor.id,
            removed_comments = task.comments.len(),
            "Task deleted"
        );
        Ok(())
    }

    pub async fn update_title(&self, id: i64, new_title: &str, actor: &User) -> ServiceResult<Task> {
        let task = self.find_by_id(id).await?;
        require_author(&task, actor)?;
        require_title(new_title)?;

        let task = self
            .apply(id, actor, TaskChange::Title(new_title.to_string()))
            .await?;

        info!(task_id = id, user_id = actor.id, "Task title updated");
        Ok(task)
    }

    /// Replaces the description
    ///
    /// A blank description is accepted; a missing one is not.
    pub async fn update_description(
        &self,
        id: i64,
        new_description: Option<&str>,
        actor: &User,
    ) -> ServiceResult<Task> {
        let task = self.find_by_id(id).await?;
        require_author(&task, actor)?;
        let description =
            new_description.ok_or_else(|| ServiceError::invalid("Description must be provided"))?;

        let task = self
            .apply(id, actor, TaskChange::Description(description.to_string()))
            .await?;

        info!(task_id = id, user_id = actor.id, "Task description updated");
        Ok(task)
    }

    pub async fn update_status(&self, id: i64, status_code: i32, actor: &User) -> ServiceResult<Task> {
        let task = self.find_by_id(id).await?;
        require_author_or_assignee(&task, actor)?;
        let status = TaskStatus::from_code(status_code)?;

        let task = self.apply(id, actor, TaskChange::Status(status)).await?;

        info!(task_id = id, user_id = actor.id, status = status.as_str(), "Task status updated");
        Ok(task)
    }

    pub async fn update_priority(
        &self,
        id: i64,
        priority_code: i32,
        actor: &User,
    ) -> ServiceResult<Task> {
        let task = self.find_by_id(id).await?;
        require_author(&task, actor)?;
        let priority = TaskPriority::from_code(priority_code)?;

        let task = self.apply(id, actor, TaskChange::Priority(priority)).await?;

        info!(
            task_id = id,
            user_id = actor.id,
            priority = priority.as_str(),
            "Task priority updated"
        );
        Ok(task)
    }

    /// Assigns a user to the task
    ///
    /// Assigning someone who is already an assignee succeeds without a write.
    pub async fn append_assignee(
        &self,
        id: i64,
        reference: &AssigneeRef,
        actor: &User,
    ) -> ServiceResult<Task> {
        let task = self.find_by_id(id).await?;
        require_author(&task, actor)?;
        let assignee = self.directory.resolve_reference(reference).await?;

        let task = self
            .apply(id, actor, TaskChange::AddAssignee(assignee.id))
            .await?;

        info!(task_id = id, user_id = actor.id, assignee_id = assignee.id, "Assignee added");
        Ok(task)
    }

    /// Unassigns a user from the task
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when the user is not currently assigned.
    pub async fn remove_assignee(
        &self,
        id: i64,
        reference: &AssigneeRef,
        actor: &User,
    ) -> ServiceResult<Task> {
        let task = self.find_by_id(id).await?;
        require_author(&task, actor)?;
        let assignee = self.directory.resolve_reference(reference).await?;

        let task = self
            .apply(id, actor, TaskChange::RemoveAssignee(assignee.id))
            .await?;

        info!(task_id = id, user_id = actor.id, assignee_id = assignee.id, "Assignee removed");
        Ok(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::memory::InMemoryStore;
    use crate::repository::{CommentRepository, RepositoryResult};
    use crate::services::fixtures::Fixture;
    use async_trait::async_trait;
    use mockall::{mock, predicate::eq, Sequence};

    mock! {
        Tasks {}

        #[async_trait]
        impl TaskRepository for Tasks {
            async fn create(&self, data: NewTask) -> RepositoryResult<Task>;
            async fn update(&self, id: i64, edit: TaskEdit) -> RepositoryResult<Task>;
            async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Task>>;
            async fn find_all(&self) -> RepositoryResult<Vec<Task>>;
            async fn find_all_by_author(&self, author_id: i64) -> RepositoryResult<Vec<Task>>;
            async fn find_all_by_assignee(&self, assignee_id: i64) -> RepositoryResult<Vec<Task>>;
            async fn delete(&self, id: i64) -> RepositoryResult<bool>;
        }
    }

    /// Serves one fixed snapshot for every task read while writes reach the
    /// store, as if each call loaded the task before any other call wrote it
    struct StaleReads {
        store: InMemoryStore,
        snapshot: Task,
    }

    #[async_trait]
    impl TaskRepository for StaleReads {
        async fn create(&self, data: NewTask) -> RepositoryResult<Task> {
            TaskRepository::create(&self.store, data).await
        }

        async fn update(&self, id: i64, edit: TaskEdit) -> RepositoryResult<Task> {
            self.store.update(id, edit).await
        }

        async fn find_by_id(&self, _id: i64) -> RepositoryResult<Option<Task>> {
            Ok(Some(self.snapshot.clone()))
        }

        async fn find_all(&self) -> RepositoryResult<Vec<Task>> {
            TaskRepository::find_all(&self.store).await
        }

        async fn find_all_by_author(&self, author_id: i64) -> RepositoryResult<Vec<Task>> {
            self.store.find_all_by_author(author_id).await
        }

        async fn find_all_by_assignee(&self, assignee_id: i64) -> RepositoryResult<Vec<Task>> {
            self.store.find_all_by_assignee(assignee_id).await
        }

        async fn delete(&self, id: i64) -> RepositoryResult<bool> {
            TaskRepository::delete(&self.store, id).await
        }
    }

    fn titled(title: &str) -> CreateTask {
        CreateTask {
            title: Some(title.to_string()),
            ..CreateTask::default()
        }
    }

    #[tokio::test]
    async fn test_create_task_applies_defaults() {
        let fx = Fixture::new();
        let alice = fx.user("alice").await;

        let task = fx.tasks.create_task(titled("T"), &alice).await.unwrap();

        assert_eq!(task.title, "T");
        assert_eq!(task.description, "");
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.priority, TaskPriority::Low);
        assert_eq!(task.author, alice);
        assert!(task.assignees.is_empty());
    }

    #[tokio::test]
    async fn test_create_task_rejects_blank_title() {
        let fx = Fixture::new();
        let alice = fx.user("alice").await;

        for input in [CreateTask::default(), titled("   ")] {
            let result = fx.tasks.create_task(input, &alice).await;
            assert!(matches!(result, Err(ServiceError::InvalidArgument(_))));
        }
        assert!(fx.tasks.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_task_rejects_unknown_codes() {
        let fx = Fixture::new();
        let alice = fx.user("alice").await;

        for (status_code, priority_code) in [(Some(4), None), (None, Some(0)), (Some(-1), Some(2))] {
            let input = CreateTask {
                status_code,
                priority_code,
                ..titled("T")
            };
            let result = fx.tasks.create_task(input, &alice).await;
            assert!(matches!(result, Err(ServiceError::InvalidArgument(_))));
        }
        assert!(fx.tasks.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_task_with_codes() {
        let fx = Fixture::new();
        let alice = fx.user("alice").await;

        let input = CreateTask {
            status_code: Some(3),
            priority_code: Some(2),
            description: Some("details".to_string()),
            ..titled("T")
        };
        let task = fx.tasks.create_task(input, &alice).await.unwrap();

        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.priority, TaskPriority::Medium);
        assert_eq!(task.description, "details");
    }

    #[tokio::test]
    async fn test_create_task_merges_assignee_references() {
        let fx = Fixture::new();
        let alice = fx.user("alice").await;
        let bob = fx.user("bob").await;

        let input = CreateTask {
            assignee_ids: vec![bob.id, bob.id],
            assignee_emails: vec![bob.email.clone()],
            ..titled("T")
        };
        let task = fx.tasks.create_task(input, &alice).await.unwrap();

        assert_eq!(task.assignees, vec![bob]);
    }

    #[tokio::test]
    async fn test_create_task_with_unknown_assignee() {
        let fx = Fixture::new();
        let alice = fx.user("alice").await;

        let by_id = CreateTask {
            assignee_ids: vec![404],
            ..titled("T")
        };
        let by_email = CreateTask {
            assignee_emails: vec!["ghost@example.com".to_string()],
            ..titled("T")
        };

        for input in [by_id, by_email] {
            let result = fx.tasks.create_task(input, &alice).await;
            assert!(matches!(result, Err(ServiceError::NotFound(_))));
        }
        assert!(fx.tasks.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_non_author_cannot_mutate() {
        let fx = Fixture::new();
        let alice = fx.user("alice").await;
        let bob = fx.user("bob").await;
        let carol = fx.user("carol").await;

        let input = CreateTask {
            assignee_ids: vec![bob.id],
            ..titled("Ship")
        };
        let task = fx.tasks.create_task(input, &alice).await.unwrap();
        let carol_ref = AssigneeRef::Id(carol.id);
        let bob_ref = AssigneeRef::Id(bob.id);

        for actor in [&bob, &carol] {
            let results = [
                fx.tasks.update_title(task.id, "X", actor).await.map(|_| ()),
                fx.tasks
                    .update_description(task.id, Some("X"), actor)
                    .await
                    .map(|_| ()),
                fx.tasks.update_priority(task.id, 3, actor).await.map(|_| ()),
                fx.tasks
                    .append_assignee(task.id, &carol_ref, actor)
                    .await
                    .map(|_| ()),
                fx.tasks
                    .remove_assignee(task.id, &bob_ref, actor)
                    .await
                    .map(|_| ()),
                fx.tasks.delete_task(task.id, actor).await,
            ];
            for result in results {
                assert_eq!(result, Err(ServiceError::from(EditRejected::NotAuthor)));
            }
        }

        let unchanged = fx.tasks.find_by_id(task.id).await.unwrap();
        assert_eq!(unchanged.title, "Ship");
        assert_eq!(unchanged.priority, TaskPriority::Low);
        assert_eq!(unchanged.assignees, vec![bob]);
    }

    #[tokio::test]
    async fn test_assignee_may_update_status_but_not_title() {
        let fx = Fixture::new();
        let alice = fx.user("alice").await;
        let bob = fx.user("bob").await;

        let input = CreateTask {
            assignee_ids: vec![bob.id],
            ..titled("Ship")
        };
        let task = fx.tasks.create_task(input, &alice).await.unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.priority, TaskPriority::Low);
        assert_eq!(task.assignees, vec![bob.clone()]);

        let task = fx.tasks.update_status(task.id, 2, &bob).await.unwrap();
        assert_eq!(task.status, TaskStatus::InProgress);

        let result = fx.tasks.update_title(task.id, "X", &bob).await;
        assert!(matches!(result, Err(ServiceError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_author_may_set_every_status() {
        let fx = Fixture::new();
        let alice = fx.user("alice").await;
        let task = fx.tasks.create_task(titled("T"), &alice).await.unwrap();

        for status in TaskStatus::ALL {
            let updated = fx
                .tasks
                .update_status(task.id, status.code(), &alice)
                .await
                .unwrap();
            assert_eq!(updated.status, status);
        }
    }

    #[tokio::test]
    async fn test_outsider_cannot_update_status() {
        let fx = Fixture::new();
        let alice = fx.user("alice").await;
        let carol = fx.user("carol").await;
        let task = fx.tasks.create_task(titled("T"), &alice).await.unwrap();

        let result = fx.tasks.update_status(task.id, 2, &carol).await;
        assert_eq!(result.unwrap_err(), ServiceError::from(EditRejected::NotAuthorOrAssignee));
    }

    #[tokio::test]
    async fn test_invalid_codes_on_update() {
        let fx = Fixture::new();
        let alice = fx.user("alice").await;
        let task = fx.tasks.create_task(titled("T"), &alice).await.unwrap();

        for code in [0, 4, 100] {
            assert!(matches!(
                fx.tasks.update_status(task.id, code, &alice).await,
                Err(ServiceError::InvalidArgument(_))
            ));
            assert!(matches!(
                fx.tasks.update_priority(task.id, code, &alice).await,
                Err(ServiceError::InvalidArgument(_))
            ));
        }

        let unchanged = fx.tasks.find_by_id(task.id).await.unwrap();
        assert_eq!(unchanged.status, TaskStatus::Pending);
        assert_eq!(unchanged.priority, TaskPriority::Low);
    }

    #[tokio::test]
    async fn test_update_title_and_description() {
        let fx = Fixture::new();
        let alice = fx.user("alice").await;
        let task = fx.tasks.create_task(titled("T"), &alice).await.unwrap();

        let task = fx.tasks.update_title(task.id, "Renamed", &alice).await.unwrap();
        assert_eq!(task.title, "Renamed");

        assert!(matches!(
            fx.tasks.update_title(task.id, "", &alice).await,
            Err(ServiceError::InvalidArgument(_))
        ));

        let task = fx
            .tasks
            .update_description(task.id, Some("   "), &alice)
            .await
            .unwrap();
        assert_eq!(task.description, "   ");

        assert!(matches!(
            fx.tasks.update_description(task.id, None, &alice).await,
            Err(ServiceError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_task_is_not_found() {
        let fx = Fixture::new();
        let alice = fx.user("alice").await;

        assert!(matches!(
            fx.tasks.update_title(42, "X", &alice).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            fx.tasks.delete_task(42, &alice).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_append_assignee_is_idempotent() {
        let fx = Fixture::new();
        let alice = fx.user("alice").await;
        let bob = fx.user("bob").await;
        let task = fx.tasks.create_task(titled("T"), &alice).await.unwrap();

        let by_email = AssigneeRef::Email(bob.email.clone());
        fx.tasks.append_assignee(task.id, &by_email, &alice).await.unwrap();
        let task = fx
            .tasks
            .append_assignee(task.id, &AssigneeRef::Id(bob.id), &alice)
            .await
            .unwrap();

        assert_eq!(task.assignees, vec![bob.clone()]);
        assert_eq!(fx.tasks.find_all_by_assignee(&bob).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_append_unknown_assignee_is_not_found() {
        let fx = Fixture::new();
        let alice = fx.user("alice").await;
        let task = fx.tasks.create_task(titled("T"), &alice).await.unwrap();

        let result = fx
            .tasks
            .append_assignee(task.id, &AssigneeRef::Id(99), &alice)
            .await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_remove_assignee() {
        let fx = Fixture::new();
        let alice = fx.user("alice").await;
        let bob = fx.user("bob").await;
        let carol = fx.user("carol").await;

        let input = CreateTask {
            assignee_ids: vec![bob.id],
            ..titled("T")
        };
        let task = fx.tasks.create_task(input, &alice).await.unwrap();

        let result = fx
            .tasks
            .remove_assignee(task.id, &AssigneeRef::Id(carol.id), &alice)
            .await;
        assert!(matches!(result, Err(ServiceError::InvalidArgument(_))));

        let task = fx
            .tasks
            .remove_assignee(task.id, &AssigneeRef::Email(bob.email.clone()), &alice)
            .await
            .unwrap();
        assert!(task.assignees.is_empty());
    }

    #[tokio::test]
    async fn test_delete_task_removes_comments() {
        let fx = Fixture::new();
        let alice = fx.user("alice").await;
        let bob = fx.user("bob").await;
        let task = fx.tasks.create_task(titled("T"), &alice).await.unwrap();

        fx.comments.create_comment(task.id, "first", &alice).await.unwrap();
        fx.comments.create_comment(task.id, "second", &bob).await.unwrap();

        fx.tasks.delete_task(task.id, &alice).await.unwrap();

        assert!(matches!(
            fx.tasks.find_by_id(task.id).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(fx.store.find_all_by_task(task.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_task_is_one_repository_call() {
        let fx = Fixture::new();
        let alice = fx.user("alice").await;
        let task = fx.sample_task(7, &alice);

        let mut seq = Sequence::new();
        let mut tasks = MockTasks::new();

        tasks
            .expect_find_by_id()
            .with(eq(7))
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_| Ok(Some(task.clone())));
        tasks
            .expect_delete()
            .with(eq(7))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(true));

        let service = TaskService::new(Arc::new(tasks), fx.directory.clone());
        service.delete_task(7, &alice).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejected_mutation_never_writes() {
        let fx = Fixture::new();
        let alice = fx.user("alice").await;
        let bob = fx.user("bob").await;
        let task = fx.sample_task(7, &alice);

        let mut tasks = MockTasks::new();
        tasks
            .expect_find_by_id()
            .returning(move |_| Ok(Some(task.clone())));
        tasks.expect_update().never();
        tasks.expect_delete().never();

        let service = TaskService::new(Arc::new(tasks), fx.directory.clone());

        assert!(service.update_title(7, "X", &bob).await.is_err());
        assert!(service.update_title(7, " ", &alice).await.is_err());
        assert!(service.update_priority(7, 9, &alice).await.is_err());
        assert!(service.update_status(7, 0, &alice).await.is_err());
        assert!(service.delete_task(7, &bob).await.is_err());
        assert!(service
            .append_assignee(7, &AssigneeRef::Id(404), &alice)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_edits_from_stale_reads_keep_every_change() {
        let fx = Fixture::new();
        let alice = fx.user("alice").await;
        let bob = fx.user("bob").await;
        let carol = fx.user("carol").await;

        let input = CreateTask {
            assignee_ids: vec![bob.id],
            ..titled("Ship")
        };
        let task = fx.tasks.create_task(input, &alice).await.unwrap();
        let service = TaskService::new(
            Arc::new(StaleReads {
                store: (*fx.store).clone(),
                snapshot: task.clone(),
            }),
            fx.directory.clone(),
        );

        service.update_status(task.id, 2, &bob).await.unwrap();
        service.update_title(task.id, "Renamed", &alice).await.unwrap();

        service
            .append_assignee(task.id, &AssigneeRef::Id(carol.id), &alice)
            .await
            .unwrap();
        service
            .append_assignee(task.id, &AssigneeRef::Id(alice.id), &alice)
            .await
            .unwrap();

        let stored = fx.tasks.find_by_id(task.id).await.unwrap();
        assert_eq!(stored.status, TaskStatus::InProgress);
        assert_eq!(stored.title, "Renamed");
        assert_eq!(stored.assignee_ids(), vec![bob.id, carol.id, alice.id]);
    }

    #[tokio::test]
    async fn test_status_change_rechecked_against_stored_assignees() {
        let fx = Fixture::new();
        let alice = fx.user("alice").await;
        let bob = fx.user("bob").await;

        let input = CreateTask {
            assignee_ids: vec![bob.id],
            ..titled("Ship")
        };
        let task = fx.tasks.create_task(input, &alice).await.unwrap();
        let service = TaskService::new(
            Arc::new(StaleReads {
                store: (*fx.store).clone(),
                snapshot: task.clone(),
            }),
            fx.directory.clone(),
        );

        fx.tasks
            .remove_assignee(task.id, &AssigneeRef::Id(bob.id), &alice)
            .await
            .unwrap();

        let result = service.update_status(task.id, 3, &bob).await;
        assert_eq!(result.unwrap_err(), ServiceError::from(EditRejected::NotAuthorOrAssignee));

        let result = service
            .remove_assignee(task.id, &AssigneeRef::Id(bob.id), &alice)
            .await;
        assert_eq!(result.unwrap_err(), ServiceError::from(EditRejected::NotAssigned(bob.id)));

        let stored = fx.tasks.find_by_id(task.id).await.unwrap();
        assert_eq!(stored.status, TaskStatus::Pending);
        assert!(stored.assignees.is_empty());
    }
}
