use std::sync::Arc;
use tracing::{info, warn};

use super::error::{ServiceError, ServiceResult};
use crate::models::{Comment, NewComment, User};
use crate::repository::{CommentRepository, TaskRepository};

/// Comment creation, editing and removal
///
/// Any authenticated user may comment on any task. A comment can be deleted
/// by whoever posted it or by the task author, and edited only by whoever
/// posted it.
#[derive(Clone)]
pub struct CommentService {
    comments: Arc<dyn CommentRepository>,
    tasks: Arc<dyn TaskRepository>,
}

fn require_text(text: &str) -> ServiceResult<()> {
    if text.trim().is_empty() {
        return Err(ServiceError::invalid("Comment text must not be blank"));
    }
    Ok(())
}

impl CommentService {
    pub fn new(comments: Arc<dyn CommentRepository>, tasks: Arc<dyn TaskRepository>) -> Self {
        Self { comments, tasks }
    }

    pub async fn find_by_id(&self, id: i64) -> ServiceResult<Comment> {
        self.comments
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Comment", "id", id))
    }

    /// Loads a comment and checks it belongs to `task_id`
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the task or comment is missing, or when the
    /// comment is attached to a different task.
    pub async fn find_in_task(&self, task_id: i64, comment_id: i64) -> ServiceResult<Comment> {
        if self.tasks.find_by_id(task_id).await?.is_none() {
            return Err(ServiceError::not_found("Task", "id", task_id));
        }

        let comment = self.find_by_id(comment_id).await?;
        if comment.task_id != task_id {
            return Err(ServiceError::NotFound(format!(
                "Comment with id {} not found in task {}",
                comment_id, task_id
            )));
        }
        Ok(comment)
    }

    /// Posts a comment on a task
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for blank text and `NotFound` when the task
    /// does not exist.
    pub async fn create_comment(
        &self,
        task_id: i64,
        text: &str,
        commentator: &User,
    ) -> ServiceResult<Comment> {
        require_text(text)?;

        if self.tasks.find_by_id(task_id).await?.is_none() {
            return Err(ServiceError::not_found("Task", "id", task_id));
        }

        let comment = self
            .comments
            .create(NewComment {
                text: text.to_string(),
                commentator_id: commentator.id,
                task_id,
            })
            .await?;

        info!(
            comment_id = comment.id,
            task_id,
            user_id = commentator.id,
            "Comment created"
        );
        Ok(comment)
    }

    /// Deletes a comment
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the comment is missing and `InvalidArgument`
    /// when the actor is neither the commentator nor the task author.
    pub async fn delete_comment(&self, comment_id: i64, actor: &User) -> ServiceResult<()> {
        let comment = self.find_by_id(comment_id).await?;
        self.remove(comment, actor).await
    }

    /// Deletes a comment after checking it belongs to `task_id`
    pub async fn delete_comment_in_task(
        &self,
        task_id: i64,
        comment_id: i64,
        actor: &User,
    ) -> ServiceResult<()> {
        let comment = self.find_in_task(task_id, comment_id).await?;
        self.remove(comment, actor).await
    }

    async fn remove(&self, comment: Comment, actor: &User) -> ServiceResult<()> {
        let task = self
            .tasks
            .find_by_id(comment.task_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Task", "id", comment.task_id))?;

        if !comment.is_commentator(actor) && !task.is_author(actor) {
            warn!(
                comment_id = comment.id,
                user_id = actor.id,
                "Rejected comment deletion"
            );
            return Err(ServiceError::invalid(
                "Only the commentator or the task author can delete the comment",
            ));
        }

        if !self.comments.delete(comment.id).await? {
            return Err(ServiceError::not_found("Comment", "id", comment.id));
        }

        info!(comment_id = comment.id, task_id = task.id, user_id = actor.id, "Comment deleted");
        Ok(())
    }

    /// Replaces the text of a comment
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when the actor did not post the comment or
    /// the new text is blank.
    pub async fn update_comment_text(
        &self,
        comment_id: i64,
        new_text: &str,
        actor: &User,
    ) -> ServiceResult<Comment> {
        let comment = self.find_by_id(comment_id).await?;
        self.edit(comment, new_text, actor).await
    }

    /// Replaces the text of a comment after checking it belongs to `task_id`
    pub async fn update_comment_text_in_task(
        &self,
        task_id: i64,
        comment_id: i64,
        new_text: &str,
        actor: &User,
    ) -> ServiceResult<Comment> {
        let comment = self.find_in_task(task_id, comment_id).await?;
        self.edit(comment, new_text, actor).await
    }

    async fn edit(&self, mut comment: Comment, new_text: &str, actor: &User) -> ServiceResult<Comment> {
        if !comment.is_commentator(actor) {
            warn!(comment_id = comment.id, user_id = actor.id, "Rejected comment edit");
            return Err(ServiceError::invalid("Only the commentator can edit the comment"));
        }
        require_text(new_text)?;

        comment.text = new_text.to_string();
        let comment = self.comments.save(&comment).await?;

        info!(comment_id = comment.id, user_id = actor.id, "Comment text updated");
        Ok(comment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fixtures::Fixture;
    use crate::services::tasks::CreateTask;

    async fn task_by(fx: &Fixture, author: &User) -> i64 {
        let input = CreateTask {
            title: Some("T".to_string()),
            ..CreateTask::default()
        };
        fx.tasks.create_task(input, author).await.unwrap().id
    }

    #[tokio::test]
    async fn test_anyone_may_comment() {
        let fx = Fixture::new();
        let alice = fx.user("alice").await;
        let stranger = fx.user("stranger").await;
        let task_id = task_by(&fx, &alice).await;

        let comment = fx
            .comments
            .create_comment(task_id, "Looks good", &stranger)
            .await
            .unwrap();

        assert_eq!(comment.text, "Looks good");
        assert_eq!(comment.commentator, stranger);

        let task = fx.tasks.find_by_id(task_id).await.unwrap();
        assert_eq!(task.comments, vec![comment]);
    }

    #[tokio::test]
    async fn test_create_comment_validation() {
        let fx = Fixture::new();
        let alice = fx.user("alice").await;
        let task_id = task_by(&fx, &alice).await;

        assert!(matches!(
            fx.comments.create_comment(task_id, "  ", &alice).await,
            Err(ServiceError::InvalidArgument(_))
        ));
        assert!(matches!(
            fx.comments.create_comment(999, "hi", &alice).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_by_commentator_or_author() {
        let fx = Fixture::new();
        let alice = fx.user("alice").await;
        let bob = fx.user("bob").await;
        let carol = fx.user("carol").await;
        let task_id = task_by(&fx, &alice).await;

        let first = fx.comments.create_comment(task_id, "one", &bob).await.unwrap();
        let second = fx.comments.create_comment(task_id, "two", &bob).await.unwrap();

        assert!(matches!(
            fx.comments.delete_comment(first.id, &carol).await,
            Err(ServiceError::InvalidArgument(_))
        ));

        fx.comments.delete_comment(first.id, &bob).await.unwrap();
        fx.comments.delete_comment(second.id, &alice).await.unwrap();

        assert!(matches!(
            fx.comments.delete_comment(first.id, &bob).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(fx.tasks.find_by_id(task_id).await.unwrap().comments.is_empty());
    }

    #[tokio::test]
    async fn test_delete_in_wrong_task_is_not_found() {
        let fx = Fixture::new();
        let alice = fx.user("alice").await;
        let first_task = task_by(&fx, &alice).await;
        let second_task = task_by(&fx, &alice).await;

        let comment = fx
            .comments
            .create_comment(first_task, "hi", &alice)
            .await
            .unwrap();

        assert!(matches!(
            fx.comments
                .delete_comment_in_task(second_task, comment.id, &alice)
                .await,
            Err(ServiceError::NotFound(_))
        ));
        fx.comments
            .delete_comment_in_task(first_task, comment.id, &alice)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_only_commentator_may_edit() {
        let fx = Fixture::new();
        let alice = fx.user("alice").await;
        let bob = fx.user("bob").await;
        let task_id = task_by(&fx, &alice).await;
        let comment = fx.comments.create_comment(task_id, "draft", &bob).await.unwrap();

        assert!(matches!(
            fx.comments.update_comment_text(comment.id, "edited", &alice).await,
            Err(ServiceError::InvalidArgument(_))
        ));
        assert!(matches!(
            fx.comments.update_comment_text(comment.id, "", &bob).await,
            Err(ServiceError::InvalidArgument(_))
        ));

        let edited = fx
            .comments
            .update_comment_text_in_task(task_id, comment.id, "final", &bob)
            .await
            .unwrap();
        assert_eq!(edited.text, "final");
        assert_eq!(edited.date_time, comment.date_time);
    }
}
