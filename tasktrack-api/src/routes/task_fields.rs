/// Field-level task endpoints
///
/// Every mutation takes its new value from the query string and responds
/// with the full updated task, except comment edits which respond with the
/// comment.
///
/// | Method | Path                                   | Query                             | Allowed for        |
/// |--------|----------------------------------------|-----------------------------------|--------------------|
/// | PUT    | `/:task_id/title`                      | `title`                           | author             |
/// | PUT    | `/:task_id/description`                | `description`                     | author             |
/// | PUT    | `/:task_id/status`                     | `status-value`                    | author or assignee |
/// | PUT    | `/:task_id/priority`                   | `priority-value`                  | author             |
/// | POST   | `/:task_id/assignees`                  | `assignee-id` or `assignee-email` | author             |
/// | DELETE | `/:task_id/assignees`                  | `assignee-id` or `assignee-email` | author             |
/// | POST   | `/:task_id/comments`                   | `comment-text`                    | anyone             |
/// | DELETE | `/:task_id/comments`                   | `comment-id`                      | commentator or author |
/// | PUT    | `/:task_id/comments/:comment_id`       | `comment-text`                    | commentator        |

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::str::FromStr;
use tasktrack_shared::{
    auth::middleware::AuthContext,
    projection::{CommentResponse, TaskResponse},
    services::AssigneeRef,
};

/// Task fields readable on their own
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskField {
    Id,
    Title,
    Description,
    Status,
    Priority,
    Author,
    Assignees,
    Comments,
}

impl TaskField {
    /// Key of the field in a serialized [`TaskResponse`]
    pub fn key(self) -> &'static str {
        match self {
            TaskField::Id => "id",
            TaskField::Title => "title",
            TaskField::Description => "description",
            TaskField::Status => "status",
            TaskField::Priority => "priority",
            TaskField::Author => "author",
            TaskField::Assignees => "assignees",
            TaskField::Comments => "comments",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TitleQuery {
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DescriptionQuery {
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    #[serde(rename = "status-value")]
    pub status_value: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PriorityQuery {
    #[serde(rename = "priority-value")]
    pub priority_value: Option<String>,
}

/// Assignee reference; the id wins when both are given
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AssigneeQuery {
    pub assignee_id: Option<String>,
    pub assignee_email: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CommentTextQuery {
    pub comment_text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CommentIdQuery {
    pub comment_id: Option<String>,
}

fn required(value: Option<String>, param: &str) -> ApiResult<String> {
    value.ok_or_else(|| ApiError::BadRequest(format!("Missing query parameter `{}`", param)))
}

fn parse_param<T: FromStr>(value: Option<String>, param: &str, what: &str) -> ApiResult<T> {
    let raw = required(value, param)?;
    raw.trim()
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid {} value: {}", what, raw)))
}

impl AssigneeQuery {
    fn into_ref(self) -> ApiResult<AssigneeRef> {
        let id = match self.assignee_id {
            Some(raw) => Some(parse_param(Some(raw), "assignee-id", "assignee id")?),
            None => None,
        };
        Ok(AssigneeRef::from_parts(id, self.assignee_email)?)
    }
}

/// Reads one field of a task as `{field: value}`
pub async fn read_field(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
    field: TaskField,
) -> ApiResult<Json<Value>> {
    let task = state.services.tasks.find_by_id(task_id).await?;

    let mut view = serde_json::to_value(TaskResponse::from(&task))
        .map_err(|err| ApiError::InternalError(format!("Serialization failed: {}", err)))?;
    let value = view
        .get_mut(field.key())
        .map(Value::take)
        .unwrap_or(Value::Null);

    let mut body = Map::new();
    body.insert(field.key().to_string(), value);
    Ok(Json(Value::Object(body)))
}

pub async fn update_title(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<i64>,
    Query(query): Query<TitleQuery>,
) -> ApiResult<Json<TaskResponse>> {
    let title = required(query.title, "title")?;
    let task = state
        .services
        .tasks
        .update_title(task_id, &title, &auth.user)
        .await?;
    Ok(Json(TaskResponse::from(&task)))
}

/// Replaces the description; an empty value clears it
pub async fn update_description(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<i64>,
    Query(query): Query<DescriptionQuery>,
) -> ApiResult<Json<TaskResponse>> {
    let task = state
        .services
        .tasks
        .update_description(task_id, query.description.as_deref(), &auth.user)
        .await?;
    Ok(Json(TaskResponse::from(&task)))
}

pub async fn update_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<i64>,
    Query(query): Query<StatusQuery>,
) -> ApiResult<Json<TaskResponse>> {
    let code: i32 = parse_param(query.status_value, "status-value", "status")?;
    let task = state
        .services
        .tasks
        .update_status(task_id, code, &auth.user)
        .await?;
    Ok(Json(TaskResponse::from(&task)))
}

pub async fn update_priority(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<i64>,
    Query(query): Query<PriorityQuery>,
) -> ApiResult<Json<TaskResponse>> {
    let code: i32 = parse_param(query.priority_value, "priority-value", "priority")?;
    let task = state
        .services
        .tasks
        .update_priority(task_id, code, &auth.user)
        .await?;
    Ok(Json(TaskResponse::from(&task)))
}

pub async fn append_assignee(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<i64>,
    Query(query): Query<AssigneeQuery>,
) -> ApiResult<Json<TaskResponse>> {
    let reference = query.into_ref()?;
    let task = state
        .services
        .tasks
        .append_assignee(task_id, &reference, &auth.user)
        .await?;
    Ok(Json(TaskResponse::from(&task)))
}

pub async fn remove_assignee(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<i64>,
    Query(query): Query<AssigneeQuery>,
) -> ApiResult<Json<TaskResponse>> {
    let reference = query.into_ref()?;
    let task = state
        .services
        .tasks
        .remove_assignee(task_id, &reference, &auth.user)
        .await?;
    Ok(Json(TaskResponse::from(&task)))
}

/// Posts a comment and returns the task with its comments
pub async fn create_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<i64>,
    Query(query): Query<CommentTextQuery>,
) -> ApiResult<Json<TaskResponse>> {
    let text = required(query.comment_text, "comment-text")?;
    state
        .services
        .comments
        .create_comment(task_id, &text, &auth.user)
        .await?;

    let task = state.services.tasks.find_by_id(task_id).await?;
    Ok(Json(TaskResponse::from(&task)))
}

/// Deletes a comment of this task and returns the task
pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<i64>,
    Query(query): Query<CommentIdQuery>,
) -> ApiResult<Json<TaskResponse>> {
    let comment_id: i64 = parse_param(query.comment_id, "comment-id", "comment id")?;
    state
        .services
        .comments
        .delete_comment_in_task(task_id, comment_id, &auth.user)
        .await?;

    let task = state.services.tasks.find_by_id(task_id).await?;
    Ok(Json(TaskResponse::from(&task)))
}

pub async fn update_comment_text(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((task_id, comment_id)): Path<(i64, i64)>,
    Query(query): Query<CommentTextQuery>,
) -> ApiResult<Json<CommentResponse>> {
    let text = required(query.comment_text, "comment-text")?;
    let comment = state
        .services
        .comments
        .update_comment_text_in_task(task_id, comment_id, &text, &auth.user)
        .await?;
    Ok(Json(CommentResponse::from(&comment)))
}
