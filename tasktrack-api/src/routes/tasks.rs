/// Task collection endpoints
///
/// # Endpoints
///
/// - `GET /api/tasks/` - All tasks
/// - `POST /api/tasks/` - Create a task (201)
/// - `GET /api/tasks/:task_id` - One task
/// - `DELETE /api/tasks/:task_id` - Delete a task and its comments (204)

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use tasktrack_shared::{
    auth::middleware::AuthContext, projection::TaskResponse, services::CreateTask,
};

/// Task creation request
///
/// Only `title` is required. Status and priority are integer codes
/// (1, 2 or 3) and default to pending and low.
///
/// ```json
/// {
///   "title": "Ship",
///   "description": "Cut the release",
///   "status-value": 1,
///   "priority-value": 3,
///   "assignees-id": [2],
///   "assignees-email": ["carol@example.com"]
/// }
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CreateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status_value: Option<i32>,
    pub priority_value: Option<i32>,
    pub assignees_id: Option<Vec<i64>>,
    pub assignees_email: Option<Vec<String>>,
}

impl From<CreateTaskRequest> for CreateTask {
    fn from(req: CreateTaskRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            status_code: req.status_value,
            priority_code: req.priority_value,
            assignee_ids: req.assignees_id.unwrap_or_default(),
            assignee_emails: req.assignees_email.unwrap_or_default(),
        }
    }
}

/// Lists all tasks
pub async fn list_tasks(State(state): State<AppState>) -> ApiResult<Json<Vec<TaskResponse>>> {
    let tasks = state.services.tasks.find_all().await?;
    Ok(Json(tasks.iter().map(TaskResponse::from).collect()))
}

/// Returns one task
pub async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
) -> ApiResult<Json<TaskResponse>> {
    let task = state.services.tasks.find_by_id(task_id).await?;
    Ok(Json(TaskResponse::from(&task)))
}

/// Creates a task authored by the acting user
///
/// # Errors
///
/// - `400 Bad Request`: Blank title, unknown status or priority code
/// - `404 Not Found`: An assignee does not exist
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskResponse>)> {
    let task = state
        .services
        .tasks
        .create_task(req.into(), &auth.user)
        .await?;

    Ok((StatusCode::CREATED, Json(TaskResponse::from(&task))))
}

/// Deletes a task; author only
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.services.tasks.delete_task(task_id, &auth.user).await?;
    Ok(StatusCode::NO_CONTENT)
}
