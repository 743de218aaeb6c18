/// API route handlers
///
/// - `health`: Health check endpoint
/// - `auth`: Registration, login and profile
/// - `users`: User reads and self updates
/// - `tasks`: Task listing, creation and deletion
/// - `task_fields`: Per-field task reads and mutations, assignees, comments

pub mod auth;
pub mod health;
pub mod task_fields;
pub mod tasks;
pub mod users;
