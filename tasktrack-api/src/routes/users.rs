/// User endpoints
///
/// Users are addressed either by numeric id or by the literal `me`, which
/// stands for the acting user.
///
/// # Endpoints
///
/// - `GET /api/users/` - All users
/// - `GET /api/users/:user` - One user
/// - `GET /api/users/:user/{id,name,email}` - `{field: value}`
/// - `GET /api/users/:user/{created-tasks,assigned-tasks}` - Task lists
/// - `PUT /api/users/me/{name,email,password}?<field>=` - Self updates

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::str::FromStr;
use tasktrack_shared::{
    auth::middleware::AuthContext,
    models::User,
    projection::{TaskResponse, UserResponse},
};

/// A user path segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserSelector {
    Me,
    Id(i64),
}

impl FromStr for UserSelector {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "me" {
            return Ok(UserSelector::Me);
        }
        s.parse()
            .map(UserSelector::Id)
            .map_err(|_| ApiError::BadRequest(format!("Invalid user id: {}", s)))
    }
}

/// Readable user fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserField {
    Id,
    Name,
    Email,
    CreatedTasks,
    AssignedTasks,
}

impl FromStr for UserField {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(UserField::Id),
            "name" => Ok(UserField::Name),
            "email" => Ok(UserField::Email),
            "created-tasks" => Ok(UserField::CreatedTasks),
            "assigned-tasks" => Ok(UserField::AssignedTasks),
            other => Err(ApiError::NotFound(format!("Unknown user field: {}", other))),
        }
    }
}

/// Self-updatable fields, each passed as a query parameter of the same name
#[derive(Debug, Default, Deserialize)]
pub struct UserUpdateQuery {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

async fn resolve(state: &AppState, auth: &AuthContext, selector: UserSelector) -> ApiResult<User> {
    match selector {
        UserSelector::Me => Ok(auth.user.clone()),
        UserSelector::Id(id) => Ok(state.services.users.find_by_id(id).await?),
    }
}

fn task_list(tasks: &[tasktrack_shared::models::Task]) -> Value {
    json!(tasks.iter().map(TaskResponse::from).collect::<Vec<_>>())
}

fn missing(param: &str) -> ApiError {
    ApiError::BadRequest(format!("Missing query parameter `{}`", param))
}

/// Lists all users
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<UserResponse>>> {
    let users = state.services.users.find_all().await?;
    Ok(Json(users.iter().map(UserResponse::from).collect()))
}

/// Returns one user
pub async fn get_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(user): Path<String>,
) -> ApiResult<Json<UserResponse>> {
    let user = resolve(&state, &auth, user.parse()?).await?;
    Ok(Json(UserResponse::from(&user)))
}

/// Returns a single field of a user, or the tasks they created or are assigned to
pub async fn read_field(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((user, field)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let selector: UserSelector = user.parse()?;
    let field: UserField = field.parse()?;
    let user = resolve(&state, &auth, selector).await?;

    let body = match field {
        UserField::Id => json!({ "id": user.id }),
        UserField::Name => json!({ "name": user.name }),
        UserField::Email => json!({ "email": user.email }),
        UserField::CreatedTasks => task_list(&state.services.tasks.find_all_by_author(&user).await?),
        UserField::AssignedTasks => {
            task_list(&state.services.tasks.find_all_by_assignee(&user).await?)
        }
    };

    Ok(Json(body))
}

/// Updates the name, email or password of the acting user
///
/// Changing the email invalidates existing tokens, since their subject is
/// the old address.
///
/// # Errors
///
/// - `400 Bad Request`: Another user is targeted, the value is missing or
///   blank, or the new email is taken
/// - `404 Not Found`: Unknown field
pub async fn update_field(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((user, field)): Path<(String, String)>,
    Query(query): Query<UserUpdateQuery>,
) -> ApiResult<Json<UserResponse>> {
    let selector: UserSelector = user.parse()?;
    if selector != UserSelector::Me && selector != UserSelector::Id(auth.user.id) {
        return Err(ApiError::BadRequest(
            "Users can only update their own account".to_string(),
        ));
    }

    let users = &state.services.users;
    let acting_email = auth.user.email.as_str();
    let user = match field.as_str() {
        "name" => {
            let name = query.name.ok_or_else(|| missing("name"))?;
            users.update_name(acting_email, &name).await?
        }
        "email" => {
            let email = query.email.ok_or_else(|| missing("email"))?;
            users.update_email(acting_email, &email).await?
        }
        "password" => {
            let password = query.password.ok_or_else(|| missing("password"))?;
            users.update_password(acting_email, &password).await?
        }
        other => {
            return Err(ApiError::NotFound(format!(
                "Unknown updatable user field: {}",
                other
            )))
        }
    };

    Ok(Json(UserResponse::from(&user)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_selector() {
        assert_eq!("me".parse::<UserSelector>().unwrap(), UserSelector::Me);
        assert_eq!("42".parse::<UserSelector>().unwrap(), UserSelector::Id(42));
        assert!(matches!(
            "abc".parse::<UserSelector>(),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn test_parse_field() {
        assert_eq!(
            "created-tasks".parse::<UserField>().unwrap(),
            UserField::CreatedTasks
        );
        assert!(matches!(
            "password".parse::<UserField>(),
            Err(ApiError::NotFound(_))
        ));
    }
}
