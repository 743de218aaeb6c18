use std::sync::Arc;
use tracing::{info, warn};

use super::error::{ServiceError, ServiceResult};
use crate::auth::password::PasswordHasher;
use crate::models::{CreateUser, User};
use crate::repository::{RepositoryError, UserRepository};

/// Reference to a user by id or by email
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssigneeRef {
    Id(i64),
    Email(String),
}

impl AssigneeRef {
    /// Builds a reference from optional request parts
    ///
    /// The id wins when both are present.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when neither part is usable.
    pub fn from_parts(id: Option<i64>, email: Option<String>) -> ServiceResult<Self> {
        match (id, email) {
            (Some(id), _) => Ok(AssigneeRef::Id(id)),
            (None, Some(email)) if !email.trim().is_empty() => Ok(AssigneeRef::Email(email)),
            _ => Err(ServiceError::invalid(
                "An assignee must be referenced by id or email",
            )),
        }
    }
}

/// Registration input
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Lookup and self-service updates of users
#[derive(Clone)]
pub struct UserDirectory {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
}

fn require_non_blank(value: &str, field: &str) -> ServiceResult<()> {
    if value.trim().is_empty() {
        return Err(ServiceError::invalid(format!("{} must not be blank", field)));
    }
    Ok(())
}

fn email_taken(err: RepositoryError) -> ServiceError {
    match err {
        RepositoryError::Conflict(_) => ServiceError::invalid("Email is already in use"),
        other => other.into(),
    }
}

impl UserDirectory {
    pub fn new(users: Arc<dyn UserRepository>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { users, hasher }
    }

    pub async fn find_all(&self) -> ServiceResult<Vec<User>> {
        Ok(self.users.find_all().await?)
    }

    pub async fn find_by_id(&self, id: i64) -> ServiceResult<User> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", "id", id))
    }

    pub async fn find_by_email(&self, email: &str) -> ServiceResult<User> {
        self.users
            .find_by_email(email)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", "email", email))
    }

    /// Resolves an assignee reference to a user
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the referenced user does not exist.
    pub async fn resolve_reference(&self, reference: &AssigneeRef) -> ServiceResult<User> {
        match reference {
            AssigneeRef::Id(id) => self.find_by_id(*id).await,
            AssigneeRef::Email(email) => self.find_by_email(email).await,
        }
    }

    /// Creates a user with a hashed password
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for blank fields or an email already in use.
    pub async fn register(&self, registration: Registration) -> ServiceResult<User> {
        require_non_blank(&registration.name, "Name")?;
        require_non_blank(&registration.email, "Email")?;
        require_non_blank(&registration.password, "Password")?;

        let password_hash = self.hasher.hash(&registration.password)?;
        let user = self
            .users
            .create(CreateUser {
                name: registration.name,
                email: registration.email,
                password_hash,
            })
            .await
            .map_err(email_taken)?;

        info!(user_id = user.id, "User registered");
        Ok(user)
    }

    /// Checks login credentials
    ///
    /// Unknown emails and wrong passwords fail identically.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when the credentials do not match.
    pub async fn authenticate(&self, email: &str, password: &str) -> ServiceResult<User> {
        let invalid = || ServiceError::invalid("Invalid email or password");

        let Some(user) = self.users.find_by_email(email).await? else {
            warn!("Login attempt for unknown email");
            return Err(invalid());
        };

        if !self.hasher.verify(password, &user.password_hash)? {
            warn!(user_id = user.id, "Login attempt with wrong password");
            return Err(invalid());
        }

        Ok(user)
    }

    pub async fn update_name(&self, acting_email: &str, new_name: &str) -> ServiceResult<User> {
        require_non_blank(new_name, "Name")?;

        let mut user = self.find_by_email(acting_email).await?;
        user.name = new_name.to_string();
        let user = self.users.save(&user).await?;

        info!(user_id = user.id, "User name updated");
        Ok(user)
    }

    pub async fn update_email(&self, acting_email: &str, new_email: &str) -> ServiceResult<User> {
        require_non_blank(new_email, "Email")?;

        let mut user = self.find_by_email(acting_email).await?;
        user.email = new_email.to_string();
        let user = self.users.save(&user).await.map_err(email_taken)?;

        info!(user_id = user.id, "User email updated");
        Ok(user)
    }

    pub async fn update_password(
        &self,
        acting_email: &str,
        new_password: &str,
    ) -> ServiceResult<User> {
        require_non_blank(new_password, "Password")?;

        let mut user = self.find_by_email(acting_email).await?;
        user.password_hash = self.hasher.hash(new_password)?;
        let user = self.users.save(&user).await?;

        info!(user_id = user.id, "User password updated");
        Ok(user)
    }
}
