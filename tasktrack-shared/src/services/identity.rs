use std::sync::Arc;
use tracing::debug;

use super::error::{ServiceError, ServiceResult};
use crate::models::User;
use crate::repository::UserRepository;

/// Maps an authenticated principal to the acting user
#[derive(Clone)]
pub struct IdentityResolver {
    users: Arc<dyn UserRepository>,
}

impl IdentityResolver {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Loads the user whose email is the token subject
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when no user has that email.
    pub async fn resolve_acting_user(&self, principal_email: &str) -> ServiceResult<User> {
        let user = self
            .users
            .find_by_email(principal_email)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", "email", principal_email))?;

        debug!(user_id = user.id, "Resolved acting user");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateUser;
    use crate::repository::memory::InMemoryStore;

    #[tokio::test]
    async fn test_resolves_registered_user() {
        let store = Arc::new(InMemoryStore::new());
        let alice = store
            .create(CreateUser {
                name: "alice".to_string(),
                email: "alice@example.com".to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap();

        let resolver = IdentityResolver::new(store);
        assert_eq!(
            resolver.resolve_acting_user("alice@example.com").await.unwrap(),
            alice
        );
    }

    #[tokio::test]
    async fn test_unknown_principal_is_not_found() {
        let resolver = IdentityResolver::new(Arc::new(InMemoryStore::new()));
        let result = resolver.resolve_acting_user("ghost@example.com").await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }
}
