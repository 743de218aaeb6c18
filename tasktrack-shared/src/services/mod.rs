/// Application services
///
/// - [`identity`]: resolves the acting user from a token subject
/// - [`users`]: user lookup, registration, login and self-service updates
/// - [`tasks`]: task reads and the field-level mutation rules
/// - [`comments`]: comment creation, editing and removal
///
/// Services take the acting user as an explicit argument and never read
/// request state themselves.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use tasktrack_shared::auth::password::Argon2Hasher;
/// use tasktrack_shared::repository::Repositories;
/// use tasktrack_shared::services::Services;
///
/// let services = Services::new(Repositories::in_memory(), Arc::new(Argon2Hasher::default()));
/// # let _ = services;
/// ```

pub mod comments;
pub mod error;
pub mod identity;
pub mod tasks;
pub mod users;

pub use comments::CommentService;
pub use error::{ServiceError, ServiceResult};
pub use identity::IdentityResolver;
pub use tasks::{CreateTask, TaskService};
pub use users::{AssigneeRef, Registration, UserDirectory};

use std::sync::Arc;

use crate::auth::password::PasswordHasher;
use crate::repository::Repositories;

/// All services wired to one set of repositories
#[derive(Clone)]
pub struct Services {
    pub identity: IdentityResolver,
    pub users: UserDirectory,
    pub tasks: TaskService,
    pub comments: CommentService,
}

impl Services {
    pub fn new(repos: Repositories, hasher: Arc<dyn PasswordHasher>) -> Self {
        let users = UserDirectory::new(repos.users.clone(), hasher);

        Self {
            identity: IdentityResolver::new(repos.users),
            tasks: TaskService::new(repos.tasks.clone(), users.clone()),
            comments: CommentService::new(repos.comments, repos.tasks),
            users,
        }
    }
}
