/// Domain models
///
/// - `user`: registered users
/// - `task`: the task aggregate with its status and priority enums
/// - `comment`: comments attached to tasks
///
/// Models are plain data. Loading and storing them goes through the
/// repository traits in [`crate::repository`].

pub mod comment;
pub mod task;
pub mod user;

pub use comment::{Comment, NewComment};
pub use task::{
    EditRejected, InvalidCode, NewTask, Task, TaskChange, TaskEdit, TaskPriority, TaskStatus,
};
pub use user::{CreateUser, User};
