//! Data access for users, todos and subtasks.
//!
//! Every todo read takes the owning user id as a query filter, and every
//! subtask read either joins through its parent todo or is only reachable
//! after that todo was resolved for the caller. Soft-deleted rows are
//! excluded unless a method says otherwise.

pub mod subtasks;
pub mod todos;
pub mod users;

pub use subtasks::{NewSubtask, SubtaskRepository};
pub use todos::{NewTodo, TodoRepository};
pub use users::{NewUser, UserRepository};
