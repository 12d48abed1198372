pub mod auth;
pub mod health;
pub mod subtasks;
pub mod todos;
