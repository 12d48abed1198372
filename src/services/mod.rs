//! Use cases over the repositories. Every call takes the resolved caller id
//! explicitly; nothing here reads ambient request state.

pub mod accounts;
pub mod subtasks;
pub mod todos;

pub use accounts::AccountService;
pub use subtasks::SubtaskService;
pub use todos::TodoService;

use crate::{error::AppError, models::Todo, repository::TodoRepository};

/// The caller's todo if it exists and is not deleted. Absent and foreign are the
/// same outcome.
pub(crate) async fn resolve_owned_todo(
    todos: &TodoRepository,
    user_id: i64,
    todo_id: i64,
) -> Result<Todo, AppError> {
    match todos.get_todo_for_user(todo_id, user_id).await? {
        Some(todo) if !todo.is_deleted => Ok(todo),
        _ => {
            tracing::warn!(user_id, todo_id, "todo not found for user");
            Err(AppError::NotFound(format!("Todo {todo_id} not found")))
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use sqlx::SqlitePool;

    use crate::{
        auth::TokenService,
        models::{CreateSubtaskRequest, CreateTodoRequest, Priority, RegisterRequest},
    };

    use super::{AccountService, SubtaskService, TodoService};

    pub fn tokens() -> TokenService {
        TokenService::new("test-secret")
    }

    pub fn register_request(username: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password: "Password1".to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
        }
    }

    pub async fn register(pool: &SqlitePool, username: &str) -> i64 {
        AccountService::new(pool.clone(), tokens())
            .register(register_request(username))
            .await
            .unwrap()
            .user
            .id
    }

    pub fn todo_request(title: &str) -> CreateTodoRequest {
        CreateTodoRequest {
            title: title.to_string(),
            description: String::new(),
            priority: Priority::Medium,
            due_date: None,
            order: 0,
        }
    }

    pub async fn create_todo(pool: &SqlitePool, user_id: i64, title: &str) -> i64 {
        TodoService::new(pool.clone())
            .create_todo(user_id, todo_request(title))
            .await
            .unwrap()
            .id
    }

    pub async fn create_subtask(pool: &SqlitePool, user_id: i64, todo_id: i64, order: i32) -> i64 {
        SubtaskService::new(pool.clone())
            .create_subtask(
                user_id,
                todo_id,
                CreateSubtaskRequest {
                    title: format!("step {order}"),
                    description: String::new(),
                    order,
                },
            )
            .await
            .unwrap()
            .id
    }
}
