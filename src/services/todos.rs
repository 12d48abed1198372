use std::collections::HashMap;

use chrono::Utc;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::{CreateTodoRequest, ReorderTodosRequest, Subtask, TodoDto, UpdateTodoRequest},
    reorder::{self, UserTodos},
    repository::{NewTodo, SubtaskRepository, TodoRepository},
};

use super::resolve_owned_todo;

pub struct TodoService {
    todos: TodoRepository,
    subtasks: SubtaskRepository,
}

impl TodoService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            todos: TodoRepository::new(pool.clone()),
            subtasks: SubtaskRepository::new(pool),
        }
    }

    /// Active todos in display order, each with its active subtasks.
    pub async fn list_todos(&self, user_id: i64) -> Result<Vec<TodoDto>, AppError> {
        let todos = self.todos.get_active_todos_for_user(user_id).await?;
        let ids: Vec<i64> = todos.iter().map(|t| t.id).collect();

        let mut by_todo: HashMap<i64, Vec<Subtask>> = HashMap::new();
        for subtask in self.subtasks.get_active_subtasks_for_todos(&ids).await? {
            by_todo.entry(subtask.todo_id).or_default().push(subtask);
        }

        Ok(todos
            .iter()
            .map(|todo| {
                let subtasks = by_todo.get(&todo.id).map(Vec::as_slice).unwrap_or_default();
                TodoDto::with_subtasks(todo, subtasks)
            })
            .collect())
    }

    pub async fn get_todo(&self, user_id: i64, todo_id: i64) -> Result<TodoDto, AppError> {
        let todo = resolve_owned_todo(&self.todos, user_id, todo_id).await?;
        let subtasks = self.subtasks.get_active_subtasks_for_todo(todo.id).await?;
        Ok(TodoDto::with_subtasks(&todo, &subtasks))
    }

    pub async fn create_todo(
        &self,
        user_id: i64,
        req: CreateTodoRequest,
    ) -> Result<TodoDto, AppError> {
        req.validate()?;

        let todo = self
            .todos
            .add_todo(NewTodo {
                user_id,
                title: req.title,
                description: req.description,
                priority: req.priority,
                due_date: req.due_date,
                order: req.order,
                created_at: Utc::now(),
            })
            .await?;

        tracing::info!(user_id, todo_id = todo.id, "todo created");
        Ok(TodoDto::with_subtasks(&todo, &[]))
    }

    /// Full overwrite of the editable fields.
    pub async fn update_todo(
        &self,
        user_id: i64,
        todo_id: i64,
        req: UpdateTodoRequest,
    ) -> Result<TodoDto, AppError> {
        req.validate()?;

        let mut todo = resolve_owned_todo(&self.todos, user_id, todo_id).await?;
        todo.title = req.title;
        todo.description = req.description;
        todo.status = req.status;
        todo.priority = req.priority;
        todo.due_date = req.due_date;
        todo.updated_at = Utc::now();
        self.todos.update_todo(&todo).await?;

        tracing::info!(user_id, todo_id, status = %todo.status, "todo updated");
        let subtasks = self.subtasks.get_active_subtasks_for_todo(todo.id).await?;
        Ok(TodoDto::with_subtasks(&todo, &subtasks))
    }

    /// Soft-deletes the todo and its subtasks. `false` means nothing of the caller's
    /// was there to delete.
    pub async fn delete_todo(&self, user_id: i64, todo_id: i64) -> Result<bool, AppError> {
        let deleted = self.todos.soft_delete_todo(todo_id, user_id, Utc::now()).await?;
        if deleted {
            tracing::info!(user_id, todo_id, "todo deleted");
        } else {
            tracing::warn!(user_id, todo_id, "todo not found for deletion");
        }
        Ok(deleted)
    }

    pub async fn reorder_todos(
        &self,
        user_id: i64,
        req: ReorderTodosRequest,
    ) -> Result<(), AppError> {
        let siblings = UserTodos {
            repo: &self.todos,
            user_id,
        };

        match reorder::reorder(&siblings, &req.todo_ids, Utc::now()).await {
            Ok(todos) => {
                tracing::info!(user_id, count = todos.len(), "todos reordered");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(user_id, error = %err, "todo reorder rejected");
                Err(err)
            }
        }
    }
}
