use chrono::Utc;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        CreateSubtaskRequest, ReorderSubtasksRequest, Subtask, SubtaskDto, UpdateSubtaskRequest,
    },
    reorder::{self, TodoSubtasks},
    repository::{NewSubtask, SubtaskRepository, TodoRepository},
};

use super::resolve_owned_todo;

pub struct SubtaskService {
    todos: TodoRepository,
    subtasks: SubtaskRepository,
}

impl SubtaskService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            todos: TodoRepository::new(pool.clone()),
            subtasks: SubtaskRepository::new(pool),
        }
    }

    pub async fn list_subtasks(
        &self,
        user_id: i64,
        todo_id: i64,
    ) -> Result<Vec<SubtaskDto>, AppError> {
        let todo = resolve_owned_todo(&self.todos, user_id, todo_id).await?;
        let subtasks = self.subtasks.get_active_subtasks_for_todo(todo.id).await?;
        Ok(subtasks.iter().map(SubtaskDto::from).collect())
    }

    pub async fn get_subtask(
        &self,
        user_id: i64,
        todo_id: i64,
        subtask_id: i64,
    ) -> Result<SubtaskDto, AppError> {
        let subtask = self.owned_subtask(user_id, todo_id, subtask_id).await?;
        Ok(SubtaskDto::from(&subtask))
    }

    /// Adds a pending subtask under a todo the caller owns.
    pub async fn create_subtask(
        &self,
        user_id: i64,
        todo_id: i64,
        req: CreateSubtaskRequest,
    ) -> Result<SubtaskDto, AppError> {
        let todo = resolve_owned_todo(&self.todos, user_id, todo_id).await?;
        req.validate()?;

        let subtask = self
            .subtasks
            .add_subtask(NewSubtask {
                todo_id: todo.id,
                title: req.title,
                description: req.description,
                order: req.order,
                created_at: Utc::now(),
            })
            .await?;

        tracing::info!(user_id, todo_id, subtask_id = subtask.id, "subtask created");
        Ok(SubtaskDto::from(&subtask))
    }

    /// Full overwrite of title, description, status and order.
    pub async fn update_subtask(
        &self,
        user_id: i64,
        todo_id: i64,
        subtask_id: i64,
        req: UpdateSubtaskRequest,
    ) -> Result<SubtaskDto, AppError> {
        req.validate()?;

        let mut subtask = self.owned_subtask(user_id, todo_id, subtask_id).await?;
        subtask.title = req.title;
        subtask.description = req.description;
        subtask.status = req.status;
        subtask.order = req.order;
        subtask.updated_at = Utc::now();
        self.subtasks.update_subtask(&subtask).await?;

        tracing::info!(user_id, todo_id, subtask_id, status = %subtask.status, "subtask updated");
        Ok(SubtaskDto::from(&subtask))
    }

    /// `false` when the subtask is absent, deleted, foreign or under another todo.
    pub async fn delete_subtask(
        &self,
        user_id: i64,
        todo_id: i64,
        subtask_id: i64,
    ) -> Result<bool, AppError> {
        match self.owned_subtask(user_id, todo_id, subtask_id).await {
            Ok(subtask) => {
                let deleted = self.subtasks.soft_delete_subtask(subtask.id, Utc::now()).await?;
                tracing::info!(user_id, todo_id, subtask_id, "subtask deleted");
                Ok(deleted)
            }
            Err(AppError::NotFound(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    pub async fn reorder_subtasks(
        &self,
        user_id: i64,
        todo_id: i64,
        req: ReorderSubtasksRequest,
    ) -> Result<(), AppError> {
        let todo = resolve_owned_todo(&self.todos, user_id, todo_id)
            .await
            .map_err(|err| match err {
                AppError::NotFound(_) => AppError::ValidationError(
                    "Todo not found or doesn't belong to user".to_string(),
                ),
                other => other,
            })?;

        let siblings = TodoSubtasks {
            repo: &self.subtasks,
            todo_id: todo.id,
        };

        match reorder::reorder(&siblings, &req.subtask_ids, Utc::now()).await {
            Ok(subtasks) => {
                tracing::info!(user_id, todo_id, count = subtasks.len(), "subtasks reordered");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(user_id, todo_id, error = %err, "subtask reorder rejected");
                Err(err)
            }
        }
    }

    /// Ownership goes through the parent todo; the path's todo id must be the
    /// subtask's real parent.
    async fn owned_subtask(
        &self,
        user_id: i64,
        todo_id: i64,
        subtask_id: i64,
    ) -> Result<Subtask, AppError> {
        let not_found = || {
            tracing::warn!(user_id, todo_id, subtask_id, "subtask not found for user");
            AppError::NotFound(format!("Subtask {subtask_id} not found"))
        };

        if !self.subtasks.verify_subtask_ownership(subtask_id, user_id).await? {
            return Err(not_found());
        }

        match self.subtasks.get_subtask_by_id(subtask_id).await? {
            Some(subtask) if !subtask.is_deleted && subtask.todo_id == todo_id => Ok(subtask),
            _ => Err(not_found()),
        }
    }
}
