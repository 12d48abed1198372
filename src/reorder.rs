//! Rewrites the display order of a sibling set from a caller-supplied id sequence.
//!
//! A request must name every active sibling exactly once. The entity at position
//! `i` receives `order = i`, so a successful reorder always leaves the set as a
//! dense `0..N-1` sequence, written in one transaction.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::{
    error::AppError,
    models::{Subtask, Todo},
    repository::{SubtaskRepository, TodoRepository},
};

/// An entity with a position among its siblings.
pub trait Orderable {
    fn id(&self) -> i64;
    fn reposition(&mut self, order: i32, at: DateTime<Utc>);
}

impl Orderable for Todo {
    fn id(&self) -> i64 {
        self.id
    }

    fn reposition(&mut self, order: i32, at: DateTime<Utc>) {
        self.order = order;
        self.updated_at = at;
    }
}

impl Orderable for Subtask {
    fn id(&self) -> i64 {
        self.id
    }

    fn reposition(&mut self, order: i32, at: DateTime<Utc>) {
        self.order = order;
        self.updated_at = at;
    }
}

/// Storage view of one sibling set, already narrowed to the caller's scope.
#[allow(async_fn_in_trait)]
pub trait SiblingSet {
    type Item: Orderable;

    async fn count_active(&self) -> Result<usize, sqlx::Error>;
    async fn fetch_named(&self, ids: &[i64]) -> Result<Vec<Self::Item>, sqlx::Error>;
    async fn persist(&self, items: &[Self::Item]) -> Result<(), sqlx::Error>;
}

/// A user's active todos.
pub struct UserTodos<'a> {
    pub repo: &'a TodoRepository,
    pub user_id: i64,
}

impl SiblingSet for UserTodos<'_> {
    type Item = Todo;

    async fn count_active(&self) -> Result<usize, sqlx::Error> {
        self.repo.count_active_todos_for_user(self.user_id).await
    }

    async fn fetch_named(&self, ids: &[i64]) -> Result<Vec<Todo>, sqlx::Error> {
        self.repo.get_todos_by_ids_for_user(ids, self.user_id).await
    }

    async fn persist(&self, items: &[Todo]) -> Result<(), sqlx::Error> {
        self.repo.update_todos_in_bulk(items).await
    }
}

/// The active subtasks of one todo. Build only after the todo was resolved for the caller.
pub struct TodoSubtasks<'a> {
    pub repo: &'a SubtaskRepository,
    pub todo_id: i64,
}

impl SiblingSet for TodoSubtasks<'_> {
    type Item = Subtask;

    async fn count_active(&self) -> Result<usize, sqlx::Error> {
        self.repo.count_active_subtasks_for_todo(self.todo_id).await
    }

    async fn fetch_named(&self, ids: &[i64]) -> Result<Vec<Subtask>, sqlx::Error> {
        self.repo.get_subtasks_by_ids_for_todo(ids, self.todo_id).await
    }

    async fn persist(&self, items: &[Subtask]) -> Result<(), sqlx::Error> {
        self.repo.update_subtasks_in_bulk(items).await
    }
}

/// Validates `requested` against `siblings` and persists the new order atomically.
/// Returns the entities sorted by their new position.
pub async fn reorder<S: SiblingSet>(
    siblings: &S,
    requested: &[i64],
    at: DateTime<Utc>,
) -> Result<Vec<S::Item>, AppError> {
    reject_duplicates(requested)?;

    let fetched = siblings.fetch_named(requested).await?;
    if fetched.len() != requested.len() {
        return Err(AppError::ValidationError(
            "One or more ids are unknown or outside the reorder scope".to_string(),
        ));
    }

    let active = siblings.count_active().await?;
    if active != requested.len() {
        return Err(AppError::ValidationError(format!(
            "Reorder must name all {active} items, got {}",
            requested.len()
        )));
    }

    let ordered = assign_positions(requested, fetched, at)?;
    siblings.persist(&ordered).await?;
    Ok(ordered)
}

pub fn reject_duplicates(requested: &[i64]) -> Result<(), AppError> {
    let mut seen = HashSet::with_capacity(requested.len());
    match requested.iter().find(|id| !seen.insert(**id)) {
        Some(id) => Err(AppError::ValidationError(format!(
            "Duplicate id {id} in reorder request"
        ))),
        None => Ok(()),
    }
}

/// Gives each entity the index of its id in `requested`. `fetched` must hold exactly
/// the entities named by `requested`.
pub fn assign_positions<T: Orderable>(
    requested: &[i64],
    fetched: Vec<T>,
    at: DateTime<Utc>,
) -> Result<Vec<T>, AppError> {
    let mut by_id: HashMap<i64, T> = fetched.into_iter().map(|e| (e.id(), e)).collect();

    requested
        .iter()
        .enumerate()
        .map(|(position, id)| -> Result<T, AppError> {
            let mut entity = by_id.remove(id).ok_or_else(|| {
                AppError::ValidationError(format!("Id {id} is unknown or outside the reorder scope"))
            })?;
            let order = i32::try_from(position).map_err(|_| {
                AppError::ValidationError("Reorder request is too large".to_string())
            })?;
            entity.reposition(order, at);
            Ok(entity)
        })
        .collect()
}
