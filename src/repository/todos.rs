use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

use crate::models::{Priority, Todo, TodoStatus};

pub struct NewTodo {
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub due_date: Option<DateTime<Utc>>,
    pub order: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct TodoRepository {
    pool: SqlitePool,
}

impl TodoRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// The caller's active todos by display position.
    pub async fn get_active_todos_for_user(&self, user_id: i64) -> Result<Vec<Todo>, sqlx::Error> {
        sqlx::query_as::<_, Todo>(
            "SELECT * FROM todos
             WHERE user_id = ? AND is_deleted = 0
             ORDER BY sort_order ASC, created_at ASC, id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn count_active_todos_for_user(&self, user_id: i64) -> Result<usize, sqlx::Error> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM todos WHERE user_id = ? AND is_deleted = 0")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count as usize)
    }

    /// Fetch by id scoped to the owner, whatever the deleted flag; callers decide
    /// whether a deleted row is acceptable.
    pub async fn get_todo_for_user(
        &self,
        todo_id: i64,
        user_id: i64,
    ) -> Result<Option<Todo>, sqlx::Error> {
        sqlx::query_as::<_, Todo>("SELECT * FROM todos WHERE id = ? AND user_id = ?")
            .bind(todo_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
    }

    /// The subset of `ids` naming active todos owned by `user_id`. Callers compare
    /// lengths to detect foreign or unknown ids.
    pub async fn get_todos_by_ids_for_user(
        &self,
        ids: &[i64],
        user_id: i64,
    ) -> Result<Vec<Todo>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM todos WHERE user_id = ");
        qb.push_bind(user_id);
        qb.push(" AND is_deleted = 0 AND id IN (");
        {
            let mut separated = qb.separated(", ");
            for id in ids {
                separated.push_bind(*id);
            }
            separated.push_unseparated(")");
        }

        qb.build_query_as::<Todo>().fetch_all(&self.pool).await
    }

    pub async fn add_todo(&self, todo: NewTodo) -> Result<Todo, sqlx::Error> {
        let id = sqlx::query(
            "INSERT INTO todos
                (user_id, title, description, status, priority, due_date, sort_order,
                 is_deleted, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?, ?)",
        )
        .bind(todo.user_id)
        .bind(&todo.title)
        .bind(&todo.description)
        .bind(TodoStatus::Pending)
        .bind(todo.priority)
        .bind(todo.due_date)
        .bind(todo.order)
        .bind(todo.created_at)
        .bind(todo.created_at)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        sqlx::query_as::<_, Todo>("SELECT * FROM todos WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await
    }

    pub async fn update_todo(&self, todo: &Todo) -> Result<(), sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        write_todo(&mut conn, todo).await
    }

    /// Writes every row in one transaction: all persist or none do.
    pub async fn update_todos_in_bulk(&self, todos: &[Todo]) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        for todo in todos {
            write_todo(&mut tx, todo).await?;
        }
        tx.commit().await
    }

    /// Marks the todo and its active subtasks deleted. Returns false when no active
    /// todo with this id belongs to `user_id`.
    pub async fn soft_delete_todo(
        &self,
        todo_id: i64,
        user_id: i64,
        at: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let affected = sqlx::query(
            "UPDATE todos SET is_deleted = 1, updated_at = ?
             WHERE id = ? AND user_id = ? AND is_deleted = 0",
        )
        .bind(at)
        .bind(todo_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if affected == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query(
            "UPDATE subtasks SET is_deleted = 1, updated_at = ?
             WHERE todo_id = ? AND is_deleted = 0",
        )
        .bind(at)
        .bind(todo_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }
}

// user_id is part of the filter so a row can never be moved to another owner.
async fn write_todo(conn: &mut SqliteConnection, todo: &Todo) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE todos SET
            title = ?, description = ?, status = ?, priority = ?, due_date = ?,
            sort_order = ?, updated_at = ?
         WHERE id = ? AND user_id = ?",
    )
    .bind(&todo.title)
    .bind(&todo.description)
    .bind(todo.status)
    .bind(todo.priority)
    .bind(todo.due_date)
    .bind(todo.order)
    .bind(todo.updated_at)
    .bind(todo.id)
    .bind(todo.user_id)
    .execute(conn)
    .await?;
    Ok(())
}
