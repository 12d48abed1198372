use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

use crate::models::{Subtask, TodoStatus};

pub struct NewSubtask {
    pub todo_id: i64,
    pub title: String,
    pub description: String,
    pub order: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct SubtaskRepository {
    pool: SqlitePool,
}

impl SubtaskRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Active subtasks of an active todo; `created_at` breaks ties on `order`.
    pub async fn get_active_subtasks_for_todo(
        &self,
        todo_id: i64,
    ) -> Result<Vec<Subtask>, sqlx::Error> {
        sqlx::query_as::<_, Subtask>(
            "SELECT s.* FROM subtasks s
             JOIN todos t ON t.id = s.todo_id
             WHERE s.todo_id = ? AND s.is_deleted = 0 AND t.is_deleted = 0
             ORDER BY s.sort_order ASC, s.created_at ASC, s.id ASC",
        )
        .bind(todo_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Same ordering as [`Self::get_active_subtasks_for_todo`], for several parents at once.
    pub async fn get_active_subtasks_for_todos(
        &self,
        todo_ids: &[i64],
    ) -> Result<Vec<Subtask>, sqlx::Error> {
        if todo_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT s.* FROM subtasks s
             JOIN todos t ON t.id = s.todo_id
             WHERE s.is_deleted = 0 AND t.is_deleted = 0 AND s.todo_id IN (",
        );
        {
            let mut separated = qb.separated(", ");
            for id in todo_ids {
                separated.push_bind(*id);
            }
            separated.push_unseparated(")");
        }
        qb.push(" ORDER BY s.todo_id ASC, s.sort_order ASC, s.created_at ASC, s.id ASC");

        qb.build_query_as::<Subtask>().fetch_all(&self.pool).await
    }

    pub async fn count_active_subtasks_for_todo(&self, todo_id: i64) -> Result<usize, sqlx::Error> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM subtasks WHERE todo_id = ? AND is_deleted = 0")
                .bind(todo_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count as usize)
    }

    /// True iff an active subtask with this id hangs off an active todo owned by `user_id`.
    pub async fn verify_subtask_ownership(
        &self,
        subtask_id: i64,
        user_id: i64,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(
                SELECT 1 FROM subtasks s
                JOIN todos t ON t.id = s.todo_id
                WHERE s.id = ? AND t.user_id = ? AND s.is_deleted = 0 AND t.is_deleted = 0
             )",
        )
        .bind(subtask_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
    }

    /// Unscoped lookup. Only call after [`Self::verify_subtask_ownership`].
    pub async fn get_subtask_by_id(&self, subtask_id: i64) -> Result<Option<Subtask>, sqlx::Error> {
        sqlx::query_as::<_, Subtask>("SELECT * FROM subtasks WHERE id = ?")
            .bind(subtask_id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Active subtasks matching both the id set and the parent. Once the parent was
    /// resolved for the caller this doubles as the ownership check.
    pub async fn get_subtasks_by_ids_for_todo(
        &self,
        ids: &[i64],
        todo_id: i64,
    ) -> Result<Vec<Subtask>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM subtasks WHERE todo_id = ");
        qb.push_bind(todo_id);
        qb.push(" AND is_deleted = 0 AND id IN (");
        {
            let mut separated = qb.separated(", ");
            for id in ids {
                separated.push_bind(*id);
            }
            separated.push_unseparated(")");
        }

        qb.build_query_as::<Subtask>().fetch_all(&self.pool).await
    }

    pub async fn add_subtask(&self, subtask: NewSubtask) -> Result<Subtask, sqlx::Error> {
        let id = sqlx::query(
            "INSERT INTO subtasks
                (todo_id, title, description, status, sort_order, is_deleted,
                 created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, 0, ?, ?)",
        )
        .bind(subtask.todo_id)
        .bind(&subtask.title)
        .bind(&subtask.description)
        .bind(TodoStatus::Pending)
        .bind(subtask.order)
        .bind(subtask.created_at)
        .bind(subtask.created_at)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        sqlx::query_as::<_, Subtask>("SELECT * FROM subtasks WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await
    }

    pub async fn update_subtask(&self, subtask: &Subtask) -> Result<(), sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        write_subtask(&mut conn, subtask).await
    }

    /// Writes every row in one transaction: all persist or none do.
    pub async fn update_subtasks_in_bulk(&self, subtasks: &[Subtask]) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        for subtask in subtasks {
            write_subtask(&mut tx, subtask).await?;
        }
        tx.commit().await
    }

    pub async fn soft_delete_subtask(
        &self,
        subtask_id: i64,
        at: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let affected = sqlx::query(
            "UPDATE subtasks SET is_deleted = 1, updated_at = ?
             WHERE id = ? AND is_deleted = 0",
        )
        .bind(at)
        .bind(subtask_id)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(affected > 0)
    }
}

// todo_id is part of the filter so a row can never be moved to another parent.
async fn write_subtask(conn: &mut SqliteConnection, subtask: &Subtask) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE subtasks SET
            title = ?, description = ?, status = ?, sort_order = ?, updated_at = ?
         WHERE id = ? AND todo_id = ?",
    )
    .bind(&subtask.title)
    .bind(&subtask.description)
    .bind(subtask.status)
    .bind(subtask.order)
    .bind(subtask.updated_at)
    .bind(subtask.id)
    .bind(subtask.todo_id)
    .execute(conn)
    .await?;
    Ok(())
}
