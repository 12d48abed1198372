use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    middleware::{AppJson, CurrentUser},
    models::{CreateSubtaskRequest, ReorderSubtasksRequest, SubtaskDto, UpdateSubtaskRequest},
    services::SubtaskService,
};

#[utoipa::path(
    get,
    path = "/api/todos/{id}/subtasks",
    params(("id" = i64, Path, description = "Todo ID")),
    responses(
        (status = 200, description = "Active subtasks in order", body = Vec<SubtaskDto>),
        (status = 404, description = "Todo not found"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer" = [])),
    tag = "subtasks"
)]
pub async fn get_subtasks(
    State(pool): State<SqlitePool>,
    CurrentUser(user_id): CurrentUser,
    Path(todo_id): Path<i64>,
) -> Result<Json<Vec<SubtaskDto>>, AppError> {
    let subtasks = SubtaskService::new(pool).list_subtasks(user_id, todo_id).await?;
    Ok(Json(subtasks))
}

#[utoipa::path(
    get,
    path = "/api/todos/{id}/subtasks/{subtask_id}",
    params(
        ("id" = i64, Path, description = "Todo ID"),
        ("subtask_id" = i64, Path, description = "Subtask ID")
    ),
    responses(
        (status = 200, description = "Subtask", body = SubtaskDto),
        (status = 404, description = "Subtask not found"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer" = [])),
    tag = "subtasks"
)]
pub async fn get_subtask(
    State(pool): State<SqlitePool>,
    CurrentUser(user_id): CurrentUser,
    Path((todo_id, id)): Path<(i64, i64)>,
) -> Result<Json<SubtaskDto>, AppError> {
    let subtask = SubtaskService::new(pool).get_subtask(user_id, todo_id, id).await?;
    Ok(Json(subtask))
}

#[utoipa::path(
    post,
    path = "/api/todos/{id}/subtasks",
    params(("id" = i64, Path, description = "Todo ID")),
    request_body = CreateSubtaskRequest,
    responses(
        (status = 201, description = "Subtask created", body = SubtaskDto),
        (status = 404, description = "Todo not found"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer" = [])),
    tag = "subtasks"
)]
pub async fn create_subtask(
    State(pool): State<SqlitePool>,
    CurrentUser(user_id): CurrentUser,
    Path(todo_id): Path<i64>,
    AppJson(payload): AppJson<CreateSubtaskRequest>,
) -> Result<(StatusCode, Json<SubtaskDto>), AppError> {
    let subtask = SubtaskService::new(pool)
        .create_subtask(user_id, todo_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(subtask)))
}

#[utoipa::path(
    put,
    path = "/api/todos/{id}/subtasks/{subtask_id}",
    params(
        ("id" = i64, Path, description = "Todo ID"),
        ("subtask_id" = i64, Path, description = "Subtask ID")
    ),
    request_body = UpdateSubtaskRequest,
    responses(
        (status = 200, description = "Subtask updated", body = SubtaskDto),
        (status = 404, description = "Subtask not found"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer" = [])),
    tag = "subtasks"
)]
pub async fn update_subtask(
    State(pool): State<SqlitePool>,
    CurrentUser(user_id): CurrentUser,
    Path((todo_id, id)): Path<(i64, i64)>,
    AppJson(payload): AppJson<UpdateSubtaskRequest>,
) -> Result<Json<SubtaskDto>, AppError> {
    let subtask = SubtaskService::new(pool)
        .update_subtask(user_id, todo_id, id, payload)
        .await?;
    Ok(Json(subtask))
}

#[utoipa::path(
    delete,
    path = "/api/todos/{id}/subtasks/{subtask_id}",
    params(
        ("id" = i64, Path, description = "Todo ID"),
        ("subtask_id" = i64, Path, description = "Subtask ID")
    ),
    responses(
        (status = 204, description = "Subtask deleted"),
        (status = 404, description = "Subtask not found"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer" = [])),
    tag = "subtasks"
)]
pub async fn delete_subtask(
    State(pool): State<SqlitePool>,
    CurrentUser(user_id): CurrentUser,
    Path((todo_id, id)): Path<(i64, i64)>,
) -> Result<StatusCode, AppError> {
    if !SubtaskService::new(pool)
        .delete_subtask(user_id, todo_id, id)
        .await?
    {
        return Err(AppError::NotFound("Subtask not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/todos/{id}/subtasks/reorder",
    params(("id" = i64, Path, description = "Todo ID")),
    request_body = ReorderSubtasksRequest,
    responses(
        (status = 200, description = "Subtasks reordered"),
        (status = 400, description = "Unknown, foreign, duplicate or missing ids"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer" = [])),
    tag = "subtasks"
)]
pub async fn reorder_subtasks(
    State(pool): State<SqlitePool>,
    CurrentUser(user_id): CurrentUser,
    Path(todo_id): Path<i64>,
    AppJson(payload): AppJson<ReorderSubtasksRequest>,
) -> Result<StatusCode, AppError> {
    SubtaskService::new(pool)
        .reorder_subtasks(user_id, todo_id, payload)
        .await?;
    Ok(StatusCode::OK)
}
