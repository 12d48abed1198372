use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    middleware::{AppJson, CurrentUser},
    models::{CreateTodoRequest, ReorderTodosRequest, TodoDto, UpdateTodoRequest},
    services::TodoService,
};

#[utoipa::path(
    get,
    path = "/api/todos",
    responses(
        (status = 200, description = "Active todos with their subtasks", body = Vec<TodoDto>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer" = [])),
    tag = "todos"
)]
pub async fn get_todos(
    State(pool): State<SqlitePool>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<Vec<TodoDto>>, AppError> {
    let todos = TodoService::new(pool).list_todos(user_id).await?;
    Ok(Json(todos))
}

#[utoipa::path(
    get,
    path = "/api/todos/{id}",
    params(("id" = i64, Path, description = "Todo ID")),
    responses(
        (status = 200, description = "Todo with its subtasks", body = TodoDto),
        (status = 404, description = "Todo not found"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer" = [])),
    tag = "todos"
)]
pub async fn get_todo(
    State(pool): State<SqlitePool>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<TodoDto>, AppError> {
    let todo = TodoService::new(pool).get_todo(user_id, id).await?;
    Ok(Json(todo))
}

#[utoipa::path(
    post,
    path = "/api/todos",
    request_body = CreateTodoRequest,
    responses(
        (status = 201, description = "Todo created", body = TodoDto),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer" = [])),
    tag = "todos"
)]
pub async fn create_todo(
    State(pool): State<SqlitePool>,
    CurrentUser(user_id): CurrentUser,
    AppJson(payload): AppJson<CreateTodoRequest>,
) -> Result<(StatusCode, Json<TodoDto>), AppError> {
    let todo = TodoService::new(pool).create_todo(user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(todo)))
}

#[utoipa::path(
    put,
    path = "/api/todos/{id}",
    params(("id" = i64, Path, description = "Todo ID")),
    request_body = UpdateTodoRequest,
    responses(
        (status = 200, description = "Todo updated", body = TodoDto),
        (status = 404, description = "Todo not found"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer" = [])),
    tag = "todos"
)]
pub async fn update_todo(
    State(pool): State<SqlitePool>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<UpdateTodoRequest>,
) -> Result<Json<TodoDto>, AppError> {
    let todo = TodoService::new(pool).update_todo(user_id, id, payload).await?;
    Ok(Json(todo))
}

#[utoipa::path(
    delete,
    path = "/api/todos/{id}",
    params(("id" = i64, Path, description = "Todo ID")),
    responses(
        (status = 204, description = "Todo deleted"),
        (status = 404, description = "Todo not found"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer" = [])),
    tag = "todos"
)]
pub async fn delete_todo(
    State(pool): State<SqlitePool>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    if !TodoService::new(pool).delete_todo(user_id, id).await? {
        return Err(AppError::NotFound("Todo not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/todos/reorder",
    request_body = ReorderTodosRequest,
    responses(
        (status = 200, description = "Todos reordered"),
        (status = 400, description = "Unknown, foreign, duplicate or missing ids"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer" = [])),
    tag = "todos"
)]
pub async fn reorder_todos(
    State(pool): State<SqlitePool>,
    CurrentUser(user_id): CurrentUser,
    AppJson(payload): AppJson<ReorderTodosRequest>,
) -> Result<StatusCode, AppError> {
    TodoService::new(pool).reorder_todos(user_id, payload).await?;
    Ok(StatusCode::OK)
}
