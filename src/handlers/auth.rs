use axum::{extract::State, Json};
use sqlx::SqlitePool;

use crate::{
    auth::TokenService,
    error::AppError,
    middleware::AppJson,
    models::{AuthResponse, LoginRequest, RegisterRequest},
    services::AccountService,
};

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "User registered", body = AuthResponse),
        (status = 400, description = "Password policy or uniqueness violation")
    ),
    tag = "auth"
)]
pub async fn register(
    State(pool): State<SqlitePool>,
    State(tokens): State<TokenService>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    tracing::info!(username = %payload.username, "registration attempt");
    let response = AccountService::new(pool, tokens).register(payload).await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials or disabled account")
    ),
    tag = "auth"
)]
pub async fn login(
    State(pool): State<SqlitePool>,
    State(tokens): State<TokenService>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    tracing::info!(username = %payload.username, "login attempt");
    let response = AccountService::new(pool, tokens).login(payload).await?;
    Ok(Json(response))
}
