use axum::{
    extract::FromRef,
    routing::{get, post},
    Router,
};
use dotenvy::dotenv;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

mod auth;
mod config;
mod db;
mod error;
mod handlers;
mod middleware;
mod models;
mod reorder;
mod repository;
mod services;

#[cfg(test)]
mod tests;

use crate::{auth::TokenService, config::Config};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,
        handlers::auth::register,
        handlers::auth::login,
        handlers::todos::get_todos,
        handlers::todos::get_todo,
        handlers::todos::create_todo,
        handlers::todos::update_todo,
        handlers::todos::delete_todo,
        handlers::todos::reorder_todos,
        handlers::subtasks::get_subtasks,
        handlers::subtasks::get_subtask,
        handlers::subtasks::create_subtask,
        handlers::subtasks::update_subtask,
        handlers::subtasks::delete_subtask,
        handlers::subtasks::reorder_subtasks
    ),
    components(
        schemas(
            handlers::health::Health,
            models::RegisterRequest,
            models::LoginRequest,
            models::UserDto,
            models::AuthResponse,
            models::CreateTodoRequest,
            models::UpdateTodoRequest,
            models::ReorderTodosRequest,
            models::TodoDto,
            models::CreateSubtaskRequest,
            models::UpdateSubtaskRequest,
            models::ReorderSubtasksRequest,
            models::SubtaskDto
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Liveness"),
        (name = "auth", description = "Registration and login"),
        (name = "todos", description = "Todo management"),
        (name = "subtasks", description = "Subtasks of a todo")
    )
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::Http::new(
                        utoipa::openapi::security::HttpAuthScheme::Bearer,
                    ),
                ),
            );
        }
    }
}

/// Shared handler state; handlers pull either half through `State`.
#[derive(Clone, FromRef)]
pub struct AppState {
    pub pool: SqlitePool,
    pub tokens: TokenService,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before anything reads the environment
    dotenv().ok();

    // Tracing (logging)
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,planner_axum_rust=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    // Database
    let pool = db::establish_connection(&config.database_url).await?;

    let state = AppState {
        pool,
        tokens: TokenService::new(&config.secret_key),
    };
    let app = create_app(state);

    // Serve
    tracing::info!("listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

pub fn create_app(state: AppState) -> Router {
    // CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public routes
        .route("/", get(|| async { "Planner backend is running!" }))
        .route("/api/health", get(handlers::health::health))
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        // Protected routes
        .route(
            "/api/todos",
            get(handlers::todos::get_todos).post(handlers::todos::create_todo),
        )
        .route("/api/todos/reorder", post(handlers::todos::reorder_todos))
        .route(
            "/api/todos/:id",
            get(handlers::todos::get_todo)
                .put(handlers::todos::update_todo)
                .delete(handlers::todos::delete_todo),
        )
        .route(
            "/api/todos/:id/subtasks",
            get(handlers::subtasks::get_subtasks).post(handlers::subtasks::create_subtask),
        )
        .route(
            "/api/todos/:id/subtasks/reorder",
            post(handlers::subtasks::reorder_subtasks),
        )
        .route(
            "/api/todos/:id/subtasks/:subtask_id",
            get(handlers::subtasks::get_subtask)
                .put(handlers::subtasks::update_subtask)
                .delete(handlers::subtasks::delete_subtask),
        )
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
