use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::auth::validate_password;

// --- Enums (stored and serialized as integer codes) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(try_from = "i32", into = "i32")]
#[repr(i32)]
pub enum TodoStatus {
    #[default]
    Pending = 0,
    InProgress = 1,
    Completed = 2,
    Cancelled = 3,
}

impl TodoStatus {
    pub const ALL: [TodoStatus; 4] = [
        TodoStatus::Pending,
        TodoStatus::InProgress,
        TodoStatus::Completed,
        TodoStatus::Cancelled,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            TodoStatus::Pending => "Pending",
            TodoStatus::InProgress => "In Progress",
            TodoStatus::Completed => "Completed",
            TodoStatus::Cancelled => "Cancelled",
        }
    }
}

impl From<TodoStatus> for i32 {
    fn from(status: TodoStatus) -> Self {
        status as i32
    }
}

impl TryFrom<i32> for TodoStatus {
    type Error = String;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        TodoStatus::ALL
            .into_iter()
            .find(|s| i32::from(*s) == code)
            .ok_or_else(|| format!("unknown status code {code}"))
    }
}

impl fmt::Display for TodoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(try_from = "i32", into = "i32")]
#[repr(i32)]
pub enum Priority {
    Low = 0,
    #[default]
    Medium = 1,
    High = 2,
    Critical = 3,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Critical,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
            Priority::Critical => "Critical",
        }
    }
}

impl From<Priority> for i32 {
    fn from(priority: Priority) -> Self {
        priority as i32
    }
}

impl TryFrom<i32> for Priority {
    type Error = String;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        Priority::ALL
            .into_iter()
            .find(|p| i32::from(*p) == code)
            .ok_or_else(|| format!("unknown priority code {code}"))
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

// --- Domain Models (Mapped to DB) ---

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Todo {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub status: TodoStatus,
    pub priority: Priority,
    pub due_date: Option<DateTime<Utc>>,
    #[sqlx(rename = "sort_order")]
    pub order: i32,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Subtask {
    pub id: i64,
    pub todo_id: i64,
    pub title: String,
    pub description: String,
    pub status: TodoStatus,
    #[sqlx(rename = "sort_order")]
    pub order: i32,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- Request/Response DTOs ---

/// Rejects empty and whitespace-only text.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required"));
    }
    Ok(())
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 50, message = "Username must be between 3 and 50 characters long"))]
    pub username: String,
    #[validate(
        email(message = "Email address is not valid"),
        length(max = 100, message = "Email must be at most 100 characters long")
    )]
    pub email: String,
    #[validate(custom(function = "validate_password"))]
    pub password: String,
    #[validate(
        custom(function = "not_blank"),
        length(max = 50, message = "First name must be at most 50 characters long")
    )]
    pub first_name: String,
    #[validate(
        custom(function = "not_blank"),
        length(max = 50, message = "Last name must be at most 50 characters long")
    )]
    pub last_name: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<&User> for UserDto {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_active: user.is_active,
            created_at: user.created_at,
            last_login_at: user.last_login_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub user: UserDto,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodoRequest {
    #[validate(
        custom(function = "not_blank"),
        length(max = 200, message = "Title must be at most 200 characters long")
    )]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 1000, message = "Description must be at most 1000 characters long"))]
    pub description: String,
    #[serde(default)]
    #[schema(value_type = i32)]
    pub priority: Priority,
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub order: i32,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodoRequest {
    #[validate(
        custom(function = "not_blank"),
        length(max = 200, message = "Title must be at most 200 characters long")
    )]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 1000, message = "Description must be at most 1000 characters long"))]
    pub description: String,
    #[schema(value_type = i32)]
    pub status: TodoStatus,
    #[schema(value_type = i32)]
    pub priority: Priority,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubtaskRequest {
    #[validate(
        custom(function = "not_blank"),
        length(max = 200, message = "Title must be at most 200 characters long")
    )]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 500, message = "Description must be at most 500 characters long"))]
    pub description: String,
    #[serde(default)]
    pub order: i32,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubtaskRequest {
    #[validate(
        custom(function = "not_blank"),
        length(max = 200, message = "Title must be at most 200 characters long")
    )]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 500, message = "Description must be at most 500 characters long"))]
    pub description: String,
    #[schema(value_type = i32)]
    pub status: TodoStatus,
    pub order: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReorderTodosRequest {
    pub todo_ids: Vec<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReorderSubtasksRequest {
    pub subtask_ids: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubtaskDto {
    pub id: i64,
    pub title: String,
    pub description: String,
    #[schema(value_type = i32)]
    pub status: TodoStatus,
    pub order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub todo_id: i64,
}

impl From<&Subtask> for SubtaskDto {
    fn from(subtask: &Subtask) -> Self {
        Self {
            id: subtask.id,
            title: subtask.title.clone(),
            description: subtask.description.clone(),
            status: subtask.status,
            order: subtask.order,
            created_at: subtask.created_at,
            updated_at: subtask.updated_at,
            todo_id: subtask.todo_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TodoDto {
    pub id: i64,
    pub title: String,
    pub description: String,
    #[schema(value_type = i32)]
    pub status: TodoStatus,
    #[schema(value_type = i32)]
    pub priority: Priority,
    pub due_date: Option<DateTime<Utc>>,
    pub order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user_id: i64,
    pub subtasks: Vec<SubtaskDto>,
}

impl TodoDto {
    /// Builds the view of a todo with its (already ordered) active subtasks.
    pub fn with_subtasks(todo: &Todo, subtasks: &[Subtask]) -> Self {
        Self {
            id: todo.id,
            title: todo.title.clone(),
            description: todo.description.clone(),
            status: todo.status,
            priority: todo.priority,
            due_date: todo.due_date,
            order: todo.order,
            created_at: todo.created_at,
            updated_at: todo.updated_at,
            user_id: todo.user_id,
            subtasks: subtasks.iter().map(SubtaskDto::from).collect(),
        }
    }
}

// JWT claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user id
    pub username: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_round_trip_through_json() {
        let json = serde_json::to_string(&TodoStatus::InProgress).unwrap();
        assert_eq!(json, "1");
        let back: TodoStatus = serde_json::from_str("3").unwrap();
        assert_eq!(back, TodoStatus::Cancelled);
    }

    #[test]
    fn unknown_codes_are_rejected() {
        assert!(serde_json::from_str::<TodoStatus>("7").is_err());
        assert!(serde_json::from_str::<Priority>("-1").is_err());
    }

    #[test]
    fn display_names_come_from_the_table() {
        assert_eq!(TodoStatus::InProgress.to_string(), "In Progress");
        assert_eq!(Priority::Critical.to_string(), "Critical");
        assert_eq!(Priority::default(), Priority::Medium);
        assert_eq!(TodoStatus::default(), TodoStatus::Pending);
    }

    #[test]
    fn register_request_rules() {
        let valid = RegisterRequest {
            username: "user1".to_string(),
            email: "user1@example.com".to_string(),
            password: "Password1".to_string(),
            first_name: "First".to_string(),
            last_name: "Last".to_string(),
        };
        assert!(valid.validate().is_ok());

        let short = RegisterRequest {
            username: "u".to_string(),
            ..valid_clone(&valid)
        };
        assert!(short.validate().unwrap_err().field_errors().contains_key("username"));

        let bad_email = RegisterRequest {
            email: "not-an-email".to_string(),
            ..valid_clone(&valid)
        };
        assert!(bad_email.validate().unwrap_err().field_errors().contains_key("email"));

        let weak = RegisterRequest {
            password: "password1".to_string(),
            ..valid_clone(&valid)
        };
        assert!(weak.validate().unwrap_err().field_errors().contains_key("password"));

        let blank_name = RegisterRequest {
            first_name: "   ".to_string(),
            ..valid_clone(&valid)
        };
        assert!(blank_name
            .validate()
            .unwrap_err()
            .field_errors()
            .contains_key("first_name"));
    }

    fn valid_clone(req: &RegisterRequest) -> RegisterRequest {
        RegisterRequest {
            username: req.username.clone(),
            email: req.email.clone(),
            password: req.password.clone(),
            first_name: req.first_name.clone(),
            last_name: req.last_name.clone(),
        }
    }

    #[test]
    fn titles_must_not_be_blank_or_too_long() {
        let blank = CreateSubtaskRequest {
            title: "  ".to_string(),
            description: String::new(),
            order: 0,
        };
        assert!(blank.validate().is_err());

        let long = CreateTodoRequest {
            title: "x".repeat(201),
            description: String::new(),
            priority: Priority::Low,
            due_date: None,
            order: 0,
        };
        assert!(long.validate().is_err());

        let ok = UpdateSubtaskRequest {
            title: "fine".to_string(),
            description: "d".repeat(500),
            status: TodoStatus::Completed,
            order: 1,
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn create_todo_request_defaults() {
        let req: CreateTodoRequest = serde_json::from_str(r#"{"title":"T1"}"#).unwrap();
        assert_eq!(req.priority, Priority::Medium);
        assert_eq!(req.order, 0);
        assert!(req.description.is_empty());
        assert!(req.due_date.is_none());
    }
}
