use chrono::Utc;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    auth::{self, TokenService},
    error::AppError,
    models::{AuthResponse, LoginRequest, RegisterRequest, User, UserDto},
    repository::{NewUser, UserRepository},
};

/// Registration and login.
pub struct AccountService {
    users: UserRepository,
    tokens: TokenService,
}

impl AccountService {
    pub fn new(pool: SqlitePool, tokens: TokenService) -> Self {
        Self {
            users: UserRepository::new(pool),
            tokens,
        }
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<AuthResponse, AppError> {
        if let Err(errors) = req.validate() {
            let err = AppError::from(errors);
            tracing::warn!(username = %req.username, error = %err, "registration rejected");
            return Err(err);
        }

        if self.users.username_exists(&req.username).await? {
            tracing::warn!(username = %req.username, "username already taken");
            return Err(AppError::ValidationError("Username already exists".to_string()));
        }

        if self.users.email_exists(&req.email).await? {
            tracing::warn!(username = %req.username, "email already registered");
            return Err(AppError::ValidationError("Email already exists".to_string()));
        }

        let password_hash = auth::hash_password(&req.password)?;

        // A concurrent registration can still win between the checks and the insert.
        let user = self
            .users
            .add(NewUser {
                username: req.username,
                email: req.email,
                password_hash,
                first_name: req.first_name,
                last_name: req.last_name,
                created_at: Utc::now(),
            })
            .await
            .map_err(|e| AppError::on_unique_violation(e, "Username or email already exists"))?;

        tracing::info!(user_id = user.id, username = %user.username, "user registered");
        self.auth_response(&user)
    }

    pub async fn login(&self, req: LoginRequest) -> Result<AuthResponse, AppError> {
        let user = self
            .users
            .get_by_username(&req.username)
            .await?
            .filter(|user| auth::verify_password(&req.password, &user.password_hash));

        let Some(mut user) = user else {
            tracing::warn!(username = %req.username, "login failed");
            return Err(AppError::AuthError("Invalid credentials".to_string()));
        };

        if !user.is_active {
            tracing::warn!(user_id = user.id, "login to disabled account");
            return Err(AppError::AuthError("Account is disabled".to_string()));
        }

        let now = Utc::now();
        self.users.record_login(user.id, now).await?;
        user.last_login_at = Some(now);

        tracing::info!(user_id = user.id, "user logged in");
        self.auth_response(&user)
    }

    fn auth_response(&self, user: &User) -> Result<AuthResponse, AppError> {
        let issued = self.tokens.issue_token(user)?;
        Ok(AuthResponse {
            token: issued.token,
            user: UserDto::from(user),
            expires_at: issued.expires_at,
        })
    }
}
