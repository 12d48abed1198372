use axum::{
    async_trait,
    extract::{FromRef, FromRequest, FromRequestParts},
    http::{header, request::Parts},
};

use crate::{auth::TokenService, error::AppError};

/// JSON body extractor whose rejections use the API error shape.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Id of the authenticated caller, taken only from a verified bearer token.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    TokenService: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // 1. Bearer token from the Authorization header
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(AppError::AuthError("Missing Authorization header".to_string()))?
            .to_str()
            .map_err(|_| AppError::AuthError("Invalid Authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AppError::AuthError("Invalid token format".to_string()))?;

        // 2. Signature and expiry; the user id comes from the claims
        let tokens = TokenService::from_ref(state);
        let user_id = tokens.resolve_current_user(token)?;

        Ok(CurrentUser(user_id))
    }
}
