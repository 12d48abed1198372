use std::borrow::Cow;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand_core::OsRng;
use validator::ValidationError;

use crate::{
    error::AppError,
    models::{Claims, User},
};

/// Validity window of an issued bearer token.
pub const TOKEN_TTL_HOURS: i64 = 24;

pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_MAX_LEN: usize = 100;

/// Hashes a password with Argon2id and a fresh salt (PHC string format).
pub fn hash_password(plaintext: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::InternalError(format!("password hashing failed: {e}")))
}

/// True iff `plaintext` hashes to `hash`. A malformed stored hash never verifies.
pub fn verify_password(plaintext: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok()
}

/// First password policy rule the candidate breaks, if any.
pub fn password_policy_violation(password: &str) -> Option<&'static str> {
    if password.is_empty() {
        return Some("Password is required");
    }
    let len = password.chars().count();
    if len < PASSWORD_MIN_LEN {
        return Some("Password must be at least 8 characters long");
    }
    if len > PASSWORD_MAX_LEN {
        return Some("Password must be at most 100 characters long");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Some("Password must contain at least one uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Some("Password must contain at least one number");
    }
    None
}

/// Field validator for registration payloads.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    match password_policy_violation(password) {
        Some(violation) => {
            let mut err = ValidationError::new("password_policy");
            err.message = Some(Cow::from(violation));
            Err(err)
        }
        None => Ok(()),
    }
}

#[cfg(test)]
pub fn is_password_valid(password: &str) -> bool {
    validate_password(password).is_ok()
}

/// A signed token together with the instant it stops being accepted.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and validates HS256 bearer tokens with a shared secret.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn issue_token(&self, user: &User) -> Result<IssuedToken, AppError> {
        self.issue_token_at(user, Utc::now())
    }

    fn issue_token_at(&self, user: &User, issued_at: DateTime<Utc>) -> Result<IssuedToken, AppError> {
        let expires_at = issued_at + Duration::hours(TOKEN_TTL_HOURS);
        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            email: user.email.clone(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::InternalError(format!("Token creation failed: {e}")))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Validates signature and expiry and returns the user id carried in `sub`.
    pub fn resolve_current_user(&self, token: &str) -> Result<i64, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|e| AppError::AuthError(format!("Invalid token: {e}")))?;

        data.claims
            .sub
            .parse::<i64>()
            .map_err(|_| AppError::AuthError("Invalid token: malformed subject".to_string()))
    }
}
