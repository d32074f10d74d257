//! Authentication service: password verification and token issuing.
//!
//! Deliberately minimal. The permission model only needs an identity and a
//! staff flag, so there is no session storage, 2FA or password recovery here.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{CreateUser, UserClaims, UserInfo},
    repository::Repository,
};

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Verify credentials and issue a JWT
    pub async fn login(&self, username: &str, password: &str) -> AppResult<(String, UserInfo)> {
        let user = self
            .repository
            .users
            .get_by_username(username)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid username or password".to_string()))?;

        verify_password(password, &user.password_hash)?;

        let now = Utc::now();
        let claims = UserClaims {
            sub: user.username.clone(),
            user_id: user.id,
            is_staff: user.is_staff,
            iat: now.timestamp(),
            exp: (now + Duration::hours(self.config.jwt_expiration_hours as i64)).timestamp(),
        };

        let token = claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))?;

        Ok((token, user.into()))
    }

    /// Get the user behind a set of claims
    pub async fn current_user(&self, claims: &UserClaims) -> AppResult<UserInfo> {
        let user = self.repository.users.get_by_id(claims.user_id).await?;
        Ok(user.into())
    }

    /// Create a user account (staff operation)
    pub async fn create_user(&self, request: CreateUser) -> AppResult<UserInfo> {
        if self.repository.users.username_exists(&request.username).await? {
            return Err(AppError::Conflict(format!(
                "Username \"{}\" is already taken",
                request.username
            )));
        }

        let password_hash = hash_password(&request.password)?;
        let user = self
            .repository
            .users
            .create(
                &request.username,
                &password_hash,
                &request.first_name,
                &request.last_name,
                request.email.as_deref().unwrap_or(""),
                request.is_staff,
            )
            .await?;
        Ok(user.into())
    }

    /// Create a default staff account when the user table is empty, so a
    /// fresh deployment can be logged into at all.
    pub async fn ensure_default_admin(&self) -> AppResult<()> {
        if self.repository.users.count().await? > 0 {
            return Ok(());
        }
        let password_hash = hash_password("admin")?;
        let user = self
            .repository
            .users
            .create("admin", &password_hash, "", "", "", true)
            .await?;
        tracing::warn!(
            "Created default staff account \"{}\" with password \"admin\" - change it",
            user.username
        );
        Ok(())
    }
}

/// Hash a password with argon2 and a fresh salt
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

/// Verify a password against its stored hash
pub fn verify_password(password: &str, password_hash: &str) -> AppResult<()> {
    let parsed = PasswordHash::new(password_hash)
        .map_err(|e| AppError::Internal(format!("Corrupt password hash: {}", e)))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AppError::Authentication("Invalid username or password".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("s3cret").unwrap();
        assert!(verify_password("s3cret", &hash).is_ok());
        assert!(verify_password("wrong", &hash).is_err());
    }
}
