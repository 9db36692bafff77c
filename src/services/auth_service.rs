use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::{
    auth::{Identity, password::verify_password},
    db::dao::UserDao,
    error::AppError,
    services::session_service::SessionService,
};

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<FixedOffset>,
    pub user: Identity,
}

#[derive(Clone)]
pub struct AuthService {
    users: UserDao,
    sessions: SessionService,
}

impl AuthService {
    pub fn new(users: UserDao, sessions: SessionService) -> Self {
        Self { users, sessions }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, AppError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AppError::validation("Username and password are required"));
        }

        let invalid = || AppError::unauthorized("Invalid username or password");

        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(invalid)?;

        if !verify_password(password, &user.password_hash)? {
            tracing::debug!(username, "login rejected");
            return Err(invalid());
        }

        let identity = Identity::try_from(user).map_err(|_| invalid())?;
        let (token, expires_at) = self.sessions.issue(identity.id).await?;
        tracing::info!(user_id = %identity.id, role = identity.role.as_str(), "user logged in");

        Ok(LoginResponse {
            token,
            expires_at,
            user: identity,
        })
    }
}
