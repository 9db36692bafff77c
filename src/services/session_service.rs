use chrono::{DateTime, Duration, FixedOffset, Utc};
use rand::RngCore;
use uuid::Uuid;

use crate::{
    auth::Identity,
    db::dao::TokenDao,
    error::AppError,
};

const TOKEN_BYTES: usize = 32;

/// Opaque bearer tokens backed by the `user_tokens` table. There is no
/// revocation; tokens simply stop resolving once expired.
#[derive(Clone)]
pub struct SessionService {
    tokens: TokenDao,
    ttl: Duration,
}

impl SessionService {
    pub fn new(tokens: TokenDao, ttl: Duration) -> Self {
        Self { tokens, ttl }
    }

    pub async fn issue(&self, user_id: Uuid) -> Result<(String, DateTime<FixedOffset>), AppError> {
        let token = generate_token();
        let expires_at = Utc::now().fixed_offset() + self.ttl;
        self.tokens.create_token(user_id, &token, expires_at).await?;
        tracing::debug!(%user_id, %expires_at, "session token issued");
        Ok((token, expires_at))
    }

    /// `None` for unknown, expired and orphaned tokens alike.
    pub async fn resolve(&self, token: &str) -> Result<Option<Identity>, AppError> {
        let owner = self
            .tokens
            .find_live_owner(token, Utc::now().fixed_offset())
            .await?;
        Ok(owner.and_then(|user| {
            let user_id = user.id;
            Identity::try_from(user)
                .inspect_err(|_| tracing::warn!(%user_id, "token owner has an unknown role"))
                .ok()
        }))
    }

    pub async fn purge_expired(&self) -> Result<u64, AppError> {
        let purged = self.tokens.purge_expired(Utc::now().fixed_offset()).await?;
        tracing::info!(purged, "expired session tokens removed");
        Ok(purged)
    }
}

fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use sea_orm::{ActiveModelTrait, EntityTrait, Set};

    use super::generate_token;
    use crate::auth::Role;
    use crate::db::entities::{prelude::UserToken, user_token};
    use crate::test_helpers::{memory_db, seed_user, services};

    #[test]
    fn tokens_are_64_hex_chars_and_unique() {
        let first = generate_token();
        let second = generate_token();
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn issued_tokens_resolve_to_their_owner() {
        let db = memory_db().await;
        let nurse = seed_user(&db, "nora", "password123", Role::Nurse).await;
        let sessions = services(&db).sessions();

        let (token, expires_at) = sessions.issue(nurse.id).await.expect("issue should succeed");
        assert!(expires_at > Utc::now().fixed_offset() + Duration::hours(23));

        let identity = sessions
            .resolve(&token)
            .await
            .expect("resolve should succeed")
            .expect("token should resolve");
        assert_eq!(identity.id, nurse.id);
        assert_eq!(identity.role, Role::Nurse);

        assert!(
            sessions
                .resolve("not-a-token")
                .await
                .expect("resolve should succeed")
                .is_none()
        );
    }

    #[tokio::test]
    async fn expired_tokens_do_not_resolve_and_are_purged() {
        let db = memory_db().await;
        let doctor = seed_user(&db, "dana", "password123", Role::Doctor).await;
        let sessions = services(&db).sessions();

        let (token, _) = sessions.issue(doctor.id).await.expect("issue should succeed");
        let row = UserToken::find()
            .one(&db)
            .await
            .expect("query should succeed")
            .expect("token row should exist");
        let mut active: user_token::ActiveModel = row.into();
        active.expires_at = Set(Utc::now().fixed_offset() - Duration::minutes(1));
        active.update(&db).await.expect("expire token");

        assert!(
            sessions
                .resolve(&token)
                .await
                .expect("resolve should succeed")
                .is_none()
        );
        assert_eq!(sessions.purge_expired().await.expect("purge should succeed"), 1);
    }
}
