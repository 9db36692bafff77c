use chrono::{DateTime, FixedOffset};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use super::{DaoBase, DaoLayerError, DaoResult};
use crate::db::entities::{
    prelude::{User, UserToken},
    user, user_token,
};

#[derive(Clone)]
pub struct TokenDao {
    db: DatabaseConnection,
}

impl DaoBase for TokenDao {
    type Entity = UserToken;
    const LABEL: &'static str = "Session token";

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl TokenDao {
    pub async fn create_token(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<FixedOffset>,
    ) -> DaoResult<user_token::Model> {
        let model = user_token::ActiveModel {
            token: Set(token.to_string()),
            user_id: Set(user_id),
            expires_at: Set(expires_at),
            ..Default::default()
        };
        self.create(model).await
    }

    /// The owner of `token` if the token is still live at `now`.
    pub async fn find_live_owner(
        &self,
        token: &str,
        now: DateTime<FixedOffset>,
    ) -> DaoResult<Option<user::Model>> {
        let found = UserToken::find()
            .filter(user_token::Column::Token.eq(token))
            .filter(user_token::Column::ExpiresAt.gt(now))
            .find_also_related(User)
            .one(&self.db)
            .await
            .map_err(DaoLayerError::from)?;
        Ok(found.and_then(|(_, owner)| owner))
    }

    pub async fn purge_expired(&self, now: DateTime<FixedOffset>) -> DaoResult<u64> {
        let result = UserToken::delete_many()
            .filter(user_token::Column::ExpiresAt.lte(now))
            .exec(&self.db)
            .await
            .map_err(DaoLayerError::from)?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, TimeZone};
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase, MockExecResult};

    use super::TokenDao;
    use crate::db::dao::{DaoBase, DaoLayerError};

    fn ts() -> chrono::DateTime<chrono::FixedOffset> {
        FixedOffset::east_opt(0)
            .expect("offset should be valid")
            .with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
            .single()
            .expect("timestamp should be valid")
    }

    #[tokio::test]
    async fn purge_reports_rows_removed() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 3,
            }])
            .into_connection();
        let dao = TokenDao::new(&db);

        let purged = dao.purge_expired(ts()).await.expect("purge should succeed");
        assert_eq!(purged, 3);
    }

    #[tokio::test]
    async fn purge_maps_database_errors() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_errors([DbErr::Custom("delete failed".to_string())])
            .into_connection();
        let dao = TokenDao::new(&db);

        let err = dao.purge_expired(ts()).await.expect_err("purge should fail");
        assert!(matches!(err, DaoLayerError::Db(_)));
    }
}
