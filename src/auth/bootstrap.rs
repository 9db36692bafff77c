use sea_orm::DatabaseConnection;

use super::{Role, password};
use crate::{
    config::AuthConfig,
    db::dao::{DaoBase, DaoContext},
};

/// Creates the configured administrator unless that username already
/// exists. Does nothing when no admin credentials are configured.
pub async fn seed_admin(cfg: &AuthConfig, db: &DatabaseConnection) -> anyhow::Result<()> {
    let (Some(username), Some(admin_password)) =
        (cfg.admin_username.as_deref(), cfg.admin_password.as_deref())
    else {
        tracing::debug!("no admin credentials configured, skipping admin seed");
        return Ok(());
    };

    let users = DaoContext::new(db).user();
    if let Some(existing) = users.find_by_username(username).await? {
        tracing::info!(username = %existing.username, "admin user already present");
        return Ok(());
    }

    let hash = password::hash_password(admin_password)
        .map_err(|err| anyhow::anyhow!("admin seed hash error: {}", err.message()))?;
    let user = users
        .create_user_in(
            users.db(),
            username,
            &hash,
            Role::Admin.as_str(),
            &cfg.admin_full_name,
            &cfg.admin_email,
        )
        .await?;
    tracing::info!(user_id = %user.id, username = %user.username, "seeded admin user");
    Ok(())
}

#[cfg(test)]
mod tests {
    use sea_orm::{EntityTrait, PaginatorTrait};

    use super::seed_admin;
    use crate::config::AuthConfig;
    use crate::db::entities::prelude::User;
    use crate::test_helpers::{memory_db, services};

    fn admin_config() -> AuthConfig {
        AuthConfig {
            admin_username: Some("root".to_string()),
            admin_password: Some("changeme-now".to_string()),
            ..AuthConfig::default()
        }
    }

    #[tokio::test]
    async fn seeds_once_and_the_admin_can_log_in() {
        let db = memory_db().await;
        let cfg = admin_config();

        seed_admin(&cfg, &db).await.expect("first seed");
        seed_admin(&cfg, &db).await.expect("second seed");
        assert_eq!(User::find().count(&db).await.expect("count"), 1);

        let login = services(&db)
            .auth()
            .login("root", "changeme-now")
            .await
            .expect("seeded admin should log in");
        assert_eq!(login.user.role.as_str(), "admin");
        assert_eq!(login.user.email, "admin@hospital.local");
    }

    #[tokio::test]
    async fn skips_without_credentials() {
        let db = memory_db().await;
        seed_admin(&AuthConfig::default(), &db)
            .await
            .expect("seed should be a no-op");
        assert_eq!(User::find().count(&db).await.expect("count"), 0);
    }
}
