use std::time::Duration;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use tracing::info;

use crate::config::DatabaseConfig;

/// At most one open assignment per patient.
const OPEN_ASSIGNMENT_INDEX: &str = "CREATE UNIQUE INDEX IF NOT EXISTS \
     idx_room_assignments_open_patient ON room_assignments (patient_id) \
     WHERE discharge_date IS NULL";

pub async fn connect(cfg: &DatabaseConfig) -> anyhow::Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(cfg.url.clone());
    options
        .max_connections(cfg.max_connections)
        .min_connections(cfg.min_idle)
        .connect_timeout(Duration::from_secs(5))
        .sqlx_logging(false);

    let db = Database::connect(options).await?;
    sync_schema(&db).await?;
    Ok(db)
}

/// Creates missing tables from the entity registry, then the indexes the
/// entity attributes cannot express.
pub async fn sync_schema(db: &DatabaseConnection) -> anyhow::Result<()> {
    info!("syncing database schema from entities");
    db.get_schema_registry("hospital_office::db::entities::*")
        .sync(db)
        .await?;
    db.execute_unprepared(OPEN_ASSIGNMENT_INDEX).await?;
    Ok(())
}
