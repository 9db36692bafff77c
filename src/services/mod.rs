pub mod assignment_service;
pub mod auth_service;
pub mod context;
pub mod patient_service;
pub mod report_service;
pub mod room_service;
pub mod session_service;
pub mod staff_service;
pub mod stats_service;

pub use context::ServiceContext;

use std::future::Future;

use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;

/// Attempts per write before a unique-constraint conflict is returned.
pub(crate) const MAX_WRITE_ATTEMPTS: u32 = 3;

/// Result of a create operation.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Created {
    pub id: Uuid,
}

/// Commits on success, rolls back otherwise. The original error wins over
/// a failed rollback.
pub(crate) async fn finish<T>(
    txn: DatabaseTransaction,
    result: Result<T, AppError>,
) -> Result<T, AppError> {
    match result {
        Ok(value) => {
            txn.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = txn.rollback().await {
                tracing::error!(error = %rollback_err, "transaction rollback failed");
            }
            Err(err)
        }
    }
}

pub(crate) async fn begin(db: &DatabaseConnection) -> Result<DatabaseTransaction, AppError> {
    db.begin().await.map_err(AppError::from)
}

/// Reruns `write` while it fails with `Conflict`, up to
/// `MAX_WRITE_ATTEMPTS` runs in total. Each run must be its own transaction.
pub(crate) async fn retry_on_conflict<T, F, Fut>(label: &str, mut write: F) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let mut attempt = 1;
    loop {
        match write().await {
            Err(AppError::Conflict(message)) if attempt < MAX_WRITE_ATTEMPTS => {
                tracing::warn!(attempt, %message, "{label} conflicted, retrying");
                attempt += 1;
            }
            other => return other,
        }
    }
}
