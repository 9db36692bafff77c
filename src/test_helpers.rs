//! Fixtures shared by unit and integration tests. Every database is a
//! fresh in-memory SQLite store with the full schema.

use std::sync::Arc;

use axum::Router;
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;

use crate::{
    auth::{Role, password::hash_password},
    config::{AppConfig, AuthConfig, DatabaseConfig},
    db::{
        connection,
        dao::{DaoBase, DaoContext},
        entities::{patient, room, user},
    },
    routes::app,
    services::{
        ServiceContext,
        assignment_service::RoomStatus,
        patient_service::{NewPatient, Severity},
    },
    state::AppState,
};

/// A single pooled connection, so every query sees the same in-memory
/// database.
pub async fn memory_db() -> DatabaseConnection {
    let mut cfg = DatabaseConfig::new("sqlite::memory:");
    cfg.max_connections = 1;
    cfg.min_idle = 1;
    connection::connect(&cfg)
        .await
        .expect("in-memory database should connect")
}

pub fn services(db: &DatabaseConnection) -> ServiceContext {
    ServiceContext::new(db, &AuthConfig::default())
}

pub async fn seed_user(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
    role: Role,
) -> user::Model {
    let hash = hash_password(password).expect("password should hash");
    let users = DaoContext::new(db).user();
    users
        .create_user_in(
            users.db(),
            username,
            &hash,
            role.as_str(),
            &format!("{username} test"),
            &format!("{username}@hospital.local"),
        )
        .await
        .expect("user should insert")
}

/// Seeds an unassigned patient with `Medium` severity.
pub async fn seed_patient(
    db: &DatabaseConnection,
    first_name: &str,
    last_name: &str,
) -> patient::Model {
    let created = services(db)
        .patients()
        .create(
            NewPatient {
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                dob: NaiveDate::from_ymd_opt(1985, 6, 15).expect("valid date"),
                gender: "Other".to_string(),
                blood_type: "O+".to_string(),
                severity: Severity::Medium,
                is_isolated: false,
                is_contagious: false,
                notes: None,
                room_id: None,
            },
            None,
        )
        .await
        .expect("patient should insert");
    DaoContext::new(db)
        .patient()
        .find_by_id(created.id)
        .await
        .expect("patient should load")
}

/// Seeds an available room of type `General`.
pub async fn seed_room(db: &DatabaseConnection, room_number: &str, capacity: i32) -> room::Model {
    DaoContext::new(db)
        .room()
        .create_room(room_number, "General", capacity, RoomStatus::Available.as_str())
        .await
        .expect("room should insert")
}

/// Issues a session token for `user_id` directly, bypassing login.
pub async fn token_for(db: &DatabaseConnection, user_id: uuid::Uuid) -> String {
    let (token, _) = services(db)
        .sessions()
        .issue(user_id)
        .await
        .expect("token should issue");
    token
}

pub fn test_state(db: &DatabaseConnection) -> Arc<AppState> {
    AppState::new(AppConfig::default(), db.clone())
}

pub fn test_router(db: &DatabaseConnection) -> Router {
    app(test_state(db))
}
