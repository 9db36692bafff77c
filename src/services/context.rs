use chrono::Duration;
use sea_orm::DatabaseConnection;

use crate::{
    config::AuthConfig,
    db::dao::DaoContext,
    services::{
        assignment_service::AssignmentService, auth_service::AuthService,
        patient_service::PatientService, report_service::ReportService,
        room_service::RoomService, session_service::SessionService,
        staff_service::StaffService, stats_service::StatsService,
    },
    state::AppState,
};

#[derive(Clone)]
pub struct ServiceContext {
    db: DatabaseConnection,
    daos: DaoContext,
    session_ttl: Duration,
}

impl ServiceContext {
    pub fn new(db: &DatabaseConnection, auth: &AuthConfig) -> Self {
        Self {
            db: db.clone(),
            daos: DaoContext::new(db),
            session_ttl: Duration::hours(auth.session_ttl_hours),
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(&state.db, &state.config.auth)
    }

    pub fn sessions(&self) -> SessionService {
        SessionService::new(self.daos.token(), self.session_ttl)
    }

    pub fn auth(&self) -> AuthService {
        AuthService::new(self.daos.user(), self.sessions())
    }

    pub fn assignments(&self) -> AssignmentService {
        AssignmentService::new(self.daos.assignment(), self.daos.room())
    }

    pub fn rooms(&self) -> RoomService {
        RoomService::new(
            self.db.clone(),
            self.daos.room(),
            self.daos.assignment(),
            self.assignments(),
        )
    }

    pub fn patients(&self) -> PatientService {
        PatientService::new(
            self.db.clone(),
            self.daos.patient(),
            self.daos.assignment(),
            self.assignments(),
        )
    }

    pub fn staff(&self) -> StaffService {
        StaffService::new(self.db.clone(), self.daos.user(), self.daos.staff())
    }

    pub fn stats(&self) -> StatsService {
        StatsService::new(
            self.daos.room(),
            self.daos.patient(),
            self.daos.user(),
            self.daos.assignment(),
        )
    }

    pub fn reports(&self) -> ReportService {
        ReportService::new(self.daos.patient(), self.daos.assignment())
    }
}
