use chrono::{NaiveDate, Utc};
use rand::Rng;
use sea_orm::{ConnectionTrait, DatabaseConnection, Set};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    db::{
        dao::{AssignmentDao, DaoBase, PatientDao, PatientFilter},
        entities::patient,
    },
    error::AppError,
    services::{assignment_service::AssignmentService, begin, finish, retry_on_conflict},
};

const CODE_PREFIX: &str = "P-";
const CODE_LEN: usize = 6;
const CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
            Severity::Critical => "Critical",
        }
    }
}

impl TryFrom<&str> for Severity {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "Low" => Ok(Severity::Low),
            "Medium" => Ok(Severity::Medium),
            "High" => Ok(Severity::High),
            "Critical" => Ok(Severity::Critical),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewPatient {
    pub first_name: String,
    pub last_name: String,
    pub dob: NaiveDate,
    pub gender: String,
    pub blood_type: String,
    pub severity: Severity,
    pub is_isolated: bool,
    pub is_contagious: bool,
    pub notes: Option<String>,
    pub room_id: Option<Uuid>,
}

/// Requested change to a patient's current room.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RoomChange {
    /// `room_id` absent from the request.
    #[default]
    Keep,
    /// `room_id` present but null or empty.
    Clear,
    Assign(Uuid),
}

#[derive(Debug, Clone, Default)]
pub struct PatientChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub dob: Option<NaiveDate>,
    pub gender: Option<String>,
    pub blood_type: Option<String>,
    pub severity: Option<Severity>,
    pub is_isolated: Option<bool>,
    pub is_contagious: Option<bool>,
    pub notes: Option<String>,
    pub room: RoomChange,
}

impl PatientChanges {
    fn touches_patient_row(&self) -> bool {
        self.first_name.is_some()
            || self.last_name.is_some()
            || self.dob.is_some()
            || self.gender.is_some()
            || self.blood_type.is_some()
            || self.severity.is_some()
            || self.is_isolated.is_some()
            || self.is_contagious.is_some()
            || self.notes.is_some()
    }

    pub fn is_empty(&self) -> bool {
        !self.touches_patient_row() && self.room == RoomChange::Keep
    }
}

#[derive(Debug, Serialize)]
pub struct PatientView {
    #[serde(flatten)]
    pub patient: patient::Model,
    pub full_name: String,
    /// Whole years since `dob`, computed at query time.
    pub age: Option<u32>,
    pub room_id: Option<Uuid>,
    pub room_number: Option<String>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct CreatedPatient {
    pub id: Uuid,
    pub patient_id: String,
}

#[derive(Clone)]
pub struct PatientService {
    db: DatabaseConnection,
    patients: PatientDao,
    assignments: AssignmentDao,
    lifecycle: AssignmentService,
}

impl PatientService {
    pub fn new(
        db: DatabaseConnection,
        patients: PatientDao,
        assignments: AssignmentDao,
        lifecycle: AssignmentService,
    ) -> Self {
        Self {
            db,
            patients,
            assignments,
            lifecycle,
        }
    }

    pub async fn list(&self, filter: &PatientFilter) -> Result<Vec<PatientView>, AppError> {
        let (patients, rooms) = tokio::try_join!(
            self.patients.list_filtered(filter),
            self.assignments.open_rooms_by_patient()
        )?;
        let today = Utc::now().date_naive();

        Ok(patients
            .into_iter()
            .map(|patient| {
                let room = rooms.get(&patient.id);
                PatientView {
                    full_name: format!("{} {}", patient.first_name, patient.last_name),
                    age: today.years_since(patient.dob),
                    room_id: room.map(|room| room.id),
                    room_number: room.map(|room| room.room_number.clone()),
                    patient,
                }
            })
            .collect())
    }

    /// Inserts the patient and, when a room is given, opens its assignment
    /// in the same transaction.
    pub async fn create(
        &self,
        input: NewPatient,
        actor: Option<Uuid>,
    ) -> Result<CreatedPatient, AppError> {
        // Conflicts come from a patient code collision or a concurrent
        // assignment racing on the open-assignment index.
        let input = &input;
        let created = retry_on_conflict("patient insert", move || async move {
            let txn = begin(&self.db).await?;
            let result = self.create_in(&txn, input, actor).await;
            finish(txn, result).await
        })
        .await
        .map_err(|err| err.context("add patient"))?;

        tracing::info!(
            id = %created.id,
            patient_id = %created.patient_id,
            room_id = ?input.room_id,
            "patient admitted"
        );
        Ok(created)
    }

    async fn create_in<C>(
        &self,
        conn: &C,
        input: &NewPatient,
        actor: Option<Uuid>,
    ) -> Result<CreatedPatient, AppError>
    where
        C: ConnectionTrait + Sync,
    {
        let model = patient::ActiveModel {
            patient_id: Set(generate_patient_code()),
            first_name: Set(input.first_name.clone()),
            last_name: Set(input.last_name.clone()),
            dob: Set(input.dob),
            gender: Set(input.gender.clone()),
            blood_type: Set(input.blood_type.clone()),
            severity: Set(input.severity.as_str().to_string()),
            is_isolated: Set(input.is_isolated),
            is_contagious: Set(input.is_contagious),
            notes: Set(input.notes.clone()),
            created_by: Set(actor),
            ..Default::default()
        };
        let patient = self.patients.create_in(conn, model).await?;

        if let Some(room_id) = input.room_id {
            self.lifecycle.assign(conn, patient.id, room_id, actor).await?;
        }

        Ok(CreatedPatient {
            id: patient.id,
            patient_id: patient.patient_id,
        })
    }

    /// Sparse update. The current room only changes when the request names
    /// one (or explicitly clears it).
    pub async fn update(
        &self,
        id: Uuid,
        changes: PatientChanges,
        actor: Option<Uuid>,
    ) -> Result<(), AppError> {
        if changes.is_empty() {
            return Err(AppError::bad_request("No fields to update"));
        }

        let changes = &changes;
        retry_on_conflict("patient update", move || async move {
            let txn = begin(&self.db).await?;
            let result = self.update_in(&txn, id, changes, actor).await;
            finish(txn, result).await
        })
        .await
        .map_err(|err| err.context("update patient"))?;

        tracing::info!(%id, room = ?changes.room, "patient updated");
        Ok(())
    }

    async fn update_in<C>(
        &self,
        conn: &C,
        id: Uuid,
        changes: &PatientChanges,
        actor: Option<Uuid>,
    ) -> Result<(), AppError>
    where
        C: ConnectionTrait + Sync,
    {
        if changes.touches_patient_row() {
            let changes = changes.clone();
            self.patients
                .update_in(conn, id, move |active| {
                    if let Some(first_name) = changes.first_name {
                        active.first_name = Set(first_name);
                    }
                    if let Some(last_name) = changes.last_name {
                        active.last_name = Set(last_name);
                    }
                    if let Some(dob) = changes.dob {
                        active.dob = Set(dob);
                    }
                    if let Some(gender) = changes.gender {
                        active.gender = Set(gender);
                    }
                    if let Some(blood_type) = changes.blood_type {
                        active.blood_type = Set(blood_type);
                    }
                    if let Some(severity) = changes.severity {
                        active.severity = Set(severity.as_str().to_string());
                    }
                    if let Some(is_isolated) = changes.is_isolated {
                        active.is_isolated = Set(is_isolated);
                    }
                    if let Some(is_contagious) = changes.is_contagious {
                        active.is_contagious = Set(is_contagious);
                    }
                    if let Some(notes) = changes.notes {
                        active.notes = Set(Some(notes).filter(|notes| !notes.is_empty()));
                    }
                })
                .await?;
        } else {
            self.patients.find_by_id_in(conn, id).await?;
        }

        match changes.room {
            RoomChange::Keep => {}
            RoomChange::Clear => {
                self.lifecycle.clear(conn, id).await?;
            }
            RoomChange::Assign(room_id) => {
                self.lifecycle.assign(conn, id, room_id, actor).await?;
            }
        }
        Ok(())
    }

    /// Closes the open assignment, then removes the patient row.
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let txn = begin(&self.db).await?;
        let result = self.delete_in(&txn, id).await;
        finish(txn, result)
            .await
            .map_err(|err| err.context("delete patient"))?;

        tracing::info!(%id, "patient deleted");
        Ok(())
    }

    async fn delete_in<C>(&self, conn: &C, id: Uuid) -> Result<(), AppError>
    where
        C: ConnectionTrait + Sync,
    {
        self.patients.find_by_id_in(conn, id).await?;
        self.lifecycle.discharge(conn, id).await?;
        self.patients.delete_in(conn, id).await?;
        Ok(())
    }
}

fn generate_patient_code() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..CODE_LEN)
        .map(|_| CODE_CHARSET[rng.gen_range(0..CODE_CHARSET.len())] as char)
        .collect();
    format!("{CODE_PREFIX}{suffix}")
}
