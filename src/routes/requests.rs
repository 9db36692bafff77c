//! Request payloads accepted by the API, and their validation into the
//! typed inputs the services take.
//!
//! Every field is optional at the serde level so that a missing field can
//! be reported by name rather than as a generic decode error. Numbers and
//! booleans are accepted either as JSON values or as their string forms,
//! since HTML form clients post string-valued JSON fields.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    auth::Role,
    db::dao::{PatientFilter, RoomFilter, UserFilter},
    error::AppError,
    services::{
        assignment_service::RoomStatus,
        patient_service::{NewPatient, PatientChanges, RoomChange, Severity},
        room_service::{NewRoom, RoomChanges},
        staff_service::{NewStaff, StaffChanges},
    },
};

/// Decodes a JSON body into `T`, treating an absent body as `{}`.
pub fn parse_body<T: DeserializeOwned>(body: &Value) -> Result<T, AppError> {
    let body = match body {
        Value::Null => Value::Object(Default::default()),
        other => other.clone(),
    };
    serde_json::from_value(body).map_err(|err| AppError::validation(err.to_string()))
}

pub fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::bad_request("Invalid id"))
}

fn required(value: Option<String>, field: &str) -> Result<String, AppError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(AppError::missing_field(field)),
    }
}

/// Blank strings count as "not supplied" for optional text fields.
fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn parse_date(raw: &str, field: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("Invalid date for {field}, expected YYYY-MM-DD")))
}

fn parse_room_status(raw: &str) -> Result<RoomStatus, AppError> {
    RoomStatus::try_from(raw.trim()).map_err(|_| {
        AppError::validation("Invalid status, expected available, occupied or maintenance")
    })
}

fn parse_severity(raw: &str) -> Result<Severity, AppError> {
    Severity::try_from(raw.trim())
        .map_err(|_| AppError::validation("Invalid severity, expected Low, Medium, High or Critical"))
}

fn parse_role(raw: &str) -> Result<Role, AppError> {
    Role::try_from(raw.trim())
        .map_err(|_| AppError::validation("Invalid role, expected admin, doctor or nurse"))
}

fn parse_capacity(capacity: i64) -> Result<i32, AppError> {
    i32::try_from(capacity)
        .ok()
        .filter(|capacity| *capacity >= 1)
        .ok_or_else(|| AppError::validation("Capacity must be a positive integer"))
}

fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(number)) => number
            .as_i64()
            .map(Some)
            .ok_or_else(|| D::Error::custom("expected an integer")),
        Some(Value::String(text)) if text.trim().is_empty() => Ok(None),
        Some(Value::String(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("expected an integer, got {text:?}"))),
        Some(other) => Err(D::Error::custom(format!("expected an integer, got {other}"))),
    }
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(flag)) => Ok(Some(flag)),
        Some(Value::Number(number)) => Ok(Some(number.as_i64() != Some(0))),
        Some(Value::String(text)) => match text.trim().to_ascii_lowercase().as_str() {
            "" | "0" | "false" | "off" | "no" => Ok(Some(false)),
            "1" | "true" | "on" | "yes" => Ok(Some(true)),
            _ => Err(D::Error::custom(format!("expected a boolean, got {text:?}"))),
        },
        Some(other) => Err(D::Error::custom(format!("expected a boolean, got {other}"))),
    }
}

/// Distinguishes an absent key (`None`) from an explicit null or empty
/// string (`Some(None)`).
fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(Some(None)),
        Some(Value::String(text)) if text.trim().is_empty() => Ok(Some(None)),
        Some(Value::String(text)) => Ok(Some(Some(text))),
        Some(other) => Ok(Some(Some(other.to_string()))),
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RoomRequest {
    pub room_number: Option<String>,
    pub room_type: Option<String>,
    #[serde(deserialize_with = "lenient_int")]
    pub capacity: Option<i64>,
    pub status: Option<String>,
}

impl RoomRequest {
    pub fn into_new(self) -> Result<NewRoom, AppError> {
        let room_number = required(self.room_number, "room_number")?;
        let room_type = required(self.room_type, "room_type")?;
        let capacity = parse_capacity(self.capacity.ok_or_else(|| AppError::missing_field("capacity"))?)?;
        let status = match optional(self.status) {
            Some(status) => parse_room_status(&status)?,
            None => RoomStatus::Available,
        };
        Ok(NewRoom {
            room_number,
            room_type,
            capacity,
            status,
        })
    }

    pub fn into_changes(self) -> Result<RoomChanges, AppError> {
        Ok(RoomChanges {
            room_number: optional(self.room_number),
            room_type: optional(self.room_type),
            capacity: self.capacity.map(parse_capacity).transpose()?,
            status: optional(self.status)
                .map(|status| parse_room_status(&status))
                .transpose()?,
        })
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct PatientRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub dob: Option<String>,
    pub gender: Option<String>,
    pub blood_type: Option<String>,
    pub severity: Option<String>,
    #[serde(deserialize_with = "lenient_bool")]
    pub is_isolated: Option<bool>,
    #[serde(deserialize_with = "lenient_bool")]
    pub is_contagious: Option<bool>,
    pub notes: Option<String>,
    #[serde(deserialize_with = "present")]
    pub room_id: Option<Option<String>>,
}

impl PatientRequest {
    pub fn into_new(self) -> Result<NewPatient, AppError> {
        let first_name = required(self.first_name, "first_name")?;
        let last_name = required(self.last_name, "last_name")?;
        let dob = parse_date(&required(self.dob, "dob")?, "dob")?;
        let gender = required(self.gender, "gender")?;
        let blood_type = required(self.blood_type, "blood_type")?;
        let severity = parse_severity(&required(self.severity, "severity")?)?;
        let room_id = match self.room_id.flatten() {
            Some(raw) => Some(parse_room_id(&raw)?),
            None => None,
        };

        Ok(NewPatient {
            first_name,
            last_name,
            dob,
            gender,
            blood_type,
            severity,
            is_isolated: self.is_isolated.unwrap_or(false),
            is_contagious: self.is_contagious.unwrap_or(false),
            notes: optional(self.notes),
            room_id,
        })
    }

    pub fn into_changes(self) -> Result<PatientChanges, AppError> {
        let room = match self.room_id {
            None => RoomChange::Keep,
            Some(None) => RoomChange::Clear,
            Some(Some(raw)) => RoomChange::Assign(parse_room_id(&raw)?),
        };

        Ok(PatientChanges {
            first_name: optional(self.first_name),
            last_name: optional(self.last_name),
            dob: optional(self.dob)
                .map(|dob| parse_date(&dob, "dob"))
                .transpose()?,
            gender: optional(self.gender),
            blood_type: optional(self.blood_type),
            severity: optional(self.severity)
                .map(|severity| parse_severity(&severity))
                .transpose()?,
            is_isolated: self.is_isolated,
            is_contagious: self.is_contagious,
            notes: self.notes,
            room,
        })
    }
}

fn parse_room_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::validation("Invalid room_id"))
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct StaffRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub specialization: Option<String>,
    pub shift: Option<String>,
}

impl StaffRequest {
    pub fn into_new(self) -> Result<NewStaff, AppError> {
        let username = required(self.username, "username")?;
        let password = match self.password {
            Some(password) if !password.is_empty() => password,
            _ => return Err(AppError::missing_field("password")),
        };
        let full_name = required(self.full_name, "full_name")?;
        let email = required(self.email, "email")?;
        let role = parse_role(&required(self.role, "role")?)?;

        Ok(NewStaff {
            username,
            password,
            full_name,
            email,
            role,
            specialization: optional(self.specialization),
            shift: optional(self.shift),
        })
    }

    pub fn into_changes(self) -> Result<StaffChanges, AppError> {
        Ok(StaffChanges {
            username: optional(self.username),
            password: self.password.filter(|password| !password.is_empty()),
            full_name: optional(self.full_name),
            email: optional(self.email),
            role: optional(self.role)
                .map(|role| parse_role(&role))
                .transpose()?,
            specialization: optional(self.specialization),
            shift: optional(self.shift),
        })
    }
}

/// List filters, read from the query string. `type` is the legacy name of
/// `room_type`.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ListQuery {
    pub room_type: Option<String>,
    #[serde(rename = "type")]
    pub legacy_type: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub severity: Option<String>,
    pub role: Option<String>,
}

impl ListQuery {
    pub fn rooms(&self) -> RoomFilter {
        RoomFilter {
            room_type: optional(self.room_type.clone()).or_else(|| optional(self.legacy_type.clone())),
            status: optional(self.status.clone()),
        }
    }

    pub fn patients(&self) -> PatientFilter {
        PatientFilter {
            search: optional(self.search.clone()),
            severity: optional(self.severity.clone()),
        }
    }

    pub fn staff(&self) -> UserFilter {
        UserFilter {
            role: optional(self.role.clone()),
            search: optional(self.search.clone()),
        }
    }
}
