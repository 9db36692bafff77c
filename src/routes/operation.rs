use axum::http::Method;

use crate::{auth::Access, error::AppError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Rooms,
    Patients,
    Staff,
}

impl Resource {
    fn from_endpoint(endpoint: &str) -> Option<Self> {
        match endpoint {
            "rooms" => Some(Resource::Rooms),
            "patients" => Some(Resource::Patients),
            "staff" => Some(Resource::Staff),
            _ => None,
        }
    }

    /// Who may create, update and delete rows of this resource.
    fn write_access(&self) -> Access {
        match self {
            Resource::Rooms | Resource::Staff => Access::Admin,
            Resource::Patients => Access::MedicalStaff,
        }
    }
}

/// One API call, however it was addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Login,
    List(Resource),
    Create(Resource),
    Update(Resource),
    Delete(Resource),
    DashboardStats,
}

impl Operation {
    /// Resolves `?endpoint=` (routed by method) or `?action=` (method
    /// ignored). `endpoint` wins when both are given.
    pub fn parse(
        endpoint: Option<&str>,
        action: Option<&str>,
        method: &Method,
    ) -> Result<Self, AppError> {
        if let Some(endpoint) = endpoint.filter(|value| !value.is_empty()) {
            return Self::from_endpoint(endpoint, method);
        }
        if let Some(action) = action.filter(|value| !value.is_empty()) {
            return Self::from_action(action);
        }
        Err(AppError::bad_request("No endpoint or action specified"))
    }

    fn from_endpoint(endpoint: &str, method: &Method) -> Result<Self, AppError> {
        let resource = Resource::from_endpoint(endpoint)
            .ok_or_else(|| AppError::bad_request("Invalid endpoint"))?;
        match *method {
            Method::GET => Ok(Operation::List(resource)),
            Method::POST => Ok(Operation::Create(resource)),
            Method::PUT => Ok(Operation::Update(resource)),
            Method::DELETE => Ok(Operation::Delete(resource)),
            _ => Err(AppError::bad_request("Method not allowed")),
        }
    }

    fn from_action(action: &str) -> Result<Self, AppError> {
        use Resource::{Patients, Rooms, Staff};

        let operation = match action {
            "login" => Operation::Login,
            "getRooms" => Operation::List(Rooms),
            "getPatients" => Operation::List(Patients),
            "getStaff" => Operation::List(Staff),
            "addRoom" => Operation::Create(Rooms),
            "addPatient" => Operation::Create(Patients),
            "addStaff" => Operation::Create(Staff),
            "updateRoom" => Operation::Update(Rooms),
            "updatePatient" => Operation::Update(Patients),
            "updateStaff" => Operation::Update(Staff),
            "deleteRoom" => Operation::Delete(Rooms),
            "deletePatient" => Operation::Delete(Patients),
            "deleteStaff" => Operation::Delete(Staff),
            "getDashboardStats" => Operation::DashboardStats,
            _ => return Err(AppError::bad_request("Invalid action")),
        };
        Ok(operation)
    }

    /// `None` for the one unauthenticated call.
    pub fn required_access(&self) -> Option<Access> {
        match self {
            Operation::Login => None,
            Operation::List(_) | Operation::DashboardStats => Some(Access::Authenticated),
            Operation::Create(resource)
            | Operation::Update(resource)
            | Operation::Delete(resource) => Some(resource.write_access()),
        }
    }
}
