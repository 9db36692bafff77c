use serde::Serialize;

use crate::db::dao::DaoLayerError;

#[derive(Debug)]
pub enum AppError {
    /// Missing or malformed input field; the message names the field.
    Validation(String),
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    /// Store failure. The enclosing transaction has been rolled back.
    Store(String),
    Internal(String),
}

/// Machine-readable companion to the human-readable error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    Store,
    Internal,
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn missing_field(field: &str) -> Self {
        Self::Validation(format!("Missing required field: {field}"))
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::Store(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::BadRequest(_) => ErrorKind::BadRequest,
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Store(_) => ErrorKind::Store,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Validation(message)
            | Self::BadRequest(message)
            | Self::Unauthorized(message)
            | Self::Forbidden(message)
            | Self::NotFound(message)
            | Self::Conflict(message)
            | Self::Store(message)
            | Self::Internal(message) => message.as_str(),
        }
    }

    /// Prefixes the message with the failed operation, e.g.
    /// "Failed to add patient: ...". Only store errors are rewritten.
    pub fn context(self, operation: &str) -> Self {
        match self {
            Self::Store(message) => Self::Store(format!("Failed to {operation}: {message}")),
            other => other,
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for AppError {}

impl From<DaoLayerError> for AppError {
    fn from(err: DaoLayerError) -> Self {
        match err {
            DaoLayerError::NotFound { .. } => AppError::not_found(err.to_string()),
            DaoLayerError::UniqueViolation(_) => AppError::conflict(err.to_string()),
            DaoLayerError::Db(_) => AppError::store(err.to_string()),
        }
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        DaoLayerError::from(err).into()
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::DbErr;
    use uuid::Uuid;

    use super::{AppError, ErrorKind};
    use crate::db::dao::DaoLayerError;

    #[test]
    fn dao_errors_map_to_expected_kinds() {
        let not_found: AppError = DaoLayerError::NotFound {
            entity: "room",
            id: Uuid::nil(),
        }
        .into();
        assert_eq!(not_found.kind(), ErrorKind::NotFound);

        let store: AppError = DbErr::Custom("connection reset".to_string()).into();
        assert_eq!(store.kind(), ErrorKind::Store);
        assert!(store.message().contains("connection reset"));
    }

    #[test]
    fn context_only_rewrites_store_errors() {
        let store = AppError::store("boom").context("add patient");
        assert_eq!(store.message(), "Failed to add patient: boom");

        let validation = AppError::missing_field("dob").context("add patient");
        assert_eq!(validation.message(), "Missing required field: dob");
    }
}
