use std::{marker::PhantomData, sync::Arc};

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};

use super::{Access, Identity, RequiredAccess, authorize};
use crate::{error::AppError, services::ServiceContext, state::AppState};

/// The caller's session as resolved from the `Authorization` header.
///
/// Accepts `Bearer <token>` or the bare token. Resolution happens once per
/// request; the result is cached in the request extensions.
#[derive(Debug, Clone)]
pub enum Session {
    /// No token was sent.
    Anonymous,
    /// A token was sent but is unknown, expired or orphaned.
    Invalid,
    Active(Identity),
}

impl Session {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Session::Active(identity) => Some(identity),
            Session::Anonymous | Session::Invalid => None,
        }
    }

    /// Resolves to the identity if it satisfies `access`.
    pub fn require(&self, access: Access) -> Result<&Identity, AppError> {
        let identity = match self {
            Session::Active(identity) => identity,
            Session::Anonymous => {
                return Err(AppError::unauthorized("Authorization token required"));
            }
            Session::Invalid => return Err(AppError::unauthorized("Invalid or expired token")),
        };
        authorize(identity, access)?;
        Ok(identity)
    }
}

pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?.trim_start();
    let token = value.strip_prefix("Bearer").unwrap_or(value).trim();
    (!token.is_empty()).then_some(token)
}

impl FromRequestParts<Arc<AppState>> for Session {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<Session>() {
            return Ok(session.clone());
        }

        let session = match bearer_token(&parts.headers) {
            None => Session::Anonymous,
            Some(token) => match ServiceContext::from_state(state)
                .sessions()
                .resolve(token)
                .await?
            {
                Some(identity) => Session::Active(identity),
                None => Session::Invalid,
            },
        };

        parts.extensions.insert(session.clone());
        Ok(session)
    }
}

/// Rejects the request unless the session satisfies `R`.
pub struct AccessGuard<R> {
    pub identity: Identity,
    _required: PhantomData<R>,
}

impl<R> FromRequestParts<Arc<AppState>> for AccessGuard<R>
where
    R: RequiredAccess + Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;
        let identity = session.require(R::required())?.clone();
        Ok(Self {
            identity,
            _required: PhantomData,
        })
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, HeaderValue, header};
    use uuid::Uuid;

    use super::{Session, bearer_token};
    use crate::auth::{Access, Identity, Role};
    use crate::error::ErrorKind;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(value).expect("header value"),
        );
        headers
    }

    #[test]
    fn bearer_prefix_is_optional() {
        assert_eq!(bearer_token(&headers("Bearer abc123")), Some("abc123"));
        assert_eq!(bearer_token(&headers("abc123")), Some("abc123"));
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&headers("Bearer")), None);
        assert_eq!(bearer_token(&headers("  Bearer   abc123 ")), Some("abc123"));
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn missing_and_invalid_tokens_have_distinct_messages() {
        let err = Session::Anonymous
            .require(Access::Authenticated)
            .expect_err("anonymous should fail");
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert_eq!(err.message(), "Authorization token required");

        let err = Session::Invalid
            .require(Access::Authenticated)
            .expect_err("invalid should fail");
        assert_eq!(err.message(), "Invalid or expired token");
    }

    #[test]
    fn active_sessions_are_checked_against_the_policy() {
        let nurse = Session::Active(Identity {
            id: Uuid::new_v4(),
            username: "nora".to_string(),
            role: Role::Nurse,
            full_name: "Nora Nurse".to_string(),
            email: "nora@hospital.local".to_string(),
        });
        nurse
            .require(Access::MedicalStaff)
            .expect("nurse is medical staff");
        let err = nurse.require(Access::Admin).expect_err("nurse is not admin");
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }
}
