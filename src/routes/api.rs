use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::{Query, State},
    http::Method,
    routing::any,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::{
    operation::{Operation, Resource},
    requests::{
        ListQuery, LoginRequest, PatientRequest, RoomRequest, StaffRequest, parse_body, parse_id,
    },
};
use crate::{
    auth::Session,
    error::AppError,
    response::{ApiResult, Envelope},
    services::ServiceContext,
    state::AppState,
};

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ApiQuery {
    pub endpoint: Option<String>,
    pub action: Option<String>,
    pub id: Option<String>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api", any(dispatch))
        .route("/api.php", any(dispatch))
        .with_state(state)
}

async fn dispatch(
    State(state): State<Arc<AppState>>,
    method: Method,
    Query(query): Query<ApiQuery>,
    Query(filters): Query<ListQuery>,
    session: Session,
    body: Bytes,
) -> ApiResult<Value> {
    let operation = Operation::parse(query.endpoint.as_deref(), query.action.as_deref(), &method)?;
    let actor = match operation.required_access() {
        Some(access) => Some(session.require(access)?.id),
        None => None,
    };

    let body = decode_json(&body)?;
    let ctx = ServiceContext::from_state(&state);
    tracing::debug!(?operation, user_id = ?actor, "api call");

    match operation {
        Operation::Login => {
            let request: LoginRequest = parse_body(&body)?;
            let response = ctx
                .auth()
                .login(
                    request.username.as_deref().unwrap_or_default(),
                    request.password.as_deref().unwrap_or_default(),
                )
                .await?;
            ok(response)
        }
        Operation::DashboardStats => ok(ctx.stats().overview().await?),
        Operation::List(resource) => list(&ctx, resource, &filters).await,
        Operation::Create(resource) => create(&ctx, resource, &body, actor).await,
        Operation::Update(resource) => {
            let id = target_id(resource, &query, &body)?;
            update(&ctx, resource, id, &body, actor).await
        }
        Operation::Delete(resource) => {
            let id = target_id(resource, &query, &body)?;
            match resource {
                Resource::Rooms => ctx.rooms().delete(id).await?,
                Resource::Patients => ctx.patients().delete(id).await?,
                Resource::Staff => ctx.staff().delete(id).await?,
            }
            Envelope::ok(Value::Null)
        }
    }
}

async fn list(ctx: &ServiceContext, resource: Resource, filters: &ListQuery) -> ApiResult<Value> {
    match resource {
        Resource::Rooms => ok(ctx.rooms().list(&filters.rooms()).await?),
        Resource::Patients => ok(ctx.patients().list(&filters.patients()).await?),
        Resource::Staff => ok(ctx.staff().list(&filters.staff()).await?),
    }
}

async fn create(
    ctx: &ServiceContext,
    resource: Resource,
    body: &Value,
    actor: Option<Uuid>,
) -> ApiResult<Value> {
    match resource {
        Resource::Rooms => {
            let input = parse_body::<RoomRequest>(body)?.into_new()?;
            ok(ctx.rooms().create(input).await?)
        }
        Resource::Patients => {
            let input = parse_body::<PatientRequest>(body)?.into_new()?;
            ok(ctx.patients().create(input, actor).await?)
        }
        Resource::Staff => {
            let input = parse_body::<StaffRequest>(body)?.into_new()?;
            ok(ctx.staff().create(input).await?)
        }
    }
}

async fn update(
    ctx: &ServiceContext,
    resource: Resource,
    id: Uuid,
    body: &Value,
    actor: Option<Uuid>,
) -> ApiResult<Value> {
    match resource {
        Resource::Rooms => {
            let changes = parse_body::<RoomRequest>(body)?.into_changes()?;
            ctx.rooms().update(id, changes).await?;
        }
        Resource::Patients => {
            let changes = parse_body::<PatientRequest>(body)?.into_changes()?;
            ctx.patients().update(id, changes, actor).await?;
        }
        Resource::Staff => {
            let changes = parse_body::<StaffRequest>(body)?.into_changes()?;
            ctx.staff().update(id, changes).await?;
        }
    }
    Envelope::ok(Value::Null)
}

pub(super) fn ok<T: Serialize>(data: T) -> ApiResult<Value> {
    let value = serde_json::to_value(data)
        .map_err(|err| AppError::internal(format!("response serialization failed: {err}")))?;
    Envelope::ok(value)
}

fn decode_json(body: &Bytes) -> Result<Value, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body).map_err(|err| AppError::bad_request(format!("Invalid JSON body: {err}")))
}

/// The row an update or delete targets: query `id`, else body `id`.
fn target_id(resource: Resource, query: &ApiQuery, body: &Value) -> Result<Uuid, AppError> {
    let from_body = match body.get("id") {
        Some(Value::String(id)) => Some(id.clone()),
        Some(Value::Number(id)) => Some(id.to_string()),
        _ => None,
    };
    let raw = query
        .id
        .clone()
        .filter(|id| !id.trim().is_empty())
        .or(from_body)
        .ok_or_else(|| {
            let label = match resource {
                Resource::Rooms => "Room",
                Resource::Patients => "Patient",
                Resource::Staff => "Staff",
            };
            AppError::validation(format!("{label} ID is required"))
        })?;
    parse_id(&raw)
}

#[cfg(test)]
mod tests {
    use axum::body::Bytes;
    use serde_json::json;
    use uuid::Uuid;

    use super::{ApiQuery, decode_json, target_id};
    use crate::error::ErrorKind;
    use crate::routes::operation::Resource;

    #[test]
    fn query_id_wins_over_body_id() {
        let query_id = Uuid::new_v4();
        let body_id = Uuid::new_v4();
        let query = ApiQuery {
            id: Some(query_id.to_string()),
            ..Default::default()
        };
        let body = json!({ "id": body_id.to_string() });
        assert_eq!(target_id(Resource::Rooms, &query, &body).expect("id"), query_id);
        assert_eq!(
            target_id(Resource::Rooms, &ApiQuery::default(), &body).expect("id"),
            body_id
        );
    }

    #[test]
    fn missing_id_names_the_resource() {
        let err = target_id(Resource::Patients, &ApiQuery::default(), &json!({}))
            .expect_err("id is missing");
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.message(), "Patient ID is required");
    }

    #[test]
    fn empty_bodies_decode_to_null() {
        assert!(decode_json(&Bytes::from_static(b"  ")).expect("empty").is_null());
        assert_eq!(
            decode_json(&Bytes::from_static(b"{not json"))
                .expect_err("invalid")
                .kind(),
            ErrorKind::BadRequest
        );
    }
}
