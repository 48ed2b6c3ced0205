use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use lakegrant_application::{ActivationStatus, CreateGrantInput, GrantListQuery};
use lakegrant_domain::Permission;

use crate::dto::{CreateGrantRequest, CreateGrantResponse, GrantResponse, ListGrantsQuery};
use crate::error::ApiResult;
use crate::state::AppState;

#[cfg(test)]
mod tests;

pub async fn create_grant_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreateGrantRequest>,
) -> ApiResult<(StatusCode, Json<CreateGrantResponse>)> {
    let permissions = payload
        .permissions
        .iter()
        .map(|value| Permission::from_transport(value))
        .collect::<Result<Vec<_>, _>>()?;

    let record = state
        .lifecycle_service
        .create_grant(CreateGrantInput {
            principal: payload.principal,
            resource: payload.resource,
            permissions,
            duration_hours: payload
                .duration_hours
                .unwrap_or(state.default_grant_duration_hours),
        })
        .await?;

    let status = ActivationStatus::succeeded(format!("grant '{}' created", record.access_id()));
    Ok((
        StatusCode::CREATED,
        Json(CreateGrantResponse {
            success: status.success,
            message: status.message,
            grant: GrantResponse::from(record),
        }),
    ))
}

pub async fn list_grants_handler(
    State(state): State<AppState>,
    Query(query): Query<ListGrantsQuery>,
) -> ApiResult<Json<Vec<GrantResponse>>> {
    let grants = state
        .lifecycle_service
        .list_grants(GrantListQuery {
            active_only: query.active_only.unwrap_or(false),
        })
        .await?;

    Ok(Json(grants.into_iter().map(GrantResponse::from).collect()))
}
