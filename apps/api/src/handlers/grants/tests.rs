use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use lakegrant_application::GrantRecordStore;
use lakegrant_core::AppError;
use lakegrant_domain::{Permission, ResourceDescriptor};

use super::{create_grant_handler, list_grants_handler};
use crate::dto::{CreateGrantRequest, ListGrantsQuery};
use crate::test_support::{expired_grant, in_memory_state};

fn sales_orders() -> ResourceDescriptor {
    let Ok(resource) = ResourceDescriptor::table("sales", "orders") else {
        panic!("fixture resource should be valid");
    };
    resource
}

#[tokio::test]
async fn create_grant_applies_permissions_and_returns_created() {
    let (state, permission_service, _) = in_memory_state();

    let response = create_grant_handler(
        State(state),
        Json(CreateGrantRequest {
            principal: "role:analyst".to_owned(),
            resource: sales_orders(),
            permissions: vec!["SELECT".to_owned(), "DESCRIBE".to_owned()],
            duration_hours: Some(2),
        }),
    )
    .await;

    let Ok((status, Json(payload))) = response else {
        panic!("create grant should succeed");
    };
    assert_eq!(status, StatusCode::CREATED);
    assert!(payload.success);
    assert!(payload.grant.is_active);
    assert_eq!(payload.grant.duration_hours, 2);
    assert_eq!(
        payload.grant.expires_at,
        payload.grant.grant_timestamp + 2 * 3_600
    );
    assert_eq!(payload.grant.permissions, vec!["SELECT", "DESCRIBE"]);
    assert!(
        permission_service
            .has_permission("role:analyst", &sales_orders(), Permission::Describe)
            .await
    );
}

#[tokio::test]
async fn create_grant_defaults_duration() {
    let (state, _, _) = in_memory_state();

    let response = create_grant_handler(
        State(state),
        Json(CreateGrantRequest {
            principal: "role:analyst".to_owned(),
            resource: sales_orders(),
            permissions: vec!["SELECT".to_owned()],
            duration_hours: None,
        }),
    )
    .await;

    let Ok((_, Json(payload))) = response else {
        panic!("create grant should succeed");
    };
    assert_eq!(payload.grant.duration_hours, 24);
}

#[tokio::test]
async fn create_grant_rejects_unknown_permission() {
    let (state, permission_service, record_store) = in_memory_state();

    let response = create_grant_handler(
        State(state),
        Json(CreateGrantRequest {
            principal: "role:analyst".to_owned(),
            resource: sales_orders(),
            permissions: vec!["READ_EVERYTHING".to_owned()],
            duration_hours: Some(1),
        }),
    )
    .await;

    assert!(matches!(response, Err(ref error) if matches!(error.0, AppError::Validation(_))));
    assert_eq!(permission_service.granted_count().await, 0);
    assert_eq!(
        record_store.scan_grants().await.map(|records| records.len()).ok(),
        Some(0)
    );
}

#[tokio::test]
async fn create_grant_rejects_zero_duration() {
    let (state, permission_service, _) = in_memory_state();

    let response = create_grant_handler(
        State(state),
        Json(CreateGrantRequest {
            principal: "role:analyst".to_owned(),
            resource: sales_orders(),
            permissions: vec!["SELECT".to_owned()],
            duration_hours: Some(0),
        }),
    )
    .await;

    assert!(matches!(response, Err(ref error) if matches!(error.0, AppError::Validation(_))));
    assert_eq!(permission_service.granted_count().await, 0);
}

#[tokio::test]
async fn list_grants_filters_inactive_records() {
    let (state, _, record_store) = in_memory_state();
    let active = expired_grant("role:active");
    let revoked = expired_grant("role:revoked");
    assert!(record_store.insert_grant(active.clone()).await.is_ok());
    assert!(record_store.insert_grant(revoked.clone()).await.is_ok());
    assert!(
        record_store
            .mark_grant_inactive(revoked.access_id())
            .await
            .is_ok()
    );

    let all = list_grants_handler(State(state.clone()), Query(ListGrantsQuery::default())).await;
    let active_only = list_grants_handler(
        State(state),
        Query(ListGrantsQuery {
            active_only: Some(true),
        }),
    )
    .await;

    let (Ok(Json(all)), Ok(Json(active_only))) = (all, active_only) else {
        panic!("listing grants should succeed");
    };
    assert_eq!(all.len(), 2);
    assert_eq!(active_only.len(), 1);
    assert_eq!(active_only[0].access_id, active.access_id().to_string());
}

#[test]
fn create_request_accepts_catalog_resource_layout() {
    let payload = serde_json::json!({
        "principal": "arn:aws:iam::123456789012:role/analyst",
        "resource": {"Table": {"DatabaseName": "sales", "Name": "orders"}},
        "permissions": ["SELECT"],
    });

    let request = serde_json::from_value::<CreateGrantRequest>(payload);

    let Ok(request) = request else {
        panic!("request should deserialize");
    };
    assert_eq!(request.resource, sales_orders());
    assert_eq!(request.duration_hours, None);
}
