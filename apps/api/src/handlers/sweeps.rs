use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use lakegrant_application::SweepStatus;

use crate::dto::SweepResponse;
use crate::state::AppState;

/// Runs one expiry sweep. An aborted sweep answers `503` with the same body.
pub async fn run_sweep_handler(State(state): State<AppState>) -> (StatusCode, Json<SweepResponse>) {
    let report = state.expiry_sweeper.sweep().await;
    let status = match report.status {
        SweepStatus::Completed | SweepStatus::PartialFailure => StatusCode::OK,
        SweepStatus::Aborted => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status, Json(SweepResponse::from(report)))
}
