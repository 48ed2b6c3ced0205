use lakegrant_application::{ExpirySweeper, GrantLifecycleService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub lifecycle_service: GrantLifecycleService,
    pub expiry_sweeper: ExpirySweeper,
    pub default_grant_duration_hours: u32,
}
