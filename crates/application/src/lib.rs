//! Application services and ports.

#![forbid(unsafe_code)]

mod activation;
mod expiry_sweeper;
mod grant_lifecycle_service;
mod grant_ports;

#[cfg(test)]
mod test_support;

pub use activation::ActivationStatus;
pub use expiry_sweeper::{ExpirySweeper, SweepOptions, SweepReport, SweepStatus};
pub use grant_lifecycle_service::{
    CreateGrantInput, ExternalCallPolicy, GrantLifecycleService, GrantListQuery, RevokeGrantInput,
};
pub use grant_ports::{GrantRecordStore, PermissionService};
