//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod grant;
mod resource;
mod security;

pub use grant::{
    AccessId, DurationHours, GrantRecord, GrantRecordParts, MAX_DURATION_HOURS, SECONDS_PER_HOUR,
};
pub use resource::{ResourceDescriptor, ResourceInfo};
pub use security::{Permission, PermissionSet};
