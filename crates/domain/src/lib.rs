//! Domain entities and invariants for the Ascend CRM client core.

#![forbid(unsafe_code)]

mod access_level;
mod activity;
mod identity;
mod lead;
pub mod metrics;
mod prospect;
mod role;
mod team;
mod template;

pub use access_level::{access_level, can_edit, can_reassign, AccessLevel};
pub use activity::Activity;
pub use identity::{
    resolve_effective_grant, AccessError, AccessGrant, Employee, Principal, RoleDefinition,
    UserProfile,
};
pub use lead::Lead;
pub use prospect::{InterestLevel, LeadSource, Prospect, ProspectStatus};
pub use role::{
    Capabilities, Capability, PermissionModule, PermissionSet, RoleName, ADMIN_ROLE,
    TEAM_LEADER_ROLE,
};
pub use team::Team;
pub use template::{Channel, MessageTemplate};
