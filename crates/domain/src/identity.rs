use ascend_core::{AppError, EmployeeId, TeamId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::role::{PermissionSet, RoleName};

/// The authenticated identity returned by the auth provider.
///
/// Lives only for the session; never persisted by this system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    auth_id: String,
    email: String,
}

impl Principal {
    /// Creates a principal from provider data.
    #[must_use]
    pub fn new(auth_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            auth_id: auth_id.into(),
            email: email.into(),
        }
    }

    /// Returns the provider's stable subject id.
    #[must_use]
    pub fn auth_id(&self) -> &str {
        self.auth_id.as_str()
    }

    /// Returns the sign-in email.
    #[must_use]
    pub fn email(&self) -> &str {
        self.email.as_str()
    }
}

/// HRMS employee reference record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    /// Document id; doubles as the employee id everywhere else.
    pub id: EmployeeId,
    /// Full display name.
    pub full_name: String,
    /// Optional short employee code shown in assignment pickers.
    #[serde(default)]
    pub emp_code: Option<String>,
    /// Work email used to link the auth principal to this record.
    #[serde(default)]
    pub email: String,
    /// HRMS status literal; only "Active" employees are assignable.
    #[serde(default)]
    pub status: String,
}

impl Employee {
    /// Returns whether the employee is active in the HRMS.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == "Active"
    }

    /// Returns the picker label, e.g. `Jane Doe (E042)`.
    #[must_use]
    pub fn display_label(&self) -> String {
        match &self.emp_code {
            Some(code) => format!("{} ({code})", self.full_name),
            None => self.full_name.clone(),
        }
    }
}

/// Per-employee CRM access record.
///
/// More than one grant may exist for the same employee (a data-quality
/// reality, not a feature); `resolve_effective_grant` collapses them
/// deterministically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessGrant {
    /// Employee this grant applies to.
    pub employee_id: EmployeeId,
    /// Tri-state access flag: `Some(false)` is an explicit veto,
    /// `Some(true)` an explicit enable, `None` unspecified.
    #[serde(default, rename = "hasCRMAccess")]
    pub crm_access: Option<bool>,
    /// Role designation carried by this grant.
    pub role: RoleName,
    /// Team the grant places the employee on, if any.
    #[serde(default)]
    pub team_id: Option<TeamId>,
}

/// Named bundle of per-module capabilities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleDefinition {
    /// Role designation this definition describes.
    pub role: RoleName,
    /// Module capability map.
    #[serde(default)]
    pub permissions: PermissionSet,
}

/// Access-resolution failures; each one forces sign-out at the call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AccessError {
    /// No HRMS employee record matches the principal's email.
    #[error("no HRMS record matches this account")]
    NoEmployeeRecord,
    /// The employee exists but carries no access-grant records at all.
    #[error("no access profile is configured for this account")]
    NoAccessProfile,
    /// At least one grant vetoes access, or none explicitly enables it.
    #[error("CRM access is disabled for this account")]
    AccessDisabled,
}

impl AccessError {
    /// Returns the user-facing sign-out message for this failure.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::NoEmployeeRecord => "No HRMS record was found for this account.",
            Self::NoAccessProfile => "No access profile is configured for this account.",
            Self::AccessDisabled => "CRM access is disabled for this account.",
        }
    }
}

impl From<AccessError> for AppError {
    fn from(value: AccessError) -> Self {
        match value {
            AccessError::NoEmployeeRecord => AppError::NotFound(value.to_string()),
            AccessError::NoAccessProfile | AccessError::AccessDisabled => {
                AppError::Forbidden(value.to_string())
            }
        }
    }
}

/// Collapses an employee's grant records into one effective grant.
///
/// Disablement is a veto: any record with access explicitly disabled fails
/// the whole resolution no matter how many others enable it or where it sits
/// in the scan order. Otherwise the first explicitly enabled record wins; a
/// set with no explicit enable resolves to disabled.
pub fn resolve_effective_grant(grants: &[AccessGrant]) -> Result<&AccessGrant, AccessError> {
    if grants.is_empty() {
        return Err(AccessError::NoAccessProfile);
    }

    if grants.iter().any(|grant| grant.crm_access == Some(false)) {
        return Err(AccessError::AccessDisabled);
    }

    grants
        .iter()
        .find(|grant| grant.crm_access == Some(true))
        .ok_or(AccessError::AccessDisabled)
}

/// The resolved session identity.
///
/// This is the one piece of genuinely mutable shared state in the system:
/// `role`, `team_id` and `permissions` are overwritten in place when the
/// backing grant or role-definition records change mid-session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    employee_id: EmployeeId,
    name: String,
    email: String,
    role: RoleName,
    team_id: Option<TeamId>,
    permissions: PermissionSet,
}

impl UserProfile {
    /// Creates a resolved profile.
    #[must_use]
    pub fn new(
        employee_id: EmployeeId,
        name: impl Into<String>,
        email: impl Into<String>,
        role: RoleName,
        team_id: Option<TeamId>,
        permissions: PermissionSet,
    ) -> Self {
        Self {
            employee_id,
            name: name.into(),
            email: email.into(),
            role,
            team_id,
            permissions,
        }
    }

    /// Returns the employee id.
    #[must_use]
    pub fn employee_id(&self) -> &EmployeeId {
        &self.employee_id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the sign-in email.
    #[must_use]
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Returns the current role designation.
    #[must_use]
    pub fn role(&self) -> &RoleName {
        &self.role
    }

    /// Returns the current team, if any.
    #[must_use]
    pub fn team_id(&self) -> Option<&TeamId> {
        self.team_id.as_ref()
    }

    /// Returns the current capability map.
    #[must_use]
    pub fn permissions(&self) -> &PermissionSet {
        &self.permissions
    }

    /// Overwrites the role and team from a changed effective grant.
    pub fn apply_grant(&mut self, grant: &AccessGrant) {
        self.role = grant.role.clone();
        self.team_id = grant.team_id.clone();
    }

    /// Overwrites the capability map from a changed role definition.
    pub fn set_permissions(&mut self, permissions: PermissionSet) {
        self.permissions = permissions;
    }
}

#[cfg(test)]
mod tests {
    use ascend_core::{EmployeeId, TeamId};

    use super::{resolve_effective_grant, AccessError, AccessGrant};
    use crate::role::RoleName;

    fn grant(access: Option<bool>, role: &str) -> AccessGrant {
        AccessGrant {
            employee_id: EmployeeId::from_raw("emp-1"),
            crm_access: access,
            role: RoleName::new(role),
            team_id: Some(TeamId::from_raw("t-1")),
        }
    }

    #[test]
    fn veto_wins_over_enabled_records() {
        let grants = vec![grant(Some(true), "member"), grant(Some(false), "member")];
        assert_eq!(
            resolve_effective_grant(&grants).err(),
            Some(AccessError::AccessDisabled)
        );
    }

    #[test]
    fn first_enabled_record_becomes_effective() {
        let grants = vec![
            grant(None, "member"),
            grant(Some(true), "Team Leader"),
            grant(Some(true), "member"),
        ];
        let effective = resolve_effective_grant(&grants);
        assert_eq!(
            effective.map(|grant| grant.role.as_str()),
            Ok("Team Leader")
        );
    }

    #[test]
    fn no_explicit_enable_is_disabled() {
        let grants = vec![grant(None, "member"), grant(None, "member")];
        assert_eq!(
            resolve_effective_grant(&grants).err(),
            Some(AccessError::AccessDisabled)
        );
    }

    #[test]
    fn empty_grant_set_has_no_profile() {
        assert_eq!(
            resolve_effective_grant(&[]).err(),
            Some(AccessError::NoAccessProfile)
        );
    }

    mod properties {
        use proptest::prelude::*;

        use super::{grant, resolve_effective_grant, AccessError};

        proptest! {
            // A single disabled record vetoes no matter where it sits or how
            // many enabled records surround it.
            #[test]
            fn disabled_record_vetoes_regardless_of_order(
                flags in proptest::collection::vec(proptest::option::of(any::<bool>()), 0..7),
                position in 0usize..8,
            ) {
                let mut grants: Vec<_> = flags
                    .into_iter()
                    .map(|flag| grant(flag, "member"))
                    .collect();
                let position = position.min(grants.len());
                grants.insert(position, grant(Some(false), "member"));

                prop_assert_eq!(
                    resolve_effective_grant(&grants).err(),
                    Some(AccessError::AccessDisabled)
                );
            }

            // Without any explicit flag at all the resolution is disabled,
            // never a panic and never an implicit enable.
            #[test]
            fn unspecified_flags_never_enable(count in 1usize..7) {
                let grants: Vec<_> = (0..count).map(|_| grant(None, "member")).collect();
                prop_assert_eq!(
                    resolve_effective_grant(&grants).err(),
                    Some(AccessError::AccessDisabled)
                );
            }
        }
    }
}
