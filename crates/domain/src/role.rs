use std::collections::BTreeMap;
use std::str::FromStr;

use ascend_core::AppError;
use serde::{Deserialize, Serialize};

/// Role name literals that receive special-cased data-scope handling.
///
/// The role set is open: anything other than these two is treated as
/// rank-and-file. Matching is exact, mirroring the stored designation values.
pub const ADMIN_ROLE: &str = "Admin";

/// Team leader designation literal.
pub const TEAM_LEADER_ROLE: &str = "Team Leader";

/// A role designation resolved from the user's access grant.
///
/// Deliberately not an enum: role names are free-form strings owned by the
/// backend, and only `Admin` and `Team Leader` are compared literally. The
/// capability map, not the role name, governs UI affordances.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleName(String);

impl RoleName {
    /// Creates a role name from a stored designation value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the designation string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns whether this role gets unconditional full data scope.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.0 == ADMIN_ROLE
    }

    /// Returns whether this role gets team-scoped data access.
    #[must_use]
    pub fn is_team_leader(&self) -> bool {
        self.0 == TEAM_LEADER_ROLE
    }
}

impl std::fmt::Display for RoleName {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Permission modules gating pages and mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionModule {
    /// Prospect pipeline pages and prospect mutations.
    ProspectManagement,
    /// Raw join-request triage.
    LeadManagement,
    /// Message template management and bulk sends.
    WhatsappTemplates,
    /// Analytics and leaderboard views.
    Analytics,
    /// Import, export, backup, restore and clear-all.
    DataManagement,
    /// Team membership administration.
    TeamManagement,
    /// The landing dashboard.
    CrmDashboard,
}

impl PermissionModule {
    /// Returns the stable storage key for this module.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProspectManagement => "prospect_management",
            Self::LeadManagement => "lead_management",
            Self::WhatsappTemplates => "whatsapp_templates",
            Self::Analytics => "analytics",
            Self::DataManagement => "data_management",
            Self::TeamManagement => "team_management",
            Self::CrmDashboard => "crm_dashboard",
        }
    }

    /// Returns all known modules.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[PermissionModule] = &[
            PermissionModule::ProspectManagement,
            PermissionModule::LeadManagement,
            PermissionModule::WhatsappTemplates,
            PermissionModule::Analytics,
            PermissionModule::DataManagement,
            PermissionModule::TeamManagement,
            PermissionModule::CrmDashboard,
        ];

        ALL
    }
}

impl FromStr for PermissionModule {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "prospect_management" => Ok(Self::ProspectManagement),
            "lead_management" => Ok(Self::LeadManagement),
            "whatsapp_templates" => Ok(Self::WhatsappTemplates),
            "analytics" => Ok(Self::Analytics),
            "data_management" => Ok(Self::DataManagement),
            "team_management" => Ok(Self::TeamManagement),
            "crm_dashboard" => Ok(Self::CrmDashboard),
            _ => Err(AppError::Validation(format!(
                "unknown permission module '{value}'"
            ))),
        }
    }
}

/// One of the four per-module capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Allows viewing the module's page content.
    View,
    /// Allows creating records in the module.
    Add,
    /// Allows editing records in the module.
    Edit,
    /// Allows deleting records in the module.
    Delete,
}

impl Capability {
    /// Returns the stable storage value for this capability.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Add => "add",
            Self::Edit => "edit",
            Self::Delete => "delete",
        }
    }
}

/// Capability record for one module; absent fields deserialize to `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// View access.
    #[serde(default)]
    pub view: bool,
    /// Create access.
    #[serde(default)]
    pub add: bool,
    /// Update access.
    #[serde(default)]
    pub edit: bool,
    /// Delete access.
    #[serde(default)]
    pub delete: bool,
}

impl Capabilities {
    /// The all-false capability record.
    pub const NONE: Self = Self {
        view: false,
        add: false,
        edit: false,
        delete: false,
    };

    /// The all-true capability record.
    pub const ALL: Self = Self {
        view: true,
        add: true,
        edit: true,
        delete: true,
    };

    /// Returns whether an action is allowed by this record.
    #[must_use]
    pub fn allows(&self, capability: Capability) -> bool {
        match capability {
            Capability::View => self.view,
            Capability::Add => self.add,
            Capability::Edit => self.edit,
            Capability::Delete => self.delete,
        }
    }

    /// Returns whether any of the four capabilities is granted.
    ///
    /// Navigation visibility keys off this, not off `view`: a module with
    /// only `delete` still shows its nav item.
    #[must_use]
    pub fn grants_any(&self) -> bool {
        self.view || self.add || self.edit || self.delete
    }
}

/// String-keyed per-module capability map with deny-by-default semantics.
///
/// The backing role-definition documents are free-form maps; unknown keys are
/// preserved on round-trip and a missing key means no access at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeMap<String, Capabilities>);

impl PermissionSet {
    /// Creates an empty permission set (every module denied).
    #[must_use]
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// Creates a permission set from explicit module entries.
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = (PermissionModule, Capabilities)>) -> Self {
        Self(
            entries
                .into_iter()
                .map(|(module, capabilities)| (module.as_str().to_owned(), capabilities))
                .collect(),
        )
    }

    /// Grants capabilities for one module, replacing any previous entry.
    pub fn grant(&mut self, module: PermissionModule, capabilities: Capabilities) {
        self.0.insert(module.as_str().to_owned(), capabilities);
    }

    /// Total lookup: returns the stored record or all-false for missing keys.
    ///
    /// This function never fails; deny-by-default is encoded here rather than
    /// left to callers.
    #[must_use]
    pub fn capabilities_for(&self, module: PermissionModule) -> Capabilities {
        self.0.get(module.as_str()).copied().unwrap_or_default()
    }

    /// Returns whether the map carries an explicit entry for a module.
    ///
    /// The dashboard is visible by default and only an explicit entry can
    /// take it away, so its gate needs to distinguish "absent" from "all
    /// false".
    #[must_use]
    pub fn has_entry(&self, module: PermissionModule) -> bool {
        self.0.contains_key(module.as_str())
    }
}
