use ascend_core::EmployeeId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One best-effort audit-trail entry.
///
/// Written after successful mutations; a failed activity write is logged and
/// swallowed, never surfaced to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    /// Document id.
    #[serde(default)]
    pub id: String,
    /// Acting employee.
    pub user_id: EmployeeId,
    /// Short action label, e.g. "Prospect Added".
    pub action: String,
    /// Human-readable detail line.
    pub details: String,
    /// When the action happened.
    pub timestamp: DateTime<Utc>,
}
