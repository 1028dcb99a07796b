use ascend_core::{EmployeeId, TeamId};
use serde::{Deserialize, Serialize};

/// A sales team: a leader plus member employee ids.
///
/// Read-mostly reference data owned by the backend; the client only mutates
/// it through the team-management page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    /// Document id.
    #[serde(default)]
    pub id: String,
    /// Display name.
    pub name: String,
    /// Leading employee, if one is assigned.
    #[serde(default)]
    pub leader_id: Option<EmployeeId>,
    /// Member employee ids.
    #[serde(default)]
    pub members: Vec<EmployeeId>,
}

impl Team {
    /// Returns this team's id as a typed value.
    #[must_use]
    pub fn team_id(&self) -> TeamId {
        TeamId::from_raw(self.id.clone())
    }

    /// Returns whether an employee belongs to this team (leader included).
    #[must_use]
    pub fn includes(&self, employee_id: &EmployeeId) -> bool {
        self.leader_id.as_ref() == Some(employee_id) || self.members.contains(employee_id)
    }
}

#[cfg(test)]
mod tests {
    use ascend_core::EmployeeId;

    use super::Team;

    #[test]
    fn leader_counts_as_team_member() {
        let team = Team {
            id: "t-1".to_owned(),
            name: "North".to_owned(),
            leader_id: Some(EmployeeId::from_raw("lead-1")),
            members: vec![EmployeeId::from_raw("emp-2")],
        };

        assert!(team.includes(&EmployeeId::from_raw("lead-1")));
        assert!(team.includes(&EmployeeId::from_raw("emp-2")));
        assert!(!team.includes(&EmployeeId::from_raw("emp-3")));
    }
}
