use ascend_core::TeamId;
use serde::{Deserialize, Serialize};

use crate::identity::UserProfile;
use crate::prospect::Prospect;

/// Entity-scoped authorization outcome, distinct from module capability.
///
/// Both the row-render path (which buttons to draw) and the action-handler
/// path (whether to execute) derive this through the same function; they can
/// never disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    /// Unconditional access to every prospect.
    Full,
    /// Access through team membership.
    Team,
    /// Access through assignment, ownership or creation.
    Own,
    /// No entity-level access.
    None,
}

/// Resolves the caller's access level for one prospect.
///
/// Admin is full, always, regardless of team and ownership fields. A team
/// leader gets team access inside their team and falls back to ownership
/// (owner or creator, not assignment) outside it. Everyone else gets own
/// access only when assigned, owner, or creator.
#[must_use]
pub fn access_level(user: &UserProfile, prospect: &Prospect) -> AccessLevel {
    if user.role().is_admin() {
        return AccessLevel::Full;
    }

    let me = user.employee_id();
    let owns = prospect.owner_id.as_ref() == Some(me) || prospect.created_by.as_ref() == Some(me);

    if user.role().is_team_leader() {
        if user.team_id().is_some() && prospect.team_id.as_ref() == user.team_id() {
            return AccessLevel::Team;
        }
        if owns {
            return AccessLevel::Own;
        }
        return AccessLevel::None;
    }

    if prospect.assigned_to.as_ref() == Some(me) || owns {
        AccessLevel::Own
    } else {
        AccessLevel::None
    }
}

/// Returns whether the caller may edit or delete the prospect at all.
#[must_use]
pub fn can_edit(user: &UserProfile, prospect: &Prospect) -> bool {
    access_level(user, prospect) != AccessLevel::None
}

/// Returns whether the caller may reassign the prospect to a target user.
///
/// Full access reassigns anywhere; team access only within the caller's own
/// team; own access never reassigns.
#[must_use]
pub fn can_reassign(
    user: &UserProfile,
    prospect: &Prospect,
    target_team_id: Option<&TeamId>,
) -> bool {
    match access_level(user, prospect) {
        AccessLevel::Full => true,
        AccessLevel::Team => target_team_id.is_some() && target_team_id == user.team_id(),
        AccessLevel::Own | AccessLevel::None => false,
    }
}

#[cfg(test)]
mod tests {
    use ascend_core::{EmployeeId, TeamId};

    use super::{access_level, can_edit, can_reassign, AccessLevel};
    use crate::identity::UserProfile;
    use crate::prospect::{InterestLevel, LeadSource, Prospect, ProspectStatus};
    use crate::role::{PermissionSet, RoleName};

    fn user(role: &str, team: Option<&str>) -> UserProfile {
        UserProfile::new(
            EmployeeId::from_raw("me"),
            "Me",
            "me@example.com",
            RoleName::new(role),
            team.map(TeamId::from_raw),
            PermissionSet::empty(),
        )
    }

    fn prospect(team: Option<&str>, assigned: Option<&str>, owner: Option<&str>) -> Prospect {
        Prospect {
            id: "p-1".to_owned(),
            name: "P".to_owned(),
            phone: "1".to_owned(),
            email: String::new(),
            age: None,
            occupation: String::new(),
            instagram: String::new(),
            location: String::new(),
            status: ProspectStatus::New,
            interest_level: InterestLevel::Medium,
            lead_source: LeadSource::Other,
            follow_up_date: None,
            team_id: team.map(TeamId::from_raw),
            assigned_to: assigned.map(EmployeeId::from_raw),
            owner_id: owner.map(EmployeeId::from_raw),
            created_by: None,
            created_at: None,
            updated_at: None,
            notes: String::new(),
        }
    }

    #[test]
    fn admin_is_always_full() {
        let admin = user("Admin", None);
        for prospect in [
            prospect(Some("T2"), Some("other"), Some("other")),
            prospect(None, None, None),
        ] {
            assert_eq!(access_level(&admin, &prospect), AccessLevel::Full);
        }
    }

    #[test]
    fn team_leader_scopes_by_team_then_ownership() {
        let leader = user("Team Leader", Some("T1"));

        assert_eq!(
            access_level(&leader, &prospect(Some("T1"), None, Some("other"))),
            AccessLevel::Team
        );
        assert_eq!(
            access_level(&leader, &prospect(Some("T2"), None, Some("me"))),
            AccessLevel::Own
        );
        assert_eq!(
            access_level(&leader, &prospect(Some("T2"), None, Some("other"))),
            AccessLevel::None
        );
    }

    #[test]
    fn team_leader_assignment_alone_grants_nothing() {
        // Assignment is a member concept; the leader path only inspects
        // team, owner and creator.
        let leader = user("Team Leader", Some("T1"));
        assert_eq!(
            access_level(&leader, &prospect(Some("T2"), Some("me"), Some("other"))),
            AccessLevel::None
        );
    }

    #[test]
    fn leaderless_team_leader_never_gets_team_access() {
        let leader = user("Team Leader", None);
        assert_eq!(
            access_level(&leader, &prospect(None, None, Some("other"))),
            AccessLevel::None
        );
    }

    #[test]
    fn member_is_own_or_nothing() {
        let member = user("member", Some("T1"));

        assert_eq!(
            access_level(&member, &prospect(Some("T1"), Some("me"), None)),
            AccessLevel::Own
        );
        assert_eq!(
            access_level(&member, &prospect(Some("T1"), None, Some("me"))),
            AccessLevel::Own
        );
        // Same team is not enough for a member.
        assert_eq!(
            access_level(&member, &prospect(Some("T1"), Some("other"), Some("other"))),
            AccessLevel::None
        );
    }

    #[test]
    fn can_edit_tracks_access_level() {
        let member = user("member", None);
        assert!(can_edit(&member, &prospect(None, Some("me"), None)));
        assert!(!can_edit(&member, &prospect(None, Some("other"), None)));
    }

    #[test]
    fn reassignment_requires_full_or_same_team() {
        let admin = user("Admin", None);
        let leader = user("Team Leader", Some("T1"));
        let member = user("member", None);
        let in_team = prospect(Some("T1"), None, None);
        let t1 = TeamId::from_raw("T1");
        let t2 = TeamId::from_raw("T2");

        assert!(can_reassign(&admin, &in_team, Some(&t2)));
        assert!(can_reassign(&leader, &in_team, Some(&t1)));
        assert!(!can_reassign(&leader, &in_team, Some(&t2)));
        assert!(!can_reassign(&leader, &in_team, None));
        assert!(!can_reassign(&member, &prospect(None, Some("me"), None), Some(&t1)));
    }
}
