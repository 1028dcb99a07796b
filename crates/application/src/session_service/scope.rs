use ascend_core::{EmployeeId, TeamId};
use ascend_domain::UserProfile;
use serde_json::json;

use crate::store_ports::{collections, Query};

/// Which slice of the prospect collection a subscription feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProspectSlice {
    /// The single subscription used by admin and team-leader scopes.
    Primary,
    /// Prospects assigned to the member.
    Assigned,
    /// Prospects created by the member.
    Created,
}

/// Data scope derived from the ROLE STRING, not from the capability map.
///
/// This is one half of the dual authorization mechanism: the permission map
/// gates what the UI offers, while this scope decides which records are even
/// fetched. Keep them separate; they are tested separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProspectScope {
    /// Admin: everything.
    All,
    /// Team leader with a team: the team's prospects.
    Team(TeamId),
    /// Rank-and-file: union of assigned and created prospects.
    Mine(EmployeeId),
    /// Team leader without a team: nothing at all, no subscription.
    Empty,
}

/// Derives the prospect data scope for a resolved user.
#[must_use]
pub fn prospect_scope_for(user: &UserProfile) -> ProspectScope {
    if user.role().is_admin() {
        return ProspectScope::All;
    }

    if user.role().is_team_leader() {
        return match user.team_id() {
            Some(team_id) => ProspectScope::Team(team_id.clone()),
            None => ProspectScope::Empty,
        };
    }

    ProspectScope::Mine(user.employee_id().clone())
}

/// Builds the live queries backing a scope, labeled by slice.
#[must_use]
pub fn scope_queries(scope: &ProspectScope) -> Vec<(ProspectSlice, Query)> {
    match scope {
        ProspectScope::All => vec![(
            ProspectSlice::Primary,
            Query::collection(collections::PROSPECTS).order_by_desc("createdAt"),
        )],
        ProspectScope::Team(team_id) => vec![(
            ProspectSlice::Primary,
            Query::collection(collections::PROSPECTS)
                .where_eq("teamId", json!(team_id.as_str()))
                .order_by_desc("createdAt"),
        )],
        ProspectScope::Mine(employee_id) => vec![
            (
                ProspectSlice::Assigned,
                Query::collection(collections::PROSPECTS)
                    .where_eq("assignedTo", json!(employee_id.as_str())),
            ),
            (
                ProspectSlice::Created,
                Query::collection(collections::PROSPECTS)
                    .where_eq("createdBy", json!(employee_id.as_str())),
            ),
        ],
        ProspectScope::Empty => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use ascend_core::{EmployeeId, TeamId};
    use ascend_domain::{PermissionSet, RoleName, UserProfile};

    use super::{prospect_scope_for, scope_queries, ProspectScope, ProspectSlice};

    fn user(role: &str, team: Option<&str>) -> UserProfile {
        UserProfile::new(
            EmployeeId::from_raw("emp-1"),
            "U",
            "u@example.com",
            RoleName::new(role),
            team.map(TeamId::from_raw),
            PermissionSet::empty(),
        )
    }

    #[test]
    fn admin_sees_everything_with_one_query() {
        let scope = prospect_scope_for(&user("Admin", Some("t-1")));
        assert_eq!(scope, ProspectScope::All);
        let queries = scope_queries(&scope);
        assert_eq!(queries.len(), 1);
        assert!(queries[0].1.filters.is_empty());
    }

    #[test]
    fn team_leader_is_filtered_to_their_team() {
        let scope = prospect_scope_for(&user("Team Leader", Some("t-1")));
        assert_eq!(scope, ProspectScope::Team(TeamId::from_raw("t-1")));
        let queries = scope_queries(&scope);
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].1.filters[0].field, "teamId");
    }

    #[test]
    fn teamless_leader_gets_no_subscription_at_all() {
        let scope = prospect_scope_for(&user("Team Leader", None));
        assert_eq!(scope, ProspectScope::Empty);
        assert!(scope_queries(&scope).is_empty());
    }

    #[test]
    fn member_gets_two_independent_subscriptions() {
        let scope = prospect_scope_for(&user("member", Some("t-1")));
        let queries = scope_queries(&scope);
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0].0, ProspectSlice::Assigned);
        assert_eq!(queries[0].1.filters[0].field, "assignedTo");
        assert_eq!(queries[1].0, ProspectSlice::Created);
        assert_eq!(queries[1].1.filters[0].field, "createdBy");
    }
}
