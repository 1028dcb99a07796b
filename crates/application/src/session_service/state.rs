use std::collections::HashMap;

use ascend_domain::{
    resolve_effective_grant, AccessError, AccessGrant, Activity, Employee, Lead, MessageTemplate,
    PermissionSet, Prospect, RoleDefinition, Team, UserProfile,
};

use super::scope::{prospect_scope_for, ProspectScope, ProspectSlice};
use crate::store_ports::{decode_snapshot, Snapshot};

/// One subscription delta, carrying the FULL current result set.
///
/// Handlers replace their whole slice from the snapshot; there is no
/// incremental patching anywhere, which makes delivery idempotent and
/// order-insensitive by construction.
#[derive(Debug)]
pub enum SessionEvent {
    /// A prospect-slice snapshot.
    Prospects {
        /// Which slice the subscription feeds.
        slice: ProspectSlice,
        /// Full current result set.
        snapshot: Snapshot,
    },
    /// Join-request snapshot.
    Leads(Snapshot),
    /// Active-employee snapshot.
    Employees(Snapshot),
    /// Team snapshot.
    Teams(Snapshot),
    /// Message-template snapshot.
    Templates(Snapshot),
    /// Recent-activity snapshot.
    Activities(Snapshot),
    /// The signed-in user's own access-grant records.
    AccessGrants(Snapshot),
    /// The role definition matching the user's current role name.
    RoleDefinition(Snapshot),
}

/// What the session runner must do after an event is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionDirective {
    /// Re-render the current page; data or permissions changed.
    Rerender,
    /// Access was revoked mid-session; sign out NOW, even mid-action.
    SignOut(AccessError),
    /// The data scope changed: tear down the prospect subscriptions and
    /// re-establish them for the new scope. `role_changed` additionally
    /// requires re-fetching the new role's permission document and moving
    /// the role-definition watch.
    ScopeChanged {
        /// Whether the role name itself changed (not just the team).
        role_changed: bool,
    },
}

/// The canonical in-memory mirror of everything the session subscribes to.
///
/// Event application is synchronous and allocation-cheap; all asynchronous
/// plumbing lives in the runner so this state machine is directly testable.
pub struct SessionState {
    user: UserProfile,
    scope: ProspectScope,
    primary: Vec<Prospect>,
    assigned: Vec<Prospect>,
    created: Vec<Prospect>,
    prospects: Vec<Prospect>,
    leads: Vec<Lead>,
    employees: Vec<Employee>,
    teams: Vec<Team>,
    templates: Vec<MessageTemplate>,
    activities: Vec<Activity>,
}

impl SessionState {
    /// Creates session state for a freshly resolved user.
    #[must_use]
    pub fn new(user: UserProfile) -> Self {
        let scope = prospect_scope_for(&user);
        Self {
            user,
            scope,
            primary: Vec::new(),
            assigned: Vec::new(),
            created: Vec::new(),
            prospects: Vec::new(),
            leads: Vec::new(),
            employees: Vec::new(),
            teams: Vec::new(),
            templates: Vec::new(),
            activities: Vec::new(),
        }
    }

    /// Returns the live user profile.
    #[must_use]
    pub fn user(&self) -> &UserProfile {
        &self.user
    }

    /// Returns the current prospect data scope.
    #[must_use]
    pub fn scope(&self) -> &ProspectScope {
        &self.scope
    }

    /// Returns the merged canonical prospect list, newest first.
    #[must_use]
    pub fn prospects(&self) -> &[Prospect] {
        &self.prospects
    }

    /// Finds one canonical prospect by document id.
    #[must_use]
    pub fn prospect(&self, id: &str) -> Option<&Prospect> {
        self.prospects.iter().find(|prospect| prospect.id == id)
    }

    /// Returns the canonical lead list.
    #[must_use]
    pub fn leads(&self) -> &[Lead] {
        &self.leads
    }

    /// Finds one lead by document id.
    #[must_use]
    pub fn lead(&self, id: &str) -> Option<&Lead> {
        self.leads.iter().find(|lead| lead.id == id)
    }

    /// Returns the active employees.
    #[must_use]
    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    /// Returns the teams.
    #[must_use]
    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    /// Finds one team by document id.
    #[must_use]
    pub fn team(&self, id: &str) -> Option<&Team> {
        self.teams.iter().find(|team| team.id == id)
    }

    /// Returns the message templates.
    #[must_use]
    pub fn templates(&self) -> &[MessageTemplate] {
        &self.templates
    }

    /// Finds one template by document id.
    #[must_use]
    pub fn template(&self, id: &str) -> Option<&MessageTemplate> {
        self.templates.iter().find(|template| template.id == id)
    }

    /// Returns the recent activities.
    #[must_use]
    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }

    /// Overwrites the user's permission map (role-definition refetch path).
    pub fn set_permissions(&mut self, permissions: PermissionSet) {
        self.user.set_permissions(permissions);
    }

    /// Applies one subscription event and reports what must happen next.
    pub fn apply(&mut self, event: SessionEvent) -> Vec<SessionDirective> {
        match event {
            SessionEvent::Prospects { slice, snapshot } => {
                let decoded = decode_snapshot(snapshot);
                match slice {
                    ProspectSlice::Primary => self.primary = decoded,
                    ProspectSlice::Assigned => self.assigned = decoded,
                    ProspectSlice::Created => self.created = decoded,
                }
                self.rebuild_canonical();
                vec![SessionDirective::Rerender]
            }
            SessionEvent::Leads(snapshot) => {
                self.leads = decode_snapshot(snapshot);
                vec![SessionDirective::Rerender]
            }
            SessionEvent::Employees(snapshot) => {
                self.employees = decode_snapshot(snapshot);
                vec![SessionDirective::Rerender]
            }
            SessionEvent::Teams(snapshot) => {
                self.teams = decode_snapshot(snapshot);
                vec![SessionDirective::Rerender]
            }
            SessionEvent::Templates(snapshot) => {
                self.templates = decode_snapshot(snapshot);
                vec![SessionDirective::Rerender]
            }
            SessionEvent::Activities(snapshot) => {
                self.activities = decode_snapshot(snapshot);
                vec![SessionDirective::Rerender]
            }
            SessionEvent::AccessGrants(snapshot) => self.apply_grants(snapshot),
            SessionEvent::RoleDefinition(snapshot) => self.apply_role_definition(snapshot),
        }
    }

    /// Re-runs the grant-veto resolution against a fresh snapshot.
    fn apply_grants(&mut self, snapshot: Snapshot) -> Vec<SessionDirective> {
        let grants: Vec<AccessGrant> = decode_snapshot(snapshot);

        let effective = match resolve_effective_grant(&grants) {
            Ok(grant) => grant.clone(),
            Err(error) => return vec![SessionDirective::SignOut(error)],
        };

        let role_changed = &effective.role != self.user.role();
        let team_changed = effective.team_id.as_ref() != self.user.team_id();
        if !role_changed && !team_changed {
            return Vec::new();
        }

        self.user.apply_grant(&effective);
        self.scope = prospect_scope_for(&self.user);
        self.primary.clear();
        self.assigned.clear();
        self.created.clear();
        self.rebuild_canonical();

        vec![
            SessionDirective::ScopeChanged { role_changed },
            SessionDirective::Rerender,
        ]
    }

    /// Overwrites the in-memory permission map from a role-definition delta.
    fn apply_role_definition(&mut self, snapshot: Snapshot) -> Vec<SessionDirective> {
        let definitions: Vec<RoleDefinition> = decode_snapshot(snapshot);
        let permissions = definitions
            .into_iter()
            .find(|definition| &definition.role == self.user.role())
            .map(|definition| definition.permissions)
            .unwrap_or_else(PermissionSet::empty);

        self.user.set_permissions(permissions);
        vec![SessionDirective::Rerender]
    }

    /// Recomputes the canonical list from all currently held slices.
    ///
    /// Always a full recompute, never an incremental patch: the cost is
    /// acceptable at this scale and it makes repeated or out-of-order
    /// delivery harmless.
    fn rebuild_canonical(&mut self) {
        self.prospects = match &self.scope {
            ProspectScope::All | ProspectScope::Team(_) => {
                let mut list = self.primary.clone();
                sort_newest_first(&mut list);
                list
            }
            ProspectScope::Mine(_) => merge_member_slices(&self.assigned, &self.created),
            ProspectScope::Empty => Vec::new(),
        };
    }
}

/// Union of the two member slices: de-duplicated by id with the later
/// occurrence winning, then resorted newest-first.
#[must_use]
pub fn merge_member_slices(assigned: &[Prospect], created: &[Prospect]) -> Vec<Prospect> {
    let mut merged: Vec<Prospect> = Vec::with_capacity(assigned.len() + created.len());
    let mut index_by_id: HashMap<String, usize> = HashMap::new();

    for prospect in assigned.iter().chain(created.iter()) {
        match index_by_id.get(&prospect.id) {
            Some(&index) => merged[index] = prospect.clone(),
            None => {
                index_by_id.insert(prospect.id.clone(), merged.len());
                merged.push(prospect.clone());
            }
        }
    }

    sort_newest_first(&mut merged);
    merged
}

/// Stable newest-first sort; a missing `createdAt` sorts as the earliest
/// possible time and therefore sinks to the bottom.
fn sort_newest_first(prospects: &mut [Prospect]) {
    prospects.sort_by(|left, right| right.created_sort_key().cmp(&left.created_sort_key()));
}
