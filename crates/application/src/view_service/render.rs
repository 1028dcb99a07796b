//! Full-overwrite render models.
//!
//! Every render recomputes the complete model from the canonical state; it is
//! safe to call repeatedly and rapidly (every subscription delta may trigger
//! one) because nothing here appends to or patches a previous render.

use ascend_core::EmployeeId;
use ascend_domain::metrics::{
    analytics_summary, dashboard_metrics, funnel_counts, leaderboard, monthly_additions,
    AnalyticsSummary, DashboardMetrics, LeaderboardEntry, MonthlyAdditions,
};
use ascend_domain::{
    access_level, AccessLevel, Capability, Employee, Lead, LeadSource, MessageTemplate,
    Prospect, ProspectStatus, Team,
};
use chrono::{DateTime, Utc};

use super::pages::{nav_visible, page_viewable, Page};
use crate::session_service::SessionState;

/// A transient user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Whether this is a success or an error notice.
    pub kind: NoticeKind,
    /// Message text.
    pub text: String,
}

/// Notice severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// Action completed.
    Success,
    /// Action failed; state returned to its pre-action shape.
    Error,
}

/// One nav menu entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavItem {
    /// Target page.
    pub page: Page,
    /// Whether the item renders at all.
    pub visible: bool,
}

/// One prospect table row with its per-row affordances.
#[derive(Debug, Clone, PartialEq)]
pub struct ProspectRow {
    /// The prospect.
    pub prospect: Prospect,
    /// Display name of the assignee.
    pub assigned_name: String,
    /// Entity access level resolved for the current user.
    pub access: AccessLevel,
    /// Whether the edit button (and status dropdown) renders.
    pub can_edit: bool,
    /// Whether the delete button renders.
    pub can_delete: bool,
}

/// One lead table row.
#[derive(Debug, Clone, PartialEq)]
pub struct LeadRow {
    /// The lead.
    pub lead: Lead,
    /// Whether the transfer button renders.
    pub can_transfer: bool,
    /// Whether the delete button renders.
    pub can_delete: bool,
}

/// One team table row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamRow {
    /// The team.
    pub team: Team,
    /// Leader display name.
    pub leader_name: String,
    /// Whether the edit button renders.
    pub can_edit: bool,
    /// Whether the delete button renders.
    pub can_delete: bool,
}

/// An assignment picker option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssigneeOption {
    /// Employee id submitted with the form.
    pub employee_id: EmployeeId,
    /// Picker label, e.g. `Jane Doe (E042)`.
    pub label: String,
}

/// Dashboard page content.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    /// Headline counters and growth.
    pub metrics: DashboardMetrics,
    /// Trailing-month additions for the growth chart.
    pub monthly: Vec<MonthlyAdditions>,
    /// Status distribution for the doughnut chart.
    pub status_counts: Vec<(ProspectStatus, usize)>,
    /// Source distribution for the bar chart.
    pub source_counts: Vec<(LeadSource, usize)>,
}

/// Analytics page content.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsView {
    /// Summary rates.
    pub summary: AnalyticsSummary,
    /// Funnel counts, new through joined.
    pub funnel: Vec<(ProspectStatus, usize)>,
    /// Top-five leaderboard.
    pub leaderboard: Vec<LeaderboardEntry>,
}

/// Data-management page affordances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataManagementView {
    /// CSV/report export allowed.
    pub can_export: bool,
    /// CSV import allowed.
    pub can_import: bool,
    /// Backup creation allowed.
    pub can_backup: bool,
    /// Restore allowed.
    pub can_restore: bool,
    /// Clear-all allowed.
    pub can_clear: bool,
}

/// Templates page content.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplatesView {
    /// The template cards.
    pub templates: Vec<MessageTemplate>,
    /// Create allowed.
    pub can_add: bool,
    /// Edit allowed.
    pub can_edit: bool,
    /// Delete allowed.
    pub can_delete: bool,
}

/// The rendered body of the current page.
#[derive(Debug, Clone, PartialEq)]
pub enum PageView {
    /// Dashboard.
    Dashboard(DashboardView),
    /// Prospect table.
    Prospects(Vec<ProspectRow>),
    /// Add-prospect form with its assignment picker.
    AddProspect(Vec<AssigneeOption>),
    /// Analytics.
    Analytics(AnalyticsView),
    /// Data management tools.
    DataManagement(DataManagementView),
    /// Lead triage table.
    LeadManagement(Vec<LeadRow>),
    /// Template management.
    Templates(TemplatesView),
    /// Team administration; the bool is the add-team affordance.
    Teams(Vec<TeamRow>, bool),
    /// Terminal access-denied placeholder rendered IN PLACE of the body.
    AccessDenied(Page),
}

/// A complete render of the application shell.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderModel {
    /// Nav menu with visibility flags.
    pub nav: Vec<NavItem>,
    /// Current page identifier.
    pub page: Page,
    /// Rendered page body (or the access-denied placeholder).
    pub body: PageView,
    /// Whether a mutation is in flight.
    pub loading: bool,
    /// Pending transient notices.
    pub notices: Vec<Notice>,
    /// Signed-in user display name.
    pub user_name: String,
    /// Signed-in user role designation.
    pub role: String,
}

fn assigned_display_name(employees: &[Employee], id: Option<&EmployeeId>) -> String {
    let Some(id) = id else {
        return "Unassigned".to_owned();
    };

    employees
        .iter()
        .find(|employee| &employee.id == id)
        .map(|employee| employee.full_name.clone())
        .unwrap_or_else(|| "Unknown".to_owned())
}

/// Builds the body for one page from the canonical state.
#[must_use]
pub fn build_page_view(state: &SessionState, page: Page, now: DateTime<Utc>) -> PageView {
    let user = state.user();
    let permissions = user.permissions();

    if !page_viewable(permissions, page) {
        return PageView::AccessDenied(page);
    }

    match page {
        Page::Dashboard => PageView::Dashboard(DashboardView {
            metrics: dashboard_metrics(state.prospects(), state.employees(), now),
            monthly: monthly_additions(state.prospects(), now),
            status_counts: ascend_domain::metrics::status_distribution(state.prospects())
                .into_iter()
                .collect(),
            source_counts: ascend_domain::metrics::source_distribution(state.prospects())
                .into_iter()
                .collect(),
        }),
        Page::Prospects => {
            let capabilities = permissions.capabilities_for(page.module());
            PageView::Prospects(
                state
                    .prospects()
                    .iter()
                    .map(|prospect| {
                        let access = access_level(user, prospect);
                        ProspectRow {
                            assigned_name: assigned_display_name(
                                state.employees(),
                                prospect.assigned_to.as_ref(),
                            ),
                            access,
                            // Row buttons need BOTH the module capability and
                            // entity-level access; neither alone is enough.
                            can_edit: capabilities.allows(Capability::Edit)
                                && access != AccessLevel::None,
                            can_delete: capabilities.allows(Capability::Delete)
                                && access != AccessLevel::None,
                            prospect: prospect.clone(),
                        }
                    })
                    .collect(),
            )
        }
        Page::AddProspect => PageView::AddProspect(
            state
                .employees()
                .iter()
                .filter(|employee| employee.is_active())
                .map(|employee| AssigneeOption {
                    employee_id: employee.id.clone(),
                    label: employee.display_label(),
                })
                .collect(),
        ),
        Page::Analytics => PageView::Analytics(AnalyticsView {
            summary: analytics_summary(state.prospects()),
            funnel: funnel_counts(state.prospects()),
            leaderboard: leaderboard(state.employees(), state.prospects()),
        }),
        Page::DataManagement => {
            let capabilities = permissions.capabilities_for(page.module());
            PageView::DataManagement(DataManagementView {
                can_export: capabilities.view,
                can_import: capabilities.add,
                can_backup: capabilities.view,
                can_restore: capabilities.edit,
                can_clear: capabilities.delete,
            })
        }
        Page::LeadManagement => {
            let capabilities = permissions.capabilities_for(page.module());
            PageView::LeadManagement(
                state
                    .leads()
                    .iter()
                    .map(|lead| LeadRow {
                        lead: lead.clone(),
                        can_transfer: capabilities.edit,
                        can_delete: capabilities.delete,
                    })
                    .collect(),
            )
        }
        Page::Templates => {
            let capabilities = permissions.capabilities_for(page.module());
            PageView::Templates(TemplatesView {
                templates: state.templates().to_vec(),
                can_add: capabilities.add,
                can_edit: capabilities.edit,
                can_delete: capabilities.delete,
            })
        }
        Page::Teams => {
            let capabilities = permissions.capabilities_for(page.module());
            PageView::Teams(
                state
                    .teams()
                    .iter()
                    .map(|team| TeamRow {
                        team: team.clone(),
                        leader_name: assigned_display_name(
                            state.employees(),
                            team.leader_id.as_ref(),
                        ),
                        can_edit: capabilities.edit,
                        can_delete: capabilities.delete,
                    })
                    .collect(),
                capabilities.add,
            )
        }
    }
}

/// Builds the nav menu for the current permission map.
#[must_use]
pub fn build_nav(state: &SessionState) -> Vec<NavItem> {
    Page::all()
        .iter()
        .map(|page| NavItem {
            page: *page,
            visible: nav_visible(state.user().permissions(), *page),
        })
        .collect()
}
