use ascend_domain::{PermissionModule, PermissionSet};

/// The navigable pages, in nav-menu order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    /// Landing dashboard.
    Dashboard,
    /// Prospect pipeline table.
    Prospects,
    /// Add-prospect form.
    AddProspect,
    /// Analytics, funnel and leaderboard.
    Analytics,
    /// Import/export/backup tools.
    DataManagement,
    /// Raw join-request triage.
    LeadManagement,
    /// Message templates and bulk sends.
    Templates,
    /// Team administration.
    Teams,
}

impl Page {
    /// All pages in nav order; dashboard-denied redirects scan this order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Page] = &[
            Page::Dashboard,
            Page::Prospects,
            Page::AddProspect,
            Page::Analytics,
            Page::DataManagement,
            Page::LeadManagement,
            Page::Templates,
            Page::Teams,
        ];

        ALL
    }

    /// The permission module gating this page.
    #[must_use]
    pub fn module(&self) -> PermissionModule {
        match self {
            Self::Dashboard => PermissionModule::CrmDashboard,
            Self::Prospects | Self::AddProspect => PermissionModule::ProspectManagement,
            Self::Analytics => PermissionModule::Analytics,
            Self::DataManagement => PermissionModule::DataManagement,
            Self::LeadManagement => PermissionModule::LeadManagement,
            Self::Templates => PermissionModule::WhatsappTemplates,
            Self::Teams => PermissionModule::TeamManagement,
        }
    }

    /// Header title.
    #[must_use]
    pub fn title(&self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Prospects => "Prospects",
            Self::AddProspect => "Add Prospect",
            Self::Analytics => "Analytics",
            Self::DataManagement => "Data Management",
            Self::LeadManagement => "Lead Management",
            Self::Templates => "Messaging",
            Self::Teams => "Teams",
        }
    }
}

/// Whether the nav item for a page shows at all.
///
/// "Has some access", not "has view access": a delete-only module still
/// shows its item. The dashboard shows unless an explicit `crm_dashboard`
/// entry exists and grants nothing.
#[must_use]
pub fn nav_visible(permissions: &PermissionSet, page: Page) -> bool {
    match page {
        Page::Dashboard => dashboard_viewable(permissions),
        _ => permissions.capabilities_for(page.module()).grants_any(),
    }
}

/// Whether the page BODY may render.
///
/// Checked at render time, not just at menu time: a stale link to a hidden
/// page must still hit the access-denied placeholder.
#[must_use]
pub fn page_viewable(permissions: &PermissionSet, page: Page) -> bool {
    match page {
        Page::Dashboard => dashboard_viewable(permissions),
        _ => permissions.capabilities_for(page.module()).view,
    }
}

/// Dashboard visibility: allowed by default, deniable only explicitly.
fn dashboard_viewable(permissions: &PermissionSet) -> bool {
    if permissions.has_entry(PermissionModule::CrmDashboard) {
        permissions
            .capabilities_for(PermissionModule::CrmDashboard)
            .view
    } else {
        true
    }
}

#[cfg(test)]
mod tests {
    use ascend_domain::{Capabilities, PermissionModule, PermissionSet};

    use super::{nav_visible, page_viewable, Page};

    #[test]
    fn dashboard_defaults_open_without_an_explicit_entry() {
        let permissions = PermissionSet::empty();
        assert!(nav_visible(&permissions, Page::Dashboard));
        assert!(page_viewable(&permissions, Page::Dashboard));
    }

    #[test]
    fn explicit_dashboard_denial_wins_over_the_default() {
        let permissions = PermissionSet::from_entries([(
            PermissionModule::CrmDashboard,
            Capabilities::NONE,
        )]);
        assert!(!page_viewable(&permissions, Page::Dashboard));
    }

    #[test]
    fn delete_only_module_shows_nav_but_not_the_body() {
        let permissions = PermissionSet::from_entries([(
            PermissionModule::LeadManagement,
            Capabilities {
                delete: true,
                ..Capabilities::NONE
            },
        )]);
        assert!(nav_visible(&permissions, Page::LeadManagement));
        assert!(!page_viewable(&permissions, Page::LeadManagement));
    }

    #[test]
    fn prospect_pages_share_one_module() {
        assert_eq!(
            Page::Prospects.module(),
            PermissionModule::ProspectManagement
        );
        assert_eq!(
            Page::AddProspect.module(),
            PermissionModule::ProspectManagement
        );
    }
}
