//! The access-scoped view controller.
//!
//! Central coordinator: owns the current page, recomputes the full render
//! model whenever asked, and routes every mutating user action through the
//! permission map AND the entity access level before touching the store.
//! Canonical data is never mutated locally; every change round-trips through
//! the backend and comes back as a subscription echo.

mod actions;
mod pages;
mod render;


use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ascend_core::{AppError, AppResult};
use ascend_domain::{Capability, PermissionModule};
use chrono::Utc;
use tokio::sync::Mutex;

pub use actions::{NewProspectInput, ProspectUpdate, ReportKind, TeamDraft, TemplateDraft};
pub use pages::{nav_visible, page_viewable, Page};
pub use render::{
    AnalyticsView, AssigneeOption, DashboardView, DataManagementView, LeadRow, NavItem, Notice,
    NoticeKind, PageView, ProspectRow, RenderModel, TeamRow, TemplatesView,
};

use crate::data_service::{BatchConfig, DataAdminService};
use crate::session_service::CrmSession;

/// Coordinates rendering and gated mutations for one session.
pub struct ViewController {
    session: Arc<CrmSession>,
    data: DataAdminService,
    current_page: Mutex<Page>,
    loading: AtomicUsize,
    notices: Mutex<Vec<Notice>>,
}

impl ViewController {
    /// Creates a controller for a live session, landing on the dashboard.
    #[must_use]
    pub fn new(session: Arc<CrmSession>, batch: BatchConfig) -> Self {
        let data = DataAdminService::new(session.store(), batch);
        Self {
            session,
            data,
            current_page: Mutex::new(Page::Dashboard),
            loading: AtomicUsize::new(0),
            notices: Mutex::new(Vec::new()),
        }
    }

    /// Returns the underlying session.
    #[must_use]
    pub fn session(&self) -> &Arc<CrmSession> {
        &self.session
    }

    /// Returns the page currently shown.
    pub async fn current_page(&self) -> Page {
        *self.current_page.lock().await
    }

    /// Navigates to a page and renders it.
    ///
    /// Navigation itself is never blocked: a page the user cannot view
    /// renders the terminal access-denied placeholder in place of its body.
    /// The one redirect is the denied DASHBOARD, which falls through to the
    /// first nav-visible page; with nothing visible it stays put (dead end).
    pub async fn navigate_to(&self, page: Page) -> RenderModel {
        let target = if page == Page::Dashboard {
            let permissions = self
                .session
                .with_state(|state| state.user().permissions().clone())
                .await;
            if pages::page_viewable(&permissions, Page::Dashboard) {
                Page::Dashboard
            } else {
                Page::all()
                    .iter()
                    .copied()
                    .filter(|candidate| *candidate != Page::Dashboard)
                    .find(|candidate| pages::nav_visible(&permissions, *candidate))
                    .unwrap_or(Page::Dashboard)
            }
        } else {
            page
        };

        *self.current_page.lock().await = target;
        self.render().await
    }

    /// Recomputes the full render model for the current page.
    ///
    /// A complete idempotent overwrite every time; callers re-invoke it on
    /// every render signal without accumulating anything.
    pub async fn render(&self) -> RenderModel {
        let page = *self.current_page.lock().await;
        let notices = self.notices.lock().await.clone();
        let loading = self.loading.load(Ordering::SeqCst) > 0;

        self.session
            .with_state(|state| RenderModel {
                nav: render::build_nav(state),
                page,
                body: render::build_page_view(state, page, Utc::now()),
                loading,
                notices,
                user_name: state.user().name().to_owned(),
                role: state.user().role().as_str().to_owned(),
            })
            .await
    }

    /// Drains pending transient notices.
    pub async fn take_notices(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.lock().await)
    }

    /// Re-checks a module capability against the LIVE permission map.
    ///
    /// Every action calls this itself instead of trusting that its trigger
    /// button was visible; permissions may have changed since the render.
    async fn guard(&self, module: PermissionModule, capability: Capability) -> AppResult<()> {
        let allowed = self
            .session
            .with_state(|state| {
                state
                    .user()
                    .permissions()
                    .capabilities_for(module)
                    .allows(capability)
            })
            .await;

        if allowed {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "missing '{}' capability for '{}'",
                capability.as_str(),
                module.as_str()
            )))
        }
    }

    fn begin_action(&self) {
        self.loading.fetch_add(1, Ordering::SeqCst);
    }

    /// Clears the loading indicator and turns the outcome into a notice.
    ///
    /// Errors are isolated per action: they are logged, surfaced, and
    /// returned, but nothing else in the session is torn down.
    async fn finish_action<T>(
        &self,
        success: Option<&str>,
        result: AppResult<T>,
    ) -> AppResult<T> {
        self.loading.fetch_sub(1, Ordering::SeqCst);
        let mut notices = self.notices.lock().await;
        match &result {
            Ok(_) => {
                if let Some(text) = success {
                    notices.push(Notice {
                        kind: NoticeKind::Success,
                        text: text.to_owned(),
                    });
                }
            }
            Err(error) => {
                tracing::warn!(%error, "action failed");
                notices.push(Notice {
                    kind: NoticeKind::Error,
                    text: error.to_string(),
                });
            }
        }

        result
    }
}
