//! The scoped subscription manager.
//!
//! Owns every live query for the session: the role-scoped prospect
//! subscriptions, the reference collections, and the two revocation watches
//! (the user's own access grants and the current role's definition). All
//! snapshots funnel through one event pump into [`SessionState`], so user
//! actions and subscription deltas interleave without locks beyond the state
//! cell.

mod scope;
mod state;


use std::sync::Arc;

use ascend_core::{AppError, AppResult};
use ascend_domain::{AccessError, UserProfile};
use serde_json::json;
use tokio::sync::{mpsc, watch, Mutex, RwLock};
use tokio::task::JoinHandle;

pub use scope::{prospect_scope_for, scope_queries, ProspectScope, ProspectSlice};
pub use state::{merge_member_slices, SessionDirective, SessionEvent, SessionState};

use crate::auth_ports::AuthGateway;
use crate::identity_service::IdentityResolver;
use crate::store_ports::{collections, DocumentStore, Query, Snapshot, SnapshotReceiver};

/// Whether the session is still live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    /// Subscriptions are running.
    Active,
    /// The session is over; `reason` is set on forced sign-out.
    Ended {
        /// Access failure that forced the sign-out, if any.
        reason: Option<AccessError>,
    },
}

#[derive(Default)]
struct TaskSet {
    prospect: Vec<JoinHandle<()>>,
    role_watch: Option<JoinHandle<()>>,
    fixed: Vec<JoinHandle<()>>,
    pump: Option<JoinHandle<()>>,
}

impl TaskSet {
    fn abort_prospect(&mut self) {
        for task in self.prospect.drain(..) {
            task.abort();
        }
    }

    fn abort_all(&mut self) {
        self.abort_prospect();
        if let Some(task) = self.role_watch.take() {
            task.abort();
        }
        for task in self.fixed.drain(..) {
            task.abort();
        }
    }
}

/// A live CRM session: canonical state plus the subscriptions feeding it.
pub struct CrmSession {
    store: Arc<dyn DocumentStore>,
    auth: Arc<dyn AuthGateway>,
    resolver: IdentityResolver,
    state: RwLock<SessionState>,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    render_tx: watch::Sender<u64>,
    phase_tx: watch::Sender<SessionPhase>,
    tasks: Mutex<TaskSet>,
}

impl CrmSession {
    /// Starts a session for a resolved user: opens every subscription and
    /// spawns the event pump.
    pub async fn start(
        store: Arc<dyn DocumentStore>,
        auth: Arc<dyn AuthGateway>,
        user: UserProfile,
    ) -> AppResult<Arc<Self>> {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (render_tx, _) = watch::channel(0_u64);
        let (phase_tx, _) = watch::channel(SessionPhase::Active);

        let session = Arc::new(Self {
            store: Arc::clone(&store),
            auth,
            resolver: IdentityResolver::new(store),
            state: RwLock::new(SessionState::new(user)),
            events_tx,
            render_tx,
            phase_tx,
            tasks: Mutex::new(TaskSet::default()),
        });

        session.subscribe_prospect_slices().await?;
        session.subscribe_reference_collections().await?;
        session.subscribe_revocation_watches().await?;
        session.spawn_pump(events_rx).await;

        Ok(session)
    }

    /// Runs a closure against the current session state.
    pub async fn with_state<R>(&self, read: impl FnOnce(&SessionState) -> R) -> R {
        read(&*self.state.read().await)
    }

    /// Returns a clone of the live user profile.
    pub async fn user(&self) -> UserProfile {
        self.state.read().await.user().clone()
    }

    /// Returns the document store behind this session.
    #[must_use]
    pub fn store(&self) -> Arc<dyn DocumentStore> {
        Arc::clone(&self.store)
    }

    /// Returns a receiver that ticks whenever the UI must re-render.
    #[must_use]
    pub fn render_signal(&self) -> watch::Receiver<u64> {
        self.render_tx.subscribe()
    }

    /// Returns a receiver tracking whether the session is still live.
    #[must_use]
    pub fn phase(&self) -> watch::Receiver<SessionPhase> {
        self.phase_tx.subscribe()
    }

    /// Explicit logout: cancels every subscription and ends the provider
    /// session. Safe to call more than once.
    pub async fn sign_out(&self) -> AppResult<()> {
        self.end_session(None).await;
        if let Some(task) = self.tasks.lock().await.pump.take() {
            task.abort();
        }
        Ok(())
    }

    async fn end_session(&self, reason: Option<AccessError>) {
        self.tasks.lock().await.abort_all();
        self.phase_tx.send_replace(SessionPhase::Ended { reason });
        if let Err(error) = self.auth.sign_out().await {
            tracing::warn!(%error, "provider sign-out failed");
        }
    }

    fn spawn_forwarder(
        &self,
        mut receiver: SnapshotReceiver,
        wrap: impl Fn(Snapshot) -> SessionEvent + Send + 'static,
    ) -> JoinHandle<()> {
        let events_tx = self.events_tx.clone();
        tokio::spawn(async move {
            while let Some(snapshot) = receiver.recv().await {
                if events_tx.send(wrap(snapshot)).is_err() {
                    break;
                }
            }
        })
    }

    /// Opens the role-scoped prospect subscriptions for the current scope.
    async fn subscribe_prospect_slices(&self) -> AppResult<()> {
        let queries = {
            let state = self.state.read().await;
            scope_queries(state.scope())
        };

        let mut handles = Vec::with_capacity(queries.len());
        for (slice, query) in queries {
            let receiver = self.store.subscribe(&query).await?;
            handles.push(self.spawn_forwarder(receiver, move |snapshot| {
                SessionEvent::Prospects { slice, snapshot }
            }));
        }

        self.tasks.lock().await.prospect.extend(handles);
        Ok(())
    }

    /// Opens the reference-collection subscriptions (employees, leads,
    /// teams, templates, activities). These live for the whole session.
    async fn subscribe_reference_collections(&self) -> AppResult<()> {
        let subscriptions: Vec<(Query, fn(Snapshot) -> SessionEvent)> = vec![
            (
                Query::collection(collections::EMPLOYEES).where_eq("status", json!("Active")),
                SessionEvent::Employees,
            ),
            (
                Query::collection(collections::JOIN_REQUESTS),
                SessionEvent::Leads,
            ),
            (Query::collection(collections::TEAMS), SessionEvent::Teams),
            (
                Query::collection(collections::TEMPLATES).order_by_desc("updatedAt"),
                SessionEvent::Templates,
            ),
            (
                Query::collection(collections::ACTIVITIES).order_by_desc("timestamp"),
                SessionEvent::Activities,
            ),
        ];

        let mut handles = Vec::with_capacity(subscriptions.len());
        for (query, wrap) in subscriptions {
            let receiver = self.store.subscribe(&query).await?;
            handles.push(self.spawn_forwarder(receiver, wrap));
        }

        self.tasks.lock().await.fixed.extend(handles);
        Ok(())
    }

    /// Opens the two revocation watches: own grants and current role
    /// definition.
    async fn subscribe_revocation_watches(&self) -> AppResult<()> {
        let (employee_id, role) = {
            let state = self.state.read().await;
            (
                state.user().employee_id().clone(),
                state.user().role().clone(),
            )
        };

        let grants_receiver = self
            .store
            .subscribe(
                &Query::collection(collections::ACCESS_GRANTS)
                    .where_eq("employeeId", json!(employee_id.as_str())),
            )
            .await?;
        let grants_task = self.spawn_forwarder(grants_receiver, SessionEvent::AccessGrants);
        self.tasks.lock().await.fixed.push(grants_task);

        self.resubscribe_role_watch(role.as_str()).await
    }

    async fn resubscribe_role_watch(&self, role: &str) -> AppResult<()> {
        let receiver = self
            .store
            .subscribe(
                &Query::collection(collections::ROLE_DEFINITIONS).where_eq("role", json!(role)),
            )
            .await?;
        let task = self.spawn_forwarder(receiver, SessionEvent::RoleDefinition);

        let mut tasks = self.tasks.lock().await;
        if let Some(previous) = tasks.role_watch.replace(task) {
            previous.abort();
        }

        Ok(())
    }

    async fn spawn_pump(self: &Arc<Self>, mut events_rx: mpsc::UnboundedReceiver<SessionEvent>) {
        let session = Arc::clone(self);
        let pump = tokio::spawn(async move {
            while let Some(event) = events_rx.recv().await {
                let directives = session.state.write().await.apply(event);
                for directive in directives {
                    match directive {
                        SessionDirective::Rerender => {
                            session.render_tx.send_modify(|generation| *generation += 1);
                        }
                        SessionDirective::SignOut(reason) => {
                            tracing::warn!(
                                reason = %reason,
                                "access revoked mid-session; forcing sign-out"
                            );
                            session.end_session(Some(reason)).await;
                            return;
                        }
                        SessionDirective::ScopeChanged { role_changed } => {
                            if let Err(error) = session.handle_scope_change(role_changed).await {
                                tracing::error!(%error, "re-subscribe after scope change failed");
                            }
                        }
                    }
                }
            }
        });

        self.tasks.lock().await.pump = Some(pump);
    }

    /// Tears down and re-establishes the prospect subscriptions after a
    /// role or team change; a role change also refreshes the permission map
    /// and moves the role-definition watch to the new role name.
    async fn handle_scope_change(&self, role_changed: bool) -> AppResult<()> {
        if role_changed {
            let role = {
                let state = self.state.read().await;
                state.user().role().clone()
            };
            let permissions = self.resolver.fetch_role_permissions(&role).await?;
            self.state.write().await.set_permissions(permissions);
            self.resubscribe_role_watch(role.as_str()).await?;
        }

        self.tasks.lock().await.abort_prospect();
        self.subscribe_prospect_slices().await?;
        self.render_tx.send_modify(|generation| *generation += 1);

        Ok(())
    }
}

/// Signs in, resolves the principal, and starts a session.
///
/// Any identity-resolution denial signs the principal straight back out and
/// surfaces the specific access failure, per the resolver contract.
pub async fn sign_in_and_start(
    store: Arc<dyn DocumentStore>,
    auth: Arc<dyn AuthGateway>,
    email: &str,
    password: &str,
) -> AppResult<Arc<CrmSession>> {
    let principal = auth
        .sign_in(email, password)
        .await
        .map_err(|error| AppError::Unauthorized(error.user_message()))?;

    let resolver = IdentityResolver::new(Arc::clone(&store));
    match resolver.resolve(principal.email()).await? {
        crate::identity_service::ResolutionOutcome::Resolved(user) => {
            CrmSession::start(store, auth, user).await
        }
        crate::identity_service::ResolutionOutcome::Denied(reason) => {
            if let Err(error) = auth.sign_out().await {
                tracing::warn!(%error, "sign-out after denied resolution failed");
            }
            Err(AppError::Forbidden(reason.user_message().to_owned()))
        }
    }
}
