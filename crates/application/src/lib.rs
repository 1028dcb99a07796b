//! Application services and ports for the Ascend CRM client core.

#![forbid(unsafe_code)]

mod auth_ports;
mod data_service;
mod identity_service;
mod messaging_service;
mod session_service;
mod store_ports;
mod view_service;

#[cfg(test)]
mod test_support;

pub use auth_ports::{AuthError, AuthGateway};
pub use data_service::{
    parse_backup, serialize_backup, BackupData, BackupFile, BatchConfig, DataAdminService,
    RestoreSummary, BACKUP_VERSION, CLEAR_ALL_CONFIRMATION, DEFAULT_BATCH_CHUNK_SIZE,
};
pub use identity_service::{IdentityResolver, ResolutionOutcome};
pub use messaging_service::{
    prepare_bulk_messages, send_action_label, MessageDestination, PreparedMessage,
};
pub use session_service::{
    merge_member_slices, prospect_scope_for, scope_queries, sign_in_and_start, CrmSession,
    ProspectScope, ProspectSlice, SessionDirective, SessionEvent, SessionPhase, SessionState,
};
pub use store_ports::{
    collections, decode_document, decode_snapshot, encode_entity, BatchWrite, Document,
    DocumentStore, FieldEquals, OrderBy, Query, Snapshot, SnapshotReceiver, SortDirection,
};
pub use view_service::{
    nav_visible, page_viewable, AnalyticsView, AssigneeOption, DashboardView, DataManagementView,
    LeadRow, NavItem, NewProspectInput, Notice, NoticeKind, Page, PageView, ProspectRow,
    ProspectUpdate, RenderModel, ReportKind, TeamDraft, TeamRow, TemplateDraft, TemplatesView,
    ViewController,
};
