//! Boundary to the hosted document database.
//!
//! The store owns all canonical state. The client reads it two ways — one-shot
//! queries and live subscriptions that push the FULL current result set on
//! every change — and writes through individual operations or atomic batches.
//! Handlers never receive field-level patches.

mod codec;

use ascend_core::AppResult;
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

pub use codec::{decode_document, decode_snapshot, encode_entity};

/// Collection names used by the CRM, matching the backend schema.
pub mod collections {
    /// Pipeline prospects.
    pub const PROSPECTS: &str = "prospects";
    /// Raw join requests awaiting triage.
    pub const JOIN_REQUESTS: &str = "joinRequests";
    /// HRMS employee reference records.
    pub const EMPLOYEES: &str = "employees";
    /// Per-employee CRM access grants.
    pub const ACCESS_GRANTS: &str = "accessGrants";
    /// Role-name-keyed permission documents.
    pub const ROLE_DEFINITIONS: &str = "roleDefinitions";
    /// Sales teams.
    pub const TEAMS: &str = "teams";
    /// Outbound message templates.
    pub const TEMPLATES: &str = "whatsappTemplates";
    /// Best-effort audit trail.
    pub const ACTIVITIES: &str = "activities";
}

/// One stored document: backend-assigned id plus a JSON object payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Backend-assigned document id.
    pub id: String,
    /// Document payload; the id is not repeated inside.
    pub data: Value,
}

/// Equality filter on a single field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldEquals {
    /// Field name inside the document payload.
    pub field: String,
    /// Value the field must equal exactly.
    pub value: Value,
}

/// Sort direction for an ordered query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Smallest first.
    Ascending,
    /// Largest first.
    Descending,
}

/// Ordering clause for a query.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    /// Field to order on.
    pub field: String,
    /// Direction.
    pub direction: SortDirection,
}

/// A filtered, optionally ordered read over one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Target collection name.
    pub collection: String,
    /// Conjunction of equality filters.
    pub filters: Vec<FieldEquals>,
    /// Optional ordering.
    pub order_by: Option<OrderBy>,
}

impl Query {
    /// Starts an unfiltered query over a collection.
    #[must_use]
    pub fn collection(name: &str) -> Self {
        Self {
            collection: name.to_owned(),
            filters: Vec::new(),
            order_by: None,
        }
    }

    /// Adds an equality filter.
    #[must_use]
    pub fn where_eq(mut self, field: &str, value: Value) -> Self {
        self.filters.push(FieldEquals {
            field: field.to_owned(),
            value,
        });
        self
    }

    /// Orders the result newest-first on a field.
    #[must_use]
    pub fn order_by_desc(mut self, field: &str) -> Self {
        self.order_by = Some(OrderBy {
            field: field.to_owned(),
            direction: SortDirection::Descending,
        });
        self
    }
}

/// A full-result-set snapshot pushed by a live subscription.
pub type Snapshot = Vec<Document>;

/// Receiving end of a live subscription.
///
/// The store pushes the complete current result set immediately on subscribe
/// and again after every committed change that touches the query. Delivery
/// order across distinct subscriptions is not guaranteed.
pub type SnapshotReceiver = mpsc::UnboundedReceiver<Snapshot>;

/// One write inside an atomic batch.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchWrite {
    /// Creates or fully replaces a document.
    Set {
        /// Target collection.
        collection: String,
        /// Document id.
        id: String,
        /// Full document payload.
        data: Value,
    },
    /// Deletes a document; deleting a missing id is a no-op.
    Delete {
        /// Target collection.
        collection: String,
        /// Document id.
        id: String,
    },
}

/// Query, subscribe and write access to the hosted document database.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Runs a one-shot query.
    async fn get(&self, query: &Query) -> AppResult<Vec<Document>>;

    /// Opens a live subscription for a query.
    async fn subscribe(&self, query: &Query) -> AppResult<SnapshotReceiver>;

    /// Adds a document with a backend-assigned id; returns the id.
    async fn add(&self, collection: &str, data: Value) -> AppResult<String>;

    /// Creates or fully replaces a document under a known id.
    async fn set(&self, collection: &str, id: &str, data: Value) -> AppResult<()>;

    /// Merges fields into an existing document; fails if it does not exist.
    async fn update(&self, collection: &str, id: &str, data: Value) -> AppResult<()>;

    /// Deletes a document.
    async fn delete(&self, collection: &str, id: &str) -> AppResult<()>;

    /// Commits a batch atomically.
    ///
    /// Callers must respect the backend's per-transaction item limit by
    /// chunking; each call either fully applies or fully fails.
    async fn commit(&self, writes: Vec<BatchWrite>) -> AppResult<()>;
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Query, SortDirection};

    #[test]
    fn query_builder_accumulates_clauses() {
        let query = Query::collection("prospects")
            .where_eq("teamId", json!("t-1"))
            .order_by_desc("createdAt");

        assert_eq!(query.collection, "prospects");
        assert_eq!(query.filters.len(), 1);
        assert_eq!(query.filters[0].field, "teamId");
        assert_eq!(
            query.order_by.as_ref().map(|order| order.direction),
            Some(SortDirection::Descending)
        );
    }
}
