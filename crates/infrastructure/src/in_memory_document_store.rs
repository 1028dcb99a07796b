use std::cmp::Ordering;
use std::collections::HashMap;

use ascend_application::{
    BatchWrite, Document, DocumentStore, Query, Snapshot, SnapshotReceiver, SortDirection,
};
use ascend_core::{new_document_id, AppError, AppResult};
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::RwLock;

struct Subscription {
    query: Query,
    sender: UnboundedSender<Snapshot>,
}

#[derive(Default)]
struct StoreInner {
    collections: HashMap<String, Vec<Document>>,
    subscriptions: Vec<Subscription>,
}

/// In-memory document store with live full-snapshot subscriptions.
///
/// The stand-in for the hosted document database in development and tests:
/// every committed change re-evaluates each open subscription's query and
/// pushes the COMPLETE current result set, exactly the contract the session
/// layer is written against. Insertion order is stable, queries filter by
/// field equality, and batches apply atomically under one write lock.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    inner: RwLock<StoreInner>,
}

impl InMemoryDocumentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a document under a fixed id (dev-seed convenience).
    pub async fn seed(&self, collection: &str, id: &str, data: Value) {
        let mut inner = self.inner.write().await;
        upsert(&mut inner.collections, collection, id, data);
        publish(&mut inner, &[collection.to_owned()]);
    }
}

fn upsert(
    collections: &mut HashMap<String, Vec<Document>>,
    collection: &str,
    id: &str,
    data: Value,
) {
    let documents = collections.entry(collection.to_owned()).or_default();
    match documents.iter_mut().find(|document| document.id == id) {
        Some(document) => document.data = data,
        None => documents.push(Document {
            id: id.to_owned(),
            data,
        }),
    }
}

fn remove(collections: &mut HashMap<String, Vec<Document>>, collection: &str, id: &str) {
    if let Some(documents) = collections.get_mut(collection) {
        documents.retain(|document| document.id != id);
    }
}

fn matches(query: &Query, document: &Document) -> bool {
    query
        .filters
        .iter()
        .all(|filter| document.data.get(filter.field.as_str()) == Some(&filter.value))
}

/// Field ordering over JSON values: strings lexicographically (which orders
/// RFC3339 timestamps chronologically), numbers numerically, missing fields
/// first.
fn compare_fields(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    match (left, right) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::String(left)), Some(Value::String(right))) => left.cmp(right),
        (Some(Value::Number(left)), Some(Value::Number(right))) => left
            .as_f64()
            .partial_cmp(&right.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::Bool(left)), Some(Value::Bool(right))) => left.cmp(right),
        _ => Ordering::Equal,
    }
}

fn evaluate(inner: &StoreInner, query: &Query) -> Snapshot {
    let mut documents: Vec<Document> = inner
        .collections
        .get(&query.collection)
        .map(|documents| {
            documents
                .iter()
                .filter(|document| matches(query, document))
                .cloned()
                .collect()
        })
        .unwrap_or_default();

    if let Some(order) = &query.order_by {
        documents.sort_by(|left, right| {
            let ordering = compare_fields(
                left.data.get(order.field.as_str()),
                right.data.get(order.field.as_str()),
            );
            match order.direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });
    }

    documents
}

/// Pushes fresh snapshots to every subscription over the touched
/// collections, pruning subscriptions whose receivers are gone.
fn publish(inner: &mut StoreInner, touched: &[String]) {
    let interested: Vec<(usize, Query)> = inner
        .subscriptions
        .iter()
        .enumerate()
        .filter(|(_, subscription)| touched.contains(&subscription.query.collection))
        .map(|(index, subscription)| (index, subscription.query.clone()))
        .collect();

    let mut dead = Vec::new();
    for (index, query) in interested {
        let snapshot = evaluate(inner, &query);
        if inner.subscriptions[index].sender.send(snapshot).is_err() {
            dead.push(index);
        }
    }
    for index in dead.into_iter().rev() {
        inner.subscriptions.swap_remove(index);
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, query: &Query) -> AppResult<Vec<Document>> {
        let inner = self.inner.read().await;
        Ok(evaluate(&inner, query))
    }

    async fn subscribe(&self, query: &Query) -> AppResult<SnapshotReceiver> {
        let (sender, receiver) = tokio::sync::mpsc::unbounded_channel();
        let mut inner = self.inner.write().await;

        // The initial snapshot arrives through the same channel as every
        // later delta; subscribers treat them identically.
        let _ = sender.send(evaluate(&inner, query));
        inner.subscriptions.push(Subscription {
            query: query.clone(),
            sender,
        });

        Ok(receiver)
    }

    async fn add(&self, collection: &str, data: Value) -> AppResult<String> {
        let id = new_document_id();
        let mut inner = self.inner.write().await;
        upsert(&mut inner.collections, collection, &id, data);
        publish(&mut inner, &[collection.to_owned()]);
        Ok(id)
    }

    async fn set(&self, collection: &str, id: &str, data: Value) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        upsert(&mut inner.collections, collection, id, data);
        publish(&mut inner, &[collection.to_owned()]);
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, data: Value) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        let Some(document) = inner
            .collections
            .get_mut(collection)
            .and_then(|documents| documents.iter_mut().find(|document| document.id == id))
        else {
            return Err(AppError::NotFound(format!(
                "document '{id}' not found in collection '{collection}'"
            )));
        };

        match (&mut document.data, data) {
            (Value::Object(existing), Value::Object(updates)) => {
                for (key, value) in updates {
                    existing.insert(key, value);
                }
            }
            (slot, replacement) => *slot = replacement,
        }
        publish(&mut inner, &[collection.to_owned()]);

        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        remove(&mut inner.collections, collection, id);
        publish(&mut inner, &[collection.to_owned()]);
        Ok(())
    }

    async fn commit(&self, writes: Vec<BatchWrite>) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        let mut touched: Vec<String> = Vec::new();

        for write in writes {
            match write {
                BatchWrite::Set {
                    collection,
                    id,
                    data,
                } => {
                    upsert(&mut inner.collections, &collection, &id, data);
                    touched.push(collection);
                }
                BatchWrite::Delete { collection, id } => {
                    remove(&mut inner.collections, &collection, &id);
                    touched.push(collection);
                }
            }
        }

        touched.sort();
        touched.dedup();
        publish(&mut inner, &touched);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use ascend_application::{collections, BatchWrite, DocumentStore, Query};
    use serde_json::json;

    use super::InMemoryDocumentStore;

    #[tokio::test]
    async fn filters_and_orders_queries() {
        let store = InMemoryDocumentStore::new();
        store
            .seed(
                collections::PROSPECTS,
                "p-old",
                json!({"teamId": "t-1", "createdAt": "2026-01-01T00:00:00Z"}),
            )
            .await;
        store
            .seed(
                collections::PROSPECTS,
                "p-new",
                json!({"teamId": "t-1", "createdAt": "2026-06-01T00:00:00Z"}),
            )
            .await;
        store
            .seed(
                collections::PROSPECTS,
                "p-other",
                json!({"teamId": "t-2", "createdAt": "2026-07-01T00:00:00Z"}),
            )
            .await;

        let snapshot = store
            .get(
                &Query::collection(collections::PROSPECTS)
                    .where_eq("teamId", json!("t-1"))
                    .order_by_desc("createdAt"),
            )
            .await
            .unwrap_or_else(|_| unreachable!());

        let ids: Vec<&str> = snapshot.iter().map(|document| document.id.as_str()).collect();
        assert_eq!(ids, vec!["p-new", "p-old"]);
    }

    #[tokio::test]
    async fn subscription_receives_initial_and_delta_snapshots() {
        let store = InMemoryDocumentStore::new();
        store.seed(collections::TEAMS, "t-1", json!({"name": "North"})).await;

        let mut receiver = store
            .subscribe(&Query::collection(collections::TEAMS))
            .await
            .unwrap_or_else(|_| unreachable!());

        let initial = receiver.recv().await.unwrap_or_else(|| unreachable!());
        assert_eq!(initial.len(), 1);

        store.seed(collections::TEAMS, "t-2", json!({"name": "South"})).await;
        let delta = receiver.recv().await.unwrap_or_else(|| unreachable!());
        // Always the full current result set, never an increment.
        assert_eq!(delta.len(), 2);
    }

    #[tokio::test]
    async fn filtered_subscription_only_fires_for_matching_documents() {
        let store = InMemoryDocumentStore::new();
        let mut receiver = store
            .subscribe(
                &Query::collection(collections::PROSPECTS).where_eq("assignedTo", json!("emp-1")),
            )
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(receiver.recv().await.map(|s| s.len()), Some(0));

        store
            .seed(collections::PROSPECTS, "p-1", json!({"assignedTo": "emp-2"}))
            .await;
        let snapshot = receiver.recv().await.unwrap_or_else(|| unreachable!());
        assert!(snapshot.is_empty());

        store
            .seed(collections::PROSPECTS, "p-2", json!({"assignedTo": "emp-1"}))
            .await;
        let snapshot = receiver.recv().await.unwrap_or_else(|| unreachable!());
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, "p-2");
    }

    #[tokio::test]
    async fn update_merges_fields_and_rejects_missing_documents() {
        let store = InMemoryDocumentStore::new();
        store
            .seed(collections::PROSPECTS, "p-1", json!({"name": "Jane", "status": "new"}))
            .await;

        store
            .update(collections::PROSPECTS, "p-1", json!({"status": "joined"}))
            .await
            .unwrap_or_else(|_| unreachable!());

        let snapshot = store
            .get(&Query::collection(collections::PROSPECTS))
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(snapshot[0].data.get("name"), Some(&json!("Jane")));
        assert_eq!(snapshot[0].data.get("status"), Some(&json!("joined")));

        let missing = store
            .update(collections::PROSPECTS, "ghost", json!({"status": "lost"}))
            .await;
        assert!(missing.is_err());
    }

    #[tokio::test]
    async fn batch_commit_notifies_each_touched_collection_once() {
        let store = InMemoryDocumentStore::new();
        let mut receiver = store
            .subscribe(&Query::collection(collections::PROSPECTS))
            .await
            .unwrap_or_else(|_| unreachable!());
        let _ = receiver.recv().await;

        store
            .commit(vec![
                BatchWrite::Set {
                    collection: collections::PROSPECTS.to_owned(),
                    id: "p-1".to_owned(),
                    data: json!({"name": "A"}),
                },
                BatchWrite::Set {
                    collection: collections::PROSPECTS.to_owned(),
                    id: "p-2".to_owned(),
                    data: json!({"name": "B"}),
                },
            ])
            .await
            .unwrap_or_else(|_| unreachable!());

        let snapshot = receiver.recv().await.unwrap_or_else(|| unreachable!());
        assert_eq!(snapshot.len(), 2);
        // One notification for the whole batch, not one per write.
        assert!(receiver.try_recv().is_err());
    }
}
