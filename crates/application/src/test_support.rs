//! Push-capable in-memory fakes shared by the service test modules.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicIsize, AtomicUsize, Ordering as AtomicOrdering};

use ascend_core::{new_document_id, AppError, AppResult};
use ascend_domain::Principal;
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::Mutex;

use crate::auth_ports::{AuthError, AuthGateway};
use crate::store_ports::{
    BatchWrite, Document, DocumentStore, Query, Snapshot, SnapshotReceiver, SortDirection,
};

struct Subscription {
    query: Query,
    sender: UnboundedSender<Snapshot>,
}

#[derive(Default)]
struct Inner {
    collections: HashMap<String, Vec<Document>>,
    subscriptions: Vec<Subscription>,
}

/// In-memory document store that pushes full snapshots on every write.
pub struct FakeBackend {
    inner: Mutex<Inner>,
    fail_writes: AtomicBool,
    commit_budget: AtomicIsize,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self {
            inner: Mutex::default(),
            fail_writes: AtomicBool::new(false),
            commit_budget: AtomicIsize::new(isize::MAX),
        }
    }
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write fail with a backend error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, AtomicOrdering::SeqCst);
    }

    /// Lets the next `allowed` batch commits through, then fails the rest.
    pub fn fail_commits_after(&self, allowed: usize) {
        self.commit_budget
            .store(allowed.min(isize::MAX as usize) as isize, AtomicOrdering::SeqCst);
    }

    /// Seeds a document under a fixed id, notifying subscribers.
    pub async fn seed(&self, collection: &str, id: &str, data: Value) {
        let mut inner = self.inner.lock().await;
        upsert(&mut inner, collection, id, data);
        notify(&mut inner, collection);
    }

    /// Returns a current snapshot without subscribing.
    pub async fn dump(&self, collection: &str) -> Vec<Document> {
        let inner = self.inner.lock().await;
        inner
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    fn write_guard(&self) -> AppResult<()> {
        if self.fail_writes.load(AtomicOrdering::SeqCst) {
            return Err(AppError::Backend("injected write failure".to_owned()));
        }

        Ok(())
    }
}

fn upsert(inner: &mut Inner, collection: &str, id: &str, data: Value) {
    let documents = inner.collections.entry(collection.to_owned()).or_default();
    match documents.iter_mut().find(|document| document.id == id) {
        Some(document) => document.data = data,
        None => documents.push(Document {
            id: id.to_owned(),
            data,
        }),
    }
}

fn matches(query: &Query, document: &Document) -> bool {
    query
        .filters
        .iter()
        .all(|filter| document.data.get(filter.field.as_str()) == Some(&filter.value))
}

fn compare_values(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    match (left, right) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::String(left)), Some(Value::String(right))) => left.cmp(right),
        (Some(Value::Number(left)), Some(Value::Number(right))) => left
            .as_f64()
            .partial_cmp(&right.as_f64())
            .unwrap_or(Ordering::Equal),
        _ => Ordering::Equal,
    }
}

fn snapshot_for(inner: &Inner, query: &Query) -> Snapshot {
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
            let ordering = compare_values(
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

fn notify(inner: &mut Inner, collection: &str) {
    let interested: Vec<(usize, Query)> = inner
        .subscriptions
        .iter()
        .enumerate()
        .filter(|(_, subscription)| subscription.query.collection == collection)
        .map(|(index, subscription)| (index, subscription.query.clone()))
        .collect();

    for (index, query) in interested {
        let snapshot = snapshot_for(inner, &query);
        let _ = inner.subscriptions[index].sender.send(snapshot);
    }
}

#[async_trait]
impl DocumentStore for FakeBackend {
    async fn get(&self, query: &Query) -> AppResult<Vec<Document>> {
        let inner = self.inner.lock().await;
        Ok(snapshot_for(&inner, query))
    }

    async fn subscribe(&self, query: &Query) -> AppResult<SnapshotReceiver> {
        let (sender, receiver) = tokio::sync::mpsc::unbounded_channel();
        let mut inner = self.inner.lock().await;
        let _ = sender.send(snapshot_for(&inner, query));
        inner.subscriptions.push(Subscription {
            query: query.clone(),
            sender,
        });
        Ok(receiver)
    }

    async fn add(&self, collection: &str, data: Value) -> AppResult<String> {
        self.write_guard()?;
        let id = new_document_id();
        let mut inner = self.inner.lock().await;
        upsert(&mut inner, collection, &id, data);
        notify(&mut inner, collection);
        Ok(id)
    }

    async fn set(&self, collection: &str, id: &str, data: Value) -> AppResult<()> {
        self.write_guard()?;
        let mut inner = self.inner.lock().await;
        upsert(&mut inner, collection, id, data);
        notify(&mut inner, collection);
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, data: Value) -> AppResult<()> {
        self.write_guard()?;
        let mut inner = self.inner.lock().await;
        let documents = inner.collections.entry(collection.to_owned()).or_default();
        let Some(document) = documents.iter_mut().find(|document| document.id == id) else {
            return Err(AppError::NotFound(format!(
                "document '{id}' not found in '{collection}'"
            )));
        };

        if let (Value::Object(existing), Value::Object(updates)) = (&mut document.data, data) {
            for (key, value) in updates {
                existing.insert(key, value);
            }
        }
        notify(&mut inner, collection);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> AppResult<()> {
        self.write_guard()?;
        let mut inner = self.inner.lock().await;
        if let Some(documents) = inner.collections.get_mut(collection) {
            documents.retain(|document| document.id != id);
        }
        notify(&mut inner, collection);
        Ok(())
    }

    async fn commit(&self, writes: Vec<BatchWrite>) -> AppResult<()> {
        self.write_guard()?;
        if self.commit_budget.fetch_sub(1, AtomicOrdering::SeqCst) <= 0 {
            return Err(AppError::Backend("injected commit failure".to_owned()));
        }
        let mut inner = self.inner.lock().await;
        let mut touched: Vec<String> = Vec::new();
        for write in writes {
            match write {
                BatchWrite::Set {
                    collection,
                    id,
                    data,
                } => {
                    upsert(&mut inner, &collection, &id, data);
                    touched.push(collection);
                }
                BatchWrite::Delete { collection, id } => {
                    if let Some(documents) = inner.collections.get_mut(&collection) {
                        documents.retain(|document| document.id != id);
                    }
                    touched.push(collection);
                }
            }
        }

        touched.sort();
        touched.dedup();
        for collection in touched {
            notify(&mut inner, &collection);
        }

        Ok(())
    }
}

/// Auth gateway fake: fixed credentials plus a sign-out counter.
pub struct FakeAuth {
    accounts: HashMap<String, String>,
    sign_outs: AtomicUsize,
}

impl FakeAuth {
    pub fn with_account(email: &str, password: &str) -> Self {
        Self {
            accounts: HashMap::from([(email.to_owned(), password.to_owned())]),
            sign_outs: AtomicUsize::new(0),
        }
    }

    pub fn sign_out_count(&self) -> usize {
        self.sign_outs.load(AtomicOrdering::SeqCst)
    }
}

#[async_trait]
impl AuthGateway for FakeAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Principal, AuthError> {
        if !email.contains('@') {
            return Err(AuthError::InvalidEmail);
        }

        match self.accounts.get(email) {
            None => Err(AuthError::UserNotFound),
            Some(stored) if stored == password => {
                Ok(Principal::new(format!("auth-{email}"), email))
            }
            Some(_) => Err(AuthError::WrongPassword),
        }
    }

    async fn sign_out(&self) -> AppResult<()> {
        self.sign_outs.fetch_add(1, AtomicOrdering::SeqCst);
        Ok(())
    }
}

/// Polls a session condition until it holds or the timeout trips.
///
/// Subscription deltas travel through real channels even in tests, so
/// assertions after a write need a short settle loop instead of a sleep.
pub async fn eventually<F>(mut check: F)
where
    F: AsyncFnMut() -> bool,
{
    for _ in 0..200 {
        if check().await {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }
    panic!("condition not reached within the settle window");
}
