use std::sync::Arc;

use ascend_core::AppResult;
use ascend_domain::{
    resolve_effective_grant, AccessError, AccessGrant, Employee, PermissionSet, RoleDefinition,
    RoleName, UserProfile,
};
use serde_json::json;

use crate::store_ports::{collections, decode_snapshot, DocumentStore, Query};

/// Outcome of resolving a signed-in principal into a CRM user.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionOutcome {
    /// The principal maps to an enabled CRM user.
    Resolved(UserProfile),
    /// Access is denied; the caller must sign the principal out and show
    /// the failure-specific message.
    Denied(AccessError),
}

/// Maps an authenticated principal to an internal user record.
///
/// Pure reads only: sign-out on denial is the caller's responsibility.
#[derive(Clone)]
pub struct IdentityResolver {
    store: Arc<dyn DocumentStore>,
}

impl IdentityResolver {
    /// Creates a resolver over the document store.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Resolves an email into an employee id, role, team and permission set.
    pub async fn resolve(&self, email: &str) -> AppResult<ResolutionOutcome> {
        let employees: Vec<Employee> = decode_snapshot(
            self.store
                .get(&Query::collection(collections::EMPLOYEES).where_eq("email", json!(email)))
                .await?,
        );
        let Some(employee) = employees.into_iter().next() else {
            return Ok(ResolutionOutcome::Denied(AccessError::NoEmployeeRecord));
        };

        let grants: Vec<AccessGrant> = decode_snapshot(
            self.store
                .get(
                    &Query::collection(collections::ACCESS_GRANTS)
                        .where_eq("employeeId", json!(employee.id.as_str())),
                )
                .await?,
        );
        if grants.is_empty() {
            return Ok(ResolutionOutcome::Denied(AccessError::NoAccessProfile));
        }

        let grant = match resolve_effective_grant(&grants) {
            Ok(grant) => grant.clone(),
            Err(error) => return Ok(ResolutionOutcome::Denied(error)),
        };

        let permissions = self.fetch_role_permissions(&grant.role).await?;

        Ok(ResolutionOutcome::Resolved(UserProfile::new(
            employee.id,
            employee.full_name,
            if employee.email.is_empty() {
                email.to_owned()
            } else {
                employee.email
            },
            grant.role,
            grant.team_id,
            permissions,
        )))
    }

    /// Fetches the permission map for a role name.
    ///
    /// A missing role definition resolves to an EMPTY map rather than an
    /// error: deny-by-default then makes every capability false. This
    /// fail-open-on-configuration-gap behavior is deliberate and matches the
    /// deployed system; see DESIGN.md before changing it.
    pub async fn fetch_role_permissions(&self, role: &RoleName) -> AppResult<PermissionSet> {
        let definitions: Vec<RoleDefinition> = decode_snapshot(
            self.store
                .get(
                    &Query::collection(collections::ROLE_DEFINITIONS)
                        .where_eq("role", json!(role.as_str())),
                )
                .await?,
        );

        match definitions.into_iter().next() {
            Some(definition) => Ok(definition.permissions),
            None => {
                tracing::warn!(role = role.as_str(), "no role definition; permissions empty");
                Ok(PermissionSet::empty())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use ascend_core::{AppResult, new_document_id};
    use ascend_domain::{AccessError, Capabilities, PermissionModule};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use tokio::sync::Mutex;

    use super::{IdentityResolver, ResolutionOutcome};
    use crate::store_ports::{
        BatchWrite, Document, DocumentStore, Query, SnapshotReceiver, collections,
    };

    /// Read-only fake: collections of (id, payload) pairs, filtered in `get`.
    #[derive(Default)]
    struct FakeStore {
        collections: Mutex<HashMap<String, Vec<Document>>>,
    }

    impl FakeStore {
        async fn insert(&self, collection: &str, data: Value) {
            self.collections
                .lock()
                .await
                .entry(collection.to_owned())
                .or_default()
                .push(Document {
                    id: new_document_id(),
                    data,
                });
        }
    }

    #[async_trait]
    impl DocumentStore for FakeStore {
        async fn get(&self, query: &Query) -> AppResult<Vec<Document>> {
            let collections = self.collections.lock().await;
            let documents = collections
                .get(&query.collection)
                .cloned()
                .unwrap_or_default();
            Ok(documents
                .into_iter()
                .filter(|document| {
                    query.filters.iter().all(|filter| {
                        document.data.get(filter.field.as_str()) == Some(&filter.value)
                    })
                })
                .collect())
        }

        async fn subscribe(&self, _query: &Query) -> AppResult<SnapshotReceiver> {
            let (_sender, receiver) = tokio::sync::mpsc::unbounded_channel();
            Ok(receiver)
        }

        async fn add(&self, _collection: &str, _data: Value) -> AppResult<String> {
            Ok(new_document_id())
        }

        async fn set(&self, _collection: &str, _id: &str, _data: Value) -> AppResult<()> {
            Ok(())
        }

        async fn update(&self, _collection: &str, _id: &str, _data: Value) -> AppResult<()> {
            Ok(())
        }

        async fn delete(&self, _collection: &str, _id: &str) -> AppResult<()> {
            Ok(())
        }

        async fn commit(&self, _writes: Vec<BatchWrite>) -> AppResult<()> {
            Ok(())
        }
    }

    async fn store_with_employee() -> FakeStore {
        let store = FakeStore::default();
        store
            .insert(
                collections::EMPLOYEES,
                json!({
                    "fullName": "Asha Verma",
                    "email": "asha@example.com",
                    "status": "Active",
                }),
            )
            .await;
        store
    }

    async fn employee_id(store: &FakeStore) -> String {
        let stored = store.collections.lock().await;
        stored
            .get(collections::EMPLOYEES)
            .and_then(|documents| documents.first())
            .map(|document| document.id.clone())
            .unwrap_or_else(|| unreachable!())
    }

    #[tokio::test]
    async fn unknown_email_is_denied_without_hrms_record() {
        let store = Arc::new(store_with_employee().await);
        let resolver = IdentityResolver::new(store);

        let outcome = resolver.resolve("ghost@example.com").await;
        assert_eq!(
            outcome.ok(),
            Some(ResolutionOutcome::Denied(AccessError::NoEmployeeRecord))
        );
    }

    #[tokio::test]
    async fn employee_without_grants_has_no_profile() {
        let store = Arc::new(store_with_employee().await);
        let resolver = IdentityResolver::new(store);

        let outcome = resolver.resolve("asha@example.com").await;
        assert_eq!(
            outcome.ok(),
            Some(ResolutionOutcome::Denied(AccessError::NoAccessProfile))
        );
    }

    #[tokio::test]
    async fn disabled_grant_vetoes_enabled_one() {
        let store = store_with_employee().await;
        let id = employee_id(&store).await;
        store
            .insert(
                collections::ACCESS_GRANTS,
                json!({"employeeId": id, "hasCRMAccess": false, "role": "member"}),
            )
            .await;
        store
            .insert(
                collections::ACCESS_GRANTS,
                json!({"employeeId": id, "hasCRMAccess": true, "role": "member"}),
            )
            .await;
        let resolver = IdentityResolver::new(Arc::new(store));

        let outcome = resolver.resolve("asha@example.com").await;
        assert_eq!(
            outcome.ok(),
            Some(ResolutionOutcome::Denied(AccessError::AccessDisabled))
        );
    }

    #[tokio::test]
    async fn enabled_grant_resolves_with_role_permissions() {
        let store = store_with_employee().await;
        let id = employee_id(&store).await;
        store
            .insert(
                collections::ACCESS_GRANTS,
                json!({"employeeId": id, "hasCRMAccess": true, "role": "Team Leader", "teamId": "t-1"}),
            )
            .await;
        store
            .insert(
                collections::ROLE_DEFINITIONS,
                json!({
                    "role": "Team Leader",
                    "permissions": {"prospect_management": {"view": true, "edit": true}},
                }),
            )
            .await;
        let resolver = IdentityResolver::new(Arc::new(store));

        let outcome = resolver.resolve("asha@example.com").await;
        let Ok(ResolutionOutcome::Resolved(profile)) = outcome else {
            unreachable!();
        };
        assert!(profile.role().is_team_leader());
        assert_eq!(profile.team_id().map(|team| team.as_str()), Some("t-1"));
        let capabilities = profile
            .permissions()
            .capabilities_for(PermissionModule::ProspectManagement);
        assert!(capabilities.view && capabilities.edit);
        assert_eq!(
            profile
                .permissions()
                .capabilities_for(PermissionModule::DataManagement),
            Capabilities::NONE
        );
    }

    #[tokio::test]
    async fn missing_role_definition_fails_open_to_empty_map() {
        let store = store_with_employee().await;
        let id = employee_id(&store).await;
        store
            .insert(
                collections::ACCESS_GRANTS,
                json!({"employeeId": id, "hasCRMAccess": true, "role": "member"}),
            )
            .await;
        let resolver = IdentityResolver::new(Arc::new(store));

        let outcome = resolver.resolve("asha@example.com").await;
        let Ok(ResolutionOutcome::Resolved(profile)) = outcome else {
            unreachable!();
        };
        for module in PermissionModule::all() {
            assert!(!profile.permissions().capabilities_for(*module).grants_any());
        }
    }
}
