//! Demo dataset for the console harness.

use ascend_application::collections;
use ascend_infrastructure::InMemoryDocumentStore;
use serde_json::json;

/// Seeds a small office: three employees, one team, a handful of prospects
/// mid-funnel, two raw leads and a greeting template. The demo account gets
/// the Admin role so every page is reachable.
pub async fn seed(store: &InMemoryDocumentStore, demo_email: &str) {
    store
        .seed(
            collections::EMPLOYEES,
            "emp-asha",
            json!({"fullName": "Asha Verma", "empCode": "E001", "email": demo_email, "status": "Active"}),
        )
        .await;
    store
        .seed(
            collections::EMPLOYEES,
            "emp-bilal",
            json!({"fullName": "Bilal Khan", "empCode": "E002", "email": "bilal@ascend.example", "status": "Active"}),
        )
        .await;
    store
        .seed(
            collections::EMPLOYEES,
            "emp-chitra",
            json!({"fullName": "Chitra Rao", "empCode": "E003", "email": "chitra@ascend.example", "status": "Active"}),
        )
        .await;

    store
        .seed(
            collections::ACCESS_GRANTS,
            "grant-asha",
            json!({"employeeId": "emp-asha", "hasCRMAccess": true, "role": "Admin"}),
        )
        .await;
    store
        .seed(
            collections::ACCESS_GRANTS,
            "grant-bilal",
            json!({"employeeId": "emp-bilal", "hasCRMAccess": true, "role": "Team Leader", "teamId": "team-north"}),
        )
        .await;
    store
        .seed(
            collections::ACCESS_GRANTS,
            "grant-chitra",
            json!({"employeeId": "emp-chitra", "hasCRMAccess": true, "role": "member", "teamId": "team-north"}),
        )
        .await;

    store
        .seed(
            collections::ROLE_DEFINITIONS,
            "role-admin",
            json!({
                "role": "Admin",
                "permissions": {
                    "crm_dashboard": {"view": true},
                    "prospect_management": {"view": true, "add": true, "edit": true, "delete": true},
                    "lead_management": {"view": true, "add": true, "edit": true, "delete": true},
                    "whatsapp_templates": {"view": true, "add": true, "edit": true, "delete": true},
                    "analytics": {"view": true},
                    "data_management": {"view": true, "add": true, "edit": true, "delete": true},
                    "team_management": {"view": true, "add": true, "edit": true, "delete": true},
                },
            }),
        )
        .await;
    store
        .seed(
            collections::ROLE_DEFINITIONS,
            "role-team-leader",
            json!({
                "role": "Team Leader",
                "permissions": {
                    "crm_dashboard": {"view": true},
                    "prospect_management": {"view": true, "add": true, "edit": true},
                    "lead_management": {"view": true, "edit": true},
                    "whatsapp_templates": {"view": true, "add": true, "edit": true},
                    "analytics": {"view": true},
                    "team_management": {"view": true},
                },
            }),
        )
        .await;
    store
        .seed(
            collections::ROLE_DEFINITIONS,
            "role-member",
            json!({
                "role": "member",
                "permissions": {
                    "crm_dashboard": {"view": true},
                    "prospect_management": {"view": true, "add": true, "edit": true},
                    "whatsapp_templates": {"view": true},
                },
            }),
        )
        .await;

    store
        .seed(
            collections::TEAMS,
            "team-north",
            json!({"name": "North", "leaderId": "emp-bilal", "members": ["emp-chitra"]}),
        )
        .await;

    let prospects = [
        (
            "prospect-1",
            json!({
                "name": "Deepa Nair", "phone": "+91 90000 11111", "email": "deepa@example.com",
                "location": "Kochi", "status": "interested", "interestLevel": "high",
                "leadSource": "Referral", "teamId": "team-north", "assignedTo": "emp-chitra",
                "ownerId": "emp-chitra", "createdBy": "emp-chitra",
                "createdAt": "2026-07-02T09:30:00Z", "updatedAt": "2026-07-20T10:00:00Z",
            }),
        ),
        (
            "prospect-2",
            json!({
                "name": "Farhan Ali", "phone": "+91 90000 22222", "email": "",
                "location": "Pune", "status": "contacted", "interestLevel": "medium",
                "leadSource": "Instagram", "instagram": "farhan.a", "teamId": "team-north",
                "assignedTo": "emp-bilal", "ownerId": "emp-bilal", "createdBy": "emp-bilal",
                "createdAt": "2026-07-15T14:00:00Z", "updatedAt": "2026-07-15T14:00:00Z",
            }),
        ),
        (
            "prospect-3",
            json!({
                "name": "Gita Joshi", "phone": "+91 90000 33333", "email": "gita@example.com",
                "location": "Jaipur", "status": "joined", "interestLevel": "high",
                "leadSource": "Event", "teamId": "team-north", "assignedTo": "emp-chitra",
                "ownerId": "emp-chitra", "createdBy": "emp-chitra",
                "createdAt": "2026-06-10T08:00:00Z", "updatedAt": "2026-08-01T12:00:00Z",
            }),
        ),
        (
            "prospect-4",
            json!({
                "name": "Harish Gupta", "phone": "+91 90000 44444", "email": "",
                "location": "Delhi", "status": "new", "interestLevel": "low",
                "leadSource": "Other", "assignedTo": "emp-asha",
                "ownerId": "emp-asha", "createdBy": "emp-asha",
                "createdAt": "2026-08-03T16:45:00Z", "updatedAt": "2026-08-03T16:45:00Z",
            }),
        ),
    ];
    for (id, data) in prospects {
        store.seed(collections::PROSPECTS, id, data).await;
    }

    store
        .seed(
            collections::JOIN_REQUESTS,
            "lead-1",
            json!({
                "name": "Irfan Shaikh", "phone": "+91 90000 55555",
                "location": "Mumbai", "whatTheyDo": "shop owner",
                "interestLevel": "hot", "leadSource": "instagram story",
                "whyWantToJoin": "extra income for the family",
                "timestamp": "2026-08-05T11:20:00Z",
            }),
        )
        .await;
    store
        .seed(
            collections::JOIN_REQUESTS,
            "lead-2",
            json!({
                "name": "Jaya Pillai", "phone": "+91 90000 66666", "email": "jaya@example.com",
                "location": "Chennai", "leadSource": "website",
                "timestamp": "2026-08-06T09:10:00Z",
            }),
        )
        .await;

    store
        .seed(
            collections::TEMPLATES,
            "template-welcome",
            json!({
                "name": "Warm Welcome",
                "type": "greeting",
                "content": "Hi {{name}}! Great connecting with you in {{location}}. Shall we talk this week?",
                "createdBy": "emp-asha",
                "createdAt": "2026-07-01T10:00:00Z",
                "updatedAt": "2026-07-01T10:00:00Z",
            }),
        )
        .await;
}
