use std::sync::Arc;

use ascend_core::{AppError, EmployeeId, TeamId};
use ascend_domain::{InterestLevel, Lead, PermissionSet, Prospect, ProspectStatus, RoleName, UserProfile};
use chrono::{TimeZone, Utc};
use serde_json::json;

use super::{BatchConfig, DataAdminService, CLEAR_ALL_CONFIRMATION};
use crate::data_service::csv_io::{
    export_activities_csv, export_prospects_csv, parse_prospects_csv,
};
use crate::store_ports::{collections, decode_snapshot, BatchWrite, DocumentStore, Query};
use crate::test_support::FakeBackend;

fn importer() -> UserProfile {
    UserProfile::new(
        EmployeeId::from_raw("imp-1"),
        "Importer",
        "imp@example.com",
        RoleName::new("member"),
        Some(TeamId::from_raw("t-1")),
        PermissionSet::empty(),
    )
}

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 7, 9, 0, 0)
        .single()
        .unwrap_or_else(|| unreachable!())
}

fn service(backend: &Arc<FakeBackend>, chunk_size: usize) -> DataAdminService {
    DataAdminService::new(backend.clone(), BatchConfig { chunk_size })
}

#[test]
fn import_row_gets_the_documented_defaults() {
    let text = "Name,Phone,Email,Interest,Location\nJane,555-1234,,high,Austin\n";
    let prospects =
        parse_prospects_csv(text, &importer(), now()).unwrap_or_else(|_| unreachable!());

    assert_eq!(prospects.len(), 1);
    let jane = &prospects[0];
    assert_eq!(jane.name, "Jane");
    assert_eq!(jane.phone, "555-1234");
    assert_eq!(jane.email, "");
    assert_eq!(jane.status, ProspectStatus::New);
    assert_eq!(jane.interest_level, InterestLevel::High);
    assert_eq!(jane.location, "Austin");
    assert_eq!(jane.assigned_to, Some(EmployeeId::from_raw("imp-1")));
    assert_eq!(jane.notes, "Imported via CSV");
}

#[test]
fn missing_location_defaults_to_unknown() {
    let text = "name,PHONE\nRavi,98765\n";
    let prospects =
        parse_prospects_csv(text, &importer(), now()).unwrap_or_else(|_| unreachable!());
    assert_eq!(prospects[0].location, "Unknown");
    assert_eq!(prospects[0].interest_level, InterestLevel::Medium);
}

#[test]
fn missing_required_column_aborts_with_its_name() {
    let text = "Name,Email\nJane,jane@example.com\n";
    let result = parse_prospects_csv(text, &importer(), now());
    let Err(AppError::ImportFormat(message)) = result else {
        panic!("expected an import format error");
    };
    assert!(message.contains("Phone"));
}

#[test]
fn export_quotes_every_field_and_doubles_embedded_quotes() {
    let mut prospect = Prospect {
        id: "p-1".to_owned(),
        name: "Jane \"JJ\" Roe".to_owned(),
        phone: "555".to_owned(),
        email: String::new(),
        age: None,
        occupation: String::new(),
        instagram: String::new(),
        location: String::new(),
        status: ProspectStatus::New,
        interest_level: InterestLevel::Medium,
        lead_source: ascend_domain::LeadSource::Other,
        follow_up_date: None,
        team_id: None,
        assigned_to: None,
        owner_id: None,
        created_by: None,
        created_at: None,
        updated_at: None,
        notes: String::new(),
    };
    prospect.email = "j@example.com".to_owned();

    let csv = export_prospects_csv(&[prospect], &[]).unwrap_or_else(|_| unreachable!());
    assert!(csv.contains(r#""Jane ""JJ"" Roe""#));
    assert!(csv.contains(r#""Unassigned""#));
    assert!(csv.lines().next().is_some_and(|header| header.starts_with("\"Name\"")));
}

#[test]
fn activity_report_resolves_actor_names() {
    let activity = ascend_domain::Activity {
        id: "a-1".to_owned(),
        user_id: EmployeeId::from_raw("emp-9"),
        action: "Prospect Added".to_owned(),
        details: "Added Jane from Referral".to_owned(),
        timestamp: now(),
    };

    let csv = export_activities_csv(&[activity], &[]).unwrap_or_else(|_| unreachable!());
    // Actor not in the employee set renders as Unknown, not as a bare id.
    assert!(csv.contains(r#""Unknown""#));
    assert!(csv.contains("Added Jane from Referral"));
}

#[tokio::test]
async fn chunked_commit_splits_on_the_configured_size() {
    let backend = Arc::new(FakeBackend::new());
    let service = service(&backend, 2);

    let writes: Vec<BatchWrite> = (0..5)
        .map(|index| BatchWrite::Set {
            collection: collections::PROSPECTS.to_owned(),
            id: format!("p-{index}"),
            data: json!({"name": "X", "phone": "1"}),
        })
        .collect();
    let committed = service
        .commit_chunked(writes)
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(committed, 5);
    assert_eq!(backend.dump(collections::PROSPECTS).await.len(), 5);
}

#[tokio::test]
async fn failed_chunk_keeps_earlier_chunks_committed() {
    let backend = Arc::new(FakeBackend::new());
    backend.fail_commits_after(1);
    let service = service(&backend, 2);

    let writes: Vec<BatchWrite> = (0..5)
        .map(|index| BatchWrite::Set {
            collection: collections::PROSPECTS.to_owned(),
            id: format!("p-{index}"),
            data: json!({"name": "X", "phone": "1"}),
        })
        .collect();
    let result = service.commit_chunked(writes).await;

    assert!(matches!(result, Err(AppError::Backend(_))));
    // The first chunk of two writes landed; nothing was rolled back.
    assert_eq!(backend.dump(collections::PROSPECTS).await.len(), 2);
}

#[tokio::test]
async fn restore_rejects_files_without_a_data_section_before_writing() {
    let backend = Arc::new(FakeBackend::new());
    backend
        .seed(collections::PROSPECTS, "keep-me", json!({"name": "K", "phone": "1"}))
        .await;
    let service = service(&backend, 400);

    let result = service
        .restore_backup(r#"{"version": "1.0", "timestamp": "2026-01-01T00:00:00Z"}"#)
        .await;

    assert!(matches!(result, Err(AppError::ImportFormat(_))));
    assert_eq!(backend.dump(collections::PROSPECTS).await.len(), 1);
}

#[tokio::test]
async fn backup_then_restore_reproduces_the_collections() {
    let backend = Arc::new(FakeBackend::new());
    // Pre-existing junk that a restore must clear out completely.
    backend
        .seed(collections::PROSPECTS, "stale", json!({"name": "Stale", "phone": "0"}))
        .await;
    backend
        .seed(collections::JOIN_REQUESTS, "stale-lead", json!({"name": "SL", "phone": "0"}))
        .await;

    let prospects = vec![Prospect {
        id: "p-keep".to_owned(),
        name: "Jane".to_owned(),
        phone: "555".to_owned(),
        email: String::new(),
        age: None,
        occupation: String::new(),
        instagram: String::new(),
        location: "Austin".to_owned(),
        status: ProspectStatus::Interested,
        interest_level: InterestLevel::High,
        lead_source: ascend_domain::LeadSource::Referral,
        follow_up_date: None,
        team_id: None,
        assigned_to: None,
        owner_id: None,
        created_by: None,
        created_at: Some(now()),
        updated_at: None,
        notes: String::new(),
    }];
    let leads = vec![Lead {
        id: String::new(),
        name: "Ravi".to_owned(),
        phone: "98765".to_owned(),
        email: String::new(),
        age: None,
        location: String::new(),
        occupation: String::new(),
        instagram: String::new(),
        interest_level: None,
        lead_source: None,
        follow_up_date: None,
        why_want_to_join: None,
        notes: None,
        submitted_at: None,
    }];

    let file = DataAdminService::create_backup(&prospects, &leads, now())
        .unwrap_or_else(|_| unreachable!());
    let service = service(&backend, 400);
    let summary = service
        .restore_backup(&file)
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(summary.prospects, 1);
    assert_eq!(summary.leads, 1);

    let restored: Vec<Prospect> = decode_snapshot(
        backend
            .get(&Query::collection(collections::PROSPECTS))
            .await
            .unwrap_or_else(|_| unreachable!()),
    );
    assert_eq!(restored.len(), 1);
    // Ids are preserved where the backup carried one.
    assert_eq!(restored[0].id, "p-keep");
    assert_eq!(restored[0].status, ProspectStatus::Interested);

    let restored_leads: Vec<Lead> = decode_snapshot(
        backend
            .get(&Query::collection(collections::JOIN_REQUESTS))
            .await
            .unwrap_or_else(|_| unreachable!()),
    );
    assert_eq!(restored_leads.len(), 1);
    // This lead had no id, so the restore minted a fresh one.
    assert!(!restored_leads[0].id.is_empty());
    assert_ne!(restored_leads[0].id, "stale-lead");
}

#[tokio::test]
async fn clear_all_requires_the_exact_phrase() {
    let backend = Arc::new(FakeBackend::new());
    backend
        .seed(collections::PROSPECTS, "p-1", json!({"name": "X", "phone": "1"}))
        .await;
    backend
        .seed(collections::ACTIVITIES, "a-1", json!({"userId": "emp-1", "action": "x", "details": "y", "timestamp": "2026-01-01T00:00:00Z"}))
        .await;
    let service = service(&backend, 400);

    let refused = service.clear_all("delete everything").await;
    assert!(matches!(refused, Err(AppError::Validation(_))));
    assert_eq!(backend.dump(collections::PROSPECTS).await.len(), 1);

    service
        .clear_all(CLEAR_ALL_CONFIRMATION)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(backend.dump(collections::PROSPECTS).await.is_empty());
    assert!(backend.dump(collections::ACTIVITIES).await.is_empty());
}
