//! Ascend CRM console harness.
//!
//! Wires the real services against the in-memory backend, signs in with the
//! demo account and walks a few flows end to end. There is no interactive
//! surface; this exists so the session, view and data layers can be watched
//! under tracing without a hosted backend.

#![forbid(unsafe_code)]

mod console_config;
mod dev_seed;

use std::sync::Arc;

use ascend_application::{
    sign_in_and_start, BatchConfig, NewProspectInput, Page, PageView, ReportKind, ViewController,
};
use ascend_core::{AppError, AppResult};
use ascend_domain::{Channel, InterestLevel, LeadSource};
use ascend_infrastructure::{InMemoryAuthGateway, InMemoryDocumentStore};
use tracing::info;

use console_config::{init_tracing, ConsoleConfig};

#[tokio::main]
async fn main() -> AppResult<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ConsoleConfig::load()?;

    let store = Arc::new(InMemoryDocumentStore::new());
    if config.seed_demo_data {
        dev_seed::seed(&store, &config.demo_email).await;
    }
    let auth = Arc::new(InMemoryAuthGateway::new([(
        config.demo_email.clone(),
        config.demo_password.clone(),
    )]));

    let session = sign_in_and_start(
        store,
        auth,
        &config.demo_email,
        &config.demo_password,
    )
    .await?;
    let user = session.user().await;
    info!(name = user.name(), role = user.role().as_str(), "session started");

    let controller = ViewController::new(
        Arc::clone(&session),
        BatchConfig {
            chunk_size: config.batch_chunk_size,
        },
    );
    let mut render_signal = session.render_signal();

    let model = controller.navigate_to(Page::Dashboard).await;
    if let PageView::Dashboard(dashboard) = &model.body {
        info!(
            total = dashboard.metrics.total_prospects,
            engaged = dashboard.metrics.engaged_prospects,
            joined = dashboard.metrics.joined_members,
            "dashboard"
        );
    }

    let added_id = controller
        .add_prospect(NewProspectInput {
            name: "Kiran Patel".to_owned(),
            phone: "+91 90000 77777".to_owned(),
            location: "Surat".to_owned(),
            interest_level: InterestLevel::High,
            lead_source: LeadSource::Referral,
            ..NewProspectInput::default()
        })
        .await?;
    render_signal
        .changed()
        .await
        .map_err(|_| AppError::Internal("session ended unexpectedly".to_owned()))?;
    info!(id = added_id.as_str(), "prospect added and echoed back");

    let first_lead = session
        .with_state(|state| state.leads().first().map(|lead| lead.id.clone()))
        .await;
    if let Some(lead_id) = first_lead {
        let prospect_id = controller.transfer_lead(&lead_id).await?;
        info!(from = lead_id.as_str(), to = prospect_id.as_str(), "lead transferred");
    }

    let template_id = session
        .with_state(|state| state.templates().first().map(|template| template.id.clone()))
        .await;
    if let Some(template_id) = template_id {
        let prospect_ids: Vec<String> = session
            .with_state(|state| state.prospects().iter().map(|p| p.id.clone()).collect())
            .await;
        let messages = controller
            .prepare_bulk_send(&template_id, &prospect_ids, Channel::WhatsApp)
            .await?;
        info!(count = messages.len(), "bulk messages rendered");
    }

    let report = controller.generate_report(ReportKind::StatusCounts).await?;
    info!(lines = report.lines().count(), "status report rendered");

    let backup = controller.create_backup().await?;
    info!(bytes = backup.len(), "backup created");

    for notice in controller.take_notices().await {
        info!(kind = ?notice.kind, notice = notice.text.as_str(), "notice");
    }

    session.sign_out().await?;
    info!("session closed");

    Ok(())
}
