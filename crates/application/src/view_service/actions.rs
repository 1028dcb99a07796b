use ascend_core::{AppError, AppResult, EmployeeId, TeamId};
use ascend_domain::{
    can_edit, can_reassign, Activity, Capability, Channel, InterestLevel, LeadSource,
    PermissionModule, Prospect, ProspectStatus, Team, UserProfile,
};
use chrono::{NaiveDate, Utc};
use serde_json::json;

use super::ViewController;
use crate::data_service::{
    export_activities_csv, export_leads_csv, export_performance_csv, export_prospects_csv,
    export_source_counts_csv, export_status_counts_csv, RestoreSummary,
};
use crate::messaging_service::{prepare_bulk_messages, send_action_label, PreparedMessage};
use crate::store_ports::{collections, encode_entity, BatchWrite};

/// Add-prospect form payload.
#[derive(Debug, Clone, Default)]
pub struct NewProspectInput {
    /// Required display name.
    pub name: String,
    /// Required phone number.
    pub phone: String,
    /// Optional email.
    pub email: String,
    /// Optional age.
    pub age: Option<u32>,
    /// Optional occupation.
    pub occupation: String,
    /// Optional Instagram handle.
    pub instagram: String,
    /// Optional location.
    pub location: String,
    /// Interest temperature.
    pub interest_level: InterestLevel,
    /// Acquisition channel.
    pub lead_source: LeadSource,
    /// Follow-up date.
    pub follow_up_date: Option<NaiveDate>,
    /// Chosen assignee; defaults to the acting user.
    pub assigned_to: Option<EmployeeId>,
    /// Team to track under; defaults to the acting user's team.
    pub team_id: Option<TeamId>,
    /// Free-form notes.
    pub notes: String,
}

/// Edit-prospect form payload. Ownership fields are absent on purpose;
/// `ownerId` and `createdBy` are set at creation and never reassigned.
#[derive(Debug, Clone)]
pub struct ProspectUpdate {
    /// Display name.
    pub name: String,
    /// Phone number.
    pub phone: String,
    /// Email.
    pub email: String,
    /// Age.
    pub age: Option<u32>,
    /// Occupation.
    pub occupation: String,
    /// Instagram handle.
    pub instagram: String,
    /// Location.
    pub location: String,
    /// Status label.
    pub status: ProspectStatus,
    /// Interest temperature.
    pub interest_level: InterestLevel,
    /// Acquisition channel.
    pub lead_source: LeadSource,
    /// Follow-up date.
    pub follow_up_date: Option<NaiveDate>,
    /// New assignee, if reassigning.
    pub assigned_to: Option<EmployeeId>,
    /// Notes.
    pub notes: String,
}

/// Template create/update payload.
#[derive(Debug, Clone)]
pub struct TemplateDraft {
    /// Existing template id; `None` creates a new one.
    pub id: Option<String>,
    /// Display name.
    pub name: String,
    /// Free-form category.
    pub kind: String,
    /// Body with `{{variable}}` placeholders.
    pub content: String,
}

/// Team create/update payload.
#[derive(Debug, Clone)]
pub struct TeamDraft {
    /// Display name.
    pub name: String,
    /// Leading employee.
    pub leader_id: Option<EmployeeId>,
    /// Member employee ids.
    pub members: Vec<EmployeeId>,
}

/// CSV report selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// Every canonical prospect.
    Prospects,
    /// Count per status.
    StatusCounts,
    /// Count per lead source.
    SourceCounts,
    /// Raw leads.
    Leads,
    /// The recent activity trail.
    Activities,
    /// Per-employee assignments and conversions.
    EmployeePerformance,
}

impl ViewController {
    /// Adds a prospect. Requires the add capability; name and phone are the
    /// two required form fields.
    pub async fn add_prospect(&self, input: NewProspectInput) -> AppResult<String> {
        self.begin_action();
        let result = self.add_prospect_inner(input).await;
        self.finish_action(Some("Prospect added successfully"), result)
            .await
    }

    async fn add_prospect_inner(&self, input: NewProspectInput) -> AppResult<String> {
        self.guard(PermissionModule::ProspectManagement, Capability::Add)
            .await?;
        if input.name.trim().is_empty() || input.phone.trim().is_empty() {
            return Err(AppError::Validation(
                "name and phone are required".to_owned(),
            ));
        }

        let user = self.session.user().await;
        let me = user.employee_id().clone();
        let now = Utc::now();
        let lead_source = input.lead_source;
        let prospect = Prospect {
            id: String::new(),
            name: input.name,
            phone: input.phone,
            email: input.email,
            age: input.age,
            occupation: input.occupation,
            instagram: input.instagram,
            location: input.location,
            status: ProspectStatus::New,
            interest_level: input.interest_level,
            lead_source,
            follow_up_date: input.follow_up_date,
            team_id: input.team_id.or_else(|| user.team_id().cloned()),
            assigned_to: Some(input.assigned_to.unwrap_or_else(|| me.clone())),
            owner_id: Some(me.clone()),
            created_by: Some(me),
            created_at: Some(now),
            updated_at: Some(now),
            notes: input.notes,
        };

        let id = self
            .session
            .store()
            .add(collections::PROSPECTS, encode_entity(&prospect)?)
            .await?;
        self.log_activity(
            "Prospect Added",
            format!("Added {} from {}", prospect.name, lead_source.as_str()),
        )
        .await;

        Ok(id)
    }

    /// Inline status change from the prospect table.
    pub async fn update_prospect_status(
        &self,
        prospect_id: &str,
        status: ProspectStatus,
    ) -> AppResult<()> {
        self.begin_action();
        let result = self.update_prospect_status_inner(prospect_id, status).await;
        self.finish_action(None, result).await
    }

    async fn update_prospect_status_inner(
        &self,
        prospect_id: &str,
        status: ProspectStatus,
    ) -> AppResult<()> {
        self.guard(PermissionModule::ProspectManagement, Capability::Edit)
            .await?;
        let (user, prospect) = self.user_and_prospect(prospect_id).await?;
        require_entity_access(&user, &prospect)?;

        self.session
            .store()
            .update(
                collections::PROSPECTS,
                prospect_id,
                json!({"status": status, "updatedAt": Utc::now()}),
            )
            .await
    }

    /// Full-form prospect edit, including reassignment.
    pub async fn edit_prospect(&self, prospect_id: &str, update: ProspectUpdate) -> AppResult<()> {
        self.begin_action();
        let result = self.edit_prospect_inner(prospect_id, update).await;
        self.finish_action(Some("Prospect updated successfully"), result)
            .await
    }

    async fn edit_prospect_inner(
        &self,
        prospect_id: &str,
        update: ProspectUpdate,
    ) -> AppResult<()> {
        self.guard(PermissionModule::ProspectManagement, Capability::Edit)
            .await?;
        let (user, prospect) = self.user_and_prospect(prospect_id).await?;
        require_entity_access(&user, &prospect)?;

        if update.assigned_to != prospect.assigned_to {
            let target_team = match &update.assigned_to {
                Some(target) => self.team_of_employee(target).await,
                None => None,
            };
            if !can_reassign(&user, &prospect, target_team.as_ref()) {
                return Err(AppError::Forbidden(
                    "reassignment outside your team is not allowed".to_owned(),
                ));
            }
        }

        self.session
            .store()
            .update(
                collections::PROSPECTS,
                prospect_id,
                json!({
                    "name": update.name,
                    "phone": update.phone,
                    "email": update.email,
                    "age": update.age,
                    "occupation": update.occupation,
                    "instagram": update.instagram,
                    "location": update.location,
                    "status": update.status,
                    "interestLevel": update.interest_level,
                    "leadSource": update.lead_source,
                    "followUpDate": update.follow_up_date,
                    "assignedTo": update.assigned_to,
                    "notes": update.notes,
                    "updatedAt": Utc::now(),
                }),
            )
            .await
    }

    /// Deletes a prospect.
    pub async fn delete_prospect(&self, prospect_id: &str) -> AppResult<()> {
        self.begin_action();
        let result = self.delete_prospect_inner(prospect_id).await;
        self.finish_action(Some("Prospect deleted successfully"), result)
            .await
    }

    async fn delete_prospect_inner(&self, prospect_id: &str) -> AppResult<()> {
        self.guard(PermissionModule::ProspectManagement, Capability::Delete)
            .await?;
        let (user, prospect) = self.user_and_prospect(prospect_id).await?;
        require_entity_access(&user, &prospect)?;

        self.session
            .store()
            .delete(collections::PROSPECTS, prospect_id)
            .await?;
        self.log_activity("Prospect Deleted", format!("Deleted {}", prospect.name))
            .await;

        Ok(())
    }

    /// One-way transfer of a lead into the prospect pipeline.
    ///
    /// Copies and maps the lead's fields, stamps ownership with the acting
    /// user, writes the prospect, then deletes the lead. Not reversible.
    pub async fn transfer_lead(&self, lead_id: &str) -> AppResult<String> {
        self.begin_action();
        let result = self.transfer_lead_inner(lead_id).await;
        self.finish_action(Some("Lead transferred successfully"), result)
            .await
    }

    async fn transfer_lead_inner(&self, lead_id: &str) -> AppResult<String> {
        self.guard(PermissionModule::LeadManagement, Capability::Edit)
            .await?;
        let lead = self
            .session
            .with_state(|state| state.lead(lead_id).cloned())
            .await
            .ok_or_else(|| AppError::NotFound(format!("lead '{lead_id}' not found")))?;

        let user = self.session.user().await;
        let name = lead.name.clone();
        let prospect = lead.into_prospect(
            user.employee_id().clone(),
            user.team_id().cloned(),
            Utc::now(),
        );

        let store = self.session.store();
        let id = store
            .add(collections::PROSPECTS, encode_entity(&prospect)?)
            .await?;
        store.delete(collections::JOIN_REQUESTS, lead_id).await?;
        self.log_activity("Lead Transferred", format!("{name} promoted to Prospect."))
            .await;

        Ok(id)
    }

    /// Deletes a single lead.
    pub async fn delete_lead(&self, lead_id: &str) -> AppResult<()> {
        self.begin_action();
        let result = self.delete_lead_inner(lead_id).await;
        self.finish_action(Some("Lead deleted successfully"), result)
            .await
    }

    async fn delete_lead_inner(&self, lead_id: &str) -> AppResult<()> {
        self.guard(PermissionModule::LeadManagement, Capability::Delete)
            .await?;
        self.session
            .store()
            .delete(collections::JOIN_REQUESTS, lead_id)
            .await
    }

    /// Bulk-deletes selected leads through chunked batches.
    pub async fn delete_selected_leads(&self, lead_ids: &[String]) -> AppResult<usize> {
        self.begin_action();
        let result = self.delete_selected_leads_inner(lead_ids).await;
        self.finish_action(Some("Leads deleted successfully"), result)
            .await
    }

    async fn delete_selected_leads_inner(&self, lead_ids: &[String]) -> AppResult<usize> {
        self.guard(PermissionModule::LeadManagement, Capability::Delete)
            .await?;
        if lead_ids.is_empty() {
            return Err(AppError::Validation("no leads selected".to_owned()));
        }

        let writes: Vec<BatchWrite> = lead_ids
            .iter()
            .map(|id| BatchWrite::Delete {
                collection: collections::JOIN_REQUESTS.to_owned(),
                id: id.clone(),
            })
            .collect();

        self.data.commit_chunked(writes).await
    }

    /// Creates or updates a message template.
    pub async fn save_template(&self, draft: TemplateDraft) -> AppResult<()> {
        self.begin_action();
        let success = if draft.id.is_some() {
            "Template updated successfully"
        } else {
            "Template created successfully"
        };
        let result = self.save_template_inner(draft).await;
        self.finish_action(Some(success), result).await
    }

    async fn save_template_inner(&self, draft: TemplateDraft) -> AppResult<()> {
        if draft.name.trim().is_empty() || draft.content.trim().is_empty() {
            return Err(AppError::Validation(
                "template name and content are required".to_owned(),
            ));
        }

        let now = Utc::now();
        let store = self.session.store();
        match draft.id {
            Some(id) => {
                self.guard(PermissionModule::WhatsappTemplates, Capability::Edit)
                    .await?;
                store
                    .update(
                        collections::TEMPLATES,
                        &id,
                        json!({
                            "name": draft.name,
                            "type": draft.kind,
                            "content": draft.content,
                            "updatedAt": now,
                        }),
                    )
                    .await
            }
            None => {
                self.guard(PermissionModule::WhatsappTemplates, Capability::Add)
                    .await?;
                let user = self.session.user().await;
                store
                    .add(
                        collections::TEMPLATES,
                        json!({
                            "name": draft.name,
                            "type": draft.kind,
                            "content": draft.content,
                            "createdBy": user.employee_id(),
                            "createdAt": now,
                            "updatedAt": now,
                        }),
                    )
                    .await?;
                Ok(())
            }
        }
    }

    /// Deletes a template.
    pub async fn delete_template(&self, template_id: &str) -> AppResult<()> {
        self.begin_action();
        let result = self.delete_template_inner(template_id).await;
        self.finish_action(Some("Template deleted successfully"), result)
            .await
    }

    async fn delete_template_inner(&self, template_id: &str) -> AppResult<()> {
        self.guard(PermissionModule::WhatsappTemplates, Capability::Delete)
            .await?;
        self.session
            .store()
            .delete(collections::TEMPLATES, template_id)
            .await
    }

    /// Renders a template against the selected prospects for one channel.
    ///
    /// Read-only apart from the activity trail; the surrounding shell opens
    /// the actual deep links.
    pub async fn prepare_bulk_send(
        &self,
        template_id: &str,
        prospect_ids: &[String],
        channel: Channel,
    ) -> AppResult<Vec<PreparedMessage>> {
        self.guard(PermissionModule::WhatsappTemplates, Capability::View)
            .await?;
        if prospect_ids.is_empty() {
            return Err(AppError::Validation("no prospects selected".to_owned()));
        }

        let (template, recipients) = self
            .session
            .with_state(|state| {
                let template = state.template(template_id).cloned();
                let recipients: Vec<Prospect> = prospect_ids
                    .iter()
                    .filter_map(|id| state.prospect(id).cloned())
                    .collect();
                (template, recipients)
            })
            .await;
        let template = template
            .ok_or_else(|| AppError::NotFound(format!("template '{template_id}' not found")))?;

        let borrowed: Vec<&Prospect> = recipients.iter().collect();
        let messages = prepare_bulk_messages(&template, &borrowed, channel);
        for message in &messages {
            self.log_activity(
                send_action_label(channel),
                format!("Sent to {}", message.prospect_name),
            )
            .await;
        }

        Ok(messages)
    }

    /// Creates a team.
    pub async fn create_team(&self, draft: TeamDraft) -> AppResult<String> {
        self.begin_action();
        let result = self.create_team_inner(draft).await;
        self.finish_action(Some("Team created successfully"), result)
            .await
    }

    async fn create_team_inner(&self, draft: TeamDraft) -> AppResult<String> {
        self.guard(PermissionModule::TeamManagement, Capability::Add)
            .await?;
        if draft.name.trim().is_empty() {
            return Err(AppError::Validation("team name is required".to_owned()));
        }

        let team = Team {
            id: String::new(),
            name: draft.name,
            leader_id: draft.leader_id,
            members: draft.members,
        };
        self.session
            .store()
            .add(collections::TEAMS, encode_entity(&team)?)
            .await
    }

    /// Updates a team's name, leader or membership.
    pub async fn update_team(&self, team_id: &str, draft: TeamDraft) -> AppResult<()> {
        self.begin_action();
        let result = self.update_team_inner(team_id, draft).await;
        self.finish_action(Some("Team updated successfully"), result)
            .await
    }

    async fn update_team_inner(&self, team_id: &str, draft: TeamDraft) -> AppResult<()> {
        self.guard(PermissionModule::TeamManagement, Capability::Edit)
            .await?;
        self.session
            .store()
            .update(
                collections::TEAMS,
                team_id,
                json!({
                    "name": draft.name,
                    "leaderId": draft.leader_id,
                    "members": draft.members,
                }),
            )
            .await
    }

    /// Deletes a team.
    pub async fn delete_team(&self, team_id: &str) -> AppResult<()> {
        self.begin_action();
        let result = self.delete_team_inner(team_id).await;
        self.finish_action(Some("Team deleted successfully"), result)
            .await
    }

    async fn delete_team_inner(&self, team_id: &str) -> AppResult<()> {
        self.guard(PermissionModule::TeamManagement, Capability::Delete)
            .await?;
        self.session
            .store()
            .delete(collections::TEAMS, team_id)
            .await
    }

    /// Renders one of the CSV reports.
    pub async fn generate_report(&self, kind: ReportKind) -> AppResult<String> {
        self.guard(PermissionModule::DataManagement, Capability::View)
            .await?;
        self.session
            .with_state(|state| match kind {
                ReportKind::Prospects => {
                    export_prospects_csv(state.prospects(), state.employees())
                }
                ReportKind::StatusCounts => export_status_counts_csv(state.prospects()),
                ReportKind::SourceCounts => export_source_counts_csv(state.prospects()),
                ReportKind::Leads => export_leads_csv(state.leads()),
                ReportKind::Activities => {
                    export_activities_csv(state.activities(), state.employees())
                }
                ReportKind::EmployeePerformance => {
                    export_performance_csv(state.employees(), state.prospects())
                }
            })
            .await
    }

    /// Imports prospects from CSV text, chunked.
    pub async fn import_prospects_csv(&self, csv_text: &str) -> AppResult<usize> {
        self.begin_action();
        let result = self.import_prospects_csv_inner(csv_text).await;
        self.finish_action(Some("Prospects imported successfully"), result)
            .await
    }

    async fn import_prospects_csv_inner(&self, csv_text: &str) -> AppResult<usize> {
        self.guard(PermissionModule::DataManagement, Capability::Add)
            .await?;
        let user = self.session.user().await;
        let imported = self
            .data
            .import_prospects(csv_text, &user, Utc::now())
            .await?;
        self.log_activity(
            "Prospects Imported",
            format!("Imported {imported} prospects via CSV"),
        )
        .await;

        Ok(imported)
    }

    /// Serializes the canonical prospect and lead sets into a backup file.
    pub async fn create_backup(&self) -> AppResult<String> {
        self.guard(PermissionModule::DataManagement, Capability::View)
            .await?;
        self.session
            .with_state(|state| {
                crate::data_service::DataAdminService::create_backup(
                    state.prospects(),
                    state.leads(),
                    Utc::now(),
                )
            })
            .await
    }

    /// Restores a backup file, clearing the current collections first.
    pub async fn restore_backup(&self, backup_text: &str) -> AppResult<RestoreSummary> {
        self.begin_action();
        let result = self.restore_backup_inner(backup_text).await;
        self.finish_action(Some("System restored successfully"), result)
            .await
    }

    async fn restore_backup_inner(&self, backup_text: &str) -> AppResult<RestoreSummary> {
        self.guard(PermissionModule::DataManagement, Capability::Edit)
            .await?;
        self.data.restore_backup(backup_text).await
    }

    /// Clears prospects, leads and activities after a typed confirmation.
    pub async fn clear_all_data(&self, confirmation: &str) -> AppResult<()> {
        self.begin_action();
        let result = self.clear_all_data_inner(confirmation).await;
        self.finish_action(Some("All system data cleared successfully"), result)
            .await
    }

    async fn clear_all_data_inner(&self, confirmation: &str) -> AppResult<()> {
        self.guard(PermissionModule::DataManagement, Capability::Delete)
            .await?;
        self.data.clear_all(confirmation).await
    }

    /// Client-side search over the canonical prospect list.
    ///
    /// Matches name, phone and email, like the table search box; an empty
    /// term returns everything.
    pub async fn search_prospects(&self, term: &str) -> Vec<Prospect> {
        self.session
            .with_state(|state| {
                state
                    .prospects()
                    .iter()
                    .filter(|prospect| prospect.matches_search(term))
                    .cloned()
                    .collect()
            })
            .await
    }

    /// Client-side search over the lead list (name, phone, email, location).
    pub async fn search_leads(&self, term: &str) -> Vec<ascend_domain::Lead> {
        self.session
            .with_state(|state| {
                state
                    .leads()
                    .iter()
                    .filter(|lead| lead.matches_search(term))
                    .cloned()
                    .collect()
            })
            .await
    }

    async fn user_and_prospect(&self, prospect_id: &str) -> AppResult<(UserProfile, Prospect)> {
        let (user, prospect) = self
            .session
            .with_state(|state| (state.user().clone(), state.prospect(prospect_id).cloned()))
            .await;
        let prospect = prospect
            .ok_or_else(|| AppError::NotFound(format!("prospect '{prospect_id}' not found")))?;

        Ok((user, prospect))
    }

    async fn team_of_employee(&self, employee_id: &EmployeeId) -> Option<TeamId> {
        self.session
            .with_state(|state| {
                state
                    .teams()
                    .iter()
                    .find(|team| team.includes(employee_id))
                    .map(ascend_domain::Team::team_id)
            })
            .await
    }

    /// Best-effort audit trail; failures are logged, never surfaced.
    async fn log_activity(&self, action: &str, details: String) {
        let user = self.session.user().await;
        let activity = Activity {
            id: String::new(),
            user_id: user.employee_id().clone(),
            action: action.to_owned(),
            details,
            timestamp: Utc::now(),
        };

        let write = async {
            self.session
                .store()
                .add(collections::ACTIVITIES, encode_entity(&activity)?)
                .await
        };
        if let Err(error) = write.await {
            tracing::warn!(%error, action, "activity log write failed");
        }
    }
}

/// Shared entity-level check for the action-handler path.
///
/// The row-render path derives its buttons from the same `access_level`
/// call, so the two can never disagree.
fn require_entity_access(user: &UserProfile, prospect: &Prospect) -> AppResult<()> {
    if can_edit(user, prospect) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "no entity-level access to prospect '{}'",
            prospect.id
        )))
    }
}
