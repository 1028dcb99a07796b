use ascend_core::{EmployeeId, TeamId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::prospect::{InterestLevel, LeadSource, Prospect, ProspectStatus};

/// A raw inbound join request awaiting triage.
///
/// Leads come straight off the public submission form, so almost every field
/// is optional and several arrived under older names (`whatTheyDo`,
/// `instagramId`) that are still accepted on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    /// Document id.
    #[serde(default)]
    pub id: String,
    /// Submitted name.
    pub name: String,
    /// Submitted phone number.
    pub phone: String,
    /// Submitted email; empty when left blank.
    #[serde(default)]
    pub email: String,
    /// Age in years, if provided.
    #[serde(default)]
    pub age: Option<u32>,
    /// City or region.
    #[serde(default)]
    pub location: String,
    /// Occupation; the legacy form field was `whatTheyDo`.
    #[serde(default, alias = "whatTheyDo")]
    pub occupation: String,
    /// Instagram handle; the legacy form field was `instagramId`.
    #[serde(default, alias = "instagramId")]
    pub instagram: String,
    /// Self-reported interest, free-form.
    #[serde(default)]
    pub interest_level: Option<String>,
    /// Where the lead says they heard about us, free-form.
    #[serde(default)]
    pub lead_source: Option<String>,
    /// Requested follow-up date.
    #[serde(default)]
    pub follow_up_date: Option<NaiveDate>,
    /// Motivation text from the form.
    #[serde(default)]
    pub why_want_to_join: Option<String>,
    /// Free-form notes added during triage.
    #[serde(default)]
    pub notes: Option<String>,
    /// Submission timestamp.
    #[serde(default, rename = "timestamp")]
    pub submitted_at: Option<DateTime<Utc>>,
}

impl Lead {
    /// Returns whether any searchable field contains the term.
    #[must_use]
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }

        self.name.to_lowercase().contains(&term)
            || self.phone.contains(&term)
            || self.email.to_lowercase().contains(&term)
            || self.location.to_lowercase().contains(&term)
    }

    /// Maps this lead into a new prospect for the one-way transfer.
    ///
    /// The transfer is non-reversible: the caller writes the returned
    /// prospect and then deletes the lead. Ownership fields are stamped with
    /// the transferring user and are never reassigned afterwards.
    #[must_use]
    pub fn into_prospect(
        self,
        assignee: EmployeeId,
        team_id: Option<TeamId>,
        now: DateTime<Utc>,
    ) -> Prospect {
        let mut notes = format!("Transferred from Leads on {}.", now.format("%Y-%m-%d"));
        if let Some(why) = self
            .why_want_to_join
            .as_deref()
            .filter(|text| !text.trim().is_empty())
        {
            notes.push_str("\nWhy Join: ");
            notes.push_str(why);
        }
        if let Some(original) = self.notes.as_deref().filter(|text| !text.trim().is_empty()) {
            notes.push_str("\nOriginal notes: ");
            notes.push_str(original);
        }

        Prospect {
            id: String::new(),
            name: self.name,
            phone: self.phone,
            email: self.email,
            age: self.age,
            occupation: self.occupation,
            instagram: self.instagram,
            location: if self.location.trim().is_empty() {
                "Unknown".to_owned()
            } else {
                self.location
            },
            status: ProspectStatus::New,
            interest_level: self
                .interest_level
                .as_deref()
                .map(InterestLevel::from_loose)
                .unwrap_or_default(),
            lead_source: LeadSource::normalize(self.lead_source.as_deref()),
            follow_up_date: self.follow_up_date,
            team_id,
            assigned_to: Some(assignee.clone()),
            owner_id: Some(assignee.clone()),
            created_by: Some(assignee),
            created_at: Some(now),
            updated_at: Some(now),
            notes,
        }
    }
}

#[cfg(test)]
mod tests {
    use ascend_core::EmployeeId;
    use chrono::{TimeZone, Utc};

    use super::Lead;
    use crate::prospect::{InterestLevel, LeadSource, ProspectStatus};

    fn lead() -> Lead {
        Lead {
            id: "lead-1".to_owned(),
            name: "Ravi Kumar".to_owned(),
            phone: "98765".to_owned(),
            email: String::new(),
            age: Some(24),
            location: String::new(),
            occupation: "student".to_owned(),
            instagram: "ravi.k".to_owned(),
            interest_level: Some("Hot".to_owned()),
            lead_source: Some("instagram story".to_owned()),
            follow_up_date: None,
            why_want_to_join: Some("extra income".to_owned()),
            notes: None,
            submitted_at: None,
        }
    }

    #[test]
    fn transfer_maps_and_defaults_fields() {
        let now = Utc
            .with_ymd_and_hms(2026, 3, 14, 9, 0, 0)
            .single()
            .unwrap_or_else(|| unreachable!());
        let prospect = lead().into_prospect(EmployeeId::from_raw("emp-9"), None, now);

        assert_eq!(prospect.status, ProspectStatus::New);
        assert_eq!(prospect.interest_level, InterestLevel::High);
        assert_eq!(prospect.lead_source, LeadSource::Instagram);
        assert_eq!(prospect.location, "Unknown");
        assert_eq!(prospect.assigned_to, Some(EmployeeId::from_raw("emp-9")));
        assert_eq!(prospect.owner_id, Some(EmployeeId::from_raw("emp-9")));
        assert!(prospect.notes.starts_with("Transferred from Leads on 2026-03-14."));
        assert!(prospect.notes.contains("Why Join: extra income"));
    }

    #[test]
    fn legacy_field_names_still_deserialize() {
        let parsed: Lead = serde_json::from_str(
            r#"{"name":"A","phone":"1","whatTheyDo":"farmer","instagramId":"a.b"}"#,
        )
        .unwrap_or_else(|_| unreachable!());
        assert_eq!(parsed.occupation, "farmer");
        assert_eq!(parsed.instagram, "a.b");
    }
}
