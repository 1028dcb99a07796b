use std::str::FromStr;

use ascend_core::{AppError, EmployeeId, TeamId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Pipeline status labels.
///
/// An unordered label set, not a gated state machine: the UI allows any
/// transition and the system enforces no ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProspectStatus {
    /// Freshly created, untouched.
    #[default]
    New,
    /// First contact made.
    Contacted,
    /// Scheduled for a follow-up conversation.
    FollowUp,
    /// Expressed interest in joining.
    Interested,
    /// Converted into a member.
    Joined,
    /// Dropped out of the pipeline.
    Lost,
}

impl ProspectStatus {
    /// Returns the stable storage value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Contacted => "contacted",
            Self::FollowUp => "follow-up",
            Self::Interested => "interested",
            Self::Joined => "joined",
            Self::Lost => "lost",
        }
    }

    /// Returns all statuses in funnel order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[ProspectStatus] = &[
            ProspectStatus::New,
            ProspectStatus::Contacted,
            ProspectStatus::FollowUp,
            ProspectStatus::Interested,
            ProspectStatus::Joined,
            ProspectStatus::Lost,
        ];

        ALL
    }

    /// Returns whether the prospect is still in active pipeline work.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Joined | Self::Lost)
    }
}

impl FromStr for ProspectStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "new" => Ok(Self::New),
            "contacted" => Ok(Self::Contacted),
            "follow-up" => Ok(Self::FollowUp),
            "interested" => Ok(Self::Interested),
            "joined" => Ok(Self::Joined),
            "lost" => Ok(Self::Lost),
            _ => Err(AppError::Validation(format!(
                "unknown prospect status '{value}'"
            ))),
        }
    }
}

/// Interest temperature recorded at triage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterestLevel {
    /// Lukewarm at best.
    Low,
    /// Undecided.
    #[default]
    Medium,
    /// Actively keen.
    High,
}

impl InterestLevel {
    /// Returns the stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Parses loosely-typed input, folding anything unknown to `Medium`.
    ///
    /// Imported CSVs and transferred leads carry free-form interest values.
    #[must_use]
    pub fn from_loose(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "low" => Self::Low,
            "high" | "hot" => Self::High,
            _ => Self::Medium,
        }
    }
}

/// Acquisition channel, normalized from free-form lead input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LeadSource {
    /// Instagram or other social outreach.
    Instagram,
    /// WhatsApp inbound.
    WhatsApp,
    /// Referred by an existing member.
    Referral,
    /// Met at an event.
    Event,
    /// Anything else, including the website form.
    #[default]
    Other,
}

impl LeadSource {
    /// Returns the stored display value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Instagram => "Instagram",
            Self::WhatsApp => "WhatsApp",
            Self::Referral => "Referral",
            Self::Event => "Event",
            Self::Other => "Other",
        }
    }

    /// Folds a free-form source string onto the known channel set.
    ///
    /// Substring matching mirrors the lead-form values: "social" counts as
    /// Instagram and "website" folds to Other.
    #[must_use]
    pub fn normalize(value: Option<&str>) -> Self {
        let Some(value) = value else {
            return Self::Other;
        };

        let lowered = value.to_lowercase();
        if lowered.contains("instagram") || lowered.contains("social") {
            Self::Instagram
        } else if lowered.contains("whatsapp") {
            Self::WhatsApp
        } else if lowered.contains("referral") {
            Self::Referral
        } else if lowered.contains("event") {
            Self::Event
        } else {
            Self::Other
        }
    }
}

/// The central pipeline entity.
///
/// A non-authoritative cached copy of a backend document: every field is
/// whatever the last subscription snapshot said, and mutations only ever go
/// through the store, never through local edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prospect {
    /// Document id; empty until the backend assigns one.
    #[serde(default)]
    pub id: String,
    /// Display name.
    pub name: String,
    /// Contact phone number, free-form.
    pub phone: String,
    /// Contact email; empty string when unknown.
    #[serde(default)]
    pub email: String,
    /// Age in years, if captured.
    #[serde(default)]
    pub age: Option<u32>,
    /// Occupation, free-form.
    #[serde(default)]
    pub occupation: String,
    /// Instagram handle without a leading `@`.
    #[serde(default)]
    pub instagram: String,
    /// City or region.
    #[serde(default)]
    pub location: String,
    /// Pipeline status label.
    #[serde(default)]
    pub status: ProspectStatus,
    /// Interest temperature.
    #[serde(default)]
    pub interest_level: InterestLevel,
    /// Acquisition channel.
    #[serde(default)]
    pub lead_source: LeadSource,
    /// Next follow-up date.
    #[serde(default)]
    pub follow_up_date: Option<NaiveDate>,
    /// Team the prospect is tracked under.
    #[serde(default)]
    pub team_id: Option<TeamId>,
    /// Employee currently working the prospect.
    #[serde(default)]
    pub assigned_to: Option<EmployeeId>,
    /// Owning employee, set at creation and never reassigned.
    #[serde(default)]
    pub owner_id: Option<EmployeeId>,
    /// Creating employee, set at creation and never reassigned.
    #[serde(default)]
    pub created_by: Option<EmployeeId>,
    /// Backend creation timestamp.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Backend last-update timestamp.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Free-form notes.
    #[serde(default)]
    pub notes: String,
}

impl Prospect {
    /// Returns the sort key for newest-first ordering.
    ///
    /// A missing creation timestamp sorts as the earliest possible time, so
    /// undated records sink to the bottom of a descending list.
    #[must_use]
    pub fn created_sort_key(&self) -> DateTime<Utc> {
        self.created_at.unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

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
    }

    /// Returns whether the prospect can be reached over a channel that
    /// requires a handle.
    #[must_use]
    pub fn has_instagram(&self) -> bool {
        !self.instagram.trim().is_empty()
    }

    /// Returns whether the prospect has an email on file.
    #[must_use]
    pub fn has_email(&self) -> bool {
        !self.email.trim().is_empty()
    }
}
