use ascend_core::EmployeeId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::prospect::Prospect;

/// Outbound channels a template can be sent over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// WhatsApp chat message.
    WhatsApp,
    /// Instagram direct message.
    Instagram,
    /// Plain email.
    Email,
}

impl Channel {
    /// Returns whether a prospect carries the handle this channel needs.
    ///
    /// WhatsApp only needs the phone number, which every prospect has.
    #[must_use]
    pub fn reaches(&self, prospect: &Prospect) -> bool {
        match self {
            Self::WhatsApp => true,
            Self::Instagram => prospect.has_instagram(),
            Self::Email => prospect.has_email(),
        }
    }
}

/// A reusable outbound message with `{{variable}}` placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageTemplate {
    /// Document id.
    #[serde(default)]
    pub id: String,
    /// Display name.
    pub name: String,
    /// Free-form template category used for list filtering.
    #[serde(rename = "type")]
    pub kind: String,
    /// Message body with placeholders.
    pub content: String,
    /// Creating employee.
    #[serde(default)]
    pub created_by: Option<EmployeeId>,
    /// Creation timestamp.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Last-update timestamp.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl MessageTemplate {
    /// Renders the template against one prospect.
    ///
    /// Each known placeholder is replaced with the prospect's value (empty
    /// string when absent); unknown placeholders stay verbatim so typos are
    /// visible in the preview instead of silently vanishing.
    #[must_use]
    pub fn render(&self, prospect: &Prospect) -> String {
        let age = prospect.age.map(|age| age.to_string()).unwrap_or_default();
        let replacements: [(&str, &str); 7] = [
            ("{{name}}", prospect.name.as_str()),
            ("{{phone}}", prospect.phone.as_str()),
            ("{{email}}", prospect.email.as_str()),
            ("{{location}}", prospect.location.as_str()),
            ("{{occupation}}", prospect.occupation.as_str()),
            ("{{instagram}}", prospect.instagram.as_str()),
            ("{{age}}", age.as_str()),
        ];

        let mut message = self.content.clone();
        for (placeholder, value) in replacements {
            message = message.replace(placeholder, value);
        }

        message
    }
}
