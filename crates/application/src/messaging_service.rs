//! Bulk message preparation.
//!
//! The CRM never talks to WhatsApp, Instagram or a mail server itself: the
//! surrounding shell opens deep links per prepared message. This module only
//! selects reachable prospects and renders the template per recipient.

use ascend_domain::{Channel, MessageTemplate, Prospect};

/// Where a prepared message should be delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageDestination {
    /// WhatsApp via phone number.
    Phone(String),
    /// Instagram via handle (leading `@` stripped).
    Instagram(String),
    /// Plain email address.
    Email(String),
}

/// One rendered outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedMessage {
    /// Recipient prospect document id.
    pub prospect_id: String,
    /// Recipient display name, for the activity log line.
    pub prospect_name: String,
    /// Channel-specific destination.
    pub destination: MessageDestination,
    /// Fully rendered message body.
    pub body: String,
}

/// Renders a template for every selected, reachable prospect.
///
/// Prospects missing the channel handle (no Instagram handle, no email) are
/// silently skipped, matching the selection UI which filters them out of the
/// picker for those channels.
#[must_use]
pub fn prepare_bulk_messages(
    template: &MessageTemplate,
    recipients: &[&Prospect],
    channel: Channel,
) -> Vec<PreparedMessage> {
    recipients
        .iter()
        .filter(|prospect| channel.reaches(prospect))
        .map(|prospect| {
            let destination = match channel {
                Channel::WhatsApp => {
                    MessageDestination::Phone(prospect.phone.replace([' ', '+'], ""))
                }
                Channel::Instagram => MessageDestination::Instagram(
                    prospect.instagram.trim_start_matches('@').trim().to_owned(),
                ),
                Channel::Email => MessageDestination::Email(prospect.email.clone()),
            };

            PreparedMessage {
                prospect_id: prospect.id.clone(),
                prospect_name: prospect.name.clone(),
                destination,
                body: template.render(prospect),
            }
        })
        .collect()
}

/// Activity-log action label for a channel send.
#[must_use]
pub fn send_action_label(channel: Channel) -> &'static str {
    match channel {
        Channel::WhatsApp => "WhatsApp Message Sent",
        Channel::Instagram => "Instagram Message Sent",
        Channel::Email => "Email Sent",
    }
}
