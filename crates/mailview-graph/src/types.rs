//! Wire shapes from the Graph API and the flat rows the pages render.

use serde::Deserialize;

/// Rendered when a message has no from-address or a contact has no
/// email addresses.
pub const NONE_SENTINEL: &str = "NONE";

// ── Wire shapes ────────────────────────────────────────────────────

/// Response wrapper for Graph list endpoints
#[derive(Debug, Deserialize)]
pub struct GraphListResponse<T> {
    pub value: Vec<T>,
}

/// The signed-in user from `/me`
#[derive(Debug, Clone, Deserialize)]
pub struct GraphUser {
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
    pub mail: Option<String>,
    #[serde(rename = "userPrincipalName")]
    pub user_principal_name: Option<String>,
}

impl GraphUser {
    /// Best mailbox address for the user. Organizational accounts carry
    /// `mail`; consumer accounts only have `userPrincipalName`.
    pub fn address(&self) -> Option<&str> {
        self.mail
            .as_deref()
            .or(self.user_principal_name.as_deref())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphRecipient {
    #[serde(rename = "emailAddress")]
    pub email_address: GraphEmailAddress,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphEmailAddress {
    pub name: Option<String>,
    pub address: Option<String>,
}

/// A message envelope from the inbox list query
#[derive(Debug, Clone, Deserialize)]
pub struct GraphMessage {
    pub subject: Option<String>,
    pub from: Option<GraphRecipient>,
    #[serde(rename = "receivedDateTime")]
    pub received_date_time: Option<String>,
    #[serde(rename = "isRead")]
    pub is_read: bool,
}

/// Graph splits event times into a naive timestamp plus a zone name
#[derive(Debug, Clone, Deserialize)]
pub struct GraphDateTime {
    #[serde(rename = "dateTime")]
    pub date_time: String,
    #[serde(rename = "timeZone")]
    pub time_zone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphAttendeeStatus {
    pub response: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphAttendee {
    #[serde(rename = "emailAddress")]
    pub email_address: GraphEmailAddress,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub status: Option<GraphAttendeeStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphEvent {
    pub subject: Option<String>,
    pub start: Option<GraphDateTime>,
    pub end: Option<GraphDateTime>,
    #[serde(default)]
    pub attendees: Vec<GraphAttendee>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphContact {
    #[serde(rename = "givenName")]
    pub given_name: Option<String>,
    pub surname: Option<String>,
    #[serde(rename = "emailAddresses", default)]
    pub email_addresses: Vec<GraphEmailAddress>,
}

// ── Display rows ───────────────────────────────────────────────────

/// One inbox table row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRow {
    pub from: String,
    pub subject: String,
    pub received: String,
    pub is_read: bool,
}

impl From<GraphMessage> for MessageRow {
    fn from(message: GraphMessage) -> Self {
        let from = message
            .from
            .and_then(|r| r.email_address.name)
            .unwrap_or_else(|| NONE_SENTINEL.to_string());

        MessageRow {
            from,
            subject: message.subject.unwrap_or_default(),
            received: message.received_date_time.unwrap_or_default(),
            is_read: message.is_read,
        }
    }
}

/// One calendar table row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRow {
    pub subject: String,
    pub start: String,
    pub end: String,
    /// Plain-text, one entry per attendee
    pub attendee_summary: String,
}

impl From<GraphEvent> for EventRow {
    fn from(event: GraphEvent) -> Self {
        let attendee_summary = event
            .attendees
            .iter()
            .map(describe_attendee)
            .collect::<Vec<_>>()
            .join("; ");

        EventRow {
            subject: event.subject.unwrap_or_default(),
            start: event.start.map(|t| t.date_time).unwrap_or_default(),
            end: event.end.map(|t| t.date_time).unwrap_or_default(),
            attendee_summary,
        }
    }
}

fn describe_attendee(attendee: &GraphAttendee) -> String {
    format!(
        "Name: {} Email: {} Type: {} Response: {}",
        attendee.email_address.name.as_deref().unwrap_or(""),
        attendee.email_address.address.as_deref().unwrap_or(""),
        attendee.kind.as_deref().unwrap_or(""),
        attendee
            .status
            .as_ref()
            .and_then(|s| s.response.as_deref())
            .unwrap_or(""),
    )
}

/// One contacts table row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactRow {
    pub given_name: String,
    pub surname: String,
    pub primary_email: String,
}

impl From<GraphContact> for ContactRow {
    fn from(contact: GraphContact) -> Self {
        let primary_email = contact
            .email_addresses
            .into_iter()
            .next()
            .and_then(|a| a.address)
            .unwrap_or_else(|| NONE_SENTINEL.to_string());

        ContactRow {
            given_name: contact.given_name.unwrap_or_default(),
            surname: contact.surname.unwrap_or_default(),
            primary_email,
        }
    }
}
