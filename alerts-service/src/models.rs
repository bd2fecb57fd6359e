use chrono::{DateTime, Utc};
use document_store::{collections, Aggregate};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    FormSubmitted,
    AppointmentScheduled,
    MessageReceived,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertTag {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlertProvider {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl AlertProvider {
    /// Provider known only by id
    pub fn stub(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlertPatient {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
}

/// Person reference embedded in alert payloads
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonRef {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentRef {
    pub id: String,
    pub reason: String,
    pub confirmation_status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRef {
    pub chat_id: String,
    pub message_type: String,
}

/// Type-specific payload
///
/// Stored without a discriminator; the variant is recognised by its fields.
/// Payloads matching none of the known shapes are kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AlertData {
    #[serde(rename_all = "camelCase")]
    FormSubmitted {
        id: String,
        name: String,
        patient: PersonRef,
        submitted_at: DateTime<Utc>,
    },
    AppointmentScheduled {
        id: String,
        title: String,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        organizer: PersonRef,
        appointment: AppointmentRef,
    },
    MessageReceived {
        message: String,
        data: ChatRef,
        patient: PersonRef,
    },
    Other(Value),
}

/// Patient alert surfaced to a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub data: AlertData,
    pub created_date: DateTime<Utc>,
    #[serde(default)]
    pub action_required: bool,
    #[serde(default)]
    pub resolved_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<AlertTag>,
    #[serde(default)]
    pub assigned_provider: AlertProvider,
    #[serde(default)]
    pub resolving_provider: Option<AlertProvider>,
    #[serde(default)]
    pub occurrences: u32,
    pub patient: AlertPatient,
}

impl Alert {
    pub fn is_resolved(&self) -> bool {
        self.resolved_date.is_some()
    }

    pub fn requires_action(&self) -> bool {
        self.action_required && !self.is_resolved()
    }

    /// Short free-text description, used for log lines
    pub fn summary(&self) -> String {
        match &self.data {
            AlertData::FormSubmitted { name, .. } => format!("form '{name}' submitted"),
            AlertData::AppointmentScheduled { title, .. } => format!("appointment '{title}' scheduled"),
            AlertData::MessageReceived { message, .. } => format!("message: {message}"),
            AlertData::Other(_) => format!("{:?} alert", self.alert_type),
        }
    }
}

impl Aggregate for Alert {
    const COLLECTION: &'static str = collections::ALERTS;
    const KIND: &'static str = "Alert";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Partial update for an alert; resolution goes through resolve/reopen
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlertUpdate {
    pub data: Option<AlertData>,
    pub action_required: Option<bool>,
    pub tags: Option<Vec<AlertTag>>,
    pub assigned_provider: Option<AlertProvider>,
    pub occurrences: Option<u32>,
}
