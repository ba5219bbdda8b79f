use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::shared::utils::lenient::{
    bool_or_int, null_as_default, optional_string_or_number, string_or_number,
};

/// Kind of notification pushed by the server
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NotificationKind {
    GuarantorRequest,
    GuarantorAcceptance,
    GuarantorRejection,
    /// Any type this client does not act on, kept verbatim
    Other(String),
}

impl NotificationKind {
    pub fn as_str(&self) -> &str {
        match self {
            NotificationKind::GuarantorRequest => "guarantor_request",
            NotificationKind::GuarantorAcceptance => "guarantor_acceptance",
            NotificationKind::GuarantorRejection => "guarantor_rejection",
            NotificationKind::Other(raw) => raw.as_str(),
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<String> for NotificationKind {
    fn from(s: String) -> Self {
        // guarantor_request, guarantor-request and GuarantorRequest all match
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "guarantorrequest" => NotificationKind::GuarantorRequest,
            "guarantoracceptance" => NotificationKind::GuarantorAcceptance,
            "guarantorrejection" => NotificationKind::GuarantorRejection,
            _ => NotificationKind::Other(s),
        }
    }
}

impl From<NotificationKind> for String {
    fn from(kind: NotificationKind) -> Self {
        match kind {
            NotificationKind::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

/// Variant-specific data carried in the `data` field of a notification
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    #[serde(
        default,
        deserialize_with = "optional_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub loan_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applicant_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A single notification as delivered by the stream.
///
/// Notifications are only ever created by decoding a server push. The client
/// flips `is_read` after a confirmed mark-as-read and otherwise drops the
/// whole entity; it never edits individual fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, alias = "humanDate")]
    pub human_date: String,
    #[serde(default, alias = "isRead", deserialize_with = "bool_or_int")]
    pub is_read: bool,
    #[serde(rename = "data", default, deserialize_with = "null_as_default")]
    pub payload: NotificationPayload,
}

impl Notification {
    /// Whether the recipient can accept or decline this notification
    pub fn is_actionable(&self) -> bool {
        matches!(self.kind, NotificationKind::GuarantorRequest)
    }

    /// Whether this notification links to a loan details view
    pub fn has_details(&self) -> bool {
        matches!(
            self.kind,
            NotificationKind::GuarantorAcceptance | NotificationKind::GuarantorRejection
        )
    }

    pub fn loan_id(&self) -> Option<&str> {
        self.payload.loan_id.as_deref()
    }

    pub fn applicant_name(&self) -> Option<&str> {
        self.payload.applicant_name.as_deref()
    }

    /// Flip the read flag. Returns false if it was already set.
    pub fn mark_read(&mut self) -> bool {
        if self.is_read {
            return false;
        }
        self.is_read = true;
        true
    }
}

/// Payload of a `notification` stream event: the full current list.
///
/// `data` stays `None` when the field is missing or null, which is not the
/// same as an empty list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSnapshot {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Vec<Notification>>,
}

impl NotificationSnapshot {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// The list to apply, if this is a successful push that carries one
    pub fn into_notifications(self) -> Option<Vec<Notification>> {
        if self.success {
            self.data
        } else {
            None
        }
    }
}
