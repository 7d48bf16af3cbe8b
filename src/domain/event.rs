use {
    super::error::ReconcileError,
    serde::Deserialize,
    std::fmt,
    uuid::Uuid,
};

/// The provider's event envelope: `{id, type, livemode, created, data: {object}}`.
/// The inner object stays opaque here; handlers deserialize the view they need.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub livemode: bool,
    #[serde(default)]
    pub created: i64,
    pub data: EventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub object: serde_json::Value,
}

/// Audit-log status. Monotonic: `processing` finalizes to exactly one of the
/// terminal values; a terminal row is never reset to `processing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStatus {
    Processing,
    Success,
    Failed,
    Skipped,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for EventStatus {
    type Error = ReconcileError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "processing" => Ok(Self::Processing),
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            "skipped" => Ok(Self::Skipped),
            other => Err(ReconcileError::Validation(format!(
                "unknown event status: {other}"
            ))),
        }
    }
}

/// Which domain family an event resolved to, for the audit-log pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Sponsorship,
    Donation,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sponsorship => "sponsorship",
            Self::Donation => "donation",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelatedRecord {
    pub kind: RecordKind,
    pub id: Uuid,
}

/// Outcome of dispatching one event, fed to the logger's `close`.
#[derive(Debug, Clone)]
pub enum Disposition {
    /// Processed to completion. `None` when nothing was created or touched
    /// (idempotent no-op, cross-family conflict, unclassified checkout).
    Completed(Option<RelatedRecord>),
    /// Deliberately not processed (unhandled type, subscription-create invoice).
    Skipped(String),
}
