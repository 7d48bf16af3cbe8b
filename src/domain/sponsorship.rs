use {
    super::{
        error::ReconcileError, identity::PayerIdentity, mode::StripeMode,
        stripe::SubscriptionObject,
    },
    chrono::{DateTime, Utc},
    std::fmt,
    uuid::Uuid,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SponsorshipStatus {
    Active,
    Cancelled,
    Paused,
    ScheduledCancel,
}

impl SponsorshipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Cancelled => "cancelled",
            Self::Paused => "paused",
            Self::ScheduledCancel => "scheduled_cancel",
        }
    }

    /// Map provider subscription state to our status. Priority order:
    /// a hard cancel is terminal and beats everything; an explicit pause
    /// beats the cancel-scheduling flag; the flag beats default-active.
    /// Cancellation intent and hard cancellation can coexist transiently.
    pub fn from_subscription(sub: &SubscriptionObject) -> Self {
        if sub.status == "canceled" {
            Self::Cancelled
        } else if sub.is_paused() {
            Self::Paused
        } else if sub.cancel_at_period_end {
            Self::ScheduledCancel
        } else {
            Self::Active
        }
    }
}

impl fmt::Display for SponsorshipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for SponsorshipStatus {
    type Error = ReconcileError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "active" => Ok(Self::Active),
            "cancelled" => Ok(Self::Cancelled),
            "paused" => Ok(Self::Paused),
            "scheduled_cancel" => Ok(Self::ScheduledCancel),
            other => Err(ReconcileError::Validation(format!(
                "unknown sponsorship status: {other}"
            ))),
        }
    }
}

/// The end timestamp that accompanies a derived status. Scheduled cancels
/// carry the future end date; hard cancels the cancellation time;
/// active/paused clear it (reactivation must erase a stale end date).
pub fn ended_at_for(status: SponsorshipStatus, sub: &SubscriptionObject) -> Option<DateTime<Utc>> {
    let from_ts = |ts: i64| DateTime::from_timestamp(ts, 0);
    match status {
        SponsorshipStatus::Cancelled => sub
            .canceled_at
            .and_then(from_ts)
            .or_else(|| Some(Utc::now())),
        SponsorshipStatus::ScheduledCancel => sub
            .cancel_at
            .or(sub.current_period_end)
            .and_then(from_ts)
            .or_else(|| Some(Utc::now())),
        SponsorshipStatus::Active | SponsorshipStatus::Paused => None,
    }
}

/// For INSERT — id generated in Rust via `Uuid::now_v7()`.
#[derive(Debug, Clone)]
pub struct NewSponsorship {
    pub id: Uuid,
    pub sponsor: PayerIdentity,
    pub bestie_id: String,
    pub monthly_amount_cents: i64,
    pub stripe_subscription_id: String,
    pub stripe_customer_id: Option<String>,
    pub stripe_session_id: String,
    pub mode: StripeMode,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sub(status: &str, cancel_at_period_end: bool, paused: bool) -> SubscriptionObject {
        serde_json::from_value(serde_json::json!({
            "id": "sub_x",
            "status": status,
            "cancel_at_period_end": cancel_at_period_end,
            "cancel_at": 1_735_689_600i64,
            "canceled_at": 1_735_000_000i64,
            "current_period_end": 1_736_000_000i64,
            "pause_collection": if paused { serde_json::json!({"behavior": "void"}) } else { serde_json::Value::Null },
        }))
        .unwrap()
    }

    #[test]
    fn canceled_wins_over_scheduled_flag() {
        let s = sub("canceled", true, false);
        assert_eq!(
            SponsorshipStatus::from_subscription(&s),
            SponsorshipStatus::Cancelled
        );
    }

    #[test]
    fn pause_wins_over_scheduled_flag() {
        let s = sub("active", true, true);
        assert_eq!(
            SponsorshipStatus::from_subscription(&s),
            SponsorshipStatus::Paused
        );
    }

    #[test]
    fn scheduled_flag_beats_active() {
        let s = sub("active", true, false);
        assert_eq!(
            SponsorshipStatus::from_subscription(&s),
            SponsorshipStatus::ScheduledCancel
        );
    }

    #[test]
    fn default_is_active() {
        let s = sub("active", false, false);
        assert_eq!(
            SponsorshipStatus::from_subscription(&s),
            SponsorshipStatus::Active
        );
    }

    #[test]
    fn scheduled_cancel_keeps_end_date() {
        let s = sub("active", true, false);
        let status = SponsorshipStatus::from_subscription(&s);
        let ended = ended_at_for(status, &s).unwrap();
        assert_eq!(ended.timestamp(), 1_735_689_600);
    }

    #[test]
    fn reactivation_clears_end_date() {
        let s = sub("active", false, false);
        let status = SponsorshipStatus::from_subscription(&s);
        assert_eq!(ended_at_for(status, &s), None);
    }

    #[test]
    fn hard_cancel_uses_canceled_at() {
        let s = sub("canceled", false, false);
        let ended = ended_at_for(SponsorshipStatus::Cancelled, &s).unwrap();
        assert_eq!(ended.timestamp(), 1_735_000_000);
    }
}
