use {
    super::{
        error::ReconcileError, identity::PayerIdentity, mode::StripeMode, receipt::Frequency,
    },
    std::fmt,
    uuid::Uuid,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DonationStatus {
    /// Pre-created by the checkout-session collaborator, awaiting this webhook.
    Pending,
    /// One-time donation paid.
    Completed,
    /// Recurring donation with a live subscription.
    Active,
    Cancelled,
}

impl DonationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Active => "active",
            Self::Cancelled => "cancelled",
        }
    }

    /// A terminal checkout status means the session was already reconciled —
    /// a second delivery must not produce a second receipt.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Completed | Self::Active)
    }
}

impl fmt::Display for DonationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for DonationStatus {
    type Error = ReconcileError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "active" => Ok(Self::Active),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(ReconcileError::Validation(format!(
                "unknown donation status: {other}"
            ))),
        }
    }
}

/// Checkout-session mode → donation shape. "payment" settles immediately,
/// "subscription" opens a recurring donation.
pub fn shape_for_session_mode(
    session_mode: &str,
) -> Result<(Frequency, DonationStatus), ReconcileError> {
    match session_mode {
        "payment" => Ok((Frequency::OneTime, DonationStatus::Completed)),
        "subscription" => Ok((Frequency::Monthly, DonationStatus::Active)),
        other => Err(ReconcileError::DataIntegrity(format!(
            "unsupported checkout session mode: {other}"
        ))),
    }
}

/// For INSERT on the fallback path (no pre-created pending row).
#[derive(Debug, Clone)]
pub struct NewDonation {
    pub id: Uuid,
    pub donor: PayerIdentity,
    pub amount_cents: i64,
    pub currency: String,
    pub frequency: Frequency,
    pub status: DonationStatus,
    pub stripe_session_id: String,
    pub stripe_subscription_id: Option<String>,
    pub stripe_payment_intent_id: Option<String>,
    pub stripe_customer_id: Option<String>,
    pub mode: StripeMode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_mode_is_one_time_completed() {
        let (freq, status) = shape_for_session_mode("payment").unwrap();
        assert_eq!(freq, Frequency::OneTime);
        assert_eq!(status, DonationStatus::Completed);
    }

    #[test]
    fn subscription_mode_is_monthly_active() {
        let (freq, status) = shape_for_session_mode("subscription").unwrap();
        assert_eq!(freq, Frequency::Monthly);
        assert_eq!(status, DonationStatus::Active);
    }

    #[test]
    fn setup_mode_is_rejected() {
        assert!(shape_for_session_mode("setup").is_err());
    }

    #[test]
    fn settled_statuses() {
        assert!(DonationStatus::Completed.is_settled());
        assert!(DonationStatus::Active.is_settled());
        assert!(!DonationStatus::Pending.is_settled());
        assert!(!DonationStatus::Cancelled.is_settled());
    }
}
