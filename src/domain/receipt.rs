use {
    super::{error::ReconcileError, mode::StripeMode},
    chrono::{DateTime, Datelike, Utc},
    rand::{distributions::Alphanumeric, Rng},
    std::fmt,
    uuid::Uuid,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    OneTime,
    Monthly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneTime => "one-time",
            Self::Monthly => "monthly",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for Frequency {
    type Error = ReconcileError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "one-time" => Ok(Self::OneTime),
            "monthly" => Ok(Self::Monthly),
            other => Err(ReconcileError::Validation(format!(
                "unknown frequency: {other}"
            ))),
        }
    }
}

/// Display label on a receipt that isn't tied to a specific bestie.
pub const GENERAL_SUPPORT: &str = "General Support";

/// Human-readable, globally unique receipt number: transaction timestamp plus
/// a random suffix. 36^6 per second makes collisions negligible; the UNIQUE
/// constraint on the table is the backstop.
pub fn receipt_number(transaction_date: &DateTime<Utc>) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(|c| (c as char).to_ascii_uppercase())
        .collect();
    format!("RCPT-{}-{}", transaction_date.format("%Y%m%d%H%M%S"), suffix)
}

/// Tax year comes from the transaction date, not wall clock — a December 31
/// payment processed in January still attributes to the old year.
pub fn tax_year(transaction_date: &DateTime<Utc>) -> i32 {
    transaction_date.year()
}

/// Insert-only; receipts are immutable once written.
#[derive(Debug, Clone)]
pub struct NewReceipt {
    pub id: Uuid,
    pub receipt_number: String,
    pub sponsorship_id: Option<Uuid>,
    pub payer_email: String,
    pub payer_name: Option<String>,
    pub bestie_name: String,
    pub amount_cents: i64,
    pub frequency: Frequency,
    pub stripe_transaction_id: String,
    pub transaction_date: DateTime<Utc>,
    pub tax_year: i32,
    pub mode: StripeMode,
    pub org_name: Option<String>,
    pub org_ein: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tax_year_from_transaction_date() {
        // 2025-12-31T23:59:59Z processed whenever — still 2025.
        let date = DateTime::from_timestamp(1_767_225_599, 0).unwrap();
        assert_eq!(date.year(), 2025);
        assert_eq!(tax_year(&date), 2025);
    }

    #[test]
    fn receipt_number_embeds_date_and_suffix() {
        let date = DateTime::from_timestamp(1_767_225_599, 0).unwrap();
        let number = receipt_number(&date);
        assert!(number.starts_with("RCPT-20251231"));
        let suffix = number.rsplit('-').next().unwrap();
        assert_eq!(suffix.len(), 6);
        assert!(suffix.chars().all(|c| c.is_ascii_alphanumeric()));
        assert!(!suffix.chars().any(|c| c.is_ascii_lowercase()));
    }

    #[test]
    fn receipt_numbers_differ() {
        let date = Utc::now();
        assert_ne!(receipt_number(&date), receipt_number(&date));
    }
}
