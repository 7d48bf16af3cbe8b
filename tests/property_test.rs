mod common;

use {
    chrono::{DateTime, Datelike},
    give_sync::{
        adapters::signature::{self, WebhookSecrets},
        domain::{
            donation::DonationStatus,
            event::EventStatus,
            mode::StripeMode,
            money::MoneyAmount,
            receipt::{self, Frequency},
            sponsorship::{ended_at_for, SponsorshipStatus},
            stripe::SubscriptionObject,
        },
    },
    proptest::prelude::*,
};

fn subscription(
    status: &str,
    cancel_at_period_end: bool,
    paused: bool,
    cancel_at: Option<i64>,
) -> SubscriptionObject {
    serde_json::from_value(serde_json::json!({
        "id": "sub_prop",
        "status": status,
        "cancel_at_period_end": cancel_at_period_end,
        "cancel_at": cancel_at,
        "canceled_at": 1_735_000_000i64,
        "current_period_end": 1_736_000_000i64,
        "pause_collection": if paused { serde_json::json!({"behavior": "void"}) } else { serde_json::Value::Null },
    }))
    .unwrap()
}

fn provider_status() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("active"),
        Just("canceled"),
        Just("past_due"),
        Just("trialing"),
        Just("unpaid"),
    ]
}

proptest! {
    #[test]
    fn hard_cancel_always_wins(capd in any::<bool>(), paused in any::<bool>()) {
        let sub = subscription("canceled", capd, paused, Some(1_735_689_600));
        prop_assert_eq!(
            SponsorshipStatus::from_subscription(&sub),
            SponsorshipStatus::Cancelled
        );
    }

    #[test]
    fn ended_at_presence_tracks_status(
        status in provider_status(),
        capd in any::<bool>(),
        paused in any::<bool>(),
        cancel_at in proptest::option::of(1_600_000_000i64..2_000_000_000),
    ) {
        let sub = subscription(status, capd, paused, cancel_at);
        let derived = SponsorshipStatus::from_subscription(&sub);
        let ended = ended_at_for(derived, &sub);
        match derived {
            SponsorshipStatus::Cancelled | SponsorshipStatus::ScheduledCancel => {
                prop_assert!(ended.is_some())
            }
            SponsorshipStatus::Active | SponsorshipStatus::Paused => {
                prop_assert!(ended.is_none())
            }
        }
    }

    #[test]
    fn tax_year_is_the_utc_year(ts in 0i64..4_102_444_800) {
        let date = DateTime::from_timestamp(ts, 0).unwrap();
        prop_assert_eq!(receipt::tax_year(&date), date.year());
    }

    #[test]
    fn receipt_number_shape_holds(ts in 0i64..4_102_444_800) {
        let date = DateTime::from_timestamp(ts, 0).unwrap();
        let number = receipt::receipt_number(&date);
        prop_assert!(number.starts_with("RCPT-"));
        prop_assert_eq!(number.len(), "RCPT-".len() + 14 + 1 + 6);
        let suffix = number.rsplit('-').next().unwrap();
        prop_assert!(suffix.chars().all(|c| c.is_ascii_alphanumeric() && !c.is_ascii_lowercase()));
    }

    #[test]
    fn money_preserves_cents(cents in 0i64..10_000_000_000) {
        let amount = MoneyAmount::new(cents).unwrap();
        prop_assert_eq!(amount.cents(), cents);
        prop_assert!((amount.dollars() - cents as f64 / 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn negative_money_is_rejected(cents in i64::MIN..0) {
        prop_assert!(MoneyAmount::new(cents).is_err());
    }

    #[test]
    fn signature_resolves_the_signing_secret(payload in proptest::collection::vec(any::<u8>(), 0..512)) {
        let secrets = WebhookSecrets {
            test: common::TEST_SECRET.to_string(),
            live: common::LIVE_SECRET.to_string(),
        };

        let header = common::sign(&payload, common::TEST_SECRET);
        let mode = signature::verify_and_resolve_mode(
            &payload,
            &header,
            &secrets,
            signature::DEFAULT_TOLERANCE_SECS,
        )
        .unwrap();
        prop_assert_eq!(mode, StripeMode::Test);

        let header = common::sign(&payload, common::LIVE_SECRET);
        let mode = signature::verify_and_resolve_mode(
            &payload,
            &header,
            &secrets,
            signature::DEFAULT_TOLERANCE_SECS,
        )
        .unwrap();
        prop_assert_eq!(mode, StripeMode::Live);

        let header = common::sign(&payload, "whsec_neither");
        prop_assert!(signature::verify_and_resolve_mode(
            &payload,
            &header,
            &secrets,
            signature::DEFAULT_TOLERANCE_SECS,
        )
        .is_err());
    }
}

#[test]
fn status_strings_round_trip() {
    for status in [
        SponsorshipStatus::Active,
        SponsorshipStatus::Cancelled,
        SponsorshipStatus::Paused,
        SponsorshipStatus::ScheduledCancel,
    ] {
        assert_eq!(SponsorshipStatus::try_from(status.as_str()).unwrap(), status);
    }
    for status in [
        DonationStatus::Pending,
        DonationStatus::Completed,
        DonationStatus::Active,
        DonationStatus::Cancelled,
    ] {
        assert_eq!(DonationStatus::try_from(status.as_str()).unwrap(), status);
    }
    for status in [
        EventStatus::Processing,
        EventStatus::Success,
        EventStatus::Failed,
        EventStatus::Skipped,
    ] {
        assert_eq!(EventStatus::try_from(status.as_str()).unwrap(), status);
    }
    for frequency in [Frequency::OneTime, Frequency::Monthly] {
        assert_eq!(Frequency::try_from(frequency.as_str()).unwrap(), frequency);
    }
    for mode in [StripeMode::Test, StripeMode::Live] {
        assert_eq!(StripeMode::try_from(mode.as_str()).unwrap(), mode);
    }
}
