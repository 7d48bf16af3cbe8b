mod common;

use {
    common::*,
    give_sync::{domain::mode::StripeMode, services::pipeline::Ack},
};

const DB: &str = "give_sync_test_donation";

#[tokio::test]
async fn pending_donation_is_settled_by_checkout() {
    let pool = setup_pool(DB).await;
    seed_pending_donation(&pool, "cs_pend_1", None, Some("stored@x.com"), "one-time").await;

    let mut object = donation_checkout_one_time("cs_pend_1", 7500);
    object["payment_intent"] = serde_json::json!("pi_pend");
    let ack = process(
        &pool,
        StripeMode::Test,
        "evt_pend_1",
        "checkout.session.completed",
        object,
    )
    .await
    .unwrap();
    assert!(matches!(ack, Ack::Processed));

    let donation = get_donation(&pool, "cs_pend_1").await.unwrap();
    assert_eq!(donation.status, "completed");
    assert_eq!(donation.amount_cents, 7500);
    assert_eq!(donation.stripe_payment_intent_id.as_deref(), Some("pi_pend"));
    // Still exactly one row: the pending one was settled, not duplicated.
    assert_eq!(count_donations(&pool, "cs_pend_1").await, 1);

    // Stored donor email wins over the session's email.
    let receipts = get_receipts(&pool, "pi_pend").await;
    assert_eq!(receipts.len(), 1);
    assert_eq!(receipts[0].payer_email, "stored@x.com");
}

#[tokio::test]
async fn donor_email_falls_back_to_profile() {
    let pool = setup_pool(DB).await;
    seed_profile(&pool, "user_7", "profile@x.com").await;
    seed_pending_donation(&pool, "cs_prof_1", Some("user_7"), None, "one-time").await;

    let mut object = donation_checkout_one_time("cs_prof_1", 1200);
    object["payment_intent"] = serde_json::json!("pi_prof");
    process(
        &pool,
        StripeMode::Test,
        "evt_prof_1",
        "checkout.session.completed",
        object,
    )
    .await
    .unwrap();

    let receipts = get_receipts(&pool, "pi_prof").await;
    assert_eq!(receipts.len(), 1);
    assert_eq!(receipts[0].payer_email, "profile@x.com");
}

#[tokio::test]
async fn settled_donation_ignores_a_second_checkout_event() {
    let pool = setup_pool(DB).await;

    let mut object = donation_checkout_one_time("cs_settle_1", 5000);
    object["payment_intent"] = serde_json::json!("pi_settle");
    process(
        &pool,
        StripeMode::Test,
        "evt_settle_1",
        "checkout.session.completed",
        object.clone(),
    )
    .await
    .unwrap();

    // Fresh event id, same session.
    let ack = process(
        &pool,
        StripeMode::Test,
        "evt_settle_2",
        "checkout.session.completed",
        object,
    )
    .await
    .unwrap();
    assert!(matches!(ack, Ack::Processed));

    assert_eq!(count_donations(&pool, "cs_settle_1").await, 1);
    assert_eq!(get_receipts(&pool, "pi_settle").await.len(), 1);
}

#[tokio::test]
async fn recurring_donation_checkout_then_renewal_receipt() {
    let pool = setup_pool(DB).await;

    process(
        &pool,
        StripeMode::Test,
        "evt_rec_1",
        "checkout.session.completed",
        donation_checkout_recurring("cs_rec_1", "sub_rec_1"),
    )
    .await
    .unwrap();

    let donation = get_donation(&pool, "cs_rec_1").await.unwrap();
    assert_eq!(donation.status, "active");
    assert_eq!(donation.frequency, "monthly");
    assert_eq!(donation.stripe_subscription_id.as_deref(), Some("sub_rec_1"));

    let ack = process(
        &pool,
        StripeMode::Test,
        "evt_rec_2",
        "invoice.paid",
        invoice_object("in_rec_1", Some("sub_rec_1"), "subscription_cycle", 1000),
    )
    .await
    .unwrap();
    assert!(matches!(ack, Ack::Processed));

    let receipts = get_receipts(&pool, "in_rec_1").await;
    assert_eq!(receipts.len(), 1);
    assert_eq!(receipts[0].frequency, "monthly");
    assert_eq!(receipts[0].amount_cents, 1000);
    assert_eq!(receipts[0].bestie_name, "General Support");
}

#[tokio::test]
async fn renewal_on_cancelled_donation_gets_no_receipt() {
    let pool = setup_pool(DB).await;

    process(
        &pool,
        StripeMode::Test,
        "evt_cancel_1",
        "checkout.session.completed",
        donation_checkout_recurring("cs_cancel_1", "sub_cancel_1"),
    )
    .await
    .unwrap();
    sqlx::query("UPDATE donations SET status = 'cancelled' WHERE stripe_session_id = 'cs_cancel_1'")
        .execute(&pool)
        .await
        .unwrap();

    let ack = process(
        &pool,
        StripeMode::Test,
        "evt_cancel_2",
        "invoice.paid",
        invoice_object("in_cancel_1", Some("sub_cancel_1"), "subscription_cycle", 1000),
    )
    .await
    .unwrap();
    assert!(matches!(ack, Ack::Processed));
    assert_eq!(get_receipts(&pool, "in_cancel_1").await.len(), 0);
}

#[tokio::test]
async fn orphan_invoice_fails_for_retry() {
    let pool = setup_pool(DB).await;

    let err = process(
        &pool,
        StripeMode::Test,
        "evt_orphan_1",
        "invoice.paid",
        invoice_object("in_orphan_1", Some("sub_orphan_1"), "subscription_cycle", 900),
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("sub_orphan_1"));

    let log = get_event_log(&pool, "evt_orphan_1").await.unwrap();
    assert_eq!(log.status, "failed");
    assert!(log.error_message.is_some());
}

#[tokio::test]
async fn invoice_without_subscription_succeeds_quietly() {
    let pool = setup_pool(DB).await;

    let ack = process(
        &pool,
        StripeMode::Test,
        "evt_nosub_1",
        "invoice.paid",
        invoice_object("in_nosub_1", None, "manual", 500),
    )
    .await
    .unwrap();
    assert!(matches!(ack, Ack::Processed));
    assert_eq!(get_event_log(&pool, "evt_nosub_1").await.unwrap().status, "success");
}

#[tokio::test]
async fn donation_checkout_on_sponsored_subscription_is_refused() {
    let pool = setup_pool(DB).await;
    seed_bestie(&pool, "b_excl", "Exclusive Bestie").await;

    process(
        &pool,
        StripeMode::Test,
        "evt_excl_1",
        "checkout.session.completed",
        sponsorship_checkout("cs_excl_sp", "sub_excl_1", "b_excl"),
    )
    .await
    .unwrap();

    // A donation-tagged session for the same subscription must not create a
    // competing donation row.
    let ack = process(
        &pool,
        StripeMode::Test,
        "evt_excl_2",
        "checkout.session.completed",
        donation_checkout_recurring("cs_excl_dn", "sub_excl_1"),
    )
    .await
    .unwrap();
    assert!(matches!(ack, Ack::Processed));
    assert!(get_donation(&pool, "cs_excl_dn").await.is_none());
    assert!(get_sponsorship(&pool, "sub_excl_1").await.is_some());
}
