//! Payout lifecycle tests: transitions, terminal states, earnings
//! side effects, repeat-offender flagging, and bulk approval.

use chrono::NaiveDate;
use reviewpay_core::{
    clock::OpsClock,
    error::OpsError,
    event::FraudTrigger,
    identity::{self, UserRecord, UserRole, UserStatus},
    lifecycle::{self, PayoutState},
    reviews::PayoutStatus,
    store::PayoutStore,
};

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn setup() -> (PayoutStore, OpsClock) {
    let store = PayoutStore::in_memory().unwrap();
    store.migrate().unwrap();
    (store, OpsClock::starting(date("2026-06-01")))
}

fn add_user(store: &PayoutStore, user_id: &str) {
    store
        .insert_user(&UserRecord {
            user_id: user_id.to_string(),
            username: format!("{user_id}-name"),
            email: format!("{user_id}@example.com"),
            role: UserRole::User,
            status: UserStatus::Active,
            created_at: date("2026-01-01"),
            total_earned: 0.0,
            reviews_completed: 0,
            flag_reason: None,
            flagged_at: None,
        })
        .unwrap();
}

fn add_pending_review(store: &PayoutStore, user_id: &str, product_id: &str, amount: f64) -> i64 {
    store
        .insert_review(
            user_id,
            product_id,
            &format!("Product {product_id}"),
            "Detailed review body with plenty of substance in it.",
            4,
            amount,
            0.1,
            date("2026-05-05"),
        )
        .unwrap()
}

#[test]
fn approve_credits_earnings_and_cuts_payout_record() {
    let (store, clock) = setup();
    add_user(&store, "u1");
    let review_id = add_pending_review(&store, "u1", "p1", 30.0);

    let review = lifecycle::approve(&store, &clock, review_id, "admin1").unwrap();
    assert_eq!(review.payout_status, PayoutStatus::Approved);
    assert_eq!(review.approved_at, Some(date("2026-06-01")));
    assert_eq!(review.approved_by.as_deref(), Some("admin1"));

    let user = store.get_user("u1").unwrap().unwrap();
    assert_eq!(user.total_earned, 30.0);
    assert_eq!(user.reviews_completed, 1);

    let payouts = store.all_payouts().unwrap();
    assert_eq!(payouts.len(), 1);
    assert_eq!(payouts[0].review_id, review_id);
    assert_eq!(payouts[0].amount, 30.0);
    assert_eq!(payouts[0].status, PayoutState::Completed);
    assert_eq!(payouts[0].paid_at, Some(date("2026-06-01")));
    assert_eq!(store.event_count("review_approved").unwrap(), 1);
}

#[test]
fn terminal_statuses_admit_no_transition() {
    let (store, clock) = setup();
    add_user(&store, "u1");
    let review_id = add_pending_review(&store, "u1", "p1", 25.0);
    lifecycle::approve(&store, &clock, review_id, "admin1").unwrap();

    let err = lifecycle::approve(&store, &clock, review_id, "admin1").unwrap_err();
    assert!(matches!(
        err,
        OpsError::InvalidTransition {
            from: "approved",
            ..
        }
    ));
    // No double credit.
    let user = store.get_user("u1").unwrap().unwrap();
    assert_eq!(user.total_earned, 25.0);
    assert_eq!(user.reviews_completed, 1);
}

#[test]
fn fraud_is_permanent() {
    let (store, clock) = setup();
    add_user(&store, "u1");
    let review_id = add_pending_review(&store, "u1", "p1", 25.0);
    lifecycle::flag_fraud(&store, &clock, review_id, None, FraudTrigger::Admin).unwrap();

    for attempt in [
        lifecycle::approve(&store, &clock, review_id, "admin1"),
        lifecycle::reject(&store, &clock, review_id, None),
        lifecycle::flag_fraud(&store, &clock, review_id, None, FraudTrigger::Admin),
    ] {
        assert!(matches!(
            attempt.unwrap_err(),
            OpsError::InvalidTransition { from: "fraud", .. }
        ));
    }
    let review = store.get_review(review_id).unwrap().unwrap();
    assert_eq!(review.payout_status, PayoutStatus::Fraud);
}

#[test]
fn reject_records_reason_with_default() {
    let (store, clock) = setup();
    add_user(&store, "u1");
    let with_reason = add_pending_review(&store, "u1", "p1", 25.0);
    let without = add_pending_review(&store, "u1", "p2", 25.0);

    let review = lifecycle::reject(&store, &clock, with_reason, Some("Not a real purchase")).unwrap();
    assert_eq!(review.rejection_reason.as_deref(), Some("Not a real purchase"));

    let review = lifecycle::reject(&store, &clock, without, None).unwrap();
    assert_eq!(
        review.rejection_reason.as_deref(),
        Some(lifecycle::DEFAULT_REJECTION_REASON)
    );
}

#[test]
fn second_fraud_review_flags_the_user() {
    let (store, clock) = setup();
    add_user(&store, "u1");
    let first = add_pending_review(&store, "u1", "p1", 25.0);
    let second = add_pending_review(&store, "u1", "p2", 25.0);

    lifecycle::flag_fraud(&store, &clock, first, None, FraudTrigger::Admin).unwrap();
    let user = store.get_user("u1").unwrap().unwrap();
    assert_eq!(user.status, UserStatus::Active, "one fraud review is not enough");

    lifecycle::flag_fraud(&store, &clock, second, None, FraudTrigger::Admin).unwrap();
    let user = store.get_user("u1").unwrap().unwrap();
    assert_eq!(user.status, UserStatus::Flagged);
    assert_eq!(
        user.flag_reason.as_deref(),
        Some(lifecycle::REPEAT_FRAUD_FLAG_REASON)
    );
    assert_eq!(user.flagged_at, Some(date("2026-06-01")));
}

#[test]
fn unflagging_does_not_reverse_fraud_reviews() {
    let (store, clock) = setup();
    add_user(&store, "u1");
    let first = add_pending_review(&store, "u1", "p1", 25.0);
    let second = add_pending_review(&store, "u1", "p2", 25.0);
    lifecycle::flag_fraud(&store, &clock, first, None, FraudTrigger::Admin).unwrap();
    lifecycle::flag_fraud(&store, &clock, second, None, FraudTrigger::Admin).unwrap();

    let user = identity::unflag_user(&store, &clock, "u1").unwrap();
    assert_eq!(user.status, UserStatus::Active);
    assert!(user.flag_reason.is_none());
    assert!(user.flagged_at.is_none());
    assert_eq!(store.count_fraud_reviews("u1").unwrap(), 2);
}

#[test]
fn status_directed_updates_dispatch_to_transitions() {
    let (store, clock) = setup();
    add_user(&store, "u1");
    let to_approve = add_pending_review(&store, "u1", "p1", 25.0);
    let to_reject = add_pending_review(&store, "u1", "p2", 25.0);
    let to_pending = add_pending_review(&store, "u1", "p3", 25.0);

    let review =
        lifecycle::update_payout_status(&store, &clock, to_approve, PayoutStatus::Approved, "admin1")
            .unwrap();
    assert_eq!(review.payout_status, PayoutStatus::Approved);

    let review =
        lifecycle::update_payout_status(&store, &clock, to_reject, PayoutStatus::Rejected, "admin1")
            .unwrap();
    assert_eq!(review.payout_status, PayoutStatus::Rejected);

    // Pending is never a transition target.
    let err =
        lifecycle::update_payout_status(&store, &clock, to_pending, PayoutStatus::Pending, "admin1")
            .unwrap_err();
    assert!(matches!(err, OpsError::InvalidTransition { to: "pending", .. }));
}

#[test]
fn bulk_approve_is_per_item() {
    let (store, clock) = setup();
    add_user(&store, "u1");
    let review_id = add_pending_review(&store, "u1", "p1", 25.0);

    let results = lifecycle::bulk_approve(&store, &clock, &[review_id, 999], "admin1");
    assert_eq!(results.len(), 2);

    assert!(results[0].success);
    assert_eq!(
        results[0].review.as_ref().unwrap().payout_status,
        PayoutStatus::Approved
    );
    assert!(!results[1].success);
    assert!(results[1].error.as_ref().unwrap().contains("not found"));

    // The good item's side effects landed exactly once.
    let user = store.get_user("u1").unwrap().unwrap();
    assert_eq!(user.total_earned, 25.0);
    assert_eq!(user.reviews_completed, 1);
}

#[test]
fn bulk_approve_skips_terminal_reviews_without_aborting() {
    let (store, clock) = setup();
    add_user(&store, "u1");
    let frozen = add_pending_review(&store, "u1", "p1", 25.0);
    let open = add_pending_review(&store, "u1", "p2", 20.0);
    lifecycle::flag_fraud(&store, &clock, frozen, None, FraudTrigger::Admin).unwrap();

    let results = lifecycle::bulk_approve(&store, &clock, &[frozen, open], "admin1");
    assert!(!results[0].success);
    assert!(results[1].success);
    let review = store.get_review(frozen).unwrap().unwrap();
    assert_eq!(review.payout_status, PayoutStatus::Fraud);
}
