//! Dashboard and triage tests: risk ranking, suspicious-activity
//! counts, and the stats bundles.

use chrono::NaiveDate;
use reviewpay_core::{
    clock::OpsClock,
    event::FraudTrigger,
    identity::{self, UserRecord, UserRole, UserStatus},
    lifecycle, ops,
    risk::RiskLevel,
    store::PayoutStore,
    transactions::{self, TransactionRecord},
};

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn setup() -> (PayoutStore, OpsClock) {
    let store = PayoutStore::in_memory().unwrap();
    store.migrate().unwrap();
    (store, OpsClock::starting(date("2026-06-01")))
}

fn add_user(store: &PayoutStore, user_id: &str, role: UserRole, reviews_completed: i64) {
    store
        .insert_user(&UserRecord {
            user_id: user_id.to_string(),
            username: format!("{user_id}-name"),
            email: format!("{user_id}@example.com"),
            role,
            status: UserStatus::Active,
            created_at: date("2026-01-01"),
            total_earned: 0.0,
            reviews_completed,
            flag_reason: None,
            flagged_at: None,
        })
        .unwrap();
}

fn add_txn(store: &PayoutStore, txn_id: &str, user_id: &str, product_id: &str, refunded: bool) {
    store
        .insert_transaction(&TransactionRecord {
            transaction_id: txn_id.to_string(),
            user_id: user_id.to_string(),
            product_id: product_id.to_string(),
            product_name: format!("Product {product_id}"),
            purchase_amount: 100.0,
            purchase_date: date("2026-05-01"),
            refund_status: refunded,
            refund_amount: if refunded { 100.0 } else { 0.0 },
            refund_date: refunded.then(|| date("2026-05-10")),
        })
        .unwrap();
}

fn add_review(store: &PayoutStore, user_id: &str, product_id: &str, score: f64, amount: f64) -> i64 {
    store
        .insert_review(
            user_id,
            product_id,
            &format!("Product {product_id}"),
            "Review body text that is comfortably past the cutoff.",
            4,
            amount,
            score,
            date("2026-05-05"),
        )
        .unwrap()
}

#[test]
fn eligible_users_rank_riskiest_first() {
    let (store, clock) = setup();
    // Clean user: one pending review, no refunds, no history.
    add_user(&store, "clean", UserRole::User, 4);
    add_txn(&store, "t1", "clean", "p1", false);
    add_review(&store, "clean", "p1", 0.05, 25.0);

    // Risky user: refunds, a prior fraud review, high seeded scores.
    add_user(&store, "risky", UserRole::User, 1);
    add_txn(&store, "t2", "risky", "p1", true);
    add_txn(&store, "t3", "risky", "p2", true);
    let fraud = add_review(&store, "risky", "p9", 0.6, 25.0);
    lifecycle::flag_fraud(&store, &clock, fraud, None, FraudTrigger::Admin).unwrap();
    add_review(&store, "risky", "p1", 0.5, 25.0);
    add_review(&store, "risky", "p2", 0.4, 30.0);

    let ranked = ops::eligible_users(&store, &clock).unwrap();
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].user.user_id, "risky");
    assert_eq!(ranked[1].user.user_id, "clean");
    assert!(ranked[0].risk_score > ranked[1].risk_score);
    assert_eq!(ranked[1].risk_level, RiskLevel::Low);

    // risky: avg score (0.6+0.5+0.4)/3 = 0.5; refunds 2 over 2 pending;
    // 1 fraud over 1 completed -> 0.4*0.5 + 0.3*1.0 + 0.3*1.0 = 0.8.
    assert!((ranked[0].risk_score - 0.8).abs() < 1e-9);
    assert_eq!(ranked[0].risk_level, RiskLevel::High);
    assert_eq!(ranked[0].total_pending_amount, 55.0);
    assert_eq!(ranked[0].pending_reviews.len(), 2);
    assert_eq!(ranked[0].risk_assessment.refunds_count, 2);
    assert_eq!(ranked[0].risk_assessment.previous_fraud, 1);
}

#[test]
fn dashboard_counts_flagged_and_suspicious_activity() {
    let (store, clock) = setup();
    add_user(&store, "u1", UserRole::User, 0);
    add_user(&store, "u2", UserRole::User, 0);
    add_user(&store, "admin1", UserRole::Admin, 0);

    // u1: refunded purchase and a high-score pending review.
    add_txn(&store, "t1", "u1", "p1", true);
    add_txn(&store, "t2", "u1", "p2", false);
    add_review(&store, "u1", "p2", 0.75, 25.0);
    // u2: clean pending review under every cutoff.
    add_txn(&store, "t3", "u2", "p3", false);
    add_review(&store, "u2", "p3", 0.1, 25.0);
    // A fraud review for the flagged count.
    let fraud = add_review(&store, "u2", "p9", 0.2, 25.0);
    lifecycle::flag_fraud(&store, &clock, fraud, None, FraudTrigger::Admin).unwrap();

    let dashboard = ops::dashboard(&store).unwrap();
    // Flagged: the fraud review plus the 0.75-score one.
    assert_eq!(dashboard.summary.flagged_reviews, 2);
    // High-risk pending: score > 0.5 and still pending.
    assert_eq!(dashboard.summary.high_risk_pending, 1);
    // Suspicious: pending reviewers holding any refund (u1 only).
    assert_eq!(dashboard.summary.suspicious_users, 1);
    // Admins don't count as users.
    assert_eq!(dashboard.summary.total_users, 2);

    assert_eq!(dashboard.review_stats.pending, 2);
    assert_eq!(dashboard.review_stats.fraud, 1);
    // 1 of 3 transactions refunded.
    assert!((dashboard.transaction_stats.refund_rate - 33.33).abs() < 1e-9);
}

#[test]
fn flagged_detail_views_carry_history() {
    let (store, clock) = setup();
    add_user(&store, "u1", UserRole::User, 2);
    add_txn(&store, "t1", "u1", "p1", true);
    let first = add_review(&store, "u1", "p1", 0.3, 25.0);
    let second = add_review(&store, "u1", "p2", 0.3, 25.0);
    lifecycle::flag_fraud(&store, &clock, first, None, FraudTrigger::Admin).unwrap();
    lifecycle::flag_fraud(&store, &clock, second, None, FraudTrigger::Admin).unwrap();

    let reviews = ops::flagged_reviews_detail(&store).unwrap();
    assert_eq!(reviews.len(), 2);
    assert_eq!(reviews[0].risk_factors.fraud_reviews, 2);
    assert_eq!(reviews[0].risk_factors.multiple_refunds, 1);
    assert!(reviews[0].user.is_some());

    // Two fraud reviews auto-flagged the user.
    let users = ops::flagged_users_detail(&store).unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].user.user_id, "u1");
    assert_eq!(users[0].review_total, 2);
    assert_eq!(users[0].review_fraud, 2);
    assert_eq!(users[0].review_pending, 0);
    assert_eq!(users[0].transaction_total, 1);
    assert_eq!(users[0].transaction_refunded, 1);
}

#[test]
fn payout_totals_track_the_pipeline() {
    let (store, clock) = setup();
    add_user(&store, "u1", UserRole::User, 0);
    let _pending = add_review(&store, "u1", "p1", 0.1, 20.0);
    let approved = add_review(&store, "u1", "p2", 0.1, 30.0);
    lifecycle::approve(&store, &clock, approved, "admin1").unwrap();

    let totals = ops::payout_totals(&store).unwrap();
    assert_eq!(totals.pending_amount, 20.0);
    assert_eq!(totals.approved_amount, 30.0);
    assert_eq!(totals.total_paid, 30.0);

    let stats = identity::user_stats(&store).unwrap();
    assert_eq!(stats.total, 1);
    assert_eq!(stats.active, 1);
    assert_eq!(stats.total_earnings, 30.0);
    assert_eq!(stats.avg_earnings, 30.0);
}

#[test]
fn transaction_stats_guard_the_empty_store() {
    let (store, _clock) = setup();
    let stats = transactions::transaction_stats(&store).unwrap();
    assert_eq!(stats.total, 0);
    assert_eq!(stats.refund_rate, 0.0);
    assert_eq!(stats.total_purchase_amount, 0.0);
}
