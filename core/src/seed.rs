//! Demo fixture data for the runner: a small population of users,
//! purchases and reviews in every lifecycle state.
//!
//! Inserted directly through the store so ids stay stable across runs.

use crate::{
    clock::OpsClock,
    error::OpsResult,
    identity::{UserRecord, UserRole, UserStatus},
    store::PayoutStore,
    transactions::TransactionRecord,
};
use chrono::{Days, NaiveDate};

pub const DEMO_ADMIN_ID: &str = "admin1";

/// Seed the demo population. Call once on a freshly migrated store.
pub fn seed_demo(store: &PayoutStore, clock: &OpsClock) -> OpsResult<()> {
    let today = clock.today();
    let days_ago = |n: u64| today - Days::new(n);

    seed_user(store, "user1", "maria.v", days_ago(210), 150.0, 5)?;
    seed_user(store, "user2", "jonas.k", days_ago(180), 75.0, 3)?;
    seed_user(store, "user3", "petra.l", days_ago(30), 0.0, 0)?;
    store.insert_user(&UserRecord {
        user_id: DEMO_ADMIN_ID.to_string(),
        username: "admin".to_string(),
        email: "admin@example.com".to_string(),
        role: UserRole::Admin,
        status: UserStatus::Active,
        created_at: days_ago(400),
        total_earned: 0.0,
        reviews_completed: 0,
        flag_reason: None,
        flagged_at: None,
    })?;

    // Purchases. user3's headphones order was refunded; so was one of
    // their two remaining orders, giving them a high refund rate.
    seed_txn(store, "txn1001", "user1", "product1", "Wireless Headphones Pro", 89.99, days_ago(40), None)?;
    seed_txn(store, "txn1002", "user1", "product2", "Smart Watch Ultra", 199.99, days_ago(35), None)?;
    seed_txn(store, "txn1003", "user2", "product2", "Smart Watch Ultra", 199.99, days_ago(32), None)?;
    seed_txn(store, "txn1004", "user2", "product3", "Ergonomic Keyboard", 59.99, days_ago(25), None)?;
    seed_txn(store, "txn1005", "user3", "product1", "Wireless Headphones Pro", 89.99, days_ago(20), Some(days_ago(12)))?;
    seed_txn(store, "txn1006", "user3", "product4", "USB-C Dock", 49.99, days_ago(18), Some(days_ago(10)))?;
    seed_txn(store, "txn1007", "user3", "product5", "Desk Lamp", 24.99, days_ago(15), None)?;

    // Reviews: pending, approved and short-text pending on a refunded
    // purchase (the fraud-detection showcase).
    store.insert_review(
        "user1", "product1", "Wireless Headphones Pro",
        "Amazing sound quality! The noise cancellation is outstanding.",
        5, 25.00, 0.10, days_ago(30),
    )?;
    let approved = store.insert_review(
        "user1", "product2", "Smart Watch Ultra",
        "Good fitness tracking but battery life could be better.",
        4, 30.00, 0.05, days_ago(28),
    )?;
    store.mark_approved(approved, days_ago(21), DEMO_ADMIN_ID)?;
    store.insert_review(
        "user2", "product2", "Smart Watch Ultra",
        "Solid build and the strap is comfortable for all-day wear.",
        4, 20.00, 0.12, days_ago(24),
    )?;
    store.insert_review(
        "user3", "product1", "Wireless Headphones Pro",
        "Great product!",
        5, 25.00, 0.25, days_ago(14),
    )?;

    log::info!("demo data seeded");
    Ok(())
}

fn seed_user(
    store: &PayoutStore,
    user_id: &str,
    username: &str,
    created_at: NaiveDate,
    total_earned: f64,
    reviews_completed: i64,
) -> OpsResult<()> {
    store.insert_user(&UserRecord {
        user_id: user_id.to_string(),
        username: username.to_string(),
        email: format!("{username}@example.com"),
        role: UserRole::User,
        status: UserStatus::Active,
        created_at,
        total_earned,
        reviews_completed,
        flag_reason: None,
        flagged_at: None,
    })
}

#[allow(clippy::too_many_arguments)]
fn seed_txn(
    store: &PayoutStore,
    transaction_id: &str,
    user_id: &str,
    product_id: &str,
    product_name: &str,
    purchase_amount: f64,
    purchase_date: NaiveDate,
    refunded_on: Option<NaiveDate>,
) -> OpsResult<()> {
    store.insert_transaction(&TransactionRecord {
        transaction_id: transaction_id.to_string(),
        user_id: user_id.to_string(),
        product_id: product_id.to_string(),
        product_name: product_name.to_string(),
        purchase_amount,
        purchase_date,
        refund_status: refunded_on.is_some(),
        refund_amount: if refunded_on.is_some() {
            purchase_amount
        } else {
            0.0
        },
        refund_date: refunded_on,
    })
}
