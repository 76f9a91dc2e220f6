//! Seed determinism: the same master seed must reproduce the same
//! review scores, run after run.

use chrono::NaiveDate;
use reviewpay_core::{
    clock::OpsClock,
    config::OpsConfig,
    identity::{UserRecord, UserRole, UserStatus},
    reviews::{self, NewReview},
    rng::ScoreSeeder,
    store::PayoutStore,
};

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// Build a store, submit `count` reviews with the given master seed,
/// and collect the seeded scores.
fn seeded_scores(master_seed: u64, count: usize) -> Vec<f64> {
    let store = PayoutStore::in_memory().unwrap();
    store.migrate().unwrap();
    let clock = OpsClock::starting(date("2026-06-01"));
    let config = OpsConfig {
        master_seed,
        ..OpsConfig::default()
    };
    let mut seeder = ScoreSeeder::new(config.master_seed);

    store
        .insert_user(&UserRecord {
            user_id: "u1".to_string(),
            username: "u1-name".to_string(),
            email: "u1@example.com".to_string(),
            role: UserRole::User,
            status: UserStatus::Active,
            created_at: date("2026-01-01"),
            total_earned: 0.0,
            reviews_completed: 0,
            flag_reason: None,
            flagged_at: None,
        })
        .unwrap();

    (0..count)
        .map(|i| {
            reviews::create_review(
                &store,
                &clock,
                &mut seeder,
                &config,
                NewReview {
                    user_id: "u1".to_string(),
                    product_id: format!("p{i}"),
                    product_name: None,
                    review_text: "Consistent review text for the determinism run.".to_string(),
                    rating: 4,
                    payout_amount: None,
                },
            )
            .unwrap()
            .fraud_score
        })
        .collect()
}

#[test]
fn same_seed_reproduces_scores_exactly() {
    let a = seeded_scores(12345, 10);
    let b = seeded_scores(12345, 10);
    for (i, (x, y)) in a.iter().zip(&b).enumerate() {
        assert_eq!(x.to_bits(), y.to_bits(), "score {i} diverged: {x} vs {y}");
    }
}

#[test]
fn different_seeds_diverge() {
    let a = seeded_scores(1, 10);
    let b = seeded_scores(2, 10);
    assert!(
        a.iter().zip(&b).any(|(x, y)| x.to_bits() != y.to_bits()),
        "expected at least one differing score across seeds"
    );
}

#[test]
fn seeded_scores_respect_the_configured_span() {
    let span = OpsConfig::default().seed_score_span;
    for seed in [0, 7, 99, 4096] {
        for score in seeded_scores(seed, 25) {
            assert!(
                (0.0..span).contains(&score),
                "seed {seed} produced out-of-span score {score}"
            );
        }
    }
}
