//! Fraud-risk scoring.
//!
//! Two distinct scorers live here and stay distinct:
//!   1. review_fraud_score — per-review signals, additive then clamped.
//!      Drives the on-demand fraud assessment of a single review.
//!   2. aggregate_user_risk — per-user weighted blend, used only to rank
//!      users awaiting payout. Never drives a state transition.

use crate::{
    error::{OpsError, OpsResult},
    store::PayoutStore,
    types::ReviewId,
};
use serde::{Deserialize, Serialize};

// ── Constants ────────────────────────────────────────────────────────────────

/// The reviewed product's own transaction was refunded.
pub const REFUND_CORRELATION_WEIGHT: f64 = 0.40;
/// The user has at least one prior fraud-status review.
pub const REPEAT_OFFENDER_WEIGHT: f64 = 0.30;
/// More than half the user's transactions were refunded.
pub const REFUND_RATE_WEIGHT: f64 = 0.20;
/// Review body under the low-effort length cutoff.
pub const LOW_EFFORT_TEXT_WEIGHT: f64 = 0.10;

pub const HIGH_REFUND_RATE_CUTOFF: f64 = 0.5;
pub const LOW_EFFORT_TEXT_CHARS: usize = 20;

pub const HIGH_RISK_THRESHOLD: f64 = 0.7;
pub const MEDIUM_RISK_THRESHOLD: f64 = 0.4;

// User-level blend weights.
const USER_AVG_SCORE_WEIGHT: f64 = 0.4;
const USER_REFUND_RATE_WEIGHT: f64 = 0.3;
const USER_FRAUD_RATE_WEIGHT: f64 = 0.3;

// ── Risk buckets ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        if score > HIGH_RISK_THRESHOLD {
            Self::High
        } else if score > MEDIUM_RISK_THRESHOLD {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn recommendation(self) -> Recommendation {
        match self {
            Self::High => Recommendation::Reject,
            Self::Medium => Recommendation::ManualReview,
            Self::Low => Recommendation::Approve,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    Approve,
    ManualReview,
    Reject,
}

// ── Per-review scorer ────────────────────────────────────────────────────────

/// The raw signals feeding one review's fraud score.
#[derive(Debug, Clone)]
pub struct ReviewSignals {
    /// The review's stored (seeded) fraud score.
    pub base_score: f64,
    pub product_refunded: bool,
    pub prior_fraud_reviews: i64,
    /// Refunded fraction of the user's transactions; 0 when they have none.
    pub refund_rate: f64,
    pub review_text_len: usize,
}

/// Additive combination of the fraud signals, clamped to 1.0.
/// Returns the score and the human-readable factors that fired.
pub fn review_fraud_score(signals: &ReviewSignals) -> (f64, Vec<String>) {
    let mut score = signals.base_score;
    let mut factors = Vec::new();

    if signals.product_refunded {
        score += REFUND_CORRELATION_WEIGHT;
        factors.push("Product was refunded".to_string());
    }

    if signals.prior_fraud_reviews > 0 {
        score += REPEAT_OFFENDER_WEIGHT;
        factors.push(format!(
            "User has {} previous fraud cases",
            signals.prior_fraud_reviews
        ));
    }

    if signals.refund_rate > HIGH_REFUND_RATE_CUTOFF {
        score += REFUND_RATE_WEIGHT;
        factors.push(format!(
            "High refund rate: {:.1}%",
            signals.refund_rate * 100.0
        ));
    }

    if signals.review_text_len < LOW_EFFORT_TEXT_CHARS {
        score += LOW_EFFORT_TEXT_WEIGHT;
        factors.push("Review text is too short".to_string());
    }

    (score.min(1.0), factors)
}

/// On-demand fraud assessment of one review.
#[derive(Debug, Clone, Serialize)]
pub struct FraudAssessment {
    pub review_id: ReviewId,
    pub fraud_score: f64,
    pub risk_level: RiskLevel,
    pub fraud_factors: Vec<String>,
    pub recommendation: Recommendation,
}

/// Score a stored review from its own fields plus the user's transaction
/// and review history. Recomputed on demand; never persisted back.
pub fn assess_review(store: &PayoutStore, review_id: ReviewId) -> OpsResult<FraudAssessment> {
    let review = store
        .get_review(review_id)?
        .ok_or(OpsError::ReviewNotFound { review_id })?;

    let product_refunded = store
        .transaction_for_product(&review.user_id, &review.product_id)?
        .map(|t| t.refund_status)
        .unwrap_or(false);
    let prior_fraud_reviews = store.count_fraud_reviews(&review.user_id)?;
    let (txn_total, txn_refunded) = store.user_transaction_counts(&review.user_id)?;
    // No transactions means no refund-rate signal, not a NaN.
    let refund_rate = if txn_total > 0 {
        txn_refunded as f64 / txn_total as f64
    } else {
        0.0
    };

    let signals = ReviewSignals {
        base_score: review.fraud_score,
        product_refunded,
        prior_fraud_reviews,
        refund_rate,
        review_text_len: review.review_text.chars().count(),
    };
    let (fraud_score, fraud_factors) = review_fraud_score(&signals);
    let risk_level = RiskLevel::from_score(fraud_score);

    Ok(FraudAssessment {
        review_id,
        fraud_score,
        risk_level,
        fraud_factors,
        recommendation: risk_level.recommendation(),
    })
}

// ── Per-user aggregate ───────────────────────────────────────────────────────

/// Inputs to the user-level risk blend.
#[derive(Debug, Clone)]
pub struct UserRiskInputs {
    pub avg_fraud_score: f64,
    pub refund_count: i64,
    pub pending_review_count: i64,
    pub fraud_review_count: i64,
    pub reviews_completed: i64,
}

/// Weighted blend of a user's history, clamped to 1.0. Ranking only.
pub fn aggregate_user_risk(inputs: &UserRiskInputs) -> f64 {
    let refund_rate = inputs.refund_count as f64 / inputs.pending_review_count.max(1) as f64;
    let fraud_rate = inputs.fraud_review_count as f64 / inputs.reviews_completed.max(1) as f64;
    let score = inputs.avg_fraud_score * USER_AVG_SCORE_WEIGHT
        + refund_rate * USER_REFUND_RATE_WEIGHT
        + fraud_rate * USER_FRAUD_RATE_WEIGHT;
    score.min(1.0)
}
