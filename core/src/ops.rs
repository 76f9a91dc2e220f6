//! Admin dashboard aggregations: flagged activity, payout triage, and
//! the user-level risk ranking.
//!
//! Everything here is read-only over the store. The aggregate risk score
//! ranks users for manual triage; it never drives a transition.

use crate::{
    clock::OpsClock,
    error::OpsResult,
    identity::{self, UserRecord, UserStats},
    reviews::{self, PayoutStatus, ReviewRecord, ReviewStats},
    risk::{self, RiskLevel, UserRiskInputs},
    store::PayoutStore,
    transactions::{self, TransactionStats},
};
use serde::Serialize;
use std::collections::BTreeMap;

/// Pending reviews above this fraud score are surfaced as high-risk.
pub const HIGH_RISK_PENDING_CUTOFF: f64 = 0.5;

// ── Eligible users (risk ranking) ────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct UserRiskAssessment {
    pub refunds_count: i64,
    pub avg_fraud_score: f64,
    pub previous_fraud: i64,
    pub account_age_days: i64,
}

/// One user awaiting payout, with their pending reviews and risk rank.
#[derive(Debug, Clone, Serialize)]
pub struct EligibleUser {
    pub user: UserRecord,
    pub pending_reviews: Vec<ReviewRecord>,
    pub total_pending_amount: f64,
    pub risk_assessment: UserRiskAssessment,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
}

/// Users with pending reviews, grouped and sorted by aggregate risk,
/// highest first.
pub fn eligible_users(store: &PayoutStore, clock: &OpsClock) -> OpsResult<Vec<EligibleUser>> {
    let pending = store.pending_reviews()?;

    let mut by_user: BTreeMap<String, Vec<ReviewRecord>> = BTreeMap::new();
    for review in pending {
        by_user.entry(review.user_id.clone()).or_default().push(review);
    }

    let mut out = Vec::with_capacity(by_user.len());
    for (user_id, pending_reviews) in by_user {
        let user = identity::require_user(store, &user_id)?;
        let all_reviews = store.reviews_by_user(&user_id)?;
        let (_, refunds_count) = store.user_transaction_counts(&user_id)?;
        let previous_fraud = store.count_fraud_reviews(&user_id)?;

        let avg_fraud_score = if all_reviews.is_empty() {
            0.0
        } else {
            all_reviews.iter().map(|r| r.fraud_score).sum::<f64>() / all_reviews.len() as f64
        };
        let total_pending_amount = pending_reviews.iter().map(|r| r.payout_amount).sum();

        let risk_score = risk::aggregate_user_risk(&UserRiskInputs {
            avg_fraud_score,
            refund_count: refunds_count,
            pending_review_count: pending_reviews.len() as i64,
            fraud_review_count: previous_fraud,
            reviews_completed: user.reviews_completed,
        });

        out.push(EligibleUser {
            risk_assessment: UserRiskAssessment {
                refunds_count,
                avg_fraud_score,
                previous_fraud,
                account_age_days: clock.days_since(user.created_at),
            },
            user,
            pending_reviews,
            total_pending_amount,
            risk_score,
            risk_level: RiskLevel::from_score(risk_score),
        });
    }

    out.sort_by(|a, b| b.risk_score.total_cmp(&a.risk_score));
    Ok(out)
}

// ── Flagged detail views ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ReviewRiskFactors {
    pub multiple_refunds: i64,
    pub fraud_reviews: i64,
    pub avg_fraud_score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FlaggedReviewDetail {
    pub review: ReviewRecord,
    pub user: Option<UserRecord>,
    pub risk_factors: ReviewRiskFactors,
}

/// Flagged reviews (fraud status or high score) with submitter context.
pub fn flagged_reviews_detail(store: &PayoutStore) -> OpsResult<Vec<FlaggedReviewDetail>> {
    let flagged = reviews::flagged_reviews(store)?;
    let mut out = Vec::with_capacity(flagged.len());
    for review in flagged {
        let user = store.get_user(&review.user_id)?;
        let user_reviews = store.reviews_by_user(&review.user_id)?;
        let (_, refunds) = store.user_transaction_counts(&review.user_id)?;
        let avg_fraud_score = if user_reviews.is_empty() {
            0.0
        } else {
            user_reviews.iter().map(|r| r.fraud_score).sum::<f64>() / user_reviews.len() as f64
        };
        out.push(FlaggedReviewDetail {
            risk_factors: ReviewRiskFactors {
                multiple_refunds: refunds,
                fraud_reviews: store.count_fraud_reviews(&review.user_id)?,
                avg_fraud_score,
            },
            user,
            review,
        });
    }
    Ok(out)
}

#[derive(Debug, Clone, Serialize)]
pub struct FlaggedUserDetail {
    pub user: UserRecord,
    pub review_total: i64,
    pub review_fraud: i64,
    pub review_pending: i64,
    pub transaction_total: i64,
    pub transaction_refunded: i64,
}

/// Flagged users with their review and transaction breakdowns.
pub fn flagged_users_detail(store: &PayoutStore) -> OpsResult<Vec<FlaggedUserDetail>> {
    let flagged = store.flagged_users()?;
    let mut out = Vec::with_capacity(flagged.len());
    for user in flagged {
        let user_reviews = store.reviews_by_user(&user.user_id)?;
        let (txn_total, txn_refunded) = store.user_transaction_counts(&user.user_id)?;
        out.push(FlaggedUserDetail {
            review_total: user_reviews.len() as i64,
            review_fraud: user_reviews
                .iter()
                .filter(|r| r.payout_status == PayoutStatus::Fraud)
                .count() as i64,
            review_pending: user_reviews
                .iter()
                .filter(|r| r.payout_status == PayoutStatus::Pending)
                .count() as i64,
            transaction_total: txn_total,
            transaction_refunded: txn_refunded,
            user,
        });
    }
    Ok(out)
}

// ── Dashboard ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub flagged_reviews: i64,
    pub high_risk_pending: i64,
    pub suspicious_users: i64,
    pub total_users: i64,
    pub refund_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PayoutTotals {
    pub pending_amount: f64,
    pub approved_amount: f64,
    pub total_paid: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub summary: DashboardSummary,
    pub high_risk_reviews: Vec<ReviewRecord>,
    pub review_stats: ReviewStats,
    pub user_stats: UserStats,
    pub transaction_stats: TransactionStats,
}

/// One-call overview of flagged and suspicious activity.
pub fn dashboard(store: &PayoutStore) -> OpsResult<Dashboard> {
    let flagged = reviews::flagged_reviews(store)?;
    let pending = store.pending_reviews()?;
    let review_stats = store.review_stats()?;
    let user_stats = identity::user_stats(store)?;
    let transaction_stats = transactions::transaction_stats(store)?;

    let high_risk_reviews: Vec<ReviewRecord> = pending
        .iter()
        .filter(|r| r.fraud_score > HIGH_RISK_PENDING_CUTOFF)
        .cloned()
        .collect();

    // Pending reviewers who have any refunded purchase.
    let mut suspicious_users = 0i64;
    for review in &pending {
        let (_, refunded) = store.user_transaction_counts(&review.user_id)?;
        if refunded > 0 {
            suspicious_users += 1;
        }
    }

    Ok(Dashboard {
        summary: DashboardSummary {
            flagged_reviews: flagged.len() as i64,
            high_risk_pending: high_risk_reviews.len() as i64,
            suspicious_users,
            total_users: user_stats.total,
            refund_rate: transaction_stats.refund_rate,
        },
        high_risk_reviews,
        review_stats,
        user_stats,
        transaction_stats,
    })
}

/// Monetary totals across the payout pipeline.
pub fn payout_totals(store: &PayoutStore) -> OpsResult<PayoutTotals> {
    let (pending_amount, approved_amount) = store.payout_amount_totals()?;
    let user_stats = identity::user_stats(store)?;
    Ok(PayoutTotals {
        pending_amount,
        approved_amount,
        total_paid: user_stats.total_earnings,
    })
}
