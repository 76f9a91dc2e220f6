//! Review records and submission.
//!
//! A review is born Pending with a seeded low fraud score. Status changes
//! after creation go through the lifecycle module only.

use crate::{
    clock::OpsClock,
    config::OpsConfig,
    error::{OpsError, OpsResult},
    event::OpsEvent,
    identity,
    risk,
    rng::ScoreSeeder,
    store::PayoutStore,
    types::{ProductId, ReviewId, UserId},
};
use chrono::NaiveDate;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PayoutStatus {
    Pending,
    Approved,
    Rejected,
    Fraud,
}

impl PayoutStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Fraud => "fraud",
        }
    }

    /// Terminal statuses admit no further transition.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl FromSql for PayoutStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "fraud" => Ok(Self::Fraud),
            other => Err(FromSqlError::Other(
                format!("unknown payout status '{other}'").into(),
            )),
        }
    }
}

impl ToSql for PayoutStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub review_id: ReviewId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub product_name: String,
    pub review_text: String,
    pub rating: i64,
    pub payout_status: PayoutStatus,
    pub payout_amount: f64,
    pub fraud_score: f64,
    pub created_at: NaiveDate,
    pub approved_at: Option<NaiveDate>,
    pub approved_by: Option<UserId>,
    pub rejection_reason: Option<String>,
    pub fraud_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewReview {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub product_name: Option<String>,
    pub review_text: String,
    pub rating: i64,
    pub payout_amount: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewStats {
    pub total: i64,
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
    pub fraud: i64,
}

/// Submit a review. Fails with Conflict on a second review for the same
/// (user, product) pair, before any mutation.
pub fn create_review(
    store: &PayoutStore,
    clock: &OpsClock,
    seeder: &mut ScoreSeeder,
    config: &OpsConfig,
    new: NewReview,
) -> OpsResult<ReviewRecord> {
    if new.user_id.trim().is_empty() {
        return Err(OpsError::InvalidInput { field: "user_id" });
    }
    if new.product_id.trim().is_empty() {
        return Err(OpsError::InvalidInput { field: "product_id" });
    }
    if new.review_text.trim().is_empty() {
        return Err(OpsError::InvalidInput { field: "review_text" });
    }
    if !(1..=5).contains(&new.rating) {
        return Err(OpsError::InvalidInput { field: "rating" });
    }
    identity::require_user(store, &new.user_id)?;

    if store
        .review_for_product(&new.user_id, &new.product_id)?
        .is_some()
    {
        return Err(OpsError::DuplicateReview {
            user_id: new.user_id,
            product_id: new.product_id,
        });
    }

    let product_name = new
        .product_name
        .unwrap_or_else(|| format!("Product {}", new.product_id));
    let payout_amount = new
        .payout_amount
        .unwrap_or(config.default_payout_amount);
    let fraud_score = seeder.initial_score(config.seed_score_span);

    let review_id = store.insert_review(
        &new.user_id,
        &new.product_id,
        &product_name,
        &new.review_text,
        new.rating,
        payout_amount,
        fraud_score,
        clock.today(),
    )?;
    store.append_event(
        clock.today(),
        &OpsEvent::ReviewCreated {
            review_id,
            user_id: new.user_id.clone(),
            product_id: new.product_id.clone(),
        },
    )?;
    log::debug!(
        "review {review_id} created for {} / {} (seed score {fraud_score:.3})",
        new.user_id,
        new.product_id
    );

    store
        .get_review(review_id)?
        .ok_or(OpsError::ReviewNotFound { review_id })
}

pub fn get_review(store: &PayoutStore, review_id: ReviewId) -> OpsResult<Option<ReviewRecord>> {
    store.get_review(review_id)
}

pub fn reviews_by_user(store: &PayoutStore, user_id: &str) -> OpsResult<Vec<ReviewRecord>> {
    store.reviews_by_user(user_id)
}

pub fn pending_reviews(store: &PayoutStore) -> OpsResult<Vec<ReviewRecord>> {
    store.pending_reviews()
}

pub fn approved_reviews(store: &PayoutStore) -> OpsResult<Vec<ReviewRecord>> {
    store.approved_reviews()
}

/// Reviews needing attention: fraud status, or fraud score above the
/// high-risk threshold.
pub fn flagged_reviews(store: &PayoutStore) -> OpsResult<Vec<ReviewRecord>> {
    store.flagged_reviews(risk::HIGH_RISK_THRESHOLD)
}

pub fn review_stats(store: &PayoutStore) -> OpsResult<ReviewStats> {
    store.review_stats()
}
