//! Payout lifecycle — the only writer of a review's payout status.
//!
//! State machine per review:
//!   pending -> approved  (admin; credits earnings, records the payout)
//!   pending -> rejected  (admin; records the reason)
//!   pending -> fraud     (admin, or the refund-correlation auto trigger)
//! Approved, rejected and fraud are terminal.

use crate::{
    clock::OpsClock,
    error::{OpsError, OpsResult},
    event::{FraudTrigger, OpsEvent},
    identity,
    reviews::{PayoutStatus, ReviewRecord},
    store::PayoutStore,
    types::{PayoutId, ReviewId, UserId},
};
use chrono::NaiveDate;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

// ── Constants ────────────────────────────────────────────────────────────────

/// Fraud reviews at which the user is automatically flagged.
pub const REPEAT_FRAUD_FLAG_COUNT: i64 = 2;

pub const REPEAT_FRAUD_FLAG_REASON: &str = "Multiple fraudulent reviews detected";
pub const DEFAULT_REJECTION_REASON: &str = "No reason provided";
pub const DEFAULT_FRAUD_REASON: &str = "Flagged as fraudulent";
pub const REFUND_FRAUD_REASON: &str = "Product refunded after review submission";

// ── Payout record ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PayoutState {
    Pending,
    Completed,
}

impl PayoutState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }
}

impl FromSql for PayoutState {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            other => Err(FromSqlError::Other(
                format!("unknown payout state '{other}'").into(),
            )),
        }
    }
}

impl ToSql for PayoutState {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

/// The administrative record cut when a review's payout is approved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutRecord {
    pub payout_id: PayoutId,
    pub review_id: ReviewId,
    pub user_id: UserId,
    pub amount: f64,
    pub status: PayoutState,
    pub approved_at: NaiveDate,
    pub approved_by: UserId,
    pub paid_at: Option<NaiveDate>,
}

// ── Transitions ──────────────────────────────────────────────────────────────

/// Approve a pending review: credits the user's earnings and cuts the
/// payout record.
pub fn approve(
    store: &PayoutStore,
    clock: &OpsClock,
    review_id: ReviewId,
    admin_id: &str,
) -> OpsResult<ReviewRecord> {
    let review = require_pending(store, review_id, PayoutStatus::Approved)?;
    let today = clock.today();

    store.mark_approved(review_id, today, admin_id)?;
    identity::update_user_earnings(store, &review.user_id, review.payout_amount)?;
    store.insert_payout(
        review_id,
        &review.user_id,
        review.payout_amount,
        PayoutState::Completed,
        today,
        admin_id,
        Some(today),
    )?;
    store.append_event(
        today,
        &OpsEvent::ReviewApproved {
            review_id,
            user_id: review.user_id.clone(),
            amount: review.payout_amount,
            approved_by: admin_id.to_string(),
        },
    )?;
    log::info!(
        "review {review_id} approved by {admin_id}: {:.2} credited to {}",
        review.payout_amount,
        review.user_id
    );
    require_review(store, review_id)
}

/// Reject a pending review.
pub fn reject(
    store: &PayoutStore,
    clock: &OpsClock,
    review_id: ReviewId,
    reason: Option<&str>,
) -> OpsResult<ReviewRecord> {
    let review = require_pending(store, review_id, PayoutStatus::Rejected)?;
    let reason = reason.unwrap_or(DEFAULT_REJECTION_REASON);

    store.mark_rejected(review_id, reason)?;
    store.append_event(
        clock.today(),
        &OpsEvent::ReviewRejected {
            review_id,
            user_id: review.user_id.clone(),
            reason: reason.to_string(),
        },
    )?;
    log::info!("review {review_id} rejected: {reason}");
    require_review(store, review_id)
}

/// Move a pending review to fraud. Fraud is permanent. A user reaching
/// REPEAT_FRAUD_FLAG_COUNT fraud reviews is flagged on the spot.
pub fn flag_fraud(
    store: &PayoutStore,
    clock: &OpsClock,
    review_id: ReviewId,
    reason: Option<&str>,
    trigger: FraudTrigger,
) -> OpsResult<ReviewRecord> {
    let review = require_pending(store, review_id, PayoutStatus::Fraud)?;
    let reason = reason.unwrap_or(match trigger {
        FraudTrigger::Admin => DEFAULT_FRAUD_REASON,
        FraudTrigger::RefundCorrelation => REFUND_FRAUD_REASON,
    });
    let today = clock.today();

    store.mark_fraud(review_id, reason)?;
    store.append_event(
        today,
        &OpsEvent::ReviewMarkedFraud {
            review_id,
            user_id: review.user_id.clone(),
            reason: reason.to_string(),
            trigger,
        },
    )?;
    log::warn!("review {review_id} marked fraud ({trigger:?}): {reason}");

    let fraud_count = store.count_fraud_reviews(&review.user_id)?;
    if fraud_count >= REPEAT_FRAUD_FLAG_COUNT {
        store.set_user_flag(&review.user_id, REPEAT_FRAUD_FLAG_REASON, today)?;
        store.append_event(
            today,
            &OpsEvent::UserFlagged {
                user_id: review.user_id.clone(),
                reason: REPEAT_FRAUD_FLAG_REASON.to_string(),
            },
        )?;
        log::warn!(
            "user {} flagged after {fraud_count} fraud reviews",
            review.user_id
        );
    }

    require_review(store, review_id)
}

/// Status-directed transition entry point for presentation layers.
/// Pending is never a transition target.
pub fn update_payout_status(
    store: &PayoutStore,
    clock: &OpsClock,
    review_id: ReviewId,
    status: PayoutStatus,
    admin_id: &str,
) -> OpsResult<ReviewRecord> {
    match status {
        PayoutStatus::Approved => approve(store, clock, review_id, admin_id),
        PayoutStatus::Rejected => reject(store, clock, review_id, None),
        PayoutStatus::Fraud => flag_fraud(store, clock, review_id, None, FraudTrigger::Admin),
        PayoutStatus::Pending => Err(OpsError::InvalidTransition {
            review_id,
            from: require_review(store, review_id)?.payout_status.as_str(),
            to: PayoutStatus::Pending.as_str(),
        }),
    }
}

// ── Bulk approval ────────────────────────────────────────────────────────────

/// One item's outcome in a bulk approval.
#[derive(Debug, Serialize)]
pub struct BulkApproveItem {
    pub review_id: ReviewId,
    pub success: bool,
    pub error: Option<String>,
    pub review: Option<ReviewRecord>,
}

/// Approve each id independently. A failing item (missing id, terminal
/// status) is reported in place; the batch never aborts.
pub fn bulk_approve(
    store: &PayoutStore,
    clock: &OpsClock,
    review_ids: &[ReviewId],
    admin_id: &str,
) -> Vec<BulkApproveItem> {
    review_ids
        .iter()
        .map(|&review_id| match approve(store, clock, review_id, admin_id) {
            Ok(review) => BulkApproveItem {
                review_id,
                success: true,
                error: None,
                review: Some(review),
            },
            Err(e) => BulkApproveItem {
                review_id,
                success: false,
                error: Some(e.to_string()),
                review: None,
            },
        })
        .collect()
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn require_review(store: &PayoutStore, review_id: ReviewId) -> OpsResult<ReviewRecord> {
    store
        .get_review(review_id)?
        .ok_or(OpsError::ReviewNotFound { review_id })
}

fn require_pending(
    store: &PayoutStore,
    review_id: ReviewId,
    to: PayoutStatus,
) -> OpsResult<ReviewRecord> {
    let review = require_review(store, review_id)?;
    if review.payout_status.is_terminal() {
        return Err(OpsError::InvalidTransition {
            review_id,
            from: review.payout_status.as_str(),
            to: to.as_str(),
        });
    }
    Ok(review)
}
