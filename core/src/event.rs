//! Audit event log — every state change the engine performs.
//!
//! RULE: Modules that mutate store state append an OpsEvent describing
//! the change. The log is append-only; nothing in the engine reads it
//! back for decisions.

use crate::types::{ProductId, ReviewId, TransactionId, UserId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// What caused a review's fraud transition.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FraudTrigger {
    /// Manual admin flag.
    Admin,
    /// Automatic flag from a refunded transaction during eligibility checking.
    RefundCorrelation,
}

/// Every auditable event. Variants are added, never removed or reordered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OpsEvent {
    ReviewCreated {
        review_id: ReviewId,
        user_id: UserId,
        product_id: ProductId,
    },
    ReviewApproved {
        review_id: ReviewId,
        user_id: UserId,
        amount: f64,
        approved_by: UserId,
    },
    ReviewRejected {
        review_id: ReviewId,
        user_id: UserId,
        reason: String,
    },
    ReviewMarkedFraud {
        review_id: ReviewId,
        user_id: UserId,
        reason: String,
        trigger: FraudTrigger,
    },
    UserFlagged {
        user_id: UserId,
        reason: String,
    },
    UserUnflagged {
        user_id: UserId,
    },
    RefundRecorded {
        transaction_id: TransactionId,
        user_id: UserId,
        amount: f64,
    },
}

/// A persisted event log row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id: Option<i64>,
    pub logged_on: NaiveDate,
    pub event_type: String,
    pub payload: String,
}

/// Stable string name for the event_type column.
pub fn event_type_name(event: &OpsEvent) -> &'static str {
    match event {
        OpsEvent::ReviewCreated { .. } => "review_created",
        OpsEvent::ReviewApproved { .. } => "review_approved",
        OpsEvent::ReviewRejected { .. } => "review_rejected",
        OpsEvent::ReviewMarkedFraud { .. } => "review_marked_fraud",
        OpsEvent::UserFlagged { .. } => "user_flagged",
        OpsEvent::UserUnflagged { .. } => "user_unflagged",
        OpsEvent::RefundRecorded { .. } => "refund_recorded",
    }
}
