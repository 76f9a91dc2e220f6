//! Payout eligibility evaluation.
//!
//! Maps a (user, product, transaction) triple to a grant/deny decision
//! with an explanation and an evidence bundle. Denial is a first-class
//! successful result — the evaluator only errors on missing input,
//! an unresolvable triple, or an unknown user.
//!
//! Checks run in a fixed order, first match wins:
//!   flagged account > refunded transaction > missing review > review status.

use crate::{
    clock::OpsClock,
    error::{OpsError, OpsResult},
    event::FraudTrigger,
    identity::{self, UserStatus},
    lifecycle,
    reviews::{PayoutStatus, ReviewRecord},
    store::PayoutStore,
    transactions::TransactionRecord,
};
use chrono::NaiveDate;
use serde::Serialize;

/// Named decision states surfaced to the caller.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EligibilityStatus {
    AccountFlagged,
    PayoutDenied,
    NoReviewFound,
    UnderReview,
    PayoutApproved,
    PayoutRejected,
    FraudulentActivityDetected,
}

impl EligibilityStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::AccountFlagged => "Account Flagged",
            Self::PayoutDenied => "Payout Denied",
            Self::NoReviewFound => "No Review Found",
            Self::UnderReview => "Under Review",
            Self::PayoutApproved => "Payout Approved",
            Self::PayoutRejected => "Payout Rejected",
            Self::FraudulentActivityDetected => "Fraudulent Activity Detected",
        }
    }
}

impl std::fmt::Display for EligibilityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Risk evidence attached when the resolved review is still pending.
/// Informational only; never alters the decision.
#[derive(Debug, Clone, Serialize)]
pub struct RiskEvidence {
    pub fraud_score: f64,
    pub refund_history: i64,
    pub previous_fraud: i64,
    pub account_age_days: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DecisionDetails {
    pub transaction: TransactionRecord,
    pub user_status: UserStatus,
    pub has_reviewed: bool,
    pub review: Option<ReviewRecord>,
    pub flag_reason: Option<String>,
    pub flagged_at: Option<NaiveDate>,
    pub estimated_payout: Option<f64>,
    pub payout_amount: Option<f64>,
    pub approved_at: Option<NaiveDate>,
    pub rejection_reason: Option<String>,
    pub fraud_reason: Option<String>,
    /// Set when this evaluation itself moved the review to fraud.
    pub review_flagged_as_fraud: bool,
    pub risk_assessment: Option<RiskEvidence>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Decision {
    /// Eligibility: true only for an approved payout.
    pub granted: bool,
    pub status: EligibilityStatus,
    pub message: String,
    pub details: DecisionDetails,
}

/// Evaluate payout eligibility for a (user, product, transaction) triple.
///
/// The one side effect: a refunded transaction moves a still-pending
/// matching review to fraud, once. Re-evaluation after that sees the
/// fraud review and changes nothing.
pub fn evaluate(
    store: &PayoutStore,
    clock: &OpsClock,
    user_id: &str,
    product_id: &str,
    transaction_id: &str,
) -> OpsResult<Decision> {
    if user_id.trim().is_empty() {
        return Err(OpsError::InvalidInput { field: "user_id" });
    }
    if product_id.trim().is_empty() {
        return Err(OpsError::InvalidInput { field: "product_id" });
    }
    if transaction_id.trim().is_empty() {
        return Err(OpsError::InvalidInput { field: "transaction_id" });
    }

    let transaction = store
        .find_transaction_triple(user_id, product_id, transaction_id)?
        .ok_or(OpsError::TransactionNotFound)?;
    let user = identity::require_user(store, user_id)?;

    // A flagged account supersedes every other check.
    if user.status == UserStatus::Flagged {
        return Ok(Decision {
            granted: false,
            status: EligibilityStatus::AccountFlagged,
            message: "Your account has been flagged. Please contact support.".to_string(),
            details: DecisionDetails {
                transaction,
                user_status: user.status,
                has_reviewed: false,
                review: None,
                flag_reason: user.flag_reason.clone(),
                flagged_at: user.flagged_at,
                estimated_payout: None,
                payout_amount: None,
                approved_at: None,
                rejection_reason: None,
                fraud_reason: None,
                review_flagged_as_fraud: false,
                risk_assessment: None,
            },
        });
    }

    let review = store.review_for_product(user_id, product_id)?;

    let mut details = DecisionDetails {
        transaction: transaction.clone(),
        user_status: user.status,
        has_reviewed: review.is_some(),
        review: None,
        flag_reason: None,
        flagged_at: None,
        estimated_payout: None,
        payout_amount: None,
        approved_at: None,
        rejection_reason: None,
        fraud_reason: None,
        review_flagged_as_fraud: false,
        risk_assessment: None,
    };

    let (granted, status, message) = if transaction.refund_status {
        // Refunded purchase: always denied, and a still-pending review is
        // auto-flagged as fraud (the one automatic fraud transition).
        if let Some(r) = &review {
            if r.payout_status == PayoutStatus::Pending {
                lifecycle::flag_fraud(
                    store,
                    clock,
                    r.review_id,
                    None,
                    FraudTrigger::RefundCorrelation,
                )?;
                details.review_flagged_as_fraud = true;
                log::info!(
                    "review {} auto-flagged: refunded transaction {}",
                    r.review_id,
                    transaction.transaction_id
                );
            }
        }
        let refunded_on = transaction
            .refund_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "an earlier date".to_string());
        (
            false,
            EligibilityStatus::PayoutDenied,
            format!(
                "Payout denied: Product \"{}\" was refunded on {refunded_on}",
                transaction.product_name
            ),
        )
    } else {
        match &review {
            None => (
                false,
                EligibilityStatus::NoReviewFound,
                "No review found for this product. Please submit a review first.".to_string(),
            ),
            Some(r) => match r.payout_status {
                PayoutStatus::Pending => {
                    details.estimated_payout = Some(r.payout_amount);
                    (
                        false,
                        EligibilityStatus::UnderReview,
                        "Your review is under review for payout approval.".to_string(),
                    )
                }
                PayoutStatus::Approved => {
                    details.payout_amount = Some(r.payout_amount);
                    details.approved_at = r.approved_at;
                    (
                        true,
                        EligibilityStatus::PayoutApproved,
                        format!(
                            "Payout of ${:.2} has been approved and will be processed soon.",
                            r.payout_amount
                        ),
                    )
                }
                PayoutStatus::Rejected => {
                    details.rejection_reason = r.rejection_reason.clone();
                    (
                        false,
                        EligibilityStatus::PayoutRejected,
                        "Your payout request has been rejected.".to_string(),
                    )
                }
                PayoutStatus::Fraud => {
                    details.fraud_reason = r.fraud_reason.clone();
                    (
                        false,
                        EligibilityStatus::FraudulentActivityDetected,
                        "Fraudulent activity detected. Payout permanently denied.".to_string(),
                    )
                }
            },
        }
    };

    // Re-read so the details carry the post-transition review state.
    let review = store.review_for_product(user_id, product_id)?;

    // Risk evidence rides along only while the review is still pending.
    if let Some(r) = &review {
        if r.payout_status == PayoutStatus::Pending {
            let (_, refund_history) = store.user_transaction_counts(user_id)?;
            details.risk_assessment = Some(RiskEvidence {
                fraud_score: r.fraud_score,
                refund_history,
                previous_fraud: store.count_fraud_reviews(user_id)?,
                account_age_days: clock.days_since(user.created_at),
            });
        }
    }
    details.review = review;

    Ok(Decision {
        granted,
        status,
        message,
        details,
    })
}
