use crate::types::{ProductId, ReviewId, TransactionId, UserId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OpsError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Missing or invalid input: {field}")]
    InvalidInput { field: &'static str },

    #[error("User '{user_id}' not found")]
    UserNotFound { user_id: UserId },

    #[error("Review {review_id} not found")]
    ReviewNotFound { review_id: ReviewId },

    #[error("Transaction not found or does not match the provided details")]
    TransactionNotFound,

    #[error("User '{user_id}' has already reviewed product '{product_id}'")]
    DuplicateReview {
        user_id: UserId,
        product_id: ProductId,
    },

    #[error("Refund already recorded for transaction '{transaction_id}'")]
    RefundAlreadyRecorded { transaction_id: TransactionId },

    #[error("Review {review_id} is {from}; cannot transition to {to}")]
    InvalidTransition {
        review_id: ReviewId,
        from: &'static str,
        to: &'static str,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type OpsResult<T> = Result<T, OpsError>;
