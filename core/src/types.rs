//! Shared primitive types used across the crate.

/// A stable user identifier (e.g. "user1").
pub type UserId = String;

/// A product identifier as carried on reviews and transactions.
pub type ProductId = String;

/// A purchase transaction identifier.
pub type TransactionId = String;

/// A review's row id. Assigned monotonically by the store on insert.
pub type ReviewId = i64;

/// A payout record's row id.
pub type PayoutId = i64;
