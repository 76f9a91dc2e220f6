//! Transaction collaborator — purchase records and refund bookkeeping.
//!
//! A transaction is immutable after creation except for its refund
//! fields, which are written exactly once.

use crate::{
    clock::OpsClock,
    error::{OpsError, OpsResult},
    event::OpsEvent,
    identity,
    store::PayoutStore,
    types::{ProductId, TransactionId, UserId},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub transaction_id: TransactionId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub product_name: String,
    pub purchase_amount: f64,
    pub purchase_date: NaiveDate,
    pub refund_status: bool,
    pub refund_amount: f64,
    pub refund_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTransaction {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub product_name: String,
    pub purchase_amount: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionStats {
    pub total: i64,
    pub active: i64,
    pub refunded: i64,
    pub total_purchase_amount: f64,
    pub total_refund_amount: f64,
    /// Percentage of transactions refunded, two-decimal.
    pub refund_rate: f64,
}

/// Record a purchase. Unrefunded, dated today.
pub fn create_transaction(
    store: &PayoutStore,
    clock: &OpsClock,
    new: NewTransaction,
) -> OpsResult<TransactionRecord> {
    if new.user_id.trim().is_empty() {
        return Err(OpsError::InvalidInput { field: "user_id" });
    }
    if new.product_id.trim().is_empty() {
        return Err(OpsError::InvalidInput { field: "product_id" });
    }
    identity::require_user(store, &new.user_id)?;

    let record = TransactionRecord {
        transaction_id: format!("txn-{}", Uuid::new_v4()),
        user_id: new.user_id,
        product_id: new.product_id,
        product_name: new.product_name,
        purchase_amount: new.purchase_amount,
        purchase_date: clock.today(),
        refund_status: false,
        refund_amount: 0.0,
        refund_date: None,
    };
    store.insert_transaction(&record)?;
    Ok(record)
}

pub fn get_transaction(
    store: &PayoutStore,
    transaction_id: &str,
) -> OpsResult<Option<TransactionRecord>> {
    store.get_transaction(transaction_id)
}

pub fn get_transactions_by_user(
    store: &PayoutStore,
    user_id: &str,
) -> OpsResult<Vec<TransactionRecord>> {
    store.transactions_by_user(user_id)
}

/// Record a refund. Amount defaults to the purchase amount. The refund
/// fields are write-once: a second refund is a conflict.
pub fn record_refund(
    store: &PayoutStore,
    clock: &OpsClock,
    transaction_id: &str,
    amount: Option<f64>,
) -> OpsResult<TransactionRecord> {
    let txn = store
        .get_transaction(transaction_id)?
        .ok_or(OpsError::TransactionNotFound)?;
    if txn.refund_status {
        return Err(OpsError::RefundAlreadyRecorded {
            transaction_id: txn.transaction_id,
        });
    }
    let refund_amount = amount.unwrap_or(txn.purchase_amount);
    store.set_refund(&txn.transaction_id, refund_amount, clock.today())?;
    store.append_event(
        clock.today(),
        &OpsEvent::RefundRecorded {
            transaction_id: txn.transaction_id.clone(),
            user_id: txn.user_id.clone(),
            amount: refund_amount,
        },
    )?;
    log::info!(
        "refund of {refund_amount:.2} recorded on {}",
        txn.transaction_id
    );
    store
        .get_transaction(&txn.transaction_id)?
        .ok_or(OpsError::TransactionNotFound)
}

/// Resolve the (user, product, transaction) triple to its stored
/// transaction, if the three jointly match one record.
pub fn check_refund_status(
    store: &PayoutStore,
    user_id: &str,
    product_id: &str,
    transaction_id: &str,
) -> OpsResult<Option<TransactionRecord>> {
    store.find_transaction_triple(user_id, product_id, transaction_id)
}

pub fn transaction_stats(store: &PayoutStore) -> OpsResult<TransactionStats> {
    let (total, refunded, total_purchase_amount, total_refund_amount) =
        store.transaction_stat_counts()?;
    let refund_rate = if total > 0 {
        identity::round2(refunded as f64 / total as f64 * 100.0)
    } else {
        0.0
    };
    Ok(TransactionStats {
        total,
        active: total - refunded,
        refunded,
        total_purchase_amount,
        total_refund_amount,
        refund_rate,
    })
}
