use super::PayoutStore;
use crate::{error::OpsResult, transactions::TransactionRecord};
use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};

const TXN_COLUMNS: &str = "transaction_id, user_id, product_id, product_name,
        purchase_amount, purchase_date, refund_status, refund_amount, refund_date";

impl PayoutStore {
    // ── Transaction ───────────────────────────────────────────

    pub fn insert_transaction(&self, t: &TransactionRecord) -> OpsResult<()> {
        self.conn().execute(
            "INSERT INTO txn (
                transaction_id, user_id, product_id, product_name,
                purchase_amount, purchase_date, refund_status, refund_amount, refund_date
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                &t.transaction_id,
                &t.user_id,
                &t.product_id,
                &t.product_name,
                t.purchase_amount,
                t.purchase_date,
                t.refund_status as i64,
                t.refund_amount,
                t.refund_date,
            ],
        )?;
        Ok(())
    }

    pub fn get_transaction(&self, transaction_id: &str) -> OpsResult<Option<TransactionRecord>> {
        let sql = format!("SELECT {TXN_COLUMNS} FROM txn WHERE transaction_id = ?1");
        let txn = self
            .conn()
            .query_row(&sql, params![transaction_id], txn_from_row)
            .optional()?;
        Ok(txn)
    }

    /// The (user, product, transaction) triple must jointly match one row.
    pub fn find_transaction_triple(
        &self,
        user_id: &str,
        product_id: &str,
        transaction_id: &str,
    ) -> OpsResult<Option<TransactionRecord>> {
        let sql = format!(
            "SELECT {TXN_COLUMNS} FROM txn
             WHERE user_id = ?1 AND product_id = ?2 AND transaction_id = ?3"
        );
        let txn = self
            .conn()
            .query_row(&sql, params![user_id, product_id, transaction_id], txn_from_row)
            .optional()?;
        Ok(txn)
    }

    pub fn transactions_by_user(&self, user_id: &str) -> OpsResult<Vec<TransactionRecord>> {
        let sql = format!("SELECT {TXN_COLUMNS} FROM txn WHERE user_id = ?1 ORDER BY rowid");
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(params![user_id], txn_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// The user's earliest transaction for a product, if any.
    pub fn transaction_for_product(
        &self,
        user_id: &str,
        product_id: &str,
    ) -> OpsResult<Option<TransactionRecord>> {
        let sql = format!(
            "SELECT {TXN_COLUMNS} FROM txn
             WHERE user_id = ?1 AND product_id = ?2 ORDER BY rowid LIMIT 1"
        );
        let txn = self
            .conn()
            .query_row(&sql, params![user_id, product_id], txn_from_row)
            .optional()?;
        Ok(txn)
    }

    /// (total, refunded) transaction counts for one user.
    pub fn user_transaction_counts(&self, user_id: &str) -> OpsResult<(i64, i64)> {
        self.conn()
            .query_row(
                "SELECT COUNT(*), COUNT(*) FILTER (WHERE refund_status = 1)
                 FROM txn WHERE user_id = ?1",
                params![user_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map_err(Into::into)
    }

    pub fn set_refund(&self, transaction_id: &str, amount: f64, on: NaiveDate) -> OpsResult<()> {
        self.conn().execute(
            "UPDATE txn SET refund_status = 1, refund_amount = ?1, refund_date = ?2
             WHERE transaction_id = ?3",
            params![amount, on, transaction_id],
        )?;
        Ok(())
    }

    /// (total, refunded, purchase sum, refund sum).
    pub fn transaction_stat_counts(&self) -> OpsResult<(i64, i64, f64, f64)> {
        self.conn()
            .query_row(
                "SELECT
                    COUNT(*),
                    COUNT(*) FILTER (WHERE refund_status = 1),
                    COALESCE(SUM(purchase_amount), 0),
                    COALESCE(SUM(refund_amount) FILTER (WHERE refund_status = 1), 0)
                 FROM txn",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .map_err(Into::into)
    }
}

fn txn_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TransactionRecord> {
    Ok(TransactionRecord {
        transaction_id: row.get(0)?,
        user_id: row.get(1)?,
        product_id: row.get(2)?,
        product_name: row.get(3)?,
        purchase_amount: row.get(4)?,
        purchase_date: row.get(5)?,
        refund_status: row.get::<_, i64>(6)? != 0,
        refund_amount: row.get(7)?,
        refund_date: row.get(8)?,
    })
}
