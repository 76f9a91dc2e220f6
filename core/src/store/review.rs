use super::PayoutStore;
use crate::{
    error::OpsResult,
    reviews::{ReviewRecord, ReviewStats},
    types::ReviewId,
};
use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};

const REVIEW_COLUMNS: &str = "review_id, user_id, product_id, product_name, review_text,
        rating, payout_status, payout_amount, fraud_score, created_at,
        approved_at, approved_by, rejection_reason, fraud_reason";

impl PayoutStore {
    // ── Review ────────────────────────────────────────────────

    #[allow(clippy::too_many_arguments)]
    pub fn insert_review(
        &self,
        user_id: &str,
        product_id: &str,
        product_name: &str,
        review_text: &str,
        rating: i64,
        payout_amount: f64,
        fraud_score: f64,
        created_at: NaiveDate,
    ) -> OpsResult<ReviewId> {
        self.conn().execute(
            "INSERT INTO review (
                user_id, product_id, product_name, review_text, rating,
                payout_status, payout_amount, fraud_score, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, 'pending', ?6, ?7, ?8)",
            params![
                user_id,
                product_id,
                product_name,
                review_text,
                rating,
                payout_amount,
                fraud_score,
                created_at,
            ],
        )?;
        Ok(self.conn().last_insert_rowid())
    }

    pub fn get_review(&self, review_id: ReviewId) -> OpsResult<Option<ReviewRecord>> {
        let sql = format!("SELECT {REVIEW_COLUMNS} FROM review WHERE review_id = ?1");
        let review = self
            .conn()
            .query_row(&sql, params![review_id], review_from_row)
            .optional()?;
        Ok(review)
    }

    pub fn reviews_by_user(&self, user_id: &str) -> OpsResult<Vec<ReviewRecord>> {
        let sql =
            format!("SELECT {REVIEW_COLUMNS} FROM review WHERE user_id = ?1 ORDER BY review_id");
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(params![user_id], review_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// The user's review for one product, if any. At most one exists.
    pub fn review_for_product(
        &self,
        user_id: &str,
        product_id: &str,
    ) -> OpsResult<Option<ReviewRecord>> {
        let sql = format!(
            "SELECT {REVIEW_COLUMNS} FROM review WHERE user_id = ?1 AND product_id = ?2"
        );
        let review = self
            .conn()
            .query_row(&sql, params![user_id, product_id], review_from_row)
            .optional()?;
        Ok(review)
    }

    pub fn pending_reviews(&self) -> OpsResult<Vec<ReviewRecord>> {
        self.reviews_with_status("pending")
    }

    pub fn approved_reviews(&self) -> OpsResult<Vec<ReviewRecord>> {
        self.reviews_with_status("approved")
    }

    fn reviews_with_status(&self, status: &str) -> OpsResult<Vec<ReviewRecord>> {
        let sql = format!(
            "SELECT {REVIEW_COLUMNS} FROM review WHERE payout_status = ?1 ORDER BY review_id"
        );
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(params![status], review_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Fraud-status reviews plus any review scoring above `min_score`.
    pub fn flagged_reviews(&self, min_score: f64) -> OpsResult<Vec<ReviewRecord>> {
        let sql = format!(
            "SELECT {REVIEW_COLUMNS} FROM review
             WHERE payout_status = 'fraud' OR fraud_score > ?1
             ORDER BY review_id"
        );
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(params![min_score], review_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn count_fraud_reviews(&self, user_id: &str) -> OpsResult<i64> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM review WHERE user_id = ?1 AND payout_status = 'fraud'",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn mark_approved(
        &self,
        review_id: ReviewId,
        on: NaiveDate,
        approved_by: &str,
    ) -> OpsResult<()> {
        self.conn().execute(
            "UPDATE review SET payout_status = 'approved', approved_at = ?1, approved_by = ?2
             WHERE review_id = ?3",
            params![on, approved_by, review_id],
        )?;
        Ok(())
    }

    pub fn mark_rejected(&self, review_id: ReviewId, reason: &str) -> OpsResult<()> {
        self.conn().execute(
            "UPDATE review SET payout_status = 'rejected', rejection_reason = ?1
             WHERE review_id = ?2",
            params![reason, review_id],
        )?;
        Ok(())
    }

    pub fn mark_fraud(&self, review_id: ReviewId, reason: &str) -> OpsResult<()> {
        self.conn().execute(
            "UPDATE review SET payout_status = 'fraud', fraud_reason = ?1
             WHERE review_id = ?2",
            params![reason, review_id],
        )?;
        Ok(())
    }

    pub fn review_stats(&self) -> OpsResult<ReviewStats> {
        self.conn()
            .query_row(
                "SELECT
                    COUNT(*),
                    COUNT(*) FILTER (WHERE payout_status = 'pending'),
                    COUNT(*) FILTER (WHERE payout_status = 'approved'),
                    COUNT(*) FILTER (WHERE payout_status = 'rejected'),
                    COUNT(*) FILTER (WHERE payout_status = 'fraud')
                 FROM review",
                [],
                |row| {
                    Ok(ReviewStats {
                        total: row.get(0)?,
                        pending: row.get(1)?,
                        approved: row.get(2)?,
                        rejected: row.get(3)?,
                        fraud: row.get(4)?,
                    })
                },
            )
            .map_err(Into::into)
    }

    /// Payout amount sums for (pending, approved) reviews.
    pub fn payout_amount_totals(&self) -> OpsResult<(f64, f64)> {
        self.conn()
            .query_row(
                "SELECT
                    COALESCE(SUM(payout_amount) FILTER (WHERE payout_status = 'pending'), 0),
                    COALESCE(SUM(payout_amount) FILTER (WHERE payout_status = 'approved'), 0)
                 FROM review",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map_err(Into::into)
    }
}

fn review_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ReviewRecord> {
    Ok(ReviewRecord {
        review_id: row.get(0)?,
        user_id: row.get(1)?,
        product_id: row.get(2)?,
        product_name: row.get(3)?,
        review_text: row.get(4)?,
        rating: row.get(5)?,
        payout_status: row.get(6)?,
        payout_amount: row.get(7)?,
        fraud_score: row.get(8)?,
        created_at: row.get(9)?,
        approved_at: row.get(10)?,
        approved_by: row.get(11)?,
        rejection_reason: row.get(12)?,
        fraud_reason: row.get(13)?,
    })
}
