use super::PayoutStore;
use crate::{
    error::OpsResult,
    lifecycle::{PayoutRecord, PayoutState},
    types::{PayoutId, ReviewId},
};
use chrono::NaiveDate;
use rusqlite::params;

impl PayoutStore {
    // ── Payout ────────────────────────────────────────────────

    pub fn insert_payout(
        &self,
        review_id: ReviewId,
        user_id: &str,
        amount: f64,
        status: PayoutState,
        approved_at: NaiveDate,
        approved_by: &str,
        paid_at: Option<NaiveDate>,
    ) -> OpsResult<PayoutId> {
        self.conn().execute(
            "INSERT INTO payout (review_id, user_id, amount, status, approved_at, approved_by, paid_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![review_id, user_id, amount, status, approved_at, approved_by, paid_at],
        )?;
        Ok(self.conn().last_insert_rowid())
    }

    pub fn all_payouts(&self) -> OpsResult<Vec<PayoutRecord>> {
        let mut stmt = self.conn().prepare(
            "SELECT payout_id, review_id, user_id, amount, status, approved_at, approved_by, paid_at
             FROM payout ORDER BY payout_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(PayoutRecord {
                payout_id: row.get(0)?,
                review_id: row.get(1)?,
                user_id: row.get(2)?,
                amount: row.get(3)?,
                status: row.get(4)?,
                approved_at: row.get(5)?,
                approved_by: row.get(6)?,
                paid_at: row.get(7)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
