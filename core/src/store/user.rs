use super::PayoutStore;
use crate::{error::OpsResult, identity::UserRecord};
use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};

impl PayoutStore {
    // ── User ──────────────────────────────────────────────────

    pub fn insert_user(&self, u: &UserRecord) -> OpsResult<()> {
        self.conn().execute(
            "INSERT INTO user (
                user_id, username, email, role, status, created_at,
                total_earned, reviews_completed, flag_reason, flagged_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                &u.user_id,
                &u.username,
                &u.email,
                u.role,
                u.status,
                u.created_at,
                u.total_earned,
                u.reviews_completed,
                &u.flag_reason,
                u.flagged_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_user(&self, user_id: &str) -> OpsResult<Option<UserRecord>> {
        let mut stmt = self.conn().prepare(
            "SELECT user_id, username, email, role, status, created_at,
                    total_earned, reviews_completed, flag_reason, flagged_at
             FROM user WHERE user_id = ?1",
        )?;
        let user = stmt
            .query_row(params![user_id], user_from_row)
            .optional()?;
        Ok(user)
    }

    pub fn get_user_by_username(&self, username: &str) -> OpsResult<Option<UserRecord>> {
        let mut stmt = self.conn().prepare(
            "SELECT user_id, username, email, role, status, created_at,
                    total_earned, reviews_completed, flag_reason, flagged_at
             FROM user WHERE username = ?1",
        )?;
        let user = stmt
            .query_row(params![username], user_from_row)
            .optional()?;
        Ok(user)
    }

    pub fn all_users(&self) -> OpsResult<Vec<UserRecord>> {
        let mut stmt = self.conn().prepare(
            "SELECT user_id, username, email, role, status, created_at,
                    total_earned, reviews_completed, flag_reason, flagged_at
             FROM user ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], user_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn flagged_users(&self) -> OpsResult<Vec<UserRecord>> {
        let mut stmt = self.conn().prepare(
            "SELECT user_id, username, email, role, status, created_at,
                    total_earned, reviews_completed, flag_reason, flagged_at
             FROM user WHERE status = 'flagged' ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], user_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn user_count(&self) -> OpsResult<i64> {
        let count: i64 =
            self.conn()
                .query_row("SELECT COUNT(*) FROM user", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn set_user_flag(&self, user_id: &str, reason: &str, on: NaiveDate) -> OpsResult<()> {
        self.conn().execute(
            "UPDATE user SET status = 'flagged', flag_reason = ?1, flagged_at = ?2
             WHERE user_id = ?3",
            params![reason, on, user_id],
        )?;
        Ok(())
    }

    pub fn clear_user_flag(&self, user_id: &str) -> OpsResult<()> {
        self.conn().execute(
            "UPDATE user SET status = 'active', flag_reason = NULL, flagged_at = NULL
             WHERE user_id = ?1",
            params![user_id],
        )?;
        Ok(())
    }

    pub fn credit_user_earnings(&self, user_id: &str, amount: f64) -> OpsResult<()> {
        self.conn().execute(
            "UPDATE user SET total_earned = total_earned + ?1,
                             reviews_completed = reviews_completed + 1
             WHERE user_id = ?2",
            params![amount, user_id],
        )?;
        Ok(())
    }

    /// (non-admin total, non-admin active, earnings sum over everyone).
    pub fn user_stat_counts(&self) -> OpsResult<(i64, i64, f64)> {
        self.conn()
            .query_row(
                "SELECT
                    COUNT(*) FILTER (WHERE role != 'admin'),
                    COUNT(*) FILTER (WHERE role != 'admin' AND status = 'active'),
                    COALESCE(SUM(total_earned), 0)
                 FROM user",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .map_err(Into::into)
    }
}

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRecord> {
    Ok(UserRecord {
        user_id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        role: row.get(3)?,
        status: row.get(4)?,
        created_at: row.get(5)?,
        total_earned: row.get(6)?,
        reviews_completed: row.get(7)?,
        flag_reason: row.get(8)?,
        flagged_at: row.get(9)?,
    })
}
