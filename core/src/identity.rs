//! Identity collaborator — user records and administrative user operations.
//!
//! Flag/unflag here is manual and unconditional. The only automatic
//! flag is the repeat-offender trigger in the payout lifecycle.

use crate::{
    clock::OpsClock,
    error::{OpsError, OpsResult},
    event::OpsEvent,
    store::PayoutStore,
    types::UserId,
};
use chrono::NaiveDate;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    User,
    Admin,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl FromSql for UserRole {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(FromSqlError::Other(
                format!("unknown user role '{other}'").into(),
            )),
        }
    }
}

impl ToSql for UserRole {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Active,
    Flagged,
}

impl UserStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Flagged => "flagged",
        }
    }
}

impl FromSql for UserStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "active" => Ok(Self::Active),
            "flagged" => Ok(Self::Flagged),
            other => Err(FromSqlError::Other(
                format!("unknown user status '{other}'").into(),
            )),
        }
    }
}

impl ToSql for UserStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

/// A stored user. Credential material is an external concern and never
/// enters this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: UserId,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub status: UserStatus,
    pub created_at: NaiveDate,
    pub total_earned: f64,
    pub reviews_completed: i64,
    pub flag_reason: Option<String>,
    pub flagged_at: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserStats {
    pub total: i64,
    pub active: i64,
    pub total_earnings: f64,
    pub avg_earnings: f64,
}

/// Create a user in Active state with zeroed accumulators.
pub fn create_user(store: &PayoutStore, clock: &OpsClock, new: NewUser) -> OpsResult<UserRecord> {
    if new.username.trim().is_empty() {
        return Err(OpsError::InvalidInput { field: "username" });
    }
    let user_id = format!("user{}", store.user_count()? + 1);
    let record = UserRecord {
        user_id,
        username: new.username,
        email: new.email,
        role: UserRole::User,
        status: UserStatus::Active,
        created_at: clock.today(),
        total_earned: 0.0,
        reviews_completed: 0,
        flag_reason: None,
        flagged_at: None,
    };
    store.insert_user(&record)?;
    log::info!("user {} created", record.user_id);
    Ok(record)
}

pub fn get_user_by_id(store: &PayoutStore, user_id: &str) -> OpsResult<Option<UserRecord>> {
    store.get_user(user_id)
}

pub fn get_user_by_username(store: &PayoutStore, username: &str) -> OpsResult<Option<UserRecord>> {
    store.get_user_by_username(username)
}

/// Flag a user. Unconditional: overwrites any prior flag reason.
pub fn flag_user(
    store: &PayoutStore,
    clock: &OpsClock,
    user_id: &str,
    reason: &str,
) -> OpsResult<UserRecord> {
    if reason.trim().is_empty() {
        return Err(OpsError::InvalidInput { field: "reason" });
    }
    let user = require_user(store, user_id)?;
    store.set_user_flag(&user.user_id, reason, clock.today())?;
    store.append_event(
        clock.today(),
        &OpsEvent::UserFlagged {
            user_id: user.user_id.clone(),
            reason: reason.to_string(),
        },
    )?;
    log::warn!("user {} flagged: {reason}", user.user_id);
    require_user(store, user_id)
}

/// Clear a user's flag. Does not touch any of their reviews.
pub fn unflag_user(store: &PayoutStore, clock: &OpsClock, user_id: &str) -> OpsResult<UserRecord> {
    let user = require_user(store, user_id)?;
    store.clear_user_flag(&user.user_id)?;
    store.append_event(
        clock.today(),
        &OpsEvent::UserUnflagged {
            user_id: user.user_id.clone(),
        },
    )?;
    log::info!("user {} unflagged", user.user_id);
    require_user(store, user_id)
}

/// Credit earnings for one completed review.
pub fn update_user_earnings(
    store: &PayoutStore,
    user_id: &str,
    amount: f64,
) -> OpsResult<UserRecord> {
    let user = require_user(store, user_id)?;
    store.credit_user_earnings(&user.user_id, amount)?;
    require_user(store, user_id)
}

/// Platform-wide user stats. Admin accounts are excluded from the user
/// counts; earnings sum over everyone (admins carry zero).
pub fn user_stats(store: &PayoutStore) -> OpsResult<UserStats> {
    let (total, active, total_earnings) = store.user_stat_counts()?;
    let avg_earnings = if active > 0 {
        round2(total_earnings / active as f64)
    } else {
        0.0
    };
    Ok(UserStats {
        total,
        active,
        total_earnings,
        avg_earnings,
    })
}

pub(crate) fn require_user(store: &PayoutStore, user_id: &str) -> OpsResult<UserRecord> {
    store.get_user(user_id)?.ok_or_else(|| OpsError::UserNotFound {
        user_id: user_id.to_string(),
    })
}

pub(crate) fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
