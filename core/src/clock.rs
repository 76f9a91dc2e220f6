//! Calendar clock — owns "today" for every date the engine stamps.
//!
//! RULE: Nothing in the core reads the system clock directly.
//! The runner constructs an OpsClock from the host date; tests pin it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OpsClock {
    today: NaiveDate,
}

impl OpsClock {
    pub fn starting(today: NaiveDate) -> Self {
        Self { today }
    }

    /// Clock pinned to the host's current date. Runner use only.
    pub fn system() -> Self {
        Self {
            today: chrono::Local::now().date_naive(),
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn advance_days(&mut self, days: u64) {
        self.today = self.today + chrono::Days::new(days);
    }

    /// Whole days elapsed since `past`. Negative if `past` is in the future.
    pub fn days_since(&self, past: NaiveDate) -> i64 {
        self.today.signed_duration_since(past).num_days()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn days_since_counts_whole_days() {
        let clock = OpsClock::starting(date("2025-03-10"));
        assert_eq!(clock.days_since(date("2025-03-01")), 9);
        assert_eq!(clock.days_since(date("2025-03-10")), 0);
        assert_eq!(clock.days_since(date("2025-03-12")), -2);
    }

    #[test]
    fn advance_moves_today_forward() {
        let mut clock = OpsClock::starting(date("2025-12-30"));
        clock.advance_days(3);
        assert_eq!(clock.today(), date("2026-01-02"));
    }
}
