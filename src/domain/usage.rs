//! Daily usage counter and the admission decision applied inside a store transaction

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Day key format persisted with the counter
pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// The single persisted quota record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageCounter {
    /// Calendar day the count belongs to, e.g. "2024-05-01"
    pub date: String,
    pub count: u32,
}

impl UsageCounter {
    /// Count that applies to `today`; a record from another day counts as zero
    pub fn effective_count(stored: Option<&UsageCounter>, today: &str) -> u32 {
        match stored {
            Some(counter) if counter.date == today => counter.count,
            _ => 0,
        }
    }

    /// Decide one admission against `limit`
    ///
    /// Returns the record to write when the call is admitted, `None` when the
    /// limit is reached (nothing must be written in that case).
    pub fn admit(stored: Option<&UsageCounter>, today: &str, limit: u32) -> Option<UsageCounter> {
        let current = Self::effective_count(stored, today);
        if current >= limit {
            return None;
        }
        Some(UsageCounter {
            date: today.to_string(),
            count: current + 1,
        })
    }

    /// Format a date as a counter key
    pub fn day_key(date: NaiveDate) -> String {
        date.format(DAY_FORMAT).to_string()
    }
}
