//! Calendar source for day rollover

use chrono::{NaiveDate, Utc};
#[cfg(test)]
use parking_lot::RwLock;

/// Supplies the current calendar day
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Wall clock, in UTC so every instance agrees on the day boundary
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// Settable clock for tests
#[cfg(test)]
#[derive(Debug)]
pub struct FixedClock {
    day: RwLock<NaiveDate>,
}

#[cfg(test)]
impl FixedClock {
    pub fn new(day: NaiveDate) -> Self {
        Self { day: RwLock::new(day) }
    }

    pub fn set(&self, day: NaiveDate) {
        *self.day.write() = day;
    }
}

#[cfg(test)]
impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        *self.day.read()
    }
}
