//! Process-local usage store
//!
//! Only correct while a single process serves traffic. Used for local runs
//! (`quota.store = "memory"`) and as the transactional stand-in in tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

use super::pool::DbError;
use super::store::{CounterUpdate, UsageStore};
use crate::domain::UsageCounter;

#[derive(Default)]
pub struct MemoryUsageStore {
    records: Mutex<HashMap<String, UsageCounter>>,
}

impl MemoryUsageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record, e.g. to simulate state left over from an earlier day
    #[cfg(test)]
    pub fn insert(&self, key: &str, counter: UsageCounter) {
        self.records.lock().insert(key.to_string(), counter);
    }
}

#[async_trait]
impl UsageStore for MemoryUsageStore {
    async fn update(&self, key: &str, apply: CounterUpdate<'_>) -> Result<Option<UsageCounter>, DbError> {
        // The lock is held across read, decision and write.
        let mut records = self.records.lock();
        let next = apply(records.get(key));
        if let Some(ref counter) = next {
            records.insert(key.to_string(), counter.clone());
        }
        Ok(next)
    }

    async fn get(&self, key: &str) -> Result<Option<UsageCounter>, DbError> {
        Ok(self.records.lock().get(key).cloned())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
