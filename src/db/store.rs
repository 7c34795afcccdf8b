//! Transactional store interface for the usage counter

use async_trait::async_trait;

use super::pool::DbError;
use crate::domain::UsageCounter;

/// Decision applied to the current record inside the store's transaction
///
/// Returns the record to write, or `None` to leave the stored state untouched.
pub type CounterUpdate<'a> = &'a (dyn Fn(Option<&UsageCounter>) -> Option<UsageCounter> + Send + Sync);

/// A store able to run an atomic read-check-write on one counter record
///
/// Implementations must serialize concurrent `update` calls on the same key:
/// the record read by `apply` is the one the write replaces, with no other
/// writer in between.
#[async_trait]
pub trait UsageStore: Send + Sync {
    /// Run `apply` against the record stored under `key` in one transaction
    ///
    /// Returns what was written, if anything.
    async fn update(&self, key: &str, apply: CounterUpdate<'_>) -> Result<Option<UsageCounter>, DbError>;

    /// Read the record stored under `key`
    async fn get(&self, key: &str) -> Result<Option<UsageCounter>, DbError>;

    /// Short name used in logs
    fn backend_name(&self) -> &'static str;
}
