//! Store-backed quota gate

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use super::clock::Clock;
use crate::db::{DbError, UsageStore};
use crate::domain::UsageCounter;

/// Quota gate failures
///
/// A denied call is not an error; `try_consume` returns `Ok(false)` for it.
#[derive(Debug, Error)]
pub enum QuotaError {
    #[error("Quota store unavailable: {0}")]
    StoreUnavailable(#[from] DbError),
    #[error("Quota store did not answer within {0:?}")]
    Timeout(Duration),
}

/// Decides whether one more call fits in today's budget
#[async_trait]
pub trait QuotaGate: Send + Sync {
    /// Consume one unit if today's usage is below the limit
    ///
    /// `Ok(true)` means the unit was durably recorded, `Ok(false)` means the
    /// limit is reached and nothing was written. An error means the quota
    /// state could not be determined.
    async fn try_consume(&self) -> Result<bool, QuotaError>;
}

/// Quota gate running its decision inside a `UsageStore` transaction
///
/// Holds no lock of its own; atomicity comes from the store, so any number of
/// processes may share one counter.
pub struct StoreQuotaGate {
    store: Arc<dyn UsageStore>,
    clock: Arc<dyn Clock>,
    key: String,
    daily_limit: u32,
    timeout: Duration,
}

impl StoreQuotaGate {
    pub fn new(store: Arc<dyn UsageStore>, clock: Arc<dyn Clock>, daily_limit: u32) -> Self {
        Self {
            store,
            clock,
            key: "usage".to_string(),
            daily_limit,
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn daily_limit(&self) -> u32 {
        self.daily_limit
    }
}

#[async_trait]
impl QuotaGate for StoreQuotaGate {
    async fn try_consume(&self) -> Result<bool, QuotaError> {
        let today = UsageCounter::day_key(self.clock.today());
        let limit = self.daily_limit;
        let decide = |stored: Option<&UsageCounter>| UsageCounter::admit(stored, &today, limit);

        let written = tokio::time::timeout(self.timeout, self.store.update(&self.key, &decide))
            .await
            .map_err(|_| QuotaError::Timeout(self.timeout))??;

        match written {
            Some(counter) => {
                info!(
                    date = %counter.date,
                    count = counter.count,
                    limit,
                    backend = self.store.backend_name(),
                    "Quota unit consumed"
                );
                Ok(true)
            }
            None => {
                info!(date = %today, limit, "Daily quota exhausted");
                Ok(false)
            }
        }
    }
}
