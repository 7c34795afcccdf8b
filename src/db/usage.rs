//! PostgreSQL-backed usage counter

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tokio_postgres::Row;
use tracing::debug;

use super::pool::{DbPool, DbError};
use super::store::{CounterUpdate, UsageStore};
use crate::domain::UsageCounter;

/// Usage store on the `daily_usage` table
///
/// Each update runs in its own transaction: the row is created if missing,
/// locked with `SELECT ... FOR UPDATE`, and rewritten only when the decision
/// admits the call. The row lock serializes concurrent updates across every
/// process sharing the database.
///
/// The table is created on first use and the step is retried on every call
/// until it succeeds, so a database that comes up after the service is picked
/// up without a restart.
pub struct PgUsageStore {
    pool: DbPool,
    schema: OnceCell<()>,
}

impl PgUsageStore {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            schema: OnceCell::new(),
        }
    }

    async fn ready(&self) -> Result<(), DbError> {
        self.schema.get_or_try_init(|| self.pool.ensure_schema()).await?;
        Ok(())
    }
}

fn counter_from_row(row: &Row) -> Result<UsageCounter, DbError> {
    let date: String = row.try_get("usage_date")?;
    let count: i32 = row.try_get("request_count")?;
    let count = u32::try_from(count)
        .map_err(|_| DbError::Corrupt(format!("negative request_count {}", count)))?;
    Ok(UsageCounter { date, count })
}

/// A placeholder row has an empty date and never matches a real day
fn stored_counter(counter: UsageCounter) -> Option<UsageCounter> {
    if counter.date.is_empty() {
        None
    } else {
        Some(counter)
    }
}

#[async_trait]
impl UsageStore for PgUsageStore {
    async fn update(&self, key: &str, apply: CounterUpdate<'_>) -> Result<Option<UsageCounter>, DbError> {
        self.ready().await?;
        let mut client = self.pool.get().await?;
        let tx = client.transaction().await?;

        // Make sure there is a row to lock; concurrent inserters wait on the
        // unique index and then fall through to the lock below.
        tx.execute(
            r#"
            INSERT INTO daily_usage (counter_key, usage_date, request_count)
            VALUES ($1, '', 0)
            ON CONFLICT (counter_key) DO NOTHING
            "#,
            &[&key]
        ).await?;

        let row = tx.query_one(
            "SELECT usage_date, request_count FROM daily_usage WHERE counter_key = $1 FOR UPDATE",
            &[&key]
        ).await?;
        let current = stored_counter(counter_from_row(&row)?);

        let next = apply(current.as_ref());

        if let Some(ref counter) = next {
            let count = i32::try_from(counter.count)
                .map_err(|_| DbError::Corrupt(format!("request_count {} out of range", counter.count)))?;
            tx.execute(
                r#"
                UPDATE daily_usage
                SET usage_date = $2, request_count = $3, updated_at = NOW()
                WHERE counter_key = $1
                "#,
                &[&key, &counter.date, &count]
            ).await?;
        }

        tx.commit().await?;

        debug!(key, written = next.is_some(), "Usage transaction committed");
        Ok(next)
    }

    async fn get(&self, key: &str) -> Result<Option<UsageCounter>, DbError> {
        self.ready().await?;
        let client = self.pool.get().await?;
        let row = client.query_opt(
            "SELECT usage_date, request_count FROM daily_usage WHERE counter_key = $1",
            &[&key]
        ).await?;

        match row {
            Some(r) => Ok(stored_counter(counter_from_row(&r)?)),
            None => Ok(None),
        }
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
