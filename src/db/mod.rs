//! Usage counter persistence
//!
//! `UsageStore` is the transactional seam the quota gate runs against.
//! PostgreSQL backs it in production; the in-memory store serves local runs and tests.

pub mod pool;
pub mod store;
pub mod usage;
pub mod memory;

pub use pool::{DbPool, DbError};
pub use store::{UsageStore, CounterUpdate};
pub use usage::PgUsageStore;
pub use memory::MemoryUsageStore;
