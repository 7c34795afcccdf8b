//! Daily quota gate
//!
//! Admits a call only while today's usage is below the configured limit,
//! recording the admission in the same store transaction that checked it.

mod clock;
mod gate;

pub use clock::SystemClock;
#[cfg(test)]
pub use clock::FixedClock;
pub use gate::{QuotaError, QuotaGate, StoreQuotaGate};
